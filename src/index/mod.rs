pub mod posting;
pub mod inverted;
pub mod doc_store;
