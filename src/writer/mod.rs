pub mod index_writer;
pub mod segment_builder;
