pub mod compress;
pub mod vbyte;
pub mod delta;
