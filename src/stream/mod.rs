//! Frame-by-frame streaming reconstruction.

pub mod processor;

pub use processor::RtPghi;
