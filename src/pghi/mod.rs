//! Phase gradient heap integration.

pub mod gradient;
pub mod heapint;

pub use heapint::{HeapIntTask, PassStats};
