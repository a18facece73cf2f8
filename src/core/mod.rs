//! Core building blocks: parameters, window constants, the priority heap and
//! sliding column buffers.

pub mod columns;
pub mod config;
pub mod heap;
pub mod types;
pub mod window;

pub use columns::ColumnWindow;
pub use heap::{HeapCursor, PriorityHeap};
pub use types::*;
pub use window::{gamma, WindowType};
