//! Storage layer - block I/O and the page format.
//!
//! This module handles persistent storage:
//! - [`FileManager`] - Block-granular file I/O
//! - [`Page`] - The in-memory image of one block

mod file_manager;
mod page;

pub use file_manager::FileManager;
pub use page::Page;
