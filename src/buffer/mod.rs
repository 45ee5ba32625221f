//! Buffer management.
//!
//! The buffer pool is the in-memory cache layer between transactions and
//! disk. It manages a fixed set of slots, each holding one block's page.
//!
//! # Components
//! - [`BufferManager`] - The synchronized gateway (wait/timeout semantics)
//! - [`BufferPool`] - Residency, pin lifecycle, and victim selection
//! - [`Buffer`] - A slot holding a page + pin/dirty/log metadata
//! - [`PageFormatter`] - Callback initializing newly allocated blocks
//! - [`BufferStats`] / [`PoolStats`] - Diagnostic snapshots

mod buffer;
mod manager;
mod pool;
mod stats;

pub use buffer::{Buffer, PageFormatter};
pub use manager::BufferManager;
pub use pool::{BufferHandle, BufferPool};
pub use stats::{BufferStats, PoolStats};
