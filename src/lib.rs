//! corkdb - the buffer manager of a disk-based database kernel.
//!
//! # Architecture
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                        corkdb                             │
//! ├───────────────────────────────────────────────────────────┤
//! │  ┌───────────────────────────────────────────────────┐    │
//! │  │         BufferManager (buffer/manager)            │    │
//! │  │     pin wait/timeout + one pool-wide mutex        │    │
//! │  └───────────────────────────────────────────────────┘    │
//! │                           ↓                               │
//! │  ┌───────────────────────────────────────────────────┐    │
//! │  │           BufferPool (buffer/pool)                │    │
//! │  │  residency map + free queue + victim selection    │    │
//! │  │        Buffer slots: pin / dirty / LSN            │    │
//! │  └───────────────────────────────────────────────────┘    │
//! │              ↓                          ↓                 │
//! │  ┌──────────────────────┐  ┌──────────────────────────┐   │
//! │  │  Storage (storage/)  │  │   Write-ahead log (wal/) │   │
//! │  │  FileManager + Page  │  │   LogManager: force(lsn) │   │
//! │  └──────────────────────┘  └──────────────────────────┘   │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! A transaction pins the block it wants, reads and writes the page through
//! the pinned buffer, records its modification (transaction id + log
//! sequence number), and unpins. The pool evicts only unpinned buffers, and
//! a dirty buffer's log record is forced to disk before its page is ever
//! written back - the write-ahead rule is built into the single write-back
//! path rather than checked.
//!
//! # Modules
//! - [`common`] - Shared primitives (BlockId, BufferId, TxId, Lsn, Error)
//! - [`buffer`] - Buffer pool, pin lifecycle, eviction policy
//! - [`storage`] - Block-granular file I/O and the page format
//! - [`wal`] - Write-ahead log with explicit force

pub mod buffer;
pub mod common;
pub mod storage;
pub mod wal;

// Re-export commonly used items at crate root for convenience
pub use common::config::BLOCK_SIZE;
pub use common::{BlockId, BufferId, Error, Lsn, Result, TxId};

pub use buffer::{Buffer, BufferHandle, BufferManager, BufferPool, BufferStats, PoolStats};
pub use storage::{FileManager, Page};
pub use wal::LogManager;
