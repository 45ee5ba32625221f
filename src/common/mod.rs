//! Common types and utilities shared across corkdb.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants
//! - Error types
//! - Identifiers (BlockId, BufferId, TxId, Lsn)

pub mod config;
pub mod error;

mod block_id;
mod buffer_id;
mod txn;

pub use block_id::BlockId;
pub use buffer_id::BufferId;
pub use error::{Error, Result};
pub use txn::{Lsn, TxId};
