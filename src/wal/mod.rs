//! Write-ahead log layer.
//!
//! The buffer pool consumes exactly one guarantee from this module: after
//! [`LogManager::flush`] returns for some LSN, every log record up to and
//! including that LSN is durable on disk. That guarantee is what makes it
//! safe to write a dirty page out (the write-ahead rule).

mod log_manager;

pub use log_manager::LogManager;
