//! Error types for corkdb.

use crate::common::BufferId;

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in corkdb.
///
/// Pool exhaustion is deliberately *not* here: at the pool layer "no victim
/// found" is an expected, recoverable condition reported as an absent result
/// (`Ok(None)`), and only the waiting facade turns a persistent shortage
/// into [`Error::PinTimeout`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from disk or log operations.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Attempted to unpin a buffer whose pin count is already zero.
    ///
    /// This indicates a caller bug: every unpin must match an earlier pin.
    #[error("{0} is not pinned")]
    NotPinned(BufferId),

    /// No buffer became available within the configured wait time.
    #[error("timed out waiting for a free buffer")]
    PinTimeout,
}
