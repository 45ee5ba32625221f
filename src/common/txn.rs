//! Transaction and log-sequence identifiers.
//!
//! The source of a page modification is recorded on its buffer as a pair of
//! these: *which* transaction touched it, and the sequence number of the log
//! record describing the change. A buffer with no recorded transaction is
//! clean; a buffer with no recorded LSN has no log record that must be
//! forced before write-back. Both "absent" states are `Option`s on the
//! buffer, never sentinel values.

use std::fmt;

/// Identifies a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxId(pub u64);

impl TxId {
    /// Create a new TxId.
    #[inline]
    pub fn new(id: u64) -> Self {
        TxId(id)
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tx({})", self.0)
    }
}

/// A log sequence number: monotonic identifier of a write-ahead log record.
///
/// `Ord` matters here: the replacement policy evicts the dirty buffer with
/// the *smallest* LSN first, and the log force in `flush` covers every
/// record up to and including a given LSN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lsn(pub u64);

impl Lsn {
    /// Create a new Lsn.
    #[inline]
    pub fn new(id: u64) -> Self {
        Lsn(id)
    }
}

impl fmt::Display for Lsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lsn({})", self.0)
    }
}
