//! Buffer pool observability.
//!
//! Diagnostics are exposed as plain snapshot values, queried on demand by
//! tests and operators. Nothing in the replacement algorithm's control flow
//! touches these types.

use std::fmt;

use crate::common::{BlockId, BufferId, Lsn, TxId};

/// A point-in-time snapshot of one buffer's state.
///
/// Produced by [`Buffer::stats`]; intended for test harnesses and
/// operational inspection, never for transactional logic.
///
/// [`Buffer::stats`]: crate::buffer::Buffer::stats
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferStats {
    pub id: BufferId,
    pub block: Option<BlockId>,
    pub modified_by: Option<TxId>,
    pub lsn: Option<Lsn>,
    pub pin_count: u32,
    pub pinned: bool,
    pub reads: u64,
    pub writes: u64,
}

impl fmt::Display for BufferStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.id)?;
        match &self.block {
            Some(block) => write!(f, "{}", block)?,
            None => write!(f, "[unassigned]")?,
        }
        write!(
            f,
            " pins: {}, reads: {}, writes: {}",
            self.pin_count, self.reads, self.writes
        )?;
        if let Some(tx) = self.modified_by {
            write!(f, ", dirty by {}", tx)?;
        }
        if let Some(lsn) = self.lsn {
            write!(f, ", {}", lsn)?;
        }
        Ok(())
    }
}

/// Aggregate pool counters.
///
/// Maintained by the pool under its lock and copied out on request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Pins satisfied from the residency map.
    pub hits: u64,
    /// Pins that had to claim a victim buffer.
    pub misses: u64,
    /// Times a resident block was displaced from its slot.
    pub evictions: u64,
}

impl PoolStats {
    /// Calculate cache hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pool {{ hits: {}, misses: {}, evictions: {}, hit_rate: {:.2}% }}",
            self.hits,
            self.misses,
            self.evictions,
            self.hit_rate() * 100.0
        )
    }
}
