//! Buffer pool - the core page caching layer.
//!
//! The [`BufferPool`] provides:
//! - Block caching between disk and memory
//! - Pin-based reference counting
//! - WAL-ordered dirty page write-back
//! - Oldest-logged-modification victim selection

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::common::{BlockId, BufferId, Lsn, Result, TxId};
use crate::storage::FileManager;
use crate::wal::LogManager;

use super::buffer::{Buffer, PageFormatter};
use super::stats::{BufferStats, PoolStats};

/// Shared handle to a pooled buffer.
///
/// `pin`/`pin_new` hand one of these back; the caller locks it to read or
/// write the page while holding the pin, and passes it to `unpin` when done.
pub type BufferHandle = Arc<Mutex<Buffer>>;

/// A fixed set of buffer slots caching disk blocks.
///
/// # Architecture
/// ```text
/// ┌────────────────────────────────────────────────────────────┐
/// │                        BufferPool                          │
/// │  ┌──────────────┐  ┌──────────────────────────────────┐    │
/// │  │  residency   │  │     buffers: Vec<BufferHandle>   │    │
/// │  │BlockId → Bid │─▶│  [Buf0] [Buf1] [Buf2] ...        │    │
/// │  └──────────────┘  └──────────────────────────────────┘    │
/// │  ┌──────────────┐  ┌──────────────┐                        │
/// │  │     free     │  │  available   │                        │
/// │  │VecDeque<Bid> │  │    usize     │                        │
/// │  └──────────────┘  └──────────────┘                        │
/// └────────────────────────────────────────────────────────────┘
/// ```
///
/// The residency map is the single source of truth for "is block X cached,
/// and in which slot". The free queue holds slots that have never been
/// assigned a block; a slot leaves it once and never returns. `available`
/// is maintained incrementally and always equals the number of slots with
/// pin count zero.
///
/// # Thread Safety
/// The pool itself is not synchronized: all mutating operations take
/// `&mut self`, and [`BufferManager`] wraps the whole pool in one mutex.
/// Coarse, but the cross-field invariants (available count ↔ pin counts,
/// residency map ↔ assigned blocks) must change together, so per-field
/// locking buys nothing here.
///
/// # Failure semantics
/// `try_pin`/`try_pin_new` return `Ok(None)` when every slot is pinned:
/// pool exhaustion is an expected condition for the caller to wait out, not
/// an error. When a victim exists but I/O fails, the error propagates and
/// the free queue and residency map keep their pre-call entries.
///
/// [`BufferManager`]: crate::buffer::BufferManager
pub struct BufferPool {
    /// Fixed pool of slots allocated at startup.
    buffers: Vec<BufferHandle>,

    /// Maps resident blocks to the slot caching them.
    residency: HashMap<BlockId, BufferId>,

    /// Slots never yet assigned a block, claimed front-first.
    free: VecDeque<BufferId>,

    /// Number of slots with pin count zero.
    available: usize,

    stats: PoolStats,
}

impl BufferPool {
    /// Create a pool of `pool_size` buffer slots.
    ///
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn new(pool_size: usize, fm: Arc<FileManager>, lm: Arc<LogManager>) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");

        let buffers: Vec<BufferHandle> = (0..pool_size)
            .map(|i| {
                Arc::new(Mutex::new(Buffer::new(
                    BufferId::new(i),
                    Arc::clone(&fm),
                    Arc::clone(&lm),
                )))
            })
            .collect();

        let free: VecDeque<BufferId> = (0..pool_size).map(BufferId::new).collect();

        Self {
            buffers,
            residency: HashMap::with_capacity(pool_size),
            free,
            available: pool_size,
            stats: PoolStats::default(),
        }
    }

    // ========================================================================
    // Public API: Pin lifecycle
    // ========================================================================

    /// Pin a buffer to `block`.
    ///
    /// A resident block reuses its current slot with no eviction. Otherwise
    /// a victim is selected, flushed if dirty, and reassigned to `block`
    /// (reading the block's content from disk). Returns `Ok(None)` when
    /// every slot is pinned.
    pub fn try_pin(&mut self, block: &BlockId) -> Result<Option<BufferHandle>> {
        let id = match self.residency.get(block).copied() {
            Some(id) => {
                self.stats.hits += 1;
                id
            }
            None => {
                self.stats.misses += 1;
                let Some(id) = self.select_victim() else {
                    return Ok(None);
                };
                self.reassign(id, |buf| {
                    buf.assign_to_block(block.clone())?;
                    Ok(block.clone())
                })?
            }
        };

        Ok(Some(self.pin_slot(id)))
    }

    /// Allocate a new block at the end of `file_name`, format it with
    /// `fmtr`, and pin a buffer to it.
    ///
    /// Always claims a victim (the block does not exist yet, so there is no
    /// residency hit). Returns `Ok(None)` without allocating anything when
    /// every slot is pinned.
    pub fn try_pin_new(
        &mut self,
        file_name: &str,
        fmtr: &dyn PageFormatter,
    ) -> Result<Option<BufferHandle>> {
        self.stats.misses += 1;
        let Some(id) = self.select_victim() else {
            return Ok(None);
        };

        let id = self.reassign(id, |buf| buf.assign_to_new(file_name, fmtr))?;

        Ok(Some(self.pin_slot(id)))
    }

    /// Unpin the buffer behind `handle`.
    ///
    /// # Errors
    /// Returns [`Error::NotPinned`] if the buffer's pin count is already
    /// zero; the available count is left untouched.
    ///
    /// [`Error::NotPinned`]: crate::common::Error::NotPinned
    pub fn unpin(&mut self, handle: &BufferHandle) -> Result<()> {
        let mut buf = handle.lock();
        buf.unpin()?;
        if !buf.is_pinned() {
            self.available += 1;
        }
        Ok(())
    }

    /// Flush every buffer dirtied by transaction `tx`.
    ///
    /// Each such buffer has its log record forced and its page written, then
    /// its dirty marker cleared. Buffers dirtied by other transactions are
    /// untouched.
    pub fn flush_all(&mut self, tx: TxId) -> Result<()> {
        for handle in &self.buffers {
            let mut buf = handle.lock();
            if buf.is_modified_by(tx) {
                buf.flush()?;
            }
        }
        Ok(())
    }

    /// Number of currently unpinned buffers.
    #[inline]
    pub fn available(&self) -> usize {
        self.available
    }

    /// Number of slots in the pool.
    #[inline]
    pub fn pool_size(&self) -> usize {
        self.buffers.len()
    }

    // ========================================================================
    // Public API: Diagnostics
    // ========================================================================

    /// Check whether `block` is currently cached.
    pub fn is_resident(&self, block: &BlockId) -> bool {
        self.residency.contains_key(block)
    }

    /// Slot currently caching `block`, if any.
    pub fn buffer_holding(&self, block: &BlockId) -> Option<BufferId> {
        self.residency.get(block).copied()
    }

    /// Per-buffer state snapshots, in slot order.
    pub fn statistics(&self) -> Vec<BufferStats> {
        self.buffers.iter().map(|h| h.lock().stats()).collect()
    }

    /// Aggregate pool counters.
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    // ========================================================================
    // Internal: Victim selection and reassignment
    // ========================================================================

    /// Select a victim slot for reassignment, or None if the pool is
    /// saturated with pins.
    ///
    /// Strict priority order:
    /// 1. Front of the free queue: a never-assigned slot costs nothing.
    /// 2. The unpinned dirty buffer with the smallest recorded LSN. Evicting
    ///    oldest-log-first keeps the log tail that must be forced short.
    ///    Ties go to the lowest slot index.
    /// 3. The first remaining unpinned buffer in ascending slot order.
    ///
    /// Selection only observes state; claiming the victim (free-queue pop,
    /// residency edits) happens in `reassign` after I/O succeeds.
    fn select_victim(&self) -> Option<BufferId> {
        if let Some(&id) = self.free.front() {
            return Some(id);
        }

        // Ascending slot index keeps the scan deterministic regardless of
        // residency-map iteration order.
        let mut resident: Vec<BufferId> = self.residency.values().copied().collect();
        resident.sort_unstable();

        let mut oldest: Option<(Lsn, BufferId)> = None;
        for &id in &resident {
            let buf = self.buffers[id.0].lock();
            if buf.is_pinned() || !buf.is_dirty() {
                continue;
            }
            if let Some(lsn) = buf.lsn() {
                if oldest.is_none_or(|(best, _)| lsn < best) {
                    oldest = Some((lsn, id));
                }
            }
        }
        if let Some((_, id)) = oldest {
            return Some(id);
        }

        resident
            .into_iter()
            .find(|&id| !self.buffers[id.0].lock().is_pinned())
    }

    /// Reassign slot `id` via `assign`, then fix up the free queue and
    /// residency map. `assign` performs the buffer-level work (flush of the
    /// old occupant plus the read or append) and returns the new block.
    fn reassign(
        &mut self,
        id: BufferId,
        assign: impl FnOnce(&mut Buffer) -> Result<BlockId>,
    ) -> Result<BufferId> {
        let handle = Arc::clone(&self.buffers[id.0]);
        let mut buf = handle.lock();

        let old_block = buf.block().cloned();
        let new_block = assign(&mut buf)?;
        drop(buf);

        if self.free.front() == Some(&id) {
            self.free.pop_front();
        }
        if let Some(old) = old_block {
            self.residency.remove(&old);
            self.stats.evictions += 1;
        }
        self.residency.insert(new_block, id);

        Ok(id)
    }

    /// Pin slot `id`, adjusting the available count on the 0→1 transition,
    /// and hand back its shared handle.
    fn pin_slot(&mut self, id: BufferId) -> BufferHandle {
        let handle = Arc::clone(&self.buffers[id.0]);
        {
            let mut buf = handle.lock();
            if !buf.is_pinned() {
                self.available -= 1;
            }
            buf.pin();
        }
        handle
    }
}
