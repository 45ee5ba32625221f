//! Buffer manager - the synchronized gateway to the pool.
//!
//! Wraps [`BufferPool`] with the blocking semantics callers actually want:
//! when every slot is pinned, `pin`/`pin_new` wait for a buffer to free up
//! instead of failing immediately, up to a bounded timeout.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::common::config::{DEFAULT_PIN_TIMEOUT, DEFAULT_POOL_SIZE};
use crate::common::{BlockId, BufferId, Error, Result, TxId};
use crate::storage::FileManager;
use crate::wal::LogManager;

use super::buffer::PageFormatter;
use super::pool::{BufferHandle, BufferPool};
use super::stats::{BufferStats, PoolStats};

/// The public face of the buffer layer.
///
/// One mutex guards the whole pool; a condition variable wakes waiting
/// pinners whenever an unpin raises the available count above zero. A pin
/// request that cannot be satisfied within the configured timeout fails
/// with [`Error::PinTimeout`], which callers treat as a signal to abort the
/// requesting transaction.
///
/// # Lock discipline
/// Never call back into the manager while holding a buffer handle's lock:
/// the manager locks individual buffers under the pool lock, and the
/// reverse order deadlocks.
///
/// # Usage
/// ```no_run
/// use std::sync::Arc;
/// use corkdb::{BufferManager, BlockId, TxId};
/// use corkdb::storage::FileManager;
/// use corkdb::wal::LogManager;
///
/// # fn main() -> corkdb::Result<()> {
/// let fm = Arc::new(FileManager::new("db")?);
/// let lm = Arc::new(LogManager::new("db/wal.log")?);
/// let mgr = BufferManager::new(8, fm, Arc::clone(&lm));
///
/// let buf = mgr.pin(&BlockId::new("users.tbl", 0))?;
/// {
///     let mut guard = buf.lock();
///     let lsn = lm.append(b"update users.tbl:0");
///     guard.contents_mut().write_u32(0, 42);
///     guard.set_modified(TxId::new(1), Some(lsn));
/// }
/// mgr.unpin(&buf)?;
/// mgr.flush_all(TxId::new(1))?;
/// # Ok(())
/// # }
/// ```
pub struct BufferManager {
    pool: Mutex<BufferPool>,
    /// Signaled when `available` rises above zero.
    available_cond: Condvar,
    pin_timeout: Duration,
}

impl BufferManager {
    /// Create a buffer manager over a pool of `pool_size` slots.
    pub fn new(pool_size: usize, fm: Arc<FileManager>, lm: Arc<LogManager>) -> Self {
        Self::with_timeout(pool_size, fm, lm, DEFAULT_PIN_TIMEOUT)
    }

    /// Like [`new`], with an explicit pin-wait timeout.
    ///
    /// [`new`]: BufferManager::new
    pub fn with_timeout(
        pool_size: usize,
        fm: Arc<FileManager>,
        lm: Arc<LogManager>,
        pin_timeout: Duration,
    ) -> Self {
        Self {
            pool: Mutex::new(BufferPool::new(pool_size, fm, lm)),
            available_cond: Condvar::new(),
            pin_timeout,
        }
    }

    /// Create a buffer manager with the default pool size.
    pub fn with_defaults(fm: Arc<FileManager>, lm: Arc<LogManager>) -> Self {
        Self::new(DEFAULT_POOL_SIZE, fm, lm)
    }

    /// Pin a buffer to `block`, waiting if the pool is saturated.
    ///
    /// # Errors
    /// - [`Error::PinTimeout`] if no buffer frees up in time
    /// - I/O errors from reading the block or flushing a victim
    pub fn pin(&self, block: &BlockId) -> Result<BufferHandle> {
        self.pin_with(|pool| pool.try_pin(block))
    }

    /// Allocate, format, and pin a new block at the end of `file_name`,
    /// waiting if the pool is saturated.
    ///
    /// Nothing is appended to the file until a buffer is actually claimed.
    ///
    /// # Errors
    /// - [`Error::PinTimeout`] if no buffer frees up in time
    /// - I/O errors from the append or from flushing a victim
    pub fn pin_new(&self, file_name: &str, fmtr: &dyn PageFormatter) -> Result<BufferHandle> {
        self.pin_with(|pool| pool.try_pin_new(file_name, fmtr))
    }

    /// Unpin the buffer behind `handle` and wake waiting pinners if a slot
    /// became available.
    pub fn unpin(&self, handle: &BufferHandle) -> Result<()> {
        let mut pool = self.pool.lock();
        pool.unpin(handle)?;
        if pool.available() > 0 {
            self.available_cond.notify_all();
        }
        Ok(())
    }

    /// Flush every buffer dirtied by transaction `tx`.
    pub fn flush_all(&self, tx: TxId) -> Result<()> {
        self.pool.lock().flush_all(tx)
    }

    /// Number of currently unpinned buffers.
    pub fn available(&self) -> usize {
        self.pool.lock().available()
    }

    /// Number of slots in the pool.
    pub fn pool_size(&self) -> usize {
        self.pool.lock().pool_size()
    }

    /// Check whether `block` is currently cached.
    pub fn is_resident(&self, block: &BlockId) -> bool {
        self.pool.lock().is_resident(block)
    }

    /// Slot currently caching `block`, if any.
    pub fn buffer_holding(&self, block: &BlockId) -> Option<BufferId> {
        self.pool.lock().buffer_holding(block)
    }

    /// Per-buffer state snapshots, in slot order.
    pub fn statistics(&self) -> Vec<BufferStats> {
        self.pool.lock().statistics()
    }

    /// Aggregate pool counters.
    pub fn stats(&self) -> PoolStats {
        self.pool.lock().stats()
    }

    /// Retry `attempt` under the pool lock until it yields a buffer, a
    /// caller-fatal error, or the deadline passes.
    fn pin_with(
        &self,
        mut attempt: impl FnMut(&mut BufferPool) -> Result<Option<BufferHandle>>,
    ) -> Result<BufferHandle> {
        let deadline = Instant::now() + self.pin_timeout;
        let mut pool = self.pool.lock();

        loop {
            if let Some(handle) = attempt(&mut pool)? {
                return Ok(handle);
            }
            if self
                .available_cond
                .wait_until(&mut pool, deadline)
                .timed_out()
            {
                return Err(Error::PinTimeout);
            }
        }
    }
}
