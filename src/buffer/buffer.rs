//! Buffer - a slot in the buffer pool.
//!
//! A [`Buffer`] holds a [`Page`] plus the metadata needed for buffer
//! management:
//! - Which block is loaded (if any)
//! - Pin count for reference counting
//! - The transaction and log record behind the latest modification

use std::sync::Arc;

use crate::common::{BlockId, BufferId, Error, Lsn, Result, TxId};
use crate::storage::{FileManager, Page};
use crate::wal::LogManager;

use super::stats::BufferStats;

/// Initializes the typed layout of a freshly allocated block.
///
/// Supplied by the caller of `pin_new`: the pool hands the formatter a
/// zeroed page and writes the result out as the new block's first image.
pub trait PageFormatter {
    /// Format `page` in place.
    fn format(&self, page: &mut Page);
}

impl<F: Fn(&mut Page)> PageFormatter for F {
    fn format(&self, page: &mut Page) {
        self(page)
    }
}

/// An in-memory slot caching at most one block's content.
///
/// Buffers are constructed once at pool start-up and perpetually reused: a
/// slot goes from unassigned to its first block the first time it is chosen,
/// and from then on cycles between blocks for the life of the pool.
///
/// # Dirty state
/// A buffer is dirty iff `modified_by` is set. A dirty buffer also carries
/// the LSN of the log record describing its latest modification (when one
/// exists); [`flush`] forces the log up to that LSN *before* the page write,
/// which is the only write-back path. The write-ahead rule is therefore
/// structural, not a runtime check.
///
/// # Pin discipline
/// The pool updates pin counts under its own lock. Content access through
/// [`contents`]/[`contents_mut`] is only legal for a caller holding a pin;
/// the pin itself is the synchronization token for the page bytes.
///
/// [`flush`]: Buffer::flush
/// [`contents`]: Buffer::contents
/// [`contents_mut`]: Buffer::contents_mut
pub struct Buffer {
    fm: Arc<FileManager>,
    lm: Arc<LogManager>,

    /// Identity within the pool, fixed at construction.
    id: BufferId,

    /// The cached page image.
    contents: Page,

    /// Block currently assigned, or None if never assigned.
    block: Option<BlockId>,

    /// Number of active claims on this slot.
    pins: u32,

    /// Transaction behind the latest unflushed modification, if dirty.
    modified_by: Option<TxId>,

    /// LSN of the log record for the latest modification, if logged.
    lsn: Option<Lsn>,

    /// Cumulative blocks read into this slot.
    reads: u64,

    /// Cumulative page images written out of this slot.
    writes: u64,
}

impl Buffer {
    /// Create a new unassigned buffer.
    pub(crate) fn new(id: BufferId, fm: Arc<FileManager>, lm: Arc<LogManager>) -> Self {
        Self {
            fm,
            lm,
            id,
            contents: Page::new(),
            block: None,
            pins: 0,
            modified_by: None,
            lsn: None,
            reads: 0,
            writes: 0,
        }
    }

    /// This buffer's fixed slot id.
    #[inline]
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Block currently cached in this slot, if any.
    #[inline]
    pub fn block(&self) -> Option<&BlockId> {
        self.block.as_ref()
    }

    /// Read access to the cached page. Caller must hold a pin.
    #[inline]
    pub fn contents(&self) -> &Page {
        &self.contents
    }

    /// Write access to the cached page. Caller must hold a pin and must
    /// record the modification with [`set_modified`].
    ///
    /// [`set_modified`]: Buffer::set_modified
    #[inline]
    pub fn contents_mut(&mut self) -> &mut Page {
        &mut self.contents
    }

    /// Record that `tx` modified this page, optionally with the LSN of the
    /// log record describing the change.
    ///
    /// Passing `None` for `lsn` keeps any previously recorded LSN (the
    /// modification was not separately logged).
    pub fn set_modified(&mut self, tx: TxId, lsn: Option<Lsn>) {
        self.modified_by = Some(tx);
        if lsn.is_some() {
            self.lsn = lsn;
        }
    }

    /// Check if the buffer is currently pinned.
    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pins > 0
    }

    /// Get the current pin count.
    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.pins
    }

    /// Check if the latest unflushed modification belongs to `tx`.
    #[inline]
    pub fn is_modified_by(&self, tx: TxId) -> bool {
        self.modified_by == Some(tx)
    }

    /// Check if the buffer holds a modification not yet written to disk.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.modified_by.is_some()
    }

    /// LSN of the latest logged modification, if any.
    #[inline]
    pub fn lsn(&self) -> Option<Lsn> {
        self.lsn
    }

    /// Increment the pin count.
    pub(crate) fn pin(&mut self) {
        self.pins += 1;
    }

    /// Decrement the pin count.
    ///
    /// # Errors
    /// Returns [`Error::NotPinned`] if the pin count is already zero.
    pub(crate) fn unpin(&mut self) -> Result<()> {
        if self.pins == 0 {
            return Err(Error::NotPinned(self.id));
        }
        self.pins -= 1;
        Ok(())
    }

    /// Assign this buffer to `block`, reading the block's content into the
    /// slot. A dirty previous occupant is flushed first.
    pub(crate) fn assign_to_block(&mut self, block: BlockId) -> Result<()> {
        self.flush()?;
        self.fm.read(&block, &mut self.contents)?;
        self.block = Some(block);
        self.reads += 1;
        Ok(())
    }

    /// Assign this buffer to a brand-new block appended to `file_name`,
    /// formatted by `fmtr`. A dirty previous occupant is flushed first.
    ///
    /// Returns the id of the new block.
    pub(crate) fn assign_to_new(
        &mut self,
        file_name: &str,
        fmtr: &dyn PageFormatter,
    ) -> Result<BlockId> {
        self.flush()?;
        self.contents.reset();
        fmtr.format(&mut self.contents);
        let block = self.fm.append(file_name, &self.contents)?;
        self.block = Some(block.clone());
        self.writes += 1;
        Ok(block)
    }

    /// Write the buffer back to disk if it is dirty.
    ///
    /// The log is forced up to the buffer's recorded LSN before the page
    /// write, then the dirty marker is cleared. Calling `flush` on a clean
    /// buffer is a no-op, so back-to-back flushes never write twice.
    pub(crate) fn flush(&mut self) -> Result<()> {
        if self.modified_by.is_some() {
            if let Some(lsn) = self.lsn {
                self.lm.flush(lsn)?;
            }
            if let Some(block) = &self.block {
                self.fm.write(block, &self.contents)?;
                self.writes += 1;
            }
            self.modified_by = None;
        }
        Ok(())
    }

    /// Read-only snapshot of this buffer's state for diagnostics.
    pub fn stats(&self) -> BufferStats {
        BufferStats {
            id: self.id,
            block: self.block.clone(),
            modified_by: self.modified_by,
            lsn: self.lsn,
            pin_count: self.pins,
            pinned: self.is_pinned(),
            reads: self.reads,
            writes: self.writes,
        }
    }
}
