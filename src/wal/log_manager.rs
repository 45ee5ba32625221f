//! Log manager - append-only write-ahead log with explicit force.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use parking_lot::Mutex;

use crate::common::{Lsn, Result};

/// Manages the write-ahead log file.
///
/// Appending a record is cheap: the record is buffered in memory and
/// assigned the next [`Lsn`]. Durability happens on [`flush`]: all buffered
/// records up to and including the requested LSN are written to the log
/// file and fsynced before the call returns. Callers that are about to
/// write a modified page to disk force the log for that page's LSN first.
///
/// # File Layout
/// Records are length-prefixed and laid out back to back:
/// ```text
/// ┌──────┬───────────┬──────┬───────────┬───
/// │ len  │ record 0  │ len  │ record 1  │ ...
/// │ (u32)│ (len B)   │ (u32)│ (len B)   │
/// └──────┴───────────┴──────┴───────────┴───
/// ```
/// LSNs are record ordinals, so reopening an existing log resumes LSN
/// assignment where the last run left off.
///
/// # Thread Safety
/// All state sits behind one internal mutex; the manager is shared as
/// `Arc<LogManager>`.
///
/// [`flush`]: LogManager::flush
pub struct LogManager {
    inner: Mutex<LogInner>,
}

struct LogInner {
    file: File,
    /// LSN the next appended record will receive.
    next_lsn: Lsn,
    /// Highest LSN known durable, if any record has been flushed.
    last_flushed: Option<Lsn>,
    /// Appended but not yet durable records, in LSN order.
    pending: VecDeque<(Lsn, Vec<u8>)>,
}

impl LogManager {
    /// Open (or create) the log file at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or an existing log
    /// cannot be scanned.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        let durable = Self::count_records(&mut file)?;
        file.seek(SeekFrom::End(0))?;

        let next_lsn = Lsn::new(durable);
        let last_flushed = durable.checked_sub(1).map(Lsn::new);

        Ok(Self {
            inner: Mutex::new(LogInner {
                file,
                next_lsn,
                last_flushed,
                pending: VecDeque::new(),
            }),
        })
    }

    /// Append a record to the log and return its LSN.
    ///
    /// The record is *not* durable until a later [`flush`] covers its LSN.
    ///
    /// [`flush`]: LogManager::flush
    pub fn append(&self, record: &[u8]) -> Lsn {
        let mut inner = self.inner.lock();
        let lsn = inner.next_lsn;
        inner.next_lsn = Lsn::new(lsn.0 + 1);
        inner.pending.push_back((lsn, record.to_vec()));
        lsn
    }

    /// Force the log: make every record up to and including `lsn` durable.
    ///
    /// A no-op if those records are already on disk.
    pub fn flush(&self, lsn: Lsn) -> Result<()> {
        let mut inner = self.inner.lock();

        if inner.last_flushed.is_some_and(|f| f >= lsn) {
            return Ok(());
        }

        let mut wrote = false;
        while inner
            .pending
            .front()
            .is_some_and(|(rec_lsn, _)| *rec_lsn <= lsn)
        {
            let (rec_lsn, record) = inner.pending.pop_front().unwrap();
            inner.file.write_all(&(record.len() as u32).to_le_bytes())?;
            inner.file.write_all(&record)?;
            inner.last_flushed = Some(rec_lsn);
            wrote = true;
        }

        if wrote {
            inner.file.sync_all()?;
        }

        Ok(())
    }

    /// Force every appended record to disk.
    pub fn flush_all(&self) -> Result<()> {
        let lsn = {
            let inner = self.inner.lock();
            match inner.next_lsn.0.checked_sub(1) {
                Some(last) => Lsn::new(last),
                None => return Ok(()),
            }
        };
        self.flush(lsn)
    }

    /// Highest LSN known durable, if any.
    pub fn last_flushed(&self) -> Option<Lsn> {
        self.inner.lock().last_flushed
    }

    /// Walk an existing log file and count its records.
    fn count_records(file: &mut File) -> Result<u64> {
        file.seek(SeekFrom::Start(0))?;
        let mut reader = BufReader::new(file);
        let mut count = 0u64;

        loop {
            let mut len_bytes = [0u8; 4];
            match reader.read_exact(&mut len_bytes) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
            let len = u32::from_le_bytes(len_bytes) as i64;
            reader.seek(SeekFrom::Current(len))?;
            count += 1;
        }

        Ok(count)
    }
}
