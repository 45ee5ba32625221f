//! File manager - blocked file I/O for database files.
//!
//! The [`FileManager`] handles all direct file operations:
//! - Reading and writing blocks of named files
//! - Appending new blocks (file growth)
//! - Caching open file handles for the database directory

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use parking_lot::Mutex;

use crate::common::config::BLOCK_SIZE;
use crate::common::{BlockId, Result};
use crate::storage::Page;

/// Manages block-granular I/O for every file in a database directory.
///
/// # File Layout
/// Each database file is a sequence of fixed-size blocks:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┐
/// │ Block 0 │ Block 1 │ Block 2 │  ...    │
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │
/// └─────────┴─────────┴─────────┴─────────┘
/// ```
/// Block N of a file lives at offset `N × BLOCK_SIZE`.
///
/// Reading a block past the current end of its file fills the page with
/// zeros instead of failing: files grow on demand, and a block that has
/// never been written reads back as empty.
///
/// # Thread Safety
/// All I/O goes through one internal mutex over the open-file table, so the
/// file manager can be shared (`Arc<FileManager>`) and called from `&self`.
///
/// # Durability
/// Block writes and appends are followed by `fsync()`.
pub struct FileManager {
    db_dir: PathBuf,
    open_files: Mutex<HashMap<String, File>>,
}

impl FileManager {
    /// Open a database directory, creating it if needed.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn new(db_dir: impl Into<PathBuf>) -> Result<Self> {
        let db_dir = db_dir.into();
        fs::create_dir_all(&db_dir)?;

        Ok(Self {
            db_dir,
            open_files: Mutex::new(HashMap::new()),
        })
    }

    /// Read the contents of `block` into `page`.
    ///
    /// A block beyond the end of the file yields a zeroed page.
    pub fn read(&self, block: &BlockId, page: &mut Page) -> Result<()> {
        let mut files = self.open_files.lock();
        let file = self.file_for(&mut files, block.file_name())?;

        let offset = block.number() * BLOCK_SIZE as u64;
        let len = file.metadata()?.len();

        if offset >= len {
            page.reset();
            return Ok(());
        }

        file.seek(SeekFrom::Start(offset))?;

        let avail = ((len - offset) as usize).min(BLOCK_SIZE);
        file.read_exact(&mut page.as_mut_slice()[..avail])?;
        page.as_mut_slice()[avail..].fill(0);

        Ok(())
    }

    /// Write `page` to `block`, extending the file if necessary.
    pub fn write(&self, block: &BlockId, page: &Page) -> Result<()> {
        let mut files = self.open_files.lock();
        let file = self.file_for(&mut files, block.file_name())?;

        let offset = block.number() * BLOCK_SIZE as u64;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(page.as_slice())?;
        file.sync_all()?;

        Ok(())
    }

    /// Append a new block holding `page` to the end of `file_name`.
    ///
    /// Returns the id of the newly allocated block.
    pub fn append(&self, file_name: &str, page: &Page) -> Result<BlockId> {
        let mut files = self.open_files.lock();
        let file = self.file_for(&mut files, file_name)?;

        let number = file.metadata()?.len() / BLOCK_SIZE as u64;
        let block = BlockId::new(file_name, number);

        file.seek(SeekFrom::Start(number * BLOCK_SIZE as u64))?;
        file.write_all(page.as_slice())?;
        file.sync_all()?;

        Ok(block)
    }

    /// Number of blocks currently in `file_name` (0 if it does not exist yet).
    pub fn block_count(&self, file_name: &str) -> Result<u64> {
        let mut files = self.open_files.lock();
        let file = self.file_for(&mut files, file_name)?;
        Ok(file.metadata()?.len() / BLOCK_SIZE as u64)
    }

    /// Get the open handle for `file_name`, opening (and creating) it on
    /// first use. Must be called with the open-file table locked.
    fn file_for<'a>(
        &self,
        files: &'a mut HashMap<String, File>,
        file_name: &str,
    ) -> Result<&'a mut File> {
        if !files.contains_key(file_name) {
            let path = self.db_dir.join(file_name);
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .open(path)?;
            files.insert(file_name.to_string(), file);
        }

        Ok(files.get_mut(file_name).unwrap())
    }
}
