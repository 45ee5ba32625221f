//! Block identifier type.

use std::fmt;

/// Identifies a fixed-size block within a named file.
///
/// A `BlockId` is a plain immutable value: two ids are equal iff both the
/// file name and the block number are equal, and the same equality drives
/// its use as the residency-map key in the buffer pool.
///
/// # Example
/// ```
/// use corkdb::BlockId;
///
/// let blk = BlockId::new("users.tbl", 3);
/// assert_eq!(blk.file_name(), "users.tbl");
/// assert_eq!(blk.number(), 3);
/// assert_eq!(blk, BlockId::new("users.tbl", 3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId {
    file_name: String,
    number: u64,
}

impl BlockId {
    /// Create a new BlockId.
    pub fn new(file_name: impl Into<String>, number: u64) -> Self {
        BlockId {
            file_name: file_name.into(),
            number,
        }
    }

    /// Name of the file this block belongs to.
    #[inline]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Position of the block within its file.
    #[inline]
    pub fn number(&self) -> u64 {
        self.number
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[file {}, block {}]", self.file_name, self.number)
    }
}
