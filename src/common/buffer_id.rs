//! Buffer slot identifier type.

use std::fmt;

/// Identifies a slot in the buffer pool.
///
/// Using `usize` because slots live in a `Vec` and the id doubles as the
/// index: `buffers[buffer_id.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub usize);

impl BufferId {
    /// Create a new BufferId.
    #[inline]
    pub fn new(id: usize) -> Self {
        BufferId(id)
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Buffer({})", self.0)
    }
}
