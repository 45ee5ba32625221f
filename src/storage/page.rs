//! Page - the in-memory image of one disk block.
//!
//! A [`Page`] is a raw `BLOCK_SIZE` byte array, the unit of I/O between a
//! buffer slot and the file layer.

use crate::common::config::BLOCK_SIZE;

/// A page of data (one block, 4KB-aligned).
///
/// # Memory Layout
/// - Size: `BLOCK_SIZE` bytes (4096)
/// - Alignment: 4096 bytes (for efficient Direct I/O with O_DIRECT)
///
/// Besides raw slice access, a page offers little-endian `u32` accessors:
/// enough for record headers and the page formatters used by tests. A page
/// does not implement `Clone` outside of tests; copying 4KB should be
/// explicit.
///
/// # Example
/// ```
/// use corkdb::storage::Page;
///
/// let mut page = Page::new();
/// page.write_u32(0, 0xDEAD_BEEF);
/// assert_eq!(page.read_u32(0), 0xDEAD_BEEF);
/// ```
#[repr(align(4096))]
pub struct Page {
    data: [u8; BLOCK_SIZE],
}

impl Page {
    /// Create a new zeroed page.
    #[inline]
    pub fn new() -> Self {
        Self {
            data: [0u8; BLOCK_SIZE],
        }
    }

    /// Get immutable slice of page data.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Get mutable slice of page data.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Zero out the entire page.
    pub fn reset(&mut self) {
        self.data.fill(0);
    }

    /// Get the size of a page.
    #[inline]
    pub const fn size() -> usize {
        BLOCK_SIZE
    }

    /// Read a little-endian `u32` at `offset`.
    ///
    /// # Panics
    /// Panics if `offset + 4` exceeds the page size.
    #[inline]
    pub fn read_u32(&self, offset: usize) -> u32 {
        let bytes: [u8; 4] = self.data[offset..offset + 4].try_into().unwrap();
        u32::from_le_bytes(bytes)
    }

    /// Write a little-endian `u32` at `offset`.
    ///
    /// # Panics
    /// Panics if `offset + 4` exceeds the page size.
    #[inline]
    pub fn write_u32(&mut self, offset: usize, value: u32) {
        self.data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

// Clone only available in tests - forces explicit copying in production
#[cfg(test)]
impl Clone for Page {
    fn clone(&self) -> Self {
        let mut new_page = Page::new();
        new_page.data.copy_from_slice(&self.data);
        new_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_and_alignment() {
        assert_eq!(std::mem::size_of::<Page>(), BLOCK_SIZE);
        assert_eq!(std::mem::align_of::<Page>(), 4096);
    }

    #[test]
    fn test_page_new_is_zeroed() {
        let page = Page::new();
        assert_eq!(page.as_slice()[0], 0);
        assert_eq!(page.as_slice()[BLOCK_SIZE - 1], 0);
    }

    #[test]
    fn test_page_read_write() {
        let mut page = Page::new();

        page.as_mut_slice()[0] = 0xFF;
        page.as_mut_slice()[BLOCK_SIZE - 1] = 0xCD;

        assert_eq!(page.as_slice()[0], 0xFF);
        assert_eq!(page.as_slice()[BLOCK_SIZE - 1], 0xCD);
    }

    #[test]
    fn test_page_u32_round_trip() {
        let mut page = Page::new();
        page.write_u32(100, 123_456_789);
        assert_eq!(page.read_u32(100), 123_456_789);

        // Neighbors untouched
        assert_eq!(page.as_slice()[99], 0);
        assert_eq!(page.as_slice()[104], 0);
    }

    #[test]
    fn test_page_reset() {
        let mut page = Page::new();
        page.as_mut_slice()[10] = 0xAB;
        page.write_u32(200, 7);

        page.reset();

        assert_eq!(page.as_slice()[10], 0);
        assert_eq!(page.read_u32(200), 0);
    }
}
