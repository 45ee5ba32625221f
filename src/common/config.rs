//! Configuration constants for corkdb.

use std::time::Duration;

/// Size of a disk block in bytes (4KB).
///
/// Matches the OS page size on most systems, so a block is the natural
/// unit of I/O between the buffer pool and the file layer.
pub const BLOCK_SIZE: usize = 4096;

/// Default number of buffer slots in the pool.
///
/// The pool bounds both cache capacity and the number of concurrent pins;
/// it never grows after construction.
pub const DEFAULT_POOL_SIZE: usize = 8;

/// Default time a caller waits for a buffer to free up before
/// `pin`/`pin_new` gives up with [`Error::PinTimeout`].
///
/// [`Error::PinTimeout`]: crate::common::Error::PinTimeout
pub const DEFAULT_PIN_TIMEOUT: Duration = Duration::from_secs(10);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_size_is_power_of_two() {
        assert!(BLOCK_SIZE.is_power_of_two());
        assert_eq!(BLOCK_SIZE, 4096);
    }

    #[test]
    fn test_default_pool_size_nonzero() {
        assert!(DEFAULT_POOL_SIZE > 0);
    }
}
