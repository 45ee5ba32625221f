//! Property-based invariant checks for the buffer pool.
//!
//! Drives the pool with arbitrary pin/unpin sequences and checks the
//! bookkeeping invariants after every step:
//! - `available()` equals pool size minus the number of pinned slots
//! - a resident block maps to exactly one slot, and that slot agrees

use std::sync::Arc;

use corkdb::storage::FileManager;
use corkdb::wal::LogManager;
use corkdb::{BlockId, BufferHandle, BufferPool};
use proptest::prelude::*;

const POOL_SIZE: usize = 4;
const BLOCK_UNIVERSE: u64 = 8;

#[derive(Debug, Clone)]
enum Op {
    /// Pin one of a small universe of blocks (may report unavailable).
    Pin(u64),
    /// Unpin one of the currently outstanding pins, chosen by index.
    Unpin(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..BLOCK_UNIVERSE).prop_map(Op::Pin),
        (0..64usize).prop_map(Op::Unpin),
    ]
}

fn check_invariants(pool: &BufferPool) {
    let stats = pool.statistics();

    let pinned = stats.iter().filter(|s| s.pinned).count();
    assert_eq!(pool.available(), POOL_SIZE - pinned);

    for s in &stats {
        if let Some(block) = &s.block {
            // The slot's assigned block and the residency map agree, and no
            // other slot claims the same block.
            assert!(pool.is_resident(block));
            assert_eq!(pool.buffer_holding(block), Some(s.id));
            let holders = stats
                .iter()
                .filter(|t| t.block.as_ref() == Some(block))
                .count();
            assert_eq!(holders, 1);
        }
    }
}

proptest! {
    #[test]
    fn available_always_matches_unpinned_count(ops in prop::collection::vec(op_strategy(), 1..80)) {
        let dir = tempfile::tempdir().unwrap();
        let fm = Arc::new(FileManager::new(dir.path().join("db")).unwrap());
        let lm = Arc::new(LogManager::new(dir.path().join("wal.log")).unwrap());
        let mut pool = BufferPool::new(POOL_SIZE, fm, lm);

        let mut outstanding: Vec<BufferHandle> = Vec::new();

        for op in ops {
            match op {
                Op::Pin(n) => {
                    let block = BlockId::new("f", n);
                    if let Some(handle) = pool.try_pin(&block).unwrap() {
                        outstanding.push(handle);
                    }
                }
                Op::Unpin(i) => {
                    if !outstanding.is_empty() {
                        let handle = outstanding.swap_remove(i % outstanding.len());
                        pool.unpin(&handle).unwrap();
                    }
                }
            }
            check_invariants(&pool);
        }

        // Drain every pin; the pool must end fully available.
        for handle in outstanding.drain(..) {
            pool.unpin(&handle).unwrap();
        }
        prop_assert_eq!(pool.available(), POOL_SIZE);
    }
}
