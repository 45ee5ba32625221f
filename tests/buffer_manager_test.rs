//! Buffer manager integration tests.
//!
//! These exercise the full stack - facade, pool, buffer slots, file layer,
//! and write-ahead log - through the public API.

use std::sync::Arc;
use std::time::Duration;

use corkdb::storage::FileManager;
use corkdb::wal::LogManager;
use corkdb::{BlockId, BufferId, BufferManager, BufferPool, Error, Page, TxId};
use tempfile::tempdir;

fn create_pool(pool_size: usize) -> (BufferPool, Arc<LogManager>, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let fm = Arc::new(FileManager::new(dir.path().join("db")).unwrap());
    let lm = Arc::new(LogManager::new(dir.path().join("wal.log")).unwrap());
    (BufferPool::new(pool_size, fm, Arc::clone(&lm)), lm, dir)
}

fn create_manager(pool_size: usize) -> (BufferManager, Arc<LogManager>, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let fm = Arc::new(FileManager::new(dir.path().join("db")).unwrap());
    let lm = Arc::new(LogManager::new(dir.path().join("wal.log")).unwrap());
    let mgr = BufferManager::with_timeout(
        pool_size,
        fm,
        Arc::clone(&lm),
        Duration::from_millis(50),
    );
    (mgr, lm, dir)
}

// ============================================================================
// Pool saturation scenario (three-slot pool)
// ============================================================================

#[test]
fn test_saturation_and_reclaim_scenario() {
    let (mut pool, _lm, _dir) = create_pool(3);

    let blk_a = BlockId::new("f", 0);
    let a = pool.try_pin(&blk_a).unwrap().unwrap();
    let slot_a = a.lock().id();
    assert_eq!(pool.available(), 2);

    let _b = pool.try_pin(&BlockId::new("f", 1)).unwrap().unwrap();
    assert_eq!(pool.available(), 1);

    let _c = pool.try_pin(&BlockId::new("f", 2)).unwrap().unwrap();
    assert_eq!(pool.available(), 0);

    // No unpinned buffer: pin reports unavailable without touching state.
    let blk_d = BlockId::new("f", 3);
    assert!(pool.try_pin(&blk_d).unwrap().is_none());
    assert_eq!(pool.available(), 0);

    pool.unpin(&a).unwrap();
    assert_eq!(pool.available(), 1);

    // D lands in A's old slot; A is no longer resident.
    let d = pool.try_pin(&blk_d).unwrap().unwrap();
    assert_eq!(d.lock().id(), slot_a);
    assert!(pool.is_resident(&blk_d));
    assert!(!pool.is_resident(&blk_a));
}

// ============================================================================
// Replacement policy: oldest logged modification wins
// ============================================================================

#[test]
fn test_victim_is_dirty_buffer_with_lowest_lsn() {
    let (mut pool, lm, _dir) = create_pool(3);

    let a = pool.try_pin(&BlockId::new("f", 0)).unwrap().unwrap();
    let b = pool.try_pin(&BlockId::new("f", 1)).unwrap().unwrap();
    let c = pool.try_pin(&BlockId::new("f", 2)).unwrap().unwrap();
    let slot_c = c.lock().id();

    let lsn_old = lm.append(b"older record");
    let lsn_new = lm.append(b"newer record");

    b.lock().set_modified(TxId::new(7), Some(lsn_new));
    c.lock().set_modified(TxId::new(7), Some(lsn_old));

    pool.unpin(&a).unwrap();
    pool.unpin(&b).unwrap();
    pool.unpin(&c).unwrap();
    assert_eq!(pool.available(), 3);

    // All three are candidates; the policy must take the buffer holding C
    // (lowest LSN among dirty buffers), not clean A or newer-LSN B.
    let fmtr = |_page: &mut Page| {};
    let e = pool.try_pin_new("f", &fmtr).unwrap().unwrap();
    assert_eq!(e.lock().id(), slot_c);
    assert!(pool.is_resident(&BlockId::new("f", 0)));
    assert!(pool.is_resident(&BlockId::new("f", 1)));
    assert!(!pool.is_resident(&BlockId::new("f", 2)));

    // C's log record was forced before its page was overwritten.
    assert!(lm.last_flushed() >= Some(lsn_old));
}

#[test]
fn test_hit_on_resident_block_never_evicts() {
    let (mut pool, _lm, _dir) = create_pool(2);

    let blk_a = BlockId::new("f", 0);
    let blk_b = BlockId::new("f", 1);
    let _a = pool.try_pin(&blk_a).unwrap().unwrap();
    let _b = pool.try_pin(&blk_b).unwrap().unwrap();

    let before: Vec<_> = pool.statistics().iter().map(|s| s.block.clone()).collect();

    let a2 = pool.try_pin(&blk_a).unwrap().unwrap();
    assert_eq!(a2.lock().pin_count(), 2);

    let after: Vec<_> = pool.statistics().iter().map(|s| s.block.clone()).collect();
    assert_eq!(before, after);
    assert_eq!(pool.stats().evictions, 0);
}

// ============================================================================
// flush_all and the write-ahead rule
// ============================================================================

#[test]
fn test_flush_all_persists_only_the_given_transaction() {
    let dir = tempdir().unwrap();
    let fm = Arc::new(FileManager::new(dir.path().join("db")).unwrap());
    let lm = Arc::new(LogManager::new(dir.path().join("wal.log")).unwrap());
    let mut pool = BufferPool::new(4, Arc::clone(&fm), lm);

    let blk_a = BlockId::new("f", 0);
    let blk_b = BlockId::new("f", 1);
    let a = pool.try_pin(&blk_a).unwrap().unwrap();
    let b = pool.try_pin(&blk_b).unwrap().unwrap();

    {
        let mut guard = a.lock();
        guard.contents_mut().write_u32(0, 111);
        guard.set_modified(TxId::new(1), None);
    }
    {
        let mut guard = b.lock();
        guard.contents_mut().write_u32(0, 222);
        guard.set_modified(TxId::new(2), None);
    }

    pool.flush_all(TxId::new(1)).unwrap();

    // Tx 1's page reached disk; tx 2's did not.
    let mut page = Page::new();
    fm.read(&blk_a, &mut page).unwrap();
    assert_eq!(page.read_u32(0), 111);
    fm.read(&blk_b, &mut page).unwrap();
    assert_eq!(page.read_u32(0), 0);

    assert!(!a.lock().is_dirty());
    assert!(b.lock().is_dirty());
}

#[test]
fn test_flush_all_twice_writes_once() {
    let (mut pool, _lm, _dir) = create_pool(2);

    let a = pool.try_pin(&BlockId::new("f", 0)).unwrap().unwrap();
    {
        let mut guard = a.lock();
        guard.contents_mut().write_u32(0, 5);
        guard.set_modified(TxId::new(1), None);
    }

    pool.flush_all(TxId::new(1)).unwrap();
    let writes_after_first = a.lock().stats().writes;

    // No intervening modification: the second flush is a no-op.
    pool.flush_all(TxId::new(1)).unwrap();
    assert_eq!(a.lock().stats().writes, writes_after_first);
}

#[test]
fn test_log_forced_before_eviction_write_back() {
    let (mut pool, lm, _dir) = create_pool(1);

    let a = pool.try_pin(&BlockId::new("f", 0)).unwrap().unwrap();
    let lsn = lm.append(b"change f:0");
    {
        let mut guard = a.lock();
        guard.contents_mut().write_u32(0, 9);
        guard.set_modified(TxId::new(3), Some(lsn));
    }
    pool.unpin(&a).unwrap();
    assert_eq!(lm.last_flushed(), None);

    // Evicting the dirty buffer forces its log record first.
    let _b = pool.try_pin(&BlockId::new("f", 1)).unwrap().unwrap();
    assert!(lm.last_flushed() >= Some(lsn));
}

// ============================================================================
// Content freshness across reassignment
// ============================================================================

#[test]
fn test_repinned_block_reads_fresh_content() {
    let (mut pool, _lm, _dir) = create_pool(1);

    let blk_a = BlockId::new("f", 0);
    let a = pool.try_pin(&blk_a).unwrap().unwrap();
    {
        let mut guard = a.lock();
        guard.contents_mut().write_u32(0, 0xAAAA);
        guard.set_modified(TxId::new(1), None);
    }
    pool.unpin(&a).unwrap();

    // Evict A: its slot is reassigned to B, whose never-written block must
    // read back zeroed, not as A's leftover bytes.
    let b = pool.try_pin(&BlockId::new("f", 1)).unwrap().unwrap();
    assert_eq!(b.lock().contents().read_u32(0), 0);
    pool.unpin(&b).unwrap();

    // Re-pinning A fetches its flushed content from storage.
    let a2 = pool.try_pin(&blk_a).unwrap().unwrap();
    assert_eq!(a2.lock().contents().read_u32(0), 0xAAAA);
}

// ============================================================================
// pin_new through the facade
// ============================================================================

#[test]
fn test_pin_new_formats_and_maps_the_new_block() {
    let (mgr, _lm, _dir) = create_manager(2);

    let fmtr = |page: &mut Page| page.write_u32(0, 0xBEEF);
    let buf = mgr.pin_new("seg", &fmtr).unwrap();

    let new_block = buf.lock().block().cloned().unwrap();
    assert_eq!(new_block, BlockId::new("seg", 0));
    assert_eq!(buf.lock().contents().read_u32(0), 0xBEEF);

    // Exactly one slot maps to the new block.
    assert_eq!(mgr.buffer_holding(&new_block), Some(buf.lock().id()));
    let holders = mgr
        .statistics()
        .iter()
        .filter(|s| s.block.as_ref() == Some(&new_block))
        .count();
    assert_eq!(holders, 1);

    mgr.unpin(&buf).unwrap();

    let next = mgr.pin_new("seg", &fmtr).unwrap();
    assert_eq!(next.lock().block().cloned().unwrap(), BlockId::new("seg", 1));
}

// ============================================================================
// Facade wait/timeout semantics
// ============================================================================

#[test]
fn test_facade_times_out_when_pool_stays_saturated() {
    let (mgr, _lm, _dir) = create_manager(2);

    let _a = mgr.pin(&BlockId::new("f", 0)).unwrap();
    let _b = mgr.pin(&BlockId::new("f", 1)).unwrap();

    assert!(matches!(
        mgr.pin(&BlockId::new("f", 2)),
        Err(Error::PinTimeout)
    ));
    let fmtr = |_page: &mut Page| {};
    assert!(matches!(mgr.pin_new("f", &fmtr), Err(Error::PinTimeout)));
}

#[test]
fn test_unpin_not_pinned_is_reported() {
    let (mgr, _lm, _dir) = create_manager(2);

    let a = mgr.pin(&BlockId::new("f", 0)).unwrap();
    mgr.unpin(&a).unwrap();

    match mgr.unpin(&a) {
        Err(Error::NotPinned(id)) => assert_eq!(id, BufferId::new(0)),
        other => panic!("expected NotPinned, got {:?}", other.map(|_| ())),
    }
    assert_eq!(mgr.available(), 2);
}

// ============================================================================
// Statistics surface
// ============================================================================

#[test]
fn test_statistics_reflect_buffer_state() {
    let (mgr, lm, _dir) = create_manager(2);

    let blk = BlockId::new("f", 0);
    let buf = mgr.pin(&blk).unwrap();
    let lsn = lm.append(b"change");
    buf.lock().set_modified(TxId::new(7), Some(lsn));

    let stats = mgr.statistics();
    assert_eq!(stats.len(), 2);

    let s = &stats[0];
    assert_eq!(s.id, BufferId::new(0));
    assert_eq!(s.block.as_ref(), Some(&blk));
    assert_eq!(s.modified_by, Some(TxId::new(7)));
    assert_eq!(s.lsn, Some(lsn));
    assert_eq!(s.pin_count, 1);
    assert!(s.pinned);
    assert_eq!(s.reads, 1);

    assert_eq!(stats[1].block, None);
    assert!(!stats[1].pinned);

    mgr.unpin(&buf).unwrap();
}
