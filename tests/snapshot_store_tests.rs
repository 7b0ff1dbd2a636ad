// SnapshotStore under concurrent writers and readers: no facet is ever observed half-applied

use hostpulse::models::{MemoryStats, Snapshot};
use hostpulse::snapshot_store::{Facet, SnapshotStore};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[test]
fn concurrent_updates_never_tear_a_facet() {
    let store = Arc::new(SnapshotStore::new());
    let stop = Arc::new(AtomicBool::new(false));

    // Each writer publishes memory readings whose fields all derive from the same k.
    let writers: Vec<_> = (1..=4u64)
        .map(|w| {
            let store = store.clone();
            std::thread::spawn(move || {
                for i in 0..2_000u64 {
                    let k = w * 1_000_000 + i;
                    store.update(Facet::Memory(MemoryStats::new(2 * k, k, k, k)));
                    store.update(Facet::CpuLoad(k as f64));
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..2)
        .map(|_| {
            let store = store.clone();
            let stop = stop.clone();
            std::thread::spawn(move || {
                let mut seen = 0u64;
                while !stop.load(Ordering::Relaxed) {
                    let s = store.read();
                    let m = &s.memory;
                    assert_eq!(m.total_bytes, 2 * m.used_bytes, "torn memory facet: {:?}", m);
                    assert_eq!(m.free_bytes, m.used_bytes, "torn memory facet: {:?}", m);
                    assert_eq!(m.active_bytes, m.used_bytes, "torn memory facet: {:?}", m);
                    if m.total_bytes > 0 {
                        assert_eq!(m.used_percent, 50.0);
                    }
                    seen += 1;
                }
                seen
            })
        })
        .collect();

    for w in writers {
        w.join().unwrap();
    }
    stop.store(true, Ordering::Relaxed);
    for r in readers {
        assert!(r.join().unwrap() > 0);
    }
}

#[test]
fn read_returns_independent_copy() {
    let store = SnapshotStore::new();
    let before = store.read();
    store.update(Facet::CpuLoad(80.0));
    assert_eq!(before, Snapshot::default());
    assert_eq!(store.read().cpu.current_load_percent, 80.0);
}

#[test]
fn memory_percent_is_zero_when_total_is_zero() {
    let m = MemoryStats::new(0, 0, 0, 0);
    assert_eq!(m.used_percent, 0.0);
    let m = MemoryStats::new(400, 100, 100, 50);
    assert_eq!(m.used_percent, 25.0);
}
