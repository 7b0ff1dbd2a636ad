// Single owner of the live Snapshot. Writers replace one facet at a time; readers get a copy.

use std::sync::{PoisonError, RwLock};

use crate::models::{CpuIdentity, DiskUsage, InterfaceRate, MemoryStats, Snapshot};

/// One independently refreshed slice of the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Facet {
    /// Static CPU fields; leaves the current load untouched.
    CpuIdentity(CpuIdentity),
    CpuLoad(f64),
    Memory(MemoryStats),
    Network(Vec<InterfaceRate>),
    Disk(Vec<DiskUsage>),
    /// Ignored when lower than the stored value, so uptime never goes backwards.
    Uptime(u64),
}

#[derive(Debug, Default)]
pub struct SnapshotStore {
    inner: RwLock<Snapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replaces one facet.
    pub fn update(&self, facet: Facet) {
        let mut snapshot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut snapshot, facet);
    }

    /// Applies a bundle of facets under one write lock and returns the resulting snapshot.
    pub fn update_all(&self, facets: impl IntoIterator<Item = Facet>) -> Snapshot {
        self.update_all_then(facets, Snapshot::clone)
    }

    /// Applies a bundle of facets, then runs `then` on the result before the write lock is
    /// released. Concurrent callers observe results in the same order the updates landed.
    /// `then` must not touch the store.
    pub fn update_all_then<R>(
        &self,
        facets: impl IntoIterator<Item = Facet>,
        then: impl FnOnce(&Snapshot) -> R,
    ) -> R {
        let mut snapshot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        for facet in facets {
            apply(&mut snapshot, facet);
        }
        then(&snapshot)
    }

    /// Owned copy of the whole snapshot.
    pub fn read(&self) -> Snapshot {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

// Each arm is a single assignment, so a poisoned lock never holds a torn facet.
fn apply(snapshot: &mut Snapshot, facet: Facet) {
    match facet {
        Facet::CpuIdentity(id) => {
            snapshot.cpu.manufacturer = id.manufacturer;
            snapshot.cpu.brand = id.brand;
            snapshot.cpu.clock_speed = id.clock_speed;
            snapshot.cpu.core_count = id.core_count;
        }
        Facet::CpuLoad(load) => snapshot.cpu.current_load_percent = load,
        Facet::Memory(memory) => snapshot.memory = memory,
        Facet::Network(network) => snapshot.network = network,
        Facet::Disk(disk) => snapshot.disk = disk,
        Facet::Uptime(secs) => snapshot.uptime_seconds = snapshot.uptime_seconds.max(secs),
    }
}
