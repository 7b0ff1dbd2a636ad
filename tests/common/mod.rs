// Shared test helpers
#![allow(dead_code)]

use hostpulse::history_repo::HistoryRepo;
use hostpulse::models::*;
use hostpulse::telemetry::TelemetryProvider;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// Scriptable provider. CPU loads are consumed in call order, each with its own delay;
/// a `None` facet makes that query fail. The `*_hang` switches make a query never return.
pub struct FakeProvider {
    pub loads: Mutex<VecDeque<(f64, Duration)>>,
    pub memory: Mutex<Option<MemoryStats>>,
    pub network: Mutex<Option<Vec<InterfaceRate>>>,
    pub disks: Mutex<Option<Vec<DiskUsage>>>,
    pub identity: Mutex<Option<CpuIdentity>>,
    pub uptime: AtomicU64,
    pub uptime_fails: Mutex<bool>,
    pub identity_calls: AtomicUsize,
    pub disk_calls: AtomicUsize,
    pub network_calls: AtomicUsize,
    pub network_hang: AtomicBool,
    pub disks_hang: AtomicBool,
    /// Next identity query panics (once).
    pub identity_panics: AtomicBool,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self {
            loads: Mutex::new(VecDeque::new()),
            memory: Mutex::new(Some(MemoryStats::new(1000, 400, 500, 300))),
            network: Mutex::new(Some(vec![interface("eth0", 100.0, 10.0)])),
            disks: Mutex::new(Some(vec![disk("/dev/sda1", 25.0)])),
            identity: Mutex::new(Some(CpuIdentity {
                manufacturer: "GenuineIntel".into(),
                brand: "Test CPU".into(),
                clock_speed: 3.2,
                core_count: 4,
            })),
            uptime: AtomicU64::new(100),
            uptime_fails: Mutex::new(false),
            identity_calls: AtomicUsize::new(0),
            disk_calls: AtomicUsize::new(0),
            network_calls: AtomicUsize::new(0),
            network_hang: AtomicBool::new(false),
            disks_hang: AtomicBool::new(false),
            identity_panics: AtomicBool::new(false),
        }
    }
}

impl FakeProvider {
    pub fn with_loads(loads: &[f64]) -> Self {
        let p = Self::default();
        p.push_loads(loads.iter().map(|l| (*l, Duration::ZERO)));
        p
    }

    pub fn push_loads(&self, loads: impl IntoIterator<Item = (f64, Duration)>) {
        self.loads.lock().unwrap().extend(loads);
    }

    pub fn fail_all_fast(&self) {
        self.loads.lock().unwrap().clear();
        *self.memory.lock().unwrap() = None;
        *self.uptime_fails.lock().unwrap() = true;
    }
}

impl TelemetryProvider for FakeProvider {
    async fn cpu_identity(&self) -> anyhow::Result<CpuIdentity> {
        self.identity_calls.fetch_add(1, Ordering::SeqCst);
        if self.identity_panics.swap(false, Ordering::SeqCst) {
            panic!("cpuid read crashed");
        }
        self.identity
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow::anyhow!("identity unavailable"))
    }

    async fn cpu_load(&self) -> anyhow::Result<f64> {
        let next = self.loads.lock().unwrap().pop_front();
        let (load, delay) = next.ok_or_else(|| anyhow::anyhow!("no cpu reading"))?;
        tokio::time::sleep(delay).await;
        Ok(load)
    }

    async fn memory(&self) -> anyhow::Result<MemoryStats> {
        self.memory
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow::anyhow!("memory unavailable"))
    }

    async fn network(&self) -> anyhow::Result<Vec<InterfaceRate>> {
        self.network_calls.fetch_add(1, Ordering::SeqCst);
        if self.network_hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.network
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow::anyhow!("network unavailable"))
    }

    async fn disks(&self) -> anyhow::Result<Vec<DiskUsage>> {
        self.disk_calls.fetch_add(1, Ordering::SeqCst);
        if self.disks_hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.disks
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow::anyhow!("disks unavailable"))
    }

    async fn uptime(&self) -> anyhow::Result<u64> {
        if *self.uptime_fails.lock().unwrap() {
            anyhow::bail!("uptime unavailable");
        }
        Ok(self.uptime.load(Ordering::SeqCst))
    }
}

pub fn interface(name: &str, rx: f64, tx: f64) -> InterfaceRate {
    InterfaceRate {
        interface_name: name.into(),
        receive_bytes_per_sec: rx,
        transmit_bytes_per_sec: tx,
    }
}

pub fn disk(id: &str, used_percent: f64) -> DiskUsage {
    DiskUsage {
        filesystem_id: id.into(),
        type_: "ext4".into(),
        mount: "/".into(),
        size_bytes: 1000,
        used_bytes: (used_percent * 10.0) as u64,
        available_bytes: 1000 - (used_percent * 10.0) as u64,
        used_percent,
    }
}

pub fn record(timestamp: i64, cpu: f64) -> HistoryRecord {
    HistoryRecord {
        timestamp,
        cpu_load_percent: cpu,
        mem_used_percent: 50.0,
        net_receive_bytes_per_sec: 1.0,
        net_transmit_bytes_per_sec: 2.0,
        disk_used_percent: 30.0,
    }
}

/// Fresh, initialized repo in a temp dir (keep the TempDir alive for the test's duration).
pub async fn temp_repo() -> (TempDir, HistoryRepo) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.db");
    let repo = HistoryRepo::connect(path.to_str().unwrap(), 7).await.unwrap();
    repo.init().await.unwrap();
    (dir, repo)
}

pub fn now_ms() -> i64 {
    hostpulse::history_repo::now_ms().unwrap()
}

pub const MINUTE_MS: i64 = 60 * 1000;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
pub const DAY_MS: i64 = 24 * HOUR_MS;
