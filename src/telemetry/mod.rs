// Telemetry provider seam: host readings consumed by the samplers.

mod linux;
mod system;

pub use system::SysinfoProvider;

use crate::models::{CpuIdentity, DiskUsage, InterfaceRate, MemoryStats};

/// Host-level readings. Every call may fail on its own; callers keep the last good value.
pub trait TelemetryProvider: Send + Sync + 'static {
    fn cpu_identity(&self) -> impl Future<Output = anyhow::Result<CpuIdentity>> + Send;
    fn cpu_load(&self) -> impl Future<Output = anyhow::Result<f64>> + Send;
    fn memory(&self) -> impl Future<Output = anyhow::Result<MemoryStats>> + Send;
    /// Per-interface byte rates, active interfaces only, in provider order.
    fn network(&self) -> impl Future<Output = anyhow::Result<Vec<InterfaceRate>>> + Send;
    fn disks(&self) -> impl Future<Output = anyhow::Result<Vec<DiskUsage>>> + Send;
    fn uptime(&self) -> impl Future<Output = anyhow::Result<u64>> + Send;
}
