// Live snapshot: one struct per facet, merged into a single Snapshot

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuStats {
    pub manufacturer: String,
    pub brand: String,
    /// Base clock in GHz.
    pub clock_speed: f64,
    pub core_count: u32,
    pub current_load_percent: f64,
}

/// Static CPU identity; fetched once and cached for the process lifetime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuIdentity {
    pub manufacturer: String,
    pub brand: String,
    pub clock_speed: f64,
    pub core_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub used_bytes: u64,
    pub active_bytes: u64,
    pub used_percent: f64,
}

impl MemoryStats {
    /// Builds memory stats, deriving used_percent (0 when total is 0).
    pub fn new(total_bytes: u64, free_bytes: u64, used_bytes: u64, active_bytes: u64) -> Self {
        Self {
            total_bytes,
            free_bytes,
            used_bytes,
            active_bytes,
            used_percent: percent(used_bytes, total_bytes),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceRate {
    pub interface_name: String,
    pub receive_bytes_per_sec: f64,
    pub transmit_bytes_per_sec: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskUsage {
    pub filesystem_id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub mount: String,
    pub size_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
    pub used_percent: f64,
}

/// Latest best-known reading of every facet. Zero-valued until the samplers first report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub cpu: CpuStats,
    pub memory: MemoryStats,
    pub network: Vec<InterfaceRate>,
    pub disk: Vec<DiskUsage>,
    pub uptime_seconds: u64,
}

pub(crate) fn percent(part: u64, whole: u64) -> f64 {
    if whole > 0 {
        (part as f64 / whole as f64) * 100.0
    } else {
        0.0
    }
}
