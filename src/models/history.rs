// Durable history rows and their query projection

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

use super::Snapshot;

/// One condensed, durable row. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    /// Wall-clock epoch milliseconds, assigned at write time.
    pub timestamp: i64,
    pub cpu_load_percent: f64,
    pub mem_used_percent: f64,
    pub net_receive_bytes_per_sec: f64,
    pub net_transmit_bytes_per_sec: f64,
    pub disk_used_percent: f64,
}

impl HistoryRecord {
    /// Condenses a snapshot: network rates are summed over all interfaces, disk usage
    /// comes from the first filesystem entry only.
    pub fn from_snapshot(snapshot: &Snapshot, timestamp: i64) -> Self {
        let (rx, tx) = snapshot.network.iter().fold((0.0, 0.0), |(rx, tx), i| {
            (rx + i.receive_bytes_per_sec, tx + i.transmit_bytes_per_sec)
        });
        Self {
            timestamp,
            cpu_load_percent: snapshot.cpu.current_load_percent,
            mem_used_percent: snapshot.memory.used_percent,
            net_receive_bytes_per_sec: rx,
            net_transmit_bytes_per_sec: tx,
            disk_used_percent: snapshot.disk.first().map(|d| d.used_percent).unwrap_or(0.0),
        }
    }
}

/// Wire shape of GET /api/history rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    /// Local time-of-day label ("HH:MM"); repeats across days on long ranges.
    pub time: String,
    /// Full epoch milliseconds so consumers can pick their own representation.
    pub timestamp: i64,
    pub cpu_load_percent: f64,
    pub mem_used_percent: f64,
    pub net_receive_bytes_per_sec: f64,
    pub net_transmit_bytes_per_sec: f64,
    pub disk_used_percent: f64,
}

impl From<&HistoryRecord> for HistoryPoint {
    fn from(r: &HistoryRecord) -> Self {
        Self {
            time: time_of_day_label(r.timestamp),
            timestamp: r.timestamp,
            cpu_load_percent: r.cpu_load_percent,
            mem_used_percent: r.mem_used_percent,
            net_receive_bytes_per_sec: r.net_receive_bytes_per_sec,
            net_transmit_bytes_per_sec: r.net_transmit_bytes_per_sec,
            disk_used_percent: r.disk_used_percent,
        }
    }
}

/// Formats epoch milliseconds as local "HH:MM". Out-of-range values yield an empty label.
pub fn time_of_day_label(timestamp_ms: i64) -> String {
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default()
}
