// Host telemetry via sysinfo. Every call runs on the blocking pool.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use sysinfo::{Disks, Networks, System};
use tracing::instrument;

use super::{TelemetryProvider, linux};
use crate::models::{CpuIdentity, DiskUsage, InterfaceRate, MemoryStats, percent};

/// Cumulative (received, transmitted) counters per interface at the previous refresh.
type CounterSample = (HashMap<String, (u64, u64)>, Instant);

pub struct SysinfoProvider {
    sys: Arc<Mutex<System>>,
    disks: Arc<Mutex<Disks>>,
    networks: Arc<Mutex<Networks>>,
    last_counters: Arc<Mutex<Option<CounterSample>>>,
    last_cpu_refresh: Arc<Mutex<Option<(Instant, f64)>>>,
}

impl Default for SysinfoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoProvider {
    pub fn new() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();
        Self {
            sys: Arc::new(Mutex::new(sys)),
            disks: Arc::new(Mutex::new(Disks::new_with_refreshed_list())),
            networks: Arc::new(Mutex::new(Networks::new_with_refreshed_list())),
            last_counters: Arc::new(Mutex::new(None)),
            last_cpu_refresh: Arc::new(Mutex::new(None)),
        }
    }
}

impl TelemetryProvider for SysinfoProvider {
    #[instrument(skip(self), fields(provider = "sysinfo", operation = "cpu_identity"))]
    async fn cpu_identity(&self) -> anyhow::Result<CpuIdentity> {
        let sys = self.sys.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;
            sys.refresh_cpu_all();
            let first = sys.cpus().first();
            let brand = linux::read_cpu_model_linux()
                .or_else(|| {
                    first
                        .map(|c| c.brand().trim().to_string())
                        .filter(|s| !s.is_empty() && s != "cpu0")
                })
                .unwrap_or_else(|| "Unknown".into());
            let manufacturer = first
                .map(|c| c.vendor_id().trim().to_string())
                .unwrap_or_default();
            let clock_speed = first.map(|c| c.frequency() as f64 / 1000.0).unwrap_or(0.0);
            let core_count = System::physical_core_count()
                .map(|n| n as u32)
                .unwrap_or(sys.cpus().len() as u32);
            Ok(CpuIdentity {
                manufacturer,
                brand,
                clock_speed,
                core_count,
            })
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }

    #[instrument(skip(self), fields(provider = "sysinfo", operation = "cpu_load"))]
    async fn cpu_load(&self) -> anyhow::Result<f64> {
        let sys = self.sys.clone();
        let last_cpu_refresh = self.last_cpu_refresh.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;
            let mut last = last_cpu_refresh
                .lock()
                .map_err(|e| anyhow::anyhow!("cpu refresh lock poisoned: {}", e))?;

            let now = Instant::now();
            let previous = *last;
            let load = match previous {
                // Refreshing faster than sysinfo's minimum interval yields garbage; reuse the last value.
                Some((prev_ts, prev_load))
                    if now.duration_since(prev_ts) < sysinfo::MINIMUM_CPU_UPDATE_INTERVAL =>
                {
                    prev_load
                }
                Some(_) => {
                    sys.refresh_cpu_usage();
                    let load = sys.global_cpu_usage() as f64;
                    *last = Some((now, load));
                    load
                }
                None => {
                    // First call only establishes the baseline.
                    sys.refresh_cpu_usage();
                    *last = Some((now, 0.0));
                    0.0
                }
            };
            Ok(load)
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }

    #[instrument(skip(self), fields(provider = "sysinfo", operation = "memory"))]
    async fn memory(&self) -> anyhow::Result<MemoryStats> {
        let sys = self.sys.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;
            sys.refresh_memory();

            let total = sys.total_memory();
            let free = sys.free_memory();
            let used = total.saturating_sub(sys.available_memory());
            let active = linux::read_active_memory_linux().unwrap_or(used);
            Ok(MemoryStats::new(total, free, used, active))
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }

    #[instrument(skip(self), fields(provider = "sysinfo", operation = "network"))]
    async fn network(&self) -> anyhow::Result<Vec<InterfaceRate>> {
        let networks = self.networks.clone();
        let last_counters = self.last_counters.clone();
        tokio::task::spawn_blocking(move || {
            let mut networks = networks
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo networks lock poisoned: {}", e))?;
            networks.refresh(true);
            let now = Instant::now();

            let counters: Vec<(String, u64, u64)> = networks
                .list()
                .iter()
                .filter(|(name, _)| linux::is_interface_up(name))
                .map(|(name, data)| {
                    (name.clone(), data.total_received(), data.total_transmitted())
                })
                .collect();

            let mut last = last_counters
                .lock()
                .map_err(|e| anyhow::anyhow!("network counters lock poisoned: {}", e))?;
            let rates = interface_rates(&counters, last.as_ref(), now);
            *last = Some((
                counters
                    .into_iter()
                    .map(|(name, rx, tx)| (name, (rx, tx)))
                    .collect(),
                now,
            ));
            Ok(rates)
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }

    #[instrument(skip(self), fields(provider = "sysinfo", operation = "disks"))]
    async fn disks(&self) -> anyhow::Result<Vec<DiskUsage>> {
        let disks = self.disks.clone();
        tokio::task::spawn_blocking(move || {
            let mut disks = disks
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo disks lock poisoned: {}", e))?;
            disks.refresh(true);
            Ok(disks
                .list()
                .iter()
                .map(|d| {
                    let size = d.total_space();
                    let available = d.available_space();
                    let used = size.saturating_sub(available);
                    DiskUsage {
                        filesystem_id: d.name().to_string_lossy().into_owned(),
                        type_: d.file_system().to_string_lossy().into_owned(),
                        mount: d.mount_point().to_string_lossy().into_owned(),
                        size_bytes: size,
                        used_bytes: used,
                        available_bytes: available,
                        used_percent: percent(used, size),
                    }
                })
                .collect())
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }

    #[instrument(skip(self), fields(provider = "sysinfo", operation = "uptime"))]
    async fn uptime(&self) -> anyhow::Result<u64> {
        Ok(System::uptime())
    }
}

/// Per-second rates from cumulative counters. Interfaces without a previous sample
/// (first call, newly appeared) report 0; counter resets saturate to 0.
fn interface_rates(
    counters: &[(String, u64, u64)],
    previous: Option<&CounterSample>,
    now: Instant,
) -> Vec<InterfaceRate> {
    counters
        .iter()
        .map(|(name, rx, tx)| {
            let (rx_rate, tx_rate) = previous
                .and_then(|(prev, prev_ts)| {
                    let dt = now.duration_since(*prev_ts).as_secs_f64();
                    let (prx, ptx) = prev.get(name)?;
                    (dt > 0.0).then(|| {
                        (
                            rx.saturating_sub(*prx) as f64 / dt,
                            tx.saturating_sub(*ptx) as f64 / dt,
                        )
                    })
                })
                .unwrap_or((0.0, 0.0));
            InterfaceRate {
                interface_name: name.clone(),
                receive_bytes_per_sec: rx_rate,
                transmit_bytes_per_sec: tx_rate,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn rates_are_zero_without_previous_sample() {
        let counters = vec![("eth0".to_string(), 1_000, 500)];
        let rates = interface_rates(&counters, None, Instant::now());
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].receive_bytes_per_sec, 0.0);
        assert_eq!(rates[0].transmit_bytes_per_sec, 0.0);
    }

    #[test]
    fn rates_divide_delta_by_elapsed() {
        let then = Instant::now();
        let now = then + Duration::from_secs(2);
        let prev: CounterSample = (
            HashMap::from([("eth0".to_string(), (1_000, 500))]),
            then,
        );
        let counters = vec![
            ("eth0".to_string(), 3_000, 700),
            ("wlan0".to_string(), 10, 10),
        ];
        let rates = interface_rates(&counters, Some(&prev), now);
        assert_eq!(rates[0].interface_name, "eth0");
        assert_eq!(rates[0].receive_bytes_per_sec, 1_000.0);
        assert_eq!(rates[0].transmit_bytes_per_sec, 100.0);
        assert_eq!(rates[1].receive_bytes_per_sec, 0.0);
    }

    #[test]
    fn counter_reset_saturates() {
        let then = Instant::now();
        let prev: CounterSample = (HashMap::from([("eth0".to_string(), (5_000, 5_000))]), then);
        let counters = vec![("eth0".to_string(), 10, 10)];
        let rates = interface_rates(&counters, Some(&prev), then + Duration::from_secs(1));
        assert_eq!(rates[0].receive_bytes_per_sec, 0.0);
    }
}
