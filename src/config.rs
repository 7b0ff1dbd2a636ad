use serde::Deserialize;

/// Default listening port; `PORT` in the environment overrides it.
pub const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub sampling: SamplingConfig,
    pub history: HistoryConfig,
    pub publishing: PublishingConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: "0.0.0.0".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub retention_days: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/history.db".into(),
            retention_days: 7,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub fast_interval_ms: u64,
    pub network_interval_ms: u64,
    pub disk_interval_secs: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            fast_interval_ms: 1000,
            network_interval_ms: 1000,
            disk_interval_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub record_interval_secs: u64,
    pub prune_interval_secs: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            record_interval_secs: 60,
            prune_interval_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublishingConfig {
    /// Max snapshots queued per observer; slower observers skip ahead instead of buffering.
    pub broadcast_capacity: usize,
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// How often to log app stats (observers, rows recorded/pruned) at INFO level.
    pub stats_log_interval_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            stats_log_interval_secs: 60,
        }
    }
}

impl AppConfig {
    /// `CONFIG_FILE` if set (must exist), else `config.toml` if present, else defaults.
    /// `PORT` then overrides `server.port`.
    pub fn load() -> anyhow::Result<Self> {
        let s = match std::env::var("CONFIG_FILE") {
            Ok(path) => std::fs::read_to_string(&path)
                .map_err(|e| anyhow::anyhow!("reading config file {}: {}", path, e))?,
            Err(_) => std::fs::read_to_string("config.toml").unwrap_or_default(),
        };
        let mut config: AppConfig = toml::from_str(&s)?;
        config.apply_port_override(std::env::var("PORT").ok().as_deref())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_port_override(&mut self, port: Option<&str>) -> anyhow::Result<()> {
        if let Some(raw) = port {
            self.server.port = raw
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("PORT must be a port number, got {:?}: {}", raw, e))?;
        }
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.retention_days > 0,
            "database.retention_days must be > 0, got {}",
            self.database.retention_days
        );
        anyhow::ensure!(
            self.sampling.fast_interval_ms > 0,
            "sampling.fast_interval_ms must be > 0, got {}",
            self.sampling.fast_interval_ms
        );
        anyhow::ensure!(
            self.sampling.network_interval_ms > 0,
            "sampling.network_interval_ms must be > 0, got {}",
            self.sampling.network_interval_ms
        );
        anyhow::ensure!(
            self.sampling.disk_interval_secs > 0,
            "sampling.disk_interval_secs must be > 0, got {}",
            self.sampling.disk_interval_secs
        );
        anyhow::ensure!(
            self.history.record_interval_secs > 0,
            "history.record_interval_secs must be > 0, got {}",
            self.history.record_interval_secs
        );
        anyhow::ensure!(
            self.history.prune_interval_secs > 0,
            "history.prune_interval_secs must be > 0, got {}",
            self.history.prune_interval_secs
        );
        anyhow::ensure!(
            self.publishing.broadcast_capacity > 0,
            "publishing.broadcast_capacity must be > 0, got {}",
            self.publishing.broadcast_capacity
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        Ok(())
    }
}
