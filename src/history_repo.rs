// SQLite history store. WAL journal so the recorder, janitor and query handlers never block each other.

use std::path::Path;
use std::str::FromStr;

use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::instrument;

use crate::models::HistoryRecord;

pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

pub struct HistoryRepo {
    pool: SqlitePool,
    retention_ms: i64,
}

impl HistoryRepo {
    /// Opens the database, creating the file and its parent directories when missing.
    pub async fn connect(path: &str, retention_days: u32) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(path, retention_days, true).await
    }

    /// Opens a database file that must already exist; never creates one.
    pub async fn open_existing(path: &str, retention_days: u32) -> anyhow::Result<Self> {
        anyhow::ensure!(
            Path::new(path).is_file(),
            "no history database at {}",
            path
        );
        Self::open(path, retention_days, false).await
    }

    async fn open(path: &str, retention_days: u32, create: bool) -> anyhow::Result<Self> {
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(create)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new().connect_with(opts).await?;
        Ok(Self {
            pool,
            retention_ms: retention_days as i64 * MS_PER_DAY,
        })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at INTEGER NOT NULL,
                cpu_load REAL NOT NULL,
                mem_used REAL NOT NULL,
                net_rx REAL NOT NULL,
                net_tx REAL NOT NULL,
                disk_used REAL NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_history_created_at ON history(created_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Journal mode reported by SQLite ("wal" once connected).
    pub async fn journal_mode(&self) -> anyhow::Result<String> {
        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&self.pool)
            .await?;
        Ok(mode.to_lowercase())
    }

    pub fn retention_ms(&self) -> i64 {
        self.retention_ms
    }

    #[instrument(skip(self, record), fields(repo = "history", operation = "insert", timestamp = record.timestamp))]
    pub async fn insert(&self, record: &HistoryRecord) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO history (created_at, cpu_load, mem_used, net_rx, net_tx, disk_used) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.timestamp)
        .bind(record.cpu_load_percent)
        .bind(record.mem_used_percent)
        .bind(record.net_receive_bytes_per_sec)
        .bind(record.net_transmit_bytes_per_sec)
        .bind(record.disk_used_percent)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Rows with created_at strictly greater than `after_ts`. Order: ascending by created_at, then insertion.
    #[instrument(skip(self), fields(repo = "history", operation = "records_after"))]
    pub async fn records_after(&self, after_ts: i64) -> anyhow::Result<Vec<HistoryRecord>> {
        let rows = sqlx::query(
            "SELECT created_at, cpu_load, mem_used, net_rx, net_tx, disk_used
             FROM history WHERE created_at > $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(after_ts)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::parse_row).collect()
    }

    /// Delete rows older than the retention horizon relative to `now_ms`. Returns rows removed.
    #[instrument(skip(self), fields(repo = "history", operation = "prune_old_data"))]
    pub async fn prune_old_data(&self, now_ms: i64) -> anyhow::Result<u64> {
        let cutoff = now_ms - self.retention_ms;
        let r = sqlx::query("DELETE FROM history WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(r.rows_affected())
    }

    /// Most recent `limit` rows, oldest first.
    pub async fn recent_records(&self, limit: u32) -> anyhow::Result<Vec<HistoryRecord>> {
        let rows = sqlx::query(
            "SELECT created_at, cpu_load, mem_used, net_rx, net_tx, disk_used
             FROM history ORDER BY id DESC LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut out = rows
            .iter()
            .map(Self::parse_row)
            .collect::<anyhow::Result<Vec<_>>>()?;
        out.reverse();
        Ok(out)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn parse_row(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<HistoryRecord> {
        Ok(HistoryRecord {
            timestamp: row.try_get("created_at")?,
            cpu_load_percent: row.try_get("cpu_load")?,
            mem_used_percent: row.try_get("mem_used")?,
            net_receive_bytes_per_sec: row.try_get("net_rx")?,
            net_transmit_bytes_per_sec: row.try_get("net_tx")?,
            disk_used_percent: row.try_get("disk_used")?,
        })
    }
}

/// Wall-clock epoch milliseconds.
pub fn now_ms() -> anyhow::Result<i64> {
    Ok(std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_millis() as i64)
}
