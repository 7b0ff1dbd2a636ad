// Range-token queries over the history store.

use std::time::Duration;

use crate::history_repo::HistoryRepo;
use crate::models::HistoryPoint;

/// Lookback window selected by the `range` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryRange {
    #[default]
    OneHour,
    SixHours,
    OneDay,
    SevenDays,
}

impl HistoryRange {
    /// Maps `1h`, `6h`, `24h`, `7d`; anything else (or nothing) is one hour.
    pub fn parse(token: Option<&str>) -> Self {
        match token {
            Some("6h") => Self::SixHours,
            Some("24h") => Self::OneDay,
            Some("7d") => Self::SevenDays,
            _ => Self::OneHour,
        }
    }

    pub fn window(self) -> Duration {
        const HOUR: u64 = 3600;
        Duration::from_secs(match self {
            Self::OneHour => HOUR,
            Self::SixHours => 6 * HOUR,
            Self::OneDay => 24 * HOUR,
            Self::SevenDays => 7 * 24 * HOUR,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneHour => "1h",
            Self::SixHours => "6h",
            Self::OneDay => "24h",
            Self::SevenDays => "7d",
        }
    }
}

/// Records newer than `now_ms - window` (strictly), ascending, projected for the UI.
#[tracing::instrument(skip(repo), fields(range = range.as_str()))]
pub async fn query_history(
    repo: &HistoryRepo,
    range: HistoryRange,
    now_ms: i64,
) -> anyhow::Result<Vec<HistoryPoint>> {
    let after = now_ms - range.window().as_millis() as i64;
    let records = repo.records_after(after).await?;
    Ok(records.iter().map(HistoryPoint::from).collect())
}
