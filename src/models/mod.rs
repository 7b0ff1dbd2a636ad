// Domain models

mod history;
mod snapshot;

pub use history::{HistoryPoint, HistoryRecord, time_of_day_label};
pub use snapshot::{CpuIdentity, CpuStats, DiskUsage, InterfaceRate, MemoryStats, Snapshot};
pub(crate) use snapshot::percent;
