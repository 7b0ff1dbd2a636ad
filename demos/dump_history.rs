// Dump recent history rows as JSON.
//
// Usage: cargo run --example dump_history -- [DB_PATH] [LIMIT]
//   DB_PATH  default: ./data/history.db
//   LIMIT    default: 5

use hostpulse::history_repo::HistoryRepo;
use hostpulse::models::HistoryPoint;
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let path = args.get(1).map(String::as_str).unwrap_or("./data/history.db");
    let limit: u32 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(5);

    let repo = HistoryRepo::open_existing(path, 7).await?;
    let records = repo.recent_records(limit).await?;
    let points: Vec<HistoryPoint> = records.iter().map(HistoryPoint::from).collect();

    println!("{}", serde_json::to_string_pretty(&points)?);
    Ok(())
}
