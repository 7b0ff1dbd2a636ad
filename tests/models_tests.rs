// Model serialization tests (JSON camelCase wire shapes)

use hostpulse::broadcast::PushEvent;
use hostpulse::models::*;

fn sample_snapshot() -> Snapshot {
    Snapshot {
        cpu: CpuStats {
            manufacturer: "GenuineIntel".into(),
            brand: "Core i7".into(),
            clock_speed: 3.6,
            core_count: 8,
            current_load_percent: 12.5,
        },
        memory: MemoryStats::new(1024, 256, 512, 384),
        network: vec![InterfaceRate {
            interface_name: "eth0".into(),
            receive_bytes_per_sec: 2048.0,
            transmit_bytes_per_sec: 512.0,
        }],
        disk: vec![DiskUsage {
            filesystem_id: "/dev/sda1".into(),
            type_: "ext4".into(),
            mount: "/".into(),
            size_bytes: 1000,
            used_bytes: 400,
            available_bytes: 600,
            used_percent: 40.0,
        }],
        uptime_seconds: 3600,
    }
}

#[test]
fn test_snapshot_serialization_camel_case() {
    let json = serde_json::to_value(sample_snapshot()).unwrap();
    assert_eq!(json["cpu"]["currentLoadPercent"], 12.5);
    assert_eq!(json["cpu"]["clockSpeed"], 3.6);
    assert_eq!(json["cpu"]["coreCount"], 8);
    assert_eq!(json["memory"]["totalBytes"], 1024);
    assert_eq!(json["memory"]["activeBytes"], 384);
    assert_eq!(json["memory"]["usedPercent"], 50.0);
    assert_eq!(json["network"][0]["interfaceName"], "eth0");
    assert_eq!(json["network"][0]["receiveBytesPerSec"], 2048.0);
    assert_eq!(json["disk"][0]["type"], "ext4");
    assert_eq!(json["disk"][0]["filesystemId"], "/dev/sda1");
    assert_eq!(json["uptimeSeconds"], 3600);
}

#[test]
fn test_snapshot_json_roundtrip() {
    let snapshot = sample_snapshot();
    let json = serde_json::to_string(&snapshot).unwrap();
    let back: Snapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back, snapshot);
}

#[test]
fn test_memory_percent_zero_total() {
    assert_eq!(MemoryStats::new(0, 0, 0, 0).used_percent, 0.0);
}

#[test]
fn test_push_event_envelope() {
    let snapshot = sample_snapshot();
    let json = serde_json::to_value(PushEvent::Metrics(&snapshot)).unwrap();
    assert_eq!(json["event"], "metrics");
    assert_eq!(json["data"]["cpu"]["currentLoadPercent"], 12.5);
    assert_eq!(json.as_object().unwrap().len(), 2);
}

#[test]
fn test_history_point_from_record() {
    let record = HistoryRecord::from_snapshot(&sample_snapshot(), 1_760_000_000_000);
    let point = HistoryPoint::from(&record);
    let json = serde_json::to_value(&point).unwrap();
    assert_eq!(json["timestamp"], 1_760_000_000_000i64);
    assert_eq!(json["time"].as_str().unwrap().len(), 5);
    assert_eq!(json["cpuLoadPercent"], 12.5);
    assert_eq!(json["memUsedPercent"], 50.0);
    assert_eq!(json["netReceiveBytesPerSec"], 2048.0);
    assert_eq!(json["netTransmitBytesPerSec"], 512.0);
    assert_eq!(json["diskUsedPercent"], 40.0);
}
