// Linux-specific helpers: /proc and /sys reads that sysinfo does not expose.

/// Read first "model name" from /proc/cpuinfo. Preferred over sysinfo when it returns "cpu0" etc.
pub(super) fn read_cpu_model_linux() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/proc/cpuinfo").ok()?;
        parse_cpuinfo_field(&content, "model name")
    }
    #[cfg(not(target_os = "linux"))]
    None
}

/// "Active:" from /proc/meminfo, in bytes.
pub(super) fn read_active_memory_linux() -> Option<u64> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/proc/meminfo").ok()?;
        parse_meminfo_kb(&content, "Active:").map(|kb| kb * 1024)
    }
    #[cfg(not(target_os = "linux"))]
    None
}

/// Whether /sys/class/net/<interface>/operstate reports the link as usable.
/// "unknown" counts as up (loopback and most virtual links report it). Non-Linux: always up.
pub(super) fn is_interface_up(interface_name: &str) -> bool {
    #[cfg(target_os = "linux")]
    {
        let path = format!("/sys/class/net/{}/operstate", interface_name);
        if let Ok(state) = std::fs::read_to_string(&path) {
            return matches!(state.trim(), "up" | "unknown");
        }
    }
    let _ = interface_name;
    true
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_cpuinfo_field(content: &str, field: &str) -> Option<String> {
    content
        .lines()
        .filter(|line| line.starts_with(field))
        .find_map(|line| {
            line.find(':')
                .map(|i| line[i + 1..].trim())
                .filter(|s| !s.is_empty() && *s != "cpu0")
                .map(str::to_string)
        })
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_meminfo_kb(content: &str, key: &str) -> Option<u64> {
    content
        .lines()
        .find_map(|line| line.strip_prefix(key))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|v| v.parse().ok())
}
