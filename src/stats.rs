use serde::Serialize;

/// Process memory figures in bytes, zero when a field cannot be read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    /// Resident set size
    pub resident_bytes: u64,
    /// Peak resident set size over the process lifetime
    pub peak_resident_bytes: u64,
    /// Virtual address space size
    pub virtual_bytes: u64,
    /// Data segment size
    pub data_bytes: u64,
}

/// One sample of the process's runtime resource usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RuntimeStats {
    /// OS threads currently owned by the process
    pub threads: u64,
    pub memory: MemoryStats,
}

/// Source of runtime stat samples.
///
/// Sampling is infallible: a provider that cannot read a figure reports it
/// as zero rather than erroring.
pub trait StatsProvider: Send + Sync {
    fn sample(&self) -> RuntimeStats;
}

/// Stats provider backed by the operating system.
///
/// Linux reads `/proc/self/status`; macOS shells out to `ps` for the
/// resident set; other platforms report zeroes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcStatsProvider;

impl StatsProvider for ProcStatsProvider {
    fn sample(&self) -> RuntimeStats {
        #[cfg(target_os = "linux")]
        {
            read_proc_status()
        }

        #[cfg(target_os = "macos")]
        {
            read_ps_rss()
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            RuntimeStats::default()
        }
    }
}

#[cfg(target_os = "linux")]
fn read_proc_status() -> RuntimeStats {
    let mut stats = RuntimeStats::default();

    let Ok(status) = std::fs::read_to_string("/proc/self/status") else {
        return stats;
    };

    for line in status.lines() {
        if let Some(value) = line.strip_prefix("Threads:") {
            stats.threads = value.trim().parse().unwrap_or(0);
        } else if let Some(value) = line.strip_prefix("VmRSS:") {
            stats.memory.resident_bytes = parse_kb(value);
        } else if let Some(value) = line.strip_prefix("VmHWM:") {
            stats.memory.peak_resident_bytes = parse_kb(value);
        } else if let Some(value) = line.strip_prefix("VmSize:") {
            stats.memory.virtual_bytes = parse_kb(value);
        } else if let Some(value) = line.strip_prefix("VmData:") {
            stats.memory.data_bytes = parse_kb(value);
        }
    }

    stats
}

#[cfg(target_os = "linux")]
fn parse_kb(field: &str) -> u64 {
    field
        .split_whitespace()
        .next()
        .and_then(|kb| kb.parse::<u64>().ok())
        .map_or(0, |kb| kb * 1024)
}

#[cfg(target_os = "macos")]
fn read_ps_rss() -> RuntimeStats {
    use std::process::Command;

    let mut stats = RuntimeStats::default();

    let output = Command::new("ps")
        .args(["-o", "rss=", "-p", &std::process::id().to_string()])
        .output();

    if let Ok(output) = output {
        if let Ok(text) = String::from_utf8(output.stdout) {
            if let Ok(kb) = text.trim().parse::<u64>() {
                stats.memory.resident_bytes = kb * 1024;
            }
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sample_is_zeroed() {
        let stats = RuntimeStats::default();
        assert_eq!(stats.threads, 0);
        assert_eq!(stats.memory.resident_bytes, 0);
    }

    #[test]
    fn test_proc_provider_does_not_panic() {
        let _stats = ProcStatsProvider.sample();
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_proc_provider_reads_live_figures() {
        let stats = ProcStatsProvider.sample();
        // A running test binary always has at least one thread and some RSS
        assert!(stats.threads >= 1);
        assert!(stats.memory.resident_bytes > 0);
        assert!(stats.memory.peak_resident_bytes >= stats.memory.resident_bytes);
    }

    #[test]
    fn test_stats_serialize_to_json() {
        let stats = RuntimeStats {
            threads: 4,
            memory: MemoryStats {
                resident_bytes: 1024,
                ..MemoryStats::default()
            },
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"threads\":4"));
        assert!(json.contains("\"resident_bytes\":1024"));
    }
}
