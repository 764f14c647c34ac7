//! Best-effort environmental entropy for seeding the pool.
//!
//! None of these values are secret or uniformly random. They are folded into
//! the pool at construction so that two processes started from the same image
//! diverge even before the OS CSPRNG bytes are mixed in. Anything that cannot
//! be read on the current platform is left as `None`.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Process resource counters from `getrusage(RUSAGE_SELF)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub user_time_us: i64,
    pub system_time_us: i64,
    pub max_rss: i64,
    pub minor_faults: i64,
    pub major_faults: i64,
    pub voluntary_switches: i64,
    pub involuntary_switches: i64,
}

/// One observation of the process environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    pub unix_nanos: u64,
    pub process_id: u32,
    pub thread: String,
    pub os: String,
    pub arch: String,
    pub cpu_count: usize,
    pub hostname: Option<String>,
    pub current_dir: Option<String>,
    pub executable: Option<String>,
    pub locale: Option<String>,
    pub env_var_count: usize,
    pub instance_id: String,
    pub loadavg: Option<[f64; 3]>,
    pub resource_usage: Option<ResourceUsage>,
}

impl EnvironmentSnapshot {
    pub fn collect() -> Self {
        let locale = std::env::var("LC_ALL")
            .or_else(|_| std::env::var("LANG"))
            .ok();

        Self {
            unix_nanos: unix_nanos_now(),
            process_id: std::process::id(),
            thread: format!("{:?}", std::thread::current().id()),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            cpu_count: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            hostname: read_hostname(),
            current_dir: std::env::current_dir()
                .ok()
                .map(|p| p.display().to_string()),
            executable: std::env::current_exe()
                .ok()
                .map(|p| p.display().to_string()),
            locale,
            env_var_count: std::env::vars_os().count(),
            instance_id: uuid::Uuid::new_v4().to_string(),
            loadavg: collect_loadavg(),
            resource_usage: collect_resource_usage(),
        }
    }

    /// Serialized form that gets hashed into the pool.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| {
            Error::InternalInvariantViolation(format!("environment snapshot encoding: {e}"))
        })
    }
}

fn unix_nanos_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

/// 100-nanosecond ticks since the Unix epoch; seeds the generator counter.
pub(crate) fn coarse_ticks_now() -> u64 {
    unix_nanos_now() / 100
}

fn read_hostname() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/sys/kernel/hostname")
            .or_else(|_| std::fs::read_to_string("/etc/hostname"))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
    #[cfg(not(target_os = "linux"))]
    {
        std::env::var("COMPUTERNAME")
            .or_else(|_| std::env::var("HOSTNAME"))
            .ok()
    }
}

fn collect_loadavg() -> Option<[f64; 3]> {
    #[cfg(unix)]
    {
        let mut values = [0.0_f64; 3];
        // SAFETY: `getloadavg` writes at most 3 doubles into a buffer of 3.
        let n = unsafe { libc::getloadavg(values.as_mut_ptr(), 3) };
        (n > 0).then_some(values)
    }
    #[cfg(not(unix))]
    {
        None
    }
}

fn collect_resource_usage() -> Option<ResourceUsage> {
    #[cfg(unix)]
    {
        // SAFETY: `rusage` is plain old data; all-zero is a valid value.
        let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
        // SAFETY: `usage` is a valid, writable `rusage` for the duration of the call.
        let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
        if rc != 0 {
            return None;
        }
        let micros = |tv: libc::timeval| tv.tv_sec as i64 * 1_000_000 + tv.tv_usec as i64;
        Some(ResourceUsage {
            user_time_us: micros(usage.ru_utime),
            system_time_us: micros(usage.ru_stime),
            max_rss: usage.ru_maxrss as i64,
            minor_faults: usage.ru_minflt as i64,
            major_faults: usage.ru_majflt as i64,
            voluntary_switches: usage.ru_nvcsw as i64,
            involuntary_switches: usage.ru_nivcsw as i64,
        })
    }
    #[cfg(not(unix))]
    {
        None
    }
}
