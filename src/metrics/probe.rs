use parking_lot::Mutex;
use sysinfo::{Pid, System};

use crate::alloc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryUsage {
    pub heap_used: u64,
    pub heap_total: u64,
    pub resident_set_size: u64,
    pub external: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuUsage {
    pub user_micros: u64,
    pub system_micros: u64,
}

/// Source of the process's own resource counters.
pub trait ResourceProbe: Send + Sync {
    fn memory(&self) -> MemoryUsage;
    fn cpu(&self) -> CpuUsage;
}

pub struct ProcessProbe {
    system: Mutex<System>,
    pid: Option<Pid>,
}

impl Default for ProcessProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessProbe {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!("Failed to get current PID, RSS will read as zero: {}", e);
                None
            }
        };
        Self {
            system: Mutex::new(System::new()),
            pid,
        }
    }

    fn resident_set_size(&self) -> u64 {
        let Some(pid) = self.pid else {
            return 0;
        };
        let mut system = self.system.lock();
        if !system.refresh_process(pid) {
            tracing::debug!(%pid, "Process not found while refreshing RSS");
            return 0;
        }
        system.process(pid).map_or(0, sysinfo::Process::memory)
    }
}

impl ResourceProbe for ProcessProbe {
    fn memory(&self) -> MemoryUsage {
        let heap_used = alloc::live_bytes();
        let resident_set_size = self.resident_set_size();
        MemoryUsage {
            heap_used,
            heap_total: alloc::peak_bytes().max(heap_used),
            resident_set_size,
            external: resident_set_size.saturating_sub(heap_used),
        }
    }

    fn cpu(&self) -> CpuUsage {
        cpu_time()
    }
}

#[cfg(unix)]
fn cpu_time() -> CpuUsage {
    let mut usage = std::mem::MaybeUninit::<libc::rusage>::zeroed();
    // SAFETY: `usage` is a valid, writable rusage for the duration of the call.
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
    if rc != 0 {
        tracing::debug!("getrusage failed, reporting zero CPU time");
        return CpuUsage::default();
    }
    // SAFETY: getrusage returned 0, so the struct has been filled in.
    let usage = unsafe { usage.assume_init() };
    CpuUsage {
        user_micros: timeval_micros(usage.ru_utime),
        system_micros: timeval_micros(usage.ru_stime),
    }
}

#[cfg(unix)]
fn timeval_micros(tv: libc::timeval) -> u64 {
    let secs = u64::try_from(tv.tv_sec).unwrap_or_default();
    let micros = u64::try_from(tv.tv_usec).unwrap_or_default();
    secs * 1_000_000 + micros
}

#[cfg(not(unix))]
fn cpu_time() -> CpuUsage {
    CpuUsage::default()
}
