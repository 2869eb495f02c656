//! CPU and memory sampling around generation phases (`--monitor`).

#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};

/// One sample of the current process.
#[cfg(feature = "cli")]
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSample {
    pub cpu_percent: f32,
    pub memory_mb: u64,
    pub memory_percent: f32,
    pub peak_memory_mb: u64,
    /// Since the previous sample.
    pub phase_time: Duration,
    /// Since the monitor was created.
    pub total_time: Duration,
}

#[cfg(feature = "cli")]
struct Sampler {
    system: System,
    pid: Pid,
    peak_memory_mb: u64,
    last_sample: Instant,
}

#[cfg(feature = "cli")]
pub struct SystemMonitor {
    sampler: Option<Mutex<Sampler>>,
    started: Instant,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    /// A disabled monitor never touches sysinfo.
    pub fn new(enabled: bool) -> Self {
        let started = Instant::now();
        if !enabled {
            return Self { sampler: None, started };
        }

        let sampler = match sysinfo::get_current_pid() {
            Ok(pid) => {
                let mut system = System::new();
                system.refresh_memory();
                system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
                Some(Mutex::new(Sampler {
                    system,
                    pid,
                    peak_memory_mb: 0,
                    last_sample: started,
                }))
            }
            Err(e) => {
                tracing::warn!("⚠️ Cannot resolve current PID, monitoring disabled: {}", e);
                None
            }
        };
        Self { sampler, started }
    }

    pub fn is_enabled(&self) -> bool {
        self.sampler.is_some()
    }

    pub fn sample(&self) -> Option<ProcessSample> {
        let mut sampler = self.sampler.as_ref()?.lock().ok()?;
        let pid = sampler.pid;
        sampler.system.refresh_memory();
        sampler
            .system
            .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        let (cpu_percent, memory_mb) = {
            let process = sampler.system.process(pid)?;
            (process.cpu_usage(), process.memory() / 1024 / 1024)
        };
        let total_mb = sampler.system.total_memory() / 1024 / 1024;
        sampler.peak_memory_mb = sampler.peak_memory_mb.max(memory_mb);

        let now = Instant::now();
        let phase_time = now - sampler.last_sample;
        sampler.last_sample = now;

        Some(ProcessSample {
            cpu_percent,
            memory_mb,
            memory_percent: if total_mb > 0 {
                memory_mb as f32 / total_mb as f32 * 100.0
            } else {
                0.0
            },
            peak_memory_mb: sampler.peak_memory_mb,
            phase_time,
            total_time: self.started.elapsed(),
        })
    }

    pub fn log_stats(&self, phase: &str) {
        if let Some(s) = self.sample() {
            tracing::info!(
                "📊 {} - CPU: {:.1}%, Memory: {}MB ({:.1}%), Peak: {}MB, Phase: {:?}",
                phase,
                s.cpu_percent,
                s.memory_mb,
                s.memory_percent,
                s.peak_memory_mb,
                s.phase_time
            );
        }
    }

    pub fn log_final_stats(&self) {
        if let Some(s) = self.sample() {
            tracing::info!(
                "📊 Generation finished - Total Time: {:?}, Peak Memory: {}MB",
                s.total_time,
                s.peak_memory_mb
            );
        }
    }
}

// 非 CLI 建置時的空實作
#[cfg(not(feature = "cli"))]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn is_enabled(&self) -> bool {
        false
    }

    pub fn log_stats(&self, _phase: &str) {}

    pub fn log_final_stats(&self) {}
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_monitor_has_no_samples() {
        let monitor = SystemMonitor::new(false);
        assert!(!monitor.is_enabled());
        assert!(monitor.sample().is_none());
    }

    #[test]
    fn test_peak_memory_never_drops() {
        let monitor = SystemMonitor::new(true);
        let Some(first) = monitor.sample() else {
            return;
        };
        let second = monitor.sample().unwrap();
        assert!(second.peak_memory_mb >= first.peak_memory_mb);
        assert!(second.total_time >= first.total_time);
    }
}
