//! Per-lesson resource accounting.
//!
//! Each lesson is bracketed by [`LessonMonitor::start_lesson`] and
//! [`LessonMonitor::finish_lesson`]. With the `cli` feature the finish step
//! samples this process through sysinfo; a process CPU figure above 100%
//! means more than one core was busy, which is what the parallel lessons are
//! trying to show.

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub struct LessonUsage {
    pub lesson: String,
    pub elapsed: Duration,
    /// Process CPU usage, where 100.0 is one full core.
    pub cpu_percent: f32,
    pub memory_mb: u64,
}

impl LessonUsage {
    pub fn cores_busy(&self) -> f32 {
        self.cpu_percent / 100.0
    }
}

#[cfg(feature = "cli")]
struct ProcessProbe {
    system: sysinfo::System,
    pid: sysinfo::Pid,
}

#[cfg(feature = "cli")]
impl ProcessProbe {
    fn attach() -> Option<Self> {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => pid,
            Err(e) => {
                tracing::warn!("Process stats unavailable: {}", e);
                return None;
            }
        };
        let mut probe = Self {
            system: sysinfo::System::new(),
            pid,
        };
        // CPU usage is a delta, so the first refresh only sets the reference point.
        probe.refresh();
        Some(probe)
    }

    fn refresh(&mut self) {
        self.system.refresh_processes(
            sysinfo::ProcessesToUpdate::Some(&[self.pid]),
            true,
        );
    }

    fn sample(&mut self) -> Option<(f32, u64)> {
        self.refresh();
        let process = self.system.process(self.pid)?;
        Some((process.cpu_usage(), process.memory() / 1024 / 1024))
    }
}

#[cfg(not(feature = "cli"))]
struct ProcessProbe;

#[cfg(not(feature = "cli"))]
impl ProcessProbe {
    fn attach() -> Option<Self> {
        tracing::debug!("Built without the cli feature, resource sampling is off");
        None
    }

    fn sample(&mut self) -> Option<(f32, u64)> {
        None
    }
}

pub struct LessonMonitor {
    probe: Option<Mutex<ProcessProbe>>,
    lesson_started: Mutex<Instant>,
    history: Mutex<Vec<LessonUsage>>,
}

impl LessonMonitor {
    pub fn new(enabled: bool) -> Self {
        let probe = if enabled { ProcessProbe::attach() } else { None };
        Self {
            probe: probe.map(Mutex::new),
            lesson_started: Mutex::new(Instant::now()),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.probe.is_some()
    }

    pub fn start_lesson(&self) {
        if let Ok(mut started) = self.lesson_started.lock() {
            *started = Instant::now();
        }
    }

    /// Samples the process and records the usage under `lesson`.
    ///
    /// Returns `None` when monitoring is off or the sample could not be taken.
    pub fn finish_lesson(&self, lesson: &str) -> Option<LessonUsage> {
        let probe = self.probe.as_ref()?;
        let elapsed = self.lesson_started.lock().ok()?.elapsed();
        let (cpu_percent, memory_mb) = probe.lock().ok()?.sample()?;

        let usage = LessonUsage {
            lesson: lesson.to_string(),
            elapsed,
            cpu_percent,
            memory_mb,
        };
        tracing::info!(
            lesson,
            elapsed_ms = elapsed.as_millis() as u64,
            cores_busy = usage.cores_busy(),
            memory_mb,
            "📊 Lesson resources"
        );

        self.history.lock().ok()?.push(usage.clone());
        Some(usage)
    }

    pub fn history(&self) -> Vec<LessonUsage> {
        self.history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    pub fn log_summary(&self) {
        let history = self.history();
        let Some(busiest) = history
            .iter()
            .max_by(|a, b| a.cpu_percent.total_cmp(&b.cpu_percent))
        else {
            return;
        };
        let peak_memory_mb = history.iter().map(|u| u.memory_mb).max().unwrap_or(0);
        let total: Duration = history.iter().map(|u| u.elapsed).sum();

        tracing::info!(
            lessons = history.len(),
            total_ms = total.as_millis() as u64,
            peak_memory_mb,
            busiest = %busiest.lesson,
            "📊 Resource summary"
        );
    }
}

impl Default for LessonMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Name of the machine this process runs on, as MPI's `Get_processor_name` reports it.
pub fn host_name() -> String {
    #[cfg(feature = "cli")]
    if let Some(name) = sysinfo::System::host_name() {
        return name;
    }

    std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_monitor_records_nothing() {
        let monitor = LessonMonitor::new(false);
        assert!(!monitor.is_enabled());

        monitor.start_lesson();
        assert!(monitor.finish_lesson("data-parallelism").is_none());
        assert!(monitor.history().is_empty());
        monitor.log_summary();
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_enabled_monitor_keeps_lesson_history() {
        let monitor = LessonMonitor::new(true);
        if !monitor.is_enabled() {
            return;
        }

        monitor.start_lesson();
        let usage = monitor.finish_lesson("task-parallelism");
        if let Some(usage) = usage {
            assert_eq!(usage.lesson, "task-parallelism");
            assert_eq!(monitor.history(), vec![usage]);
        }
    }

    #[test]
    fn test_cores_busy_scales_cpu_percent() {
        let usage = LessonUsage {
            lesson: "message-passing".to_string(),
            elapsed: Duration::from_millis(5),
            cpu_percent: 250.0,
            memory_mb: 12,
        };
        assert_eq!(usage.cores_busy(), 2.5);
    }

    #[test]
    fn test_host_name_is_not_empty() {
        assert!(!host_name().is_empty());
    }
}
