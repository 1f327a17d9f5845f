//! Idle-report monitor.
//!
//! Watches the profiler's last-recorded timestamp and renders a report to
//! a configured sink once no timing has started for the idle period, then
//! clears the timestamp so one quiet stretch produces exactly one report.
//!
//! Unlike an always-on background printer, the monitor is opt-in: nothing
//! is spawned until [`ReportMonitor::spawn`] is called.

use crate::error::{Error, Result};
use crate::profiler::Profiler;
use crate::report::{ReportSink, TracingSink};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::debug;

/// Monitor timing configuration.
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    /// Quiet time after the last `start` before a report is printed.
    pub idle_for: Duration,
    /// How often the monitor checks for quiet.
    pub poll_every: Duration,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        MonitorOptions {
            idle_for: Duration::from_secs(10),
            poll_every: Duration::from_secs(1),
        }
    }
}

impl MonitorOptions {
    /// Tight timings, mainly for tests and short-lived tools.
    pub fn quick() -> Self {
        MonitorOptions {
            idle_for: Duration::from_millis(100),
            poll_every: Duration::from_millis(20),
        }
    }

    /// Relaxed timings for long-running services.
    pub fn patient() -> Self {
        MonitorOptions {
            idle_for: Duration::from_secs(60),
            poll_every: Duration::from_secs(5),
        }
    }
}

/// Handle to a running idle-report monitor.
pub struct ReportMonitor {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ReportMonitor {
    /// Spawn a monitor that reports through `tracing` at info level.
    pub fn spawn(profiler: Profiler, options: MonitorOptions) -> Result<Self> {
        Self::spawn_with_sink(profiler, options, TracingSink)
    }

    /// Spawn a monitor rendering into a custom sink.
    pub fn spawn_with_sink<S>(profiler: Profiler, options: MonitorOptions, sink: S) -> Result<Self>
    where
        S: ReportSink + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let loop_stop = Arc::clone(&stop);
        let handle = std::thread::Builder::new()
            .name("proftree-monitor".to_string())
            .spawn(move || monitor_loop(profiler, options, sink, loop_stop))?;

        Ok(ReportMonitor {
            stop,
            handle: Some(handle),
        })
    }

    /// Stop the monitor and wait for its thread to finish.
    pub fn shutdown(&mut self) -> Result<()> {
        self.stop.store(true, Ordering::Release);
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| Error::ControlThreadPanicked),
            None => Ok(()),
        }
    }
}

impl Drop for ReportMonitor {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

fn monitor_loop<S: ReportSink>(
    profiler: Profiler,
    options: MonitorOptions,
    mut sink: S,
    stop: Arc<AtomicBool>,
) {
    let idle_nanos = options.idle_for.as_nanos() as u64;

    while !stop.load(Ordering::Acquire) {
        std::thread::sleep(options.poll_every);

        if let Some(idle) = profiler.nanos_since_last_recorded() {
            if idle >= idle_nanos {
                profiler.render(&mut sink);
                profiler.reset_last_recorded();
            }
        }
    }
    debug!("idle-report monitor stopped");
}
