//! Recording session management.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use screencaster_common::clock::SessionClock;
use screencaster_common::config::SupervisorConfig;
use screencaster_common::error::ScreencastResult;
use screencaster_platform_core::Topology;
use screencaster_platform_linux::display::{read_topology, TopologySource};

use crate::capture::{CaptureLauncher, CaptureTarget};
use crate::reconcile::{ReconciliationEngine, TickReport};
use crate::registry::CaptureRegistry;
use crate::status::{StatusLine, StatusReporter};
use crate::workspace::{create_session_dir, ensure_writable, status_log_path};

/// Longest uninterrupted sleep between stop-flag checks.
const STOP_POLL_SLICE: Duration = Duration::from_millis(200);

/// State of a recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Directories prepared, no tick run yet.
    Idle,
    /// Supervision loop running.
    Recording,
    /// Every capture shut down.
    Stopped,
}

/// Result of one tick.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub topology: Topology,
    pub report: TickReport,
    pub status: StatusLine,
}

/// Totals over a session, returned when it stops.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub session_dir: PathBuf,
    pub ticks: u64,
    pub launches: u64,
    pub restarts: u64,
    pub failed_launches: u64,
    pub duration_secs: f64,
}

/// One supervised recording run: the registry, the last topology read, and
/// the status log, all owned here.
pub struct RecordingSession<T: TopologySource, L: CaptureLauncher> {
    clock: SessionClock,
    state: SessionState,
    session_dir: PathBuf,
    tick_interval: Duration,
    topology_source: T,
    topology: Topology,
    engine: ReconciliationEngine<L>,
    reporter: StatusReporter,
    ticks: u64,
    launches: u64,
    restarts: u64,
    failed_launches: u64,
    idle_ticks: u64,
}

impl<T: TopologySource, L: CaptureLauncher> RecordingSession<T, L> {
    /// Verify the recording root and create the session directory.
    ///
    /// An unwritable root is fatal; nothing is launched in that case.
    pub fn prepare(
        recording_root: &Path,
        config: &SupervisorConfig,
        topology_source: T,
        launcher: L,
    ) -> ScreencastResult<Self> {
        ensure_writable(recording_root)?;

        let clock = SessionClock::start();
        let stamp = clock.session_stamp();
        let session_dir = create_session_dir(recording_root, &stamp)?;
        let log_path = status_log_path(config.status_log_dir.as_deref(), &stamp);

        if config.reap_stale_captures && launcher.reap_stale() {
            tracing::info!("Interrupted capture processes left over from an earlier run");
        }

        tracing::info!(
            session_dir = %session_dir.display(),
            status_log = %log_path.display(),
            display = %config.display,
            "Recording session prepared"
        );

        let target = CaptureTarget {
            display: config.display.clone(),
            output_dir: session_dir.clone(),
        };

        Ok(Self {
            clock,
            state: SessionState::Idle,
            session_dir,
            tick_interval: config.tick_interval(),
            topology_source,
            topology: Topology::new(),
            engine: ReconciliationEngine::new(launcher, target, config.vanished_regions),
            reporter: StatusReporter::new(log_path, config.status_history),
            ticks: 0,
            launches: 0,
            restarts: 0,
            failed_launches: 0,
            idle_ticks: 0,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    pub fn status_log_path(&self) -> &Path {
        self.reporter.log_path()
    }

    pub fn registry(&self) -> &CaptureRegistry {
        self.engine.registry()
    }

    pub fn reporter(&self) -> &StatusReporter {
        &self.reporter
    }

    /// Topology seen by the latest tick.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Consecutive ticks that ended with no live capture.
    pub fn idle_ticks(&self) -> u64 {
        self.idle_ticks
    }

    /// Read topology, reconcile, report.
    pub fn tick(&mut self) -> TickOutcome {
        self.state = SessionState::Recording;

        let topology = read_topology(&self.topology_source);
        let report = self.engine.reconcile(&topology);
        let status = self.reporter.report(self.engine.registry(), &topology);

        self.ticks += 1;
        self.launches += report.launched.len() as u64;
        self.restarts += report.restarted.len() as u64;
        self.failed_launches += report.failed.len() as u64;

        if report.liveness {
            self.idle_ticks = 0;
        } else {
            self.idle_ticks += 1;
            tracing::warn!(
                idle_ticks = self.idle_ticks,
                regions = topology.len(),
                "No capture is running"
            );
        }

        tracing::info!("{status}");
        self.topology = topology.clone();

        TickOutcome {
            topology,
            report,
            status,
        }
    }

    /// Tick until `stop` is raised, then shut every capture down.
    ///
    /// A tick in progress always completes; only the sleep between ticks is
    /// cut short.
    pub fn run(&mut self, stop: &AtomicBool) -> SessionSummary {
        tracing::info!(interval = ?self.tick_interval, "Supervision loop started");

        while !stop.load(Ordering::SeqCst) {
            self.tick();
            sleep_unless_stopped(self.tick_interval, stop);
        }

        tracing::info!("Stop requested");
        self.stop()
    }

    /// Shut down every capture and summarise the session.
    pub fn stop(&mut self) -> SessionSummary {
        self.engine.shutdown_all();
        self.state = SessionState::Stopped;

        let summary = SessionSummary {
            session_dir: self.session_dir.clone(),
            ticks: self.ticks,
            launches: self.launches,
            restarts: self.restarts,
            failed_launches: self.failed_launches,
            duration_secs: self.clock.elapsed_secs(),
        };
        tracing::info!(
            ticks = summary.ticks,
            launches = summary.launches,
            restarts = summary.restarts,
            duration_secs = summary.duration_secs,
            "Recording stopped"
        );
        summary
    }
}

impl<T: TopologySource, L: CaptureLauncher> Drop for RecordingSession<T, L> {
    fn drop(&mut self) {
        if self.state != SessionState::Stopped {
            self.engine.shutdown_all();
        }
    }
}

fn sleep_unless_stopped(total: Duration, stop: &AtomicBool) {
    let deadline = Instant::now() + total;
    while !stop.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        std::thread::sleep((deadline - now).min(STOP_POLL_SLICE));
    }
}
