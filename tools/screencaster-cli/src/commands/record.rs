//! Supervise a recording session until Ctrl+C or SIGTERM.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::task::JoinHandle;
use screencaster_capture_engine::{FfmpegLauncher, RecordingSession};
use screencaster_common::config::{AppConfig, VanishedRegionPolicy};
use screencaster_platform_linux::display::XrandrTopology;

/// Command-line overrides for the loaded configuration.
pub struct RecordOptions {
    pub root: Option<PathBuf>,
    pub tick_secs: Option<u64>,
    pub display: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub prune_vanished: bool,
    pub reap_stale: bool,
}

pub async fn run(mut config: AppConfig, options: RecordOptions) -> anyhow::Result<()> {
    apply_overrides(&mut config, options);
    let supervisor = &config.supervisor;

    println!("Starting screencast supervision");
    println!("  Root: {}", config.recording_root.display());
    println!("  Display: {}", supervisor.display);
    println!("  Tick: {}s", supervisor.tick_interval().as_secs());
    println!("  Capture tool: {}", config.capture.program);
    println!();

    let source = XrandrTopology::new(supervisor.topology_timeout());
    let launcher = FfmpegLauncher::new(config.capture.clone(), supervisor.shutdown_grace());
    let mut session =
        RecordingSession::prepare(&config.recording_root, supervisor, source, launcher)
            .with_context(|| {
                format!(
                    "Cannot record into {}",
                    config.recording_root.display()
                )
            })?;

    println!("Recording into: {}", session.session_dir().display());
    println!("Status log: {}", session.status_log_path().display());
    println!("Press Ctrl+C to stop recording...");
    println!();

    let mut signals = StopSignals::install().context("Failed to install signal handlers")?;
    let stop = Arc::new(AtomicBool::new(false));
    let worker = {
        let stop = stop.clone();
        tokio::task::spawn_blocking(move || session.run(&stop))
    };

    let summary = supervise(worker, &stop, signals.recv()).await?;

    println!();
    println!("Recording stopped!");
    println!("  Session: {}", summary.session_dir.display());
    println!(
        "  Ticks: {}  Launches: {}  Restarts: {}  Failed launches: {}",
        summary.ticks, summary.launches, summary.restarts, summary.failed_launches
    );

    Ok(())
}

/// What ended supervision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Interrupt,
    Terminate,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Interrupt => write!(f, "Ctrl+C"),
            StopReason::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Ctrl+C and SIGTERM listeners. The SIGTERM handler is registered on
/// install, before any capture is started.
struct StopSignals {
    terminate: Signal,
}

impl StopSignals {
    fn install() -> std::io::Result<Self> {
        Ok(Self {
            terminate: signal(SignalKind::terminate())?,
        })
    }

    async fn recv(&mut self) -> std::io::Result<StopReason> {
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.map(|()| StopReason::Interrupt),
            Some(()) = self.terminate.recv() => Ok(StopReason::Terminate),
        }
    }
}

/// Wait until a stop signal arrives or the worker ends on its own.
///
/// On a signal the stop flag is raised and the worker is awaited, so the
/// session always gets to shut its captures down.
async fn supervise<T>(
    mut worker: JoinHandle<T>,
    stop: &AtomicBool,
    stop_signal: impl Future<Output = std::io::Result<StopReason>>,
) -> anyhow::Result<T> {
    tokio::select! {
        finished = &mut worker => finished.context("Supervision loop ended unexpectedly"),
        received = stop_signal => {
            stop.store(true, Ordering::SeqCst);
            if let Ok(reason) = &received {
                println!();
                println!("{reason} received, stopping captures...");
            }
            let finished = worker.await.context("Supervision loop panicked")?;
            received.context("Failed to listen for stop signals")?;
            Ok(finished)
        }
    }
}

fn apply_overrides(config: &mut AppConfig, options: RecordOptions) {
    if let Some(root) = options.root {
        config.recording_root = root;
    }
    if let Some(secs) = options.tick_secs {
        config.supervisor.tick_interval_secs = secs;
    }
    if let Some(display) = options
        .display
        .or_else(|| std::env::var("DISPLAY").ok().filter(|d| !d.trim().is_empty()))
    {
        config.supervisor.display = display;
    }
    if let Some(dir) = options.log_dir {
        config.supervisor.status_log_dir = Some(dir);
    }
    if options.prune_vanished {
        config.supervisor.vanished_regions = VanishedRegionPolicy::Prune;
    }
    if options.reap_stale {
        config.supervisor.reap_stale_captures = true;
    }
}
