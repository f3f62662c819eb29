//! Capture process handles and the launcher that spawns them.
//!
//! A capture is one external process recording one region to one artifact
//! file. During a tick the supervisor only polls it (`is_alive`, `try_reap`)
//! and signals it (`request_stop`). Only `shutdown`, used when the session
//! ends, waits for the process to go away.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use screencaster_common::clock::stamp_now;
use screencaster_common::config::CaptureToolConfig;
use screencaster_common::error::{ScreencastError, ScreencastResult};
use screencaster_platform_core::{RegionDescriptor, RegionId};
use screencaster_platform_linux::process::{interrupt_by_name, send_signal, Signal};
use wait_timeout::ChildExt;

/// Where a capture records to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureTarget {
    /// X display the region lives on (e.g. ":0.0").
    pub display: String,

    /// Directory receiving artifacts and per-region diagnostics.
    pub output_dir: PathBuf,
}

/// One running (or exited) capture.
pub trait CaptureProcess: Send {
    /// OS process id.
    fn pid(&self) -> u32;

    /// File the capture writes to. It may not exist yet.
    fn artifact_path(&self) -> &Path;

    /// Non-blocking poll. Any exit, clean or not, reads as `false`.
    fn is_alive(&mut self) -> bool;

    /// Stop the capture and wait until it is gone. Never fails; safe to call
    /// repeatedly.
    fn shutdown(&mut self);

    /// Ask the capture to stop without waiting for it.
    fn request_stop(&mut self) {
        self.shutdown();
    }

    /// Non-blocking: true once a stopping capture has exited. A capture still
    /// running past its grace period is killed here.
    fn try_reap(&mut self) -> bool {
        !self.is_alive()
    }
}

/// Starts captures for regions.
pub trait CaptureLauncher: Send {
    /// Spawn a capture for `region`. Fails only if the process cannot be spawned.
    fn launch(
        &self,
        region: &RegionDescriptor,
        target: &CaptureTarget,
    ) -> ScreencastResult<Box<dyn CaptureProcess>>;

    /// Stop capture processes left behind by an earlier run. Returns whether
    /// anything was signalled.
    fn reap_stale(&self) -> bool {
        false
    }
}

/// Artifact file name: `{stamp}-{region}.{ext}`.
pub fn artifact_file_name(stamp: &str, region: &RegionId, ext: &str) -> String {
    format!("{stamp}-{region}.{ext}")
}

/// Per-region diagnostics log name.
pub fn diagnostics_file_name(region: &RegionId) -> String {
    format!("screen-{region}.log")
}

/// A capture backed by a child process of the supervisor.
#[derive(Debug)]
pub struct ChildCapture {
    child: Child,
    artifact: PathBuf,
    grace: Duration,
    stop_deadline: Option<Instant>,
    exited: bool,
}

impl ChildCapture {
    /// Spawn `command` with its stderr redirected to `diagnostics`.
    pub fn spawn(
        region: &RegionId,
        mut command: Command,
        artifact: PathBuf,
        diagnostics: &Path,
        grace: Duration,
    ) -> ScreencastResult<Self> {
        let log = File::create(diagnostics).map_err(|e| {
            ScreencastError::launch(
                region.as_str(),
                format!("cannot open diagnostics log {}: {e}", diagnostics.display()),
            )
        })?;

        let child = command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(log))
            .spawn()
            .map_err(|e| ScreencastError::launch(region.as_str(), e.to_string()))?;

        Ok(Self {
            child,
            artifact,
            grace,
            stop_deadline: None,
            exited: false,
        })
    }

    fn force_kill(&mut self) {
        let pid = self.child.id();
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.exited = true;
        tracing::debug!(pid, "Capture process killed after grace period");
    }
}

impl CaptureProcess for ChildCapture {
    fn pid(&self) -> u32 {
        self.child.id()
    }

    fn artifact_path(&self) -> &Path {
        &self.artifact
    }

    fn is_alive(&mut self) -> bool {
        if self.exited {
            return false;
        }
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                tracing::debug!(pid = self.child.id(), %status, "Capture process exited");
                self.exited = true;
                false
            }
            Err(e) => {
                tracing::warn!(pid = self.child.id(), error = %e, "Failed to poll capture process");
                false
            }
        }
    }

    fn shutdown(&mut self) {
        if self.exited {
            return;
        }
        self.request_stop();

        let remaining = self
            .stop_deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .unwrap_or_default();
        match self.child.wait_timeout(remaining) {
            Ok(Some(_)) => self.exited = true,
            _ => self.force_kill(),
        }
    }

    fn request_stop(&mut self) {
        if self.exited || self.stop_deadline.is_some() {
            return;
        }
        // SIGINT lets the tool finalise its container before exiting. When it
        // cannot be delivered the grace period is skipped.
        let grace = if send_signal(self.child.id(), Signal::Interrupt) {
            self.grace
        } else {
            Duration::ZERO
        };
        self.stop_deadline = Some(Instant::now() + grace);
    }

    fn try_reap(&mut self) -> bool {
        if self.exited {
            return true;
        }
        match self.child.try_wait() {
            Ok(Some(_)) => {
                self.exited = true;
                true
            }
            Ok(None) => match self.stop_deadline {
                Some(deadline) if Instant::now() >= deadline => {
                    self.force_kill();
                    true
                }
                _ => false,
            },
            Err(_) => {
                self.force_kill();
                true
            }
        }
    }
}

impl Drop for ChildCapture {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Launches `ffmpeg` x11grab captures as configured by [`CaptureToolConfig`].
#[derive(Debug, Clone)]
pub struct FfmpegLauncher {
    tool: CaptureToolConfig,
    grace: Duration,
}

impl FfmpegLauncher {
    pub fn new(tool: CaptureToolConfig, grace: Duration) -> Self {
        Self { tool, grace }
    }

    /// Arguments for the capture tool itself (without any `nice` prefix).
    pub fn tool_args(
        &self,
        region: &RegionDescriptor,
        display: &str,
        artifact: &Path,
    ) -> Vec<String> {
        let geometry = &region.geometry;
        let mut args: Vec<String> = vec![
            "-nostdin".into(),
            "-y".into(),
            "-video_size".into(),
            geometry.size_arg(),
            "-f".into(),
            "x11grab".into(),
            "-framerate".into(),
            self.tool.frame_rate.to_string(),
            "-i".into(),
            format!("{}+{},{}", display.trim(), geometry.x, geometry.y),
        ];

        if let Some(audio) = &self.tool.audio {
            args.extend([
                "-f".into(),
                audio.format.clone(),
                "-i".into(),
                audio.device.clone(),
                "-b:a".into(),
                audio.bitrate.clone(),
                "-ar".into(),
                audio.sample_rate.to_string(),
            ]);
        }

        args.extend([
            "-vcodec".into(),
            self.tool.video_codec.clone(),
            "-preset".into(),
            self.tool.preset.clone(),
            "-f".into(),
            self.tool.container_format.clone(),
            artifact.to_string_lossy().into_owned(),
        ]);
        args
    }

    fn command(&self, region: &RegionDescriptor, display: &str, artifact: &Path) -> Command {
        let args = self.tool_args(region, display, artifact);
        match self.tool.niceness {
            Some(niceness) => {
                let mut command = Command::new("nice");
                command
                    .arg("-n")
                    .arg(niceness.to_string())
                    .arg(&self.tool.program)
                    .args(args);
                command
            }
            None => {
                let mut command = Command::new(&self.tool.program);
                command.args(args);
                command
            }
        }
    }
}

impl CaptureLauncher for FfmpegLauncher {
    fn launch(
        &self,
        region: &RegionDescriptor,
        target: &CaptureTarget,
    ) -> ScreencastResult<Box<dyn CaptureProcess>> {
        let file_name = artifact_file_name(&stamp_now(), &region.id, &self.tool.container_ext);
        let artifact = target.output_dir.join(file_name);
        let diagnostics = target.output_dir.join(diagnostics_file_name(&region.id));

        let command = self.command(region, &target.display, &artifact);
        tracing::debug!(region = %region.id, ?command, "Spawning capture");

        let capture = ChildCapture::spawn(&region.id, command, artifact, &diagnostics, self.grace)?;
        Ok(Box::new(capture))
    }

    fn reap_stale(&self) -> bool {
        interrupt_by_name(&self.tool.program)
    }
}
