//! Application configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory under which session directories are created.
    pub recording_root: PathBuf,

    /// Supervision loop settings.
    pub supervisor: SupervisorConfig,

    /// External capture tool settings.
    pub capture: CaptureToolConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Settings for the reconciliation loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Seconds between ticks.
    pub tick_interval_secs: u64,

    /// Upper bound on a single windowing-system query.
    pub topology_timeout_secs: u64,

    /// Number of status lines kept in the rolling log.
    pub status_history: usize,

    /// Directory for the rolling status log. Falls back to the working directory.
    pub status_log_dir: Option<PathBuf>,

    /// X display the captures are pointed at (e.g. ":0.0").
    pub display: String,

    /// What to do with captures whose region left the topology.
    pub vanished_regions: VanishedRegionPolicy,

    /// How long a signalled capture may take to exit before it is killed.
    pub shutdown_grace_ms: u64,

    /// Terminate leftover capture-tool processes before the first tick.
    pub reap_stale_captures: bool,
}

/// Policy for registry entries whose region is missing from the latest topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VanishedRegionPolicy {
    /// Leave the capture running until it exits on its own.
    #[default]
    Keep,
    /// Shut the capture down on the tick the region is found missing.
    Prune,
}

/// External capture tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureToolConfig {
    /// Capture executable.
    pub program: String,

    /// Scheduling niceness; `None` runs the tool without `nice`.
    pub niceness: Option<i32>,

    /// Capture frame rate.
    pub frame_rate: u32,

    /// Video codec passed to the tool.
    pub video_codec: String,

    /// Encoder preset.
    pub preset: String,

    /// Output container format name.
    pub container_format: String,

    /// Artifact file extension.
    pub container_ext: String,

    /// Shared audio input recorded alongside every region. `None` disables audio.
    pub audio: Option<AudioInputConfig>,
}

/// Audio input recorded into each capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioInputConfig {
    /// Input format (e.g. "alsa", "pulse").
    pub format: String,

    /// Input device.
    pub device: String,

    /// Audio bitrate (e.g. "256k").
    pub bitrate: String,

    /// Sample rate in Hz.
    pub sample_rate: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "screencaster=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            recording_root: PathBuf::from("screencasts"),
            supervisor: SupervisorConfig::default(),
            capture: CaptureToolConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 10,
            topology_timeout_secs: 5,
            status_history: 100,
            status_log_dir: None,
            display: ":0.0".to_string(),
            vanished_regions: VanishedRegionPolicy::Keep,
            shutdown_grace_ms: 3000,
            reap_stale_captures: false,
        }
    }
}

impl SupervisorConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs.max(1))
    }

    pub fn topology_timeout(&self) -> Duration {
        Duration::from_secs(self.topology_timeout_secs.max(1))
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl Default for CaptureToolConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            niceness: Some(19),
            frame_rate: 8,
            video_codec: "libx264".to_string(),
            preset: "ultrafast".to_string(),
            container_format: "flv".to_string(),
            container_ext: "flv".to_string(),
            audio: Some(AudioInputConfig::default()),
        }
    }
}

impl Default for AudioInputConfig {
    fn default() -> Self {
        Self {
            format: "alsa".to_string(),
            device: "pulse".to_string(),
            bitrate: "256k".to_string(),
            sample_rate: 44100,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("screencaster").join("config.json")
}
