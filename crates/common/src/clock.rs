//! Session clock and timestamp utilities.
//!
//! Every artifact a session produces (session directory, capture files,
//! status lines, the status log) is stamped with local wall-clock time in a
//! path-safe form: `YYYY-MM-DD-HH-MM-SS-mmm`.

use std::time::Instant;

use chrono::{DateTime, Local};

/// Format used for all path and status-line stamps.
pub const STAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S-%3f";

/// Path-safe stamp for the given instant.
pub fn path_stamp(at: &DateTime<Local>) -> String {
    at.format(STAMP_FORMAT).to_string()
}

/// Path-safe stamp for the current local time.
pub fn stamp_now() -> String {
    path_stamp(&Local::now())
}

/// A clock anchored at session start.
#[derive(Debug, Clone)]
pub struct SessionClock {
    /// Monotonic instant the session started.
    epoch: Instant,

    /// Wall-clock time at session start.
    started_at: DateTime<Local>,
}

impl SessionClock {
    /// Create a new session clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            started_at: Local::now(),
        }
    }

    /// Wall-clock time at session start.
    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// Path-safe stamp of the session start.
    pub fn session_stamp(&self) -> String {
        path_stamp(&self.started_at)
    }

    /// Seconds elapsed since the session started.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}
