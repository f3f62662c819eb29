//! Screencaster Capture Engine
//!
//! Supervises one screen-capture process per display region for the length
//! of a recording session, restarting captures that die and reporting how
//! much each one has written.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────── RecordingSession ─────────────────────────┐
//! │                                                                   │
//! │  TopologySource ──► ReconciliationEngine ──► StatusReporter       │
//! │     (xrandr)          CaptureRegistry          rolling ring       │
//! │                       CaptureLauncher                             │
//! └───────────────────────────────┬───────────────────────┬───────────┘
//!                                 ▼                       ▼
//!          {stamp}-recording/{stamp}-{region}.flv    {host}-{stamp}.log
//! ```
//!
//! Everything runs on one thread, one tick at a time. Captures are separate
//! OS processes and are only ever polled, never waited on.

pub mod capture;
pub mod reconcile;
pub mod registry;
pub mod session;
pub mod status;
pub mod workspace;

pub use capture::{
    artifact_file_name, CaptureLauncher, CaptureProcess, CaptureTarget, ChildCapture,
    FfmpegLauncher,
};
pub use reconcile::{ReconciliationEngine, TickReport};
pub use registry::CaptureRegistry;
pub use session::{RecordingSession, SessionState, SessionSummary, TickOutcome};
pub use status::{StatusLine, StatusReporter};
