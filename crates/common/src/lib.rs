//! Screencaster Common Utilities
//!
//! Shared infrastructure for all Screencaster crates:
//! - Error types and result aliases
//! - Session clock and path-safe timestamps
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
