//! Display topology discovery.
//!
//! The windowing system is asked for its current monitor layout and every
//! `WIDTHxHEIGHT+X+Y` substring in the answer becomes one region. A failed or
//! garbled query is reported as an empty topology so that a hiccup in the
//! windowing system never stops the supervision loop.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use screencaster_common::error::ScreencastResult;
use screencaster_platform_core::{DisplayServer, RegionGeometry, Topology};

use crate::process::capture_output;

/// Fallback X display when none is configured or inherited.
pub const DEFAULT_DISPLAY: &str = ":0.0";

/// Something that can describe the current monitor layout as text.
pub trait TopologySource: Send {
    fn query(&self) -> ScreencastResult<String>;
}

/// Queries the X server through the `xrandr` tool.
#[derive(Debug, Clone)]
pub struct XrandrTopology {
    program: String,
    timeout: Duration,
}

impl XrandrTopology {
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: "xrandr".to_string(),
            timeout,
        }
    }

    /// Use a different query executable (it must print xrandr-style output).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl TopologySource for XrandrTopology {
    fn query(&self) -> ScreencastResult<String> {
        capture_output(&self.program, &[], self.timeout)
    }
}

fn geometry_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d+)x(\d+)\+(\d+)\+(\d+)").expect("geometry pattern is valid")
    })
}

/// Extract one region per `WIDTHxHEIGHT+X+Y` match.
///
/// Matches whose numbers do not fit in a `u32` are skipped. Regions with the
/// same geometry collapse into one.
pub fn parse_topology(text: &str) -> Topology {
    geometry_pattern()
        .captures_iter(text)
        .filter_map(|caps| {
            let width = caps[1].parse().ok()?;
            let height = caps[2].parse().ok()?;
            let x = caps[3].parse().ok()?;
            let y = caps[4].parse().ok()?;
            Some(RegionGeometry::new(width, height, x, y))
        })
        .collect()
}

/// Read the current topology. Never fails; errors yield an empty topology.
pub fn read_topology(source: &dyn TopologySource) -> Topology {
    match source.query() {
        Ok(text) => {
            let topology = parse_topology(&text);
            if topology.is_empty() {
                tracing::debug!("Topology query returned no regions");
            }
            topology
        }
        Err(e) => {
            tracing::warn!(error = %e, "Topology query failed; treating as no regions");
            Topology::new()
        }
    }
}

/// Detect the current display server.
pub fn detect_display_server() -> DisplayServer {
    if std::env::var("WAYLAND_DISPLAY").is_ok() {
        DisplayServer::Wayland
    } else if std::env::var("DISPLAY").is_ok() {
        DisplayServer::X11
    } else {
        DisplayServer::Unknown
    }
}

/// The inherited `$DISPLAY`, or [`DEFAULT_DISPLAY`].
pub fn default_display_target() -> String {
    std::env::var("DISPLAY")
        .ok()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| DEFAULT_DISPLAY.to_string())
}
