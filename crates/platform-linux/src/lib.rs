//! Screencaster Linux Platform Integration
//!
//! Platform-specific implementations for Linux:
//! - **Display Topology:** monitor geometry discovery through `xrandr`
//! - **Processes:** bounded external calls and signal delivery
//! - **Permissions:** tool availability checks and user guidance

pub mod display;
pub mod permissions;
pub mod process;

pub use display::*;
pub use screencaster_platform_core::{
    DisplayServer, RegionDescriptor, RegionGeometry, RegionId, Topology,
};
