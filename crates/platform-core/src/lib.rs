//! Screencaster platform core contracts.
//!
//! This crate contains the display-region data structures shared by the
//! topology reader, the capture engine, and the CLI without coupling to a
//! concrete windowing system.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Rectangle of the virtual desktop covered by one monitor, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionGeometry {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

impl RegionGeometry {
    pub fn new(width: u32, height: u32, x: u32, y: u32) -> Self {
        Self {
            width,
            height,
            x,
            y,
        }
    }

    /// Frame size in the `WIDTHxHEIGHT` form capture tools expect.
    pub fn size_arg(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }

    /// Canonical `WIDTHxHEIGHT+X+Y` identifier.
    pub fn id(&self) -> RegionId {
        RegionId(format!(
            "{}x{}+{}+{}",
            self.width, self.height, self.x, self.y
        ))
    }
}

/// Stable identifier of a region, derived from its geometry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(String);

impl RegionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RegionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One detected display region, regenerated on every topology read.
///
/// Two descriptors are equal iff their identifiers match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionDescriptor {
    pub id: RegionId,
    pub geometry: RegionGeometry,
}

impl RegionDescriptor {
    pub fn new(geometry: RegionGeometry) -> Self {
        Self {
            id: geometry.id(),
            geometry,
        }
    }
}

impl PartialEq for RegionDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RegionDescriptor {}

impl From<RegionGeometry> for RegionDescriptor {
    fn from(geometry: RegionGeometry) -> Self {
        Self::new(geometry)
    }
}

/// The set of regions seen by one topology read, ordered by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    regions: BTreeMap<RegionId, RegionDescriptor>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a region. A region with an identifier already present replaces nothing.
    pub fn insert(&mut self, region: RegionDescriptor) -> bool {
        if self.regions.contains_key(&region.id) {
            return false;
        }
        self.regions.insert(region.id.clone(), region);
        true
    }

    pub fn contains(&self, id: &RegionId) -> bool {
        self.regions.contains_key(id)
    }

    pub fn get(&self, id: &RegionId) -> Option<&RegionDescriptor> {
        self.regions.get(id)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegionDescriptor> {
        self.regions.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &RegionId> {
        self.regions.keys()
    }
}

impl FromIterator<RegionGeometry> for Topology {
    fn from_iter<I: IntoIterator<Item = RegionGeometry>>(iter: I) -> Self {
        let mut topology = Topology::new();
        for geometry in iter {
            topology.insert(RegionDescriptor::new(geometry));
        }
        topology
    }
}

/// Display server / platform family used for capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DisplayServer {
    Wayland,
    X11,
    #[default]
    Unknown,
}

/// Compute virtual desktop bounds that include every region.
/// Returns `None` for an empty topology.
pub fn virtual_desktop_bounds(topology: &Topology) -> Option<RegionGeometry> {
    let min_x = topology.iter().map(|r| r.geometry.x).min()?;
    let min_y = topology.iter().map(|r| r.geometry.y).min()?;
    let max_x = topology
        .iter()
        .map(|r| r.geometry.x.saturating_add(r.geometry.width))
        .max()?;
    let max_y = topology
        .iter()
        .map(|r| r.geometry.y.saturating_add(r.geometry.height))
        .max()?;

    Some(RegionGeometry::new(max_x - min_x, max_y - min_y, min_x, min_y))
}
