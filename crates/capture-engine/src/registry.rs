//! The single source of truth for what is currently being recorded.

use std::collections::BTreeMap;

use screencaster_platform_core::RegionId;

use crate::capture::CaptureProcess;

/// Region identifier → capture handle. At most one handle per region.
///
/// Only the reconciliation engine adds or removes entries.
#[derive(Default)]
pub struct CaptureRegistry {
    entries: BTreeMap<RegionId, Box<dyn CaptureProcess>>,
}

impl CaptureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &RegionId) -> Option<&dyn CaptureProcess> {
        self.entries.get(id).map(|entry| entry.as_ref())
    }

    pub fn contains(&self, id: &RegionId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &RegionId> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RegionId, &dyn CaptureProcess)> {
        self.entries.iter().map(|(id, entry)| (id, entry.as_ref()))
    }

    /// Poll every entry; true if at least one capture is still running.
    pub fn any_alive(&mut self) -> bool {
        let mut alive = false;
        for entry in self.entries.values_mut() {
            alive |= entry.is_alive();
        }
        alive
    }

    pub(crate) fn is_alive(&mut self, id: &RegionId) -> Option<bool> {
        self.entries.get_mut(id).map(|entry| entry.is_alive())
    }

    /// Install `capture` for `id`. A displaced handle is shut down first.
    pub(crate) fn insert(&mut self, id: RegionId, capture: Box<dyn CaptureProcess>) {
        if let Some(mut displaced) = self.entries.insert(id, capture) {
            displaced.shutdown();
        }
    }

    pub(crate) fn remove(&mut self, id: &RegionId) -> Option<Box<dyn CaptureProcess>> {
        self.entries.remove(id)
    }

    /// Shut down and drop every entry.
    pub(crate) fn shutdown_all(&mut self) {
        for (id, mut entry) in std::mem::take(&mut self.entries) {
            tracing::info!(region = %id, pid = entry.pid(), "Stopping capture");
            entry.shutdown();
        }
    }
}

impl std::fmt::Debug for CaptureRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(id, entry)| (id, entry.pid())))
            .finish()
    }
}
