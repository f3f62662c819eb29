//! The reconciliation engine.
//!
//! Each tick compares the regions the windowing system reports against the
//! capture registry and issues the minimal corrective actions:
//!
//! ```text
//! region in topology, not registered   -> start a capture
//! region in topology, capture exited   -> shut down, remove, start again (same tick)
//! region in topology, capture running  -> nothing
//! registered, region missing           -> VanishedRegionPolicy decides
//! ```
//!
//! A failure on one region never stops the pass over the others; a region
//! whose launch failed is simply unregistered and retried next tick.
//!
//! Captures taken out of the registry are only signalled during a tick. They
//! wait in a stopping list that later ticks reap, killing any capture still
//! running past its grace period.

use screencaster_common::config::VanishedRegionPolicy;
use screencaster_platform_core::{RegionDescriptor, RegionId, Topology};

use crate::capture::{CaptureLauncher, CaptureProcess, CaptureTarget};
use crate::registry::CaptureRegistry;

/// What one reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Whether any registered capture is still running after the pass.
    pub liveness: bool,
    /// Regions that got their first capture this tick.
    pub launched: Vec<RegionId>,
    /// Regions whose dead capture was replaced this tick.
    pub restarted: Vec<RegionId>,
    /// Regions whose launch failed; retried next tick.
    pub failed: Vec<RegionId>,
    /// Regions shut down because they left the topology.
    pub pruned: Vec<RegionId>,
}

impl TickReport {
    /// Number of capture processes spawned this tick.
    pub fn spawned(&self) -> usize {
        self.launched.len() + self.restarted.len()
    }
}

/// Owns the capture registry and keeps it in line with the topology.
pub struct ReconciliationEngine<L: CaptureLauncher> {
    launcher: L,
    target: CaptureTarget,
    policy: VanishedRegionPolicy,
    registry: CaptureRegistry,
    stopping: Vec<Box<dyn CaptureProcess>>,
}

impl<L: CaptureLauncher> ReconciliationEngine<L> {
    pub fn new(launcher: L, target: CaptureTarget, policy: VanishedRegionPolicy) -> Self {
        Self {
            launcher,
            target,
            policy,
            registry: CaptureRegistry::new(),
            stopping: Vec::new(),
        }
    }

    pub fn registry(&self) -> &CaptureRegistry {
        &self.registry
    }

    /// Captures signalled to stop that have not exited yet.
    pub fn stopping_count(&self) -> usize {
        self.stopping.len()
    }

    /// Run one reconciliation pass against `topology`.
    pub fn reconcile(&mut self, topology: &Topology) -> TickReport {
        let mut report = TickReport::default();
        self.reap_stopping();

        for region in topology.iter() {
            match self.registry.is_alive(&region.id) {
                Some(true) => {}
                Some(false) => {
                    if let Some(stale) = self.registry.remove(&region.id) {
                        tracing::warn!(
                            region = %region.id,
                            pid = stale.pid(),
                            "Capture exited; restarting"
                        );
                        self.retire(stale);
                    }
                    if self.start_capture(region) {
                        report.restarted.push(region.id.clone());
                    } else {
                        report.failed.push(region.id.clone());
                    }
                }
                None => {
                    if self.start_capture(region) {
                        report.launched.push(region.id.clone());
                    } else {
                        report.failed.push(region.id.clone());
                    }
                }
            }
        }

        if self.policy == VanishedRegionPolicy::Prune {
            report.pruned = self.prune_vanished(topology);
        }

        report.liveness = self.registry.any_alive();
        report
    }

    /// Shut down every registered capture and wait out the stopping ones.
    pub fn shutdown_all(&mut self) {
        self.registry.shutdown_all();
        for mut capture in self.stopping.drain(..) {
            capture.shutdown();
        }
    }

    /// Signal `capture` and keep it until it has exited.
    fn retire(&mut self, mut capture: Box<dyn CaptureProcess>) {
        capture.request_stop();
        if !capture.try_reap() {
            self.stopping.push(capture);
        }
    }

    fn reap_stopping(&mut self) {
        self.stopping.retain_mut(|capture| {
            let gone = capture.try_reap();
            if gone {
                tracing::debug!(pid = capture.pid(), "Stopped capture reaped");
            }
            !gone
        });
    }

    fn start_capture(&mut self, region: &RegionDescriptor) -> bool {
        match self.launcher.launch(region, &self.target) {
            Ok(capture) => {
                tracing::info!(
                    region = %region.id,
                    pid = capture.pid(),
                    artifact = %capture.artifact_path().display(),
                    "Capture started"
                );
                self.registry.insert(region.id.clone(), capture);
                true
            }
            Err(e) => {
                tracing::error!(region = %region.id, error = %e, "Capture launch failed");
                false
            }
        }
    }

    fn prune_vanished(&mut self, topology: &Topology) -> Vec<RegionId> {
        let vanished: Vec<RegionId> = self
            .registry
            .ids()
            .filter(|id| !topology.contains(id))
            .cloned()
            .collect();

        for id in &vanished {
            if let Some(capture) = self.registry.remove(id) {
                tracing::info!(
                    region = %id,
                    pid = capture.pid(),
                    "Region vanished; stopping capture"
                );
                self.retire(capture);
            }
        }
        vanished
    }
}
