#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use screencaster_capture_engine::{
    artifact_file_name, CaptureLauncher, CaptureProcess, CaptureTarget,
};
use screencaster_common::error::{ScreencastError, ScreencastResult};
use screencaster_platform_core::{RegionDescriptor, RegionId, Topology};
use screencaster_platform_linux::display::{parse_topology, TopologySource};

pub const FIRST: &str = "1920x1080+0+0";
pub const SECOND: &str = "1280x1024+1920+0";

pub fn topology(geometries: &[&str]) -> Topology {
    parse_topology(&geometries.join("\n"))
}

pub fn region_id(geometry: &str) -> RegionId {
    topology(&[geometry])
        .ids()
        .next()
        .cloned()
        .expect("well-formed geometry")
}

#[derive(Default)]
struct FakeState {
    next_pid: u32,
    launches: Vec<RegionId>,
    failing: HashSet<RegionId>,
    alive: HashMap<u32, Arc<AtomicBool>>,
    shutdowns: Vec<u32>,
}

/// Launcher whose captures are flags the test can flip.
#[derive(Clone, Default)]
pub struct FakeLauncher {
    state: Arc<Mutex<FakeState>>,
}

impl FakeLauncher {
    pub fn launches(&self) -> Vec<RegionId> {
        self.state.lock().unwrap().launches.clone()
    }

    pub fn launch_count(&self) -> usize {
        self.state.lock().unwrap().launches.len()
    }

    pub fn fail(&self, id: &RegionId) {
        self.state.lock().unwrap().failing.insert(id.clone());
    }

    pub fn heal(&self, id: &RegionId) {
        self.state.lock().unwrap().failing.remove(id);
    }

    /// Simulate the capture process exiting on its own.
    pub fn exit(&self, pid: u32) {
        if let Some(alive) = self.state.lock().unwrap().alive.get(&pid) {
            alive.store(false, Ordering::SeqCst);
        }
    }

    pub fn shutdowns(&self) -> Vec<u32> {
        self.state.lock().unwrap().shutdowns.clone()
    }

    pub fn running(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .alive
            .values()
            .filter(|alive| alive.load(Ordering::SeqCst))
            .count()
    }
}

impl CaptureLauncher for FakeLauncher {
    fn launch(
        &self,
        region: &RegionDescriptor,
        target: &CaptureTarget,
    ) -> ScreencastResult<Box<dyn CaptureProcess>> {
        let mut state = self.state.lock().unwrap();
        if state.failing.contains(&region.id) {
            return Err(ScreencastError::launch(region.id.as_str(), "spawn refused"));
        }

        state.next_pid += 1;
        let pid = 1000 + state.next_pid;
        let alive = Arc::new(AtomicBool::new(true));
        state.alive.insert(pid, alive.clone());
        state.launches.push(region.id.clone());

        let artifact = target
            .output_dir
            .join(artifact_file_name(&format!("t{pid}"), &region.id, "flv"));

        Ok(Box::new(FakeCapture {
            pid,
            artifact,
            alive,
            state: self.state.clone(),
        }))
    }
}

struct FakeCapture {
    pid: u32,
    artifact: PathBuf,
    alive: Arc<AtomicBool>,
    state: Arc<Mutex<FakeState>>,
}

impl CaptureProcess for FakeCapture {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn artifact_path(&self) -> &Path {
        &self.artifact
    }

    fn is_alive(&mut self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn shutdown(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
        self.state.lock().unwrap().shutdowns.push(self.pid);
    }
}

/// Topology source whose answer the test controls.
#[derive(Clone, Default)]
pub struct FakeTopology {
    text: Arc<Mutex<Option<String>>>,
}

impl FakeTopology {
    pub fn with(geometries: &[&str]) -> Self {
        let source = Self::default();
        source.set(geometries);
        source
    }

    pub fn set(&self, geometries: &[&str]) {
        *self.text.lock().unwrap() = Some(geometries.join("\n"));
    }

    /// Make the next queries fail as if the tool were unavailable.
    pub fn break_query(&self) {
        *self.text.lock().unwrap() = None;
    }
}

impl TopologySource for FakeTopology {
    fn query(&self) -> ScreencastResult<String> {
        self.text
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ScreencastError::topology("query tool unavailable"))
    }
}
