//! Status heartbeat: artifact sizes per region, kept as a rolling log.
//!
//! The reporter only observes. It reads file sizes and writes its own log;
//! it never touches the registry or the captures.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::path::{Path, PathBuf};

use screencaster_common::clock::stamp_now;
use screencaster_platform_core::{RegionId, Topology};

use crate::registry::CaptureRegistry;

const BYTES_PER_MEGABYTE: u64 = 1024 * 1024;

/// One heartbeat: a stamp followed by `region=size` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub stamp: String,
    /// Artifact size in whole megabytes, `None` when the artifact does not exist yet.
    pub sizes: Vec<(RegionId, Option<u64>)>,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}>", self.stamp)?;
        for (region, size) in &self.sizes {
            match size {
                Some(mb) => write!(f, " {region}={mb}M")?,
                None => write!(f, " {region}=NA")?,
            }
        }
        Ok(())
    }
}

/// Size of `path` in whole megabytes, truncating.
pub fn artifact_megabytes(path: &Path) -> Option<u64> {
    std::fs::metadata(path)
        .ok()
        .filter(|meta| meta.is_file())
        .map(|meta| meta.len() / BYTES_PER_MEGABYTE)
}

/// Produces status lines and persists the newest `capacity` of them.
#[derive(Debug)]
pub struct StatusReporter {
    log_path: PathBuf,
    capacity: usize,
    history: VecDeque<String>,
    last_sizes: BTreeMap<RegionId, Option<u64>>,
}

impl StatusReporter {
    pub fn new(log_path: PathBuf, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            log_path,
            capacity,
            history: VecDeque::with_capacity(capacity),
            last_sizes: BTreeMap::new(),
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Retained lines, newest first.
    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    /// Size observed for each region on the latest report.
    pub fn last_sizes(&self) -> &BTreeMap<RegionId, Option<u64>> {
        &self.last_sizes
    }

    /// Report on every region that is both registered and in `topology`.
    pub fn report(&mut self, registry: &CaptureRegistry, topology: &Topology) -> StatusLine {
        self.report_at(stamp_now(), registry, topology)
    }

    pub fn report_at(
        &mut self,
        stamp: String,
        registry: &CaptureRegistry,
        topology: &Topology,
    ) -> StatusLine {
        let sizes: Vec<(RegionId, Option<u64>)> = registry
            .iter()
            .filter(|(id, _)| topology.contains(id))
            .map(|(id, capture)| (id.clone(), artifact_megabytes(capture.artifact_path())))
            .collect();

        for (id, size) in &sizes {
            self.last_sizes.insert(id.clone(), *size);
        }

        let line = StatusLine { stamp, sizes };
        self.push(line.to_string());
        line
    }

    fn push(&mut self, line: String) {
        self.history.push_front(line);
        self.history.truncate(self.capacity);

        if let Err(e) = self.flush() {
            tracing::warn!(
                path = %self.log_path.display(),
                error = %e,
                "Failed to write status log"
            );
        }
    }

    /// Rewrite the whole ring. Written to a sibling file and renamed into
    /// place, so the log on disk is always a complete snapshot.
    fn flush(&self) -> std::io::Result<()> {
        let mut contents = self
            .history
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n");
        contents.push('\n');

        let mut staging = self.log_path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        std::fs::write(&staging, contents)?;
        std::fs::rename(&staging, &self.log_path)
    }
}
