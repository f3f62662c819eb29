mod common;

use std::path::PathBuf;

use common::{region_id, topology, FakeLauncher, FIRST, SECOND};
use screencaster_capture_engine::{CaptureTarget, ReconciliationEngine};
use screencaster_common::config::VanishedRegionPolicy;
use screencaster_platform_core::Topology;

fn engine(
    launcher: &FakeLauncher,
    policy: VanishedRegionPolicy,
) -> ReconciliationEngine<FakeLauncher> {
    let target = CaptureTarget {
        display: ":0.0".to_string(),
        output_dir: PathBuf::from("/tmp/screencaster-test"),
    };
    ReconciliationEngine::new(launcher.clone(), target, policy)
}

fn pid_of(engine: &ReconciliationEngine<FakeLauncher>, geometry: &str) -> u32 {
    engine
        .registry()
        .get(&region_id(geometry))
        .expect("region registered")
        .pid()
}

#[test]
fn single_region_gets_one_capture() {
    let launcher = FakeLauncher::default();
    let mut engine = engine(&launcher, VanishedRegionPolicy::Keep);

    let report = engine.reconcile(&topology(&[FIRST]));

    assert_eq!(report.launched, vec![region_id(FIRST)]);
    assert!(report.liveness);
    assert_eq!(engine.registry().len(), 1);
    assert_eq!(launcher.launch_count(), 1);
}

#[test]
fn only_the_unregistered_region_is_launched() {
    let launcher = FakeLauncher::default();
    let mut engine = engine(&launcher, VanishedRegionPolicy::Keep);
    engine.reconcile(&topology(&[FIRST]));
    let first_pid = pid_of(&engine, FIRST);

    let report = engine.reconcile(&topology(&[FIRST, SECOND]));

    assert_eq!(report.launched, vec![region_id(SECOND)]);
    assert!(report.restarted.is_empty());
    assert_eq!(launcher.launch_count(), 2);
    assert_eq!(pid_of(&engine, FIRST), first_pid);
    assert!(launcher.shutdowns().is_empty());
}

#[test]
fn dead_capture_is_replaced_in_the_same_tick() {
    let launcher = FakeLauncher::default();
    let mut engine = engine(&launcher, VanishedRegionPolicy::Keep);
    let layout = topology(&[FIRST]);
    engine.reconcile(&layout);
    let old_pid = pid_of(&engine, FIRST);

    launcher.exit(old_pid);
    let report = engine.reconcile(&layout);

    assert_eq!(report.restarted, vec![region_id(FIRST)]);
    assert!(report.launched.is_empty());
    assert!(report.liveness);
    assert_eq!(engine.registry().len(), 1);
    assert_ne!(pid_of(&engine, FIRST), old_pid);
    assert_eq!(launcher.shutdowns(), vec![old_pid]);
}

#[test]
fn liveness_ignores_topology_membership() {
    let launcher = FakeLauncher::default();
    let mut engine = engine(&launcher, VanishedRegionPolicy::Keep);
    engine.reconcile(&topology(&[FIRST, SECOND]));
    let pids = [pid_of(&engine, FIRST), pid_of(&engine, SECOND)];

    // Every monitor unplugged: the captures keep running and count as live.
    let report = engine.reconcile(&Topology::new());
    assert!(report.liveness);
    assert_eq!(engine.registry().len(), 2);
    assert_eq!(report.spawned(), 0);

    for pid in pids {
        launcher.exit(pid);
    }
    let report = engine.reconcile(&Topology::new());
    assert!(!report.liveness);
    assert_eq!(report.spawned(), 0);
}

#[test]
fn unchanged_topology_with_live_captures_launches_nothing() {
    let launcher = FakeLauncher::default();
    let mut engine = engine(&launcher, VanishedRegionPolicy::Keep);
    let layout = topology(&[FIRST, SECOND]);

    engine.reconcile(&layout);
    let after_first = launcher.launch_count();
    let second = engine.reconcile(&layout);
    let third = engine.reconcile(&layout);

    assert_eq!(after_first, 2);
    assert_eq!(launcher.launch_count(), after_first);
    assert_eq!(second.spawned() + third.spawned(), 0);
}

#[test]
fn failed_launch_is_retried_next_tick() {
    let launcher = FakeLauncher::default();
    let mut engine = engine(&launcher, VanishedRegionPolicy::Keep);
    let layout = topology(&[FIRST, SECOND]);
    launcher.fail(&region_id(SECOND));

    let report = engine.reconcile(&layout);
    assert_eq!(report.launched, vec![region_id(FIRST)]);
    assert_eq!(report.failed, vec![region_id(SECOND)]);
    assert!(!engine.registry().contains(&region_id(SECOND)));

    // Still failing: no retry within the tick, one attempt per tick.
    let report = engine.reconcile(&layout);
    assert_eq!(report.failed, vec![region_id(SECOND)]);

    launcher.heal(&region_id(SECOND));
    let report = engine.reconcile(&layout);
    assert_eq!(report.launched, vec![region_id(SECOND)]);
    assert_eq!(engine.registry().len(), 2);
}

#[test]
fn failed_restart_leaves_region_unregistered_until_next_tick() {
    let launcher = FakeLauncher::default();
    let mut engine = engine(&launcher, VanishedRegionPolicy::Keep);
    let layout = topology(&[FIRST]);
    engine.reconcile(&layout);
    let old_pid = pid_of(&engine, FIRST);

    launcher.exit(old_pid);
    launcher.fail(&region_id(FIRST));
    let report = engine.reconcile(&layout);
    assert_eq!(report.failed, vec![region_id(FIRST)]);
    assert!(engine.registry().is_empty());
    assert!(!report.liveness);

    launcher.heal(&region_id(FIRST));
    let report = engine.reconcile(&layout);
    assert_eq!(report.launched, vec![region_id(FIRST)]);
}

#[test]
fn keep_policy_leaves_vanished_captures_running() {
    let launcher = FakeLauncher::default();
    let mut engine = engine(&launcher, VanishedRegionPolicy::Keep);
    engine.reconcile(&topology(&[FIRST, SECOND]));

    let report = engine.reconcile(&topology(&[FIRST]));
    assert!(report.pruned.is_empty());
    assert!(engine.registry().contains(&region_id(SECOND)));
    assert_eq!(launcher.running(), 2);
}

#[test]
fn prune_policy_stops_vanished_captures() {
    let launcher = FakeLauncher::default();
    let mut engine = engine(&launcher, VanishedRegionPolicy::Prune);
    engine.reconcile(&topology(&[FIRST, SECOND]));
    let gone = pid_of(&engine, SECOND);

    let report = engine.reconcile(&topology(&[FIRST]));
    assert_eq!(report.pruned, vec![region_id(SECOND)]);
    assert_eq!(engine.registry().len(), 1);
    assert_eq!(launcher.shutdowns(), vec![gone]);
    assert!(report.liveness);
}

#[test]
fn changed_resolution_is_a_new_region() {
    let launcher = FakeLauncher::default();
    let mut engine = engine(&launcher, VanishedRegionPolicy::Prune);
    engine.reconcile(&topology(&[FIRST]));

    let report = engine.reconcile(&topology(&["1280x720+0+0"]));
    assert_eq!(report.launched, vec![region_id("1280x720+0+0")]);
    assert_eq!(report.pruned, vec![region_id(FIRST)]);
}

#[test]
fn shutdown_all_empties_the_registry() {
    let launcher = FakeLauncher::default();
    let mut engine = engine(&launcher, VanishedRegionPolicy::Keep);
    engine.reconcile(&topology(&[FIRST, SECOND]));

    engine.shutdown_all();
    assert!(engine.registry().is_empty());
    assert_eq!(launcher.running(), 0);
    assert_eq!(launcher.shutdowns().len(), 2);
}

#[cfg(unix)]
mod real_processes {
    use std::process::Command;
    use std::time::{Duration, Instant};

    use screencaster_capture_engine::{
        CaptureLauncher, CaptureProcess, ChildCapture, FfmpegLauncher,
    };
    use screencaster_common::config::CaptureToolConfig;
    use screencaster_common::error::ScreencastResult;
    use screencaster_platform_core::RegionDescriptor;

    use super::*;

    /// Launches processes that ignore SIGINT and only die to SIGKILL.
    struct StubbornLauncher {
        grace: Duration,
    }

    impl CaptureLauncher for StubbornLauncher {
        fn launch(
            &self,
            region: &RegionDescriptor,
            target: &CaptureTarget,
        ) -> ScreencastResult<Box<dyn CaptureProcess>> {
            let mut command = Command::new("sh");
            command.args(["-c", "trap '' INT; exec sleep 30"]);
            let capture = ChildCapture::spawn(
                &region.id,
                command,
                target.output_dir.join(format!("{}.flv", region.id)),
                &target.output_dir.join(format!("screen-{}.log", region.id)),
                self.grace,
            )?;
            Ok(Box::new(capture))
        }
    }

    fn stubborn_engine(
        dir: &std::path::Path,
        grace: Duration,
    ) -> ReconciliationEngine<StubbornLauncher> {
        let target = CaptureTarget {
            display: ":0.0".to_string(),
            output_dir: dir.to_path_buf(),
        };
        ReconciliationEngine::new(StubbornLauncher { grace }, target, VanishedRegionPolicy::Prune)
    }

    #[test]
    fn pruning_does_not_wait_for_the_capture_to_exit() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = stubborn_engine(dir.path(), Duration::from_secs(3));
        engine.reconcile(&topology(&[FIRST]));
        // Let the shell install its trap.
        std::thread::sleep(Duration::from_millis(100));

        let started = Instant::now();
        let report = engine.reconcile(&Topology::new());
        assert!(
            started.elapsed() < Duration::from_secs(1),
            "prune blocked the tick for {:?}",
            started.elapsed()
        );
        assert_eq!(report.pruned, vec![region_id(FIRST)]);
        assert!(engine.registry().is_empty());
        assert_eq!(engine.stopping_count(), 1);

        engine.shutdown_all();
        assert_eq!(engine.stopping_count(), 0);
    }

    #[test]
    fn stopping_capture_is_killed_on_a_later_tick() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = stubborn_engine(dir.path(), Duration::from_millis(200));
        engine.reconcile(&topology(&[FIRST]));
        std::thread::sleep(Duration::from_millis(100));

        engine.reconcile(&Topology::new());
        assert_eq!(engine.stopping_count(), 1);

        std::thread::sleep(Duration::from_millis(400));
        let started = Instant::now();
        engine.reconcile(&Topology::new());
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(engine.stopping_count(), 0);
    }

    #[test]
    fn exited_tool_is_restarted_with_a_new_process() {
        let dir = tempfile::tempdir().unwrap();
        // `true` accepts any arguments and exits at once.
        let tool = CaptureToolConfig {
            program: "true".to_string(),
            niceness: None,
            audio: None,
            ..CaptureToolConfig::default()
        };
        let target = CaptureTarget {
            display: ":0.0".to_string(),
            output_dir: dir.path().to_path_buf(),
        };
        let mut engine = ReconciliationEngine::new(
            FfmpegLauncher::new(tool, Duration::from_millis(200)),
            target,
            VanishedRegionPolicy::Keep,
        );
        let layout = topology(&[FIRST]);

        let first = engine.reconcile(&layout);
        assert_eq!(first.launched, vec![region_id(FIRST)]);
        let first_pid = engine.registry().get(&region_id(FIRST)).unwrap().pid();

        let mut restarted = false;
        for _ in 0..50 {
            std::thread::sleep(Duration::from_millis(100));
            if !engine.reconcile(&layout).restarted.is_empty() {
                restarted = true;
                break;
            }
        }

        assert!(restarted, "exited capture was never restarted");
        assert_eq!(engine.registry().len(), 1);
        assert_ne!(engine.registry().get(&region_id(FIRST)).unwrap().pid(), first_pid);
        assert!(dir.path().join("screen-1920x1080+0+0.log").exists());
        engine.shutdown_all();
    }
}
