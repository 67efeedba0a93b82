use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use sulfur_core::catalog::SnapshotDescriptor;
use sulfur_core::config::SulfurConfig;
use sulfur_core::engine::BackupEngine;
use sulfur_core::error::SulfurError;
use sulfur_core::notify::{CatalogObserver, Notifier};

/// Captures every notification and catalog listing the engine emits.
#[derive(Clone, Default)]
struct Recorder {
    notifications: Arc<Mutex<Vec<String>>>,
    listings: Arc<Mutex<Vec<Vec<SnapshotDescriptor>>>>,
}

impl Recorder {
    fn messages(&self) -> Vec<String> {
        self.notifications.lock().unwrap().clone()
    }

    fn listing_count(&self) -> usize {
        self.listings.lock().unwrap().len()
    }

    fn last_listing(&self) -> Option<Vec<SnapshotDescriptor>> {
        self.listings.lock().unwrap().last().cloned()
    }
}

impl Notifier for Recorder {
    fn notify(&self, message: &str) {
        self.notifications.lock().unwrap().push(message.to_string());
    }
}

impl CatalogObserver for Recorder {
    fn catalog_changed(&self, snapshots: &[SnapshotDescriptor]) {
        self.listings.lock().unwrap().push(snapshots.to_vec());
    }
}

struct TestHost {
    _tmp: tempfile::TempDir,
    live_dir: PathBuf,
    backup_root: PathBuf,
    engine: BackupEngine,
    recorder: Recorder,
}

impl TestHost {
    /// Pump the engine like the host's per-frame tick until `done` holds.
    fn pump_until(&self, mut done: impl FnMut(&Recorder) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !done(&self.recorder) {
            self.engine.tick();
            assert!(
                Instant::now() < deadline,
                "timed out waiting for the engine; notifications so far: {:?}",
                self.recorder.messages()
            );
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn pump_until_notified(&self, message: &str) {
        self.pump_until(|r| r.messages().iter().any(|m| m == message));
    }

    /// Create a snapshot directory by hand and make the engine see it.
    fn seed_snapshot(&self, name: &str, files: &[(&str, &str)]) -> PathBuf {
        let dir = self.backup_root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        for (rel, contents) in files {
            let path = dir.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, contents).unwrap();
        }
        self.engine.refresh().unwrap();
        dir
    }

    fn write_live(&self, rel: &str, contents: &str) {
        let path = self.live_dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }
}

fn host() -> TestHost {
    host_with(|_| {})
}

fn host_with(tweak: impl FnOnce(&mut SulfurConfig)) -> TestHost {
    let tmp = tempfile::tempdir().unwrap();
    let backup_root = tmp.path().join("Perfect Random");
    let live_dir = backup_root.join("Sulfur");
    std::fs::create_dir_all(&live_dir).unwrap();

    let mut config = SulfurConfig {
        save_dir: Some(live_dir.display().to_string()),
        ..SulfurConfig::default()
    };
    tweak(&mut config);

    let recorder = Recorder::default();
    let engine = BackupEngine::new(
        &config,
        Arc::new(recorder.clone()),
        Arc::new(recorder.clone()),
    )
    .unwrap();

    TestHost {
        _tmp: tmp,
        live_dir,
        backup_root,
        engine,
        recorder,
    }
}

#[test]
fn backup_snapshots_the_save_dir_without_log_files() {
    let host = host();
    host.write_live("save.dat", "alpha");
    host.write_live("Maps/area1.dat", "beta");
    host.write_live("error.log", "noise");

    host.engine.request_backup();
    host.pump_until_notified("Current Save File Backed Up");

    let snapshots = host.engine.list_snapshots();
    assert_eq!(snapshots.len(), 1);
    assert!(snapshots[0].id.starts_with("Sulfur_"));

    let snap = &snapshots[0].path;
    assert_eq!(std::fs::read_to_string(snap.join("save.dat")).unwrap(), "alpha");
    assert_eq!(
        std::fs::read_to_string(snap.join("Maps/area1.dat")).unwrap(),
        "beta"
    );
    assert!(!snap.join("error.log").exists());

    // Exactly one terminal notification, and one catalog push.
    assert_eq!(host.recorder.messages(), vec!["Current Save File Backed Up"]);
    assert_eq!(host.recorder.listing_count(), 1);
    assert_eq!(host.recorder.last_listing().unwrap(), snapshots);
}

#[test]
fn restore_overwrites_in_place_and_keeps_unrelated_files() {
    let host = host();
    let snap = host.seed_snapshot(
        "Sulfur_01-01-2020_00-00-00",
        &[("save.dat", "from backup"), ("old.log", "stale log")],
    );
    host.write_live("save.dat", "current");
    host.write_live("extra.txt", "untouched");

    host.engine.request_select(&snap).unwrap();
    let listings_before = host.recorder.listing_count();
    host.engine.request_restore();
    host.pump_until_notified("Current Save File Replaced");

    assert_eq!(
        std::fs::read_to_string(host.live_dir.join("save.dat")).unwrap(),
        "from backup"
    );
    assert_eq!(
        std::fs::read_to_string(host.live_dir.join("extra.txt")).unwrap(),
        "untouched"
    );
    // Excluded files are never written at the destination either.
    assert!(!host.live_dir.join("old.log").exists());
    // Restore creates and deletes nothing, so no catalog push.
    assert_eq!(host.recorder.listing_count(), listings_before);
}

#[test]
fn restore_without_selection_reports_and_writes_nothing() {
    let host = host();
    host.write_live("save.dat", "current");

    host.engine.request_restore();

    // NoSelection is reported synchronously; no worker is spawned.
    assert_eq!(
        host.recorder.messages(),
        vec!["No backup selected to replace the current save."]
    );
    assert!(!host.engine.operation_in_flight());
    assert_eq!(
        std::fs::read_to_string(host.live_dir.join("save.dat")).unwrap(),
        "current"
    );
    assert!(host.engine.list_snapshots().is_empty());
}

#[test]
fn restore_of_a_vanished_selection_reports_not_found() {
    let host = host();
    let snap = host.seed_snapshot("Sulfur_01-01-2020_00-00-00", &[("save.dat", "x")]);
    host.engine.request_select(&snap).unwrap();

    std::fs::remove_dir_all(&snap).unwrap();
    host.engine.request_restore();

    assert_eq!(host.recorder.messages(), vec!["Selected backup no longer exists"]);
    assert!(!host.engine.operation_in_flight());
}

#[test]
fn delete_removes_the_snapshot_and_clears_selection() {
    let host = host();
    let snap = host.seed_snapshot("Sulfur_01-01-2020_00-00-00", &[("save.dat", "x")]);
    host.engine.request_select(&snap).unwrap();

    host.engine.request_delete();
    host.pump_until_notified("Backup deleted");

    assert!(!snap.exists());
    assert!(host.engine.current_selection().is_none());
    assert!(host.engine.list_snapshots().is_empty());
    assert_eq!(host.recorder.last_listing().unwrap(), Vec::new());
}

#[test]
fn delete_without_selection_reports_and_removes_nothing() {
    let host = host();
    let snap = host.seed_snapshot("Sulfur_01-01-2020_00-00-00", &[("save.dat", "x")]);

    host.engine.request_delete();

    assert!(host
        .recorder
        .messages()
        .contains(&"No backup selected for deletion".to_string()));
    assert!(snap.exists());
}

#[test]
fn selection_survives_an_unrelated_backup() {
    let host = host();
    let snap = host.seed_snapshot("Sulfur_01-01-2020_00-00-00", &[("save.dat", "x")]);
    host.write_live("save.dat", "current");
    host.engine.request_select(&snap).unwrap();

    host.engine.request_backup();
    host.pump_until_notified("Current Save File Backed Up");

    assert_eq!(host.engine.current_selection(), Some(snap));
    assert_eq!(host.engine.list_snapshots().len(), 2);
}

#[test]
fn concurrent_mutating_requests_are_rejected() {
    let host = host();
    host.write_live("save.dat", "current");

    // The gate is held from the first request until its completion action
    // is drained, so the second request is rejected deterministically.
    host.engine.request_backup();
    host.engine.request_backup();

    assert!(host
        .recorder
        .messages()
        .contains(&"Another backup operation is already running".to_string()));

    host.pump_until_notified("Current Save File Backed Up");
    assert!(!host.engine.operation_in_flight());

    // Released gate admits the next operation.
    host.engine.request_backup();
    host.pump_until(|r| {
        r.messages()
            .iter()
            .filter(|m| *m == "Current Save File Backed Up")
            .count()
            == 2
    });
}

#[test]
fn missing_live_save_dir_backs_up_nothing() {
    let host = host_with(|config| {
        let live = config.save_dir.take().unwrap();
        config.save_dir = Some(format!("{live}-never-created"));
    });

    host.engine.request_backup();
    host.pump_until_notified("Current Save File Backed Up");

    // Soft no-op: no snapshot directory appears and no catalog push fires.
    assert!(host.engine.list_snapshots().is_empty());
    assert_eq!(host.recorder.listing_count(), 0);
}

#[test]
fn select_of_an_unknown_path_leaves_selection_absent() {
    let host = host();
    let err = host
        .engine
        .request_select(&host.backup_root.join("Sulfur_09-09-2026_00-00-00"))
        .unwrap_err();
    assert!(matches!(err, SulfurError::SnapshotNotFound(_)));
    assert!(host.engine.current_selection().is_none());
}

#[test]
fn listing_is_idempotent_between_mutations() {
    let host = host();
    host.seed_snapshot("Sulfur_01-01-2020_00-00-00", &[("save.dat", "x")]);
    host.seed_snapshot("Sulfur_01-02-2020_00-00-00", &[("save.dat", "y")]);

    let first = host.engine.list_snapshots();
    let second = host.engine.list_snapshots();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    // Newest first.
    assert_eq!(first[0].id, "Sulfur_01-02-2020_00-00-00");
}
