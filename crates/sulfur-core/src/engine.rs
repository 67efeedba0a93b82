use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use tracing::{error, info, warn};

use sulfur_types::SnapshotStamp;

use crate::catalog::{SnapshotCatalog, SnapshotDescriptor};
use crate::config::{MissingSaveDirPolicy, SulfurConfig};
use crate::copier::{self, CopyJob, ExcludeRules};
use crate::dispatch::DispatchQueue;
use crate::error::Result;
use crate::notify::{CatalogObserver, Notifier};

/// A poisoned catalog mutex only means a drained action panicked mid-update;
/// the listing is rebuilt by full re-scan anyway, so recover the guard.
fn lock_catalog(catalog: &Mutex<SnapshotCatalog>) -> MutexGuard<'_, SnapshotCatalog> {
    match catalog.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Everything a background worker needs to report back. Workers never touch
/// the catalog directly; mutations travel through the dispatch queue and run
/// on the owning context.
struct WorkerCtx {
    catalog: Arc<Mutex<SnapshotCatalog>>,
    dispatch: Arc<DispatchQueue>,
    notifier: Arc<dyn Notifier>,
    observer: Arc<dyn CatalogObserver>,
    in_flight: Arc<AtomicBool>,
}

impl WorkerCtx {
    /// Rebuild the catalog and push the fresh listing to the observer.
    /// Owning-context only (called from inside drained actions).
    fn refresh_catalog(&self) {
        let mut catalog = lock_catalog(&self.catalog);
        match catalog.rescan() {
            Ok(snapshots) => self.observer.catalog_changed(snapshots),
            Err(e) => error!(error = %e, "catalog re-scan failed"),
        }
    }

    fn finish(&self) {
        self.in_flight.store(false, Ordering::SeqCst);
    }
}

/// The backup/restore engine.
///
/// Owned by the host's single-threaded loop (the owning context). All
/// `request_*` calls are made from that context and never block on I/O:
/// mutating operations run on one background thread each and report back
/// through the dispatch queue, drained by [`BackupEngine::tick`].
pub struct BackupEngine {
    live_dir: PathBuf,
    backup_root: PathBuf,
    exclude: ExcludeRules,
    missing_save_dir: MissingSaveDirPolicy,
    catalog: Arc<Mutex<SnapshotCatalog>>,
    dispatch: Arc<DispatchQueue>,
    notifier: Arc<dyn Notifier>,
    observer: Arc<dyn CatalogObserver>,
    in_flight: Arc<AtomicBool>,
}

impl BackupEngine {
    pub fn new(
        config: &SulfurConfig,
        notifier: Arc<dyn Notifier>,
        observer: Arc<dyn CatalogObserver>,
    ) -> Result<Self> {
        let paths = config.resolve_paths()?;
        let mut catalog = SnapshotCatalog::new(paths.backup_root.clone());
        catalog.rescan()?;

        info!(
            live_dir = %paths.live_dir.display(),
            backup_root = %paths.backup_root.display(),
            snapshots = catalog.snapshots().len(),
            "backup engine ready"
        );

        Ok(Self {
            live_dir: paths.live_dir,
            backup_root: paths.backup_root,
            exclude: ExcludeRules::new(config.exclude_extensions.iter().cloned()),
            missing_save_dir: config.missing_save_dir,
            catalog: Arc::new(Mutex::new(catalog)),
            dispatch: Arc::new(DispatchQueue::new()),
            notifier,
            observer,
            in_flight: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Drain completed background work. The host calls this once per tick;
    /// catalog updates and notifications happen inside.
    pub fn tick(&self) -> usize {
        self.dispatch.drain_all()
    }

    /// Current catalog view for rendering. Does not touch the disk.
    pub fn list_snapshots(&self) -> Vec<SnapshotDescriptor> {
        lock_catalog(&self.catalog).snapshots().to_vec()
    }

    /// Re-scan on demand (e.g. when the host opens its backup window) and
    /// push the fresh listing to the observer.
    pub fn refresh(&self) -> Result<Vec<SnapshotDescriptor>> {
        let snapshots = lock_catalog(&self.catalog).rescan()?.to_vec();
        self.observer.catalog_changed(&snapshots);
        Ok(snapshots)
    }

    pub fn current_selection(&self) -> Option<PathBuf> {
        lock_catalog(&self.catalog).selection().map(Path::to_path_buf)
    }

    /// Select the snapshot at `path`. Fails (selection unchanged) when the
    /// path is not in the current listing.
    pub fn request_select(&self, path: &Path) -> Result<()> {
        match lock_catalog(&self.catalog).select(path) {
            Ok(()) => {
                info!(path = %path.display(), "backup selected");
                Ok(())
            }
            Err(e) => {
                warn!(path = %path.display(), "cannot select backup: not in the catalog");
                Err(e)
            }
        }
    }

    pub fn operation_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Snapshot the live save directory into a fresh timestamped folder.
    pub fn request_backup(&self) {
        if !self.try_begin("backup") {
            return;
        }

        let job = CopyJob {
            source: self.live_dir.clone(),
            dest: self.backup_root.join(SnapshotStamp::now().directory_name()),
            exclude: self.exclude.clone(),
        };
        let missing_policy = self.missing_save_dir;
        let ctx = self.worker_ctx();

        thread::spawn(move || {
            let result = copier::copy_tree(&job);
            let dispatch = ctx.dispatch.clone();
            dispatch.enqueue(move || {
                match result {
                    Ok(stats) if stats.source_missing => {
                        if missing_policy == MissingSaveDirPolicy::Warn {
                            warn!(
                                path = %job.source.display(),
                                "live save directory does not exist; nothing was backed up"
                            );
                        }
                        ctx.notifier.notify("Current Save File Backed Up");
                    }
                    Ok(stats) => {
                        info!(
                            snapshot = %job.dest.display(),
                            files = stats.files_copied,
                            skipped = stats.files_skipped,
                            "save backed up"
                        );
                        ctx.refresh_catalog();
                        ctx.notifier.notify("Current Save File Backed Up");
                    }
                    Err(e) => {
                        // No cleanup pass: a partial snapshot directory is
                        // simply picked up, or not, on the next scan.
                        error!(snapshot = %job.dest.display(), error = %e, "backup failed");
                        ctx.notifier.notify(&format!("Backup failed: {e}"));
                    }
                }
                ctx.finish();
            });
        });
    }

    /// Replace the live save directory's contents with the selected
    /// snapshot. Files present only in the live directory are left alone.
    pub fn request_restore(&self) {
        let Some(snapshot) =
            self.validated_selection("restore", "No backup selected to replace the current save.")
        else {
            return;
        };
        if !self.try_begin("restore") {
            return;
        }

        let job = CopyJob {
            source: snapshot,
            dest: self.live_dir.clone(),
            exclude: self.exclude.clone(),
        };
        let ctx = self.worker_ctx();

        thread::spawn(move || {
            let result = copier::copy_tree(&job);
            let dispatch = ctx.dispatch.clone();
            dispatch.enqueue(move || {
                match result {
                    Ok(stats) if stats.source_missing => {
                        warn!(path = %job.source.display(), "selected backup vanished before restore");
                        ctx.notifier.notify("Selected backup no longer exists");
                    }
                    Ok(stats) => {
                        info!(
                            snapshot = %job.source.display(),
                            files = stats.files_copied,
                            "save restored from backup"
                        );
                        ctx.notifier.notify("Current Save File Replaced");
                    }
                    Err(e) => {
                        error!(snapshot = %job.source.display(), error = %e, "restore failed");
                        ctx.notifier.notify(&format!("Restore failed: {e}"));
                    }
                }
                ctx.finish();
            });
        });
    }

    /// Recursively delete the selected snapshot.
    pub fn request_delete(&self) {
        let Some(snapshot) =
            self.validated_selection("delete", "No backup selected for deletion")
        else {
            return;
        };
        if !self.try_begin("delete") {
            return;
        }

        let ctx = self.worker_ctx();

        thread::spawn(move || {
            let result = std::fs::remove_dir_all(&snapshot);
            let dispatch = ctx.dispatch.clone();
            dispatch.enqueue(move || {
                match result {
                    Ok(()) => {
                        info!(path = %snapshot.display(), "backup deleted");
                        lock_catalog(&ctx.catalog).clear_selection();
                        ctx.refresh_catalog();
                        ctx.notifier.notify("Backup deleted");
                    }
                    Err(e) => {
                        // Selection and catalog stay as they were; the
                        // directory is assumed unchanged.
                        error!(path = %snapshot.display(), error = %e, "failed to delete backup");
                        ctx.notifier.notify(&format!("Failed to delete backup: {e}"));
                    }
                }
                ctx.finish();
            });
        });
    }

    /// Resolve the current selection for a mutating operation, notifying the
    /// appropriate condition when there is none or it has vanished on disk.
    fn validated_selection(&self, operation: &str, none_message: &str) -> Option<PathBuf> {
        let selected = lock_catalog(&self.catalog).selection().map(Path::to_path_buf);
        match selected {
            None => {
                warn!(operation, "no backup selected");
                self.notifier.notify(none_message);
                None
            }
            Some(path) if !path.is_dir() => {
                warn!(operation, path = %path.display(), "selected backup no longer exists");
                self.notifier.notify("Selected backup no longer exists");
                None
            }
            Some(path) => Some(path),
        }
    }

    /// Single-flight gate: at most one mutating operation in flight. The
    /// flag is released by the completion action, so the engine reads as
    /// busy until the result has been dispatched.
    fn try_begin(&self, operation: &str) -> bool {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            true
        } else {
            warn!(operation, "rejecting request: another operation is in flight");
            self.notifier.notify("Another backup operation is already running");
            false
        }
    }

    fn worker_ctx(&self) -> WorkerCtx {
        WorkerCtx {
            catalog: self.catalog.clone(),
            dispatch: self.dispatch.clone(),
            notifier: self.notifier.clone(),
            observer: self.observer.clone(),
            in_flight: self.in_flight.clone(),
        }
    }
}
