use tracing::info;

use crate::catalog::SnapshotDescriptor;

/// Outbound notification port. One call per operation outcome, success or
/// failure, with a short human-readable message. Fire-and-forget: the engine
/// owes no timing contract to whatever renders it.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Fired after any mutating operation completes and the catalog has been
/// re-scanned, with the fresh listing.
pub trait CatalogObserver: Send + Sync {
    fn catalog_changed(&self, snapshots: &[SnapshotDescriptor]);
}

/// Default notifier for headless hosts: forwards to the tracing log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        info!("{message}");
    }
}

/// Observer for hosts without a snapshot list to refresh.
pub struct NullObserver;

impl CatalogObserver for NullObserver {
    fn catalog_changed(&self, _snapshots: &[SnapshotDescriptor]) {}
}
