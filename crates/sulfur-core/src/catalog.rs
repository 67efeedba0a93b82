use std::path::{Path, PathBuf};

use tracing::debug;

use sulfur_types::SNAPSHOT_DIR_PREFIX;

use crate::error::{Result, SulfurError};

/// One on-disk snapshot. `id` is the directory name and is unique among
/// live snapshots; the descriptor is never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotDescriptor {
    pub id: String,
    pub path: PathBuf,
}

/// In-memory view of the snapshot set plus the current selection.
///
/// The catalog is rebuilt by full re-scan after every mutating operation
/// rather than patched incrementally. It must only ever be touched from the
/// owning context; see the engine.
pub struct SnapshotCatalog {
    backup_root: PathBuf,
    snapshots: Vec<SnapshotDescriptor>,
    selected: Option<PathBuf>,
}

impl SnapshotCatalog {
    pub fn new(backup_root: PathBuf) -> Self {
        Self {
            backup_root,
            snapshots: Vec::new(),
            selected: None,
        }
    }

    /// Rebuild the listing from disk. If the previously selected snapshot is
    /// gone from the new listing, the selection is cleared.
    pub fn rescan(&mut self) -> Result<&[SnapshotDescriptor]> {
        self.snapshots = self.scan()?;

        if let Some(selected) = &self.selected {
            if !self.snapshots.iter().any(|s| &s.path == selected) {
                debug!(
                    path = %selected.display(),
                    "selected snapshot vanished; clearing selection"
                );
                self.selected = None;
            }
        }

        Ok(&self.snapshots)
    }

    fn scan(&self) -> Result<Vec<SnapshotDescriptor>> {
        // A missing backup root just means no snapshots yet (first run).
        let entries = match std::fs::read_dir(&self.backup_root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut snapshots = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.starts_with(SNAPSHOT_DIR_PREFIX) {
                snapshots.push(SnapshotDescriptor {
                    path: entry.path(),
                    id: name,
                });
            }
        }

        // Newest first. The zero-padded stamp format makes the id ordering
        // chronological for snapshots taken in the same year.
        snapshots.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(snapshots)
    }

    pub fn snapshots(&self) -> &[SnapshotDescriptor] {
        &self.snapshots
    }

    /// Select a snapshot by path. Fails with `SnapshotNotFound` (leaving any
    /// prior selection in place) unless the path is in the current listing.
    pub fn select(&mut self, path: &Path) -> Result<()> {
        if self.snapshots.iter().any(|s| s.path == path) {
            self.selected = Some(path.to_path_buf());
            Ok(())
        } else {
            Err(SulfurError::SnapshotNotFound(
                path.display().to_string(),
            ))
        }
    }

    pub fn selection(&self) -> Option<&Path> {
        self.selected.as_deref()
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }
}
