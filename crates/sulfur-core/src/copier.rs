use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::debug;

use crate::error::Result;

/// File-exclusion predicate over extensions, matched case-insensitively
/// without the leading dot. The fixed policy excludes `log` so the game's
/// log files never travel in either direction.
#[derive(Debug, Clone)]
pub struct ExcludeRules {
    extensions: Vec<String>,
}

impl ExcludeRules {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions.iter().any(|x| x.eq_ignore_ascii_case(ext))
    }
}

/// One full-directory copy, used by both backup and restore.
#[derive(Debug, Clone)]
pub struct CopyJob {
    pub source: PathBuf,
    pub dest: PathBuf,
    pub exclude: ExcludeRules,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CopyStats {
    pub dirs_created: u64,
    pub files_copied: u64,
    pub files_skipped: u64,
    /// The source directory did not exist; nothing was written.
    pub source_missing: bool,
}

/// Walker over everything under `source`, in stable file-name order.
fn build_walker(source: &Path) -> ignore::Walk {
    let mut builder = WalkBuilder::new(source);
    builder.follow_links(false);
    builder.hidden(false);
    builder.ignore(false);
    builder.git_global(false);
    builder.git_exclude(false);
    builder.git_ignore(false);
    builder.require_git(false);
    builder.sort_by_file_name(std::ffi::OsStr::cmp);
    builder.build()
}

/// Duplicate `source` into `dest`, skipping excluded files and overwriting
/// anything already at the destination.
///
/// The whole directory structure (empty directories included) is mirrored
/// before the first file is copied, so an interrupted copy never leaves a
/// file without its parent. There is no rollback: the first error aborts the
/// remaining iteration and files copied so far stay on disk.
pub fn copy_tree(job: &CopyJob) -> Result<CopyStats> {
    let mut stats = CopyStats::default();

    if !job.source.is_dir() {
        stats.source_missing = true;
        return Ok(stats);
    }

    std::fs::create_dir_all(&job.dest)?;

    // Directories first.
    for entry in build_walker(&job.source) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(&job.source).unwrap_or(entry.path());
        if rel.as_os_str().is_empty() {
            continue;
        }
        if entry.file_type().is_some_and(|ft| ft.is_dir()) {
            std::fs::create_dir_all(job.dest.join(rel))?;
            stats.dirs_created += 1;
        }
    }

    // Then files.
    for entry in build_walker(&job.source) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(&job.source).unwrap_or(entry.path());
        if rel.as_os_str().is_empty() || entry.file_type().is_some_and(|ft| ft.is_dir()) {
            continue;
        }
        if job.exclude.is_excluded(entry.path()) {
            debug!(path = %entry.path().display(), "skipping excluded file");
            stats.files_skipped += 1;
            continue;
        }
        std::fs::copy(entry.path(), job.dest.join(rel))?;
        stats.files_copied += 1;
    }

    Ok(stats)
}
