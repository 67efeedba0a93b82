use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SulfurError};
use crate::platform::paths;

/// Company/product segments of the live save directory, fixed by the game.
const SAVE_COMPANY: &str = "Perfect Random";
const SAVE_PRODUCT: &str = "Sulfur";

/// What to do when the live save directory is missing at backup time.
///
/// The backup still completes as an empty no-op either way; the policy only
/// controls whether the condition is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingSaveDirPolicy {
    #[default]
    Warn,
    Silent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SulfurConfig {
    /// Override for the live save directory. Defaults to the platform's
    /// Unity data root + `Perfect Random/Sulfur`.
    #[serde(default)]
    pub save_dir: Option<String>,
    /// Override for the directory that holds snapshots. Defaults to the
    /// parent of the live save directory (snapshots are its siblings).
    #[serde(default)]
    pub backup_dir: Option<String>,
    /// File extensions excluded from both backup and restore, without the
    /// leading dot. Matched case-insensitively.
    #[serde(default = "default_exclude_extensions")]
    pub exclude_extensions: Vec<String>,
    #[serde(default)]
    pub missing_save_dir: MissingSaveDirPolicy,
}

fn default_exclude_extensions() -> Vec<String> {
    vec!["log".to_string()]
}

impl Default for SulfurConfig {
    fn default() -> Self {
        Self {
            save_dir: None,
            backup_dir: None,
            exclude_extensions: default_exclude_extensions(),
            missing_save_dir: MissingSaveDirPolicy::default(),
        }
    }
}

/// The live save directory and the snapshot root, fully resolved.
#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    /// The directory the running game reads and writes.
    pub live_dir: PathBuf,
    /// Parent directory of all snapshots.
    pub backup_root: PathBuf,
}

impl SulfurConfig {
    /// Resolve the configured (or platform-default) save and backup paths.
    pub fn resolve_paths(&self) -> Result<ResolvedPaths> {
        let live_dir = match &self.save_dir {
            Some(dir) => PathBuf::from(dir),
            None => paths::unity_data_dir()
                .ok_or_else(|| {
                    SulfurError::Config(
                        "cannot determine the platform save-data directory; \
                         set 'save_dir' explicitly"
                            .into(),
                    )
                })?
                .join(SAVE_COMPANY)
                .join(SAVE_PRODUCT),
        };

        let backup_root = match &self.backup_dir {
            Some(dir) => PathBuf::from(dir),
            None => live_dir
                .parent()
                .ok_or_else(|| {
                    SulfurError::Config(format!(
                        "save directory '{}' has no parent to hold backups; \
                         set 'backup_dir' explicitly",
                        live_dir.display()
                    ))
                })?
                .to_path_buf(),
        };

        Ok(ResolvedPaths {
            live_dir,
            backup_root,
        })
    }
}

/// Load a config file. Missing keys fall back to their defaults.
pub fn load(path: &Path) -> Result<SulfurConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| SulfurError::Config(format!("cannot read '{}': {e}", path.display())))?;
    serde_yaml::from_str(&contents)
        .map_err(|e| SulfurError::Config(format!("invalid config '{}': {e}", path.display())))
}

/// Resolve the config file path: an explicit path wins, otherwise the
/// platform config dir is searched. Returns `None` when nothing exists;
/// callers fall back to `SulfurConfig::default()`.
pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(PathBuf::from(p));
    }
    let candidate = paths::config_dir()?.join("sulfur-backup").join("config.yaml");
    candidate.is_file().then_some(candidate)
}
