use thiserror::Error;

pub type Result<T> = std::result::Result<T, SulfurError>;

#[derive(Debug, Error)]
pub enum SulfurError {
    #[error("no backup is selected")]
    NoSelection,

    #[error("backup not found: '{0}'")]
    SnapshotNotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("directory walk error: {0}")]
    Walk(#[from] ignore::Error),
}
