pub mod stamp;

pub use stamp::{SnapshotStamp, SNAPSHOT_DIR_PREFIX};
