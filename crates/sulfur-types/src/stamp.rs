use chrono::{Local, NaiveDateTime};
use std::fmt;

/// Prefix of every snapshot directory name. The live save directory is named
/// plain `Sulfur`, so the trailing underscore keeps it out of listings.
pub const SNAPSHOT_DIR_PREFIX: &str = "Sulfur_";

/// Wire format of the timestamp part of a snapshot directory name.
///
/// Month-first with dashes, e.g. `07-04-2026_13-45-10`. Existing backups on
/// disk use exactly this format, so it must never change.
const STAMP_FORMAT: &str = "%m-%d-%Y_%H-%M-%S";

/// Capture time of a snapshot, second resolution.
///
/// Two snapshots taken within the same second produce the same directory
/// name; the later write silently overwrites the earlier one.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotStamp(NaiveDateTime);

impl SnapshotStamp {
    /// Stamp for the current local time.
    pub fn now() -> Self {
        SnapshotStamp(Local::now().naive_local())
    }

    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        SnapshotStamp(dt)
    }

    /// Full snapshot directory name: `Sulfur_<MM-dd-yyyy_HH-mm-ss>`.
    pub fn directory_name(&self) -> String {
        format!("{SNAPSHOT_DIR_PREFIX}{self}")
    }

    /// Parse the stamp out of a snapshot directory name.
    ///
    /// Returns `None` for names without the prefix or with a malformed
    /// timestamp part (foreign directories that merely share the prefix).
    pub fn parse_directory_name(name: &str) -> Option<Self> {
        let stamp = name.strip_prefix(SNAPSHOT_DIR_PREFIX)?;
        NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT)
            .ok()
            .map(SnapshotStamp)
    }
}

impl fmt::Display for SnapshotStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(STAMP_FORMAT))
    }
}

impl fmt::Debug for SnapshotStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SnapshotStamp({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stamp(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> SnapshotStamp {
        SnapshotStamp::from_datetime(
            NaiveDate::from_ymd_opt(y, mo, d)
                .unwrap()
                .and_hms_opt(h, mi, s)
                .unwrap(),
        )
    }

    #[test]
    fn directory_name_matches_wire_format() {
        let s = stamp(2026, 7, 4, 13, 45, 10);
        assert_eq!(s.directory_name(), "Sulfur_07-04-2026_13-45-10");
    }

    #[test]
    fn parse_round_trips() {
        let s = stamp(2025, 12, 31, 23, 59, 59);
        let name = s.directory_name();
        assert_eq!(SnapshotStamp::parse_directory_name(&name), Some(s));
    }

    #[test]
    fn parse_rejects_foreign_names() {
        assert!(SnapshotStamp::parse_directory_name("Sulfur").is_none());
        assert!(SnapshotStamp::parse_directory_name("Sulfur_notadate").is_none());
        assert!(SnapshotStamp::parse_directory_name("Other_07-04-2026_13-45-10").is_none());
        // Day-first would put day 31 in the month slot.
        assert!(SnapshotStamp::parse_directory_name("Sulfur_31-12-2025_10-00-00").is_none());
    }

    #[test]
    fn single_digit_fields_are_zero_padded() {
        let s = stamp(2026, 1, 2, 3, 4, 5);
        assert_eq!(s.directory_name(), "Sulfur_01-02-2026_03-04-05");
    }

    #[test]
    fn stamps_order_chronologically() {
        let earlier = stamp(2026, 7, 4, 13, 45, 10);
        let later = stamp(2026, 7, 4, 13, 45, 11);
        assert!(earlier < later);
    }
}
