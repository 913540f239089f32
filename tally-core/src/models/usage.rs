use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::category::DeviceCategory;

/// Consent store root, relative to the current user's hive.
pub const CONSENT_STORE_ROOT: &str =
    r"SOFTWARE\Microsoft\Windows\CurrentVersion\CapabilityAccessManager\ConsentStore";

/// Reserved child holding desktop (non-packaged) application registrations.
pub const NON_PACKAGED_KEY: &str = "NonPackaged";

/// QWORD closing the most recent usage interval. Zero while still open.
pub const LAST_USED_TIME_STOP: &str = "LastUsedTimeStop";

/// QWORD FILETIME opening the most recent usage interval.
pub const LAST_USED_TIME_START: &str = "LastUsedTimeStart";

/// `LastUsedTimeStop` value meaning the device is in use right now.
pub const OPEN_INTERVAL: u64 = 0;

/// Seconds between 1601-01-01 (FILETIME epoch) and 1970-01-01.
const FILETIME_UNIX_OFFSET_SECS: i64 = 11_644_473_600;
const FILETIME_TICKS_PER_SEC: u64 = 10_000_000;

/// Which ledger subtree an application is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    /// Sandboxed (MSIX/UWP) apps, direct children of the category key.
    Packaged,
    /// Traditional desktop apps, children of `NonPackaged`.
    NonPackaged,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Packaged => f.write_str("packaged"),
            Self::NonPackaged => f.write_str("desktop"),
        }
    }
}

/// One application's registration under a device category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEntry {
    pub identity: String,
    pub namespace: Namespace,
    pub last_used_end: u64,
    pub last_used_start: Option<u64>,
}

impl UsageEntry {
    pub fn new(identity: impl Into<String>, namespace: Namespace, last_used_end: u64) -> Self {
        Self {
            identity: identity.into(),
            namespace,
            last_used_end,
            last_used_start: None,
        }
    }

    /// True while the usage interval has not been closed by the OS.
    pub fn is_open(&self) -> bool {
        self.last_used_end == OPEN_INTERVAL
    }

    /// When the current usage interval started, if the ledger recorded it.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.last_used_start.and_then(filetime_to_utc)
    }

    /// Evidence line naming category, namespace and identity.
    pub fn evidence(&self, category: DeviceCategory) -> String {
        let mut line = format!("{} in use by {} app {}", category, self.namespace, self.identity);
        if let Some(started) = self.started_at() {
            line.push_str(" since ");
            line.push_str(&started.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        line
    }
}

/// Convert a Windows FILETIME (100ns ticks since 1601) to UTC.
///
/// Returns `None` for zero and for values chrono cannot represent.
pub fn filetime_to_utc(filetime: u64) -> Option<DateTime<Utc>> {
    if filetime == 0 {
        return None;
    }
    let secs = (filetime / FILETIME_TICKS_PER_SEC) as i64 - FILETIME_UNIX_OFFSET_SECS;
    let nanos = ((filetime % FILETIME_TICKS_PER_SEC) * 100) as u32;
    DateTime::from_timestamp(secs, nanos)
}
