use crate::models::category::DeviceCategory;
use crate::models::error::DetectionError;
use crate::models::report::DetectionResult;
use crate::models::usage::{Namespace, UsageEntry, LAST_USED_TIME_START, LAST_USED_TIME_STOP, NON_PACKAGED_KEY};
use crate::traits::consent_store::{ConsentStore, LedgerKey};

/// Reads the consent ledger for one device category.
///
/// Layout under each category key:
/// ```text
/// <category>\
/// ├── <packaged identity>\          LastUsedTimeStop = QWORD
/// ├── ...
/// └── NonPackaged\
///     ├── <desktop identity>\       LastUsedTimeStop = QWORD
///     └── ...
/// ```
pub struct ConsentStoreScanner<S: ConsentStore> {
    store: S,
}

impl<S: ConsentStore> ConsentStoreScanner<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Report whether any registered application has an open usage interval.
    ///
    /// Visits every entry so the evidence is complete; `verbose` only controls
    /// whether evidence lines are produced.
    pub fn scan(&self, category: DeviceCategory, verbose: bool) -> DetectionResult {
        let mut result = DetectionResult::not_in_use();
        for entry in self.entries(category).iter().filter(|e| e.is_open()) {
            result.in_use = true;
            if verbose {
                result.evidence.push(entry.evidence(category));
            }
        }
        result
    }

    /// All readable entries for a category, packaged identities first.
    ///
    /// Unreadable or malformed entries are skipped individually. A category
    /// that was never registered yields no entries.
    pub fn entries(&self, category: DeviceCategory) -> Vec<UsageEntry> {
        let base = match self.store.open_category(category) {
            Ok(key) => key,
            Err(e) => {
                log::debug!("No consent ledger for {}: {}", category, e);
                return Vec::new();
            }
        };

        let mut entries = Vec::new();

        for name in base.subkey_names() {
            if name.eq_ignore_ascii_case(NON_PACKAGED_KEY) {
                continue;
            }
            collect_entry(&base, &name, Namespace::Packaged, category, &mut entries);
        }

        match base.open_subkey(NON_PACKAGED_KEY) {
            Ok(desktop) => {
                for name in desktop.subkey_names() {
                    collect_entry(&desktop, &name, Namespace::NonPackaged, category, &mut entries);
                }
            }
            Err(e) => log::debug!("No desktop registrations for {}: {}", category, e),
        }

        entries
    }
}

fn collect_entry<K: LedgerKey>(
    parent: &K,
    name: &str,
    namespace: Namespace,
    category: DeviceCategory,
    entries: &mut Vec<UsageEntry>,
) {
    match read_entry(parent, name, namespace) {
        Ok(entry) => entries.push(entry),
        Err(e) => log::debug!("Skipping {} {} entry {}: {}", category, namespace, name, e),
    }
}

fn read_entry<K: LedgerKey>(parent: &K, name: &str, namespace: Namespace) -> Result<UsageEntry, DetectionError> {
    let key = parent.open_subkey(name)?;
    let last_used_end = key.read_u64(LAST_USED_TIME_STOP)?;

    let mut entry = UsageEntry::new(name, namespace, last_used_end);
    if entry.is_open() {
        entry.last_used_start = key.read_u64(LAST_USED_TIME_START).ok();
    }
    Ok(entry)
}
