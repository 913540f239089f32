use crate::models::category::DeviceCategory;
use crate::models::error::DetectionError;

/// Read-only access to the per-user CapabilityAccessManager consent store.
///
/// Implemented by:
/// - `RegistryConsentStore` (Windows, `HKEY_CURRENT_USER`)
/// - an in-memory ledger in this crate's tests
pub trait ConsentStore {
    type Key: LedgerKey;

    /// Open the base key for a category.
    ///
    /// `AbsentOrInaccessible` when the category was never registered.
    fn open_category(&self, category: DeviceCategory) -> Result<Self::Key, DetectionError>;
}

/// An open ledger key. Closed when dropped.
pub trait LedgerKey: Sized {
    /// Names of the immediate children, in enumeration order.
    ///
    /// Enumeration stops at the first failure; names read so far are kept.
    fn subkey_names(&self) -> Vec<String>;

    fn open_subkey(&self, name: &str) -> Result<Self, DetectionError>;

    /// Read a 64-bit unsigned value.
    ///
    /// `MalformedEntry` when absent or stored under any other type.
    fn read_u64(&self, value_name: &str) -> Result<u64, DetectionError>;
}
