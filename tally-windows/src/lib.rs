//! # tally-windows
//!
//! Windows backend for tally.
//!
//! Provides:
//! - `RegistryConsentStore` — CapabilityAccessManager consent ledger under `HKEY_CURRENT_USER`
//! - `WasapiSubsystem` — live capture sessions via the MMDevice and WASAPI session APIs
//! - `ComApartment` — scoped COM initialization for the calling thread
//!
//! ## Platform Requirements
//! - Windows 10 1903+ for `ConsentStore` usage timestamps
//!
//! ## Usage
//! ```ignore
//! use tally_core::{DetectionConfig, DetectionCoordinator};
//! use tally_windows::{RegistryConsentStore, WasapiSubsystem};
//!
//! let coordinator = DetectionCoordinator::new(RegistryConsentStore::current_user(), WasapiSubsystem);
//! let report = coordinator.detect(&DetectionConfig::default())?;
//! println!("{}", report.verdict);
//! ```

#[cfg(target_os = "windows")]
pub mod com;
#[cfg(target_os = "windows")]
pub mod registry_store;
#[cfg(target_os = "windows")]
pub mod wasapi_sessions;

#[cfg(target_os = "windows")]
pub use com::ComApartment;
#[cfg(target_os = "windows")]
pub use registry_store::{RegistryConsentStore, RegistryKey};
#[cfg(target_os = "windows")]
pub use wasapi_sessions::WasapiSubsystem;
