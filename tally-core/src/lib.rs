//! # tally-core
//!
//! Platform-agnostic meeting detection engine.
//!
//! Decides from a single snapshot whether the microphone and camera are in
//! use, using the per-app consent ledger and live audio-capture sessions.
//! Platform backends (Windows registry + WASAPI) implement the `ConsentStore`
//! and `AudioSubsystem` traits and plug into the generic `DetectionCoordinator`.
//!
//! ## Architecture
//!
//! ```text
//! tally-core (this crate)
//! ├── traits/       ← ConsentStore, LedgerKey, AudioSubsystem and its handle traits
//! ├── models/       ← DeviceCategory, UsageEntry, AudioSession, DetectionConfig,
//! │                   DetectionReport, DetectionError
//! └── detection/    ← ConsentStoreScanner, AudioSessionProbe, DetectionCoordinator
//! ```

pub mod detection;
pub mod models;
pub mod traits;

#[cfg(test)]
mod testing;

// Re-export key types at crate root for convenience.
pub use detection::coordinator::DetectionCoordinator;
pub use detection::probe::AudioSessionProbe;
pub use detection::scanner::ConsentStoreScanner;
pub use models::category::DeviceCategory;
pub use models::config::{CombinationPolicy, DetectionConfig, EvidenceSource};
pub use models::error::DetectionError;
pub use models::report::{CategoryOutcome, DetectionReport, DetectionResult, OverallVerdict};
pub use models::session::{ActivityState, AudioSession};
pub use models::usage::{Namespace, UsageEntry};
pub use traits::audio_subsystem::{
    Acquisition, AudioContext, AudioSubsystem, CaptureEndpoint, ExtendedSessionControl, HandleList, SessionControl,
    SessionManager,
};
pub use traits::consent_store::{ConsentStore, LedgerKey};
