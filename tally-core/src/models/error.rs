use thiserror::Error;

/// Errors raised by ledger and audio subsystem backends.
///
/// None of these are fatal to a detection run: the scanner and probe turn
/// each of them into "no evidence" for the affected entry or source. Only
/// the binary treats `ConfigurationFailed` and `Unsupported` as fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DetectionError {
    /// Ledger location or endpoint enumerator missing or unreadable.
    #[error("not found or inaccessible: {0}")]
    AbsentOrInaccessible(String),

    /// Single ledger entry unreadable, missing its value, or wrongly typed.
    #[error("malformed entry: {0}")]
    MalformedEntry(String),

    /// Enumerator, session manager, or per-item OS call failed.
    #[error("subsystem unavailable: {0}")]
    SubsystemUnavailable(String),

    /// Audio subsystem already initialized in this process with another mode.
    #[error("audio subsystem already initialized in an incompatible concurrency mode")]
    IncompatibleConcurrencyMode,

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("unsupported platform: {0}")]
    Unsupported(String),
}
