//! Seams over the OS multimedia subsystem used by `AudioSessionProbe`.
//!
//! Every associated type is an owned handle: dropping it releases the
//! underlying OS object. The probe never calls a release function itself,
//! so every exit path (early "found" return, per-item failure, normal end)
//! releases exactly what was acquired, innermost first.

use crate::models::error::DetectionError;
use crate::models::session::ActivityState;

/// Outcome of acquiring the process-scoped subsystem context.
pub enum Acquisition<C> {
    /// The caller owns the context and releases it by dropping it.
    Owned(C),
    /// Already initialized in this process with an incompatible concurrency
    /// mode. Nothing was acquired and nothing may be released.
    NotOwned,
}

/// Entry point to the multimedia subsystem.
pub trait AudioSubsystem {
    type Context: AudioContext;

    /// Initialize the subsystem for the calling thread.
    fn acquire(&self) -> Result<Acquisition<Self::Context>, DetectionError>;
}

/// An initialized subsystem context. Uninitializes on drop.
pub trait AudioContext {
    type Endpoint: CaptureEndpoint;
    type Endpoints: HandleList<Item = Self::Endpoint>;

    /// Active capture-direction endpoints.
    ///
    /// Failure here is the only failure that aborts a probe.
    fn active_capture_endpoints(&self) -> Result<Self::Endpoints, DetectionError>;
}

/// Index-addressable collection handle (endpoint collection, session enumerator).
///
/// `get` acquires a new handle on every call.
pub trait HandleList {
    type Item;

    fn count(&self) -> Result<usize, DetectionError>;

    fn get(&self, index: usize) -> Result<Self::Item, DetectionError>;
}

pub trait CaptureEndpoint {
    type Manager: SessionManager;

    /// Endpoint id string, best-effort.
    fn id(&self) -> Option<String>;

    fn activate_session_manager(&self) -> Result<Self::Manager, DetectionError>;
}

pub trait SessionManager {
    type Session: SessionControl;
    type Sessions: HandleList<Item = Self::Session>;

    fn sessions(&self) -> Result<Self::Sessions, DetectionError>;
}

/// Primary control of one audio session.
pub trait SessionControl {
    type Extended: ExtendedSessionControl;

    fn state(&self) -> Result<ActivityState, DetectionError>;

    fn extended(&self) -> Result<Self::Extended, DetectionError>;
}

/// Extended control carrying process identity.
pub trait ExtendedSessionControl {
    fn is_system_sounds_session(&self) -> bool;

    fn process_id(&self) -> Option<u32>;
}
