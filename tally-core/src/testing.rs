//! In-memory backends for unit tests.
//!
//! `MemoryLedger` mirrors the registry layout of the consent store.
//! `MockSubsystem` hands out handles that record every acquisition and
//! release, so tests can check that each exit path releases what it took.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::category::DeviceCategory;
use crate::models::error::DetectionError;
use crate::models::session::ActivityState;
use crate::models::usage::{LAST_USED_TIME_STOP, NON_PACKAGED_KEY};
use crate::traits::audio_subsystem::{
    Acquisition, AudioContext, AudioSubsystem, CaptureEndpoint, ExtendedSessionControl, HandleList, SessionControl,
    SessionManager,
};
use crate::traits::consent_store::{ConsentStore, LedgerKey};

// --- Consent ledger ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryValue {
    Qword(u64),
    Dword(u32),
    Text(String),
}

#[derive(Debug, Clone, Default)]
pub struct MemoryKey {
    values: Vec<(String, MemoryValue)>,
    children: Vec<(String, MemoryKey)>,
    unopenable: bool,
}

impl MemoryKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(mut self, name: &str, value: MemoryValue) -> Self {
        self.values.push((name.to_string(), value));
        self
    }

    pub fn child(mut self, name: &str, key: MemoryKey) -> Self {
        self.children.push((name.to_string(), key));
        self
    }

    /// Packaged identity with the given `LastUsedTimeStop`.
    pub fn app(self, name: &str, last_used_end: u64) -> Self {
        self.child(name, MemoryKey::new().value(LAST_USED_TIME_STOP, MemoryValue::Qword(last_used_end)))
    }

    /// Desktop identity under `NonPackaged`, created on first use.
    pub fn desktop(mut self, name: &str, last_used_end: u64) -> Self {
        let entry = MemoryKey::new().value(LAST_USED_TIME_STOP, MemoryValue::Qword(last_used_end));
        match self.children.iter_mut().find(|(n, _)| n == NON_PACKAGED_KEY) {
            Some((_, desktop)) => desktop.children.push((name.to_string(), entry)),
            None => self.children.push((NON_PACKAGED_KEY.to_string(), MemoryKey::new().child(name, entry))),
        }
        self
    }

    pub fn unopenable(mut self) -> Self {
        self.unopenable = true;
        self
    }
}

impl LedgerKey for MemoryKey {
    fn subkey_names(&self) -> Vec<String> {
        self.children.iter().map(|(name, _)| name.clone()).collect()
    }

    fn open_subkey(&self, name: &str) -> Result<Self, DetectionError> {
        let (_, key) = self
            .children
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .ok_or_else(|| DetectionError::AbsentOrInaccessible(name.to_string()))?;
        if key.unopenable {
            return Err(DetectionError::MalformedEntry(format!("{}: access denied", name)));
        }
        Ok(key.clone())
    }

    fn read_u64(&self, value_name: &str) -> Result<u64, DetectionError> {
        match self.values.iter().find(|(n, _)| n == value_name) {
            Some((_, MemoryValue::Qword(v))) => Ok(*v),
            Some(_) => Err(DetectionError::MalformedEntry(format!("{} is not a QWORD", value_name))),
            None => Err(DetectionError::MalformedEntry(format!("{} missing", value_name))),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryLedger {
    categories: Vec<(DeviceCategory, MemoryKey)>,
    opens: Mutex<usize>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: DeviceCategory, key: MemoryKey) -> Self {
        self.categories.push((category, key));
        self
    }

    pub fn category_opens(&self) -> usize {
        *self.opens.lock()
    }
}

impl ConsentStore for MemoryLedger {
    type Key = MemoryKey;

    fn open_category(&self, category: DeviceCategory) -> Result<MemoryKey, DetectionError> {
        *self.opens.lock() += 1;
        self.categories
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, key)| key.clone())
            .ok_or_else(|| DetectionError::AbsentOrInaccessible(category.ledger_name().to_string()))
    }
}

// --- Audio subsystem ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireMode {
    Owned,
    Incompatible,
    Fails,
}

/// Acquisition/release bookkeeping shared by every mock handle.
#[derive(Debug, Clone, Default)]
pub struct HandleCounts {
    pub attempts: usize,
    pub state_queries: usize,
    pub events: Vec<String>,
    acquired: BTreeMap<&'static str, usize>,
    released: BTreeMap<&'static str, usize>,
}

impl HandleCounts {
    pub fn acquired(&self, kind: &str) -> usize {
        self.acquired.get(kind).copied().unwrap_or(0)
    }

    pub fn released(&self, kind: &str) -> usize {
        self.released.get(kind).copied().unwrap_or(0)
    }

    pub fn balanced(&self) -> bool {
        self.acquired == self.released
    }
}

type Tracker = Arc<Mutex<HandleCounts>>;

struct Tracked {
    kind: &'static str,
    tracker: Tracker,
}

impl Tracked {
    fn acquire(kind: &'static str, tracker: &Tracker) -> Self {
        let mut counts = tracker.lock();
        *counts.acquired.entry(kind).or_default() += 1;
        counts.events.push(format!("acquire {}", kind));
        Self {
            kind,
            tracker: Arc::clone(tracker),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        let mut counts = self.tracker.lock();
        *counts.released.entry(self.kind).or_default() += 1;
        counts.events.push(format!("release {}", self.kind));
    }
}

#[derive(Debug, Clone)]
pub struct MockSession {
    state: ActivityState,
    system_sounds: bool,
    pid: Option<u32>,
    extended_fails: bool,
    state_fails: bool,
}

impl MockSession {
    pub fn new(state: ActivityState) -> Self {
        Self {
            state,
            system_sounds: false,
            pid: None,
            extended_fails: false,
            state_fails: false,
        }
    }

    pub fn system_sounds(state: ActivityState) -> Self {
        Self {
            system_sounds: true,
            ..Self::new(state)
        }
    }

    pub fn pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    pub fn extended_fails(mut self) -> Self {
        self.extended_fails = true;
        self
    }

    pub fn state_fails(mut self) -> Self {
        self.state_fails = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct MockEndpoint {
    id: String,
    sessions: Vec<MockSession>,
    activation_fails: bool,
    enumerator_fails: bool,
    session_count_fails: bool,
    failing_session: Option<usize>,
}

impl MockEndpoint {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            sessions: Vec::new(),
            activation_fails: false,
            enumerator_fails: false,
            session_count_fails: false,
            failing_session: None,
        }
    }

    pub fn session(mut self, session: MockSession) -> Self {
        self.sessions.push(session);
        self
    }

    pub fn activation_fails(mut self) -> Self {
        self.activation_fails = true;
        self
    }

    pub fn enumerator_fails(mut self) -> Self {
        self.enumerator_fails = true;
        self
    }

    /// `GetCount` on the session enumerator fails.
    pub fn session_count_fails(mut self) -> Self {
        self.session_count_fails = true;
        self
    }

    /// Fetching the session at `index` from the enumerator fails.
    pub fn session_fetch_fails(mut self, index: usize) -> Self {
        self.failing_session = Some(index);
        self
    }
}

pub struct MockSubsystem {
    mode: AcquireMode,
    endpoints: Vec<MockEndpoint>,
    endpoints_fail: bool,
    endpoint_count_fails: bool,
    failing_item: Option<usize>,
    tracker: Tracker,
}

impl MockSubsystem {
    pub fn new() -> Self {
        Self {
            mode: AcquireMode::Owned,
            endpoints: Vec::new(),
            endpoints_fail: false,
            endpoint_count_fails: false,
            failing_item: None,
            tracker: Arc::new(Mutex::new(HandleCounts::default())),
        }
    }

    pub fn acquire_mode(mut self, mode: AcquireMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn endpoint(mut self, endpoint: MockEndpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Top-level endpoint enumeration fails.
    pub fn endpoints_fail(mut self) -> Self {
        self.endpoints_fail = true;
        self
    }

    /// `GetCount` on the endpoint collection fails.
    pub fn endpoint_count_fails(mut self) -> Self {
        self.endpoint_count_fails = true;
        self
    }

    /// Fetching the endpoint at `index` from the collection fails.
    pub fn failing_endpoint_item(mut self, index: usize) -> Self {
        self.failing_item = Some(index);
        self
    }

    pub fn counts(&self) -> HandleCounts {
        self.tracker.lock().clone()
    }
}

impl AudioSubsystem for MockSubsystem {
    type Context = MockContext;

    fn acquire(&self) -> Result<Acquisition<MockContext>, DetectionError> {
        self.tracker.lock().attempts += 1;
        match self.mode {
            AcquireMode::Owned => Ok(Acquisition::Owned(MockContext {
                endpoints: self.endpoints.clone(),
                endpoints_fail: self.endpoints_fail,
                count_fails: self.endpoint_count_fails,
                failing_item: self.failing_item,
                tracker: Arc::clone(&self.tracker),
                _handle: Tracked::acquire("context", &self.tracker),
            })),
            AcquireMode::Incompatible => Ok(Acquisition::NotOwned),
            AcquireMode::Fails => Err(DetectionError::SubsystemUnavailable("CoInitializeEx failed".into())),
        }
    }
}

pub struct MockContext {
    endpoints: Vec<MockEndpoint>,
    endpoints_fail: bool,
    count_fails: bool,
    failing_item: Option<usize>,
    tracker: Tracker,
    _handle: Tracked,
}

impl AudioContext for MockContext {
    type Endpoint = MockEndpointHandle;
    type Endpoints = MockEndpointList;

    fn active_capture_endpoints(&self) -> Result<MockEndpointList, DetectionError> {
        if self.endpoints_fail {
            return Err(DetectionError::SubsystemUnavailable("MMDeviceEnumerator".into()));
        }
        Ok(MockEndpointList {
            endpoints: self.endpoints.clone(),
            count_fails: self.count_fails,
            failing_item: self.failing_item,
            tracker: Arc::clone(&self.tracker),
            _handle: Tracked::acquire("endpoint_collection", &self.tracker),
        })
    }
}

pub struct MockEndpointList {
    endpoints: Vec<MockEndpoint>,
    count_fails: bool,
    failing_item: Option<usize>,
    tracker: Tracker,
    _handle: Tracked,
}

impl HandleList for MockEndpointList {
    type Item = MockEndpointHandle;

    fn count(&self) -> Result<usize, DetectionError> {
        if self.count_fails {
            return Err(DetectionError::SubsystemUnavailable("GetCount".into()));
        }
        Ok(self.endpoints.len())
    }

    fn get(&self, index: usize) -> Result<MockEndpointHandle, DetectionError> {
        if self.failing_item == Some(index) {
            return Err(DetectionError::SubsystemUnavailable(format!("Item({})", index)));
        }
        let spec = self
            .endpoints
            .get(index)
            .cloned()
            .ok_or_else(|| DetectionError::SubsystemUnavailable(format!("Item({})", index)))?;
        Ok(MockEndpointHandle {
            spec,
            tracker: Arc::clone(&self.tracker),
            _handle: Tracked::acquire("endpoint", &self.tracker),
        })
    }
}

pub struct MockEndpointHandle {
    spec: MockEndpoint,
    tracker: Tracker,
    _handle: Tracked,
}

impl CaptureEndpoint for MockEndpointHandle {
    type Manager = MockManager;

    fn id(&self) -> Option<String> {
        Some(self.spec.id.clone())
    }

    fn activate_session_manager(&self) -> Result<MockManager, DetectionError> {
        if self.spec.activation_fails {
            return Err(DetectionError::SubsystemUnavailable("Activate".into()));
        }
        Ok(MockManager {
            sessions: self.spec.sessions.clone(),
            enumerator_fails: self.spec.enumerator_fails,
            count_fails: self.spec.session_count_fails,
            failing_item: self.spec.failing_session,
            tracker: Arc::clone(&self.tracker),
            _handle: Tracked::acquire("session_manager", &self.tracker),
        })
    }
}

pub struct MockManager {
    sessions: Vec<MockSession>,
    enumerator_fails: bool,
    count_fails: bool,
    failing_item: Option<usize>,
    tracker: Tracker,
    _handle: Tracked,
}

impl SessionManager for MockManager {
    type Session = MockSessionHandle;
    type Sessions = MockSessionList;

    fn sessions(&self) -> Result<MockSessionList, DetectionError> {
        if self.enumerator_fails {
            return Err(DetectionError::SubsystemUnavailable("GetSessionEnumerator".into()));
        }
        Ok(MockSessionList {
            sessions: self.sessions.clone(),
            count_fails: self.count_fails,
            failing_item: self.failing_item,
            tracker: Arc::clone(&self.tracker),
            _handle: Tracked::acquire("session_enumerator", &self.tracker),
        })
    }
}

pub struct MockSessionList {
    sessions: Vec<MockSession>,
    count_fails: bool,
    failing_item: Option<usize>,
    tracker: Tracker,
    _handle: Tracked,
}

impl HandleList for MockSessionList {
    type Item = MockSessionHandle;

    fn count(&self) -> Result<usize, DetectionError> {
        if self.count_fails {
            return Err(DetectionError::SubsystemUnavailable("GetCount".into()));
        }
        Ok(self.sessions.len())
    }

    fn get(&self, index: usize) -> Result<MockSessionHandle, DetectionError> {
        if self.failing_item == Some(index) {
            return Err(DetectionError::SubsystemUnavailable(format!("GetSession({})", index)));
        }
        let spec = self
            .sessions
            .get(index)
            .cloned()
            .ok_or_else(|| DetectionError::SubsystemUnavailable(format!("GetSession({})", index)))?;
        Ok(MockSessionHandle {
            spec,
            tracker: Arc::clone(&self.tracker),
            _handle: Tracked::acquire("session_control", &self.tracker),
        })
    }
}

pub struct MockSessionHandle {
    spec: MockSession,
    tracker: Tracker,
    _handle: Tracked,
}

impl SessionControl for MockSessionHandle {
    type Extended = MockExtended;

    fn state(&self) -> Result<ActivityState, DetectionError> {
        self.tracker.lock().state_queries += 1;
        if self.spec.state_fails {
            return Err(DetectionError::SubsystemUnavailable("GetState".into()));
        }
        Ok(self.spec.state)
    }

    fn extended(&self) -> Result<MockExtended, DetectionError> {
        if self.spec.extended_fails {
            return Err(DetectionError::SubsystemUnavailable("IAudioSessionControl2".into()));
        }
        Ok(MockExtended {
            spec: self.spec.clone(),
            _handle: Tracked::acquire("session_control2", &self.tracker),
        })
    }
}

pub struct MockExtended {
    spec: MockSession,
    _handle: Tracked,
}

impl ExtendedSessionControl for MockExtended {
    fn is_system_sounds_session(&self) -> bool {
        self.spec.system_sounds
    }

    fn process_id(&self) -> Option<u32> {
        self.spec.pid
    }
}
