use crate::models::error::DetectionError;
use crate::models::report::DetectionResult;
use crate::models::session::AudioSession;
use crate::traits::audio_subsystem::{
    Acquisition, AudioContext, AudioSubsystem, CaptureEndpoint, ExtendedSessionControl, HandleList, SessionControl,
    SessionManager,
};

/// Detects microphone use from live audio-capture sessions.
///
/// Catches capture the consent ledger misses, e.g. audio routed through a
/// virtual device. Stops at the first active session that is not the
/// endpoint's system-sounds session.
///
/// Handle lifetimes nest as:
/// ```text
/// context
/// └── endpoint collection
///     └── endpoint
///         └── session manager
///             └── session enumerator
///                 └── session control
///                     └── extended session control
/// ```
/// Each level is a local owned by the function that enumerates it, so
/// dropping happens innermost first and the context is always released last.
pub struct AudioSessionProbe<A: AudioSubsystem> {
    subsystem: A,
}

/// An active session and the endpoint it was found on.
struct ActiveSession {
    endpoint_id: Option<String>,
    session: AudioSession,
}

impl<A: AudioSubsystem> AudioSessionProbe<A> {
    pub fn new(subsystem: A) -> Self {
        Self { subsystem }
    }

    pub fn subsystem(&self) -> &A {
        &self.subsystem
    }

    pub fn probe(&self, verbose: bool) -> DetectionResult {
        let context = match self.subsystem.acquire() {
            Ok(Acquisition::Owned(context)) => context,
            Ok(Acquisition::NotOwned) => {
                log::warn!("Skipping audio session probe: {}", DetectionError::IncompatibleConcurrencyMode);
                return DetectionResult::not_in_use();
            }
            Err(e) => {
                log::warn!("Skipping audio session probe: {}", e);
                return DetectionResult::not_in_use();
            }
        };

        let found = find_active_session(&context);
        drop(context);

        match found {
            Some(active) => {
                log::debug!("Active capture session found (pid {:?})", active.session.process_id);
                let evidence = if verbose {
                    vec![active.session.evidence(active.endpoint_id.as_deref())]
                } else {
                    Vec::new()
                };
                DetectionResult { in_use: true, evidence }
            }
            None => DetectionResult::not_in_use(),
        }
    }
}

fn find_active_session<C: AudioContext>(context: &C) -> Option<ActiveSession> {
    let endpoints = match context.active_capture_endpoints() {
        Ok(endpoints) => endpoints,
        Err(e) => {
            log::warn!("Cannot enumerate capture endpoints: {}", e);
            return None;
        }
    };

    let count = match endpoints.count() {
        Ok(count) => count,
        Err(e) => {
            log::warn!("Cannot count capture endpoints: {}", e);
            return None;
        }
    };

    for index in 0..count {
        let endpoint = match endpoints.get(index) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                log::debug!("Skipping capture endpoint {}: {}", index, e);
                continue;
            }
        };

        match find_in_endpoint(&endpoint) {
            Ok(Some(session)) => {
                return Some(ActiveSession {
                    endpoint_id: endpoint.id(),
                    session,
                })
            }
            Ok(None) => {}
            Err(e) => log::debug!("Skipping capture endpoint {}: {}", index, e),
        }
    }

    None
}

fn find_in_endpoint<E: CaptureEndpoint>(endpoint: &E) -> Result<Option<AudioSession>, DetectionError> {
    let manager = endpoint.activate_session_manager()?;
    let sessions = manager.sessions()?;
    let count = sessions.count()?;

    for index in 0..count {
        match read_session(&sessions, index) {
            Ok(Some(session)) if session.is_evidence() => return Ok(Some(session)),
            Ok(_) => {}
            Err(e) => log::debug!("Skipping audio session {}: {}", index, e),
        }
    }

    Ok(None)
}

/// Read one session. `None` for the reserved system-sounds session, whose
/// state is never queried.
fn read_session<L>(sessions: &L, index: usize) -> Result<Option<AudioSession>, DetectionError>
where
    L: HandleList,
    L::Item: SessionControl,
{
    let control = sessions.get(index)?;
    let extended = control.extended()?;
    if extended.is_system_sounds_session() {
        return Ok(None);
    }

    let activity_state = control.state()?;
    Ok(Some(AudioSession {
        process_id: extended.process_id(),
        is_reserved_system_session: false,
        activity_state,
    }))
}
