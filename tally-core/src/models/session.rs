use serde::{Deserialize, Serialize};

/// Activity state reported by an audio session control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityState {
    Active,
    Inactive,
    Expired,
}

/// Snapshot of one live audio-capture session, read during enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSession {
    pub process_id: Option<u32>,
    pub is_reserved_system_session: bool,
    pub activity_state: ActivityState,
}

impl AudioSession {
    /// Whether this session counts as evidence of microphone use.
    ///
    /// The system-sounds session exists on every endpoint and never does.
    pub fn is_evidence(&self) -> bool {
        !self.is_reserved_system_session && self.activity_state == ActivityState::Active
    }

    pub fn evidence(&self, endpoint_id: Option<&str>) -> String {
        let mut line = String::from("microphone in use by audio session");
        match self.process_id {
            Some(pid) => line.push_str(&format!(" (pid {})", pid)),
            None => line.push_str(" (pid unknown)"),
        }
        if let Some(id) = endpoint_id {
            line.push_str(&format!(" on endpoint {}", id));
        }
        line
    }
}
