use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::category::DeviceCategory;

/// How per-category results combine into the meeting verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombinationPolicy {
    /// Meeting when the microphone or the camera is in use.
    Any,
    /// Meeting only when both the microphone and the camera are in use.
    #[default]
    Both,
}

impl CombinationPolicy {
    pub fn combine(self, microphone_in_use: bool, camera_in_use: bool) -> bool {
        match self {
            Self::Any => microphone_in_use || camera_in_use,
            Self::Both => microphone_in_use && camera_in_use,
        }
    }
}

impl fmt::Display for CombinationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Both => f.write_str("both"),
        }
    }
}

impl FromStr for CombinationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "any" | "or" => Ok(Self::Any),
            "both" | "and" => Ok(Self::Both),
            other => Err(format!("unknown combination policy: {} (expected any or both)", other)),
        }
    }
}

/// An independent source of device-usage evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    /// Per-application CapabilityAccessManager consent ledger.
    ConsentLedger,
    /// Live WASAPI capture sessions. Microphone only.
    AudioSessions,
}

impl EvidenceSource {
    pub fn supports(self, category: DeviceCategory) -> bool {
        match self {
            Self::ConsentLedger => true,
            Self::AudioSessions => category == DeviceCategory::Microphone,
        }
    }
}

impl fmt::Display for EvidenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConsentLedger => f.write_str("consent ledger"),
            Self::AudioSessions => f.write_str("audio sessions"),
        }
    }
}

/// Configuration for a detection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionConfig {
    /// Verdict combination (default: both devices).
    pub policy: CombinationPolicy,

    /// Collect human-readable evidence (default: false).
    pub verbose: bool,

    /// Sources consulted in order for the microphone, until one reports use.
    pub microphone_sources: Vec<EvidenceSource>,

    /// Sources consulted in order for the camera, until one reports use.
    pub camera_sources: Vec<EvidenceSource>,
}

impl DetectionConfig {
    pub fn with_policy(mut self, policy: CombinationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Drop the audio-session fallback, leaving only the consent ledger.
    pub fn ledger_only(mut self) -> Self {
        self.microphone_sources.retain(|s| *s == EvidenceSource::ConsentLedger);
        self.camera_sources.retain(|s| *s == EvidenceSource::ConsentLedger);
        self
    }

    pub fn sources_for(&self, category: DeviceCategory) -> &[EvidenceSource] {
        match category {
            DeviceCategory::Microphone => &self.microphone_sources,
            DeviceCategory::Camera => &self.camera_sources,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        for category in DeviceCategory::ALL {
            let sources = self.sources_for(category);
            if sources.is_empty() {
                return Err(format!("no evidence sources configured for {}", category));
            }
            if let Some(source) = sources.iter().find(|s| !s.supports(category)) {
                return Err(format!("{} cannot detect {} usage", source, category));
            }
        }
        Ok(())
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            policy: CombinationPolicy::default(),
            verbose: false,
            microphone_sources: vec![EvidenceSource::ConsentLedger, EvidenceSource::AudioSessions],
            camera_sources: vec![EvidenceSource::ConsentLedger],
        }
    }
}
