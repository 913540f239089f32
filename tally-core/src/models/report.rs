use std::fmt;

use serde::{Deserialize, Serialize};

use super::config::{CombinationPolicy, EvidenceSource};

/// Outcome of one evidence source for one category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub in_use: bool,
    /// Evidence lines in discovery order. Empty when not verbose.
    pub evidence: Vec<String>,
}

impl DetectionResult {
    pub fn not_in_use() -> Self {
        Self::default()
    }
}

/// The meeting verdict for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallVerdict {
    pub meeting: bool,
}

impl OverallVerdict {
    pub fn label(self) -> &'static str {
        if self.meeting {
            "meeting"
        } else {
            "idle"
        }
    }
}

impl fmt::Display for OverallVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Resolved state of one device category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryOutcome {
    pub in_use: bool,
    /// The first source in the category's list that reported use.
    pub resolved_by: Option<EvidenceSource>,
}

/// Everything a detection run produced, for rendering by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionReport {
    pub verdict: OverallVerdict,
    pub policy: CombinationPolicy,
    pub microphone: CategoryOutcome,
    pub camera: CategoryOutcome,
    pub evidence: Vec<String>,
}

impl DetectionReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
