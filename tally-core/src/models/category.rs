use std::fmt;

use serde::{Deserialize, Serialize};

/// A privacy-sensitive device class tracked by the consent ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceCategory {
    Microphone,
    Camera,
}

impl DeviceCategory {
    pub const ALL: [DeviceCategory; 2] = [DeviceCategory::Microphone, DeviceCategory::Camera];

    /// Name of the category's subtree under the consent store root.
    pub fn ledger_name(self) -> &'static str {
        match self {
            Self::Microphone => "microphone",
            Self::Camera => "webcam",
        }
    }

    /// Human-readable label used in verbose output.
    pub fn label(self) -> &'static str {
        match self {
            Self::Microphone => "Microphone",
            Self::Camera => "Camera",
        }
    }
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ledger_name())
    }
}
