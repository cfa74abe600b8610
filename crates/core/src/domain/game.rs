use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::DomainError;

/// Target game of a generated map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Game {
    #[serde(rename = "FS22")]
    Fs22,
    #[serde(rename = "FS25")]
    Fs25,
}

impl Game {
    pub fn code(self) -> &'static str {
        match self {
            Self::Fs22 => "FS22",
            Self::Fs25 => "FS25",
        }
    }

    /// Lowercase form used in template file names, e.g. `fs25-texture-schema.json`.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Fs22 => "fs22",
            Self::Fs25 => "fs25",
        }
    }

    pub fn supports_i3d(self) -> bool {
        matches!(self, Self::Fs25)
    }

    pub fn supports_splines(self) -> bool {
        matches!(self, Self::Fs25)
    }

    pub fn supports_satellite(self) -> bool {
        matches!(self, Self::Fs25)
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Game {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FS22" => Ok(Self::Fs22),
            "FS25" => Ok(Self::Fs25),
            _ => Err(DomainError::InvalidGame(s.to_string())),
        }
    }
}
