use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the profile feed is laid out. `Grid` shows image tiles, `Chronological`
/// shows full post rows.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Grid,
    Chronological,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Grid => Self::Chronological,
            Self::Chronological => Self::Grid,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::Chronological => "chronological",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grid" => Ok(Self::Grid),
            "list" | "chronological" => Ok(Self::Chronological),
            other => Err(format!("Unknown view mode: {other}")),
        }
    }
}
