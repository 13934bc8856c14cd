use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schedule::Schedule;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Kind of actuator behind a relay. Assigned at creation, never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RelayType {
    Pump,
    Servo,
    Valve,
}

/// Desired or last-known relay state. `Unknown` is a legitimate,
/// displayable result whenever no determination can be made — it is not
/// an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RelayState {
    On,
    Off,
    #[default]
    Unknown,
}

impl RelayState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RelayState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ON" => Ok(Self::On),
            "OFF" => Ok(Self::Off),
            "UNKNOWN" => Ok(Self::Unknown),
            other => Err(format!("unknown relay state '{other}'")),
        }
    }
}

impl fmt::Display for RelayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pump => "PUMP",
            Self::Servo => "SERVO",
            Self::Valve => "VALVE",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Storage record and resolution snapshot
// ---------------------------------------------------------------------------

/// A relay as the gateway stores it: typed identity fields plus an open
/// JSON `context` holding the schedule and the last persisted state.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayRecord {
    pub relay_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub relay_type: RelayType,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub force_state: Option<RelayState>,
    #[serde(default)]
    pub context: Value,
}

fn default_true() -> bool {
    true
}

/// Immutable snapshot the resolver works on. The open `context` is
/// interpreted exactly once here: `state` comes from `context.state`
/// (default `Unknown`) and the schedule variant is decided up front, so
/// resolution branches on a closed type instead of probing JSON keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Relay {
    pub relay_id: String,
    pub name: String,
    pub relay_type: RelayType,
    pub is_active: bool,
    pub force_state: Option<RelayState>,
    pub state: RelayState,
    pub schedule: Schedule,
}

impl RelayRecord {
    pub fn snapshot(&self) -> Relay {
        let state = self
            .context
            .get("state")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();

        Relay {
            relay_id: self.relay_id.clone(),
            name: self.name.clone(),
            relay_type: self.relay_type,
            is_active: self.is_active,
            force_state: self.force_state,
            state,
            schedule: Schedule::from_context(&self.context),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
