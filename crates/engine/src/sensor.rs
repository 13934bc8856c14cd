use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::schedule::lenient_f64;

/// Hysteresis applied when a sensor's context does not configure one.
pub const DEFAULT_HYSTERESIS: f64 = 0.5;

// ---------------------------------------------------------------------------
// Storage records
// ---------------------------------------------------------------------------

/// A temperature/humidity probe as the gateway stores it. `relay_id` is
/// the linkage key to the relay the probe drives (absent for unlinked
/// probes); `temp_offset` is a fixed calibration added to every raw
/// reading.
#[derive(Debug, Clone, Deserialize)]
pub struct SensorRecord {
    pub sensor_id: String,
    #[serde(default)]
    pub relay_id: Option<String>,
    #[serde(default)]
    pub temp_offset: f64,
    #[serde(default)]
    pub context: Value,
}

/// One immutable reading. "Latest" for a sensor means the maximum
/// `created_at` among its logs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SensorLog {
    pub sensor_id: String,
    pub temp: f64,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

// ---------------------------------------------------------------------------
// Resolution snapshot
// ---------------------------------------------------------------------------

/// What the servo resolver consumes: the adjusted reading plus the
/// setpoint configuration, computed once per resolution call.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSnapshot {
    pub sensor_id: String,
    /// Latest reading plus `temp_offset`; `None` when the sensor has no
    /// logs at all.
    pub temp: Option<f64>,
    pub target_temp: Option<f64>,
    pub temp_hysteresis: f64,
}

impl SensorRecord {
    pub fn snapshot(&self, latest_log: Option<&SensorLog>) -> SensorSnapshot {
        SensorSnapshot {
            sensor_id: self.sensor_id.clone(),
            temp: latest_log.map(|log| log.temp + self.temp_offset),
            target_temp: self.context.get("target_temp").and_then(lenient_f64),
            temp_hysteresis: self
                .context
                .get("hysteresis")
                .and_then(lenient_f64)
                .unwrap_or(DEFAULT_HYSTERESIS),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
