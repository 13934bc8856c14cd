use anyhow::Result;

use crate::relay::RelayRecord;
use crate::sensor::{SensorLog, SensorRecord};

// ---------------------------------------------------------------------------
// Gateway interface
// ---------------------------------------------------------------------------

/// Read-only persistence gateway. The engine never writes; callers own
/// snapshot consistency. Implementations are expected to surface fetch
/// failures as errors — the engine propagates them untouched.
pub trait RelayStore {
    fn relay(&self, relay_id: &str) -> Result<Option<RelayRecord>>;

    /// Relays not soft-deactivated, for sweep-style callers.
    fn active_relays(&self) -> Result<Vec<RelayRecord>>;

    /// The most recently created sensor whose `relay_id` matches, or
    /// `None`. An absent linkage is not an error.
    fn latest_sensor_for_relay(&self, relay_id: &str) -> Result<Option<SensorRecord>>;

    /// The log with the maximum `created_at` for a sensor, or `None`.
    fn latest_log_for_sensor(&self, sensor_id: &str) -> Result<Option<SensorLog>>;
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

/// In-memory store. Insertion order stands in for creation order, so the
/// last matching sensor is the most recently created one.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    relays: Vec<RelayRecord>,
    sensors: Vec<SensorRecord>,
    logs: Vec<SensorLog>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_relay(&mut self, relay: RelayRecord) {
        self.relays.push(relay);
    }

    pub fn add_sensor(&mut self, sensor: SensorRecord) {
        self.sensors.push(sensor);
    }

    pub fn add_log(&mut self, log: SensorLog) {
        self.logs.push(log);
    }
}

impl RelayStore for MemoryStore {
    fn relay(&self, relay_id: &str) -> Result<Option<RelayRecord>> {
        Ok(self.relays.iter().find(|r| r.relay_id == relay_id).cloned())
    }

    fn active_relays(&self) -> Result<Vec<RelayRecord>> {
        Ok(self.relays.iter().filter(|r| r.is_active).cloned().collect())
    }

    fn latest_sensor_for_relay(&self, relay_id: &str) -> Result<Option<SensorRecord>> {
        Ok(self
            .sensors
            .iter()
            .rev()
            .find(|s| s.relay_id.as_deref() == Some(relay_id))
            .cloned())
    }

    fn latest_log_for_sensor(&self, sensor_id: &str) -> Result<Option<SensorLog>> {
        Ok(self
            .logs
            .iter()
            .filter(|l| l.sensor_id == sensor_id)
            .max_by_key(|l| l.created_at)
            .cloned())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
