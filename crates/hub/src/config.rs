//! TOML config loading, validation, and store seeding for relays,
//! sensors, and seed readings.
//!
//! Relay and sensor `context` tables are transcoded into open JSON
//! values, so the engine sees exactly the shape an API layer would have
//! persisted.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;

use relay_engine::clock::parse_utc_offset;
use relay_engine::{MemoryStore, RelayRecord, SensorLog, SensorRecord};

// ---------------------------------------------------------------------------
// Config file structure
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Fixed offset of the deployment's timezone, e.g. "+03:00".
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
    /// Seconds between evaluation sweeps.
    #[serde(default = "default_tick_sec")]
    pub tick_sec: u64,
    #[serde(default)]
    pub relays: Vec<RelayRecord>,
    #[serde(default)]
    pub sensors: Vec<SensorRecord>,
    #[serde(default)]
    pub readings: Vec<SensorLog>,
}

fn default_utc_offset() -> String {
    "+00:00".to_string()
}

fn default_tick_sec() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl Config {
    /// Validate all config entries. Returns `Ok(())` or an error describing
    /// every violation found (not just the first one).
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if parse_utc_offset(&self.utc_offset).is_err() {
            errors.push(format!(
                "utc_offset '{}' is not a ±HH:MM offset",
                self.utc_offset
            ));
        }
        if self.tick_sec == 0 {
            errors.push("tick_sec must be positive".to_string());
        }

        self.validate_relays(&mut errors);
        self.validate_sensors(&mut errors);
        self.validate_readings(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            bail!(
                "config validation failed ({} error{}):\n  - {}",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" },
                errors.join("\n  - ")
            );
        }
    }

    fn validate_relays(&self, errors: &mut Vec<String>) {
        let mut seen_ids: HashSet<&str> = HashSet::new();

        for (i, r) in self.relays.iter().enumerate() {
            let ctx = || {
                if r.relay_id.is_empty() {
                    format!("relays[{i}]")
                } else {
                    format!("relay '{}'", r.relay_id)
                }
            };

            if r.relay_id.trim().is_empty() {
                errors.push(format!("{}: relay_id is empty", ctx()));
            } else if !seen_ids.insert(&r.relay_id) {
                errors.push(format!("{}: duplicate relay_id", ctx()));
            }

            if r.name.trim().is_empty() {
                errors.push(format!("{}: name is empty", ctx()));
            }
        }
    }

    fn validate_sensors(&self, errors: &mut Vec<String>) {
        let mut seen_ids: HashSet<&str> = HashSet::new();

        for (i, s) in self.sensors.iter().enumerate() {
            let ctx = || {
                if s.sensor_id.is_empty() {
                    format!("sensors[{i}]")
                } else {
                    format!("sensor '{}'", s.sensor_id)
                }
            };

            if s.sensor_id.trim().is_empty() {
                errors.push(format!("{}: sensor_id is empty", ctx()));
            } else if !seen_ids.insert(&s.sensor_id) {
                errors.push(format!("{}: duplicate sensor_id", ctx()));
            }

            // A relay_id pointing at no configured relay is deliberately
            // NOT an error: an absent linkage is a legal state.
        }
    }

    fn validate_readings(&self, errors: &mut Vec<String>) {
        let sensor_ids: HashSet<&str> =
            self.sensors.iter().map(|s| s.sensor_id.as_str()).collect();

        for (i, reading) in self.readings.iter().enumerate() {
            if !sensor_ids.contains(reading.sensor_id.as_str()) {
                errors.push(format!(
                    "readings[{i}]: sensor_id '{}' does not match any defined sensor",
                    reading.sensor_id
                ));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Load + apply
// ---------------------------------------------------------------------------

/// Read, parse, and validate a TOML config file.
pub fn load(path: &str) -> Result<Config> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("failed to read config: {path}"))?;
    let config: Config =
        toml::from_str(&contents).with_context(|| format!("failed to parse config: {path}"))?;
    config
        .validate()
        .with_context(|| format!("invalid config: {path}"))?;
    Ok(config)
}

/// Seed the in-memory store from the config.
pub fn apply(config: &Config, store: &mut MemoryStore) {
    for relay in &config.relays {
        store.add_relay(relay.clone());
    }
    for sensor in &config.sensors {
        store.add_sensor(sensor.clone());
    }
    for reading in &config.readings {
        store.add_log(reading.clone());
    }

    tracing::info!(
        relays = config.relays.len(),
        sensors = config.sensors.len(),
        readings = config.readings.len(),
        "config applied"
    );
}

// ===========================================================================
// Tests
// ===========================================================================
