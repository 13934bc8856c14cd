//! Target-state resolution: given a relay snapshot (and, for servos, the
//! linked sensor's adjusted reading), decide what state the relay should
//! be in right now.
//!
//! The whole module is a pure function of snapshot + clock value. Every
//! branch degrades — to `Unknown` or to the relay's last persisted state —
//! rather than erroring; the only hard failures are gateway fetches in
//! [`resolve_target_state`], which propagate untouched.
//!
//! Decision order:
//!
//! 1. `force_state`, when set, wins over everything.
//! 2. Pumps follow their schedule: period list first-match, else the
//!    legacy day/hour grid, else `Unknown`.
//! 3. Servos compare the sensor's adjusted temperature against the
//!    effective setpoint inside a hysteresis band (a bang-bang controller:
//!    on below the band, off above it, hold inside it).
//! 4. Anything else resolves to `Unknown`.

use anyhow::Result;
use time::OffsetDateTime;
use tracing::debug;

use crate::clock::Clock;
use crate::relay::{Relay, RelayRecord, RelayState, RelayType};
use crate::schedule::{find_current_period, lookup_grid_state, Schedule};
use crate::sensor::SensorSnapshot;
use crate::store::RelayStore;

// ---------------------------------------------------------------------------
// Pure entry point
// ---------------------------------------------------------------------------

/// Compute the state `relay` should be in at `now`. `sensor` is only
/// consulted for servo relays and may be `None` otherwise.
pub fn compute_target_state(
    relay: &Relay,
    sensor: Option<&SensorSnapshot>,
    now: OffsetDateTime,
) -> RelayState {
    if let Some(forced) = relay.force_state {
        return forced;
    }

    match relay.relay_type {
        RelayType::Pump => pump_target_state(relay, now),
        RelayType::Servo => servo_target_state(relay, sensor, now),
        RelayType::Valve => RelayState::Unknown,
    }
}

// ---------------------------------------------------------------------------
// Per-type resolution
// ---------------------------------------------------------------------------

fn pump_target_state(relay: &Relay, now: OffsetDateTime) -> RelayState {
    match &relay.schedule {
        Schedule::Periods(periods) => match find_current_period(periods, now.time()) {
            // A matching period without a target_state (a servo-style
            // period in a pump schedule) falls through like a miss.
            Some(period) => period.target_state.unwrap_or(relay.state),
            None => relay.state,
        },
        Schedule::LegacyGrid(grid) => lookup_grid_state(grid, now),
        Schedule::Absent => RelayState::Unknown,
    }
}

fn servo_target_state(
    relay: &Relay,
    sensor: Option<&SensorSnapshot>,
    now: OffsetDateTime,
) -> RelayState {
    let Some(sensor) = sensor else {
        return RelayState::Unknown;
    };
    let Some(temp) = sensor.temp else {
        return RelayState::Unknown;
    };

    // A matching period's target_temp overrides the sensor's own setpoint
    // for this evaluation only.
    let mut target_temp = sensor.target_temp;
    if let Schedule::Periods(periods) = &relay.schedule {
        if let Some(period) = find_current_period(periods, now.time()) {
            if let Some(t) = period.target_temp {
                target_temp = Some(t);
            }
        }
    }
    let Some(target_temp) = target_temp else {
        // No setpoint configured anywhere: keep whatever we last did.
        return relay.state;
    };

    let hysteresis = sensor.temp_hysteresis;
    if temp < target_temp - hysteresis {
        RelayState::On
    } else if temp > target_temp + hysteresis {
        RelayState::Off
    } else {
        // Inside the band: hold the current state to avoid chattering.
        relay.state
    }
}

// ---------------------------------------------------------------------------
// Store-aware driver
// ---------------------------------------------------------------------------

/// Resolve a relay's target state against a gateway and a clock.
///
/// The sensor linkage is fetched exactly once per call and reused for
/// every sub-step; store errors propagate to the caller.
pub fn resolve_target_state(
    store: &dyn RelayStore,
    record: &RelayRecord,
    clock: &dyn Clock,
) -> Result<RelayState> {
    let relay = record.snapshot();

    let sensor = if relay.relay_type == RelayType::Servo {
        match store.latest_sensor_for_relay(&relay.relay_id)? {
            Some(sensor) => {
                let log = store.latest_log_for_sensor(&sensor.sensor_id)?;
                Some(sensor.snapshot(log.as_ref()))
            }
            None => None,
        }
    } else {
        None
    };

    let target = compute_target_state(&relay, sensor.as_ref(), clock.now_local());
    debug!(relay = %relay.relay_id, %target, "resolved target state");
    Ok(target)
}

// ===========================================================================
// Tests
// ===========================================================================
