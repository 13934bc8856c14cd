//! Periodic evaluation sweep: re-resolves every active relay's target
//! state on a fixed tick and pushes changes through the notification
//! port.
//!
//! The sweep is deliberately thin — all decision logic lives in
//! `relay_engine::resolver`. A relay that fails to resolve (gateway
//! error) is logged and skipped; the sweep never aborts. Updates are
//! broadcast only when the computed state differs from the last one
//! sent for that relay, so a stable system stays quiet.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, error, info};

use relay_engine::resolver::resolve_target_state;
use relay_engine::{Clock, Notifier, RelayState, RelayStore, TargetStateUpdate};

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Run the sweep loop. Intended to be awaited from main; never returns.
pub async fn run(
    store: impl RelayStore,
    clock: impl Clock,
    notifier: impl Notifier,
    tick_sec: u64,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(tick_sec));
    let mut last_sent: HashMap<String, RelayState> = HashMap::new();

    info!(tick_sec, "poll loop started");

    loop {
        ticker.tick().await;
        evaluate_all(&store, &clock, &notifier, &mut last_sent);
    }
}

// ---------------------------------------------------------------------------
// One sweep
// ---------------------------------------------------------------------------

/// Resolve every active relay once; notify the ones whose target state
/// changed since the previous sweep.
fn evaluate_all(
    store: &dyn RelayStore,
    clock: &dyn Clock,
    notifier: &dyn Notifier,
    last_sent: &mut HashMap<String, RelayState>,
) {
    let relays = match store.active_relays() {
        Ok(relays) => relays,
        Err(e) => {
            error!("poll: active_relays failed: {e:#}");
            return;
        }
    };

    for record in &relays {
        let target = match resolve_target_state(store, record, clock) {
            Ok(target) => target,
            Err(e) => {
                error!(relay = %record.relay_id, "poll: resolution failed: {e:#}");
                continue;
            }
        };

        debug!(relay = %record.relay_id, %target, "evaluated");

        if last_sent.get(&record.relay_id) == Some(&target) {
            continue;
        }

        let update = TargetStateUpdate {
            relay_id: record.relay_id.clone(),
            target_state: target,
        };
        if let Err(e) = notifier.notify(&update) {
            // Leave last_sent untouched so the next tick retries.
            error!(relay = %record.relay_id, "poll: notify failed: {e:#}");
            continue;
        }
        last_sent.insert(record.relay_id.clone(), target);
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, bail, Result};
    use relay_engine::{
        FixedClock, MemoryStore, RelayRecord, RelayType, SensorLog, SensorRecord,
    };
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use time::macros::datetime;

    /// Notifier that records every update it accepts.
    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<TargetStateUpdate>>,
        fail: bool,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, update: &TargetStateUpdate) -> Result<()> {
            if self.fail {
                bail!("bus unavailable");
            }
            self.sent.lock().unwrap().push(update.clone());
            Ok(())
        }
    }

    impl RecordingNotifier {
        fn sent(&self) -> Vec<TargetStateUpdate> {
            self.sent.lock().unwrap().clone()
        }
    }

    /// Store whose sensor-linkage lookup fails for one relay.
    struct FlakyStore {
        inner: MemoryStore,
        failing_relay: String,
    }

    impl RelayStore for FlakyStore {
        fn relay(&self, relay_id: &str) -> Result<Option<RelayRecord>> {
            self.inner.relay(relay_id)
        }

        fn active_relays(&self) -> Result<Vec<RelayRecord>> {
            self.inner.active_relays()
        }

        fn latest_sensor_for_relay(&self, relay_id: &str) -> Result<Option<SensorRecord>> {
            if relay_id == self.failing_relay {
                return Err(anyhow!("storage unreachable"));
            }
            self.inner.latest_sensor_for_relay(relay_id)
        }

        fn latest_log_for_sensor(&self, sensor_id: &str) -> Result<Option<SensorLog>> {
            self.inner.latest_log_for_sensor(sensor_id)
        }
    }

    fn pump(relay_id: &str, context: Value) -> RelayRecord {
        RelayRecord {
            relay_id: relay_id.into(),
            name: relay_id.into(),
            relay_type: RelayType::Pump,
            is_active: true,
            force_state: None,
            context,
        }
    }

    fn servo(relay_id: &str) -> RelayRecord {
        RelayRecord {
            relay_id: relay_id.into(),
            name: relay_id.into(),
            relay_type: RelayType::Servo,
            is_active: true,
            force_state: None,
            context: Value::Null,
        }
    }

    const NOW: FixedClock = FixedClock(datetime!(2025-01-06 10:30 +3));

    // -- Change detection ---------------------------------------------------

    #[test]
    fn first_sweep_notifies_every_relay() {
        let mut store = MemoryStore::new();
        store.add_relay(pump("p1", json!({"schedule": {"periods": [
            {"start_time": "08:00", "end_time": "18:00", "target_state": "ON"},
        ]}})));
        store.add_relay(servo("s-relay"));

        let notifier = RecordingNotifier::default();
        let mut last_sent = HashMap::new();
        evaluate_all(&store, &NOW, &notifier, &mut last_sent);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].target_state, RelayState::On);
        // Servo without a linked sensor broadcasts UNKNOWN — a legitimate,
        // displayable result.
        assert_eq!(sent[1].target_state, RelayState::Unknown);
    }

    #[test]
    fn unchanged_state_not_renotified() {
        let mut store = MemoryStore::new();
        store.add_relay(pump("p1", json!({"schedule": {"periods": [
            {"start_time": "08:00", "end_time": "18:00", "target_state": "ON"},
        ]}})));

        let notifier = RecordingNotifier::default();
        let mut last_sent = HashMap::new();
        evaluate_all(&store, &NOW, &notifier, &mut last_sent);
        evaluate_all(&store, &NOW, &notifier, &mut last_sent);

        assert_eq!(notifier.sent().len(), 1);
    }

    #[test]
    fn state_change_renotifies() {
        let mut store = MemoryStore::new();
        store.add_relay(pump("p1", json!({"schedule": {"periods": [
            {"start_time": "08:00", "end_time": "18:00", "target_state": "ON"},
        ]}})));

        let notifier = RecordingNotifier::default();
        let mut last_sent = HashMap::new();
        evaluate_all(&store, &NOW, &notifier, &mut last_sent);

        // Same store, later clock: period no longer matches.
        let evening = FixedClock(datetime!(2025-01-06 20:30 +3));
        evaluate_all(&store, &evening, &notifier, &mut last_sent);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].target_state, RelayState::Unknown);
    }

    #[test]
    fn inactive_relays_skipped() {
        let mut store = MemoryStore::new();
        let mut record = pump("p1", Value::Null);
        record.is_active = false;
        store.add_relay(record);

        let notifier = RecordingNotifier::default();
        let mut last_sent = HashMap::new();
        evaluate_all(&store, &NOW, &notifier, &mut last_sent);

        assert!(notifier.sent().is_empty());
    }

    // -- Failure behavior ---------------------------------------------------

    #[test]
    fn failing_relay_does_not_stop_sweep() {
        let mut inner = MemoryStore::new();
        inner.add_relay(servo("bad"));
        inner.add_relay(pump("good", json!({"schedule": {"periods": [
            {"start_time": "08:00", "end_time": "18:00", "target_state": "ON"},
        ]}})));
        let store = FlakyStore {
            inner,
            failing_relay: "bad".into(),
        };

        let notifier = RecordingNotifier::default();
        let mut last_sent = HashMap::new();
        evaluate_all(&store, &NOW, &notifier, &mut last_sent);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].relay_id, "good");
    }

    #[test]
    fn failed_notify_retries_next_sweep() {
        let mut store = MemoryStore::new();
        store.add_relay(pump("p1", json!({"schedule": {"periods": [
            {"start_time": "08:00", "end_time": "18:00", "target_state": "ON"},
        ]}})));

        let failing = RecordingNotifier {
            fail: true,
            ..Default::default()
        };
        let mut last_sent = HashMap::new();
        evaluate_all(&store, &NOW, &failing, &mut last_sent);
        assert!(last_sent.is_empty());

        // Bus recovers: the update goes out on the next sweep.
        let notifier = RecordingNotifier::default();
        evaluate_all(&store, &NOW, &notifier, &mut last_sent);
        assert_eq!(notifier.sent().len(), 1);
    }
}
