//! Relay target-state engine for a home-automation hub.
//!
//! Computes what state a relay (pump, servo, generic valve) should be in
//! right now from an immutable snapshot: the relay's type, manual
//! override, schedule, last persisted state, and — for servos — the
//! linked sensor's adjusted temperature. Pure and synchronous; the
//! caller brings the storage gateway ([`store::RelayStore`]), the clock
//! ([`clock::Clock`]), and whatever sits downstream of a computed update
//! ([`notify::Notifier`]).

pub mod clock;
pub mod notify;
pub mod relay;
pub mod resolver;
pub mod schedule;
pub mod sensor;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use notify::{LogNotifier, Notifier, TargetStateUpdate};
pub use relay::{Relay, RelayRecord, RelayState, RelayType};
pub use resolver::{compute_target_state, resolve_target_state};
pub use schedule::{find_current_period, lookup_grid_state, Period, Schedule};
pub use sensor::{SensorLog, SensorRecord, SensorSnapshot, DEFAULT_HYSTERESIS};
pub use store::{MemoryStore, RelayStore};
