//! Schedule model: the open `context.schedule` JSON is interpreted exactly
//! once into a closed tagged union, then matched against the current local
//! time.
//!
//! Two stored shapes exist side by side:
//!
//! - the current **period list** (`schedule.periods`), time-of-day windows
//!   applying to every day, each carrying either a `target_state` (pumps)
//!   or a `target_temp` (servos);
//! - the **legacy grid**, a day-of-week ("0".."6", 0 = Sunday) to hour
//!   ("00".."23") to on/off mapping.
//!
//! Malformed pieces never raise: unparseable times skip the period,
//! non-boolean grid cells are dropped at load, and anything unrecognisable
//! degrades to `Schedule::Absent`.

use std::collections::HashMap;

use serde_json::Value;
use time::macros::format_description;
use time::{OffsetDateTime, Time};

use crate::relay::RelayState;

/// Legacy day/hour grid: day-of-week string -> hour string -> on/off.
pub type DayGrid = HashMap<String, HashMap<String, bool>>;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One time-of-day window. Start/end are kept as the stored `HH:MM`
/// strings; the matcher parses them per evaluation and skips the period
/// silently when they are malformed.
#[derive(Debug, Clone, PartialEq)]
pub struct Period {
    pub start_time: String,
    pub end_time: String,
    pub target_state: Option<RelayState>,
    pub target_temp: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Schedule {
    /// Ordered period list; first match wins.
    Periods(Vec<Period>),
    /// Legacy day/hour grid, consulted only for the current day + hour.
    LegacyGrid(DayGrid),
    #[default]
    Absent,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Schedule {
    /// Decide the schedule variant from a relay `context` value. Total:
    /// any malformed input maps to a lawful variant.
    ///
    /// A `periods` key — of any JSON type — selects the period-list
    /// schema; any other object is read as the legacy grid.
    pub fn from_context(context: &Value) -> Self {
        let Some(schedule) = context.get("schedule").and_then(Value::as_object) else {
            return Schedule::Absent;
        };

        if let Some(periods) = schedule.get("periods") {
            let periods = periods
                .as_array()
                .map(|list| list.iter().filter_map(period_from_value).collect())
                .unwrap_or_default();
            return Schedule::Periods(periods);
        }

        let mut grid = DayGrid::new();
        for (day, hours) in schedule {
            let Some(hours) = hours.as_object() else {
                continue;
            };
            let cells = hours
                .iter()
                .filter_map(|(hour, on)| on.as_bool().map(|b| (hour.clone(), b)))
                .collect();
            grid.insert(day.clone(), cells);
        }
        Schedule::LegacyGrid(grid)
    }
}

fn period_from_value(value: &Value) -> Option<Period> {
    let period = value.as_object()?;
    let text = |key: &str| {
        period
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    Some(Period {
        start_time: text("start_time"),
        end_time: text("end_time"),
        target_state: period
            .get("target_state")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok()),
        target_temp: period.get("target_temp").and_then(lenient_f64),
    })
}

/// Context payloads store decimals both as JSON numbers and as numeric
/// strings ("21.5"); accept either.
pub(crate) fn lenient_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Return the first period containing `now`, or `None`.
///
/// Containment is inclusive at both ends. A period whose start is later
/// than its end crosses midnight and matches the late evening as well as
/// the early morning. Periods with unparseable times are skipped.
pub fn find_current_period<'a>(periods: &'a [Period], now: Time) -> Option<&'a Period> {
    for period in periods {
        let (Some(start), Some(end)) = (
            parse_hhmm(&period.start_time),
            parse_hhmm(&period.end_time),
        ) else {
            continue;
        };

        let contains = if start <= end {
            start <= now && now <= end
        } else {
            now >= start || now <= end
        };
        if contains {
            return Some(period);
        }
    }
    None
}

/// Look up the legacy grid for the current day + hour. Anything other
/// than a boolean hit is `Unknown`.
pub fn lookup_grid_state(grid: &DayGrid, now: OffsetDateTime) -> RelayState {
    let day = now.weekday().number_days_from_sunday().to_string();
    let hour = format!("{:02}", now.hour());

    match grid.get(&day).and_then(|hours| hours.get(&hour)).copied() {
        Some(true) => RelayState::On,
        Some(false) => RelayState::Off,
        None => RelayState::Unknown,
    }
}

fn parse_hhmm(value: &str) -> Option<Time> {
    Time::parse(value, format_description!("[hour]:[minute]")).ok()
}

// ===========================================================================
// Tests
// ===========================================================================
