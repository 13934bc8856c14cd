use anyhow::{Context, Result};
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// Source of "now" in the deployment's local timezone. Injected so every
/// resolution is reproducible in tests.
pub trait Clock: Send + Sync {
    fn now_local(&self) -> OffsetDateTime;
}

/// Wall clock shifted to a fixed UTC offset. The deployment runs in one
/// named zone; its offset is configuration.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self::new(UtcOffset::UTC)
    }
}

impl Clock for SystemClock {
    fn now_local(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

/// Parse a `±HH:MM` offset string, e.g. `"+03:00"`.
pub fn parse_utc_offset(value: &str) -> Result<UtcOffset> {
    UtcOffset::parse(
        value,
        format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
    )
    .with_context(|| format!("invalid utc offset '{value}' (expected ±HH:MM)"))
}

/// Always returns the same instant. Test and replay use.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now_local(&self) -> OffsetDateTime {
        self.0
    }
}

// ===========================================================================
// Tests
// ===========================================================================
