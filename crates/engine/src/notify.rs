use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::relay::RelayState;

/// Fire-and-forget broadcast payload emitted after a recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetStateUpdate {
    pub relay_id: String,
    pub target_state: RelayState,
}

/// Downstream side-channel (message bus, push service, ...) modeled as an
/// injected port. A failing sink is a hard error for the caller to handle;
/// the engine itself never invokes this.
pub trait Notifier {
    fn notify(&self, update: &TargetStateUpdate) -> Result<()>;
}

/// Sink that just logs the update.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, update: &TargetStateUpdate) -> Result<()> {
        info!(
            relay = %update.relay_id,
            target_state = %update.target_state,
            "target state update"
        );
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
