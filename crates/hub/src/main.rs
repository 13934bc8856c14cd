mod config;
mod poll;

use anyhow::Result;
use std::env;
use tracing_subscriber::EnvFilter;

use relay_engine::clock::parse_utc_offset;
use relay_engine::{LogNotifier, MemoryStore, SystemClock};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Config ──────────────────────────────────────────────────────
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let cfg = config::load(&config_path)?;

    let mut store = MemoryStore::new();
    config::apply(&cfg, &mut store);
    if cfg.relays.is_empty() {
        tracing::warn!("no relays configured — the sweep will have nothing to do");
    }

    // ── Clock (fixed deployment offset) ─────────────────────────────
    let clock = SystemClock::new(parse_utc_offset(&cfg.utc_offset)?);

    // ── Evaluation sweep ────────────────────────────────────────────
    poll::run(store, clock, LogNotifier, cfg.tick_sec).await;

    Ok(())
}
