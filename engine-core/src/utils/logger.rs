//! Wires `tracing-subscriber` up from the `log_level`/`json_logs` fields of
//! `EngineConfig` (SPEC_FULL.md's config section) rather than from loose
//! string/bool arguments, so the backtest and live drivers can't drift on
//! how they read their own configuration.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::EngineConfig;

/// Initialize the global `tracing` subscriber from an `EngineConfig`.
/// `RUST_LOG` overrides `config.log_level` when set, matching the rest of
/// the workspace's env-first convention.
pub fn init_logger(config: &EngineConfig) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.json_logs {
        tracing_subscriber::registry().with(env_filter).with(fmt::layer().json()).init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .init();
    }
}
