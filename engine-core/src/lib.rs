//! Event-driven backtesting and live-trading engine core.
//!
//! A single global event queue carries typed events through the canonical
//! drain order `PING → BAR → SCREENER → SIGNAL → ORDER → FILL → UPDATE`:
//! a `PriceFeed` produces bars, registered strategies turn bars into
//! signals, `OrderHandler`/`OrderManager` turn signals into orders and
//! evaluate STOP/LIMIT triggers, `SimulatedExchange` turns orders into
//! fills, and `PortfolioHandler` turns fills into portfolio state and
//! update snapshots.
//!
//! ## Modules
//! - `core`: ids, errors, the event sum type, and the Order/Signal/Fill/
//!   Transaction/Bar records that flow through the pipeline.
//! - `models`: fee and slippage model polymorphism.
//! - `exchange`: the simulated exchange, its connection state machine and
//!   presets.
//! - `portfolio`: cash ledger, position accounting, transaction recording
//!   and the thread-safe Portfolio façade.
//! - `orders`: order storage, validation, trigger evaluation and the
//!   signal-to-order orchestration surface.
//! - `dispatch`: the event dispatcher, the strategy registry, and the
//!   PriceFeed/Notifier/Strategy extension traits.
//! - `config`: the runtime `EngineConfig`.
//! - `utils`: logging initialization.

pub mod config;
pub mod core;
pub mod dispatch;
pub mod exchange;
pub mod models;
pub mod orders;
pub mod portfolio;
pub mod utils;

pub use anyhow::{Error, Result};

/// Convenience re-exports for driver binaries and strategy crates.
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::core::{Bar, Event, Fill, IdGenerator, Order, OrderStatus, OrderType, Side, Signal, Transaction};
    pub use crate::dispatch::{EventDispatcher, LoggingNotifier, Notifier, PriceFeed, Strategy, StrategyHost};
    pub use crate::exchange::{ConnectionState, SimulatedExchange};
    pub use crate::orders::{InMemoryOrderStorage, MarketExecution, OrderHandler, OrderManager, OrderStorage, OrderValidator, ValidationConfig};
    pub use crate::portfolio::{CashManager, Portfolio, PortfolioHandler, PortfolioLimits, PortfolioState};
    pub use crate::{Error, Result};
}
