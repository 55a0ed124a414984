//! Event dispatch: the global queue drain loop, the strategy registry, and
//! the PriceFeed/Notifier/Strategy extension traits (SPEC_FULL.md §4.13-§4.14, §6).

pub mod dispatcher;
pub mod notifier;
pub mod price_feed;
pub mod strategy;
pub mod strategy_host;

pub use dispatcher::EventDispatcher;
pub use notifier::{FallibleNotifier, LoggingNotifier, Notifier};
pub use price_feed::PriceFeed;
pub use strategy::Strategy;
pub use strategy_host::StrategyHost;
