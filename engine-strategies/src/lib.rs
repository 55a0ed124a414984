//! Strategy implementations for the event-driven engine.
//!
//! Each strategy here implements `engine_core::dispatch::Strategy`: a
//! bar-driven callable that owns its own indicator state and emits
//! `Signal`s, never touching portfolio or order state directly.
//!
//! - `moving_average_crossover`: SMA fast/slow crossover, grounded in
//!   `original_source/itrader/strategy/base.py`'s `cross_up`/`cross_down`
//!   helpers.
//! - `zscore_reversion`: rolling z-score pairs mean reversion, grounded in
//!   `original_source/itrader/strategy/mean_reversion/zscore_pairs_strategy.py`.

pub mod moving_average_crossover;
pub mod zscore_reversion;

pub use moving_average_crossover::MovingAverageCrossover;
pub use zscore_reversion::ZScorePairsReversion;
