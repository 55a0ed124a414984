//! `PriceFeed`: the bar source consumed by the backtest/live driver.

use crate::core::event::BarEvent;

/// A restartable source of bars; timestamps must be monotonically
/// non-decreasing (SPEC_FULL.md §6).
pub trait PriceFeed: Iterator<Item = BarEvent> {
    fn reset(&mut self);
}
