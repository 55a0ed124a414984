//! The typed `Event` sum type carried on the global queue.
//!
//! Replaces the "dynamic dict as DTO" pattern of the original implementation
//! (`original_source/itrader/instances/event.py`'s `EventType` enum plus one
//! class per type) with a single tagged sum type, per SPEC_FULL.md §9.

use std::collections::HashMap;

use super::fill::Fill;
use super::order::Order;
use super::signal::Signal;
use super::types::Bar;

/// A keepalive/heartbeat event; first in the canonical drain order.
#[derive(Debug, Clone, Copy)]
pub struct PingEvent {
    pub time: i64,
}

/// A batch of bars for one timestamp, keyed by ticker.
#[derive(Debug, Clone)]
pub struct BarEvent {
    pub time: i64,
    pub bars: HashMap<String, Bar>,
}

impl BarEvent {
    pub fn new(time: i64) -> Self {
        Self {
            time,
            bars: HashMap::new(),
        }
    }

    pub fn insert(mut self, bar: Bar) -> Self {
        self.bars.insert(bar.ticker.clone(), bar);
        self
    }
}

/// Notifies the universe/screener layer of tradable-ticker changes.
/// Screener logic itself is a strategy concern (out of scope); this event
/// only carries the resulting ticker set through the canonical drain order.
#[derive(Debug, Clone)]
pub struct ScreenerEvent {
    pub time: i64,
    pub tickers: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SignalEvent(pub Signal);

#[derive(Debug, Clone)]
pub struct OrderEvent(pub Order);

#[derive(Debug, Clone)]
pub struct FillEvent(pub Fill);

/// Per-portfolio snapshot emitted after fills are applied.
#[derive(Debug, Clone)]
pub struct PortfolioUpdateEvent {
    pub portfolio_id: u64,
    pub time: i64,
    pub available_cash: rust_decimal::Decimal,
    pub total_equity: rust_decimal::Decimal,
    pub open_positions: usize,
}

/// The sum type carried on the global dispatch queue. Variant order here
/// matches the canonical drain order of SPEC_FULL.md §4.13:
/// `PING → BAR → SCREENER → SIGNAL → ORDER → FILL → UPDATE`.
#[derive(Debug, Clone)]
pub enum Event {
    Ping(PingEvent),
    Bar(BarEvent),
    Screener(ScreenerEvent),
    Signal(SignalEvent),
    Order(OrderEvent),
    Fill(FillEvent),
    Update(PortfolioUpdateEvent),
}

impl Event {
    /// Rank in the canonical drain order; lower sorts first.
    pub fn priority(&self) -> u8 {
        match self {
            Event::Ping(_) => 0,
            Event::Bar(_) => 1,
            Event::Screener(_) => 2,
            Event::Signal(_) => 3,
            Event::Order(_) => 4,
            Event::Fill(_) => 5,
            Event::Update(_) => 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_matches_canonical_order() {
        assert!(Event::Ping(PingEvent { time: 0 }).priority() < Event::Bar(BarEvent::new(0)).priority());
        assert!(
            Event::Bar(BarEvent::new(0)).priority()
                < Event::Screener(ScreenerEvent {
                    time: 0,
                    tickers: vec![]
                })
                .priority()
        );
    }
}
