//! `StrategyHost`: registry of strategies invoked on every bar.
//!
//! Grounded in `original_source/itrader/strategy/{base.py,strategies_handler.py}`'s
//! registry-of-strategies pattern: each registered strategy is paired with
//! the `(strategyId, portfolioId)` it was registered under, and every
//! produced signal is stamped with that pair regardless of what the
//! strategy itself set.

use std::panic::{catch_unwind, AssertUnwindSafe};

use parking_lot::Mutex;
use tracing::error;

use crate::core::event::BarEvent;
use crate::core::signal::Signal;

use super::strategy::Strategy;

struct Registration {
    strategy_id: u64,
    portfolio_id: u64,
    strategy: Box<dyn Strategy>,
}

#[derive(Default)]
pub struct StrategyHost {
    registrations: Mutex<Vec<Registration>>,
}

impl StrategyHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, strategy_id: u64, portfolio_id: u64, strategy: Box<dyn Strategy>) {
        self.registrations.lock().push(Registration {
            strategy_id,
            portfolio_id,
            strategy,
        });
    }

    /// Invokes every registered strategy's `on_bar`, catching and logging a
    /// panic from an individual strategy rather than aborting the sweep
    /// (same discipline `OrderManager` uses per-order, generalized per
    /// SPEC_FULL.md §4.14).
    pub fn on_bar(&self, bar: &BarEvent) -> Vec<Signal> {
        let mut out = Vec::new();
        let mut registrations = self.registrations.lock();
        for reg in registrations.iter_mut() {
            let strategy = &mut reg.strategy;
            let result = catch_unwind(AssertUnwindSafe(|| strategy.on_bar(bar)));
            match result {
                Ok(mut signals) => {
                    for signal in &mut signals {
                        signal.strategy_id = reg.strategy_id;
                        signal.portfolio_id = reg.portfolio_id;
                    }
                    out.extend(signals);
                }
                Err(_) => {
                    error!(strategy_id = reg.strategy_id, "strategy panicked during on_bar, skipping");
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Bar, OrderType, Side};
    use rust_decimal_macros::dec;

    struct AlwaysBuys;

    impl Strategy for AlwaysBuys {
        fn on_bar(&mut self, bar: &BarEvent) -> Vec<Signal> {
            bar.bars
                .values()
                .map(|b| Signal::new(b.time, OrderType::Market, b.ticker.clone(), Side::Buy, b.close, dec!(1), 0, 0))
                .collect()
        }

        fn name(&self) -> &str {
            "always_buys"
        }
    }

    struct Panics;

    impl Strategy for Panics {
        fn on_bar(&mut self, _bar: &BarEvent) -> Vec<Signal> {
            panic!("boom");
        }

        fn name(&self) -> &str {
            "panics"
        }
    }

    #[test]
    fn signals_are_stamped_with_registration_identity() {
        let host = StrategyHost::new();
        host.register(7, 42, Box::new(AlwaysBuys));
        let bar_event = BarEvent::new(0).insert(Bar::new("BTCUSDT", 0, dec!(100), dec!(100), dec!(100), dec!(100), dec!(1)));
        let signals = host.on_bar(&bar_event);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].strategy_id, 7);
        assert_eq!(signals[0].portfolio_id, 42);
    }

    #[test]
    fn a_panicking_strategy_does_not_block_the_others() {
        let host = StrategyHost::new();
        host.register(1, 1, Box::new(Panics));
        host.register(2, 1, Box::new(AlwaysBuys));
        let bar_event = BarEvent::new(0).insert(Bar::new("BTCUSDT", 0, dec!(100), dec!(100), dec!(100), dec!(100), dec!(1)));
        let signals = host.on_bar(&bar_event);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].strategy_id, 2);
    }
}
