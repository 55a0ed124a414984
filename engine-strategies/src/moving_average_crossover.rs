//! SMA fast/slow crossover, long-only.
//!
//! Grounded in `original_source/itrader/strategy/base.py`'s static
//! `cross_up`/`cross_down` helpers: a cross up of the fast SMA over the
//! slow SMA opens (or adds to) a long; a cross down closes it. Stop-loss
//! and take-profit are attached as bracket percentages off the entry
//! price, the way the distilled scenarios (SPEC_FULL.md §8) attach them
//! to a MARKET entry signal.

use std::collections::VecDeque;

use rust_decimal::Decimal;
use tracing::debug;

use engine_core::core::event::BarEvent;
use engine_core::core::signal::Signal;
use engine_core::core::types::{OrderType, Side};
use engine_core::dispatch::Strategy;

pub struct MovingAverageCrossover {
    ticker: String,
    fast_period: usize,
    slow_period: usize,
    stop_loss_pct: Decimal,
    take_profit_pct: Decimal,
    order_quantity: Decimal,
    closes: VecDeque<Decimal>,
    prev_fast: Option<Decimal>,
    prev_slow: Option<Decimal>,
    in_position: bool,
}

impl MovingAverageCrossover {
    pub fn new(
        ticker: impl Into<String>,
        fast_period: usize,
        slow_period: usize,
        order_quantity: Decimal,
        stop_loss_pct: Decimal,
        take_profit_pct: Decimal,
    ) -> Self {
        assert!(fast_period > 0 && fast_period < slow_period, "fast_period must be positive and < slow_period");
        Self {
            ticker: ticker.into(),
            fast_period,
            slow_period,
            stop_loss_pct,
            take_profit_pct,
            order_quantity,
            closes: VecDeque::with_capacity(slow_period + 1),
            prev_fast: None,
            prev_slow: None,
            in_position: false,
        }
    }

    fn sma(&self, period: usize) -> Option<Decimal> {
        if self.closes.len() < period {
            return None;
        }
        let sum: Decimal = self.closes.iter().rev().take(period).sum();
        Some(sum / Decimal::from(period as u64))
    }
}

impl Strategy for MovingAverageCrossover {
    fn on_bar(&mut self, bar: &BarEvent) -> Vec<Signal> {
        let Some(bar) = bar.bars.get(&self.ticker) else {
            return Vec::new();
        };

        self.closes.push_back(bar.close);
        if self.closes.len() > self.slow_period {
            self.closes.pop_front();
        }

        let (Some(fast), Some(slow)) = (self.sma(self.fast_period), self.sma(self.slow_period)) else {
            return Vec::new();
        };

        let mut signals = Vec::new();
        if let (Some(prev_fast), Some(prev_slow)) = (self.prev_fast, self.prev_slow) {
            let crossed_up = fast > slow && prev_fast <= prev_slow;
            let crossed_down = fast < slow && prev_fast >= prev_slow;

            if crossed_up && !self.in_position {
                let entry = bar.close;
                let stop_loss = entry * (Decimal::ONE - self.stop_loss_pct);
                let take_profit = entry * (Decimal::ONE + self.take_profit_pct);
                debug!(ticker = %self.ticker, %entry, %stop_loss, %take_profit, "fast SMA crossed above slow, opening long");
                signals.push(
                    Signal::new(bar.time, OrderType::Market, self.ticker.clone(), Side::Buy, entry, self.order_quantity, 0, 0)
                        .with_stop_loss(stop_loss)
                        .with_take_profit(take_profit),
                );
                self.in_position = true;
            } else if crossed_down && self.in_position {
                debug!(ticker = %self.ticker, exit = %bar.close, "fast SMA crossed below slow, closing long");
                signals.push(Signal::new(bar.time, OrderType::Market, self.ticker.clone(), Side::Sell, bar.close, self.order_quantity, 0, 0));
                self.in_position = false;
            }
        }

        self.prev_fast = Some(fast);
        self.prev_slow = Some(slow);
        signals
    }

    fn name(&self) -> &str {
        "moving_average_crossover"
    }
}
