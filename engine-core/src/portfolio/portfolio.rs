//! `Portfolio`: thread-safe façade composing cash, positions and limits.
//!
//! Grounded in `original_source/itrader/portfolio_handler/portfolio.py` for the
//! ACTIVE/INACTIVE/ARCHIVED state machine and the boundary checks that run
//! before a fill is allowed to mutate state.

use std::collections::HashMap;

use parking_lot::ReentrantMutex;
use rust_decimal::Decimal;
use std::cell::RefCell;
use tracing::warn;

use crate::core::errors::{CashError, PortfolioStateError};
use crate::core::fill::Fill;
use crate::core::ids::IdGenerator;

use super::cash::CashManager;
use super::ledger::TransactionManager;
use super::position::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortfolioState {
    Active,
    Inactive,
    Archived,
}

impl PortfolioState {
    /// `ACTIVE ↔ INACTIVE`, either may move to the terminal `ARCHIVED`.
    fn can_transition_to(self, to: PortfolioState) -> bool {
        use PortfolioState::*;
        matches!(
            (self, to),
            (Active, Inactive) | (Inactive, Active) | (Active, Archived) | (Inactive, Archived)
        )
    }
}

#[derive(Debug, Clone)]
pub struct PortfolioLimits {
    pub max_positions: usize,
    pub max_position_value: Decimal,
    pub max_concentration_pct: f64,
}

impl Default for PortfolioLimits {
    fn default() -> Self {
        Self {
            max_positions: 50,
            max_position_value: Decimal::from(1_000_000),
            max_concentration_pct: 0.25,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HealthMetrics {
    pub peak_equity: Decimal,
    pub daily_loss_pct: f64,
    pub drawdown_pct: f64,
}

pub struct Portfolio {
    pub portfolio_id: u64,
    pub exchange: String,
    state: ReentrantMutex<RefCell<PortfolioState>>,
    cash: CashManager,
    positions: ReentrantMutex<RefCell<HashMap<String, Position>>>,
    limits: PortfolioLimits,
    health: ReentrantMutex<RefCell<HealthMetrics>>,
}

impl Portfolio {
    pub fn new(portfolio_id: u64, exchange: impl Into<String>, initial_cash: Decimal, limits: PortfolioLimits) -> Self {
        Self {
            portfolio_id,
            exchange: exchange.into(),
            state: ReentrantMutex::new(RefCell::new(PortfolioState::Active)),
            cash: CashManager::new(portfolio_id, initial_cash, Decimal::from(10_000_000)),
            positions: ReentrantMutex::new(RefCell::new(HashMap::new())),
            limits,
            health: ReentrantMutex::new(RefCell::new(HealthMetrics::default())),
        }
    }

    pub fn state(&self) -> PortfolioState {
        *self.state.lock().borrow()
    }

    pub fn cash(&self) -> &CashManager {
        &self.cash
    }

    pub fn transition_to(&self, to: PortfolioState) -> Result<(), PortfolioStateError> {
        let guard = self.state.lock();
        let mut current = guard.borrow_mut();
        if !current.can_transition_to(to) {
            return Err(PortfolioStateError {
                portfolio_id: self.portfolio_id,
                current_state: format!("{:?}", *current),
                operation: format!("transition_to({:?})", to),
            });
        }
        *current = to;
        Ok(())
    }

    pub fn position(&self, ticker: &str) -> Option<Position> {
        self.positions.lock().borrow().get(ticker).cloned()
    }

    pub fn open_position_count(&self) -> usize {
        self.positions.lock().borrow().len()
    }

    pub fn total_market_value(&self, prices: &HashMap<String, Decimal>) -> Decimal {
        self.positions
            .lock()
            .borrow()
            .values()
            .map(|p| prices.get(&p.ticker).map(|price| p.market_value(*price)).unwrap_or(Decimal::ZERO))
            .sum()
    }

    pub fn total_unrealised_pnl(&self, prices: &HashMap<String, Decimal>) -> Decimal {
        self.positions
            .lock()
            .borrow()
            .values()
            .map(|p| prices.get(&p.ticker).map(|price| p.unrealised_pnl(*price)).unwrap_or(Decimal::ZERO))
            .sum()
    }

    pub fn total_realised_pnl(&self) -> Decimal {
        self.positions.lock().borrow().values().map(|p| p.realised_pnl).sum()
    }

    pub fn total_equity(&self, prices: &HashMap<String, Decimal>) -> Decimal {
        self.cash.balance() + self.total_market_value(prices)
    }

    /// Processes a confirmed fill: validates state and limits, delegates to
    /// `TransactionManager`, then updates the position map and health
    /// metrics. Returns the realised P&L booked, if any.
    pub fn apply_fill(&self, ids: &IdGenerator, fill: &Fill, mark_prices: &HashMap<String, Decimal>) -> Result<Decimal, CashError> {
        if self.state() != PortfolioState::Active {
            return Err(CashError::InvalidTransaction {
                reason: format!("portfolio {} is not ACTIVE", self.portfolio_id),
            });
        }

        let positions_guard = self.positions.lock();
        let existing = positions_guard.borrow().get(&fill.ticker).cloned();
        let is_new_ticker = existing.is_none();

        if is_new_ticker && positions_guard.borrow().len() >= self.limits.max_positions {
            return Err(CashError::InvalidTransaction {
                reason: "maximum open position count reached".to_string(),
            });
        }

        let tm = TransactionManager::new(ids);
        let (_transaction, updated_position, realised) = tm.record_fill(&self.cash, existing, fill)?;

        if let Some(pos) = &updated_position {
            let value = pos.market_value(fill.price).abs();
            if value > self.limits.max_position_value {
                warn!(
                    portfolio_id = self.portfolio_id,
                    ticker = %fill.ticker,
                    %value,
                    "position value exceeds configured limit"
                );
            }
        }

        let mut positions = positions_guard.borrow_mut();
        match updated_position {
            Some(pos) => {
                positions.insert(fill.ticker.clone(), pos);
            }
            None => {
                positions.remove(&fill.ticker);
            }
        }
        drop(positions);

        self.check_concentration(&positions_guard.borrow(), mark_prices);
        self.update_health(mark_prices);

        Ok(realised)
    }

    /// Largest position's share of total equity; logged as a warning when it
    /// breaches `maxConcentrationPct` (soft limit per SPEC_FULL.md §4.7).
    fn check_concentration(&self, positions: &HashMap<String, Position>, prices: &HashMap<String, Decimal>) {
        let equity = self.cash.balance()
            + positions
                .values()
                .map(|p| prices.get(&p.ticker).map(|price| p.market_value(*price)).unwrap_or(Decimal::ZERO))
                .sum::<Decimal>();
        if equity <= Decimal::ZERO {
            return;
        }
        for p in positions.values() {
            let Some(price) = prices.get(&p.ticker) else { continue };
            let share = (p.market_value(*price).abs() / equity).to_string().parse::<f64>().unwrap_or(0.0);
            if share > self.limits.max_concentration_pct {
                warn!(
                    portfolio_id = self.portfolio_id,
                    ticker = %p.ticker,
                    share,
                    "position concentration exceeds configured limit"
                );
            }
        }
    }

    /// Soft health-metric bookkeeping (SPEC_FULL.md §9 decision 4): never
    /// used to reject orders, only surfaced for observability.
    fn update_health(&self, prices: &HashMap<String, Decimal>) {
        let equity = self.total_equity(prices);
        let guard = self.health.lock();
        let mut health = guard.borrow_mut();
        if equity > health.peak_equity {
            health.peak_equity = equity;
        }
        if health.peak_equity > Decimal::ZERO {
            let drawdown = (health.peak_equity - equity) / health.peak_equity;
            health.drawdown_pct = drawdown.to_string().parse().unwrap_or(0.0);
        }
    }

    pub fn health_metrics(&self) -> HealthMetrics {
        self.health.lock().borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Side;
    use rust_decimal_macros::dec;

    fn portfolio() -> (Portfolio, IdGenerator) {
        (
            Portfolio::new(1, "sim", dec!(10_000), PortfolioLimits::default()),
            IdGenerator::new(),
        )
    }

    #[test]
    fn fill_on_active_portfolio_opens_position_and_debits_cash() {
        let (portfolio, ids) = portfolio();
        let fill = Fill::executed(1, 0, "BTCUSDT", Side::Buy, dec!(100), dec!(1), dec!(0), 1);
        let mut prices = HashMap::new();
        prices.insert("BTCUSDT".to_string(), dec!(100));
        portfolio.apply_fill(&ids, &fill, &prices).unwrap();
        assert_eq!(portfolio.cash().balance(), dec!(9_900));
        assert!(portfolio.position("BTCUSDT").is_some());
    }

    #[test]
    fn fill_on_inactive_portfolio_is_rejected() {
        let (portfolio, ids) = portfolio();
        portfolio.transition_to(PortfolioState::Inactive).unwrap();
        let fill = Fill::executed(1, 0, "BTCUSDT", Side::Buy, dec!(100), dec!(1), dec!(0), 1);
        let err = portfolio.apply_fill(&ids, &fill, &HashMap::new()).unwrap_err();
        assert!(matches!(err, CashError::InvalidTransaction { .. }));
    }

    #[test]
    fn archived_portfolio_cannot_reactivate() {
        let (portfolio, _ids) = portfolio();
        portfolio.transition_to(PortfolioState::Archived).unwrap();
        let err = portfolio.transition_to(PortfolioState::Active).unwrap_err();
        assert_eq!(err.portfolio_id, 1);
    }

    #[test]
    fn closing_a_position_removes_it_from_the_map() {
        let (portfolio, ids) = portfolio();
        let mut prices = HashMap::new();
        prices.insert("BTCUSDT".to_string(), dec!(100));
        portfolio
            .apply_fill(&ids, &Fill::executed(1, 0, "BTCUSDT", Side::Buy, dec!(100), dec!(1), dec!(0), 1), &prices)
            .unwrap();
        portfolio
            .apply_fill(&ids, &Fill::executed(2, 1, "BTCUSDT", Side::Sell, dec!(110), dec!(1), dec!(0), 1), &prices)
            .unwrap();
        assert!(portfolio.position("BTCUSDT").is_none());
        assert_eq!(portfolio.total_realised_pnl(), Decimal::ZERO);
    }
}
