//! `PortfolioHandler`: routes fills to the right `Portfolio` and emits
//! `PortfolioUpdateEvent`s.
//!
//! Grounded in `original_source/itrader/portfolio_handler/portfolio_handler.py`'s
//! `portfolio_id -> Portfolio` map, translated to a `dashmap::DashMap` for the
//! lock-free concurrent access SPEC_FULL.md §5 calls for.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::{error, info};

use crate::core::errors::{CashError, NotFoundError};
use crate::core::event::PortfolioUpdateEvent;
use crate::core::fill::Fill;
use crate::core::ids::IdGenerator;

use super::portfolio::{Portfolio, PortfolioLimits};

pub struct PortfolioHandler {
    portfolios: DashMap<u64, Arc<Portfolio>>,
    ids: Arc<IdGenerator>,
}

impl PortfolioHandler {
    pub fn new(ids: Arc<IdGenerator>) -> Self {
        Self {
            portfolios: DashMap::new(),
            ids,
        }
    }

    pub fn create_portfolio(&self, exchange: impl Into<String>, initial_cash: Decimal, limits: PortfolioLimits) -> Arc<Portfolio> {
        let portfolio_id = self.ids.next_portfolio_id();
        let portfolio = Arc::new(Portfolio::new(portfolio_id, exchange, initial_cash, limits));
        self.portfolios.insert(portfolio_id, Arc::clone(&portfolio));
        info!(portfolio_id, "portfolio created");
        portfolio
    }

    pub fn get(&self, portfolio_id: u64) -> Option<Arc<Portfolio>> {
        self.portfolios.get(&portfolio_id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn portfolio_ids(&self) -> Vec<u64> {
        self.portfolios.iter().map(|entry| *entry.key()).collect()
    }

    /// Look up the fill's portfolio, apply it, and build the
    /// `PortfolioUpdateEvent` snapshot the dispatcher queues next.
    pub fn process_fill(
        &self,
        fill: &Fill,
        mark_prices: &HashMap<String, Decimal>,
    ) -> Result<PortfolioUpdateEvent, CashError> {
        let portfolio = self.get(fill.portfolio_id).ok_or_else(|| {
            error!(portfolio_id = fill.portfolio_id, "fill references unknown portfolio");
            CashError::InvalidTransaction {
                reason: format!(
                    "{}",
                    NotFoundError {
                        entity_type: "portfolio",
                        identifier: fill.portfolio_id.to_string(),
                    }
                ),
            }
        })?;

        portfolio.apply_fill(&self.ids, fill, mark_prices)?;

        Ok(PortfolioUpdateEvent {
            portfolio_id: portfolio.portfolio_id,
            time: fill.time,
            available_cash: portfolio.cash().available_balance(),
            total_equity: portfolio.total_equity(mark_prices),
            open_positions: portfolio.open_position_count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Side;
    use rust_decimal_macros::dec;

    #[test]
    fn process_fill_routes_to_the_right_portfolio_and_emits_update() {
        let handler = PortfolioHandler::new(Arc::new(IdGenerator::new()));
        let portfolio = handler.create_portfolio("sim", dec!(10_000), PortfolioLimits::default());
        let fill = Fill::executed(1, 0, "BTCUSDT", Side::Buy, dec!(100), dec!(1), dec!(0), portfolio.portfolio_id);
        let mut prices = HashMap::new();
        prices.insert("BTCUSDT".to_string(), dec!(100));
        let update = handler.process_fill(&fill, &prices).unwrap();
        assert_eq!(update.portfolio_id, portfolio.portfolio_id);
        assert_eq!(update.open_positions, 1);
        assert_eq!(update.available_cash, dec!(9_900));
    }

    #[test]
    fn process_fill_for_unknown_portfolio_errors() {
        let handler = PortfolioHandler::new(Arc::new(IdGenerator::new()));
        let fill = Fill::executed(1, 0, "BTCUSDT", Side::Buy, dec!(100), dec!(1), dec!(0), 999);
        let err = handler.process_fill(&fill, &HashMap::new()).unwrap_err();
        assert!(matches!(err, CashError::InvalidTransaction { .. }));
    }
}
