//! `Signal`: an intent produced by a strategy, not yet an order.

use rust_decimal::Decimal;

use super::types::{OrderType, Side};

/// Produced by a strategy on a bar; consumed and destroyed by `OrderHandler`
/// once it has been turned into one or more `Order`s.
#[derive(Debug, Clone)]
pub struct Signal {
    pub time: i64,
    pub order_type: OrderType,
    pub ticker: String,
    pub action: Side,
    pub price: Decimal,
    pub quantity: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub strategy_id: u64,
    pub portfolio_id: u64,
    pub verified: bool,
}

impl Signal {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        time: i64,
        order_type: OrderType,
        ticker: impl Into<String>,
        action: Side,
        price: Decimal,
        quantity: Decimal,
        strategy_id: u64,
        portfolio_id: u64,
    ) -> Self {
        Self {
            time,
            order_type,
            ticker: ticker.into(),
            action,
            price,
            quantity,
            stop_loss: None,
            take_profit: None,
            strategy_id,
            portfolio_id,
            verified: false,
        }
    }

    pub fn with_stop_loss(mut self, stop_loss: Decimal) -> Self {
        self.stop_loss = Some(stop_loss);
        self
    }

    pub fn with_take_profit(mut self, take_profit: Decimal) -> Self {
        self.take_profit = Some(take_profit);
        self
    }
}
