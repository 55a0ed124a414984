//! `Fill`: the confirmed result of executing (part of) an order.

use rust_decimal::Decimal;

use super::types::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillStatus {
    Executed,
    Rejected,
}

#[derive(Debug, Clone)]
pub struct Fill {
    pub order_id: u64,
    pub time: i64,
    pub status: FillStatus,
    pub ticker: String,
    pub action: Side,
    pub price: Decimal,
    pub quantity: Decimal,
    pub commission: Decimal,
    pub portfolio_id: u64,
}

impl Fill {
    #[allow(clippy::too_many_arguments)]
    pub fn executed(
        order_id: u64,
        time: i64,
        ticker: impl Into<String>,
        action: Side,
        price: Decimal,
        quantity: Decimal,
        commission: Decimal,
        portfolio_id: u64,
    ) -> Self {
        Self {
            order_id,
            time,
            status: FillStatus::Executed,
            ticker: ticker.into(),
            action,
            price,
            quantity,
            commission,
            portfolio_id,
        }
    }
}
