//! `Transaction`: records the cash-affecting side of a fill.

use rust_decimal::Decimal;

use super::types::Side;

#[derive(Debug, Clone)]
pub struct Transaction {
    pub transaction_id: u64,
    pub portfolio_id: u64,
    pub position_id: Option<u64>,
    pub time: i64,
    pub ticker: String,
    pub action: Side,
    pub quantity: Decimal,
    pub price: Decimal,
    pub commission: Decimal,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transaction_id: u64,
        portfolio_id: u64,
        time: i64,
        ticker: impl Into<String>,
        action: Side,
        quantity: Decimal,
        price: Decimal,
        commission: Decimal,
    ) -> Self {
        Self {
            transaction_id,
            portfolio_id,
            position_id: None,
            time,
            ticker: ticker.into(),
            action,
            quantity,
            price,
            commission,
        }
    }

    /// Gross cash impact before commission: positive for a BUY debit
    /// magnitude, positive for a SELL credit magnitude.
    pub fn trade_value(&self) -> Decimal {
        self.quantity * self.price
    }
}
