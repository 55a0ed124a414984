//! `TransactionManager`: turns a confirmed `Fill` into a recorded
//! `Transaction`, the corresponding cash flow and the position update.
//!
//! Grounded in `original_source/itrader/portfolio_handler/transaction_manager.py`:
//! validate against available funds before touching any state, then debit
//! (BUY) or credit (SELL) the cash manager and hand the fill to `Position`.

use rust_decimal::Decimal;

use crate::core::errors::CashError;
use crate::core::fill::Fill;
use crate::core::ids::IdGenerator;
use crate::core::transaction::Transaction;
use crate::core::types::Side;

use super::cash::CashManager;
use super::position::Position;

/// Stateless coordinator: holds no data of its own beyond an id source,
/// operating on the `CashManager` and `Position` passed to it by
/// `Portfolio`/`PortfolioHandler`.
pub struct TransactionManager<'a> {
    ids: &'a IdGenerator,
}

impl<'a> TransactionManager<'a> {
    pub fn new(ids: &'a IdGenerator) -> Self {
        Self { ids }
    }

    /// Validate funds (for a BUY), record the cash flow, update the
    /// position, and return the `Transaction` plus the updated position
    /// state (`None` if the fill flattened it).
    pub fn record_fill(
        &self,
        cash: &CashManager,
        position: Option<Position>,
        fill: &Fill,
    ) -> Result<(Transaction, Option<Position>, Decimal), CashError> {
        let trade_value = fill.price * fill.quantity;
        let is_debit = fill.action == Side::Buy;
        let total_cash_impact = if is_debit {
            trade_value + fill.commission
        } else {
            trade_value - fill.commission
        };

        if is_debit && cash.available_balance() < total_cash_impact {
            return Err(CashError::InsufficientFunds {
                required: total_cash_impact,
                available: cash.available_balance(),
            });
        }

        let transaction_id = self.ids.next_transaction_id();
        cash.process_transaction_cash_flow(
            total_cash_impact,
            is_debit,
            &format!("{} {} {}", fill.action, fill.quantity, fill.ticker),
            transaction_id.to_string(),
        )?;

        let (updated_position, realised_pnl) = Position::apply_fill(
            position,
            &fill.ticker,
            fill.portfolio_id,
            fill.action,
            fill.quantity,
            fill.price,
            fill.commission,
            fill.time,
        );

        let transaction = Transaction::new(
            transaction_id,
            fill.portfolio_id,
            fill.time,
            fill.ticker.clone(),
            fill.action,
            fill.quantity,
            fill.price,
            fill.commission,
        );

        Ok((transaction, updated_position, realised_pnl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fill(action: Side, quantity: Decimal, price: Decimal, commission: Decimal) -> Fill {
        Fill::executed(1, 0, "BTCUSDT", action, price, quantity, commission, 1)
    }

    #[test]
    fn buy_debits_cash_and_opens_long_position() {
        let ids = IdGenerator::new();
        let cash = CashManager::new(1, dec!(10_000), dec!(10_000_000));
        let tm = TransactionManager::new(&ids);
        let (txn, pos, realised) = tm
            .record_fill(&cash, None, &fill(Side::Buy, dec!(1), dec!(100), dec!(1)))
            .unwrap();
        assert_eq!(txn.trade_value(), dec!(100));
        assert_eq!(cash.balance(), dec!(9_899));
        assert_eq!(pos.unwrap().avg_price, dec!(101));
        assert_eq!(realised, Decimal::ZERO);
    }

    #[test]
    fn buy_beyond_available_cash_is_rejected_and_state_unchanged() {
        let ids = IdGenerator::new();
        let cash = CashManager::new(1, dec!(50), dec!(10_000_000));
        let tm = TransactionManager::new(&ids);
        let err = tm
            .record_fill(&cash, None, &fill(Side::Buy, dec!(1), dec!(100), dec!(0)))
            .unwrap_err();
        assert!(matches!(err, CashError::InsufficientFunds { .. }));
        assert_eq!(cash.balance(), dec!(50));
    }

    #[test]
    fn sell_credits_cash_and_books_realised_pnl() {
        let ids = IdGenerator::new();
        let cash = CashManager::new(1, dec!(10_000), dec!(10_000_000));
        let tm = TransactionManager::new(&ids);
        let (_, pos, _) = tm
            .record_fill(&cash, None, &fill(Side::Buy, dec!(1), dec!(100), dec!(0)))
            .unwrap();
        let (_, pos, realised) = tm
            .record_fill(&cash, pos, &fill(Side::Sell, dec!(1), dec!(150), dec!(1)))
            .unwrap();
        assert!(pos.is_none());
        assert_eq!(realised, dec!(49));
        assert_eq!(cash.balance(), dec!(9_900) + dec!(150) - dec!(1));
    }
}
