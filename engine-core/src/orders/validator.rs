//! `OrderValidator`: the four-phase signal validation pipeline (SPEC_FULL.md §4.8).
//!
//! Grounded in `original_source/itrader/execution_handler/order_validator.py`'s
//! phase list; stops at the first failing phase and returns the accumulated
//! `ValidationResult`.

use rust_decimal::Decimal;

use crate::core::signal::Signal;
use crate::core::types::{OrderStatus, OrderType, Side};
use crate::exchange::types::ValidationResult;
use crate::portfolio::Portfolio;

#[derive(Debug, Clone)]
pub struct ValidationConfig {
    pub supported_exchanges: Vec<String>,
    pub min_order_value: Decimal,
    pub max_order_value: Decimal,
    pub min_quantity: Decimal,
    pub max_quantity: Decimal,
    pub min_price: Decimal,
    pub max_price: Decimal,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            supported_exchanges: vec!["sim".to_string()],
            min_order_value: Decimal::ONE,
            max_order_value: Decimal::from(10_000_000),
            min_quantity: Decimal::new(1, 8),
            max_quantity: Decimal::from(1_000_000),
            min_price: Decimal::new(1, 8),
            max_price: Decimal::from(1_000_000),
        }
    }
}

pub struct OrderValidator {
    pub config: ValidationConfig,
}

impl OrderValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn validate_signal_pipeline(&self, signal: &Signal, portfolio: &Portfolio) -> ValidationResult {
        if let Err(result) = self.critical_fields(signal) {
            return result;
        }
        if let Err(result) = self.market_conditions(portfolio) {
            return result;
        }
        if let Err(result) = self.portfolio_constraints(signal, portfolio) {
            return result;
        }
        if let Err(result) = self.financial_risk(signal) {
            return result;
        }
        ValidationResult::ok()
    }

    fn critical_fields(&self, signal: &Signal) -> Result<(), ValidationResult> {
        if signal.ticker.trim().is_empty() {
            return Err(ValidationResult::fail("INVALID_ORDER", "ticker must not be empty"));
        }
        if !matches!(signal.action, Side::Buy | Side::Sell) {
            return Err(ValidationResult::fail("INVALID_ORDER", "action must be BUY or SELL"));
        }
        if signal.price <= Decimal::ZERO {
            return Err(ValidationResult::fail("INVALID_PRICE", "price must be positive"));
        }
        if !matches!(signal.order_type, OrderType::Market | OrderType::Stop | OrderType::Limit) {
            return Err(ValidationResult::fail("INVALID_ORDER", "unrecognized order type"));
        }
        Ok(())
    }

    fn market_conditions(&self, portfolio: &Portfolio) -> Result<(), ValidationResult> {
        if !self.config.supported_exchanges.iter().any(|e| e == &portfolio.exchange) {
            return Err(ValidationResult::fail(
                "EXCHANGE_NOT_SUPPORTED",
                format!("exchange {} is not supported", portfolio.exchange),
            ));
        }
        Ok(())
    }

    fn portfolio_constraints(&self, signal: &Signal, portfolio: &Portfolio) -> Result<(), ValidationResult> {
        match signal.action {
            Side::Buy => {
                let required = signal.price * signal.quantity;
                if portfolio.cash().available_balance() < required {
                    return Err(ValidationResult::fail("INSUFFICIENT_FUNDS", "cash available is below order value"));
                }
            }
            Side::Sell => {
                let held = portfolio
                    .position(&signal.ticker)
                    .map(|p| p.quantity)
                    .unwrap_or(Decimal::ZERO);
                if held < signal.quantity {
                    return Err(ValidationResult::fail("INSUFFICIENT_POSITION", "held quantity is below order quantity"));
                }
            }
        }
        Ok(())
    }

    fn financial_risk(&self, signal: &Signal) -> Result<(), ValidationResult> {
        let value = signal.price * signal.quantity;
        if value < self.config.min_order_value {
            return Err(ValidationResult::fail("ORDER_VALUE_TOO_SMALL", "order value below minimum"));
        }
        if value > self.config.max_order_value {
            return Err(ValidationResult::fail("ORDER_VALUE_TOO_LARGE", "order value above maximum"));
        }
        if signal.quantity < self.config.min_quantity || signal.quantity > self.config.max_quantity {
            return Err(ValidationResult::fail("INVALID_QUANTITY", "quantity outside configured bounds"));
        }
        if signal.price < self.config.min_price || signal.price > self.config.max_price {
            return Err(ValidationResult::fail("INVALID_PRICE", "price outside configured bounds"));
        }
        Ok(())
    }

    /// Rejects modifications on an inactive order or a quantity reduction
    /// below what has already filled.
    pub fn validate_order_modification(
        &self,
        order: &crate::core::order::Order,
        new_quantity: Option<Decimal>,
    ) -> Result<(), ValidationResult> {
        if order.status != OrderStatus::Pending && order.status != OrderStatus::PartiallyFilled {
            return Err(ValidationResult::fail("STATE_ERROR", "order is not active"));
        }
        if let Some(qty) = new_quantity {
            if qty < order.filled_quantity {
                return Err(ValidationResult::fail("INVALID_QUANTITY", "new quantity is below already-filled quantity"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::PortfolioLimits;
    use rust_decimal_macros::dec;

    fn portfolio() -> Portfolio {
        Portfolio::new(1, "sim", dec!(10_000), PortfolioLimits::default())
    }

    fn signal() -> Signal {
        Signal::new(0, OrderType::Market, "BTCUSDT", Side::Buy, dec!(100), dec!(1), 1, 1)
    }

    #[test]
    fn valid_buy_signal_passes_pipeline() {
        let validator = OrderValidator::new(ValidationConfig::default());
        let result = validator.validate_signal_pipeline(&signal(), &portfolio());
        assert!(result.is_valid);
    }

    #[test]
    fn buy_beyond_cash_fails_portfolio_constraints_phase() {
        let validator = OrderValidator::new(ValidationConfig::default());
        let mut sig = signal();
        sig.quantity = dec!(1000);
        let result = validator.validate_signal_pipeline(&sig, &portfolio());
        assert!(!result.is_valid);
        assert_eq!(result.error_code(), Some("INSUFFICIENT_FUNDS"));
    }

    #[test]
    fn sell_without_position_fails() {
        let validator = OrderValidator::new(ValidationConfig::default());
        let mut sig = signal();
        sig.action = Side::Sell;
        let result = validator.validate_signal_pipeline(&sig, &portfolio());
        assert!(!result.is_valid);
        assert_eq!(result.error_code(), Some("INSUFFICIENT_POSITION"));
    }

    #[test]
    fn empty_ticker_fails_critical_fields_phase() {
        let validator = OrderValidator::new(ValidationConfig::default());
        let mut sig = signal();
        sig.ticker = String::new();
        let result = validator.validate_signal_pipeline(&sig, &portfolio());
        assert!(!result.is_valid);
        assert_eq!(result.error_code(), Some("INVALID_ORDER"));
    }

    #[test]
    fn modification_reducing_below_filled_quantity_is_rejected() {
        let validator = OrderValidator::new(ValidationConfig::default());
        let mut order = crate::core::order::Order::new(1, OrderType::Market, "BTCUSDT", Side::Buy, dec!(100), dec!(2), "sim", 1, 1, 0);
        order.filled_quantity = dec!(1);
        let result = validator.validate_order_modification(&order, Some(dec!(0.5)));
        assert!(result.is_err());
    }
}
