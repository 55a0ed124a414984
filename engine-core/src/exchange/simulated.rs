//! `SimulatedExchange`: validate, apply fee and slippage, emit a fill.
//!
//! Style grounded in the teacher's `execution/simulated.rs` (`anyhow!`-style
//! validation error construction, `tracing` logging at `debug`/`info`/`warn`);
//! the five-step execution algorithm and the connection/health surface are
//! grounded in `original_source/itrader/execution_handler/exchanges/simulated.py`.

use parking_lot::Mutex;
use rand::Rng;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::core::errors::ExecutionErrorCode;
use crate::core::order::Order;

use super::connection::ConnectionData;
use super::presets::ExchangeConfig;
use super::types::{ExecutionResult, HealthStatus, ValidationResult};

const SIMULATED_FAILURE_CODES: [ExecutionErrorCode; 4] = [
    ExecutionErrorCode::NetworkError,
    ExecutionErrorCode::ExchangeError,
    ExecutionErrorCode::RateLimitExceeded,
    ExecutionErrorCode::ExchangeMaintenance,
];

#[derive(Debug, Default)]
struct Stats {
    orders_executed: u64,
    orders_failed: u64,
    total_volume: Decimal,
}

struct Inner {
    config: ExchangeConfig,
    connection: ConnectionData,
    stats: Stats,
}

/// The simulated exchange. Config, connection state and stat counters all
/// live behind one `Mutex`, matching §5's "SimulatedExchange has a lock for
/// config updates and stat counters."
pub struct SimulatedExchange {
    inner: Mutex<Inner>,
    started_at: i64,
}

impl SimulatedExchange {
    pub fn new(config: ExchangeConfig) -> Self {
        info!(exchange = %config.name, "initialized simulated exchange");
        Self {
            inner: Mutex::new(Inner {
                config,
                connection: ConnectionData::default(),
                stats: Stats::default(),
            }),
            started_at: 0,
        }
    }

    pub fn connect(&self, _time: i64) -> bool {
        let mut g = self.inner.lock();
        let was_connected = g.connection.is_connected();
        g.connection.connect();
        if !was_connected {
            info!(exchange = %g.config.name, "exchange connected");
        }
        true
    }

    pub fn disconnect(&self, _time: i64) {
        let mut g = self.inner.lock();
        g.connection.disconnect();
        info!(exchange = %g.config.name, "exchange disconnected");
    }

    pub fn is_connected(&self) -> bool {
        self.inner.lock().connection.is_connected()
    }

    pub fn health_check(&self, now: i64) -> HealthStatus {
        let g = self.inner.lock();
        let total = g.stats.orders_executed + g.stats.orders_failed;
        let error_rate = if total == 0 {
            0.0
        } else {
            g.stats.orders_failed as f64 / total as f64
        };
        HealthStatus {
            exchange_name: g.config.name.clone(),
            connected: g.connection.is_connected(),
            status: g.connection.state,
            uptime_seconds: (now - self.started_at).max(0),
            error_rate,
            orders_executed_today: g.stats.orders_executed,
            orders_failed_today: g.stats.orders_failed,
            total_volume_today: g.stats.total_volume,
        }
    }

    /// `validateOrder`: symbol support, size bounds, price sanity, connection.
    pub fn validate_order(&self, order: &Order) -> ValidationResult {
        let g = self.inner.lock();
        if !g.config.limits.supported_symbols.iter().any(|s| s == &order.ticker) {
            return ValidationResult::fail("SYMBOL_NOT_FOUND", format!("unsupported symbol {}", order.ticker));
        }
        if order.quantity <= Decimal::ZERO {
            return ValidationResult::fail("INVALID_ORDER", "quantity must be positive");
        }
        if order.quantity < g.config.limits.min_order_size {
            return ValidationResult::fail("ORDER_SIZE_TOO_SMALL", "quantity below minimum order size");
        }
        if order.quantity > g.config.limits.max_order_size {
            return ValidationResult::fail("ORDER_SIZE_TOO_LARGE", "quantity above maximum order size");
        }
        if order.price <= Decimal::ZERO {
            return ValidationResult::fail("INVALID_PRICE", "price must be positive");
        }
        if !g.connection.is_connected() {
            return ValidationResult::fail("NETWORK_ERROR", "exchange is not connected");
        }
        let mut result = ValidationResult::ok();
        if order.price > g.config.limits.max_price {
            result = result.with_warning("INVALID_PRICE", "price exceeds sanity bound of 1,000,000");
        }
        if order.price * order.quantity < Decimal::ONE {
            result = result.with_warning("INVALID_ORDER", "order value below 1.0");
        }
        result
    }

    /// `executeOrder`: the five-step algorithm of SPEC_FULL.md §4.3.
    pub fn execute_order(&self, order: &Order, now: i64) -> ExecutionResult {
        let validation = self.validate_order(order);
        if !validation.is_valid {
            let mut g = self.inner.lock();
            g.stats.orders_failed += 1;
            let code = validation.error_code().unwrap_or("INVALID_ORDER");
            warn!(order_id = order.order_id, code, "order rejected by validation");
            return ExecutionResult::rejected(
                order.order_id,
                now,
                code_from_str(code),
                "validation failed",
            );
        }

        let mut g = self.inner.lock();
        if !g.connection.is_connected() {
            g.stats.orders_failed += 1;
            return ExecutionResult::failed(
                order.order_id,
                now,
                ExecutionErrorCode::NetworkError,
                "exchange not connected",
            );
        }

        if g.config.failure_simulation.simulate_failures {
            let roll: f64 = rand::thread_rng().gen();
            if roll < g.config.failure_simulation.failure_rate {
                let idx = rand::thread_rng().gen_range(0..SIMULATED_FAILURE_CODES.len());
                let code = SIMULATED_FAILURE_CODES[idx];
                g.stats.orders_failed += 1;
                warn!(order_id = order.order_id, %code, "simulated exchange failure injected");
                return ExecutionResult::failed(order.order_id, now, code, "simulated failure");
            }
        }

        let commission = g
            .config
            .fee_model
            .calculate_fee(order.quantity, order.price, order.action, order.order_type, None)
            .unwrap_or(Decimal::ZERO);
        let executed_price =
            g.config
                .slippage_model
                .apply(order.quantity, order.price, order.action, order.order_type);
        let slippage_pct = if order.price.is_zero() {
            0.0
        } else {
            ((executed_price - order.price) / order.price)
                .to_string()
                .parse()
                .unwrap_or(0.0)
        };

        g.stats.orders_executed += 1;
        g.stats.total_volume += order.quantity * executed_price;

        debug!(
            order_id = order.order_id,
            ticker = %order.ticker,
            executed_price = %executed_price,
            commission = %commission,
            "order executed"
        );

        ExecutionResult::filled(
            order.order_id,
            now,
            executed_price,
            order.quantity,
            commission,
            slippage_pct,
            order.price,
        )
    }

    /// STOP/LIMIT triggers fill at the bar close with no slippage/fee
    /// re-derivation beyond the configured fee model (SPEC_FULL.md §4.9):
    /// this is invoked by `OrderManager`, not through the validate/connect
    /// pipeline above, because a trigger fill is not a new order submission.
    pub fn calculate_trigger_commission(
        &self,
        order: &Order,
        fill_price: Decimal,
    ) -> Decimal {
        let g = self.inner.lock();
        g.config
            .fee_model
            .calculate_fee(order.quantity, fill_price, order.action, order.order_type, None)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn name(&self) -> String {
        self.inner.lock().config.name.clone()
    }
}

fn code_from_str(code: &str) -> ExecutionErrorCode {
    match code {
        "SYMBOL_NOT_FOUND" => ExecutionErrorCode::SymbolNotFound,
        "ORDER_SIZE_TOO_SMALL" => ExecutionErrorCode::OrderSizeTooSmall,
        "ORDER_SIZE_TOO_LARGE" => ExecutionErrorCode::OrderSizeTooLarge,
        "INVALID_PRICE" => ExecutionErrorCode::InvalidPrice,
        "NETWORK_ERROR" => ExecutionErrorCode::NetworkError,
        _ => ExecutionErrorCode::InvalidOrder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{OrderType, Side};
    use rust_decimal_macros::dec;

    fn sample_order() -> Order {
        Order::new(
            1,
            OrderType::Market,
            "BTCUSDT",
            Side::Buy,
            dec!(40),
            dec!(1),
            "default",
            1,
            1,
            0,
        )
    }

    #[test]
    fn default_preset_fills_at_requested_price_with_no_commission() {
        let exchange = SimulatedExchange::new(ExchangeConfig::default_preset());
        exchange.connect(0);
        let result = exchange.execute_order(&sample_order(), 1);
        assert!(result.success);
        assert_eq!(result.executed_price, Some(dec!(40)));
        assert_eq!(result.commission, Some(Decimal::ZERO));
    }

    #[test]
    fn unconnected_exchange_rejects_with_network_error() {
        let exchange = SimulatedExchange::new(ExchangeConfig::default_preset());
        let result = exchange.execute_order(&sample_order(), 1);
        assert!(!result.success);
        assert_eq!(result.error_code, Some(ExecutionErrorCode::NetworkError));
    }

    #[test]
    fn unsupported_symbol_is_rejected() {
        let exchange = SimulatedExchange::new(ExchangeConfig::default_preset());
        exchange.connect(0);
        let mut order = sample_order();
        order.ticker = "DOGEUSDT".to_string();
        let result = exchange.execute_order(&order, 1);
        assert!(!result.success);
        assert_eq!(result.error_code, Some(ExecutionErrorCode::SymbolNotFound));
    }

    #[test]
    fn order_size_below_minimum_rejected() {
        let exchange = SimulatedExchange::new(ExchangeConfig::default_preset());
        exchange.connect(0);
        let mut order = sample_order();
        order.quantity = dec!(0.00001);
        let result = exchange.execute_order(&order, 1);
        assert!(!result.success);
        assert_eq!(result.error_code, Some(ExecutionErrorCode::OrderSizeTooSmall));
    }

    #[test]
    fn failure_injection_at_rate_one_always_fails() {
        let mut cfg = ExchangeConfig::default_preset();
        cfg.failure_simulation.simulate_failures = true;
        cfg.failure_simulation.failure_rate = 1.0;
        let exchange = SimulatedExchange::new(cfg);
        exchange.connect(0);
        for _ in 0..20 {
            let result = exchange.execute_order(&sample_order(), 1);
            assert!(!result.success);
            assert_eq!(result.status, crate::core::types::OrderStatus::Pending);
        }
        let health = exchange.health_check(10);
        assert_eq!(health.orders_failed_today, 20);
    }

    #[test]
    fn realistic_preset_slippage_bounds_and_commission() {
        let exchange = SimulatedExchange::new(ExchangeConfig::realistic_preset());
        exchange.connect(0);
        let mut order = sample_order();
        order.quantity = dec!(100);
        order.price = dec!(150);
        for _ in 0..50 {
            let result = exchange.execute_order(&order, 1);
            if let Some(price) = result.executed_price {
                assert!(price >= dec!(135) && price <= dec!(165));
                let expected_commission = (order.quantity * price) * dec!(0.001);
                assert_eq!(result.commission, Some(expected_commission));
            }
        }
    }
}
