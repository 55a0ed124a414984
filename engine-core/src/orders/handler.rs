//! `OrderHandler`: turns a validated `Signal` into one or more `Order`s and
//! exposes the order query/lifecycle surface (SPEC_FULL.md §4.10).

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::core::ids::IdGenerator;
use crate::core::order::Order;
use crate::core::signal::Signal;
use crate::core::types::{OrderStatus, OrderType, Side};
use crate::exchange::types::ValidationResult;
use crate::portfolio::Portfolio;

use super::manager::{MarketExecution, OrderManager, TriggeredFill};
use super::storage::OrderStorage;
use super::validator::OrderValidator;

#[derive(Debug, Clone)]
pub struct OrdersSummary {
    pub total: usize,
    pub active: usize,
    pub filled: usize,
    pub cancelled: usize,
    pub rejected: usize,
}

pub struct OrderHandler {
    storage: Arc<dyn OrderStorage>,
    manager: OrderManager,
    validator: OrderValidator,
    ids: Arc<IdGenerator>,
    exchange_name: String,
}

impl OrderHandler {
    pub fn new(
        storage: Arc<dyn OrderStorage>,
        manager: OrderManager,
        validator: OrderValidator,
        ids: Arc<IdGenerator>,
        exchange_name: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            manager,
            validator,
            ids,
            exchange_name: exchange_name.into(),
        }
    }

    /// `onSignalEvent`: validate, build the paired stop/take-profit orders
    /// plus the main order, and drive immediate/next-bar execution.
    pub fn on_signal(&self, signal: &Signal, portfolio: &Portfolio) -> Vec<TriggeredFill> {
        let validation = self.validator.validate_signal_pipeline(signal, portfolio);
        if !validation.is_valid {
            warn!(strategy_id = signal.strategy_id, ticker = %signal.ticker, "signal rejected by validator");
            return Vec::new();
        }

        if let Some(stop_loss) = signal.stop_loss.filter(|p| *p > Decimal::ZERO) {
            self.create_order(signal, OrderType::Stop, signal.action.opposite(), stop_loss, true);
        }
        if let Some(take_profit) = signal.take_profit.filter(|p| *p > Decimal::ZERO) {
            self.create_order(signal, OrderType::Limit, signal.action.opposite(), take_profit, true);
        }
        self.create_order(signal, signal.order_type, signal.action, signal.price, false);

        if signal.order_type == OrderType::Market {
            match self.manager.execution_mode() {
                MarketExecution::Immediate => self.manager.process_market_orders_immediately(signal.portfolio_id, &self.ids, signal.time),
                MarketExecution::NextBar => {
                    self.manager.queue_market_orders_for_next_bar(signal.portfolio_id);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        }
    }

    /// Delegates to the owned `OrderManager`'s market-data sweep, for the
    /// dispatcher's BAR handling.
    pub fn process_orders_on_bar(&self, bar_event: &crate::core::event::BarEvent, ids: &IdGenerator, portfolio_id: u64) -> Vec<TriggeredFill> {
        self.manager.process_orders_on_market_data(bar_event, ids, portfolio_id)
    }

    fn create_order(&self, signal: &Signal, order_type: OrderType, action: Side, price: Decimal, oco_linked: bool) -> Order {
        let order_id = self.ids.next_order_id();
        let mut order = Order::new(
            order_id,
            order_type,
            signal.ticker.clone(),
            action,
            price,
            signal.quantity,
            self.exchange_name.clone(),
            signal.strategy_id,
            signal.portfolio_id,
            signal.time,
        );
        order.oco_linked = oco_linked;
        info!(order_id, ticker = %order.ticker, %order_type, "order created from signal");
        self.storage.insert(order.clone());
        order
    }

    pub fn modify_order(&self, portfolio_id: u64, order_id: u64, new_price: Option<Decimal>, new_quantity: Option<Decimal>, time: i64) -> Result<(), ValidationResult> {
        let mut order = self
            .storage
            .get(portfolio_id, order_id)
            .ok_or_else(|| ValidationResult::fail("NOT_FOUND", "order not found"))?;
        self.validator.validate_order_modification(&order, new_quantity)?;
        if let Some(price) = new_price {
            order.price = price;
        }
        if let Some(quantity) = new_quantity {
            order.quantity = quantity;
        }
        order.modification_count += 1;
        order.last_modification_time = Some(time);
        self.storage.update(order);
        Ok(())
    }

    pub fn cancel_order(&self, portfolio_id: u64, order_id: u64, time: i64) -> Result<(), ValidationResult> {
        let mut order = self
            .storage
            .get(portfolio_id, order_id)
            .ok_or_else(|| ValidationResult::fail("NOT_FOUND", "order not found"))?;
        order
            .transition_to(OrderStatus::Cancelled, time, Some("cancelled by caller".to_string()))
            .map_err(|e| ValidationResult::fail("STATE_ERROR", e.to_string()))?;
        self.storage.update(order.clone());
        self.storage.deactivate(portfolio_id, order_id);
        Ok(())
    }

    /// Distinct from `cancel_order`: removes a still-pending order entirely
    /// rather than leaving a CANCELLED audit record, for orders that were
    /// never transmitted.
    pub fn remove_order(&self, portfolio_id: u64, order_id: u64) {
        self.storage.deactivate(portfolio_id, order_id);
    }

    pub fn get_orders_by_status(&self, portfolio_id: u64, status: OrderStatus) -> Vec<Order> {
        self.storage
            .all_orders(portfolio_id)
            .into_iter()
            .filter(|o| o.status == status)
            .collect()
    }

    pub fn get_active_orders(&self, portfolio_id: u64) -> Vec<Order> {
        self.storage.active_orders(portfolio_id)
    }

    pub fn get_order_history(&self, portfolio_id: u64) -> Vec<Order> {
        self.storage.all_orders(portfolio_id)
    }

    /// Supplemented (§2a): free-text search over ticker and exchange.
    pub fn search_orders(&self, portfolio_id: u64, query: &str) -> Vec<Order> {
        let needle = query.to_lowercase();
        self.storage
            .all_orders(portfolio_id)
            .into_iter()
            .filter(|o| o.ticker.to_lowercase().contains(&needle) || o.exchange.to_lowercase().contains(&needle))
            .collect()
    }

    /// Supplemented (§2a): counts by terminal/non-terminal bucket for a
    /// dashboard-style summary.
    pub fn get_orders_summary(&self, portfolio_id: u64) -> OrdersSummary {
        let all = self.storage.all_orders(portfolio_id);
        OrdersSummary {
            total: all.len(),
            active: all.iter().filter(|o| o.is_active()).count(),
            filled: all.iter().filter(|o| o.status == OrderStatus::Filled).count(),
            cancelled: all.iter().filter(|o| o.status == OrderStatus::Cancelled).count(),
            rejected: all.iter().filter(|o| o.status == OrderStatus::Rejected).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::presets::ExchangeConfig;
    use crate::exchange::SimulatedExchange;
    use crate::orders::storage::InMemoryOrderStorage;
    use crate::orders::validator::ValidationConfig;
    use crate::portfolio::PortfolioLimits;
    use rust_decimal_macros::dec;

    fn handler() -> (OrderHandler, Arc<InMemoryOrderStorage>, Portfolio) {
        let storage = Arc::new(InMemoryOrderStorage::new());
        let exchange = Arc::new(SimulatedExchange::new(ExchangeConfig::default_preset()));
        let manager = OrderManager::new(storage.clone(), exchange, MarketExecution::Immediate);
        let mut config = ValidationConfig::default();
        config.supported_exchanges.push("sim".to_string());
        let validator = OrderValidator::new(config);
        let ids = Arc::new(IdGenerator::new());
        let handler = OrderHandler::new(storage.clone(), manager, validator, ids, "sim");
        let portfolio = Portfolio::new(1, "sim", dec!(10_000), PortfolioLimits::default());
        (handler, storage, portfolio)
    }

    #[test]
    fn signal_with_stop_and_take_profit_creates_three_orders() {
        let (handler, storage, portfolio) = handler();
        let signal = Signal::new(0, OrderType::Limit, "BTCUSDT", Side::Buy, dec!(100), dec!(1), 1, 1)
            .with_stop_loss(dec!(90))
            .with_take_profit(dec!(120));
        handler.on_signal(&signal, &portfolio);
        assert_eq!(storage.all_orders(1).len(), 3);
    }

    #[test]
    fn invalid_signal_creates_no_orders() {
        let (handler, storage, portfolio) = handler();
        let signal = Signal::new(0, OrderType::Market, "BTCUSDT", Side::Buy, dec!(100), dec!(1000), 1, 1);
        handler.on_signal(&signal, &portfolio);
        assert!(storage.all_orders(1).is_empty());
    }

    #[test]
    fn cancel_order_deactivates_and_marks_cancelled() {
        let (handler, storage, portfolio) = handler();
        let signal = Signal::new(0, OrderType::Limit, "BTCUSDT", Side::Buy, dec!(100), dec!(1), 1, 1);
        handler.on_signal(&signal, &portfolio);
        let order_id = storage.all_orders(1)[0].order_id;
        handler.cancel_order(1, order_id, 1).unwrap();
        assert_eq!(storage.get(1, order_id).unwrap().status, OrderStatus::Cancelled);
        assert!(storage.active_orders(1).is_empty());
    }

    #[test]
    fn orders_summary_counts_buckets() {
        let (handler, _storage, portfolio) = handler();
        let signal = Signal::new(0, OrderType::Limit, "BTCUSDT", Side::Buy, dec!(100), dec!(1), 1, 1);
        handler.on_signal(&signal, &portfolio);
        let summary = handler.get_orders_summary(1);
        assert_eq!(summary.total, 1);
        assert_eq!(summary.active, 1);
    }
}
