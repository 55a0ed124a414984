//! `OrderManager`: the trigger-evaluation and OCO-cleanup subsystem
//! (SPEC_FULL.md §4.9 — "the hardest subsystem").
//!
//! Grounded in `original_source/itrader/execution_handler/order_manager.py`'s
//! `process_orders_on_market_data` sweep and its OCO-pair cancellation.

use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::core::event::{BarEvent, FillEvent, OrderEvent};
use crate::core::fill::Fill;
use crate::core::ids::IdGenerator;
use crate::core::order::Order;
use crate::core::types::{Bar, OrderType, Side};
use crate::exchange::SimulatedExchange;

use super::storage::OrderStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketExecution {
    Immediate,
    NextBar,
}

/// One filled order, paired with the fill it produced.
pub struct TriggeredFill {
    pub order_event: OrderEvent,
    pub fill_event: FillEvent,
}

pub struct OrderManager {
    storage: std::sync::Arc<dyn OrderStorage>,
    exchange: std::sync::Arc<SimulatedExchange>,
    execution_mode: MarketExecution,
    /// `(portfolio_id, order_id)` pairs queued by `queueMarketOrdersForNextBar`,
    /// executed at the following bar's open.
    next_bar_queue: Mutex<Vec<(u64, u64)>>,
}

impl OrderManager {
    pub fn new(
        storage: std::sync::Arc<dyn OrderStorage>,
        exchange: std::sync::Arc<SimulatedExchange>,
        execution_mode: MarketExecution,
    ) -> Self {
        Self {
            storage,
            exchange,
            execution_mode,
            next_bar_queue: Mutex::new(Vec::new()),
        }
    }

    pub fn execution_mode(&self) -> MarketExecution {
        self.execution_mode
    }

    pub fn queue_market_orders_for_next_bar(&self, portfolio_id: u64) {
        let active = self.storage.active_orders(portfolio_id);
        let mut queue = self.next_bar_queue.lock();
        for order in active.into_iter().filter(|o| o.order_type == OrderType::Market) {
            queue.push((portfolio_id, order.order_id));
        }
    }

    pub fn process_market_orders_immediately(&self, portfolio_id: u64, ids: &IdGenerator, time: i64) -> Vec<TriggeredFill> {
        let mut results = Vec::new();
        for mut order in self.storage.active_orders(portfolio_id) {
            if order.order_type != OrderType::Market {
                continue;
            }
            if let Some(fill) = self.submit_to_exchange(&mut order, time, "market order executed", ids) {
                results.push(fill);
            }
        }
        results
    }

    /// `processOrdersOnMarketData`: next-bar execution, then trigger
    /// evaluation, for every ticker present in the bar.
    pub fn process_orders_on_market_data(&self, bar_event: &BarEvent, ids: &IdGenerator, portfolio_id: u64) -> Vec<TriggeredFill> {
        let mut results = Vec::new();

        if self.execution_mode == MarketExecution::NextBar {
            results.extend(self.execute_queued_next_bar_orders(bar_event, portfolio_id, ids));
        }

        let mut active: Vec<Order> = self
            .storage
            .active_orders(portfolio_id)
            .into_iter()
            .filter(|o| matches!(o.order_type, OrderType::Stop | OrderType::Limit))
            .collect();
        active.sort_by_key(|o| o.order_id);

        let mut triggered_tickers: Vec<(String, u64)> = Vec::new();

        for mut order in active {
            let Some(bar) = bar_event.bars.get(&order.ticker) else { continue };
            if !triggers(&order, bar) {
                continue;
            }
            let reason = match order.order_type {
                OrderType::Stop => "stop loss triggered",
                OrderType::Limit => "limit order triggered",
                OrderType::Market => unreachable!(),
            };
            let commission = self.exchange.calculate_trigger_commission(&order, bar.close);
            if let Some(fill) = self.record_fill(&mut order, bar.close, commission, bar_event.time, reason, ids) {
                triggered_tickers.push((order.ticker.clone(), order.portfolio_id));
                results.push(fill);
            }
        }

        for (ticker, pid) in triggered_tickers {
            self.apply_oco_cleanup(&ticker, pid, bar_event.time);
        }

        results
    }

    fn execute_queued_next_bar_orders(&self, bar_event: &BarEvent, portfolio_id: u64, ids: &IdGenerator) -> Vec<TriggeredFill> {
        let mut queue = self.next_bar_queue.lock();
        let (mine, rest): (Vec<_>, Vec<_>) = queue.drain(..).partition(|(pid, _)| *pid == portfolio_id);
        *queue = rest;
        drop(queue);

        let mut results = Vec::new();
        for (_, order_id) in mine {
            let Some(mut order) = self.storage.get(portfolio_id, order_id) else { continue };
            if !order.is_active() {
                continue;
            }
            let price = bar_event
                .bars
                .get(&order.ticker)
                .map(|b| b.open)
                .unwrap_or(order.price);
            order.price = price;
            if let Some(fill) = self.submit_to_exchange(&mut order, bar_event.time, "next-bar market order executed", ids) {
                results.push(fill);
            }
        }
        results
    }

    /// Routes a MARKET order through `SimulatedExchange::execute_order`'s
    /// validate/connect/failure-injection/slippage pipeline (SPEC_FULL.md
    /// §4.3) — a new order submission, unlike a STOP/LIMIT trigger fill.
    /// A rejection or simulated failure leaves the order active for the
    /// caller to retry or cancel and produces no fill (§4.9's invariant
    /// that one bad order never aborts the sweep).
    fn submit_to_exchange(&self, order: &mut Order, time: i64, reason: &str, ids: &IdGenerator) -> Option<TriggeredFill> {
        let result = self.exchange.execute_order(order, time);
        if !result.success {
            warn!(
                order_id = order.order_id,
                error = result.error_message.as_deref().unwrap_or(""),
                "market order execution failed, leaving order active for retry"
            );
            return None;
        }
        let executed_price = result.executed_price.unwrap_or(order.price);
        let commission = result.commission.unwrap_or(Decimal::ZERO);
        self.record_fill(order, executed_price, commission, time, reason, ids)
    }

    /// Applies a full fill to `order` at an already-determined `price`/
    /// `commission`, persists it, and (for MARKET orders) deactivates it.
    /// Exceptions from an individual order must not abort the sweep (§4.9
    /// invariant) — this is enforced by returning `None` instead of
    /// propagating on a transition error.
    fn record_fill(&self, order: &mut Order, price: Decimal, commission: Decimal, time: i64, reason: &str, _ids: &IdGenerator) -> Option<TriggeredFill> {
        let fill_qty = order.remaining_quantity();
        if let Err(e) = order.apply_fill(fill_qty, time) {
            error!(order_id = order.order_id, error = %e, "failed to apply fill, skipping order");
            return None;
        }

        self.storage.update(order.clone());
        if order.order_type == OrderType::Market {
            self.storage.deactivate(order.portfolio_id, order.order_id);
        }

        info!(order_id = order.order_id, ticker = %order.ticker, %price, reason, "order filled");

        let fill = Fill::executed(order.order_id, time, order.ticker.clone(), order.action, price, fill_qty, commission, order.portfolio_id);
        Some(TriggeredFill {
            order_event: OrderEvent(order.clone()),
            fill_event: FillEvent(fill),
        })
    }

    /// Cancels and deactivates every other active STOP/LIMIT order sharing
    /// `(ticker, portfolioId)` — MARKET orders are never OCO-linked.
    fn apply_oco_cleanup(&self, ticker: &str, portfolio_id: u64, time: i64) {
        for mut sibling in self.storage.active_orders(portfolio_id) {
            if sibling.ticker != ticker || !matches!(sibling.order_type, OrderType::Stop | OrderType::Limit) {
                continue;
            }
            if sibling.transition_to(crate::core::types::OrderStatus::Cancelled, time, Some("oco cleanup".to_string())).is_ok() {
                sibling.oco_linked = true;
                self.storage.update(sibling.clone());
                self.storage.deactivate(portfolio_id, sibling.order_id);
                info!(order_id = sibling.order_id, ticker, "oco sibling cancelled");
            }
        }
    }
}

/// STOP/LIMIT trigger conditions from SPEC_FULL.md §4.9, evaluated against
/// the bar's close.
fn triggers(order: &Order, bar: &Bar) -> bool {
    match (order.order_type, order.action) {
        (OrderType::Stop, Side::Sell) => bar.close < order.price,
        (OrderType::Stop, Side::Buy) => bar.close > order.price,
        (OrderType::Limit, Side::Sell) => bar.close > order.price,
        (OrderType::Limit, Side::Buy) => bar.close < order.price,
        (OrderType::Market, _) => false,
    }
}
