//! End-to-end scenarios threading a `Signal` through `OrderHandler`,
//! `OrderManager`'s bar-driven trigger sweep, and `PortfolioHandler`,
//! matching the concrete scenarios enumerated in SPEC_FULL.md §8.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use engine_core::core::event::BarEvent;
use engine_core::core::fill::Fill;
use engine_core::core::ids::IdGenerator;
use engine_core::core::signal::Signal;
use engine_core::core::types::{Bar, OrderStatus, OrderType, Side};
use engine_core::exchange::presets::ExchangeConfig;
use engine_core::exchange::SimulatedExchange;
use engine_core::orders::{InMemoryOrderStorage, MarketExecution, OrderHandler, OrderManager, OrderStorage, OrderValidator, ValidationConfig, TriggeredFill};
use engine_core::portfolio::{Portfolio, PortfolioHandler, PortfolioLimits};

struct Harness {
    ids: Arc<IdGenerator>,
    storage: Arc<dyn OrderStorage>,
    order_handler: OrderHandler,
    manager_exchange: Arc<SimulatedExchange>,
    portfolio_handler: PortfolioHandler,
}

impl Harness {
    fn new(preset: ExchangeConfig) -> Self {
        let ids = Arc::new(IdGenerator::new());
        let storage: Arc<dyn OrderStorage> = Arc::new(InMemoryOrderStorage::new());
        let exchange = Arc::new(SimulatedExchange::new(preset));
        exchange.connect(0);
        let exchange_name = exchange.name();

        let manager = OrderManager::new(Arc::clone(&storage), Arc::clone(&exchange), MarketExecution::Immediate);
        let validator = OrderValidator::new(ValidationConfig {
            supported_exchanges: vec![exchange_name.clone()],
            ..Default::default()
        });
        let order_handler = OrderHandler::new(Arc::clone(&storage), manager, validator, Arc::clone(&ids), exchange_name);

        Self {
            ids: Arc::clone(&ids),
            storage,
            order_handler,
            manager_exchange: exchange,
            portfolio_handler: PortfolioHandler::new(ids),
        }
    }

    fn create_portfolio(&self, cash: Decimal) -> Arc<Portfolio> {
        self.portfolio_handler.create_portfolio(self.manager_exchange.name(), cash, PortfolioLimits::default())
    }

    fn apply_fills(&self, fills: Vec<TriggeredFill>, mark_prices: &HashMap<String, Decimal>) -> Vec<Fill> {
        let mut out = Vec::new();
        for triggered in fills {
            let fill = triggered.fill_event.0;
            self.portfolio_handler.process_fill(&fill, mark_prices).expect("fill should apply");
            out.push(fill);
        }
        out
    }

    fn on_bar(&self, bar_event: &BarEvent, portfolio_id: u64) -> Vec<TriggeredFill> {
        self.order_handler.process_orders_on_bar(bar_event, &self.ids, portfolio_id)
    }
}

fn mark(ticker: &str, price: Decimal) -> HashMap<String, Decimal> {
    let mut m = HashMap::new();
    m.insert(ticker.to_string(), price);
    m
}

/// S1 — long round-trip, zero fees.
#[test]
fn s1_long_round_trip_zero_fees() {
    let harness = Harness::new(ExchangeConfig::default_preset());
    let portfolio = harness.create_portfolio(dec!(10000));

    let signal = Signal::new(0, OrderType::Market, "BTCUSDT", Side::Buy, dec!(40), dec!(1), 0, portfolio.portfolio_id)
        .with_stop_loss(dec!(30))
        .with_take_profit(dec!(50));

    let fills = harness.order_handler.on_signal(&signal, &portfolio);
    assert_eq!(fills.len(), 1, "only the MARKET leg should fill immediately");
    harness.apply_fills(fills, &mark("BTCUSDT", dec!(40)));

    assert_eq!(portfolio.cash().balance(), dec!(9960));

    let active = harness.storage.active_orders(portfolio.portfolio_id);
    assert_eq!(active.len(), 2);
    assert!(active.iter().any(|o| o.order_type == OrderType::Stop && o.price == dec!(30) && o.action == Side::Sell));
    assert!(active.iter().any(|o| o.order_type == OrderType::Limit && o.price == dec!(50) && o.action == Side::Sell));

    let position = portfolio.position("BTCUSDT").expect("position should be open");
    assert_eq!(position.quantity, dec!(1));
    assert_eq!(position.avg_price, dec!(40));
}

/// S2 — stop-loss fires on a later bar and OCO cancels the take-profit.
#[test]
fn s2_stop_loss_fires_and_oco_cancels_take_profit() {
    let harness = Harness::new(ExchangeConfig::default_preset());
    let portfolio = harness.create_portfolio(dec!(10000));

    let signal = Signal::new(0, OrderType::Market, "BTCUSDT", Side::Buy, dec!(40), dec!(1), 0, portfolio.portfolio_id)
        .with_stop_loss(dec!(30))
        .with_take_profit(dec!(50));
    let fills = harness.order_handler.on_signal(&signal, &portfolio);
    harness.apply_fills(fills, &mark("BTCUSDT", dec!(40)));

    let bar_event = BarEvent::new(1).insert(Bar::new("BTCUSDT", 1, dec!(20), dec!(20), dec!(20), dec!(20), dec!(1000)));
    let triggered = harness.on_bar(&bar_event, portfolio.portfolio_id);
    assert_eq!(triggered.len(), 1, "only the STOP should trigger");
    assert_eq!(triggered[0].fill_event.0.price, dec!(20), "fill uses the bar close, not the stop price");
    harness.apply_fills(triggered, &mark("BTCUSDT", dec!(20)));

    let active = harness.storage.active_orders(portfolio.portfolio_id);
    assert!(active.is_empty(), "the paired LIMIT must be OCO-cancelled");

    let all = harness.storage.all_orders(portfolio.portfolio_id);
    let limit = all.iter().find(|o| o.order_type == OrderType::Limit).unwrap();
    assert_eq!(limit.status, OrderStatus::Cancelled);

    assert!(portfolio.position("BTCUSDT").is_none(), "the long should be fully closed");
}

/// S3 — short round-trip, stop triggers a buy-to-cover.
#[test]
fn s3_short_round_trip() {
    let harness = Harness::new(ExchangeConfig::default_preset());
    let portfolio = harness.create_portfolio(dec!(1000));

    let signal = Signal::new(0, OrderType::Market, "BTCUSDT", Side::Sell, dec!(40), dec!(1), 0, portfolio.portfolio_id)
        .with_stop_loss(dec!(50))
        .with_take_profit(dec!(20));
    let fills = harness.order_handler.on_signal(&signal, &portfolio);
    harness.apply_fills(fills, &mark("BTCUSDT", dec!(40)));

    let bar_event = BarEvent::new(1).insert(Bar::new("BTCUSDT", 1, dec!(55), dec!(55), dec!(55), dec!(55), dec!(1000)));
    let triggered = harness.on_bar(&bar_event, portfolio.portfolio_id);
    assert_eq!(triggered.len(), 1);
    let realised = harness.apply_fills(triggered, &mark("BTCUSDT", dec!(55)));
    assert_eq!(realised.len(), 1);

    assert!(harness.storage.active_orders(portfolio.portfolio_id).is_empty());
    assert!(portfolio.position("BTCUSDT").is_none());
}

/// S4 — linear slippage keeps the executed price within the configured band.
#[test]
fn s4_slippage_bounds_the_executed_price() {
    let mut preset = ExchangeConfig::realistic_preset();
    preset.failure_simulation.simulate_failures = false;

    let harness = Harness::new(preset);
    let portfolio = harness.create_portfolio(dec!(1_000_000));

    let signal = Signal::new(0, OrderType::Market, "BTCUSDT", Side::Buy, dec!(150), dec!(100), 0, portfolio.portfolio_id);
    let fills = harness.order_handler.on_signal(&signal, &portfolio);
    assert_eq!(fills.len(), 1);
    let fill = &fills[0].fill_event.0;

    assert!(fill.price >= dec!(150) * dec!(0.90));
    assert!(fill.price <= dec!(150) * dec!(1.10));
}

/// S5 — certain failure injection rejects every order, producing no fill.
#[test]
fn s5_failure_injection_rejects_every_order() {
    let mut preset = ExchangeConfig::realistic_preset();
    preset.failure_simulation.simulate_failures = true;
    preset.failure_simulation.failure_rate = 1.0;

    let harness = Harness::new(preset);
    let portfolio = harness.create_portfolio(dec!(10000));

    let signal = Signal::new(0, OrderType::Market, "BTCUSDT", Side::Buy, dec!(40), dec!(1), 0, portfolio.portfolio_id);
    let fills = harness.order_handler.on_signal(&signal, &portfolio);
    assert!(fills.is_empty(), "a certain failure rate must never produce a fill");
}

/// S6 — OCO cancellation is isolated per (ticker, portfolioId).
#[test]
fn s6_oco_is_isolated_across_portfolios() {
    let harness = Harness::new(ExchangeConfig::default_preset());
    let portfolio_a = harness.create_portfolio(dec!(10000));
    let portfolio_b = harness.create_portfolio(dec!(10000));

    for portfolio in [&portfolio_a, &portfolio_b] {
        let signal = Signal::new(0, OrderType::Market, "BTCUSDT", Side::Buy, dec!(40), dec!(1), 0, portfolio.portfolio_id)
            .with_stop_loss(dec!(30))
            .with_take_profit(dec!(50));
        let fills = harness.order_handler.on_signal(&signal, portfolio);
        harness.apply_fills(fills, &mark("BTCUSDT", dec!(40)));
    }

    let bar_event = BarEvent::new(1).insert(Bar::new("BTCUSDT", 1, dec!(20), dec!(20), dec!(20), dec!(20), dec!(1000)));
    let triggered = harness.on_bar(&bar_event, portfolio_a.portfolio_id);
    harness.apply_fills(triggered, &mark("BTCUSDT", dec!(20)));

    assert!(harness.storage.active_orders(portfolio_a.portfolio_id).is_empty());
    assert_eq!(harness.storage.active_orders(portfolio_b.portfolio_id).len(), 2, "portfolio B's OCO pair must be untouched");
}
