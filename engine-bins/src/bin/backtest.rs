//! Backtest driver: drives a `PriceFeed` to exhaustion, draining the
//! global event queue in canonical order after every bar.
//!
//! Mirrors `original_source/itrader/engine/event_driven.py`'s synchronous
//! "pull a bar, drain the queue, pull the next bar" backtest loop
//! (SPEC_FULL.md §4.14's scheduling model: strictly single-threaded
//! cooperative in the backtest path).

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use engine_bins::common::{exchange_config_for_preset, portfolio_limits_from_config, CommonArgs, CsvPriceFeed};
use engine_core::prelude::*;
use engine_core::utils::init_logger;
use engine_strategies::{MovingAverageCrossover, ZScorePairsReversion};
use rust_decimal_macros::dec;

#[derive(Parser, Debug)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// CSV price feed: `ticker,time,open,high,low,close,volume` lines.
    #[arg(long)]
    prices: std::path::PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.common.load_config()?;
    init_logger(&config);

    tracing::info!("starting backtest driver");

    let ids = Arc::new(IdGenerator::new());
    let storage: Arc<dyn OrderStorage> = Arc::new(InMemoryOrderStorage::new());
    let exchange = Arc::new(SimulatedExchange::new(exchange_config_for_preset(&config.exchange_preset)));
    exchange.connect(0);

    let manager = OrderManager::new(Arc::clone(&storage), Arc::clone(&exchange), MarketExecution::Immediate);
    let validator = OrderValidator::new(ValidationConfig {
        supported_exchanges: vec![exchange.name()],
        ..Default::default()
    });
    let order_handler = Arc::new(OrderHandler::new(storage, manager, validator, Arc::clone(&ids), exchange.name()));

    let portfolio_handler = Arc::new(PortfolioHandler::new(Arc::clone(&ids)));
    let portfolio = portfolio_handler.create_portfolio(exchange.name(), args.common.initial_cash, portfolio_limits_from_config(&config));
    tracing::info!(portfolio_id = portfolio.portfolio_id, cash = %args.common.initial_cash, "portfolio created");

    let strategy_host = Arc::new(StrategyHost::new());
    strategy_host.register(
        1,
        portfolio.portfolio_id,
        Box::new(MovingAverageCrossover::new("BTCUSDT", 10, 30, dec!(0.1), dec!(0.05), dec!(0.1))),
    );
    strategy_host.register(
        2,
        portfolio.portfolio_id,
        Box::new(ZScorePairsReversion::new("BTCUSDT", "ETHUSDT", dec!(1), 20, 2.0, 0.5, dec!(0.1))),
    );

    let notifier: Arc<dyn Notifier> = Arc::new(LoggingNotifier);
    let mut dispatcher = EventDispatcher::new(portfolio_handler, order_handler, strategy_host, notifier, Arc::clone(&ids));

    let mut feed = CsvPriceFeed::open(&args.prices).with_context(|| format!("loading {}", args.prices.display()))?;
    let sender = dispatcher.sender();

    let mut bars_fed = 0u64;
    while let Some(bar_event) = feed.next() {
        bars_fed += 1;
        sender.send(Event::Bar(bar_event)).expect("dispatcher channel closed");
        dispatcher.drain();
    }

    let snapshot = dispatcher.metrics().snapshot();
    tracing::info!(
        bars_fed,
        bars_processed = snapshot.bars_processed,
        signals = snapshot.signals_processed,
        orders = snapshot.orders_created,
        fills = snapshot.fills_processed,
        "backtest complete"
    );

    Ok(())
}
