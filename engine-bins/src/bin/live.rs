//! Live driver: a worker-thread event-processing loop fed by external
//! producer threads, shut down gracefully on SIGINT/SIGTERM.
//!
//! Grounded in SPEC_FULL.md §4.14's live scheduling model: one thread owns
//! the drain loop, external feed/notifier threads only ever enqueue onto
//! the thread-safe global queue, and no strategy code runs concurrently
//! with order/portfolio mutation (the drain loop is the only thread that
//! calls into `StrategyHost`/`OrderHandler`/`PortfolioHandler`).
//!
//! There is no production market-data client in this workspace's
//! dependency stack, so the feed thread here replays the same CSV feed the
//! backtest driver uses, paced at one bar per tick instead of backtest's
//! immediate drain-to-exhaustion — a stand-in for a real streaming
//! exchange client, not a production live connector.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use engine_bins::common::{exchange_config_for_preset, portfolio_limits_from_config, CommonArgs, CsvPriceFeed};
use engine_core::prelude::*;
use engine_core::utils::init_logger;
use engine_strategies::MovingAverageCrossover;
use rust_decimal_macros::dec;

#[derive(Parser, Debug)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// CSV price feed replayed at `--tick-ms` pacing.
    #[arg(long)]
    prices: std::path::PathBuf,

    /// Milliseconds between bars.
    #[arg(long, default_value = "1000")]
    tick_ms: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.common.load_config()?;
    init_logger(&config);

    tracing::info!("starting live driver");

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            tracing::warn!("shutdown signal received");
            running.store(false, Ordering::SeqCst);
        })
        .context("installing signal handler")?;
    }

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

    let notifier: Arc<dyn Notifier> = Arc::new(LoggingNotifier);
    let mut dispatcher = EventDispatcher::new(portfolio_handler, order_handler, strategy_host, notifier, Arc::clone(&ids));
    let sender = dispatcher.sender();

    let feed_running = Arc::clone(&running);
    let feed_sender = sender.clone();
    let prices_path = args.prices.clone();
    let tick_ms = args.tick_ms;
    let feed_thread = std::thread::spawn(move || -> Result<()> {
        let mut feed = CsvPriceFeed::open(&prices_path).with_context(|| format!("loading {}", prices_path.display()))?;
        while feed_running.load(Ordering::SeqCst) {
            let Some(bar_event) = feed.next() else {
                tracing::info!("price feed exhausted");
                feed_running.store(false, Ordering::SeqCst);
                break;
            };
            if feed_sender.send(Event::Bar(bar_event)).is_err() {
                break;
            }
            std::thread::sleep(Duration::from_millis(tick_ms));
        }
        Ok(())
    });

    while running.load(Ordering::SeqCst) {
        dispatcher.drain();
        std::thread::sleep(Duration::from_millis(25));
    }
    dispatcher.drain();

    if let Err(e) = feed_thread.join().expect("feed thread panicked") {
        tracing::error!(error = %e, "price feed thread failed");
    }

    let snapshot = dispatcher.metrics().snapshot();
    tracing::info!(
        bars_processed = snapshot.bars_processed,
        signals = snapshot.signals_processed,
        orders = snapshot.orders_created,
        fills = snapshot.fills_processed,
        "live driver stopped"
    );

    Ok(())
}
