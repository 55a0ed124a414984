//! Shared setup code for the backtest and live driver binaries.

use std::fs::File;
use std::io::{BufRead, BufReader};

use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal::Decimal;

use engine_core::core::event::BarEvent;
use engine_core::core::types::Bar;
use engine_core::prelude::*;

/// CLI arguments shared by both drivers: an `EngineConfig` file and an
/// initial-cash override, since neither driver has a portfolio-definition
/// file format of its own (SPEC_FULL.md §1c leaves portfolio creation to
/// the embedding application).
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CommonArgs {
    /// Path to an `EngineConfig` JSON file. Missing fields fall back to
    /// defaults; a missing file falls back to the full default config.
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,

    /// Starting cash for the single portfolio this driver creates.
    #[arg(long, default_value = "100000")]
    pub initial_cash: Decimal,
}

impl CommonArgs {
    pub fn load_config(&self) -> Result<EngineConfig> {
        match &self.config {
            Some(path) => EngineConfig::from_file(path).with_context(|| format!("loading engine config from {}", path.display())),
            None => Ok(EngineConfig::default()),
        }
    }
}

pub fn exchange_config_for_preset(name: &str) -> engine_core::exchange::presets::ExchangeConfig {
    match name {
        "realistic" => engine_core::exchange::presets::ExchangeConfig::realistic_preset(),
        "high_fee" => engine_core::exchange::presets::ExchangeConfig::high_fee_preset(),
        "low_latency" => engine_core::exchange::presets::ExchangeConfig::low_latency_preset(),
        _ => engine_core::exchange::presets::ExchangeConfig::default_preset(),
    }
}

pub fn portfolio_limits_from_config(config: &EngineConfig) -> PortfolioLimits {
    PortfolioLimits {
        max_positions: config.portfolio.limits.max_positions,
        max_position_value: config.portfolio.limits.max_position_value,
        max_concentration_pct: config.portfolio.risk_management.max_concentration_pct,
    }
}

/// A restartable CSV-backed `PriceFeed`: `ticker,time,open,high,low,close,volume`
/// rows, one bar per line, grouped into one `BarEvent` per distinct
/// timestamp. Grounded in the historical-OHLCV loading role
/// `original_source/itrader/price_handler/` plays for the backtest path,
/// reduced to a flat file since this workspace has no database/exchange
/// client dependency to fetch historical candles through.
pub struct CsvPriceFeed {
    path: std::path::PathBuf,
    events: std::vec::IntoIter<BarEvent>,
}

impl CsvPriceFeed {
    pub fn open(path: impl Into<std::path::PathBuf>) -> Result<Self> {
        let path = path.into();
        let events = Self::load(&path)?;
        Ok(Self {
            events: events.into_iter(),
            path,
        })
    }

    fn load(path: &std::path::Path) -> Result<Vec<BarEvent>> {
        let file = File::open(path).with_context(|| format!("opening price feed {}", path.display()))?;
        let reader = BufReader::new(file);

        let mut by_time: std::collections::BTreeMap<i64, BarEvent> = std::collections::BTreeMap::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() != 7 {
                anyhow::bail!("{}:{}: expected 7 comma-separated fields, got {}", path.display(), line_no + 1, fields.len());
            }
            let ticker = fields[0].trim().to_string();
            let time: i64 = fields[1].trim().parse().context("parsing bar time")?;
            let open: Decimal = fields[2].trim().parse().context("parsing open")?;
            let high: Decimal = fields[3].trim().parse().context("parsing high")?;
            let low: Decimal = fields[4].trim().parse().context("parsing low")?;
            let close: Decimal = fields[5].trim().parse().context("parsing close")?;
            let volume: Decimal = fields[6].trim().parse().context("parsing volume")?;

            by_time
                .entry(time)
                .or_insert_with(|| BarEvent::new(time))
                .bars
                .insert(ticker.clone(), Bar::new(ticker, time, open, high, low, close, volume));
        }

        Ok(by_time.into_values().collect())
    }
}

impl Iterator for CsvPriceFeed {
    type Item = BarEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.events.next()
    }
}

impl PriceFeed for CsvPriceFeed {
    fn reset(&mut self) {
        if let Ok(events) = Self::load(&self.path) {
            self.events = events.into_iter();
        }
    }
}
