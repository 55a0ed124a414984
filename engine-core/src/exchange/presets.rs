//! Exchange configuration and the four shipped presets (SPEC_FULL.md §6).
//!
//! Grounded in the teacher's `risk/pre_trade.rs::ExchangeRules::lighter_btc_usd()`
//! preset-constructor pattern, generalized from one fixed instrument to the
//! configurable `supported_symbols` list this spec requires.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{FeeModel, SlippageModel};

#[derive(Debug, Clone)]
pub struct FailureSimulation {
    pub simulate_failures: bool,
    pub failure_rate: f64,
}

impl Default for FailureSimulation {
    fn default() -> Self {
        Self {
            simulate_failures: false,
            failure_rate: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExchangeLimits {
    pub min_order_size: Decimal,
    pub max_order_size: Decimal,
    pub supported_symbols: Vec<String>,
    pub max_price: Decimal,
}

impl Default for ExchangeLimits {
    fn default() -> Self {
        Self {
            min_order_size: dec!(0.0001),
            max_order_size: dec!(1_000_000),
            supported_symbols: vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()],
            max_price: dec!(1_000_000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub auto_connect: bool,
    pub connection_timeout_ms: u64,
    pub retry_attempts: u32,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            auto_connect: true,
            connection_timeout_ms: 5_000,
            retry_attempts: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub name: String,
    pub fee_model: FeeModel,
    pub slippage_model: SlippageModel,
    pub limits: ExchangeLimits,
    pub failure_simulation: FailureSimulation,
    pub connection: ConnectionSettings,
}

impl ExchangeConfig {
    /// Zero fees, zero slippage, no injected failures.
    pub fn default_preset() -> Self {
        Self {
            name: "default".to_string(),
            fee_model: FeeModel::Zero,
            slippage_model: SlippageModel::Zero,
            limits: ExchangeLimits::default(),
            failure_simulation: FailureSimulation::default(),
            connection: ConnectionSettings::default(),
        }
    }

    /// 0.1% percent fee, linear slippage (base 1%, size factor 1e-5, max 10%),
    /// 1% injected failure rate.
    pub fn realistic_preset() -> Self {
        Self {
            name: "realistic".to_string(),
            fee_model: FeeModel::percent(dec!(0.001)),
            slippage_model: SlippageModel::Linear {
                base_pct: 1.0,
                size_factor: 1e-5,
                max_pct: 10.0,
            },
            limits: ExchangeLimits::default(),
            failure_simulation: FailureSimulation {
                simulate_failures: true,
                failure_rate: 0.01,
            },
            connection: ConnectionSettings::default(),
        }
    }

    /// Maker/taker 0.8%/1.0%, fixed 2% slippage with random variation.
    pub fn high_fee_preset() -> Self {
        Self {
            name: "high_fee".to_string(),
            fee_model: FeeModel::maker_taker(dec!(0.008), dec!(0.01)),
            slippage_model: SlippageModel::Fixed {
                pct: 2.0,
                random_variation: true,
            },
            limits: ExchangeLimits::default(),
            failure_simulation: FailureSimulation::default(),
            connection: ConnectionSettings::default(),
        }
    }

    /// 0.05% percent fee, no slippage, fast reconnect.
    pub fn low_latency_preset() -> Self {
        Self {
            name: "low_latency".to_string(),
            fee_model: FeeModel::percent(dec!(0.0005)),
            slippage_model: SlippageModel::Zero,
            limits: ExchangeLimits::default(),
            failure_simulation: FailureSimulation::default(),
            connection: ConnectionSettings {
                auto_connect: true,
                connection_timeout_ms: 500,
                retry_attempts: 5,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preset_has_no_fees_or_slippage() {
        let cfg = ExchangeConfig::default_preset();
        assert!(matches!(cfg.fee_model, FeeModel::Zero));
        assert!(matches!(cfg.slippage_model, SlippageModel::Zero));
        assert!(!cfg.failure_simulation.simulate_failures);
    }

    #[test]
    fn realistic_preset_matches_spec_values() {
        let cfg = ExchangeConfig::realistic_preset();
        assert!(matches!(cfg.fee_model, FeeModel::Percent { buy_rate, .. } if buy_rate == dec!(0.001)));
        assert!(cfg.failure_simulation.simulate_failures);
        assert_eq!(cfg.failure_simulation.failure_rate, 0.01);
    }
}
