//! `EngineConfig`: the serde-based runtime configuration surface
//! (SPEC_FULL.md §1c, §6), replacing the teacher's compile-time
//! Cargo-feature configuration pattern with a config file/env-loadable
//! struct, in the style the other example repos use for runtime config.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioLimitsConfig {
    pub max_positions: usize,
    pub max_position_value: Decimal,
}

impl Default for PortfolioLimitsConfig {
    fn default() -> Self {
        Self {
            max_positions: 50,
            max_position_value: Decimal::from(1_000_000),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskManagementConfig {
    pub max_concentration_pct: f64,
    pub max_daily_loss_pct: f64,
    pub max_drawdown_pct: f64,
}

impl Default for RiskManagementConfig {
    fn default() -> Self {
        Self {
            max_concentration_pct: 0.25,
            max_daily_loss_pct: 0.05,
            max_drawdown_pct: 0.20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingRulesConfig {
    pub max_transactions_per_day: u32,
    pub max_cash_withdrawal_pct: f64,
}

impl Default for TradingRulesConfig {
    fn default() -> Self {
        Self {
            max_transactions_per_day: 10_000,
            max_cash_withdrawal_pct: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfigSection {
    pub validate_transactions: bool,
    pub require_sufficient_funds: bool,
}

impl Default for ValidationConfigSection {
    fn default() -> Self {
        Self {
            validate_transactions: true,
            require_sufficient_funds: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub publish_update_events: bool,
    pub publish_error_events: bool,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            publish_update_events: true,
            publish_error_events: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    pub limits: PortfolioLimitsConfig,
    pub risk_management: RiskManagementConfig,
    pub trading_rules: TradingRulesConfig,
    pub validation: ValidationConfigSection,
    pub events: EventsConfig,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            limits: PortfolioLimitsConfig::default(),
            risk_management: RiskManagementConfig::default(),
            trading_rules: TradingRulesConfig::default(),
            validation: ValidationConfigSection::default(),
            events: EventsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub log_level: String,
    pub json_logs: bool,
    pub exchange_preset: String,
    pub portfolio: PortfolioConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            exchange_preset: "default".to_string(),
            portfolio: PortfolioConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Loads from a JSON config file, falling back to defaults for any
    /// field missing from the file (every section carries `#[serde(default)]`).
    pub fn from_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_json() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.log_level, config.log_level);
        assert_eq!(parsed.portfolio.limits.max_positions, config.portfolio.limits.max_positions);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let parsed: EngineConfig = serde_json::from_str(r#"{"log_level": "debug"}"#).unwrap();
        assert_eq!(parsed.log_level, "debug");
        assert_eq!(parsed.portfolio.limits.max_positions, 50);
    }
}
