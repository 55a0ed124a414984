//! Commission calculation, polymorphic over {Zero, Percent, MakerTaker, Tiered}.
//!
//! Grounded in `original_source/itrader/execution_handler/fee_model/*.py`.
//! Modeled as a capability enum rather than a virtual-inheritance hierarchy,
//! per SPEC_FULL.md §9.

use rust_decimal::Decimal;

use crate::core::errors::ValidationError;
use crate::core::types::{OrderType, Side};

/// One volume tier of a `Tiered` fee schedule: active once cumulative 30-day
/// volume reaches `volume_threshold`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeTier {
    pub volume_threshold: Decimal,
    pub maker_rate: Decimal,
    pub taker_rate: Decimal,
}

#[derive(Debug, Clone)]
pub enum FeeModel {
    Zero,
    Percent {
        buy_rate: Decimal,
        sell_rate: Decimal,
    },
    MakerTaker {
        maker_rate: Decimal,
        taker_rate: Decimal,
    },
    Tiered {
        tiers: Vec<FeeTier>,
        cumulative_volume: Decimal,
    },
}

impl FeeModel {
    pub fn percent(rate: Decimal) -> Self {
        FeeModel::Percent {
            buy_rate: rate,
            sell_rate: rate,
        }
    }

    pub fn maker_taker(maker_rate: Decimal, taker_rate: Decimal) -> Self {
        FeeModel::MakerTaker {
            maker_rate,
            taker_rate,
        }
    }

    /// Constructs a `Tiered` model; rejects an empty tier list or a first
    /// tier whose threshold is not zero, per SPEC_FULL.md §4.1.
    pub fn tiered(tiers: Vec<FeeTier>) -> Result<Self, ValidationError> {
        match tiers.first() {
            None => Err(ValidationError::new("tiers", "tier list must not be empty")),
            Some(first) if first.volume_threshold != Decimal::ZERO => Err(ValidationError::new(
                "tiers",
                "first tier threshold must be zero",
            )),
            Some(_) => Ok(FeeModel::Tiered {
                tiers,
                cumulative_volume: Decimal::ZERO,
            }),
        }
    }

    fn active_tier(tiers: &[FeeTier], cumulative_volume: Decimal) -> &FeeTier {
        tiers
            .iter()
            .rev()
            .find(|t| cumulative_volume >= t.volume_threshold)
            .unwrap_or(&tiers[0])
    }

    /// `calculateFee(qty, price, side, orderType, isMakerOverride) -> Decimal >= 0`.
    pub fn calculate_fee(
        &self,
        qty: Decimal,
        price: Decimal,
        side: Side,
        order_type: OrderType,
        is_maker_override: Option<bool>,
    ) -> Result<Decimal, ValidationError> {
        if qty <= Decimal::ZERO {
            return Err(ValidationError::new("quantity", "must be positive"));
        }
        if price <= Decimal::ZERO {
            return Err(ValidationError::new("price", "must be positive"));
        }
        let trade_value = qty * price;
        let fee = match self {
            FeeModel::Zero => Decimal::ZERO,
            FeeModel::Percent { buy_rate, sell_rate } => {
                let rate = match side {
                    Side::Buy => *buy_rate,
                    Side::Sell => *sell_rate,
                };
                trade_value * rate
            }
            FeeModel::MakerTaker {
                maker_rate,
                taker_rate,
            } => {
                let is_maker = is_maker_override.unwrap_or(matches!(order_type, OrderType::Limit));
                let rate = if is_maker { *maker_rate } else { *taker_rate };
                trade_value * rate
            }
            FeeModel::Tiered {
                tiers,
                cumulative_volume,
            } => {
                let is_maker = is_maker_override.unwrap_or(matches!(order_type, OrderType::Limit));
                let tier = Self::active_tier(tiers, *cumulative_volume);
                let rate = if is_maker { tier.maker_rate } else { tier.taker_rate };
                trade_value * rate
            }
        };
        Ok(fee)
    }

    /// Mutators on the `Tiered` variant's rolling 30-day volume; no-ops on
    /// every other variant.
    pub fn update_volume(&mut self, total: Decimal) {
        if let FeeModel::Tiered {
            cumulative_volume, ..
        } = self
        {
            *cumulative_volume = total;
        }
    }

    pub fn add_to_volume(&mut self, delta: Decimal) {
        if let FeeModel::Tiered {
            cumulative_volume, ..
        } = self
        {
            *cumulative_volume += delta;
        }
    }

    pub fn reset_volume(&mut self) {
        if let FeeModel::Tiered {
            cumulative_volume, ..
        } = self
        {
            *cumulative_volume = Decimal::ZERO;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn zero_model_always_zero() {
        let model = FeeModel::Zero;
        let fee = model
            .calculate_fee(dec!(10), dec!(100), Side::Buy, OrderType::Market, None)
            .unwrap();
        assert_eq!(fee, Decimal::ZERO);
    }

    #[test]
    fn percent_model_uses_trade_value() {
        let model = FeeModel::percent(dec!(0.001));
        let fee = model
            .calculate_fee(dec!(100), dec!(150), Side::Buy, OrderType::Market, None)
            .unwrap();
        assert_eq!(fee, dec!(15.000));
    }

    #[test]
    fn maker_taker_derives_from_order_type() {
        let model = FeeModel::maker_taker(dec!(0.008), dec!(0.01));
        let maker_fee = model
            .calculate_fee(dec!(10), dec!(100), Side::Buy, OrderType::Limit, None)
            .unwrap();
        let taker_fee = model
            .calculate_fee(dec!(10), dec!(100), Side::Buy, OrderType::Market, None)
            .unwrap();
        assert_eq!(maker_fee, dec!(8.000));
        assert_eq!(taker_fee, dec!(10.00));
    }

    #[test]
    fn maker_taker_override_wins_over_order_type() {
        let model = FeeModel::maker_taker(dec!(0.008), dec!(0.01));
        let fee = model
            .calculate_fee(dec!(10), dec!(100), Side::Buy, OrderType::Limit, Some(false))
            .unwrap();
        assert_eq!(fee, dec!(10.00));
    }

    #[test]
    fn tiered_rejects_empty_tiers() {
        assert!(FeeModel::tiered(vec![]).is_err());
    }

    #[test]
    fn tiered_rejects_nonzero_first_threshold() {
        let tiers = vec![FeeTier {
            volume_threshold: dec!(100),
            maker_rate: dec!(0.001),
            taker_rate: dec!(0.002),
        }];
        assert!(FeeModel::tiered(tiers).is_err());
    }

    #[test]
    fn tiered_selects_tier_by_cumulative_volume() {
        let tiers = vec![
            FeeTier {
                volume_threshold: dec!(0),
                maker_rate: dec!(0.001),
                taker_rate: dec!(0.002),
            },
            FeeTier {
                volume_threshold: dec!(1_000_000),
                maker_rate: dec!(0.0005),
                taker_rate: dec!(0.001),
            },
        ];
        let mut model = FeeModel::tiered(tiers).unwrap();
        model.update_volume(dec!(2_000_000));
        let fee = model
            .calculate_fee(dec!(10), dec!(100), Side::Buy, OrderType::Market, None)
            .unwrap();
        assert_eq!(fee, dec!(1.000));
    }

    #[test]
    fn non_positive_qty_or_price_rejected() {
        let model = FeeModel::Zero;
        assert!(model
            .calculate_fee(dec!(0), dec!(10), Side::Buy, OrderType::Market, None)
            .is_err());
        assert!(model
            .calculate_fee(dec!(10), dec!(0), Side::Buy, OrderType::Market, None)
            .is_err());
    }
}
