//! Execution-price drift, polymorphic over {Zero, Linear, Fixed}.
//!
//! Grounded in `original_source/itrader/execution_handler/slippage_model/*.py`.
//! The slippage *factor* is computed in `f64` (it models literal random
//! noise, not a ledger value, per SPEC_FULL.md §4.2/§9); only the resulting
//! executed price re-enters `Decimal` territory.

use rand::Rng;
use rust_decimal::Decimal;

use crate::core::types::{OrderType, Side};

#[derive(Debug, Clone)]
pub enum SlippageModel {
    Zero,
    Linear {
        base_pct: f64,
        size_factor: f64,
        max_pct: f64,
    },
    Fixed {
        pct: f64,
        random_variation: bool,
    },
}

impl SlippageModel {
    /// `calculateSlippageFactor(qty, price, side, orderType) -> f64`; the
    /// executed price is `price * factor`.
    pub fn calculate_slippage_factor(
        &self,
        qty: Decimal,
        price: Decimal,
        side: Side,
        _order_type: OrderType,
    ) -> f64 {
        let mut rng = rand::thread_rng();
        match self {
            SlippageModel::Zero => 1.0,
            SlippageModel::Linear {
                base_pct,
                size_factor,
                max_pct,
            } => {
                let max_frac = max_pct / 100.0;
                let base_noise = rng.gen_range(-base_pct..=*base_pct) / 100.0;
                let qty_f: f64 = qty.to_string().parse().unwrap_or(0.0);
                let price_f: f64 = price.to_string().parse().unwrap_or(0.0);
                let size_impact = (max_frac).min(qty_f * price_f * size_factor / 100.0);
                let signed = match side {
                    Side::Buy => base_noise + size_impact,
                    Side::Sell => base_noise - size_impact,
                };
                1.0 + signed.clamp(-max_frac, max_frac)
            }
            SlippageModel::Fixed {
                pct,
                random_variation,
            } => {
                if *random_variation {
                    1.0 + rng.gen_range(-pct..=*pct) / 100.0
                } else {
                    match side {
                        Side::Buy => 1.0 + pct / 100.0,
                        Side::Sell => 1.0 - pct / 100.0,
                    }
                }
            }
        }
    }

    /// Applies the slippage factor to `price`, quantizing the result to 2
    /// decimal places with half-up rounding (the cash boundary, per
    /// SPEC_FULL.md §3).
    pub fn apply(
        &self,
        qty: Decimal,
        price: Decimal,
        side: Side,
        order_type: OrderType,
    ) -> Decimal {
        let factor = self.calculate_slippage_factor(qty, price, side, order_type);
        let factor_decimal = Decimal::from_f64_retain(factor).unwrap_or(Decimal::ONE);
        (price * factor_decimal).round_dp_with_strategy(
            2,
            rust_decimal::RoundingStrategy::MidpointAwayFromZero,
        )
    }
}
