//! `Position`: per-ticker accumulation of fills into a LONG/SHORT holding.
//!
//! Averaging and P&L formulas follow `original_source/itrader/instances/
//! position.py`'s `_transact_buy`/`_transact_sell`/`avg_price`/`realised_pnl`
//! properties, translated from the original's `action in {'BOT','SLD'}`
//! single-field model to an explicit LONG/SHORT `PositionSide`, and from
//! floats to `Decimal`. The original keeps `avg_bought`/`buy_commission` as
//! separate accumulators and derives `avg_price = (avg_bought*buy_quantity +
//! buy_commission) / buy_quantity` on read; `avg_price` here folds commission
//! in eagerly on every fill instead (the two are algebraically equivalent —
//! the commission term cancels out of `realised_pnl` either way — but one
//! field is enough state for this engine's single-sided `Position`, which
//! unlike the original never carries both a buy and a sell leg at once).

use rust_decimal::Decimal;

use crate::core::types::{PositionSide, Side};

#[derive(Debug, Clone)]
pub struct Position {
    pub ticker: String,
    pub portfolio_id: u64,
    pub side: PositionSide,
    pub quantity: Decimal,
    pub avg_price: Decimal,
    pub realised_pnl: Decimal,
    opened_at: i64,
}

impl Position {
    fn opening(
        ticker: impl Into<String>,
        portfolio_id: u64,
        side: PositionSide,
        quantity: Decimal,
        price: Decimal,
        commission: Decimal,
        time: i64,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            portfolio_id,
            side,
            quantity,
            avg_price: price + commission / quantity,
            realised_pnl: Decimal::ZERO,
            opened_at: time,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.quantity.is_zero()
    }

    pub fn market_value(&self, market_price: Decimal) -> Decimal {
        match self.side {
            PositionSide::Long => self.quantity * market_price,
            PositionSide::Short => -(self.quantity * market_price),
        }
    }

    pub fn unrealised_pnl(&self, market_price: Decimal) -> Decimal {
        match self.side {
            PositionSide::Long => (market_price - self.avg_price) * self.quantity,
            PositionSide::Short => (self.avg_price - market_price) * self.quantity,
        }
    }

    fn side_for(action: Side) -> PositionSide {
        match action {
            Side::Buy => PositionSide::Long,
            Side::Sell => PositionSide::Short,
        }
    }

    /// Apply one fill to an existing position (or `None` if there was none),
    /// returning the resulting position (`None` if it closed out exactly
    /// flat) and any realised P&L booked by the fill.
    ///
    /// `commission` is the fill's own cost: on a same-direction fill it is
    /// folded into `avg_price` (SPEC_FULL.md's `avgPrice(LONG) = (avgBought ×
    /// buyQuantity + buyCommission) / buyQuantity`, applied incrementally);
    /// on a reducing fill it is subtracted from the realised P&L it books
    /// (SPEC_FULL.md's `realisedPnL` definitions subtract both legs'
    /// commission — the entry leg's share is already embedded in
    /// `avg_price`, so only this fill's own commission needs subtracting
    /// here).
    pub fn apply_fill(
        existing: Option<Position>,
        ticker: &str,
        portfolio_id: u64,
        action: Side,
        quantity: Decimal,
        price: Decimal,
        commission: Decimal,
        time: i64,
    ) -> (Option<Position>, Decimal) {
        let fill_side = Self::side_for(action);
        match existing {
            None => (
                Some(Position::opening(ticker, portfolio_id, fill_side, quantity, price, commission, time)),
                Decimal::ZERO,
            ),
            Some(mut pos) => {
                if pos.side == fill_side {
                    // Same-direction fill: increase size, reweight average price (cost plus this fill's commission).
                    let new_quantity = pos.quantity + quantity;
                    pos.avg_price = (pos.avg_price * pos.quantity + price * quantity + commission) / new_quantity;
                    pos.quantity = new_quantity;
                    (Some(pos), Decimal::ZERO)
                } else if quantity < pos.quantity {
                    // Partial reduction: book realised P&L on the closed slice, keep the rest open.
                    let realised = Self::realised_on_close(pos.side, pos.avg_price, price, quantity, commission);
                    pos.quantity -= quantity;
                    pos.realised_pnl += realised;
                    (Some(pos), realised)
                } else if quantity == pos.quantity {
                    // Exact close: fully flat, no remaining position.
                    let realised = Self::realised_on_close(pos.side, pos.avg_price, price, quantity, commission);
                    (None, realised)
                } else {
                    // Over-fill: close the existing position and flip to the opposite side
                    // with the excess quantity at the fill price. This fill's single commission
                    // covers both legs, so it is split pro rata by quantity between the closed
                    // slice (reduces realised P&L) and the newly opened slice (raises its cost).
                    let closing_commission = commission * pos.quantity / quantity;
                    let opening_commission = commission - closing_commission;
                    let realised = Self::realised_on_close(pos.side, pos.avg_price, price, pos.quantity, closing_commission);
                    let remaining = quantity - pos.quantity;
                    let flipped = Position::opening(ticker, portfolio_id, fill_side, remaining, price, opening_commission, time);
                    (Some(flipped), realised)
                }
            }
        }
    }

    fn realised_on_close(side: PositionSide, avg_price: Decimal, exit_price: Decimal, closed_quantity: Decimal, exit_commission: Decimal) -> Decimal {
        let gross = match side {
            PositionSide::Long => (exit_price - avg_price) * closed_quantity,
            PositionSide::Short => (avg_price - exit_price) * closed_quantity,
        };
        gross - exit_commission
    }
}
