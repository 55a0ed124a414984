//! `Order`: a validated, persistent commitment to trade at the exchange.
//!
//! The status machine is checked at runtime via [`Order::transition_to`]
//! rather than encoded as a typestate wrapper type (see DESIGN.md and
//! SPEC_FULL.md §9): orders must live inside `OrderStorage`'s index maps,
//! which requires them to be mutable in place.

use std::fmt;

use rust_decimal::Decimal;

use super::types::{OrderStatus, OrderType, Side};

/// A single recorded transition, kept for audit alongside the order.
#[derive(Debug, Clone)]
pub struct StateChange {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub time: i64,
    pub reason: Option<String>,
}

/// Rejected attempt to move an order to a new status, or to fill past its
/// remaining quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderTransitionError {
    /// The requested transition is not reachable from the order's current status.
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
    },
    /// An order already in a terminal status cannot transition further.
    AlreadyTerminal(OrderStatus),
    /// A fill of zero quantity was attempted.
    ZeroQuantity,
    /// A fill at zero or negative price was attempted.
    NonPositivePrice,
    /// A fill would push `filledQuantity` past `quantity`.
    ExceedsRemaining {
        fill_qty: Decimal,
        remaining_qty: Decimal,
    },
}

impl fmt::Display for OrderTransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderTransitionError::InvalidTransition { from, to } => {
                write!(f, "cannot transition order from {} to {}", from, to)
            }
            OrderTransitionError::AlreadyTerminal(status) => {
                write!(f, "order is already in terminal status {}", status)
            }
            OrderTransitionError::ZeroQuantity => write!(f, "fill quantity must be positive"),
            OrderTransitionError::NonPositivePrice => write!(f, "fill price must be positive"),
            OrderTransitionError::ExceedsRemaining {
                fill_qty,
                remaining_qty,
            } => write!(
                f,
                "fill quantity {} exceeds remaining order quantity {}",
                fill_qty, remaining_qty
            ),
        }
    }
}

impl std::error::Error for OrderTransitionError {}

#[derive(Debug, Clone)]
pub struct Order {
    pub order_id: u64,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub ticker: String,
    pub action: Side,
    pub price: Decimal,
    pub quantity: Decimal,
    pub filled_quantity: Decimal,
    pub exchange: String,
    pub strategy_id: u64,
    pub portfolio_id: u64,
    pub created_at: i64,
    pub expiration_time: Option<i64>,
    pub modification_count: u32,
    pub last_modification_time: Option<i64>,
    pub rejection_reason: Option<String>,
    pub state_changes: Vec<StateChange>,
    /// Whether this order is the stop/take-profit leg of an OCO pair, as
    /// opposed to the main signal-driven order.
    pub oco_linked: bool,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_id: u64,
        order_type: OrderType,
        ticker: impl Into<String>,
        action: Side,
        price: Decimal,
        quantity: Decimal,
        exchange: impl Into<String>,
        strategy_id: u64,
        portfolio_id: u64,
        created_at: i64,
    ) -> Self {
        Self {
            order_id,
            order_type,
            status: OrderStatus::Pending,
            ticker: ticker.into(),
            action,
            price,
            quantity,
            filled_quantity: Decimal::ZERO,
            exchange: exchange.into(),
            strategy_id,
            portfolio_id,
            created_at,
            expiration_time: None,
            modification_count: 0,
            last_modification_time: None,
            rejection_reason: None,
            state_changes: Vec::new(),
            oco_linked: false,
        }
    }

    pub fn remaining_quantity(&self) -> Decimal {
        self.quantity - self.filled_quantity
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    fn reachable(from: OrderStatus, to: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (from, to),
            (Pending, PartiallyFilled)
                | (Pending, Filled)
                | (Pending, Cancelled)
                | (Pending, Rejected)
                | (Pending, Expired)
                | (PartiallyFilled, Filled)
                | (PartiallyFilled, Cancelled)
                | (PartiallyFilled, Expired)
        )
    }

    /// Validated transition; rejects anything not on the status machine of
    /// SPEC_FULL.md §3 and never mutates on failure.
    pub fn transition_to(
        &mut self,
        to: OrderStatus,
        time: i64,
        reason: Option<String>,
    ) -> Result<(), OrderTransitionError> {
        if self.status.is_terminal() {
            return Err(OrderTransitionError::AlreadyTerminal(self.status));
        }
        if !Self::reachable(self.status, to) {
            return Err(OrderTransitionError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.state_changes.push(StateChange {
            from: self.status,
            to,
            time,
            reason,
        });
        self.status = to;
        Ok(())
    }

    /// Apply a fill of `fill_qty` at `fill_price`, moving the order to
    /// `PartiallyFilled` or `Filled` as appropriate. Leaves the order
    /// untouched on validation failure.
    pub fn apply_fill(
        &mut self,
        fill_qty: Decimal,
        time: i64,
    ) -> Result<(), OrderTransitionError> {
        if self.status.is_terminal() {
            return Err(OrderTransitionError::AlreadyTerminal(self.status));
        }
        if fill_qty <= Decimal::ZERO {
            return Err(OrderTransitionError::ZeroQuantity);
        }
        let remaining = self.remaining_quantity();
        if fill_qty > remaining {
            return Err(OrderTransitionError::ExceedsRemaining {
                fill_qty,
                remaining_qty: remaining,
            });
        }
        self.filled_quantity += fill_qty;
        let new_status = if self.filled_quantity == self.quantity {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.transition_to(new_status, time, None)
    }
}
