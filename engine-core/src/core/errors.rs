//! Error taxonomy for the engine.
//!
//! Each tagged kind from the error-handling design is its own small type with
//! a hand-written `Display` and `std::error::Error` impl, following the
//! existing convention in this workspace rather than deriving with
//! `thiserror`. Library call sites return the most specific error their
//! subsystem can produce; binaries unify everything through `anyhow`.

use std::fmt;

use rust_decimal::Decimal;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub value: Option<String>,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: None,
            message: message.into(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation error for '{}'", self.field)?;
        if let Some(value) = &self.value {
            write!(f, " with value '{}'", value)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Cash-ledger failures: insufficient funds or a malformed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CashError {
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },
    InvalidTransaction {
        reason: String,
    },
}

impl fmt::Display for CashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CashError::InsufficientFunds {
                required,
                available,
            } => write!(
                f,
                "insufficient funds: required {:.2}, available {:.2}",
                required, available
            ),
            CashError::InvalidTransaction { reason } => {
                write!(f, "invalid transaction: {}", reason)
            }
        }
    }
}

impl std::error::Error for CashError {}

/// An operation was attempted from a state that does not permit it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioStateError {
    pub portfolio_id: u64,
    pub current_state: String,
    pub operation: String,
}

impl fmt::Display for PortfolioStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "portfolio {} is in state '{}' but operation '{}' is not allowed",
            self.portfolio_id, self.current_state, self.operation
        )
    }
}

impl std::error::Error for PortfolioStateError {}

/// An entity (portfolio, order, exchange) could not be located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFoundError {
    pub entity_type: &'static str,
    pub identifier: String,
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} not found: {}", self.entity_type, self.identifier)
    }
}

impl std::error::Error for NotFoundError {}

/// Execution-layer error codes, surfaced on `ExecutionResult.errorCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionErrorCode {
    NetworkError,
    ExchangeError,
    RateLimitExceeded,
    ExchangeMaintenance,
    SymbolNotFound,
    OrderSizeTooSmall,
    OrderSizeTooLarge,
    InvalidPrice,
    Timeout,
    MarketClosed,
    InsufficientFunds,
    AuthenticationError,
    PermissionDenied,
    InvalidOrder,
}

impl fmt::Display for ExecutionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionErrorCode::NetworkError => "NETWORK_ERROR",
            ExecutionErrorCode::ExchangeError => "EXCHANGE_ERROR",
            ExecutionErrorCode::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ExecutionErrorCode::ExchangeMaintenance => "EXCHANGE_MAINTENANCE",
            ExecutionErrorCode::SymbolNotFound => "SYMBOL_NOT_FOUND",
            ExecutionErrorCode::OrderSizeTooSmall => "ORDER_SIZE_TOO_SMALL",
            ExecutionErrorCode::OrderSizeTooLarge => "ORDER_SIZE_TOO_LARGE",
            ExecutionErrorCode::InvalidPrice => "INVALID_PRICE",
            ExecutionErrorCode::Timeout => "TIMEOUT",
            ExecutionErrorCode::MarketClosed => "MARKET_CLOSED",
            ExecutionErrorCode::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ExecutionErrorCode::AuthenticationError => "AUTHENTICATION_ERROR",
            ExecutionErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ExecutionErrorCode::InvalidOrder => "INVALID_ORDER",
        };
        f.write_str(s)
    }
}

/// An execution-layer failure, carrying one of the error codes above.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionError {
    pub code: ExecutionErrorCode,
    pub message: String,
}

impl ExecutionError {
    pub fn new(code: ExecutionErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ExecutionError {}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn cash_error_display_includes_amounts() {
        let err = CashError::InsufficientFunds {
            required: dec!(100.00),
            available: dec!(40.50),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("100.00"));
        assert!(msg.contains("40.50"));
    }

    #[test]
    fn execution_error_code_display_matches_taxonomy() {
        assert_eq!(ExecutionErrorCode::NetworkError.to_string(), "NETWORK_ERROR");
        assert_eq!(
            ExecutionErrorCode::RateLimitExceeded.to_string(),
            "RATE_LIMIT_EXCEEDED"
        );
    }

    #[test]
    fn validation_error_with_value_renders() {
        let err = ValidationError::new("price", "must be positive").with_value("-5");
        let msg = format!("{}", err);
        assert!(msg.contains("price"));
        assert!(msg.contains("-5"));
    }
}
