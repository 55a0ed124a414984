//! Result objects exposed by the exchange surface (SPEC_FULL.md §6).

use rust_decimal::Decimal;

use crate::core::errors::ExecutionErrorCode;
use crate::core::types::OrderStatus;

use super::connection::ConnectionState;

#[derive(Debug, Clone, Default)]
pub struct ExecutionResultMetadata {
    pub slippage_pct: Option<f64>,
    pub original_price: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub success: bool,
    pub status: OrderStatus,
    pub order_id: Option<u64>,
    pub executed_price: Option<Decimal>,
    pub executed_quantity: Option<Decimal>,
    pub remaining_quantity: Option<Decimal>,
    pub commission: Option<Decimal>,
    pub execution_time: i64,
    pub error_code: Option<ExecutionErrorCode>,
    pub error_message: Option<String>,
    pub metadata: ExecutionResultMetadata,
}

impl ExecutionResult {
    pub fn rejected(order_id: u64, time: i64, code: ExecutionErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            status: OrderStatus::Rejected,
            order_id: Some(order_id),
            executed_price: None,
            executed_quantity: None,
            remaining_quantity: None,
            commission: None,
            execution_time: time,
            error_code: Some(code),
            error_message: Some(message.into()),
            metadata: ExecutionResultMetadata::default(),
        }
    }

    pub fn failed(order_id: u64, time: i64, code: ExecutionErrorCode, message: impl Into<String>) -> Self {
        // "FAILED" is not a status on the order status machine; exchange
        // failures leave the order PENDING so the caller can retry.
        Self {
            success: false,
            status: OrderStatus::Pending,
            order_id: Some(order_id),
            executed_price: None,
            executed_quantity: None,
            remaining_quantity: None,
            commission: None,
            execution_time: time,
            error_code: Some(code),
            error_message: Some(message.into()),
            metadata: ExecutionResultMetadata::default(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn filled(
        order_id: u64,
        time: i64,
        executed_price: Decimal,
        executed_quantity: Decimal,
        commission: Decimal,
        slippage_pct: f64,
        original_price: Decimal,
    ) -> Self {
        Self {
            success: true,
            status: OrderStatus::Filled,
            order_id: Some(order_id),
            executed_price: Some(executed_price),
            executed_quantity: Some(executed_quantity),
            remaining_quantity: Some(Decimal::ZERO),
            commission: Some(commission),
            execution_time: time,
            error_code: None,
            error_message: None,
            metadata: ExecutionResultMetadata {
                slippage_pct: Some(slippage_pct),
                original_price: Some(original_price),
            },
        }
    }

    pub fn is_fully_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }

    pub fn is_partially_filled(&self) -> bool {
        self.status == OrderStatus::PartiallyFilled
    }

    pub fn total_value(&self) -> Option<Decimal> {
        match (self.executed_price, self.executed_quantity) {
            (Some(p), Some(q)) => Some(p * q),
            _ => None,
        }
    }

    pub fn net_value(&self) -> Option<Decimal> {
        self.total_value()
            .map(|v| v - self.commission.unwrap_or(Decimal::ZERO))
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionResult {
    pub success: bool,
    pub status: ConnectionState,
    pub exchange_name: String,
    pub connection_time: Option<i64>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub exchange_name: String,
    pub connected: bool,
    pub status: ConnectionState,
    pub uptime_seconds: i64,
    pub error_rate: f64,
    pub orders_executed_today: u64,
    pub orders_failed_today: u64,
    pub total_volume_today: Decimal,
}

#[derive(Debug, Clone)]
pub struct ValidationMessage {
    pub level: ValidationLevel,
    pub code: String,
    pub message: String,
    pub field: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationLevel {
    Warning,
    Error,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub messages: Vec<ValidationMessage>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            messages: Vec::new(),
        }
    }

    pub fn with_warning(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.messages.push(ValidationMessage {
            level: ValidationLevel::Warning,
            code: code.into(),
            message: message.into(),
            field: None,
        });
        self
    }

    pub fn fail(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            messages: vec![ValidationMessage {
                level: ValidationLevel::Error,
                code: code.into(),
                message: message.into(),
                field: None,
            }],
        }
    }

    pub fn error_code(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.level == ValidationLevel::Error)
            .map(|m| m.code.as_str())
    }
}
