//! Simulated exchange: fee/slippage application, failure injection,
//! validation and connection state (SPEC_FULL.md §4.3).

pub mod connection;
pub mod presets;
pub mod simulated;
pub mod types;

pub use connection::ConnectionState;
pub use simulated::SimulatedExchange;
pub use types::{ConnectionResult, ExecutionResult, HealthStatus, ValidationResult};
