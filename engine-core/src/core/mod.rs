//! Core entities shared across the engine: ids, errors, enums, events and the
//! order/signal/fill/transaction records that flow through the pipeline.

pub mod errors;
pub mod event;
pub mod fill;
pub mod ids;
pub mod order;
pub mod signal;
pub mod transaction;
pub mod types;

pub use errors::{
    CashError, ExecutionErrorCode, ExecutionError, NotFoundError, PortfolioStateError,
    ValidationError,
};
pub use event::Event;
pub use fill::Fill;
pub use ids::IdGenerator;
pub use order::{Order, OrderTransitionError};
pub use signal::Signal;
pub use transaction::Transaction;
pub use types::{Bar, OrderStatus, OrderType, Side};
