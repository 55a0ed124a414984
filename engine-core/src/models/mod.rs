//! Pluggable fee and slippage models (SPEC_FULL.md §4.1, §4.2).

pub mod fee;
pub mod slippage;

pub use fee::FeeModel;
pub use slippage::SlippageModel;
