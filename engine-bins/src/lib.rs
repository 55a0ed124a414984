//! Shared driver plumbing for the backtest and live binaries.

pub mod common;
