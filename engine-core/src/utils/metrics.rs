//! Engine-wide counters, surfaced by driver binaries at shutdown.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct EngineMetrics {
    bars_processed: AtomicU64,
    signals_processed: AtomicU64,
    orders_created: AtomicU64,
    fills_processed: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_bar(&self) {
        self.bars_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_signal(&self) {
        self.signals_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_order(&self) {
        self.orders_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fill(&self) {
        self.fills_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> EngineMetricsSnapshot {
        EngineMetricsSnapshot {
            bars_processed: self.bars_processed.load(Ordering::Relaxed),
            signals_processed: self.signals_processed.load(Ordering::Relaxed),
            orders_created: self.orders_created.load(Ordering::Relaxed),
            fills_processed: self.fills_processed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineMetricsSnapshot {
    pub bars_processed: u64,
    pub signals_processed: u64,
    pub orders_created: u64,
    pub fills_processed: u64,
}
