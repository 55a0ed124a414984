//! Monotonic, thread-safe id allocation per entity kind.
//!
//! Mirrors `original_source/itrader/outils/id_generator.py`: a timestamp
//! component for uniqueness across process restarts, plus a per-kind counter
//! for uniqueness within the same timestamp tick, combined under one lock.
//! The "single synchronized source" requirement of §5 rules out a
//! thread-local counter here (unlike the teacher's HFT-path `OrderId`).

use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

#[derive(Debug, Default)]
struct Counters {
    order: u64,
    transaction: u64,
    portfolio: u64,
    position: u64,
    last_timestamp_micros: i64,
}

/// Allocates unique integer ids for orders, transactions, portfolios and
/// positions from a single synchronized source, as required by §5.
#[derive(Debug)]
pub struct IdGenerator {
    inner: Mutex<Counters>,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Counters::default()),
        }
    }

    fn next(kind_prefix: u64, counter: &mut u64, last_timestamp: &mut i64, now_micros: i64) -> u64 {
        if now_micros == *last_timestamp {
            *counter += 1;
        } else {
            *counter = 1;
            *last_timestamp = now_micros;
        }
        kind_prefix * 10_u64.pow(16) + (now_micros.unsigned_abs() % 10_u64.pow(13)) * 1000 + *counter
    }

    fn now_micros() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as i64)
            .unwrap_or(0)
    }

    pub fn next_order_id(&self) -> u64 {
        let now = Self::now_micros();
        let mut g = self.inner.lock();
        let Counters { order, last_timestamp_micros, .. } = &mut *g;
        Self::next(4, order, last_timestamp_micros, now)
    }

    pub fn next_transaction_id(&self) -> u64 {
        let now = Self::now_micros();
        let mut g = self.inner.lock();
        let Counters { transaction, last_timestamp_micros, .. } = &mut *g;
        Self::next(1, transaction, last_timestamp_micros, now)
    }

    pub fn next_portfolio_id(&self) -> u64 {
        let now = Self::now_micros();
        let mut g = self.inner.lock();
        let Counters { portfolio, last_timestamp_micros, .. } = &mut *g;
        Self::next(2, portfolio, last_timestamp_micros, now)
    }

    pub fn next_position_id(&self) -> u64 {
        let now = Self::now_micros();
        let mut g = self.inner.lock();
        let Counters { position, last_timestamp_micros, .. } = &mut *g;
        Self::next(3, position, last_timestamp_micros, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_within_same_kind() {
        let gen = IdGenerator::new();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            assert!(seen.insert(gen.next_order_id()));
        }
    }

    #[test]
    fn different_kinds_never_collide() {
        let gen = IdGenerator::new();
        let order = gen.next_order_id();
        let txn = gen.next_transaction_id();
        let portfolio = gen.next_portfolio_id();
        let position = gen.next_position_id();
        let ids = [order, txn, portfolio, position];
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn concurrent_allocation_stays_unique() {
        use std::sync::Arc;
        let gen = Arc::new(IdGenerator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gen = Arc::clone(&gen);
                std::thread::spawn(move || {
                    (0..200).map(|_| gen.next_order_id()).collect::<Vec<_>>()
                })
            })
            .collect();
        let mut all = Vec::new();
        for h in handles {
            all.extend(h.join().unwrap());
        }
        let unique: std::collections::HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), all.len());
    }
}
