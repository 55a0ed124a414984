//! `OrderStorage`: the active/all/archived index trio (SPEC_FULL.md §4.11).
//!
//! A trait at the extension point, with an in-memory implementation as the
//! only backend this spec ships — grounded in
//! `original_source/itrader/execution_handler/order_manager.py`'s three
//! per-portfolio dictionaries.

use std::collections::{BTreeSet, HashMap};

use parking_lot::RwLock;

use crate::core::order::Order;

pub trait OrderStorage: Send + Sync {
    fn insert(&self, order: Order);
    fn get(&self, portfolio_id: u64, order_id: u64) -> Option<Order>;
    fn update(&self, order: Order);
    /// Removes the order from the active index but keeps it in `all` —
    /// this is how OCO cleanup and `MARKET` completion are implemented.
    fn deactivate(&self, portfolio_id: u64, order_id: u64);
    fn active_orders(&self, portfolio_id: u64) -> Vec<Order>;
    fn all_orders(&self, portfolio_id: u64) -> Vec<Order>;
    fn archived_orders(&self, portfolio_id: u64) -> Vec<Order>;
    /// Moves terminal orders created before `cutoff` out of `all` into
    /// `archived`.
    fn archive_orders(&self, portfolio_id: u64, cutoff: i64) -> usize;
}

#[derive(Default)]
struct PortfolioIndex {
    all: HashMap<u64, Order>,
    active: BTreeSet<u64>,
    archived: HashMap<u64, Order>,
}

#[derive(Default)]
pub struct InMemoryOrderStorage {
    portfolios: RwLock<HashMap<u64, PortfolioIndex>>,
}

impl InMemoryOrderStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderStorage for InMemoryOrderStorage {
    fn insert(&self, order: Order) {
        let mut guard = self.portfolios.write();
        let index = guard.entry(order.portfolio_id).or_default();
        if order.is_active() {
            index.active.insert(order.order_id);
        }
        index.all.insert(order.order_id, order);
    }

    fn get(&self, portfolio_id: u64, order_id: u64) -> Option<Order> {
        self.portfolios
            .read()
            .get(&portfolio_id)
            .and_then(|idx| idx.all.get(&order_id).cloned())
    }

    fn update(&self, order: Order) {
        let mut guard = self.portfolios.write();
        let index = guard.entry(order.portfolio_id).or_default();
        if order.is_active() {
            index.active.insert(order.order_id);
        } else {
            index.active.remove(&order.order_id);
        }
        index.all.insert(order.order_id, order);
    }

    fn deactivate(&self, portfolio_id: u64, order_id: u64) {
        if let Some(index) = self.portfolios.write().get_mut(&portfolio_id) {
            index.active.remove(&order_id);
        }
    }

    /// Ascending `orderId` order, matching §4.9's deterministic tie-break.
    fn active_orders(&self, portfolio_id: u64) -> Vec<Order> {
        let guard = self.portfolios.read();
        let Some(index) = guard.get(&portfolio_id) else { return Vec::new() };
        index
            .active
            .iter()
            .filter_map(|id| index.all.get(id).cloned())
            .collect()
    }

    fn all_orders(&self, portfolio_id: u64) -> Vec<Order> {
        self.portfolios
            .read()
            .get(&portfolio_id)
            .map(|idx| idx.all.values().cloned().collect())
            .unwrap_or_default()
    }

    fn archived_orders(&self, portfolio_id: u64) -> Vec<Order> {
        self.portfolios
            .read()
            .get(&portfolio_id)
            .map(|idx| idx.archived.values().cloned().collect())
            .unwrap_or_default()
    }

    fn archive_orders(&self, portfolio_id: u64, cutoff: i64) -> usize {
        let mut guard = self.portfolios.write();
        let Some(index) = guard.get_mut(&portfolio_id) else { return 0 };
        let to_move: Vec<u64> = index
            .all
            .values()
            .filter(|o| o.status.is_terminal() && o.created_at < cutoff)
            .map(|o| o.order_id)
            .collect();
        let count = to_move.len();
        for id in to_move {
            if let Some(order) = index.all.remove(&id) {
                index.archived.insert(id, order);
            }
        }
        count
    }
}
