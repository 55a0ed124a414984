//! `EventDispatcher`: drains the global event queue in canonical order
//! (SPEC_FULL.md §4.13): `PING → BAR → SCREENER → SIGNAL → ORDER → FILL → UPDATE`.
//!
//! The external ingress is the workspace's `crossbeam::channel` (unbounded
//! MPSC, per §5); events produced while processing a bar (signals, orders,
//! fills, updates) are buffered in an internal priority queue so they drain
//! in canonical order within the same cycle before the next BAR is pulled.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;

use crossbeam::channel::{Receiver, Sender};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::core::event::Event;
use crate::core::ids::IdGenerator;
use crate::orders::OrderHandler;
use crate::portfolio::PortfolioHandler;
use crate::utils::metrics::EngineMetrics;

use super::notifier::Notifier;
use super::strategy_host::StrategyHost;

struct QueueEntry {
    sequence: u64,
    event: Event,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.event.priority() == other.event.priority() && self.sequence == other.sequence
    }
}
impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    /// Min-heap on `(priority, sequence)`: lower priority rank drains
    /// first; ties broken by insertion order so same-priority events stay
    /// FIFO (orders within a bar fire in ascending orderId order upstream,
    /// not via this tie-break).
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        Reverse((self.event.priority(), self.sequence)).cmp(&Reverse((other.event.priority(), other.sequence)))
    }
}

pub struct EventDispatcher {
    sender: Sender<Event>,
    receiver: Receiver<Event>,
    portfolio_handler: Arc<PortfolioHandler>,
    order_handler: Arc<OrderHandler>,
    strategy_host: Arc<StrategyHost>,
    notifier: Arc<dyn Notifier>,
    ids: Arc<IdGenerator>,
    mark_prices: HashMap<String, Decimal>,
    sequence: u64,
    metrics: EngineMetrics,
}

impl EventDispatcher {
    pub fn new(
        portfolio_handler: Arc<PortfolioHandler>,
        order_handler: Arc<OrderHandler>,
        strategy_host: Arc<StrategyHost>,
        notifier: Arc<dyn Notifier>,
        ids: Arc<IdGenerator>,
    ) -> Self {
        let (sender, receiver) = crossbeam::channel::unbounded();
        Self {
            sender,
            receiver,
            portfolio_handler,
            order_handler,
            strategy_host,
            notifier,
            ids,
            mark_prices: HashMap::new(),
            sequence: 0,
            metrics: EngineMetrics::new(),
        }
    }

    /// Clone of the ingress sender, handed to feed/notifier threads in the
    /// live path.
    pub fn sender(&self) -> Sender<Event> {
        self.sender.clone()
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    fn enqueue(heap: &mut BinaryHeap<QueueEntry>, sequence: &mut u64, event: Event) {
        *sequence += 1;
        heap.push(QueueEntry {
            sequence: *sequence,
            event,
        });
    }

    /// Drains everything currently queued (external channel plus anything
    /// generated while processing) to completion, in canonical order.
    pub fn drain(&mut self) {
        let mut heap = BinaryHeap::new();
        while let Ok(event) = self.receiver.try_recv() {
            Self::enqueue(&mut heap, &mut self.sequence, event);
        }

        while let Some(entry) = heap.pop() {
            let produced = self.handle(entry.event);
            for event in produced {
                Self::enqueue(&mut heap, &mut self.sequence, event);
            }
        }
    }

    fn handle(&mut self, event: Event) -> Vec<Event> {
        match event {
            Event::Ping(_) => Vec::new(),
            Event::Bar(bar_event) => self.handle_bar(bar_event),
            Event::Screener(screener_event) => {
                debug!(tickers = ?screener_event.tickers, "screener update (no-op: screening is a strategy concern)");
                Vec::new()
            }
            Event::Signal(signal_event) => self.handle_signal(signal_event.0),
            Event::Order(_order_event) => Vec::new(),
            Event::Fill(fill_event) => self.handle_fill(fill_event.0),
            Event::Update(update_event) => {
                self.notifier.send(&format!(
                    "portfolio {} equity={} cash={} positions={}",
                    update_event.portfolio_id, update_event.total_equity, update_event.available_cash, update_event.open_positions
                ));
                Vec::new()
            }
        }
    }

    fn handle_bar(&mut self, bar_event: crate::core::event::BarEvent) -> Vec<Event> {
        self.metrics.record_bar();
        for bar in bar_event.bars.values() {
            self.mark_prices.insert(bar.ticker.clone(), bar.close);
        }

        let mut produced = Vec::new();
        for portfolio_id in self.portfolio_handler.portfolio_ids() {
            for triggered in self.order_handler.process_orders_on_bar(&bar_event, &self.ids, portfolio_id) {
                self.metrics.record_order();
                self.metrics.record_fill();
                produced.push(Event::Order(triggered.order_event));
                produced.push(Event::Fill(triggered.fill_event));
            }
        }

        for signal in self.strategy_host.on_bar(&bar_event) {
            self.metrics.record_signal();
            produced.push(Event::Signal(crate::core::event::SignalEvent(signal)));
        }

        produced
    }

    fn handle_signal(&mut self, signal: crate::core::signal::Signal) -> Vec<Event> {
        let Some(portfolio) = self.portfolio_handler.get(signal.portfolio_id) else {
            warn!(portfolio_id = signal.portfolio_id, "signal references unknown portfolio");
            return Vec::new();
        };
        self.order_handler
            .on_signal(&signal, &portfolio)
            .into_iter()
            .flat_map(|triggered| {
                self.metrics.record_order();
                self.metrics.record_fill();
                [Event::Order(triggered.order_event), Event::Fill(triggered.fill_event)]
            })
            .collect()
    }

    fn handle_fill(&mut self, fill: crate::core::fill::Fill) -> Vec<Event> {
        match self.portfolio_handler.process_fill(&fill, &self.mark_prices) {
            Ok(update) => vec![Event::Update(update)],
            Err(e) => {
                warn!(order_id = fill.order_id, error = %e, "failed to apply fill to portfolio");
                Vec::new()
            }
        }
    }
}
