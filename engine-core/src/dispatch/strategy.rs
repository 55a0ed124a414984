//! `Strategy`: the callable strategies implement (SPEC_FULL.md §6).

use crate::core::event::BarEvent;
use crate::core::signal::Signal;

/// A strategy may own and mutate its own indicator state via `&mut self`,
/// but must never reach into portfolio/order state directly — it only
/// produces signals for `OrderHandler` to act on.
pub trait Strategy: Send {
    fn on_bar(&mut self, bar: &BarEvent) -> Vec<Signal>;

    fn name(&self) -> &str;
}
