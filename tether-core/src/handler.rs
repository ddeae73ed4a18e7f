//! Connection lifecycle and observer callbacks
//!
//! One capability interface with a no-op default per event kind;
//! applications implement only what they care about. Each method receives
//! a [`Messenger`] so it may send messages from inside dispatch — the
//! engine itself answers PING the same way, so reentrant sends are part
//! of the contract, not an edge case.

use tether_hal::{Clock, SerialLink};
use tether_protocol::{Messenger, ShieldEvent};

/// Observer for decoded events and connection lifecycle
pub trait EventSink<L: SerialLink, C: Clock> {
    /// Companion connected or reconnected
    fn on_connect(&mut self, _shield: &mut Messenger<'_, L, C>, _event: &ShieldEvent) {}

    /// Companion is about to suspend
    fn on_suspend(&mut self, _shield: &mut Messenger<'_, L, C>, _event: &ShieldEvent) {}

    /// Companion resumed from suspension
    fn on_resume(&mut self, _shield: &mut Messenger<'_, L, C>, _event: &ShieldEvent) {}

    /// Companion asked for current state to be sent again
    fn on_refresh(&mut self, _shield: &mut Messenger<'_, L, C>, _event: &ShieldEvent) {}

    /// Any decoded event, fired last, once per frame
    fn on_event(&mut self, _shield: &mut Messenger<'_, L, C>, _event: &ShieldEvent) {}
}
