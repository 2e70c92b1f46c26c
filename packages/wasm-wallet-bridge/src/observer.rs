//! Key-change dispatcher.
//!
//! Receives every key notification from the provider, filters out repeats of
//! the last published state, and fans each real transition out to the
//! registered sinks in registration order. Sink failures are logged and
//! never reach the notifier.
//!
//! A transition observed while an event is being delivered is queued and
//! delivered after it, so every sink sees transitions in the same order.

use crate::event::{BridgeEvent, CallbackSink, ChannelSink, EventSink};
use crate::provider::WalletState;
use crate::registry::Registry;
use futures::channel::mpsc;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{debug, warn};

/// Handle for a registered sink or host handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub u32);

pub struct Dispatcher {
    last: RefCell<WalletState>,
    sinks: RefCell<Registry<dyn EventSink>>,
    pending: RefCell<VecDeque<BridgeEvent>>,
    dispatching: Cell<bool>,
    published: Cell<usize>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Dispatcher {
            last: RefCell::new(WalletState::Disconnected),
            sinks: RefCell::new(Registry::default()),
            pending: RefCell::new(VecDeque::new()),
            dispatching: Cell::new(false),
            published: Cell::new(0),
        }
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sink(&self, sink: Rc<dyn EventSink>) -> HandlerId {
        HandlerId(self.sinks.borrow_mut().insert(sink))
    }

    /// Register a host callback for key changes.
    pub fn on_public_key_change(&self, handler: impl Fn(&BridgeEvent) + 'static) -> HandlerId {
        self.add_sink(Rc::new(CallbackSink::new(handler)))
    }

    /// Register a channel that receives every published event.
    pub fn subscribe_channel(&self) -> (HandlerId, mpsc::UnboundedReceiver<BridgeEvent>) {
        let (sink, rx) = ChannelSink::new();
        (self.add_sink(Rc::new(sink)), rx)
    }

    /// Returns false when the id was not registered.
    pub fn remove(&self, id: HandlerId) -> bool {
        self.sinks.borrow_mut().remove(id.0).is_some()
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.borrow().len()
    }

    pub fn last_state(&self) -> WalletState {
        *self.last.borrow()
    }

    /// Number of events published since construction.
    pub fn published(&self) -> usize {
        self.published.get()
    }

    /// Feed one provider notification. Returns true if the state changed and
    /// an event was published (or queued behind the one being delivered).
    pub fn observe(&self, state: WalletState) -> bool {
        {
            let mut last = self.last.borrow_mut();
            if *last == state {
                debug!(%state, "wallet state unchanged, not republishing");
                return false;
            }
            debug!(from = %*last, to = %state, "wallet state transition");
            *last = state;
        }
        self.publish(BridgeEvent::from(&state));
        true
    }

    fn publish(&self, event: BridgeEvent) {
        self.pending.borrow_mut().push_back(event);
        if self.dispatching.replace(true) {
            return;
        }
        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some(event) = next else { break };
            self.published.set(self.published.get() + 1);
            let sinks = self.sinks.borrow().snapshot();
            for sink in sinks {
                if let Err(e) = sink.publish(&event) {
                    warn!(error = %e, "failed to publish key-change event");
                }
            }
        }
        self.dispatching.set(false);
    }
}
