//! Outbound key-change notifications.
//!
//! A `BridgeEvent` is built for every observed wallet-state transition and
//! handed to each registered `EventSink`. Sinks are where the event leaves
//! the bridge: a host callback, a channel, or a DOM `CustomEvent`.

use crate::error::BridgeError;
use crate::provider::WalletState;
use crate::pubkey::PubkeyExt;
use futures::channel::mpsc;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Payload of the "wallet public-key changed" event.
///
/// Serializes as `{ "pubkey": [..32 bytes..] }` or `{ "pubkey": null }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeEvent {
    pub pubkey: Option<Vec<u8>>,
}

impl BridgeEvent {
    pub fn connected(bytes: Vec<u8>) -> Self {
        BridgeEvent {
            pubkey: Some(bytes),
        }
    }

    pub fn disconnected() -> Self {
        BridgeEvent { pubkey: None }
    }

    pub fn is_connected(&self) -> bool {
        self.pubkey.is_some()
    }

    pub fn to_json(&self) -> Result<serde_json::Value, BridgeError> {
        Ok(serde_json::to_value(self)?)
    }
}

impl From<&WalletState> for BridgeEvent {
    fn from(state: &WalletState) -> Self {
        match state {
            WalletState::Connected(pubkey) => BridgeEvent::connected(pubkey.to_byte_list()),
            WalletState::Disconnected => BridgeEvent::disconnected(),
        }
    }
}

/// Destination for published events.
pub trait EventSink {
    fn publish(&self, event: &BridgeEvent) -> Result<(), BridgeError>;
}

/// Forwards events to a host-supplied closure.
pub struct CallbackSink {
    callback: Rc<dyn Fn(&BridgeEvent)>,
}

impl CallbackSink {
    pub fn new(callback: impl Fn(&BridgeEvent) + 'static) -> Self {
        CallbackSink {
            callback: Rc::new(callback),
        }
    }
}

impl EventSink for CallbackSink {
    fn publish(&self, event: &BridgeEvent) -> Result<(), BridgeError> {
        (self.callback)(event);
        Ok(())
    }
}

/// Forwards events into an unbounded channel.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<BridgeEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BridgeEvent>) {
        let (tx, rx) = mpsc::unbounded();
        (ChannelSink { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn publish(&self, event: &BridgeEvent) -> Result<(), BridgeError> {
        self.tx
            .unbounded_send(event.clone())
            .map_err(|_| BridgeError::Dispatch("event channel closed".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pubkey::Pubkey;
    use serde_json::json;
    use std::cell::RefCell;

    #[test]
    fn test_connected_payload_is_byte_list() {
        let bytes: Vec<u8> = (1..=32).collect();
        let state = WalletState::Connected(Pubkey::from_bytes_checked(&bytes).unwrap());
        let event = BridgeEvent::from(&state);
        assert_eq!(event.to_json().unwrap(), json!({ "pubkey": bytes }));
    }

    #[test]
    fn test_disconnected_payload_is_null() {
        let event = BridgeEvent::from(&WalletState::Disconnected);
        assert_eq!(event.to_json().unwrap(), json!({ "pubkey": null }));
        assert!(!event.is_connected());
    }

    #[test]
    fn test_callback_sink() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = {
            let seen = seen.clone();
            CallbackSink::new(move |event| seen.borrow_mut().push(event.clone()))
        };
        sink.publish(&BridgeEvent::disconnected()).unwrap();
        assert_eq!(*seen.borrow(), vec![BridgeEvent::disconnected()]);
    }

    #[test]
    fn test_channel_sink_closed() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        let result = sink.publish(&BridgeEvent::disconnected());
        assert!(matches!(result, Err(BridgeError::Dispatch(_))));
    }

    #[test]
    fn test_channel_sink_delivers() {
        let (sink, mut rx) = ChannelSink::new();
        sink.publish(&BridgeEvent::connected(vec![7; 32])).unwrap();
        let received = rx.try_next().unwrap().unwrap();
        assert_eq!(received.pubkey, Some(vec![7; 32]));
    }
}
