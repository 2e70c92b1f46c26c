//! DOM `CustomEvent` publishing.

use crate::error::BridgeError;
use crate::event::{BridgeEvent, EventSink};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::{CustomEvent, CustomEventInit};

/// Convert an event to the JS object used as `CustomEvent.detail`.
///
/// Byte lists stay plain arrays and a missing key is `null`, not `undefined`.
pub fn event_detail(event: &BridgeEvent) -> Result<JsValue, BridgeError> {
    let serializer = serde_wasm_bindgen::Serializer::new().serialize_missing_as_null(true);
    event
        .serialize(&serializer)
        .map_err(|e| BridgeError::Serialization(e.to_string()))
}

/// Dispatches each event on `window` under a fixed event name.
pub struct DomEventSink {
    event_name: String,
}

impl DomEventSink {
    pub fn new(event_name: impl Into<String>) -> Self {
        DomEventSink {
            event_name: event_name.into(),
        }
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }
}

impl EventSink for DomEventSink {
    fn publish(&self, event: &BridgeEvent) -> Result<(), BridgeError> {
        let window =
            web_sys::window().ok_or_else(|| BridgeError::Dispatch("no window".to_string()))?;

        let init = CustomEventInit::new();
        init.set_detail(&event_detail(event)?);
        let custom = CustomEvent::new_with_event_init_dict(&self.event_name, &init)
            .map_err(|e| BridgeError::Dispatch(format!("{:?}", e)))?;

        window
            .dispatch_event(&custom)
            .map_err(|e| BridgeError::Dispatch(format!("{:?}", e)))?;
        Ok(())
    }
}
