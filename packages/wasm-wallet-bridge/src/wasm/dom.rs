use crate::error::BridgeError;
use crate::mount::{ConnectControl, MountHost};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element};

/// Class on the rendered connect button, for page styling.
pub const CONNECT_BUTTON_CLASS: &str = "wallet-bridge-connect";

fn dom_error(err: JsValue) -> BridgeError {
    BridgeError::Dispatch(format!("DOM operation failed: {:?}", err))
}

fn document() -> Result<Document, BridgeError> {
    web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| BridgeError::NotFound("document".to_string()))
}

fn target(document: &Document, target_id: &str) -> Result<Element, BridgeError> {
    document
        .get_element_by_id(target_id)
        .ok_or_else(|| BridgeError::NotFound(target_id.to_string()))
}

/// Renders the connect control into the live document.
///
/// One click handler is shared by every rendered button.
pub struct DomMountHost {
    on_click: Closure<dyn Fn()>,
}

impl DomMountHost {
    pub fn new(on_click: impl Fn() + 'static) -> Self {
        DomMountHost {
            on_click: Closure::<dyn Fn()>::new(on_click),
        }
    }
}

impl MountHost for DomMountHost {
    fn render(&self, target_id: &str, control: &ConnectControl) -> Result<(), BridgeError> {
        let document = document()?;
        let target = target(&document, target_id)?;

        let button = document.create_element("button").map_err(dom_error)?;
        button.set_class_name(CONNECT_BUTTON_CLASS);
        button.set_text_content(Some(&control.label));
        button
            .set_attribute("data-connected", if control.connected { "true" } else { "false" })
            .map_err(dom_error)?;
        button
            .set_attribute("data-endpoint", &control.endpoint)
            .map_err(dom_error)?;
        button
            .add_event_listener_with_callback("click", self.on_click.as_ref().unchecked_ref())
            .map_err(dom_error)?;

        target.set_inner_html("");
        target.append_child(&button).map_err(dom_error)?;
        Ok(())
    }

    fn clear(&self, target_id: &str) -> Result<(), BridgeError> {
        let document = document()?;
        target(&document, target_id)?.set_inner_html("");
        Ok(())
    }
}
