//! WASM binding for `WalletBridge`.

use crate::bridge::WalletBridge;
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::mount::MountState;
use crate::observer::HandlerId;
use crate::provider::WalletState;
use crate::pubkey::PubkeyExt;
use crate::relay::SignRequest;
use std::rc::Rc;
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use super::dom::DomMountHost;
use super::events::{event_detail, DomEventSink};
use super::provider::{JsWalletAdapter, JsWalletProvider};

/// Global the host page calls to mount the connect control.
pub const MOUNT_GLOBAL: &str = "MountWalletAdapter";
/// Global the host page calls with `{ b64 }` to sign a transaction.
pub const SIGNER_GLOBAL: &str = "DwaTxSigner";

type DomBridge = WalletBridge<Rc<JsWalletProvider>, DomMountHost>;

fn parse_config(config: JsValue) -> Result<BridgeConfig, BridgeError> {
    if config.is_undefined() || config.is_null() {
        return BridgeConfig::production();
    }
    if let Some(name) = config.as_string() {
        return BridgeConfig::preset(&name);
    }
    let config: BridgeConfig = serde_wasm_bindgen::from_value(config)
        .map_err(|e| BridgeError::Config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

fn parse_request(request: JsValue) -> Result<SignRequest, BridgeError> {
    if let Some(b64) = request.as_string() {
        return Ok(SignRequest::new(b64));
    }
    serde_wasm_bindgen::from_value(request).map_err(|e| BridgeError::Parse(e.to_string()))
}

fn sign(bridge: DomBridge, request: JsValue) -> js_sys::Promise {
    let policy = bridge.config().error_policy;
    future_to_promise(async move {
        let result = match parse_request(request) {
            Ok(request) => bridge.sign_transaction(&request).await,
            Err(e) => {
                warn!(error = %e, "malformed sign request");
                Err(e)
            }
        };
        match policy.apply(result) {
            Ok(Some(response)) => Ok(JsValue::from_str(&response.b64)),
            Ok(None) => Ok(JsValue::UNDEFINED),
            Err(e) => Err(e.into()),
        }
    })
}

#[wasm_bindgen]
pub struct WasmWalletBridge {
    inner: DomBridge,
}

#[wasm_bindgen]
impl WasmWalletBridge {
    /// Create a bridge over `adapter`.
    ///
    /// `config` is a config object, a preset name, or omitted for the
    /// production preset.
    #[wasm_bindgen(constructor)]
    pub fn new(adapter: JsWalletAdapter, config: JsValue) -> Result<WasmWalletBridge, JsValue> {
        let config = parse_config(config)?;
        let provider = Rc::new(JsWalletProvider::new(adapter));

        let weak = Rc::downgrade(&provider);
        let host = DomMountHost::new(move || {
            if let Some(provider) = weak.upgrade() {
                provider.toggle_connection();
            }
        });

        let event_name = config.event_name.clone();
        let inner = WalletBridge::new(config, provider, host)?;
        inner.add_sink(Rc::new(DomEventSink::new(event_name)));
        Ok(WasmWalletBridge { inner })
    }

    #[wasm_bindgen(getter)]
    pub fn endpoint(&self) -> String {
        self.inner.config().endpoint.to_string()
    }

    #[wasm_bindgen(getter, js_name = mountTargetId)]
    pub fn mount_target_id(&self) -> String {
        self.inner.config().mount_target_id.clone()
    }

    #[wasm_bindgen(getter, js_name = eventName)]
    pub fn event_name(&self) -> String {
        self.inner.config().event_name.clone()
    }

    #[wasm_bindgen(getter, js_name = isMounted)]
    pub fn is_mounted(&self) -> bool {
        self.inner.state().is_mounted()
    }

    /// Key bytes of the connected wallet as last observed, if mounted and connected.
    #[wasm_bindgen(getter, js_name = publicKey)]
    pub fn public_key(&self) -> Option<Vec<u8>> {
        match self.inner.state() {
            MountState::Mounted(WalletState::Connected(pubkey)) => Some(pubkey.to_byte_list()),
            _ => None,
        }
    }

    /// Render the connect control and start publishing key changes.
    pub fn mount(&self) -> Result<(), JsValue> {
        let result = self.inner.mount();
        self.inner
            .config()
            .error_policy
            .apply(result)
            .map(|_| ())
            .map_err(JsValue::from)
    }

    pub fn unmount(&self) {
        self.inner.unmount();
    }

    /// Call `handler` with `{ pubkey }` on every key change. Returns a handle
    /// for `offPublicKeyChange`.
    #[wasm_bindgen(js_name = onPublicKeyChange)]
    pub fn on_public_key_change(&self, handler: js_sys::Function) -> u32 {
        let id = self.inner.on_public_key_change(move |event| {
            let called = event_detail(event).and_then(|detail| {
                handler
                    .call1(&JsValue::NULL, &detail)
                    .map(|_| ())
                    .map_err(|e| BridgeError::Dispatch(format!("{:?}", e)))
            });
            if let Err(e) = called {
                warn!(error = %e, "public key handler failed");
            }
        });
        id.0
    }

    #[wasm_bindgen(js_name = offPublicKeyChange)]
    pub fn off_public_key_change(&self, id: u32) -> bool {
        self.inner.off_public_key_change(HandlerId(id))
    }

    /// Sign a `{ b64 }` request (or a bare base64 string).
    ///
    /// Resolves with the base64 signed transaction. On failure it resolves
    /// `undefined`, or rejects when the error policy is `propagate`.
    #[wasm_bindgen(js_name = signTransaction)]
    pub fn sign_transaction(&self, request: JsValue) -> js_sys::Promise {
        sign(self.inner.clone(), request)
    }

    /// Expose `window.MountWalletAdapter()` and `window.DwaTxSigner({ b64 })`.
    #[wasm_bindgen(js_name = installGlobals)]
    pub fn install_globals(&self) -> Result<(), JsValue> {
        let window = web_sys::window()
            .ok_or_else(|| BridgeError::NotFound("window".to_string()))?;

        let bridge = self.inner.clone();
        let mount = Closure::<dyn Fn()>::new(move || {
            if let Err(e) = bridge.mount() {
                warn!(error = %e, "mount from host page failed");
            }
        });
        js_sys::Reflect::set(&window, &MOUNT_GLOBAL.into(), &mount.into_js_value())?;

        let bridge = self.inner.clone();
        let signer = Closure::<dyn Fn(JsValue) -> js_sys::Promise>::new(move |request: JsValue| {
            sign(bridge.clone(), request)
        });
        js_sys::Reflect::set(&window, &SIGNER_GLOBAL.into(), &signer.into_js_value())?;
        Ok(())
    }
}

/// Configuration of a named preset, as a plain object.
#[wasm_bindgen(js_name = bridgePreset)]
pub fn bridge_preset(name: &str) -> Result<JsValue, JsValue> {
    let config = BridgeConfig::preset(name)?;
    serde_wasm_bindgen::to_value(&config)
        .map_err(|e| BridgeError::Serialization(e.to_string()).into())
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use crate::config::ErrorPolicy;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_parse_config_variants() {
        assert_eq!(parse_config(JsValue::UNDEFINED).unwrap(), BridgeConfig::production().unwrap());
        assert_eq!(parse_config("embedded".into()).unwrap(), BridgeConfig::embedded().unwrap());
        assert!(parse_config("staging".into()).is_err());

        let object = js_sys::Object::new();
        js_sys::Reflect::set(&object, &"endpoint".into(), &"http://localhost:8899".into()).unwrap();
        js_sys::Reflect::set(&object, &"errorPolicy".into(), &"propagate".into()).unwrap();
        let config = parse_config(object.into()).unwrap();
        assert_eq!(config.error_policy, ErrorPolicy::Propagate);
    }

    #[wasm_bindgen_test]
    fn test_parse_request_forms() {
        assert_eq!(parse_request("AAAA".into()).unwrap(), SignRequest::new("AAAA"));

        let object = js_sys::Object::new();
        js_sys::Reflect::set(&object, &"b64".into(), &"AAAA".into()).unwrap();
        assert_eq!(parse_request(object.into()).unwrap(), SignRequest::new("AAAA"));

        assert!(parse_request(JsValue::from_f64(1.0)).is_err());
    }
}
