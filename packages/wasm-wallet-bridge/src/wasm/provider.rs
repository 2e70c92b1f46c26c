//! WASM binding for the injected JavaScript wallet adapter.
//!
//! The page supplies an adapter object (typically a thin shim over a wallet
//! extension) and the bridge drives it through `WalletProvider`.

use crate::error::SigningError;
use crate::provider::{KeyListener, SubscriptionId, WalletProvider};
use crate::pubkey::{Pubkey, PubkeyExt};
use crate::registry::Registry;
use crate::transaction::{Transaction, TransactionExt};
use async_trait::async_trait;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};

/// Adapter event carrying the new public key (or `null`).
pub const KEY_CHANGE_EVENT: &str = "publicKeyChange";

#[wasm_bindgen(typescript_custom_section)]
const WALLET_ADAPTER_TS: &'static str = r#"
export interface WalletAdapter {
  readonly publicKey: Uint8Array | number[] | null;
  on(event: "publicKeyChange", listener: (publicKey: Uint8Array | number[] | null) => void): void;
  off(event: "publicKeyChange", listener: (publicKey: Uint8Array | number[] | null) => void): void;
  signTransaction(transaction: Uint8Array): Promise<Uint8Array>;
  connect(): Promise<void> | void;
  disconnect(): Promise<void> | void;
}
"#;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(typescript_type = "WalletAdapter")]
    pub type JsWalletAdapter;

    #[wasm_bindgen(method, getter, js_name = publicKey)]
    fn public_key(this: &JsWalletAdapter) -> JsValue;

    #[wasm_bindgen(method)]
    fn on(this: &JsWalletAdapter, event: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method)]
    fn off(this: &JsWalletAdapter, event: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method, catch, js_name = signTransaction)]
    fn sign_transaction(
        this: &JsWalletAdapter,
        transaction: &js_sys::Uint8Array,
    ) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn connect(this: &JsWalletAdapter) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn disconnect(this: &JsWalletAdapter) -> Result<JsValue, JsValue>;
}

/// Read a key reported by the adapter. `null`, `undefined` and malformed
/// values all read as no key.
fn key_from_js(value: &JsValue) -> Option<Pubkey> {
    if value.is_null() || value.is_undefined() {
        return None;
    }
    let bytes = js_sys::Uint8Array::new(value).to_vec();
    match Pubkey::from_bytes_checked(&bytes) {
        Ok(pubkey) => Some(pubkey),
        Err(e) => {
            warn!(error = %e, "adapter reported a malformed public key");
            None
        }
    }
}

fn js_error_message(err: &JsValue) -> String {
    err.dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| err.as_string())
        .unwrap_or_else(|| format!("{:?}", err))
}

fn signing_error(err: JsValue) -> SigningError {
    let message = js_error_message(&err);
    if message.to_ascii_lowercase().contains("reject") {
        SigningError::Rejected
    } else {
        SigningError::Provider(message)
    }
}

/// Settle a possibly-promise return value in the background, logging failure.
fn settle(action: &'static str, result: Result<JsValue, JsValue>) {
    match result {
        Ok(value) => {
            if let Ok(promise) = value.dyn_into::<js_sys::Promise>() {
                spawn_local(async move {
                    if let Err(e) = JsFuture::from(promise).await {
                        warn!(action, error = %js_error_message(&e), "wallet adapter call failed");
                    }
                });
            }
        }
        Err(e) => warn!(action, error = %js_error_message(&e), "wallet adapter call failed"),
    }
}

/// `WalletProvider` over a `JsWalletAdapter`.
pub struct JsWalletProvider {
    adapter: JsWalletAdapter,
    listeners: RefCell<Registry<Closure<dyn Fn(JsValue)>>>,
}

impl JsWalletProvider {
    pub fn new(adapter: JsWalletAdapter) -> Self {
        JsWalletProvider {
            adapter,
            listeners: RefCell::new(Registry::default()),
        }
    }

    /// Connect when disconnected, disconnect when connected.
    ///
    /// Wired to the connect control; the adapter owns the outcome.
    pub fn toggle_connection(&self) {
        if self.public_key().is_some() {
            settle("disconnect", self.adapter.disconnect());
        } else {
            settle("connect", self.adapter.connect());
        }
    }
}

#[async_trait(?Send)]
impl WalletProvider for JsWalletProvider {
    fn public_key(&self) -> Option<Pubkey> {
        key_from_js(&self.adapter.public_key())
    }

    fn subscribe(&self, listener: KeyListener) -> SubscriptionId {
        let closure = Closure::<dyn Fn(JsValue)>::new(move |value: JsValue| {
            listener(key_from_js(&value));
        });
        self.adapter
            .on(KEY_CHANGE_EVENT, closure.as_ref().unchecked_ref());
        SubscriptionId(self.listeners.borrow_mut().insert(Rc::new(closure)))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        let removed = self.listeners.borrow_mut().remove(id.0);
        if let Some(closure) = removed {
            self.adapter
                .off(KEY_CHANGE_EVENT, (*closure).as_ref().unchecked_ref());
        }
    }

    async fn sign_transaction(
        &self,
        transaction: Transaction,
    ) -> Result<Transaction, SigningError> {
        let bytes = transaction
            .to_bytes()
            .map_err(|e| SigningError::Provider(e.to_string()))?;
        let promise = self
            .adapter
            .sign_transaction(&js_sys::Uint8Array::from(&bytes[..]))
            .map_err(signing_error)?;
        let signed = JsFuture::from(promise).await.map_err(signing_error)?;
        let signed_bytes = js_sys::Uint8Array::new(&signed).to_vec();
        Transaction::from_bytes(&signed_bytes).map_err(|e| SigningError::Provider(e.to_string()))
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use crate::memo::build_memo_transaction;
    use solana_sdk::hash::Hash;
    use std::cell::Cell;
    use wasm_bindgen_test::*;

    #[wasm_bindgen(inline_js = r#"
export function fakeAdapter(publicKey, rejectWith) {
  return {
    publicKey,
    listeners: [],
    connects: 0,
    on(event, cb) { if (event === "publicKeyChange") this.listeners.push(cb); },
    off(event, cb) { this.listeners = this.listeners.filter((l) => l !== cb); },
    emit(key) { this.publicKey = key; for (const l of this.listeners.slice()) l(key); },
    signTransaction(tx) {
      return rejectWith ? Promise.reject(new Error(rejectWith)) : Promise.resolve(tx);
    },
    connect() { this.connects += 1; },
    disconnect() {},
  };
}
export function listenerCount(adapter) { return adapter.listeners.length; }
export function connectCount(adapter) { return adapter.connects; }
export function emitKey(adapter, key) { adapter.emit(key); }
"#)]
    extern "C" {
        #[wasm_bindgen(js_name = fakeAdapter)]
        fn fake_adapter(public_key: JsValue, reject_with: Option<String>) -> JsWalletAdapter;
        #[wasm_bindgen(js_name = listenerCount)]
        fn listener_count(adapter: &JsWalletAdapter) -> u32;
        #[wasm_bindgen(js_name = connectCount)]
        fn connect_count(adapter: &JsWalletAdapter) -> u32;
        #[wasm_bindgen(js_name = emitKey)]
        fn emit_key(adapter: &JsWalletAdapter, key: JsValue);
    }

    fn key_array(len: u32) -> JsValue {
        let array = js_sys::Array::new();
        for i in 0..len {
            array.push(&JsValue::from(i + 1));
        }
        array.into()
    }

    #[wasm_bindgen_test]
    fn test_key_from_js_values() {
        assert_eq!(key_from_js(&JsValue::NULL), None);
        assert_eq!(key_from_js(&JsValue::UNDEFINED), None);
        assert_eq!(key_from_js(&js_sys::Uint8Array::new_with_length(31).into()), None);

        let expected: Vec<u8> = (1..=32).collect();
        let from_array = key_from_js(&key_array(32)).unwrap();
        assert_eq!(from_array.to_byte_list(), expected);
        let from_bytes = key_from_js(&js_sys::Uint8Array::from(&expected[..]).into()).unwrap();
        assert_eq!(from_bytes, from_array);
    }

    #[wasm_bindgen_test]
    fn test_signing_error_mapping() {
        let rejected = js_sys::Error::new("User rejected the request.");
        assert_eq!(signing_error(rejected.into()), SigningError::Rejected);
        assert_eq!(signing_error(JsValue::from_str("Rejected")), SigningError::Rejected);
        assert_eq!(
            signing_error(js_sys::Error::new("wallet locked").into()),
            SigningError::Provider("wallet locked".to_string())
        );
    }

    #[wasm_bindgen_test]
    fn test_subscribe_and_unsubscribe_use_adapter_events() {
        let provider = JsWalletProvider::new(fake_adapter(JsValue::NULL, None));
        assert_eq!(provider.public_key(), None);

        let seen = Rc::new(Cell::new(0u32));
        let connected = Rc::new(Cell::new(false));
        let id = {
            let (seen, connected) = (seen.clone(), connected.clone());
            provider.subscribe(Rc::new(move |key: Option<Pubkey>| {
                seen.set(seen.get() + 1);
                connected.set(key.is_some());
            }))
        };
        assert_eq!(listener_count(&provider.adapter), 1);

        emit_key(&provider.adapter, key_array(32));
        assert_eq!(seen.get(), 1);
        assert!(connected.get());
        assert!(provider.public_key().is_some());

        provider.unsubscribe(id);
        assert_eq!(listener_count(&provider.adapter), 0);
        emit_key(&provider.adapter, JsValue::NULL);
        assert_eq!(seen.get(), 1);
    }

    #[wasm_bindgen_test]
    fn test_toggle_connects_when_disconnected() {
        let provider = JsWalletProvider::new(fake_adapter(JsValue::NULL, None));
        provider.toggle_connection();
        assert_eq!(connect_count(&provider.adapter), 1);
    }

    #[wasm_bindgen_test]
    async fn test_adapter_rejection_is_rejected() {
        let provider = JsWalletProvider::new(fake_adapter(
            key_array(32),
            Some("User rejected the request.".to_string()),
        ));
        let payer = provider.public_key().unwrap();
        let tx = build_memo_transaction(&payer, "gm", Hash::default()).unwrap();

        let result = provider.sign_transaction(tx).await;
        assert_eq!(result, Err(SigningError::Rejected));
    }

    #[wasm_bindgen_test]
    async fn test_adapter_result_is_decoded() {
        let provider = JsWalletProvider::new(fake_adapter(key_array(32), None));
        let payer = provider.public_key().unwrap();
        let tx = build_memo_transaction(&payer, "gm", Hash::default()).unwrap();

        let returned = provider.sign_transaction(tx.clone()).await.unwrap();
        assert_eq!(returned, tx);
    }
}
