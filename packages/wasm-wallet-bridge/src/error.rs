//! Error types for wasm-wallet-bridge

use core::fmt;
use wasm_bindgen::prelude::*;

/// Failure modes of a sign request that reach the wallet-provider stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    /// No wallet is connected
    NotConnected,
    /// The connected wallet is not one of the transaction's required signers
    NotASigner(String),
    /// The user declined the request in the wallet UI
    Rejected,
    /// The wallet returned a transaction without its signature
    Unsigned,
    /// Any other provider-side failure
    Provider(String),
}

impl fmt::Display for SigningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningError::NotConnected => write!(f, "no wallet connected"),
            SigningError::NotASigner(key) => {
                write!(f, "wallet {} is not a required signer", key)
            }
            SigningError::Rejected => write!(f, "user rejected the request"),
            SigningError::Unsigned => write!(f, "wallet returned an unsigned transaction"),
            SigningError::Provider(s) => write!(f, "provider error: {}", s),
        }
    }
}

/// Main error type for wasm-wallet-bridge operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Mount target element is missing
    NotFound(String),
    /// Malformed base64 payload
    Decode(String),
    /// Bytes are not a valid transaction encoding
    Parse(String),
    /// Signing failed or was refused
    Signing(SigningError),
    /// Event construction or dispatch failed
    Dispatch(String),
    /// Invalid bridge configuration
    Config(String),
    /// Failed to serialize a value for the host
    Serialization(String),
}

impl std::error::Error for BridgeError {}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::NotFound(id) => write!(f, "Mount target not found: #{}", id),
            BridgeError::Decode(s) => write!(f, "Decode error: {}", s),
            BridgeError::Parse(s) => write!(f, "Parse error: {}", s),
            BridgeError::Signing(e) => write!(f, "Signing error: {}", e),
            BridgeError::Dispatch(s) => write!(f, "Dispatch error: {}", s),
            BridgeError::Config(s) => write!(f, "Invalid config: {}", s),
            BridgeError::Serialization(s) => write!(f, "Serialization error: {}", s),
        }
    }
}

impl From<SigningError> for BridgeError {
    fn from(err: SigningError) -> Self {
        BridgeError::Signing(err)
    }
}

impl From<base64::DecodeError> for BridgeError {
    fn from(err: base64::DecodeError) -> Self {
        BridgeError::Decode(err.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}

// REQUIRED: Converts to JS Error with stack trace
impl From<BridgeError> for JsValue {
    fn from(err: BridgeError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}
