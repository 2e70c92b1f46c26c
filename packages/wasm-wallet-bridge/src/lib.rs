//! wasm-wallet-bridge: a Solana wallet bridge between a JavaScript wallet
//! adapter and a WASM host application.
//!
//! The bridge mounts a connect control into the host page, publishes every
//! change of the connected public key as an event, and relays base64 sign
//! requests from the host to the connected wallet.
//!
//! # Architecture
//!
//! 1. **Core** (`bridge`, `observer`, `relay`, `mount`, `provider`) - platform-free
//!    logic over the `WalletProvider` and `MountHost` seams
//! 2. **WASM bindings** (`wasm/`) - the browser implementations of those seams
//!    and the exported `WasmWalletBridge`
//!
//! # Usage from Rust
//!
//! ```rust
//! use std::rc::Rc;
//! use wasm_wallet_bridge::{BridgeConfig, KeypairWallet, WalletProvider};
//!
//! let wallet = Rc::new(KeypairWallet::from_seed([7u8; 32]));
//! wallet.connect();
//! assert_eq!(wallet.public_key(), Some(wallet.pubkey()));
//!
//! let config = BridgeConfig::preset("devnet").unwrap();
//! assert_eq!(config.endpoint.as_str(), "https://api.devnet.solana.com/");
//! ```

pub mod bridge;
pub mod config;
mod error;
pub mod event;
pub mod host;
pub mod logging;
pub mod memo;
pub mod mount;
pub mod observer;
pub mod provider;
pub mod pubkey;
mod registry;
pub mod relay;
pub mod transaction;
pub mod wasm;

// Re-export core types at crate root
pub use bridge::WalletBridge;
pub use config::{BridgeConfig, Cluster, ConnectionEndpoint, ErrorPolicy};
pub use error::{BridgeError, SigningError};
pub use event::{BridgeEvent, CallbackSink, ChannelSink, EventSink};
pub use host::{HostWallet, SignatureInvocation, SignatureStatus};
pub use mount::{ConnectControl, MountHost, MountState};
pub use observer::{Dispatcher, HandlerId};
pub use provider::{KeypairWallet, WalletProvider, WalletState};
pub use pubkey::{Pubkey, PubkeyExt};
pub use relay::{SignRequest, SignResponse};
pub use transaction::{Transaction, TransactionExt};

// Re-export WASM types
pub use wasm::{JsWalletAdapter, WasmWalletBridge};

#[cfg(all(test, target_arch = "wasm32"))]
wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);
