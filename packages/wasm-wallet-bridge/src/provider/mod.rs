//! The wallet-provider capability.
//!
//! Connection, account selection and signing all live behind
//! `WalletProvider`. The bridge only reads the connected key, listens for
//! changes to it, and forwards sign requests.

mod keypair;

pub use keypair::KeypairWallet;

use crate::error::SigningError;
use crate::pubkey::Pubkey;
use crate::transaction::Transaction;
use async_trait::async_trait;
use std::fmt;
use std::rc::Rc;

/// Connection state as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletState {
    Disconnected,
    Connected(Pubkey),
}

impl WalletState {
    pub fn pubkey(&self) -> Option<&Pubkey> {
        match self {
            WalletState::Connected(pubkey) => Some(pubkey),
            WalletState::Disconnected => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, WalletState::Connected(_))
    }
}

impl From<Option<Pubkey>> for WalletState {
    fn from(pubkey: Option<Pubkey>) -> Self {
        match pubkey {
            Some(pubkey) => WalletState::Connected(pubkey),
            None => WalletState::Disconnected,
        }
    }
}

impl fmt::Display for WalletState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletState::Connected(pubkey) => write!(f, "connected({})", pubkey),
            WalletState::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Callback invoked with the new key (or `None`) whenever it changes.
pub type KeyListener = Rc<dyn Fn(Option<Pubkey>)>;

/// Handle returned by `WalletProvider::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u32);

/// External wallet capability: owns the connection and does the signing.
#[async_trait(?Send)]
pub trait WalletProvider {
    /// The currently connected account, if any.
    fn public_key(&self) -> Option<Pubkey>;

    fn state(&self) -> WalletState {
        WalletState::from(self.public_key())
    }

    /// Register a key-change listener.
    fn subscribe(&self, listener: KeyListener) -> SubscriptionId;

    /// Remove a listener. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);

    /// Ask the connected wallet to sign `transaction`.
    ///
    /// May suspend until the user approves or rejects in the wallet UI.
    async fn sign_transaction(&self, transaction: Transaction)
        -> Result<Transaction, SigningError>;
}

#[async_trait(?Send)]
impl<P: WalletProvider + ?Sized> WalletProvider for Rc<P> {
    fn public_key(&self) -> Option<Pubkey> {
        (**self).public_key()
    }

    fn subscribe(&self, listener: KeyListener) -> SubscriptionId {
        (**self).subscribe(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        (**self).unsubscribe(id)
    }

    async fn sign_transaction(
        &self,
        transaction: Transaction,
    ) -> Result<Transaction, SigningError> {
        (**self).sign_transaction(transaction).await
    }
}
