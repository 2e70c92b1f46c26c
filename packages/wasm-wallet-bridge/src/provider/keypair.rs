//! In-memory keypair wallet.
//!
//! Stands in for a browser wallet extension on local validators and in
//! tests. Connect/disconnect and approval are driven by the caller, the way a
//! user would drive them in the wallet UI.

use super::{KeyListener, SubscriptionId, WalletProvider};
use crate::error::SigningError;
use crate::pubkey::Pubkey;
use crate::registry::Registry;
use crate::transaction::{Transaction, TransactionExt};
use async_trait::async_trait;
use solana_keypair::Keypair;
use solana_signer::Signer;
use std::cell::{Cell, RefCell};

pub struct KeypairWallet {
    keypair: Keypair,
    connected: Cell<bool>,
    rejecting: Cell<bool>,
    listeners: RefCell<Registry<dyn Fn(Option<Pubkey>)>>,
}

impl KeypairWallet {
    pub fn new(keypair: Keypair) -> Self {
        KeypairWallet {
            keypair,
            connected: Cell::new(false),
            rejecting: Cell::new(false),
            listeners: RefCell::new(Registry::default()),
        }
    }

    /// Deterministic wallet from a 32-byte Ed25519 seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self::new(Keypair::new_from_array(seed))
    }

    /// The wallet's key, whether or not it is connected.
    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }

    pub fn connect(&self) {
        if !self.connected.replace(true) {
            self.notify(Some(self.pubkey()));
        }
    }

    pub fn disconnect(&self) {
        if self.connected.replace(false) {
            self.notify(None);
        }
    }

    /// Make subsequent sign requests fail as if the user declined them.
    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.set(rejecting);
    }

    /// Repeat the current key to every listener without a state change.
    pub fn renotify(&self) {
        self.notify(self.public_key());
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn notify(&self, pubkey: Option<Pubkey>) {
        let listeners = self.listeners.borrow().snapshot();
        for listener in listeners {
            listener(pubkey);
        }
    }
}

#[async_trait(?Send)]
impl WalletProvider for KeypairWallet {
    fn public_key(&self) -> Option<Pubkey> {
        self.connected.get().then(|| self.pubkey())
    }

    fn subscribe(&self, listener: KeyListener) -> SubscriptionId {
        SubscriptionId(self.listeners.borrow_mut().insert(listener))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.borrow_mut().remove(id.0);
    }

    async fn sign_transaction(
        &self,
        mut transaction: Transaction,
    ) -> Result<Transaction, SigningError> {
        if !self.connected.get() {
            return Err(SigningError::NotConnected);
        }
        if self.rejecting.get() {
            return Err(SigningError::Rejected);
        }

        let pubkey = self.pubkey();
        if transaction.signer_index(&pubkey).is_none() {
            return Err(SigningError::NotASigner(pubkey.to_string()));
        }

        let signature = self.keypair.sign_message(&transaction.signable_payload());
        transaction
            .add_signature(&pubkey, signature.as_ref())
            .map_err(|e| SigningError::Provider(e.to_string()))?;
        Ok(transaction)
    }
}
