//! Host-side view of the bridge.
//!
//! What a host application does with the bridge's outputs: turn event
//! details back into a wallet state, and drive a sign request from an unsigned
//! transaction to a signature.

use crate::error::BridgeError;
use crate::pubkey::{Pubkey, PubkeyExt};
use crate::relay::SignRequest;
use crate::transaction::{Transaction, TransactionExt};
use serde_json::Value;
use solana_signature::Signature;
use tracing::{info, warn};

/// Wallet state as reconstructed from event details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostWallet {
    Connected { pubkey: Pubkey },
    Disconnected,
}

impl HostWallet {
    /// Read the `detail` object of a key-change event.
    ///
    /// Anything other than a 32-entry byte array under `pubkey` reads as
    /// disconnected.
    pub fn from_event_detail(detail: &Value) -> Self {
        let pubkey = detail
            .get("pubkey")
            .and_then(|value| serde_json::from_value::<Vec<u8>>(value.clone()).ok())
            .and_then(|bytes| Pubkey::from_bytes_checked(&bytes).ok());
        match pubkey {
            Some(pubkey) => HostWallet::Connected { pubkey },
            None => HostWallet::Disconnected,
        }
    }

    pub fn pubkey(&self) -> Option<&Pubkey> {
        match self {
            HostWallet::Connected { pubkey } => Some(pubkey),
            HostWallet::Disconnected => None,
        }
    }
}

/// Progress of one host-initiated signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureStatus {
    Start,
    Waiting,
    DoneWithError,
    Done(Signature),
}

/// Tracks a single sign request from the host's side.
#[derive(Debug)]
pub struct SignatureInvocation {
    status: SignatureStatus,
    signed: Option<Transaction>,
}

impl Default for SignatureInvocation {
    fn default() -> Self {
        SignatureInvocation {
            status: SignatureStatus::Start,
            signed: None,
        }
    }
}

impl SignatureInvocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &SignatureStatus {
        &self.status
    }

    /// The signed transaction once the invocation is `Done`.
    pub fn signed_transaction(&self) -> Option<&Transaction> {
        self.signed.as_ref()
    }

    /// Encode `transaction` as a sign request and move to `Waiting`.
    pub fn prepare(&mut self, transaction: &Transaction) -> Result<SignRequest, BridgeError> {
        match transaction.to_base64() {
            Ok(b64) => {
                self.status = SignatureStatus::Waiting;
                Ok(SignRequest::new(b64))
            }
            Err(e) => {
                warn!(error = %e, "failed to encode transaction for signing");
                self.status = SignatureStatus::DoneWithError;
                Err(e)
            }
        }
    }

    /// Settle with the bridge's answer; `None` is the bridge's failure signal.
    pub fn complete(&mut self, response: Option<&str>) -> &SignatureStatus {
        self.status = match response.map(Transaction::from_base64) {
            Some(Ok(tx)) => match tx.signatures.first().copied() {
                Some(signature) if signature != Signature::default() => {
                    info!(%signature, "received signed transaction");
                    self.signed = Some(tx);
                    SignatureStatus::Done(signature)
                }
                _ => {
                    warn!("signed transaction carries no fee-payer signature");
                    SignatureStatus::DoneWithError
                }
            },
            Some(Err(e)) => {
                warn!(error = %e, "error decoding signed transaction");
                SignatureStatus::DoneWithError
            }
            None => {
                warn!("bridge returned no signed transaction");
                SignatureStatus::DoneWithError
            }
        };
        &self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_connected_detail() {
        let bytes: Vec<u8> = (1..=32).collect();
        let wallet = HostWallet::from_event_detail(&json!({ "pubkey": bytes }));
        assert_eq!(
            wallet.pubkey().map(|k| k.to_byte_list()),
            Some((1..=32).collect::<Vec<u8>>())
        );
    }

    #[rstest]
    #[case(json!({ "pubkey": null }))]
    #[case(json!({}))]
    #[case(json!({ "pubkey": [1, 2, 3] }))]
    #[case(json!({ "pubkey": "FKjSjCqByQRwSzZoMXA7bKnDbJe41YgJTHFFzBeC42bH" }))]
    #[case(json!({ "pubkey": vec![300u32; 32] }))]
    fn test_everything_else_is_disconnected(#[case] detail: Value) {
        assert_eq!(HostWallet::from_event_detail(&detail), HostWallet::Disconnected);
    }

    #[test]
    fn test_no_response_is_error() {
        let mut invocation = SignatureInvocation::new();
        assert_eq!(invocation.complete(None), &SignatureStatus::DoneWithError);
        assert!(invocation.signed_transaction().is_none());
    }

    #[test]
    fn test_garbage_response_is_error() {
        let mut invocation = SignatureInvocation::new();
        assert_eq!(
            invocation.complete(Some("AAAA")),
            &SignatureStatus::DoneWithError
        );
    }
}
