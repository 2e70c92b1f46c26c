//! Solana transaction decoding for the sign relay.
//!
//! Wraps `solana_transaction::Transaction` for the host boundary.
//!
//! # Wire Format
//!
//! Host and bridge exchange the bincode wire format of a legacy transaction,
//! base64-encoded (the output of `@solana/web3.js` `Transaction.serialize()`):
//! - Signatures (compact array of 64-byte Ed25519 signatures)
//! - Message (header, account keys, blockhash, instructions)

use crate::error::BridgeError;
use crate::pubkey::{Pubkey, PubkeyExt};
use base64::prelude::*;
use solana_signature::Signature;

/// Re-export the underlying Solana Transaction type.
pub use solana_transaction::Transaction;

/// Extension trait for Transaction to add bridge-friendly methods.
pub trait TransactionExt {
    /// Deserialize a transaction from raw bytes (wire format).
    fn from_bytes(bytes: &[u8]) -> Result<Transaction, BridgeError>;

    /// Deserialize a transaction from base64 text.
    fn from_base64(b64: &str) -> Result<Transaction, BridgeError>;

    /// Serialize transaction to bytes (wire format).
    fn to_bytes(&self) -> Result<Vec<u8>, BridgeError>;

    /// Serialize transaction to base64 text.
    fn to_base64(&self) -> Result<String, BridgeError>;

    /// Get the signable message bytes (what gets signed).
    fn signable_payload(&self) -> Vec<u8>;

    /// Get the index of a pubkey among the required signers.
    fn signer_index(&self, pubkey: &Pubkey) -> Option<usize>;

    /// Place a 64-byte signature in the slot of `pubkey`.
    ///
    /// The pubkey must be one of the required signers in the transaction.
    fn add_signature(&mut self, pubkey: &Pubkey, signature: &[u8]) -> Result<(), BridgeError>;

    /// Whether the signature slot of `pubkey` holds a non-default signature.
    fn is_signed_by(&self, pubkey: &Pubkey) -> bool;
}

impl TransactionExt for Transaction {
    fn from_bytes(bytes: &[u8]) -> Result<Transaction, BridgeError> {
        bincode::deserialize(bytes)
            .map_err(|e| BridgeError::Parse(format!("Failed to deserialize transaction: {}", e)))
    }

    fn from_base64(b64: &str) -> Result<Transaction, BridgeError> {
        let bytes = BASE64_STANDARD.decode(b64.trim())?;
        Transaction::from_bytes(&bytes)
    }

    fn to_bytes(&self) -> Result<Vec<u8>, BridgeError> {
        bincode::serialize(self).map_err(|e| {
            BridgeError::Serialization(format!("Failed to serialize transaction: {}", e))
        })
    }

    fn to_base64(&self) -> Result<String, BridgeError> {
        Ok(BASE64_STANDARD.encode(self.to_bytes()?))
    }

    fn signable_payload(&self) -> Vec<u8> {
        self.message.serialize()
    }

    fn signer_index(&self, pubkey: &Pubkey) -> Option<usize> {
        let target = pubkey.to_address();
        let num_signers = self.message.header.num_required_signatures as usize;
        let signed_keys = self.message.account_keys.get(..num_signers)?;
        signed_keys.iter().position(|x| *x == target)
    }

    fn add_signature(
        &mut self,
        pubkey: &Pubkey,
        signature_bytes: &[u8],
    ) -> Result<(), BridgeError> {
        let bytes: [u8; 64] = signature_bytes.try_into().map_err(|_| {
            BridgeError::Parse(format!(
                "Invalid signature length: expected 64 bytes, got {}",
                signature_bytes.len()
            ))
        })?;

        let signer_idx = self
            .signer_index(pubkey)
            .ok_or_else(|| BridgeError::Parse(format!("unknown signer: {}", pubkey)))?;

        let num_signers = self.message.header.num_required_signatures as usize;
        if self.signatures.len() < num_signers {
            self.signatures.resize(num_signers, Signature::default());
        }

        self.signatures[signer_idx] = Signature::from(bytes);
        Ok(())
    }

    fn is_signed_by(&self, pubkey: &Pubkey) -> bool {
        self.signer_index(pubkey)
            .and_then(|idx| self.signatures.get(idx))
            .is_some_and(|sig| *sig != Signature::default())
    }
}
