//! Wallet public keys.
//!
//! The bridge never owns a key; it only reads the one the wallet reports and
//! re-publishes it as a plain byte list.

use crate::error::BridgeError;
use solana_address::Address;
use std::str::FromStr;

/// Re-export the underlying Solana Pubkey type.
pub use solana_pubkey::Pubkey;

/// Length of an Ed25519 public key.
pub const PUBKEY_LEN: usize = 32;

/// Extension trait for Pubkey conversions at the host boundary.
pub trait PubkeyExt {
    fn from_base58(address: &str) -> Result<Pubkey, BridgeError>;
    fn from_bytes_checked(bytes: &[u8]) -> Result<Pubkey, BridgeError>;

    /// The key as an ordered list of byte values, the event payload form.
    fn to_byte_list(&self) -> Vec<u8>;

    /// The key as a transaction account address.
    fn to_address(&self) -> Address;

    /// Shortened base58 form for display, e.g. `AbCd..WxYz`.
    fn short_address(&self) -> String;
}

impl PubkeyExt for Pubkey {
    fn from_base58(address: &str) -> Result<Pubkey, BridgeError> {
        Pubkey::from_str(address)
            .map_err(|e| BridgeError::Parse(format!("Invalid base58 public key: {}", e)))
    }

    /// Create a Pubkey from a byte slice with length validation.
    fn from_bytes_checked(bytes: &[u8]) -> Result<Pubkey, BridgeError> {
        let array: [u8; PUBKEY_LEN] = bytes.try_into().map_err(|_| {
            BridgeError::Parse(format!(
                "Invalid public key length: expected {} bytes, got {}",
                PUBKEY_LEN,
                bytes.len()
            ))
        })?;

        Ok(Pubkey::from(array))
    }

    fn to_byte_list(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn to_address(&self) -> Address {
        Address::from(self.to_bytes())
    }

    fn short_address(&self) -> String {
        let full = self.to_string();
        if full.len() <= 8 {
            return full;
        }
        format!("{}..{}", &full[..4], &full[full.len() - 4..])
    }
}
