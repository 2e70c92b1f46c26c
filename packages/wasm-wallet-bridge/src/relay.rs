//! Transaction signing relay.
//!
//! Host code hands over a base64 serialized transaction; the relay decodes
//! it, has the connected wallet sign it, and hands back the base64 signed
//! transaction. Every call is independent: nothing is kept between requests
//! and any number may be awaiting approval at once.

use crate::error::{BridgeError, SigningError};
use crate::provider::WalletProvider;
use crate::transaction::{Transaction, TransactionExt};
use base64::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Inbound sign request: `{ b64 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignRequest {
    pub b64: String,
}

impl SignRequest {
    pub fn new(b64: impl Into<String>) -> Self {
        SignRequest { b64: b64.into() }
    }
}

/// Signed transaction, base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignResponse {
    pub b64: String,
}

impl SignResponse {
    pub fn transaction(&self) -> Result<Transaction, BridgeError> {
        Transaction::from_base64(&self.b64)
    }
}

/// Decode and parse the request payload.
pub fn decode_request(request: &SignRequest) -> Result<Transaction, BridgeError> {
    let bytes = BASE64_STANDARD.decode(request.b64.trim())?;
    Transaction::from_bytes(&bytes)
}

/// Run one sign request against `provider`.
pub async fn sign_transaction<P>(
    provider: &P,
    request: &SignRequest,
) -> Result<SignResponse, BridgeError>
where
    P: WalletProvider + ?Sized,
{
    let transaction = decode_request(request)?;

    let pubkey = provider.public_key().ok_or(SigningError::NotConnected)?;
    if transaction.signer_index(&pubkey).is_none() {
        return Err(SigningError::NotASigner(pubkey.to_string()).into());
    }

    debug!(
        wallet = %pubkey,
        instructions = transaction.message.instructions.len(),
        "requesting wallet signature"
    );
    let signed = provider.sign_transaction(transaction).await?;

    if !signed.is_signed_by(&pubkey) {
        return Err(SigningError::Unsigned.into());
    }

    let b64 = signed.to_base64()?;
    info!(wallet = %pubkey, "transaction signed");
    Ok(SignResponse { b64 })
}

/// `sign_transaction`, but failures are logged and turned into `None`.
pub async fn sign_transaction_or_none<P>(provider: &P, request: &SignRequest) -> Option<String>
where
    P: WalletProvider + ?Sized,
{
    match sign_transaction(provider, request).await {
        Ok(response) => Some(response.b64),
        Err(e) => {
            warn!(error = %e, "sign request failed");
            None
        }
    }
}
