//! Memo transactions.
//!
//! The host application's sample flow: a single memo instruction signed by
//! the connected wallet, which is also the fee payer.

use crate::error::BridgeError;
use crate::pubkey::{Pubkey, PubkeyExt};
use crate::transaction::Transaction;
use solana_address::Address;
use solana_message::Message;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::{AccountMeta, Instruction};
use std::str::FromStr;

pub const MEMO_PROGRAM_ID: &str = "MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr";

/// Build a memo instruction; every `signers` key must sign the transaction.
pub fn build_memo(memo: &[u8], signers: &[&Pubkey]) -> Result<Instruction, BridgeError> {
    let program_id = Address::from_str(MEMO_PROGRAM_ID)
        .map_err(|e| BridgeError::Parse(format!("Invalid memo program id: {}", e)))?;
    let accounts = signers
        .iter()
        .map(|pubkey| AccountMeta::new_readonly(pubkey.to_address(), true))
        .collect();
    Ok(Instruction::new_with_bytes(program_id, memo, accounts))
}

/// Unsigned memo transaction paid and signed by `payer`.
pub fn build_memo_transaction(
    payer: &Pubkey,
    memo: &str,
    recent_blockhash: Hash,
) -> Result<Transaction, BridgeError> {
    let instruction = build_memo(memo.as_bytes(), &[payer])?;
    let message =
        Message::new_with_blockhash(&[instruction], Some(&payer.to_address()), &recent_blockhash);
    Ok(Transaction::new_unsigned(message))
}
