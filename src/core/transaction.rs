// This file implements the transfer record - the core of how value moves in the ledger
// I follow an account model: each transaction moves an amount between two addresses and
// burns a fee. Balances are always replayed from the confirmed log, never stored here.

use crate::core::monetary::{calculate_fee, TRANSFER_GAS};
use crate::error::Result;
use crate::utils::{
    deserialize, ecdsa_p256_sha256_sign_digest, ecdsa_p256_sha256_sign_verify, serialize,
};
use crate::wallet::SYSTEM_ADDRESS;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a transaction. Transitions are monotone:
/// Pending moves to Confirmed or Failed exactly once; Confirmed is terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

impl std::fmt::Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxStatus::Pending => write!(f, "pending"),
            TxStatus::Confirmed => write!(f, "confirmed"),
            TxStatus::Failed => write!(f, "failed"),
        }
    }
}

// Only these four fields are covered by the signature. Fee, id, and status are
// metadata and must not be forgeable into the signed content.
#[derive(Serialize)]
struct SignedFields<'a> {
    from: &'a str,
    to: &'a str,
    amount: u64,
    timestamp: i64,
}

// The main transfer structure. Everything except status/block_hash/block_number
// is immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Transaction {
    id: String,         // Random UUID - uniqueness is the submitter's idempotency handle
    from: String,       // Sender address (SYSTEM_ADDRESS for deposits)
    to: String,         // Receiver address
    amount: u64,        // Transfer amount in base units, always > 0
    timestamp: i64,     // Creation time in epoch milliseconds, never re-stamped
    signature: Vec<u8>, // ECDSA P-256 over the signed fields; empty for system deposits
    status: TxStatus,
    gas_used: u64,  // Fixed per simple transfer; 0 for deposits
    gas_price: u64, // Base units per gas unit
    fee: u64,       // gas_used * gas_price, burned on confirmation
    block_hash: Option<String>, // Set once confirmed by mining
    block_number: Option<u64>,
}

impl Transaction {
    /// Build an unsigned transfer and sign it with the sender's key.
    /// Address, amount, and solvency validation belong to the engine; this
    /// constructor only assembles and signs the record.
    pub fn new_transfer(
        from: &str,
        to: &str,
        amount: u64,
        gas_price: u64,
        pkcs8: &[u8],
    ) -> Result<Transaction> {
        let mut tx = Transaction {
            id: Uuid::new_v4().to_string(),
            from: from.to_string(),
            to: to.to_string(),
            amount,
            timestamp: crate::utils::current_timestamp()?,
            signature: vec![],
            status: TxStatus::Pending,
            gas_used: TRANSFER_GAS,
            gas_price,
            fee: calculate_fee(TRANSFER_GAS, gas_price),
            block_hash: None,
            block_number: None,
        };
        tx.signature = ecdsa_p256_sha256_sign_digest(pkcs8, tx.signing_payload()?.as_slice())?;
        Ok(tx)
    }

    /// A system deposit: credits `to` from the system address with no gas, no
    /// fee, and no signature. Created already confirmed, outside any block.
    pub fn new_system_deposit(to: &str, amount: u64) -> Result<Transaction> {
        Ok(Transaction {
            id: Uuid::new_v4().to_string(),
            from: SYSTEM_ADDRESS.to_string(),
            to: to.to_string(),
            amount,
            timestamp: crate::utils::current_timestamp()?,
            signature: vec![],
            status: TxStatus::Confirmed,
            gas_used: 0,
            gas_price: 0,
            fee: 0,
            block_hash: None,
            block_number: None,
        })
    }

    /// Canonical byte form of the signed fields: a JSON object containing
    /// exactly {from, to, amount, timestamp} in that order.
    pub fn signing_payload(&self) -> Result<Vec<u8>> {
        let fields = SignedFields {
            from: &self.from,
            to: &self.to,
            amount: self.amount,
            timestamp: self.timestamp,
        };
        Ok(serde_json::to_vec(&fields)?)
    }

    /// Verify the signature against a public key. System deposits carry no
    /// signature and always fail this check; callers gate on
    /// `is_system_deposit` first.
    pub fn verify_signature(&self, public_key: &[u8]) -> Result<bool> {
        if self.signature.is_empty() {
            return Ok(false);
        }
        let payload = self.signing_payload()?;
        Ok(ecdsa_p256_sha256_sign_verify(
            public_key,
            self.signature.as_slice(),
            payload.as_slice(),
        ))
    }

    pub fn is_system_deposit(&self) -> bool {
        self.from == SYSTEM_ADDRESS
    }

    // The identity bytes feed block hashing. They cover every immutable field
    // and deliberately exclude status/block_hash/block_number, so a stored
    // block still re-validates after its transactions flip to confirmed.
    pub fn identity_bytes(&self) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend(self.id.as_bytes());
        data.extend(self.from.as_bytes());
        data.extend(self.to.as_bytes());
        data.extend(self.amount.to_be_bytes());
        data.extend(self.timestamp.to_be_bytes());
        data.extend(self.signature.as_slice());
        data.extend(self.gas_used.to_be_bytes());
        data.extend(self.gas_price.to_be_bytes());
        data.extend(self.fee.to_be_bytes());
        data
    }

    /// Amount plus fee, widened so the sum cannot overflow.
    pub fn total_cost(&self) -> u128 {
        self.amount as u128 + self.fee as u128
    }

    pub fn involves(&self, address: &str) -> bool {
        self.from == address || self.to == address
    }

    pub(crate) fn mark_confirmed(&mut self) {
        self.status = TxStatus::Confirmed;
    }

    pub(crate) fn mark_mined(&mut self, block_hash: &str, block_number: u64) {
        self.status = TxStatus::Confirmed;
        self.block_hash = Some(block_hash.to_string());
        self.block_number = Some(block_number);
    }

    pub(crate) fn mark_failed(&mut self) {
        self.status = TxStatus::Failed;
    }

    pub fn get_id(&self) -> &str {
        &self.id
    }

    pub fn get_from(&self) -> &str {
        &self.from
    }

    pub fn get_to(&self) -> &str {
        &self.to
    }

    pub fn get_amount(&self) -> u64 {
        self.amount
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_signature(&self) -> &[u8] {
        self.signature.as_slice()
    }

    pub fn get_status(&self) -> TxStatus {
        self.status
    }

    pub fn get_gas_used(&self) -> u64 {
        self.gas_used
    }

    pub fn get_gas_price(&self) -> u64 {
        self.gas_price
    }

    pub fn get_fee(&self) -> u64 {
        self.fee
    }

    pub fn get_block_hash(&self) -> Option<&str> {
        self.block_hash.as_deref()
    }

    pub fn get_block_number(&self) -> Option<u64> {
        self.block_number
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serialize(self)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Transaction> {
        deserialize(bytes)
    }
}

impl std::fmt::Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} -> {} amount={} fee={} [{}]",
            self.id, self.from, self.to, self.amount, self.fee, self.status
        )
    }
}
