use crate::core::Transaction;
use crate::error::{LedgerError, Result};
use crate::utils::{current_timestamp, deserialize, serialize};
use serde::{Deserialize, Serialize};
use sled::IVec;

/// Sentinel previous-hash carried by the block at index 0.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Block {
    index: u64, // 0-based, strictly increasing, no gaps
    timestamp: i64,
    transactions: Vec<Transaction>,
    previous_hash: String,
    hash: String, // Filled by the proof-of-work search
    nonce: i64,
    difficulty: u32, // Leading zero hex digits required of the hash
    miner: String,   // Address credited with the reward, via replay only
    reward: u64,
}

impl Block {
    /// Assemble an unsealed candidate on top of `previous` (or the chain
    /// origin). The nonce and hash are filled in by the proof-of-work run.
    pub fn new_candidate(
        previous: Option<&Block>,
        transactions: &[Transaction],
        difficulty: u32,
        miner: &str,
        reward: u64,
    ) -> Result<Block> {
        if transactions.is_empty() {
            return Err(LedgerError::MiningPrecondition(
                "Block must contain at least one transaction".to_string(),
            ));
        }

        let index = previous.map(|block| block.index + 1).unwrap_or(0);
        let previous_hash = previous
            .map(|block| block.hash.clone())
            .unwrap_or_else(|| GENESIS_PREVIOUS_HASH.to_string());

        Ok(Block {
            index,
            timestamp: current_timestamp()?,
            transactions: transactions.to_vec(),
            previous_hash,
            hash: String::new(),
            nonce: 0,
            difficulty,
            miner: miner.to_string(),
            reward,
        })
    }

    /// Record the winning nonce and hash found by the proof-of-work search.
    pub(crate) fn seal(&mut self, nonce: i64, hash: String) {
        self.nonce = nonce;
        self.hash = hash;
    }

    /// Flip the contained transactions to confirmed with this block's
    /// references. Called once, after sealing; the block hash is unaffected
    /// because hashing covers transaction identity only.
    pub(crate) fn finalize_transactions(&mut self) {
        let hash = self.hash.clone();
        let index = self.index;
        for tx in &mut self.transactions {
            tx.mark_mined(&hash, index);
        }
    }

    /// Digest of the contained transactions' immutable identity. Status and
    /// block references are excluded, so a stored block re-validates after
    /// confirmation flips them.
    pub fn hash_transactions(&self) -> Vec<u8> {
        let mut identities = vec![];
        for transaction in &self.transactions {
            identities.extend(transaction.identity_bytes());
        }
        crate::utils::sha256_digest(identities.as_slice())
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Block> {
        deserialize::<Block>(bytes)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serialize(self)
    }

    pub fn get_index(&self) -> u64 {
        self.index
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub fn get_previous_hash(&self) -> &str {
        self.previous_hash.as_str()
    }

    pub fn get_hash(&self) -> &str {
        self.hash.as_str()
    }

    pub fn get_nonce(&self) -> i64 {
        self.nonce
    }

    pub fn get_difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn get_miner(&self) -> &str {
        self.miner.as_str()
    }

    pub fn get_reward(&self) -> u64 {
        self.reward
    }
}

impl From<Block> for IVec {
    fn from(b: Block) -> Self {
        let bytes =
            serialize(&b).expect("Block serialization should never fail for IVec conversion");
        Self::from(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::monetary::UNITS_PER_COIN;

    fn deposit_tx() -> Transaction {
        Transaction::new_system_deposit(
            "0x00aa11bb22cc33dd44ee55ff66aa77bb88cc99dd",
            5 * UNITS_PER_COIN,
        )
        .expect("deposit creation should succeed")
    }

    #[test]
    fn candidate_without_previous_starts_the_chain() {
        let block = Block::new_candidate(
            None,
            &[deposit_tx()],
            2,
            "0x00aa11bb22cc33dd44ee55ff66aa77bb88cc99dd",
            10 * UNITS_PER_COIN,
        )
        .expect("candidate should build");

        assert_eq!(block.get_index(), 0);
        assert_eq!(block.get_previous_hash(), GENESIS_PREVIOUS_HASH);
        assert!(block.get_hash().is_empty());
    }

    #[test]
    fn candidate_chains_to_previous() {
        let mut first = Block::new_candidate(
            None,
            &[deposit_tx()],
            2,
            "0x00aa11bb22cc33dd44ee55ff66aa77bb88cc99dd",
            10 * UNITS_PER_COIN,
        )
        .expect("candidate should build");
        first.seal(7, "00abcdef".to_string());

        let second = Block::new_candidate(
            Some(&first),
            &[deposit_tx()],
            2,
            "0x00aa11bb22cc33dd44ee55ff66aa77bb88cc99dd",
            10 * UNITS_PER_COIN,
        )
        .expect("candidate should build");

        assert_eq!(second.get_index(), 1);
        assert_eq!(second.get_previous_hash(), "00abcdef");
    }

    #[test]
    fn empty_candidate_is_rejected() {
        let result = Block::new_candidate(
            None,
            &[],
            2,
            "0x00aa11bb22cc33dd44ee55ff66aa77bb88cc99dd",
            10 * UNITS_PER_COIN,
        );
        assert!(matches!(result, Err(LedgerError::MiningPrecondition(_))));
    }

    #[test]
    fn transaction_digest_survives_finalization() {
        let mut block = Block::new_candidate(
            None,
            &[deposit_tx()],
            2,
            "0x00aa11bb22cc33dd44ee55ff66aa77bb88cc99dd",
            10 * UNITS_PER_COIN,
        )
        .expect("candidate should build");

        let digest_before = block.hash_transactions();
        block.seal(42, "0042".to_string());
        block.finalize_transactions();
        assert_eq!(digest_before, block.hash_transactions());

        let tx = &block.get_transactions()[0];
        assert_eq!(tx.get_block_hash(), Some("0042"));
        assert_eq!(tx.get_block_number(), Some(0));
    }

    #[test]
    fn block_roundtrips_through_store_encoding() {
        let mut block = Block::new_candidate(
            None,
            &[deposit_tx()],
            3,
            "0x00aa11bb22cc33dd44ee55ff66aa77bb88cc99dd",
            10 * UNITS_PER_COIN,
        )
        .expect("candidate should build");
        block.seal(99, "000fed".to_string());

        let bytes = block.serialize().expect("block should serialize");
        let restored = Block::deserialize(&bytes).expect("block should deserialize");
        assert_eq!(block, restored);
    }
}
