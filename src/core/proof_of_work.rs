use crate::config::GLOBAL_CONFIG;
use crate::core::Block;
use crate::error::{LedgerError, Result};
use crate::utils::sha256_digest;
use data_encoding::HEXLOWER;
use log::debug;
use num_bigint::{BigInt, Sign};
use std::borrow::Borrow;
use std::ops::ShlAssign;
use std::sync::atomic::{AtomicBool, Ordering};

/// Brute-force nonce search over a candidate block.
///
/// Difficulty counts required leading `'0'` hex digits of the block hash.
/// Each hex digit is 4 bits, so the numeric target is `1 << (256 - 4 * d)`:
/// a digest below the target is exactly a digest with `d` leading zero
/// digits in its hex form.
pub struct ProofOfWork {
    block: Block,
    target: BigInt,
    difficulty: u32,
}

impl ProofOfWork {
    pub fn new_proof_of_work(block: Block) -> ProofOfWork {
        let difficulty = block.get_difficulty();
        let mut target = BigInt::from(1);
        target.shl_assign(256 - 4 * difficulty.min(64));
        ProofOfWork {
            block,
            target,
            difficulty,
        }
    }

    /// Re-run the hash for a sealed block and check it against both the
    /// stored hash and the difficulty target.
    pub fn validate(block: &Block) -> bool {
        let pow = ProofOfWork::new_proof_of_work(block.clone());
        let data = pow.prepare_data(block.get_nonce());
        let hash = sha256_digest(data.as_slice());

        if HEXLOWER.encode(hash.as_slice()) != block.get_hash() {
            return false;
        }

        let hash_int = BigInt::from_bytes_be(Sign::Plus, hash.as_slice());
        hash_int < pow.target
    }

    // Every header field participates, so two candidates differing anywhere
    // produce different search spaces. The transaction digest covers identity
    // only (see Block::hash_transactions).
    fn prepare_data(&self, nonce: i64) -> Vec<u8> {
        let mut data_bytes = vec![];
        data_bytes.extend(self.block.get_previous_hash().as_bytes());
        data_bytes.extend(self.block.hash_transactions());
        data_bytes.extend(self.block.get_timestamp().to_be_bytes());
        data_bytes.extend(self.block.get_index().to_be_bytes());
        data_bytes.extend(self.difficulty.to_be_bytes());
        data_bytes.extend(self.block.get_miner().as_bytes());
        data_bytes.extend(self.block.get_reward().to_be_bytes());
        data_bytes.extend(nonce.to_be_bytes());
        data_bytes
    }

    /// Search without external cancellation.
    pub fn run(&self) -> Result<(i64, String)> {
        self.run_cancellable(&AtomicBool::new(false))
    }

    /// Search for a winning nonce starting at 0. Deterministic for a fixed
    /// candidate: the same block always yields the same (nonce, hash).
    ///
    /// Stops early if `cancel` becomes true or the configured nonce bound is
    /// exhausted; both are retryable mining errors.
    pub fn run_cancellable(&self, cancel: &AtomicBool) -> Result<(i64, String)> {
        let max_nonce = GLOBAL_CONFIG.max_nonce();
        debug!(
            "Starting proof-of-work for block {} at difficulty {}",
            self.block.get_index(),
            self.difficulty
        );

        let mut nonce = 0;
        while nonce < max_nonce {
            if cancel.load(Ordering::Relaxed) {
                return Err(LedgerError::Mining(
                    "Proof-of-work search cancelled".to_string(),
                ));
            }

            let data = self.prepare_data(nonce);
            let hash = sha256_digest(data.as_slice());
            let hash_int = BigInt::from_bytes_be(Sign::Plus, hash.as_slice());

            if hash_int.lt(self.target.borrow()) {
                let hash_hex = HEXLOWER.encode(hash.as_slice());
                debug!("Proof-of-work found nonce {nonce}: {hash_hex}");
                return Ok((nonce, hash_hex));
            }
            nonce += 1;
        }

        Err(LedgerError::Mining(format!(
            "Nonce bound {max_nonce} exhausted without meeting difficulty {}",
            self.difficulty
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::monetary::UNITS_PER_COIN;
    use crate::core::Transaction;

    const MINER: &str = "0x00aa11bb22cc33dd44ee55ff66aa77bb88cc99dd";

    fn candidate(difficulty: u32) -> Block {
        let deposit = Transaction::new_system_deposit(MINER, 5 * UNITS_PER_COIN)
            .expect("deposit creation should succeed");
        Block::new_candidate(None, &[deposit], difficulty, MINER, 10 * UNITS_PER_COIN)
            .expect("candidate should build")
    }

    #[test]
    fn search_is_deterministic_for_a_fixed_candidate() {
        let block = candidate(2);
        let pow = ProofOfWork::new_proof_of_work(block);

        let (nonce_a, hash_a) = pow.run().expect("search should succeed");
        let (nonce_b, hash_b) = pow.run().expect("search should succeed");

        assert_eq!(nonce_a, nonce_b);
        assert_eq!(hash_a, hash_b);
    }

    #[test]
    fn winning_hash_has_leading_zero_hex_digits() {
        let difficulty = 2;
        let block = candidate(difficulty);
        let pow = ProofOfWork::new_proof_of_work(block);

        let (_, hash) = pow.run().expect("search should succeed");
        assert!(hash.starts_with(&"0".repeat(difficulty as usize)));
    }

    #[test]
    fn sealed_block_validates() {
        let mut block = candidate(1);
        let pow = ProofOfWork::new_proof_of_work(block.clone());
        let (nonce, hash) = pow.run().expect("search should succeed");
        block.seal(nonce, hash);

        assert!(ProofOfWork::validate(&block));
    }

    #[test]
    fn tampered_seal_fails_validation() {
        let mut block = candidate(1);
        let pow = ProofOfWork::new_proof_of_work(block.clone());
        let (nonce, _) = pow.run().expect("search should succeed");
        block.seal(nonce, "0".repeat(64));

        assert!(!ProofOfWork::validate(&block));
    }

    #[test]
    fn finalized_block_still_validates() {
        let mut block = candidate(1);
        let pow = ProofOfWork::new_proof_of_work(block.clone());
        let (nonce, hash) = pow.run().expect("search should succeed");
        block.seal(nonce, hash);
        block.finalize_transactions();

        assert!(ProofOfWork::validate(&block));
    }

    #[test]
    fn higher_difficulty_means_smaller_target() {
        let easy = ProofOfWork::new_proof_of_work(candidate(1));
        let hard = ProofOfWork::new_proof_of_work(candidate(2));
        assert!(hard.target < easy.target);
    }

    #[test]
    fn cancellation_stops_the_search() {
        let block = candidate(16); // Practically unreachable difficulty
        let pow = ProofOfWork::new_proof_of_work(block);
        let cancel = AtomicBool::new(true);

        let result = pow.run_cancellable(&cancel);
        assert!(matches!(result, Err(LedgerError::Mining(_))));
    }
}
