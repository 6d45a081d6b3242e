// Mining turns the head of the pending pool into a sealed block. The
// snapshot and the commit each take the store's write guard; the search in
// between runs unlocked so confirmation timers are never stalled by it.

use crate::config::GLOBAL_CONFIG;
use crate::core::monetary::UNITS_PER_COIN;
use crate::core::{BalanceEngine, Block, ProofOfWork, Transaction};
use crate::error::{LedgerError, Result};
use crate::storage::LedgerDb;
use crate::wallet::validate_address;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// At most this many transactions are drawn from the pool per block,
/// oldest first.
pub const BLOCK_TRANSACTION_CAP: usize = 10;

/// Summary of one successful mining run.
#[derive(Debug, Clone, Serialize)]
pub struct MinedBlock {
    pub index: u64,
    pub hash: String,
    pub nonce: i64,
    pub difficulty: u32,
    pub transactions: usize,
    pub reward: u64,
    pub miner: String,
    pub duration_ms: u64,
}

#[derive(Clone)]
pub struct Miner {
    store: LedgerDb,
    balances: BalanceEngine,
    difficulty: u32,
    reward: u64,
    cancel: Arc<AtomicBool>,
}

impl Miner {
    pub fn new(store: LedgerDb) -> Miner {
        let difficulty = GLOBAL_CONFIG.difficulty();
        let reward = GLOBAL_CONFIG.mining_reward_myc() * UNITS_PER_COIN;
        Self::with_params(store, difficulty, reward)
    }

    /// Build a miner with explicit difficulty and reward (in base units).
    pub fn with_params(store: LedgerDb, difficulty: u32, reward: u64) -> Miner {
        let balances = BalanceEngine::new(store.clone());
        Miner {
            store,
            balances,
            difficulty,
            reward,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared flag that stops an in-flight search when set. The interrupted
    /// attempt returns a retryable mining error and commits nothing.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Assemble, solve, and commit one block, crediting `miner_address` with
    /// the reward through replay. Fails with `MiningPrecondition` when the
    /// pool is empty and with a retryable `Mining` error when the search is
    /// cancelled or the ledger moved on during it.
    pub fn mine(&self, miner_address: &str) -> Result<MinedBlock> {
        if !validate_address(miner_address) {
            return Err(LedgerError::InvalidAddress(miner_address.to_string()));
        }

        let candidate = {
            let _guard = self.store.lock_writes();

            let pending = self.store.list_pending()?;
            if pending.is_empty() {
                return Err(LedgerError::MiningPrecondition(
                    "No pending transactions to mine".to_string(),
                ));
            }
            let selected: Vec<Transaction> =
                pending.into_iter().take(BLOCK_TRANSACTION_CAP).collect();
            let previous = self.store.latest_block()?;
            Block::new_candidate(
                previous.as_ref(),
                &selected,
                self.difficulty,
                miner_address,
                self.reward,
            )?
        };

        let started = Instant::now();
        let pow = ProofOfWork::new_proof_of_work(candidate.clone());
        let (nonce, hash) = pow.run_cancellable(&self.cancel)?;
        let duration_ms = started.elapsed().as_millis() as u64;

        let mut block = candidate;
        block.seal(nonce, hash);
        block.finalize_transactions();

        {
            let _guard = self.store.lock_writes();

            // The chain may have advanced while the search ran unlocked.
            let tip_index = self.store.latest_block()?.map(|tip| tip.get_index());
            let expected_parent = block.get_index().checked_sub(1);
            if tip_index != expected_parent {
                return Err(LedgerError::Mining(
                    "The chain advanced during the search".to_string(),
                ));
            }

            self.store.commit_mined_block(&block)?;
            self.refresh_advisory_balance(miner_address)?;
        }

        log::info!(
            "Mined block {} with {} transaction(s) in {duration_ms} ms: {}",
            block.get_index(),
            block.get_transactions().len(),
            block.get_hash()
        );

        Ok(MinedBlock {
            index: block.get_index(),
            hash: block.get_hash().to_string(),
            nonce,
            difficulty: self.difficulty,
            transactions: block.get_transactions().len(),
            reward: self.reward,
            miner: miner_address.to_string(),
            duration_ms,
        })
    }

    fn refresh_advisory_balance(&self, address: &str) -> Result<()> {
        if let Some(mut record) = self.store.get_wallet(address)? {
            record.balance = self.balances.balance_internal(address)?;
            self.store.put_wallet(&record)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::monetary::DEFAULT_GAS_PRICE;
    use crate::core::{TransactionEngine, TxStatus};
    use crate::wallet::Wallet;
    use std::thread;
    use std::time::Duration;

    fn temp_setup() -> (TransactionEngine, LedgerDb, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().expect("temp dir creation should succeed");
        let db = LedgerDb::open_with_path(&temp_dir.path().to_string_lossy())
            .expect("store should open in temp dir");
        (TransactionEngine::new(db.clone()), db, temp_dir)
    }

    fn funded_wallet(engine: &TransactionEngine, myc: u64) -> Wallet {
        let wallet = Wallet::new().expect("wallet creation should succeed");
        engine
            .deposit(&wallet.get_address(), myc * UNITS_PER_COIN)
            .expect("deposit should succeed");
        wallet
    }

    fn submit(engine: &TransactionEngine, from: &Wallet, to: &str, myc: u64) -> Transaction {
        engine
            .submit_transfer(
                &from.get_address(),
                to,
                myc * UNITS_PER_COIN,
                DEFAULT_GAS_PRICE,
                from.get_pkcs8(),
            )
            .expect("submit should succeed")
    }

    #[test]
    fn test_mining_an_empty_pool_is_rejected() {
        let (_engine, db, _dir) = temp_setup();
        let miner_wallet = Wallet::new().expect("wallet creation should succeed");
        let miner = Miner::with_params(db.clone(), 2, 10 * UNITS_PER_COIN);

        let result = miner.mine(&miner_wallet.get_address());
        assert!(matches!(result, Err(LedgerError::MiningPrecondition(_))));
        assert!(db.latest_block().expect("latest should succeed").is_none());
    }

    #[test]
    fn test_mine_commits_pending_transactions_into_a_block() {
        let (engine, db, _dir) = temp_setup();
        let alice = funded_wallet(&engine, 100);
        let bob = Wallet::new().expect("wallet creation should succeed");
        let miner_wallet = Wallet::new().expect("wallet creation should succeed");

        let first = submit(&engine, &alice, &bob.get_address(), 30);
        let second = submit(&engine, &alice, &bob.get_address(), 10);

        let miner = Miner::with_params(db.clone(), 2, 10 * UNITS_PER_COIN);
        let summary = miner
            .mine(&miner_wallet.get_address())
            .expect("mining should succeed");

        assert_eq!(summary.index, 0);
        assert_eq!(summary.transactions, 2);
        assert!(summary.hash.starts_with("00"));
        assert_eq!(db.pending_len(), 0);

        let block = db
            .latest_block()
            .expect("latest should succeed")
            .expect("mined block should be stored");
        assert_eq!(block.get_hash(), summary.hash);
        assert!(ProofOfWork::validate(&block));

        for id in [first.get_id(), second.get_id()] {
            let tx = db
                .get_confirmed(id)
                .expect("lookup should succeed")
                .expect("mined transaction should be in the log");
            assert_eq!(tx.get_status(), TxStatus::Confirmed);
            assert_eq!(tx.get_block_hash(), Some(summary.hash.as_str()));
            assert_eq!(tx.get_block_number(), Some(0));
        }

        // 100 - 30 - 21 - 10 - 21 leaves 18; the miner earns the reward.
        let balances = BalanceEngine::new(db.clone());
        assert_eq!(
            balances
                .balance(&alice.get_address())
                .expect("balance should succeed"),
            18 * UNITS_PER_COIN
        );
        assert_eq!(
            balances
                .balance(&miner_wallet.get_address())
                .expect("balance should succeed"),
            10 * UNITS_PER_COIN
        );
    }

    #[test]
    fn test_block_capacity_takes_the_oldest_ten() {
        let (engine, db, _dir) = temp_setup();
        let alice = funded_wallet(&engine, 1_000);
        let bob = Wallet::new().expect("wallet creation should succeed");
        let miner_wallet = Wallet::new().expect("wallet creation should succeed");

        let mut submitted = Vec::new();
        for _ in 0..12 {
            submitted.push(submit(&engine, &alice, &bob.get_address(), 1));
        }

        let miner = Miner::with_params(db.clone(), 1, 10 * UNITS_PER_COIN);
        let summary = miner
            .mine(&miner_wallet.get_address())
            .expect("mining should succeed");
        assert_eq!(summary.transactions, BLOCK_TRANSACTION_CAP);

        // The two newest submissions are still waiting.
        let remaining: Vec<String> = db
            .list_pending()
            .expect("list should succeed")
            .iter()
            .map(|tx| tx.get_id().to_string())
            .collect();
        assert_eq!(
            remaining,
            vec![submitted[10].get_id(), submitted[11].get_id()]
        );
    }

    #[test]
    fn test_blocks_chain_by_previous_hash() {
        let (engine, db, _dir) = temp_setup();
        let alice = funded_wallet(&engine, 1_000);
        let bob = Wallet::new().expect("wallet creation should succeed");
        let miner_wallet = Wallet::new().expect("wallet creation should succeed");
        let miner = Miner::with_params(db.clone(), 1, 10 * UNITS_PER_COIN);

        submit(&engine, &alice, &bob.get_address(), 5);
        let first = miner
            .mine(&miner_wallet.get_address())
            .expect("first mine should succeed");

        submit(&engine, &alice, &bob.get_address(), 5);
        let second = miner
            .mine(&miner_wallet.get_address())
            .expect("second mine should succeed");

        assert_eq!(first.index, 0);
        assert_eq!(second.index, 1);

        let blocks = db.list_blocks().expect("list should succeed");
        assert_eq!(blocks[0].get_previous_hash(), crate::core::GENESIS_PREVIOUS_HASH);
        assert_eq!(blocks[1].get_previous_hash(), blocks[0].get_hash());

        // Two blocks, one reward each.
        let balances = BalanceEngine::new(db.clone());
        assert_eq!(
            balances
                .balance(&miner_wallet.get_address())
                .expect("balance should succeed"),
            20 * UNITS_PER_COIN
        );
    }

    #[test]
    fn test_cancelled_search_commits_nothing() {
        let (engine, db, _dir) = temp_setup();
        let alice = funded_wallet(&engine, 100);
        let bob = Wallet::new().expect("wallet creation should succeed");
        let miner_wallet = Wallet::new().expect("wallet creation should succeed");

        submit(&engine, &alice, &bob.get_address(), 5);

        // A 16-digit zero prefix is out of reach; the search only ends when
        // the flag is raised.
        let miner = Miner::with_params(db.clone(), 16, 10 * UNITS_PER_COIN);
        let cancel = miner.cancel_handle();
        let miner_address = miner_wallet.get_address();
        let worker = thread::spawn(move || miner.mine(&miner_address));

        thread::sleep(Duration::from_millis(100));
        cancel.store(true, Ordering::Relaxed);
        let result = worker.join().expect("mining thread should not panic");

        assert!(matches!(result, Err(LedgerError::Mining(_))));
        assert_eq!(db.pending_len(), 1);
        assert!(db.latest_block().expect("latest should succeed").is_none());
    }

    #[test]
    fn test_mining_refreshes_the_miner_advisory_balance() {
        let (engine, db, _dir) = temp_setup();
        let alice = funded_wallet(&engine, 100);
        let bob = Wallet::new().expect("wallet creation should succeed");
        let miner_wallet = Wallet::new().expect("wallet creation should succeed");
        let record = crate::wallet::WalletRecord::from_wallet(&miner_wallet, None)
            .expect("record creation should succeed");
        db.put_wallet(&record).expect("put should succeed");

        submit(&engine, &alice, &bob.get_address(), 5);
        let miner = Miner::with_params(db.clone(), 2, 10 * UNITS_PER_COIN);
        miner
            .mine(&miner_wallet.get_address())
            .expect("mining should succeed");

        let stored = db
            .get_wallet(&miner_wallet.get_address())
            .expect("get should succeed")
            .expect("record should exist");
        assert_eq!(stored.balance, 10 * UNITS_PER_COIN);
    }
}
