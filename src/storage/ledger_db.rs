// This is the durable store backing the whole ledger - I keep everything the
// node knows in Sled trees: wallet records, the append-only confirmed log,
// the pending pool and the chain of mined blocks.
// Log and pool keys are big-endian u64 sequences, so Sled's key order is
// exactly insertion order.

use crate::config::GLOBAL_CONFIG;
use crate::core::{Block, Transaction};
use crate::error::{LedgerError, Result};
use crate::utils::{deserialize, serialize};
use crate::wallet::WalletRecord;
use sled::transaction::{abort, TransactionError};
use sled::{Db, Transactional, Tree};
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

// I use these constants to organize my database storage
const WALLETS_TREE: &str = "wallets"; // address -> wallet record
const TX_LOG_TREE: &str = "txlog"; // sequence -> confirmed transaction
const TX_INDEX_TREE: &str = "txids"; // transaction id -> log sequence
const PENDING_TREE: &str = "pending"; // sequence -> pending transaction
const PENDING_INDEX_TREE: &str = "pendids"; // transaction id -> pool sequence
const BLOCKS_TREE: &str = "blocks"; // block index -> block

/// The single authoritative store for one node. Clones share the same
/// database handle and the same operation lock, so every logical
/// read-modify-write in the process serializes through one writer at a time.
#[derive(Clone)]
pub struct LedgerDb {
    db: Db,
    db_path: PathBuf,
    // One guard for every logical operation: engines hold the write guard
    // across their whole read-decide-commit sequence, replays hold the read
    // guard so they never observe a half-applied commit.
    ops_lock: Arc<RwLock<()>>,
}

impl LedgerDb {
    /// Open (or create) the store at the configured data directory.
    pub fn open() -> Result<LedgerDb> {
        Self::open_with_path(&GLOBAL_CONFIG.data_dir())
    }

    /// Open (or create) the store at an explicit path. Tests point this at a
    /// temporary directory.
    pub fn open_with_path(db_path: &str) -> Result<LedgerDb> {
        let path = PathBuf::from(db_path);
        let db = sled::open(&path)
            .map_err(|e| LedgerError::Database(format!("Failed to open database: {e}")))?;

        Ok(LedgerDb {
            db,
            db_path: path,
            ops_lock: Arc::new(RwLock::new(())),
        })
    }

    pub fn get_db_path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Take the write guard for one logical operation. Callers hold it across
    /// their whole read-decide-commit sequence.
    pub fn lock_writes(&self) -> RwLockWriteGuard<'_, ()> {
        self.ops_lock
            .write()
            .expect("Failed to acquire write lock on ledger operations - this should never happen")
    }

    /// Take the read guard for replay-style aggregation.
    pub fn lock_reads(&self) -> RwLockReadGuard<'_, ()> {
        self.ops_lock
            .read()
            .expect("Failed to acquire read lock on ledger operations - this should never happen")
    }

    pub fn flush(&self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| LedgerError::Database(format!("Failed to flush database: {e}")))?;
        Ok(())
    }

    fn tree(&self, name: &str) -> Result<Tree> {
        self.db
            .open_tree(name)
            .map_err(|e| LedgerError::Database(format!("Failed to open {name} tree: {e}")))
    }

    // Sequence keys are handed out outside the Sled transaction; the caller's
    // write guard keeps them unique.
    fn next_seq(tree: &Tree) -> Result<u64> {
        let last = tree
            .last()
            .map_err(|e| LedgerError::Database(format!("Failed to read last sequence: {e}")))?;
        Ok(match last {
            Some((key, _)) => Self::decode_seq(key.as_ref())? + 1,
            None => 0,
        })
    }

    fn decode_seq(bytes: &[u8]) -> Result<u64> {
        let fixed: [u8; 8] = bytes
            .try_into()
            .map_err(|_| LedgerError::Database("Malformed sequence key".to_string()))?;
        Ok(u64::from_be_bytes(fixed))
    }

    pub fn put_wallet(&self, record: &WalletRecord) -> Result<()> {
        let wallets_tree = self.tree(WALLETS_TREE)?;
        wallets_tree
            .insert(record.address.as_bytes(), serialize(record)?)
            .map_err(|e| LedgerError::Database(format!("Failed to store wallet record: {e}")))?;
        self.flush()
    }

    pub fn get_wallet(&self, address: &str) -> Result<Option<WalletRecord>> {
        let wallets_tree = self.tree(WALLETS_TREE)?;
        let data = wallets_tree
            .get(address.as_bytes())
            .map_err(|e| LedgerError::Database(format!("Failed to get wallet record: {e}")))?;
        match data {
            Some(bytes) => Ok(Some(deserialize(bytes.as_ref())?)),
            None => Ok(None),
        }
    }

    pub fn list_wallets(&self) -> Result<Vec<WalletRecord>> {
        let wallets_tree = self.tree(WALLETS_TREE)?;
        let mut records = Vec::new();
        for item in wallets_tree.iter() {
            let (_, value) = item
                .map_err(|e| LedgerError::Database(format!("Failed to iterate wallets: {e}")))?;
            records.push(deserialize(value.as_ref())?);
        }
        Ok(records)
    }

    /// Recover a wallet record through its recovery passphrase. Linear scan;
    /// the wallet population on a single node stays small.
    pub fn find_wallet_by_passphrase(&self, passphrase: &str) -> Result<Option<WalletRecord>> {
        for record in self.list_wallets()? {
            if record.passphrase.as_deref() == Some(passphrase) {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// Append a transaction to the tail of the pending pool.
    pub fn append_pending_transaction(&self, tx: &Transaction) -> Result<()> {
        let pending_tree = self.tree(PENDING_TREE)?;
        let pending_index = self.tree(PENDING_INDEX_TREE)?;

        let seq_key = Self::next_seq(&pending_tree)?.to_be_bytes();
        let id = tx.get_id().to_string();
        let tx_bytes = tx.serialize()?;

        (&pending_tree, &pending_index)
            .transaction(|(pending, pendids)| {
                pending.insert(&seq_key[..], tx_bytes.as_slice())?;
                pendids.insert(id.as_bytes(), &seq_key[..])?;
                Ok(())
            })
            .map_err(|e: TransactionError| {
                LedgerError::Database(format!("Failed to append pending transaction: {e}"))
            })?;

        self.flush()
    }

    pub fn get_pending(&self, id: &str) -> Result<Option<Transaction>> {
        let pending_index = self.tree(PENDING_INDEX_TREE)?;
        let seq_bytes = match pending_index
            .get(id.as_bytes())
            .map_err(|e| LedgerError::Database(format!("Failed to look up pending id: {e}")))?
        {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        let pending_tree = self.tree(PENDING_TREE)?;
        let data = pending_tree
            .get(seq_bytes.as_ref())
            .map_err(|e| LedgerError::Database(format!("Failed to get pending transaction: {e}")))?
            .ok_or_else(|| {
                LedgerError::Database("Pending index points at a missing entry".to_string())
            })?;
        Ok(Some(Transaction::deserialize(data.as_ref())?))
    }

    /// Remove a transaction from the pending pool, returning it if it was
    /// there. Cancellation and failed confirmations both land here.
    pub fn remove_pending(&self, id: &str) -> Result<Option<Transaction>> {
        let pending_tree = self.tree(PENDING_TREE)?;
        let pending_index = self.tree(PENDING_INDEX_TREE)?;
        let id_key = id.as_bytes().to_vec();

        let removed = (&pending_tree, &pending_index)
            .transaction(|(pending, pendids)| {
                let seq_bytes = match pendids.remove(id_key.as_slice())? {
                    Some(bytes) => bytes,
                    None => return Ok(None),
                };
                Ok(pending.remove(seq_bytes.as_ref())?)
            })
            .map_err(|e: TransactionError| {
                LedgerError::Database(format!("Failed to remove pending transaction: {e}"))
            })?;

        match removed {
            Some(bytes) => {
                self.flush()?;
                Ok(Some(Transaction::deserialize(bytes.as_ref())?))
            }
            None => Ok(None),
        }
    }

    /// The pending pool in arrival order.
    pub fn list_pending(&self) -> Result<Vec<Transaction>> {
        let pending_tree = self.tree(PENDING_TREE)?;
        let mut transactions = Vec::new();
        for item in pending_tree.iter() {
            let (_, value) = item.map_err(|e| {
                LedgerError::Database(format!("Failed to iterate pending pool: {e}"))
            })?;
            transactions.push(Transaction::deserialize(value.as_ref())?);
        }
        Ok(transactions)
    }

    pub fn pending_len(&self) -> usize {
        match self.tree(PENDING_TREE) {
            Ok(tree) => tree.len(),
            Err(e) => {
                log::error!("Failed to read pending pool size: {e}");
                0
            }
        }
    }

    /// Append a transaction straight to the confirmed log. System deposits
    /// take this path; transfers go through `commit_confirmation` or
    /// `commit_mined_block` instead.
    pub fn append_confirmed_transaction(&self, tx: &Transaction) -> Result<()> {
        let log_tree = self.tree(TX_LOG_TREE)?;
        let log_index = self.tree(TX_INDEX_TREE)?;

        let seq_key = Self::next_seq(&log_tree)?.to_be_bytes();
        let id = tx.get_id().to_string();
        let tx_bytes = tx.serialize()?;

        (&log_tree, &log_index)
            .transaction(|(log, txids)| {
                log.insert(&seq_key[..], tx_bytes.as_slice())?;
                txids.insert(id.as_bytes(), &seq_key[..])?;
                Ok(())
            })
            .map_err(|e: TransactionError| {
                LedgerError::Database(format!("Failed to append confirmed transaction: {e}"))
            })?;

        self.flush()
    }

    pub fn get_confirmed(&self, id: &str) -> Result<Option<Transaction>> {
        let log_index = self.tree(TX_INDEX_TREE)?;
        let seq_bytes = match log_index
            .get(id.as_bytes())
            .map_err(|e| LedgerError::Database(format!("Failed to look up transaction id: {e}")))?
        {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        let log_tree = self.tree(TX_LOG_TREE)?;
        let data = log_tree
            .get(seq_bytes.as_ref())
            .map_err(|e| LedgerError::Database(format!("Failed to get transaction: {e}")))?
            .ok_or_else(|| {
                LedgerError::Database("Transaction index points at a missing entry".to_string())
            })?;
        Ok(Some(Transaction::deserialize(data.as_ref())?))
    }

    /// Look up a transaction wherever it currently lives: the pending pool
    /// first, then the confirmed log.
    pub fn get_transaction(&self, id: &str) -> Result<Option<Transaction>> {
        if let Some(tx) = self.get_pending(id)? {
            return Ok(Some(tx));
        }
        self.get_confirmed(id)
    }

    /// The confirmed log in append order. Balance replay walks this.
    pub fn list_confirmed_transactions(&self) -> Result<Vec<Transaction>> {
        let log_tree = self.tree(TX_LOG_TREE)?;
        let mut transactions = Vec::new();
        for item in log_tree.iter() {
            let (_, value) = item.map_err(|e| {
                LedgerError::Database(format!("Failed to iterate transaction log: {e}"))
            })?;
            transactions.push(Transaction::deserialize(value.as_ref())?);
        }
        Ok(transactions)
    }

    pub fn confirmed_transactions_for(&self, address: &str) -> Result<Vec<Transaction>> {
        Ok(self
            .list_confirmed_transactions()?
            .into_iter()
            .filter(|tx| tx.involves(address))
            .collect())
    }

    /// Append a block at its own index. The mined path uses
    /// `commit_mined_block`; this is the raw contract operation.
    pub fn append_block(&self, block: &Block) -> Result<()> {
        let blocks_tree = self.tree(BLOCKS_TREE)?;
        let key = block.get_index().to_be_bytes();
        blocks_tree
            .insert(&key[..], block.clone())
            .map_err(|e| LedgerError::Database(format!("Failed to store block: {e}")))?;
        self.flush()
    }

    pub fn latest_block(&self) -> Result<Option<Block>> {
        let blocks_tree = self.tree(BLOCKS_TREE)?;
        let last = blocks_tree
            .last()
            .map_err(|e| LedgerError::Database(format!("Failed to read latest block: {e}")))?;
        match last {
            Some((_, value)) => Ok(Some(Block::deserialize(value.as_ref())?)),
            None => Ok(None),
        }
    }

    pub fn list_blocks(&self) -> Result<Vec<Block>> {
        let blocks_tree = self.tree(BLOCKS_TREE)?;
        let mut blocks = Vec::new();
        for item in blocks_tree.iter() {
            let (_, value) = item
                .map_err(|e| LedgerError::Database(format!("Failed to iterate blocks: {e}")))?;
            blocks.push(Block::deserialize(value.as_ref())?);
        }
        Ok(blocks)
    }

    /// Move one pending transaction to the confirmed log in a single Sled
    /// transaction. The transaction must already carry its confirmed status;
    /// an id that is no longer pending aborts with `NotFound`.
    pub fn commit_confirmation(&self, tx: &Transaction) -> Result<()> {
        let pending_tree = self.tree(PENDING_TREE)?;
        let pending_index = self.tree(PENDING_INDEX_TREE)?;
        let log_tree = self.tree(TX_LOG_TREE)?;
        let log_index = self.tree(TX_INDEX_TREE)?;

        let log_key = Self::next_seq(&log_tree)?.to_be_bytes();
        let id = tx.get_id().to_string();
        let tx_bytes = tx.serialize()?;

        (&pending_tree, &pending_index, &log_tree, &log_index)
            .transaction(|(pending, pendids, log, txids)| {
                let seq_bytes = match pendids.remove(id.as_bytes())? {
                    Some(bytes) => bytes,
                    None => {
                        return abort(LedgerError::NotFound(format!("pending transaction {id}")));
                    }
                };
                pending.remove(seq_bytes.as_ref())?;
                log.insert(&log_key[..], tx_bytes.as_slice())?;
                txids.insert(id.as_bytes(), &log_key[..])?;
                Ok(())
            })
            .map_err(|e| match e {
                TransactionError::Abort(err) => err,
                TransactionError::Storage(err) => {
                    LedgerError::Database(format!("Failed to commit confirmation: {err}"))
                }
            })?;

        self.flush()
    }

    /// Commit a mined block: every contained transaction moves from the
    /// pending pool to the confirmed log and the block is appended, all in
    /// one Sled transaction. If any selected transaction has left the pool
    /// since the mining snapshot was taken, nothing is written and the
    /// caller gets a retryable mining error.
    pub fn commit_mined_block(&self, block: &Block) -> Result<()> {
        let pending_tree = self.tree(PENDING_TREE)?;
        let pending_index = self.tree(PENDING_INDEX_TREE)?;
        let log_tree = self.tree(TX_LOG_TREE)?;
        let log_index = self.tree(TX_INDEX_TREE)?;
        let blocks_tree = self.tree(BLOCKS_TREE)?;

        let first_seq = Self::next_seq(&log_tree)?;
        let block_key = block.get_index().to_be_bytes();
        let block_bytes = block.serialize()?;
        let mut entries = Vec::with_capacity(block.get_transactions().len());
        for tx in block.get_transactions() {
            entries.push((tx.get_id().to_string(), tx.serialize()?));
        }

        (
            &pending_tree,
            &pending_index,
            &log_tree,
            &log_index,
            &blocks_tree,
        )
        .transaction(|(pending, pendids, log, txids, blocks)| {
            for (offset, (id, tx_bytes)) in entries.iter().enumerate() {
                let seq_bytes = match pendids.remove(id.as_bytes())? {
                    Some(bytes) => bytes,
                    None => {
                        return abort(LedgerError::Mining(format!(
                            "Transaction {id} left the pending pool during the search"
                        )));
                    }
                };
                pending.remove(seq_bytes.as_ref())?;

                let log_key = (first_seq + offset as u64).to_be_bytes();
                log.insert(&log_key[..], tx_bytes.as_slice())?;
                txids.insert(id.as_bytes(), &log_key[..])?;
            }

            blocks.insert(&block_key[..], block_bytes.as_slice())?;
            Ok(())
        })
        .map_err(|e| match e {
            TransactionError::Abort(err) => err,
            TransactionError::Storage(err) => {
                LedgerError::Database(format!("Failed to commit mined block: {err}"))
            }
        })?;

        self.flush()
    }
}
