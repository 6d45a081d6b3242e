//! Core ledger functionality
//!
//! This module contains the fundamental ledger components including
//! transactions, blocks, proof-of-work mining, confirmation scheduling,
//! and the read-side balance and portfolio engines.

pub mod balance;
pub mod block;
pub mod engine;
pub mod miner;
pub mod monetary;
pub mod portfolio;
pub mod processor;
pub mod proof_of_work;
pub mod stats;
pub mod transaction;

pub use balance::{AddressStats, BalanceEngine};
pub use block::{Block, GENESIS_PREVIOUS_HASH};
pub use engine::{ConfirmOutcome, TransactionEngine, TxQueryStatus};
pub use miner::{MinedBlock, Miner, BLOCK_TRANSACTION_CAP};
pub use monetary::{
    calculate_fee, DEFAULT_GAS_PRICE, MAX_DEPOSIT, MIN_DEPOSIT, TRANSFER_GAS, UNITS_PER_COIN,
};
pub use portfolio::{DailyActivity, PortfolioAnalyzer, PortfolioStats, TxSummary};
pub use processor::ConfirmationProcessor;
pub use proof_of_work::ProofOfWork;
pub use stats::NetworkStats;
pub use transaction::{Transaction, TxStatus};
