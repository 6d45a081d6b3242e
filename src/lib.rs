//! # MyCoin - My Simulated Cryptocurrency Ledger
//!
//! This is my single-node MYC ledger, built from scratch in Rust.
//! When I come back to this code, here's what I need to remember:
//!
//! ## What I Built
//! - **Account Ledger**: Balances derived by replaying the confirmed log
//! - **Signed Transfers**: ECDSA P-256 signatures over the transfer identity
//! - **Timer Confirmations**: Pending transfers settle on a background timer
//! - **Proof-of-Work Blocks**: Capped FIFO batches mined from the pending pool
//! - **Portfolio Analytics**: Profit, daily history, and network statistics
//! - **Wallet System**: ECDSA P-256 key management with hex addresses
//!
//! ## How I Organized My Code
//! - `core/`: The heart of the ledger (transactions, blocks, mining, balances)
//! - `wallet/`: Key management, address derivation, wallet records
//! - `storage/`: The Sled-backed store holding every tree the node knows
//! - `config/`: Configuration management and environment overrides
//! - `utils/`: Cryptographic functions and utility helpers
//! - `cli/`: Command-line interface for all ledger operations
//!
//! ## Key Design Decisions I Made
//! - Used Sled embedded database for simplicity and reliability
//! - Implemented ECDSA P-256 for modern cryptographic security
//! - Derived balances from the log instead of trusting stored counters
//! - Burned fees outright so no collector address accumulates them
//! - Guarded every read-decide-commit sequence with one store-wide lock
//!
//! ## When I Need to Understand Something
//! 1. Start with `main.rs` to see the CLI commands
//! 2. Look at `core/engine.rs` for how transfers are validated and settled
//! 3. Check `core/miner.rs` for how pending batches become blocks
//! 4. Review `storage/ledger_db.rs` for the trees and their atomic commits
//! 5. Examine `wallet/wallet.rs` for key management
//!
//! Remember: I built this as a simulation, not a network node!
//! Every component has comprehensive tests and proper error handling.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;
pub mod utils;
pub mod wallet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::{Config, GLOBAL_CONFIG};
pub use crate::core::{
    BalanceEngine, Block, ConfirmOutcome, ConfirmationProcessor, MinedBlock, Miner, NetworkStats,
    PortfolioAnalyzer, ProofOfWork, Transaction, TransactionEngine, TxStatus,
};
pub use error::{LedgerError, Result};
pub use storage::LedgerDb;
pub use utils::{
    current_timestamp, ecdsa_p256_sha256_sign_digest, ecdsa_p256_sha256_sign_verify, new_key_pair,
    sha256_digest,
};
pub use wallet::{derive_address, validate_address, Wallet, SYSTEM_ADDRESS};
