//! Data storage and persistence
//!
//! This module owns durable state: wallet records, the confirmed
//! transaction log, the pending pool, and the block chain, all backed
//! by a single Sled database.

pub mod ledger_db;

pub use ledger_db::LedgerDb;
