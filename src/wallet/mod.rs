//! Wallet management and cryptographic identity
//!
//! This module handles keypair creation and import, address derivation,
//! address validation, and recovery passphrases.

#[allow(clippy::module_inception)]
pub mod wallet;

pub mod passphrase;
pub mod record;

pub use passphrase::{generate_passphrase, PASSPHRASE_WORDS, WORDLIST};
pub use record::WalletRecord;
pub use wallet::{derive_address, validate_address, Wallet, ADDRESS_HEX_LEN, SYSTEM_ADDRESS};
