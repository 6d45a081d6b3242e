use crate::error::{LedgerError, Result};
use data_encoding::HEXLOWER;
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Hex digits in an address after the `0x` prefix.
pub const ADDRESS_HEX_LEN: usize = 40;

/// Origin of system deposits; no keypair exists for it.
pub const SYSTEM_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// An in-memory keypair. The PKCS#8 document is handed to the owner at
/// creation time and never persisted by the ledger.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Wallet {
    pkcs8: Vec<u8>,
    #[zeroize(skip)]
    public_key: Vec<u8>,
}

impl Wallet {
    pub fn new() -> Result<Wallet> {
        let pkcs8 = crate::utils::new_key_pair()?;
        let rng = SystemRandom::new();
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8.as_ref(), &rng)
                .map_err(|e| {
                    LedgerError::Crypto(format!("Failed to create key pair from PKCS8: {e}"))
                })?;
        let public_key = key_pair.public_key().as_ref().to_vec();
        Ok(Wallet { pkcs8, public_key })
    }

    /// Rebuild a wallet from an exported PKCS#8 private key document.
    pub fn from_pkcs8(pkcs8: &[u8]) -> Result<Wallet> {
        let public_key = crate::utils::public_key_from_pkcs8(pkcs8)?;
        Ok(Wallet {
            pkcs8: pkcs8.to_vec(),
            public_key,
        })
    }

    pub fn get_address(&self) -> String {
        derive_address(self.public_key.as_slice())
    }

    pub fn get_public_key(&self) -> &[u8] {
        self.public_key.as_slice()
    }

    pub fn get_pkcs8(&self) -> &[u8] {
        self.pkcs8.as_slice()
    }
}

/// Derive the canonical address for a public key: `0x` followed by the first
/// 40 lowercase hex digits of its SHA-256 digest. Pure and stable: the same
/// key always maps to the same address.
pub fn derive_address(pub_key: &[u8]) -> String {
    let digest = crate::utils::sha256_digest(pub_key);
    let hex = HEXLOWER.encode(digest.as_slice());
    format!("0x{}", &hex[..ADDRESS_HEX_LEN])
}

/// Check the textual address form: `0x` plus exactly 40 hex digits.
/// Mixed case is accepted; derived addresses are always lowercase.
pub fn validate_address(address: &str) -> bool {
    let Some(body) = address.strip_prefix("0x") else {
        return false;
    };
    body.len() == ADDRESS_HEX_LEN && body.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_wallet_has_valid_address() {
        let wallet = Wallet::new().expect("wallet creation should succeed");
        let address = wallet.get_address();
        assert!(validate_address(&address));
        assert!(address.starts_with("0x"));
        assert_eq!(address.len(), 2 + ADDRESS_HEX_LEN);
        assert_eq!(address, address.to_lowercase());
    }

    #[test]
    fn derive_address_is_stable_and_distinct() {
        let a = Wallet::new().expect("wallet creation should succeed");
        let b = Wallet::new().expect("wallet creation should succeed");

        assert_eq!(
            derive_address(a.get_public_key()),
            derive_address(a.get_public_key())
        );
        assert_ne!(a.get_address(), b.get_address());
    }

    #[test]
    fn import_recovers_the_same_address() {
        let original = Wallet::new().expect("wallet creation should succeed");
        let imported = Wallet::from_pkcs8(original.get_pkcs8()).expect("import should succeed");
        assert_eq!(original.get_address(), imported.get_address());
        assert_eq!(original.get_public_key(), imported.get_public_key());
    }

    #[test]
    fn validate_address_rejects_malformed_input() {
        assert!(validate_address(SYSTEM_ADDRESS));
        assert!(!validate_address(""));
        assert!(!validate_address("0x"));
        assert!(!validate_address("1x0000000000000000000000000000000000000000"));
        // one digit short
        assert!(!validate_address("0x000000000000000000000000000000000000000"));
        // one digit long
        assert!(!validate_address("0x00000000000000000000000000000000000000000"));
        // non-hex character
        assert!(!validate_address("0xz000000000000000000000000000000000000000"));
        // uppercase hex is tolerated
        assert!(validate_address("0xABCDEF0000000000000000000000000000000000"));
    }
}
