use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::wallet::Wallet;

/// The persisted view of a wallet. Holds no private key material; the
/// `balance` field is an advisory display cache only, refreshed
/// opportunistically. The authoritative balance is always a replay of the
/// confirmed log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct WalletRecord {
    pub address: String,
    pub public_key: Vec<u8>,
    pub created: i64,
    pub passphrase: Option<String>,
    pub balance: u64,
}

impl WalletRecord {
    pub fn from_wallet(wallet: &Wallet, passphrase: Option<String>) -> Result<WalletRecord> {
        Ok(WalletRecord {
            address: wallet.get_address(),
            public_key: wallet.get_public_key().to_vec(),
            created: crate::utils::current_timestamp()?,
            passphrase,
            balance: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_carries_no_private_key() {
        let wallet = Wallet::new().expect("wallet creation should succeed");
        let record = WalletRecord::from_wallet(&wallet, Some("alpha beta".to_string()))
            .expect("record creation should succeed");

        assert_eq!(record.address, wallet.get_address());
        assert_eq!(record.public_key, wallet.get_public_key());
        assert_eq!(record.balance, 0);
        assert!(record.created > 0);

        let bytes = crate::utils::serialize(&record).expect("record should serialize");
        let restored: WalletRecord =
            crate::utils::deserialize(&bytes).expect("record should deserialize");
        assert_eq!(record, restored);
    }
}
