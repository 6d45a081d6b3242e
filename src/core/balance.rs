// Balances are never stored - I derive them by replaying the confirmed log
// and crediting block rewards. The cached balance on a wallet record is a
// display convenience and is never read here.

use crate::core::Transaction;
use crate::error::Result;
use crate::storage::LedgerDb;
use serde::Serialize;

/// Per-address activity derived from the confirmed log.
#[derive(Debug, Clone, Serialize)]
pub struct AddressStats {
    pub address: String,
    pub balance: u64,
    pub sent_count: usize,
    pub received_count: usize,
    pub total_sent: u64,
    pub total_received: u64,
    pub total_fees: u64,
}

#[derive(Clone)]
pub struct BalanceEngine {
    store: LedgerDb,
}

impl BalanceEngine {
    pub fn new(store: LedgerDb) -> BalanceEngine {
        BalanceEngine { store }
    }

    /// The authoritative balance: credits minus debits (amount plus fee)
    /// across the confirmed log, plus rewards for every block this address
    /// mined, floored at zero.
    pub fn balance(&self, address: &str) -> Result<u64> {
        let _guard = self.store.lock_reads();
        self.balance_internal(address)
    }

    // Same replay without taking the read guard. Callers already hold one of
    // the store's guards.
    pub(crate) fn balance_internal(&self, address: &str) -> Result<u64> {
        let mut total: i128 = 0;

        for tx in self.store.list_confirmed_transactions()? {
            if tx.get_to() == address {
                total += tx.get_amount() as i128;
            }
            if tx.get_from() == address {
                total -= tx.total_cost() as i128;
            }
        }
        for block in self.store.list_blocks()? {
            if block.get_miner() == address {
                total += block.get_reward() as i128;
            }
        }

        Ok(if total < 0 { 0 } else { total as u64 })
    }

    /// Confirmed transactions touching this address, in log order.
    pub fn transactions_for(&self, address: &str) -> Result<Vec<Transaction>> {
        let _guard = self.store.lock_reads();
        self.store.confirmed_transactions_for(address)
    }

    pub fn address_stats(&self, address: &str) -> Result<AddressStats> {
        let _guard = self.store.lock_reads();

        let mut stats = AddressStats {
            address: address.to_string(),
            balance: 0,
            sent_count: 0,
            received_count: 0,
            total_sent: 0,
            total_received: 0,
            total_fees: 0,
        };

        for tx in self.store.confirmed_transactions_for(address)? {
            if tx.get_from() == address {
                stats.sent_count += 1;
                stats.total_sent += tx.get_amount();
                stats.total_fees += tx.get_fee();
            }
            if tx.get_to() == address {
                stats.received_count += 1;
                stats.total_received += tx.get_amount();
            }
        }
        stats.balance = self.balance_internal(address)?;

        Ok(stats)
    }
}
