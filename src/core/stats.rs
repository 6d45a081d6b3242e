// Network-wide aggregates for the stats command. Like the portfolio module
// this derives everything from the log and the chain on each call.

use crate::config::GLOBAL_CONFIG;
use crate::core::monetary::UNITS_PER_COIN;
use crate::core::BalanceEngine;
use crate::error::Result;
use crate::storage::LedgerDb;
use crate::utils::current_timestamp;
use crate::wallet::SYSTEM_ADDRESS;
use serde::Serialize;
use std::collections::BTreeSet;

const MILLIS_PER_DAY: i64 = 86_400_000;
const TOP_BALANCES: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct RichAddress {
    pub address: String,
    pub balance: u64,
}

/// A snapshot of the whole ledger.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkStats {
    pub total_blocks: u64,
    /// Length of the confirmed log, deposits included.
    pub total_transactions: u64,
    pub pending_transactions: usize,
    /// Sum of all block rewards ever paid out.
    pub total_supply: u64,
    pub total_fees_burned: u64,
    pub difficulty: u32,
    pub block_reward: u64,
    /// Mean spacing of consecutive blocks; zero with fewer than two blocks.
    pub average_block_interval_ms: i64,
    pub blocks_24h: usize,
    pub volume_24h: u64,
    /// The richest addresses by replayed balance, largest first.
    pub top_balances: Vec<RichAddress>,
}

impl NetworkStats {
    pub fn collect(store: &LedgerDb) -> Result<NetworkStats> {
        Self::collect_at(store, current_timestamp()?)
    }

    fn collect_at(store: &LedgerDb, now: i64) -> Result<NetworkStats> {
        let _guard = store.lock_reads();
        let balances = BalanceEngine::new(store.clone());
        let cutoff_24h = now - MILLIS_PER_DAY;

        let blocks = store.list_blocks()?;
        let confirmed = store.list_confirmed_transactions()?;

        let mut stats = NetworkStats {
            total_blocks: blocks.len() as u64,
            total_transactions: confirmed.len() as u64,
            pending_transactions: store.pending_len(),
            total_supply: blocks.iter().map(|b| b.get_reward()).sum(),
            total_fees_burned: confirmed.iter().map(|tx| tx.get_fee()).sum(),
            difficulty: GLOBAL_CONFIG.difficulty(),
            block_reward: GLOBAL_CONFIG.mining_reward_myc() * UNITS_PER_COIN,
            average_block_interval_ms: 0,
            blocks_24h: blocks
                .iter()
                .filter(|b| b.get_timestamp() >= cutoff_24h)
                .count(),
            volume_24h: confirmed
                .iter()
                .filter(|tx| tx.get_timestamp() >= cutoff_24h)
                .map(|tx| tx.get_amount())
                .sum(),
            top_balances: Vec::new(),
        };

        // Blocks come back ordered by index, so the mean spacing collapses
        // to the endpoints.
        if blocks.len() >= 2 {
            let span = blocks[blocks.len() - 1].get_timestamp() - blocks[0].get_timestamp();
            stats.average_block_interval_ms = span / (blocks.len() as i64 - 1);
        }

        let mut addresses: BTreeSet<String> = BTreeSet::new();
        for tx in &confirmed {
            if tx.get_from() != SYSTEM_ADDRESS {
                addresses.insert(tx.get_from().to_string());
            }
            addresses.insert(tx.get_to().to_string());
        }
        for block in &blocks {
            addresses.insert(block.get_miner().to_string());
        }
        let mut rich: Vec<RichAddress> = Vec::with_capacity(addresses.len());
        for address in addresses {
            let balance = balances.balance_internal(&address)?;
            rich.push(RichAddress { address, balance });
        }
        rich.sort_by(|a, b| {
            b.balance
                .cmp(&a.balance)
                .then_with(|| a.address.cmp(&b.address))
        });
        rich.truncate(TOP_BALANCES);
        stats.top_balances = rich;

        Ok(stats)
    }
}
