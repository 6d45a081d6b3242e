// Read-side portfolio analysis. Everything here is derived on demand from
// the confirmed log and the block chain; nothing is cached or stored.
// "Money in" counts transfer credits, deposits, and mining rewards alike.

use crate::core::BalanceEngine;
use crate::error::{LedgerError, Result};
use crate::storage::LedgerDb;
use crate::utils::current_timestamp;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use std::collections::HashMap;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Profit, loss, and activity for one address.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioStats {
    pub address: String,
    /// The replayed balance.
    pub total_value: u64,
    pub total_received: u64,
    pub total_sent: u64,
    pub total_fees: u64,
    pub transaction_count: usize,
    pub avg_transaction_value: u64,
    /// Received minus sent minus fees; negative for net spenders.
    pub profit: i128,
    pub profit_percentage: f64,
    /// Money in minus money out over the last 30 days, rewards included.
    pub monthly_change: i128,
    /// Relative to the balance 30 days ago; zero when that balance was zero.
    pub monthly_change_percentage: f64,
    pub activity_24h: usize,
    pub activity_7d: usize,
    pub activity_30d: usize,
}

/// One day of an address history. `balance` is the end-of-day balance,
/// reconstructed by walking back from the current replayed balance.
#[derive(Debug, Clone, Serialize)]
pub struct DailyActivity {
    pub date: String,
    pub sent: u64,
    pub received: u64,
    pub net_change: i128,
    pub balance: u64,
}

/// Pending and confirmed counts for one address. Failed transactions are
/// dropped at failure time, so they never appear here.
#[derive(Debug, Clone, Serialize)]
pub struct TxSummary {
    pub total: usize,
    pub confirmed: usize,
    pub pending: usize,
}

#[derive(Clone)]
pub struct PortfolioAnalyzer {
    store: LedgerDb,
    balances: BalanceEngine,
}

impl PortfolioAnalyzer {
    pub fn new(store: LedgerDb) -> PortfolioAnalyzer {
        let balances = BalanceEngine::new(store.clone());
        PortfolioAnalyzer { store, balances }
    }

    pub fn stats(&self, address: &str) -> Result<PortfolioStats> {
        self.stats_at(address, current_timestamp()?)
    }

    fn stats_at(&self, address: &str, now: i64) -> Result<PortfolioStats> {
        let _guard = self.store.lock_reads();

        let cutoff_24h = now - MILLIS_PER_DAY;
        let cutoff_7d = now - 7 * MILLIS_PER_DAY;
        let cutoff_30d = now - 30 * MILLIS_PER_DAY;

        let mut stats = PortfolioStats {
            address: address.to_string(),
            total_value: 0,
            total_received: 0,
            total_sent: 0,
            total_fees: 0,
            transaction_count: 0,
            avg_transaction_value: 0,
            profit: 0,
            profit_percentage: 0.0,
            monthly_change: 0,
            monthly_change_percentage: 0.0,
            activity_24h: 0,
            activity_7d: 0,
            activity_30d: 0,
        };
        let mut monthly_in: i128 = 0;
        let mut monthly_out: i128 = 0;

        for tx in self.store.confirmed_transactions_for(address)? {
            stats.transaction_count += 1;
            let ts = tx.get_timestamp();
            if ts >= cutoff_24h {
                stats.activity_24h += 1;
            }
            if ts >= cutoff_7d {
                stats.activity_7d += 1;
            }
            if ts >= cutoff_30d {
                stats.activity_30d += 1;
            }

            if tx.get_to() == address {
                stats.total_received += tx.get_amount();
                if ts >= cutoff_30d {
                    monthly_in += tx.get_amount() as i128;
                }
            }
            if tx.get_from() == address {
                stats.total_sent += tx.get_amount();
                stats.total_fees += tx.get_fee();
                if ts >= cutoff_30d {
                    monthly_out += tx.total_cost() as i128;
                }
            }
        }
        for block in self.store.list_blocks()? {
            if block.get_miner() == address && block.get_timestamp() >= cutoff_30d {
                monthly_in += block.get_reward() as i128;
            }
        }

        stats.total_value = self.balances.balance_internal(address)?;
        if stats.transaction_count > 0 {
            stats.avg_transaction_value =
                (stats.total_received + stats.total_sent) / stats.transaction_count as u64;
        }
        stats.profit = stats.total_received as i128
            - stats.total_sent as i128
            - stats.total_fees as i128;
        if stats.total_sent > 0 {
            stats.profit_percentage =
                stats.profit as f64 / stats.total_sent as f64 * 100.0;
        }

        stats.monthly_change = monthly_in - monthly_out;
        let balance_30d_ago = stats.total_value as i128 - stats.monthly_change;
        if balance_30d_ago > 0 {
            stats.monthly_change_percentage =
                stats.monthly_change as f64 / balance_30d_ago as f64 * 100.0;
        }

        Ok(stats)
    }

    /// Daily activity buckets for the last `days` days, oldest first.
    pub fn history(&self, address: &str, days: u32) -> Result<Vec<DailyActivity>> {
        self.history_at(address, days, current_timestamp()?)
    }

    fn history_at(&self, address: &str, days: u32, now: i64) -> Result<Vec<DailyActivity>> {
        let _guard = self.store.lock_reads();

        let today = Utc
            .timestamp_millis_opt(now)
            .single()
            .ok_or_else(|| LedgerError::Validation("Timestamp out of range".to_string()))?
            .date_naive();

        // (money out, money in) per calendar day, UTC.
        let mut per_day: HashMap<NaiveDate, (u64, u64)> = HashMap::new();
        for tx in self.store.confirmed_transactions_for(address)? {
            let date = match Utc.timestamp_millis_opt(tx.get_timestamp()).single() {
                Some(dt) => dt.date_naive(),
                None => continue,
            };
            let entry = per_day.entry(date).or_insert((0, 0));
            if tx.get_from() == address {
                entry.0 += tx.get_amount() + tx.get_fee();
            }
            if tx.get_to() == address {
                entry.1 += tx.get_amount();
            }
        }
        for block in self.store.list_blocks()? {
            if block.get_miner() != address {
                continue;
            }
            let date = match Utc.timestamp_millis_opt(block.get_timestamp()).single() {
                Some(dt) => dt.date_naive(),
                None => continue,
            };
            per_day.entry(date).or_insert((0, 0)).1 += block.get_reward();
        }

        // Walk back from the current balance to reconstruct each day's close.
        let mut balance = self.balances.balance_internal(address)? as i128;
        let mut buckets = Vec::with_capacity(days as usize);
        for offset in 0..days {
            let date = today - Duration::days(offset as i64);
            let (sent, received) = *per_day.get(&date).unwrap_or(&(0, 0));
            let net_change = received as i128 - sent as i128;
            buckets.push(DailyActivity {
                date: date.format("%Y-%m-%d").to_string(),
                sent,
                received,
                net_change,
                balance: if balance < 0 { 0 } else { balance as u64 },
            });
            balance -= net_change;
        }
        buckets.reverse();
        Ok(buckets)
    }

    /// How many of the address's transactions sit in each settlement state.
    pub fn summary(&self, address: &str) -> Result<TxSummary> {
        let _guard = self.store.lock_reads();

        let confirmed = self.store.confirmed_transactions_for(address)?.len();
        let pending = self
            .store
            .list_pending()?
            .iter()
            .filter(|tx| tx.involves(address))
            .count();
        Ok(TxSummary {
            total: confirmed + pending,
            confirmed,
            pending,
        })
    }
}
