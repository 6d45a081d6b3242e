// The transaction engine is the write side of the ledger. Every transfer,
// deposit, confirmation, and cancellation funnels through here, under the
// store's operation lock, so balance checks and state transitions never
// interleave.

use crate::core::monetary::{conversions, MAX_DEPOSIT, MIN_DEPOSIT};
use crate::core::{BalanceEngine, Transaction};
use crate::error::{LedgerError, Result};
use crate::storage::LedgerDb;
use crate::wallet::{validate_address, Wallet};
use std::fmt;

/// What a confirmation check decided. A shortfall at confirmation time is a
/// normal outcome, not an error: the transaction is failed and dropped.
#[derive(Debug, Clone)]
pub enum ConfirmOutcome {
    Confirmed(Transaction),
    Failed(Transaction),
}

/// Where a transaction id currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxQueryStatus {
    Pending,
    Confirmed,
    NotFound,
}

impl fmt::Display for TxQueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxQueryStatus::Pending => write!(f, "pending"),
            TxQueryStatus::Confirmed => write!(f, "confirmed"),
            TxQueryStatus::NotFound => write!(f, "not found"),
        }
    }
}

#[derive(Clone)]
pub struct TransactionEngine {
    store: LedgerDb,
    balances: BalanceEngine,
}

impl TransactionEngine {
    pub fn new(store: LedgerDb) -> TransactionEngine {
        let balances = BalanceEngine::new(store.clone());
        TransactionEngine { store, balances }
    }

    pub fn get_store(&self) -> &LedgerDb {
        &self.store
    }

    /// Validate, sign, and pool a transfer. The sender must control the
    /// private key for `from` and must be solvent for amount plus fee at
    /// submission time; solvency is re-checked again at confirmation.
    pub fn submit_transfer(
        &self,
        from: &str,
        to: &str,
        amount: u64,
        gas_price: u64,
        pkcs8: &[u8],
    ) -> Result<Transaction> {
        if !validate_address(from) {
            return Err(LedgerError::InvalidAddress(from.to_string()));
        }
        if !validate_address(to) {
            return Err(LedgerError::InvalidAddress(to.to_string()));
        }
        if amount == 0 {
            return Err(LedgerError::Validation(
                "Transfer amount must be greater than zero".to_string(),
            ));
        }
        if !conversions::is_valid_gas_price(gas_price) {
            return Err(LedgerError::Validation(format!(
                "Gas price {gas_price} is outside the accepted range"
            )));
        }
        let wallet = Wallet::from_pkcs8(pkcs8)?;
        if wallet.get_address() != from {
            return Err(LedgerError::Validation(
                "Private key does not control the sender address".to_string(),
            ));
        }

        let _guard = self.store.lock_writes();

        let tx = Transaction::new_transfer(from, to, amount, gas_price, pkcs8)?;
        if !tx.verify_signature(wallet.get_public_key())? {
            return Err(LedgerError::Validation(
                "Transaction signature failed verification".to_string(),
            ));
        }

        let available = self.balances.balance_internal(from)?;
        if (available as u128) < tx.total_cost() {
            return Err(LedgerError::InsufficientFunds {
                required: amount.saturating_add(tx.get_fee()),
                available,
            });
        }

        self.store.append_pending_transaction(&tx)?;
        log::info!(
            "Transaction {} accepted: {from} -> {to} for {}",
            tx.get_id(),
            conversions::format_units(amount)
        );
        Ok(tx)
    }

    /// Credit an address from the system. Deposits are confirmed on the spot
    /// and never enter the pending pool or a block.
    pub fn deposit(&self, address: &str, amount: u64) -> Result<Transaction> {
        if !validate_address(address) {
            return Err(LedgerError::InvalidAddress(address.to_string()));
        }
        if !conversions::is_valid_deposit(amount) {
            return Err(LedgerError::Validation(format!(
                "Deposit must be between {} and {}",
                conversions::format_units(MIN_DEPOSIT),
                conversions::format_units(MAX_DEPOSIT)
            )));
        }

        let _guard = self.store.lock_writes();

        let tx = Transaction::new_system_deposit(address, amount)?;
        self.store.append_confirmed_transaction(&tx)?;
        self.refresh_advisory_balance(address)?;
        log::info!(
            "Deposited {} into {address}",
            conversions::format_units(amount)
        );
        Ok(tx)
    }

    /// Settle one pending transaction. Solvency is re-checked against the
    /// current replayed balance: competing pendings settle first-come,
    /// first-served, and a shortfall fails the transaction instead of
    /// raising. An id that is no longer pending returns `NotFound`, which is
    /// how a late confirmation timer no-ops after mining or cancellation.
    pub fn confirm(&self, id: &str) -> Result<ConfirmOutcome> {
        let _guard = self.store.lock_writes();

        let mut tx = self
            .store
            .get_pending(id)?
            .ok_or_else(|| LedgerError::NotFound(format!("pending transaction {id}")))?;

        let available = self.balances.balance_internal(tx.get_from())?;
        if (available as u128) < tx.total_cost() {
            self.store.remove_pending(id)?;
            tx.mark_failed();
            log::warn!(
                "Transaction {id} failed at confirmation: required {}, available {}",
                tx.total_cost(),
                available
            );
            return Ok(ConfirmOutcome::Failed(tx));
        }

        tx.mark_confirmed();
        self.store.commit_confirmation(&tx)?;
        self.refresh_advisory_balance(tx.get_from())?;
        self.refresh_advisory_balance(tx.get_to())?;
        log::info!("Transaction {id} confirmed");
        Ok(ConfirmOutcome::Confirmed(tx))
    }

    /// Withdraw a transaction from the pool before it settles. Only pending
    /// transactions can be cancelled; anything else is `NotFound`.
    pub fn cancel(&self, id: &str) -> Result<Transaction> {
        let _guard = self.store.lock_writes();

        let tx = self
            .store
            .remove_pending(id)?
            .ok_or_else(|| LedgerError::NotFound(format!("pending transaction {id}")))?;
        log::info!("Transaction {id} cancelled");
        Ok(tx)
    }

    pub fn transaction_status(&self, id: &str) -> Result<TxQueryStatus> {
        let _guard = self.store.lock_reads();

        if self.store.get_pending(id)?.is_some() {
            return Ok(TxQueryStatus::Pending);
        }
        if self.store.get_confirmed(id)?.is_some() {
            return Ok(TxQueryStatus::Confirmed);
        }
        Ok(TxQueryStatus::NotFound)
    }

    pub fn transaction(&self, id: &str) -> Result<Transaction> {
        let _guard = self.store.lock_reads();

        self.store
            .get_transaction(id)?
            .ok_or_else(|| LedgerError::NotFound(format!("transaction {id}")))
    }

    /// Pending and confirmed transactions merged, newest first, optionally
    /// filtered to one address, paged by `limit` and `offset`.
    pub fn recent_transactions(
        &self,
        address: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Transaction>> {
        let _guard = self.store.lock_reads();

        let mut transactions = self.store.list_pending()?;
        transactions.extend(self.store.list_confirmed_transactions()?);
        if let Some(address) = address {
            transactions.retain(|tx| tx.involves(address));
        }
        transactions.sort_by(|a, b| b.get_timestamp().cmp(&a.get_timestamp()));
        Ok(transactions.into_iter().skip(offset).take(limit).collect())
    }

    // The cached balance on a wallet record is display-only. Refresh it when
    // we already hold the write guard and the record exists.
    fn refresh_advisory_balance(&self, address: &str) -> Result<()> {
        if let Some(mut record) = self.store.get_wallet(address)? {
            record.balance = self.balances.balance_internal(address)?;
            self.store.put_wallet(&record)?;
        }
        Ok(())
    }
}
