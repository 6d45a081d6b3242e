// Confirmation timers live here. Every pending transaction gets one
// background thread that sleeps the configured delay and then asks the
// engine to settle it. The pending tree is the durable queue: on startup
// resume_pending() puts a timer behind every stored pending transaction,
// so confirmations survive restarts.

use crate::config::GLOBAL_CONFIG;
use crate::core::{ConfirmOutcome, Transaction, TransactionEngine};
use crate::error::{LedgerError, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub struct ConfirmationProcessor {
    engine: TransactionEngine,
    delay: Duration,
    // ( K -> transaction id, V => timer thread )
    timers: Arc<RwLock<HashMap<String, JoinHandle<()>>>>,
}

impl ConfirmationProcessor {
    pub fn new(engine: TransactionEngine) -> ConfirmationProcessor {
        Self::with_delay(engine, GLOBAL_CONFIG.confirmation_delay_ms())
    }

    pub fn with_delay(engine: TransactionEngine, delay_ms: u64) -> ConfirmationProcessor {
        ConfirmationProcessor {
            engine,
            delay: Duration::from_millis(delay_ms),
            timers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn get_engine(&self) -> &TransactionEngine {
        &self.engine
    }

    /// Submit a transfer and put a confirmation timer behind it.
    pub fn submit_transfer(
        &self,
        from: &str,
        to: &str,
        amount: u64,
        gas_price: u64,
        pkcs8: &[u8],
    ) -> Result<Transaction> {
        let tx = self
            .engine
            .submit_transfer(from, to, amount, gas_price, pkcs8)?;
        self.schedule(tx.get_id());
        Ok(tx)
    }

    /// Start a timer for one pending transaction. Scheduling an id that
    /// already has a timer is a no-op. Returns whether a timer was started.
    pub fn schedule(&self, id: &str) -> bool {
        match self.timers.read() {
            Ok(timers) => {
                if timers.contains_key(id) {
                    return false;
                }
            }
            Err(_) => {
                log::error!("Failed to acquire read lock on confirmation timers");
                return false;
            }
        }

        let engine = self.engine.clone();
        let delay = self.delay;
        let timer_id = id.to_string();
        let handle = thread::spawn(move || {
            thread::sleep(delay);
            match engine.confirm(&timer_id) {
                // The engine logs settled outcomes itself.
                Ok(ConfirmOutcome::Confirmed(_)) | Ok(ConfirmOutcome::Failed(_)) => {}
                Err(LedgerError::NotFound(_)) => {
                    // Mined or cancelled before the timer fired.
                    log::debug!("Confirmation timer for {timer_id} found nothing to do");
                }
                Err(e) => {
                    log::error!("Confirmation of {timer_id} failed: {e}");
                }
            }
        });

        match self.timers.write() {
            Ok(mut timers) => {
                timers.insert(id.to_string(), handle);
                true
            }
            Err(_) => {
                log::error!("Failed to acquire write lock on confirmation timers");
                false
            }
        }
    }

    /// Put a timer behind every transaction sitting in the stored pending
    /// pool. Called once at startup; returns how many timers were started.
    pub fn resume_pending(&self) -> Result<usize> {
        let pending = self.engine.get_store().list_pending()?;
        let mut started = 0;
        for tx in &pending {
            if self.schedule(tx.get_id()) {
                started += 1;
            }
        }
        if started > 0 {
            log::info!("Rescheduled {started} pending confirmation(s) from the store");
        }
        Ok(started)
    }

    /// Cancel a pending transaction and forget its timer. The timer thread
    /// itself cannot be interrupted; when it fires it finds nothing to do.
    pub fn cancel(&self, id: &str) -> Result<Transaction> {
        let tx = self.engine.cancel(id)?;
        match self.timers.write() {
            Ok(mut timers) => {
                timers.remove(id);
            }
            Err(_) => {
                log::error!("Failed to acquire write lock on confirmation timers");
            }
        }
        Ok(tx)
    }

    /// Block until every scheduled timer has fired and settled.
    pub fn wait_all(&self) {
        let handles: Vec<(String, JoinHandle<()>)> = match self.timers.write() {
            Ok(mut timers) => timers.drain().collect(),
            Err(_) => {
                log::error!("Failed to acquire write lock on confirmation timers");
                return;
            }
        };
        for (id, handle) in handles {
            if handle.join().is_err() {
                log::error!("Confirmation timer for {id} panicked");
            }
        }
    }
}
