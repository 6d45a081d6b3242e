// This is my main entry point for the ledger CLI application
// I'm importing all the core components I built for this ledger
use chrono::{SecondsFormat, TimeZone, Utc};
use clap::Parser;
use data_encoding::HEXLOWER;
use log::{error, LevelFilter};
use mycoin_ledger::core::monetary::conversions::format_units;
use mycoin_ledger::core::{TxQueryStatus, DEFAULT_GAS_PRICE};
use mycoin_ledger::wallet::{generate_passphrase, WalletRecord};
use mycoin_ledger::{
    validate_address, BalanceEngine, Command, ConfirmationProcessor, LedgerDb, MinedBlock, Miner,
    NetworkStats, Opt, PortfolioAnalyzer, Transaction, TransactionEngine, Wallet,
};
use std::process;

fn main() {
    // I initialize logging so I can see what's happening inside the ledger
    // Setting it to Info level gives me enough detail without being too verbose
    env_logger::builder().filter_level(LevelFilter::Info).init();

    // I parse the command line arguments using clap - this gives me a nice CLI interface
    let opt = Opt::parse();

    // I run the actual command and handle any errors that might occur
    // If something goes wrong, I log the error and exit with code 1
    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

// This is where I handle all the different CLI commands
// Each command corresponds to a different ledger operation I want to perform
fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        // When I want to create a new wallet for holding MYC
        Command::Createwallet { passphrase } => {
            let store = LedgerDb::open()?;
            // I generate a new ECDSA key pair and derive the hex address
            let wallet = Wallet::new()?;
            // Every wallet gets a recovery passphrase so accesswallet can find it later
            let passphrase = passphrase.unwrap_or_else(generate_passphrase);
            let record = WalletRecord::from_wallet(&wallet, Some(passphrase.clone()))?;
            store.put_wallet(&record)?;
            println!("Your new address: {}", record.address);
            println!("Your recovery passphrase: {passphrase}");
            println!(
                "Your private key (hex, never share it): {}",
                HEXLOWER.encode(wallet.get_pkcs8())
            );
        }
        // When I already hold a private key and want this node to know the wallet
        Command::Importwallet { key } => {
            let store = LedgerDb::open()?;
            let pkcs8 = HEXLOWER
                .decode(key.to_lowercase().as_bytes())
                .map_err(|_| "Invalid private key: expected hex".to_string())?;
            let wallet = Wallet::from_pkcs8(&pkcs8)?;
            // Re-importing keeps any passphrase already on file
            let passphrase = store
                .get_wallet(&wallet.get_address())?
                .and_then(|record| record.passphrase);
            let record = WalletRecord::from_wallet(&wallet, passphrase)?;
            store.put_wallet(&record)?;
            println!("Imported wallet with address: {}", record.address);
        }
        // When I only remember the passphrase and need the address back
        Command::Accesswallet { passphrase } => {
            let store = LedgerDb::open()?;
            match store.find_wallet_by_passphrase(&passphrase)? {
                Some(record) => {
                    // I replay the log for the real balance instead of trusting
                    // the advisory number stored on the record
                    let balance = BalanceEngine::new(store.clone()).balance(&record.address)?;
                    println!("Address: {}", record.address);
                    println!("Created: {}", format_timestamp(record.created));
                    println!("Balance: {}", format_units(balance));
                }
                None => return Err("No wallet matches that passphrase".into()),
            }
        }
        // When I want to see all the wallet addresses this node knows
        Command::ListAddresses => {
            let store = LedgerDb::open()?;
            for record in store.list_wallets()? {
                println!("{}", record.address)
            }
        }
        // When I want to conjure test funds into an address
        Command::Deposit { address, amount } => {
            if !validate_address(&address) {
                return Err(format!("Invalid address: {address}").into());
            }
            let engine = TransactionEngine::new(LedgerDb::open()?);
            // Deposits settle immediately; there is nothing to wait for
            let tx = engine.deposit(&address, amount.0)?;
            println!("Deposited {} into {}", format_units(tx.get_amount()), address);
            println!("Transaction id: {}", tx.get_id());
        }
        // When I want to move MYC from one address to another
        Command::Send {
            from,
            to,
            amount,
            key,
            gas_price,
            wait,
        } => {
            // I validate both addresses to make sure they're properly formatted
            if !validate_address(&from) {
                return Err(format!("Invalid sender address: {from}").into());
            }
            if !validate_address(&to) {
                return Err(format!("Invalid recipient address: {to}").into());
            }
            let pkcs8 = HEXLOWER
                .decode(key.to_lowercase().as_bytes())
                .map_err(|_| "Invalid private key: expected hex".to_string())?;

            let engine = TransactionEngine::new(LedgerDb::open()?);
            let processor = ConfirmationProcessor::new(engine);
            let gas_price = gas_price.unwrap_or(DEFAULT_GAS_PRICE);
            // The processor submits the transfer and puts a timer behind it
            let tx = processor.submit_transfer(&from, &to, amount.0, gas_price, &pkcs8)?;
            println!("Submitted transaction {}", tx.get_id());
            println!("  {} -> {}", tx.get_from(), tx.get_to());
            println!(
                "  amount {}, fee {}",
                format_units(tx.get_amount()),
                format_units(tx.get_fee())
            );

            if wait {
                // I block until the timer fires and then report how it went
                processor.wait_all();
                match processor.get_engine().transaction_status(tx.get_id())? {
                    TxQueryStatus::Confirmed => {
                        println!("Transaction {} confirmed", tx.get_id())
                    }
                    TxQueryStatus::NotFound => println!(
                        "Transaction {} failed the solvency re-check and was discarded",
                        tx.get_id()
                    ),
                    TxQueryStatus::Pending => {
                        println!("Transaction {} is still pending", tx.get_id())
                    }
                }
            } else {
                // Timers die with this process; a later 'process' run picks
                // the transfer back up from the stored pool
                println!("Run 'process' to settle pending confirmations");
            }
        }
        // When I change my mind about a transfer that has not settled yet
        Command::Cancel { id } => {
            let engine = TransactionEngine::new(LedgerDb::open()?);
            let tx = engine.cancel(&id)?;
            println!(
                "Cancelled transaction {id}; {} never left {}",
                format_units(tx.get_amount()),
                tx.get_from()
            );
        }
        // When I want to know where a transaction stands
        Command::TxStatus { id } => {
            let engine = TransactionEngine::new(LedgerDb::open()?);
            match engine.transaction_status(&id)? {
                TxQueryStatus::Pending => println!("Transaction {id} is pending"),
                TxQueryStatus::Confirmed => println!("Transaction {id} is confirmed"),
                TxQueryStatus::NotFound => {
                    println!("Transaction {id} is not in the pool or the log")
                }
            }
        }
        // When I want to mine the pending pool into a new block
        Command::Mine { address } => {
            if !validate_address(&address) {
                return Err(format!("Invalid miner address: {address}").into());
            }
            let miner = Miner::new(LedgerDb::open()?);
            let mined = miner.mine(&address)?;
            print_mined_block(&mined);
        }
        // When I want to check how much MYC an address has
        Command::GetBalance { address } => {
            if !validate_address(&address) {
                return Err(format!("Invalid address: {address}").into());
            }
            let balance = BalanceEngine::new(LedgerDb::open()?).balance(&address)?;
            println!("Balance of {address}: {}", format_units(balance));
        }
        // When I want the full profit and activity picture for an address
        Command::Portfolio { address } => {
            if !validate_address(&address) {
                return Err(format!("Invalid address: {address}").into());
            }
            let analyzer = PortfolioAnalyzer::new(LedgerDb::open()?);
            let stats = analyzer.stats(&address)?;
            let summary = analyzer.summary(&address)?;
            let report = serde_json::json!({ "stats": stats, "summary": summary });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        // When I want day-by-day activity for an address
        Command::History { address, days } => {
            if !validate_address(&address) {
                return Err(format!("Invalid address: {address}").into());
            }
            let history = PortfolioAnalyzer::new(LedgerDb::open()?).history(&address, days)?;
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
        // When I want to browse transactions, newest first
        Command::ListTx {
            address,
            limit,
            offset,
        } => {
            if let Some(filter) = &address {
                if !validate_address(filter) {
                    return Err(format!("Invalid address: {filter}").into());
                }
            }
            let engine = TransactionEngine::new(LedgerDb::open()?);
            let transactions = engine.recent_transactions(address.as_deref(), limit, offset)?;
            if transactions.is_empty() {
                println!("No transactions to show");
            }
            for tx in &transactions {
                print_transaction(tx);
            }
        }
        // When I want to see the entire chain history (useful for debugging)
        Command::Printchain => {
            let store = LedgerDb::open()?;
            // I walk the chain from newest to oldest
            for block in store.list_blocks()?.iter().rev() {
                println!("Block {}:", block.get_index());
                println!("  Pre block hash: {}", block.get_previous_hash());
                println!("  Cur block hash: {}", block.get_hash());
                println!("  Timestamp: {}", format_timestamp(block.get_timestamp()));
                println!(
                    "  Nonce: {}, difficulty: {}",
                    block.get_nonce(),
                    block.get_difficulty()
                );
                println!(
                    "  Reward {} to {}",
                    format_units(block.get_reward()),
                    block.get_miner()
                );
                for tx in block.get_transactions() {
                    print_transaction(tx);
                }
                println!()
            }
        }
        // When I want the bird's-eye view of the whole ledger
        Command::Stats => {
            let stats = NetworkStats::collect(&LedgerDb::open()?)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        // When transfers were submitted without --wait, this settles them
        Command::Process => {
            let processor = ConfirmationProcessor::new(TransactionEngine::new(LedgerDb::open()?));
            let rescheduled = processor.resume_pending()?;
            if rescheduled == 0 {
                println!("Nothing pending");
            } else {
                println!("Rescheduled {rescheduled} pending confirmation(s)");
                processor.wait_all();
                println!("All confirmations settled");
            }
        }
    }
    Ok(())
}

// I print transactions the same way everywhere so the output stays scannable
fn print_transaction(tx: &Transaction) {
    println!("- Transaction {} [{}]", tx.get_id(), tx.get_status());
    println!("  {} -> {}", tx.get_from(), tx.get_to());
    println!(
        "  amount {}, fee {}",
        format_units(tx.get_amount()),
        format_units(tx.get_fee())
    );
    println!("  time {}", format_timestamp(tx.get_timestamp()));
    if let Some(number) = tx.get_block_number() {
        println!("  mined in block {number}");
    }
}

fn print_mined_block(mined: &MinedBlock) {
    println!("Mined block {} in {} ms", mined.index, mined.duration_ms);
    println!("  Hash: {}", mined.hash);
    println!("  Nonce: {}, difficulty: {}", mined.nonce, mined.difficulty);
    println!(
        "  {} transaction(s), reward {} to {}",
        mined.transactions,
        format_units(mined.reward),
        mined.miner
    );
}

// Millisecond timestamps are for machines; humans get RFC 3339
fn format_timestamp(millis: i64) -> String {
    match Utc.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
        None => millis.to_string(),
    }
}
