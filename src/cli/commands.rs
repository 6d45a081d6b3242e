use crate::core::monetary::conversions;
use clap::{Parser, Subcommand};
use std::str::FromStr;

// The CLI stops at ten million MYC per operation; past that an f64 can no
// longer represent every base unit exactly.
const MAX_MYC_INPUT: f64 = 10_000_000.0;

/// A decimal MYC amount, parsed into base units.
#[derive(Debug, Clone, Copy)]
pub struct MycAmount(pub u64);

impl FromStr for MycAmount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let coins: f64 = s
            .parse()
            .map_err(|_| format!("Invalid MYC amount: {s}. Use a decimal number like '12.5'"))?;
        if !coins.is_finite() || coins < 0.0 {
            return Err(format!("Invalid MYC amount: {s}"));
        }
        if coins > MAX_MYC_INPUT {
            return Err(format!("Amount too large: {s}. Maximum is {MAX_MYC_INPUT} MYC"));
        }
        Ok(MycAmount(conversions::coins_to_units(coins)))
    }
}

impl std::fmt::Display for MycAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", conversions::format_units(self.0))
    }
}

#[derive(Debug, Parser)]
#[command(name = "mycoin-ledger")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "createwallet", about = "Create a new wallet")]
    Createwallet {
        #[arg(long, help = "Protect the wallet with an access passphrase")]
        passphrase: Option<String>,
    },
    #[command(name = "importwallet", about = "Import a wallet from a private key")]
    Importwallet {
        #[arg(help = "PKCS#8 private key as hex")]
        key: String,
    },
    #[command(name = "accesswallet", about = "Look up a wallet by its passphrase")]
    Accesswallet {
        #[arg(help = "The wallet passphrase")]
        passphrase: String,
    },
    #[command(name = "listaddresses", about = "Print local wallet addresses")]
    ListAddresses,
    #[command(name = "deposit", about = "Credit an address from the system faucet")]
    Deposit {
        #[arg(help = "The address to credit")]
        address: String,
        #[arg(help = "Amount in MYC (1 to 10000)")]
        amount: MycAmount,
    },
    #[command(name = "send", about = "Submit a transfer between addresses")]
    Send {
        #[arg(help = "Source wallet address")]
        from: String,
        #[arg(help = "Destination wallet address")]
        to: String,
        #[arg(help = "Amount to send in MYC")]
        amount: MycAmount,
        #[arg(long, help = "Sender's PKCS#8 private key as hex")]
        key: String,
        #[arg(
            long = "gas-price",
            help = "Gas price in base units per gas unit (defaults to the standard price)"
        )]
        gas_price: Option<u64>,
        #[arg(long, help = "Block until the confirmation timer settles the transfer")]
        wait: bool,
    },
    #[command(name = "cancel", about = "Cancel a pending transfer")]
    Cancel {
        #[arg(help = "The transaction id")]
        id: String,
    },
    #[command(name = "txstatus", about = "Report where a transaction stands")]
    TxStatus {
        #[arg(help = "The transaction id")]
        id: String,
    },
    #[command(name = "mine", about = "Mine pending transactions into a block")]
    Mine {
        #[arg(help = "The address to receive the block reward")]
        address: String,
    },
    #[command(
        name = "getbalance",
        about = "Get the replayed balance of the target address"
    )]
    GetBalance {
        #[arg(help = "The wallet address")]
        address: String,
    },
    #[command(name = "portfolio", about = "Print portfolio statistics as JSON")]
    Portfolio {
        #[arg(help = "The wallet address")]
        address: String,
    },
    #[command(name = "history", about = "Print daily activity as JSON")]
    History {
        #[arg(help = "The wallet address")]
        address: String,
        #[arg(long, default_value_t = 7, help = "How many days to cover")]
        days: u32,
    },
    #[command(name = "listtx", about = "List recent transactions, newest first")]
    ListTx {
        #[arg(long, help = "Only show transactions involving this address")]
        address: Option<String>,
        #[arg(long, default_value_t = 20, help = "Page size")]
        limit: usize,
        #[arg(long, default_value_t = 0, help = "How many transactions to skip")]
        offset: usize,
    },
    #[command(name = "printchain", about = "Print all blocks in the chain")]
    Printchain,
    #[command(name = "stats", about = "Print network statistics as JSON")]
    Stats,
    #[command(
        name = "process",
        about = "Reschedule stored pending transfers and settle them"
    )]
    Process,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::monetary::UNITS_PER_COIN;

    #[test]
    fn test_myc_amount_parses_decimals() {
        assert_eq!("1".parse::<MycAmount>().unwrap().0, UNITS_PER_COIN);
        assert_eq!("12.5".parse::<MycAmount>().unwrap().0, 12 * UNITS_PER_COIN + UNITS_PER_COIN / 2);
        assert_eq!("0.00000001".parse::<MycAmount>().unwrap().0, 1);
    }

    #[test]
    fn test_myc_amount_rejects_garbage() {
        assert!("abc".parse::<MycAmount>().is_err());
        assert!("-1".parse::<MycAmount>().is_err());
        assert!("NaN".parse::<MycAmount>().is_err());
        assert!("10000001".parse::<MycAmount>().is_err());
    }
}
