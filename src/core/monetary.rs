//! Monetary constants and conversions for the MYC currency.
//!
//! All amounts, fees, and rewards are carried as `u64` base units with a
//! fixed 10^8 subdivision, so fee arithmetic stays exact integer math.
//! Decimal MYC values only appear at the edges (CLI input and display).

/// Number of base units in one MYC.
pub const UNITS_PER_COIN: u64 = 100_000_000;

/// Gas consumed by a simple transfer. Fixed; there is no contract execution.
pub const TRANSFER_GAS: u64 = 21_000;

/// Default gas price in base units per gas unit (0.001 MYC), giving the
/// standard transfer fee of 21 MYC.
pub const DEFAULT_GAS_PRICE: u64 = UNITS_PER_COIN / 1_000;

/// Highest accepted gas price (1 MYC per gas unit). Keeps the fee product
/// far away from u64 overflow.
pub const MAX_GAS_PRICE: u64 = UNITS_PER_COIN;

/// Smallest accepted system deposit (1 MYC).
pub const MIN_DEPOSIT: u64 = UNITS_PER_COIN;

/// Largest accepted system deposit (10,000 MYC).
pub const MAX_DEPOSIT: u64 = 10_000 * UNITS_PER_COIN;

/// Fee charged for a transfer. The fee is burned: it is deducted from the
/// sender and never credited anywhere.
pub fn calculate_fee(gas_used: u64, gas_price: u64) -> u64 {
    gas_used * gas_price
}

/// Utility functions for monetary conversions
pub mod conversions {
    use super::*;

    /// Convert decimal MYC to base units
    ///
    /// # Examples
    /// ```
    /// use mycoin_ledger::core::monetary::conversions::coins_to_units;
    /// assert_eq!(coins_to_units(1.0), 100_000_000);
    /// assert_eq!(coins_to_units(0.001), 100_000);
    /// ```
    pub fn coins_to_units(coins: f64) -> u64 {
        (coins * UNITS_PER_COIN as f64).round() as u64
    }

    /// Convert base units to decimal MYC
    ///
    /// # Examples
    /// ```
    /// use mycoin_ledger::core::monetary::conversions::units_to_coins;
    /// assert_eq!(units_to_coins(100_000_000), 1.0);
    /// assert_eq!(units_to_coins(50_000_000), 0.5);
    /// ```
    pub fn units_to_coins(units: u64) -> f64 {
        units as f64 / UNITS_PER_COIN as f64
    }

    /// Format base units as a human-readable MYC string
    ///
    /// # Examples
    /// ```
    /// use mycoin_ledger::core::monetary::conversions::format_units;
    /// assert_eq!(format_units(100_000_000), "1.00000000 MYC");
    /// assert_eq!(format_units(2_100_000_000), "21.00000000 MYC");
    /// ```
    pub fn format_units(units: u64) -> String {
        format!("{:.8} MYC", units_to_coins(units))
    }

    /// Validate that a gas price is positive and within bounds
    pub fn is_valid_gas_price(gas_price: u64) -> bool {
        (1..=MAX_GAS_PRICE).contains(&gas_price)
    }

    /// Validate that a deposit amount is within the allowed range
    pub fn is_valid_deposit(amount: u64) -> bool {
        (MIN_DEPOSIT..=MAX_DEPOSIT).contains(&amount)
    }
}

#[cfg(test)]
mod tests {
    use super::conversions::*;
    use super::*;

    #[test]
    fn test_monetary_constants() {
        assert_eq!(UNITS_PER_COIN, 100_000_000);
        assert_eq!(TRANSFER_GAS, 21_000);
        // Standard transfer fee works out to 21 MYC
        assert_eq!(
            calculate_fee(TRANSFER_GAS, DEFAULT_GAS_PRICE),
            21 * UNITS_PER_COIN
        );
        const _: () = assert!(MIN_DEPOSIT < MAX_DEPOSIT);
        const _: () = assert!(DEFAULT_GAS_PRICE < MAX_GAS_PRICE);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(coins_to_units(1.0), UNITS_PER_COIN);
        assert_eq!(coins_to_units(0.5), UNITS_PER_COIN / 2);
        assert_eq!(coins_to_units(100.0), 100 * UNITS_PER_COIN);

        assert_eq!(units_to_coins(UNITS_PER_COIN), 1.0);
        assert_eq!(units_to_coins(UNITS_PER_COIN / 2), 0.5);

        // Round trip within one base unit
        let original = 1.23456789;
        let units = coins_to_units(original);
        let back_to_coins = units_to_coins(units);
        assert!((original - back_to_coins).abs() < 0.00000001);
    }

    #[test]
    fn test_validation() {
        assert!(!is_valid_gas_price(0));
        assert!(is_valid_gas_price(1));
        assert!(is_valid_gas_price(DEFAULT_GAS_PRICE));
        assert!(is_valid_gas_price(MAX_GAS_PRICE));
        assert!(!is_valid_gas_price(MAX_GAS_PRICE + 1));

        assert!(!is_valid_deposit(MIN_DEPOSIT - 1));
        assert!(is_valid_deposit(MIN_DEPOSIT));
        assert!(is_valid_deposit(MAX_DEPOSIT));
        assert!(!is_valid_deposit(MAX_DEPOSIT + 1));
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_units(UNITS_PER_COIN), "1.00000000 MYC");
        assert_eq!(format_units(UNITS_PER_COIN / 2), "0.50000000 MYC");
        assert_eq!(format_units(100_000), "0.00100000 MYC");
    }
}
