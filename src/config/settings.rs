use log::warn;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::env;
use std::sync::RwLock;

pub static GLOBAL_CONFIG: Lazy<Config> = Lazy::new(Config::new);

static DEFAULT_DATA_DIR: &str = "./mycoin_data";

/// Default number of leading zero hex digits a block hash must carry.
const DEFAULT_DIFFICULTY: u32 = 4;
/// Default per-block reward, in whole MYC.
const DEFAULT_MINING_REWARD_MYC: u64 = 10;
/// Default delay before a pending transaction auto-confirms, in milliseconds.
const DEFAULT_CONFIRMATION_DELAY_MS: u64 = 5_000;

const DATA_DIR_KEY: &str = "MYCOIN_DATA_DIR";
const DIFFICULTY_KEY: &str = "MYCOIN_DIFFICULTY";
const MINING_REWARD_KEY: &str = "MYCOIN_MINING_REWARD";
const CONFIRMATION_DELAY_KEY: &str = "MYCOIN_CONFIRMATION_DELAY_MS";
const MAX_NONCE_KEY: &str = "MYCOIN_MAX_NONCE";

pub struct Config {
    inner: RwLock<HashMap<String, String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Config {
        let mut map = HashMap::new();

        let mut data_dir = String::from(DEFAULT_DATA_DIR);
        if let Ok(dir) = env::var(DATA_DIR_KEY) {
            data_dir = dir;
        }
        map.insert(String::from(DATA_DIR_KEY), data_dir);

        for key in [
            DIFFICULTY_KEY,
            MINING_REWARD_KEY,
            CONFIRMATION_DELAY_KEY,
            MAX_NONCE_KEY,
        ] {
            if let Ok(value) = env::var(key) {
                map.insert(String::from(key), value);
            }
        }

        Config {
            inner: RwLock::new(map),
        }
    }

    pub fn data_dir(&self) -> String {
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on config - this should never happen");
        inner
            .get(DATA_DIR_KEY)
            .expect("Data directory should always be present in config")
            .clone()
    }

    pub fn set_data_dir(&self, dir: String) {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on config - this should never happen");
        inner.insert(String::from(DATA_DIR_KEY), dir);
    }

    /// Required count of leading zero hex digits in a block hash.
    pub fn difficulty(&self) -> u32 {
        self.parsed_or(DIFFICULTY_KEY, DEFAULT_DIFFICULTY)
    }

    pub fn set_difficulty(&self, difficulty: u32) {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on config - this should never happen");
        inner.insert(String::from(DIFFICULTY_KEY), difficulty.to_string());
    }

    /// Per-block reward in whole MYC.
    pub fn mining_reward_myc(&self) -> u64 {
        self.parsed_or(MINING_REWARD_KEY, DEFAULT_MINING_REWARD_MYC)
    }

    pub fn confirmation_delay_ms(&self) -> u64 {
        self.parsed_or(CONFIRMATION_DELAY_KEY, DEFAULT_CONFIRMATION_DELAY_MS)
    }

    /// Upper bound on the proof-of-work nonce search.
    pub fn max_nonce(&self) -> i64 {
        self.parsed_or(MAX_NONCE_KEY, i64::MAX)
    }

    fn parsed_or<T: std::str::FromStr + Copy>(&self, key: &str, default: T) -> T {
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on config - this should never happen");
        match inner.get(key) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("Ignoring unparsable config value for {key}: {raw}");
                default
            }),
            None => default,
        }
    }
}
