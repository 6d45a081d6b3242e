//! Configuration management
//!
//! This module handles process-wide settings for the ledger, including the
//! data directory, mining difficulty and reward, and confirmation timing.
//!
//! Values are seeded from environment variables with sensible defaults.

pub mod settings;

pub use settings::{Config, GLOBAL_CONFIG};
