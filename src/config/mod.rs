/// Database connection and table creation
pub mod database;

/// Ledger policy settings from wallet.toml
pub mod settings;

pub use settings::{FallbackRecipient, Settings, TokenSettings};
