/// Database configuration and connection management
pub mod database;

/// First-run budget defaults from config.toml
pub mod defaults;
