//! CLI module for the account guard
//!
//! Provides subcommands for operating the account store:
//! - `schema`: print the table definitions
//! - `migrate`: create the tables in PostgreSQL
//! - `seed`: insert the bootstrap accounts
//! - `unlock`: clear a lockout as an administrator

pub mod migrate;
pub mod schema;
pub mod seed;
pub mod unlock;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// KeyvanSafe account guard - lockout, credential rotation and optimistic concurrency
#[derive(Parser)]
#[command(name = "keyvan-guard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the account table definitions
    Schema,

    /// Create the account tables in the configured database
    Migrate,

    /// Insert the bootstrap accounts that do not exist yet
    Seed,

    /// Clear the lockout of an account
    Unlock(unlock::UnlockArgs),
}

/// Load `.env`, the layered configuration, and install logging
pub(crate) fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    Ok(config)
}
