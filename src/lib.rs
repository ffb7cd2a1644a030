//! KeyvanSafe Account Guard
//!
//! Concurrency-safe account management with support for:
//! - Optimistic concurrency through per-account stamps
//! - Failed-login counting with time-boxed lockout
//! - Credential rotation with session invalidation
//! - In-memory and PostgreSQL account stores

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
mod test_support;

pub use config::AppConfig;

use std::sync::Arc;

use mockable::DefaultClock;
use tracing::info;

use domain::account::AccountGuard;
use infrastructure::account::{Argon2Hasher, PostgresAccountStore, RandomStampGenerator};

/// Build an account guard backed by the configured PostgreSQL database
pub async fn create_account_guard(
    config: &AppConfig,
) -> anyhow::Result<AccountGuard<PostgresAccountStore, Argon2Hasher>> {
    let policy = config.lockout.policy()?;
    let store = PostgresAccountStore::connect(
        config.storage.database_url()?,
        config.storage.max_connections,
    )
    .await?;

    info!(
        max_failed_attempts = policy.max_failed_attempts(),
        lockout_secs = policy.lockout_duration().num_seconds(),
        "Account guard ready"
    );

    Ok(AccountGuard::new(
        Arc::new(store),
        Arc::new(Argon2Hasher::new()),
        Arc::new(RandomStampGenerator::new()),
        Arc::new(DefaultClock),
        policy,
    ))
}
