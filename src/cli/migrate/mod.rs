//! Migrate command - creates the account tables

use tracing::info;

use crate::infrastructure::account::{AccountSchema, PostgresAccountStore};

/// Apply the account schema to the configured database
pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    let store = PostgresAccountStore::connect(
        config.storage.database_url()?,
        config.storage.max_connections,
    )
    .await?;

    let policy = config.storage.related_on_delete;
    info!(related_on_delete = policy.as_sql(), "Applying account schema");

    store.migrate(&AccountSchema::new(policy)).await?;

    Ok(())
}
