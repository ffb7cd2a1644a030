//! Seed command - inserts the bootstrap accounts

use tracing::info;

use crate::infrastructure::account::{apply_seeds, seed_accounts};

/// Register every seed account that is not present yet
pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let guard = crate::create_account_guard(&config).await?;

    let created = apply_seeds(&guard, seed_accounts(&config.seed)).await?;
    info!("Seeding complete, {} account(s) created", created);

    Ok(())
}
