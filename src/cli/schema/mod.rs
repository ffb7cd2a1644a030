//! Schema command - prints the DDL for the configured delete policy

use crate::infrastructure::account::AccountSchema;

/// Print the account schema to stdout
pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    let schema = AccountSchema::new(config.storage.related_on_delete);
    println!("{}", schema.render());

    Ok(())
}
