//! Unlock command - administrative lockout override

use clap::Args;
use tracing::info;

/// Arguments for the unlock command
#[derive(Args, Clone)]
pub struct UnlockArgs {
    /// Username of the locked account
    #[arg(long)]
    pub username: String,
}

/// Clear the failure counter and lockout of one account
///
/// Runs a single attempt against the stamp it just read. A concurrent write
/// makes it fail with a conflict; run it again.
pub async fn run(args: UnlockArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let guard = crate::create_account_guard(&config).await?;

    let account = guard.find_by_username(&args.username).await?;
    let cleared = guard
        .clear_lockout(account.id(), account.concurrency_stamp())
        .await?;

    info!(
        account_id = %cleared.id(),
        username = %cleared.username(),
        previous_failures = account.failed_login_count(),
        "Lockout cleared"
    );

    Ok(())
}
