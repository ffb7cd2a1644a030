use clap::Parser;
use keyvan_guard::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Schema => cli::schema::run().await,
        Command::Migrate => cli::migrate::run().await,
        Command::Seed => cli::seed::run().await,
        Command::Unlock(args) => cli::unlock::run(args).await,
    }
}
