mod ast;
mod audit;
mod cli;
mod host;
mod quickfix;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Actions(args) => {
            cli::commands::actions::execute(args).await?;
        }
        Commands::Fix(args) => {
            cli::commands::fix::execute(args).await?;
        }
        Commands::Parse(args) => {
            cli::commands::parse::execute(args).await?;
        }
    }

    Ok(())
}
