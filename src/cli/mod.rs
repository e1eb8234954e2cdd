pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "oasfix", version, about = "Quick fixes for OpenAPI and Swagger documents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List candidate fix actions for audit findings
    Actions(commands::actions::ActionsArgs),
    /// Apply a fix to one or more issues
    Fix(commands::fix::FixArgs),
    /// Parse a document and print it as canonical JSON
    Parse(commands::parse::ParseArgs),
}
