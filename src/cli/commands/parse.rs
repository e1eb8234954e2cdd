use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::ast::{self, object::ast_to_object, Dialect};
use crate::cli::output::line_of;

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Document to parse
    pub doc: PathBuf,
}

pub async fn execute(args: &ParseArgs) -> Result<()> {
    let dialect = Dialect::from_path(&args.doc)
        .ok_or_else(|| anyhow!("unsupported document type: {}", args.doc.display()))?;
    let text = tokio::fs::read_to_string(&args.doc)
        .await
        .with_context(|| format!("failed to read {}", args.doc.display()))?;

    match ast::parse(&text, dialect) {
        Ok(root) => {
            let object = ast_to_object(&root);
            println!("{}", serde_json::to_string_pretty(&object)?);
            Ok(())
        }
        Err(err) => {
            let line = line_of(&text, err.offset);
            let column = err.offset - text[..err.offset].rfind('\n').map(|i| i + 1).unwrap_or(0) + 1;
            eprintln!(
                "  {} {}:{}:{}: {}",
                "ERROR".red(),
                args.doc.display(),
                line,
                column,
                err.message
            );
            bail!("failed to parse {}", args.doc.display());
        }
    }
}
