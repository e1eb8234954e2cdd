use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::ast::openapi_version;
use crate::audit::{Audit, Issue};
use crate::cli::output::{covers_line, print_actions};
use crate::host::{Host, LocalHost};
use crate::quickfix::actions::provide_actions;
use crate::quickfix::default_registry;
use crate::quickfix::reconcile::issue_range;
use crate::quickfix::sources::SourceRegistry;

#[derive(Args, Debug)]
pub struct ActionsArgs {
    /// Document to inspect
    pub doc: PathBuf,

    /// Audit report JSON produced by the linting engine
    #[arg(long)]
    pub report: PathBuf,

    /// Only consider issues intersecting this line (1-based)
    #[arg(long)]
    pub line: Option<usize>,
}

pub async fn execute(args: &ActionsArgs) -> Result<()> {
    let host = LocalHost::new();
    let uri = host.open_file(&args.doc).await?;
    let text = host.document_text(&uri).await?;
    let root = host.document_ast(&uri).await?;

    let report = tokio::fs::read_to_string(&args.report)
        .await
        .with_context(|| format!("failed to read {}", args.report.display()))?;
    let issues: Vec<Issue> = serde_json::from_str(&report).context("malformed audit report")?;

    let mut located = Vec::new();
    for mut issue in issues.iter().cloned() {
        match issue_range(&root, &issue.pointer) {
            Ok(range) => {
                issue.range = Some(range);
                located.push(issue);
            }
            Err(err) => println!("  {} [{}] {}", "SKIP".yellow(), issue.id, err),
        }
    }

    let selected: Vec<&Issue> = located
        .iter()
        .filter(|issue| match (args.line, issue.range) {
            (Some(line), Some(range)) => covers_line(&text, range.start, range.end, line),
            _ => true,
        })
        .collect();

    let audit = Audit::new(uri.clone(), issues);
    let registry = default_registry();
    let sources = SourceRegistry::default();
    let version = openapi_version(&root);
    let bundle = host.document_bundle(&uri).await?;

    let actions = provide_actions(
        &selected,
        &audit,
        &registry,
        &sources,
        version,
        bundle.as_ref(),
    );
    print_actions(&actions);
    Ok(())
}
