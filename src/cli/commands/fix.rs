use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::ast::Dialect;
use crate::audit::{Audit, AuditContext, Issue};
use crate::cli::output::print_outcome;
use crate::host::LocalHost;
use crate::quickfix::actions::assemble;
use crate::quickfix::apply::apply_fix;
use crate::quickfix::default_registry;
use crate::quickfix::sources::SourceRegistry;
use crate::quickfix::Fix;

#[derive(Args, Debug)]
pub struct FixArgs {
    /// Document to fix
    pub doc: PathBuf,

    /// Audit report JSON produced by the linting engine
    #[arg(long)]
    pub report: PathBuf,

    /// Rule id(s) to fix; repeat to assemble several fixes into one
    #[arg(long = "id", required = true)]
    pub ids: Vec<String>,

    /// Only fix the issue at this pointer
    #[arg(long, conflicts_with = "all")]
    pub pointer: Option<String>,

    /// Fix every matching issue in the document (bulk)
    #[arg(long)]
    pub all: bool,

    /// Compute and report the fix without modifying the file
    #[arg(long)]
    pub dry_run: bool,
}

/// Narrow the report down to the issues this invocation should fix. A
/// single id targets one issue unless `--pointer` or `--all` widens it; an
/// assembled invocation (several ids) takes the issues co-located with the
/// first match.
fn select_targets(
    issues: &[Issue],
    ids: &[String],
    pointer: Option<&str>,
    all: bool,
) -> Vec<Issue> {
    let mut matching: Vec<Issue> = issues
        .iter()
        .filter(|issue| ids.contains(&issue.id))
        .cloned()
        .collect();
    if let Some(pointer) = pointer {
        matching.retain(|issue| issue.pointer == pointer);
    }
    if matching.is_empty() || all {
        return matching;
    }
    if ids.len() > 1 {
        let anchor = matching[0].pointer.clone();
        matching.retain(|issue| issue.pointer == anchor);
        return matching;
    }
    if pointer.is_none() {
        matching.truncate(1);
    }
    matching
}

pub async fn execute(args: &FixArgs) -> Result<()> {
    let host = LocalHost::new();
    let uri = if args.dry_run {
        // In-memory document; nothing is written back.
        let dialect = Dialect::from_path(&args.doc)
            .ok_or_else(|| anyhow!("unsupported document type: {}", args.doc.display()))?;
        let text = tokio::fs::read_to_string(&args.doc)
            .await
            .with_context(|| format!("failed to read {}", args.doc.display()))?;
        let uri = args.doc.to_string_lossy().into_owned();
        host.open(uri.clone(), text, dialect).await;
        uri
    } else {
        host.open_file(&args.doc).await?
    };

    let report = tokio::fs::read_to_string(&args.report)
        .await
        .with_context(|| format!("failed to read {}", args.report.display()))?;
    let issues: Vec<Issue> = serde_json::from_str(&report).context("malformed audit report")?;

    let targets = select_targets(&issues, &args.ids, args.pointer.as_deref(), args.all);
    if targets.is_empty() {
        println!("{}", "No matching issues in the report.".yellow());
        return Ok(());
    }

    let registry = default_registry();
    let fix: Fix = if args.ids.len() > 1 {
        let pairs: Vec<(&Issue, &Fix)> = targets
            .iter()
            .filter_map(|issue| registry.find(&issue.id).map(|fix| (issue, fix)))
            .collect();
        if pairs.len() < 2 {
            bail!("an assembled fix needs at least two fixable issues");
        }
        assemble(&pairs).fix
    } else {
        registry
            .find(&args.ids[0])
            .ok_or_else(|| anyhow!("no fix registered for rule '{}'", args.ids[0]))?
            .clone()
    };

    let mut audits = AuditContext::default();
    audits
        .audits
        .insert(uri.clone(), Audit::new(uri.clone(), issues));

    let sources = SourceRegistry::default();
    let outcome = apply_fix(&host, &mut audits, &uri, &fix, &targets, &sources).await?;
    if outcome.is_noop() && outcome.skipped.is_empty() {
        println!("{}", "Nothing to fix.".yellow());
        return Ok(());
    }
    let remaining = audits
        .audit_for_document(&uri)
        .map(|audit| audit.issues_for(&uri).len())
        .unwrap_or(0);
    print_outcome(&outcome, remaining, args.dry_run);
    Ok(())
}
