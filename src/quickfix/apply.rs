use anyhow::Result;

use crate::ast::{self, openapi_version};
use crate::audit::{issues_by_pointer, AuditContext, Issue};
use crate::host::Host;

use super::edit::WorkspaceEdit;
use super::error::FixError;
use super::executors::{execute_fix, transform_insert_to_replace};
use super::fix::{Fix, FixType};
use super::reconcile::reconcile;
use super::render::specialize_fix;
use super::sources::SourceRegistry;
use super::FixContext;

/// What one fix command did: which issues were fixed and which pointer
/// groups had to be skipped.
#[derive(Debug, Default)]
pub struct FixOutcome {
    pub fixed: Vec<Issue>,
    pub skipped: Vec<(String, FixError)>,
}

impl FixOutcome {
    pub fn is_noop(&self) -> bool {
        self.fixed.is_empty()
    }
}

/// Apply one fix template to a set of issues in one document. Issues are
/// grouped by pointer; each group computes its contribution independently
/// and a failing group skips without aborting its siblings. All edits
/// commit as one atomic mutation, after which the remaining issues are
/// reconciled against the new text.
pub async fn apply_fix(
    host: &dyn Host,
    audits: &mut AuditContext,
    uri: &str,
    fix: &Fix,
    issues: &[Issue],
    sources: &SourceRegistry,
) -> Result<FixOutcome> {
    let text = host.document_text(uri).await?;
    let root = host.document_ast(uri).await?;
    let bundle = host.document_bundle(uri).await?;
    let dialect = host.dialect(uri).await?;
    let version = openapi_version(&root);

    let groups = issues_by_pointer(issues);
    let bulk = groups.len() > 1;

    let mut edit = WorkspaceEdit::new();
    let mut snippet = None;
    let mut outcome = FixOutcome::default();
    // Issue pointers of skipped groups; the reconciler must not treat their
    // failure to resolve as damage done by the edit.
    let mut skipped_pointers: Vec<String> = Vec::new();

    for (group_pointer, group_issues) in &groups {
        let pointer = format!("{}{}", group_pointer, fix.pointer.as_deref().unwrap_or(""));
        let Some(target) = root.find(&pointer) else {
            outcome
                .skipped
                .push((pointer.clone(), FixError::unresolved(&pointer)));
            skipped_pointers.push((*group_pointer).to_string());
            continue;
        };

        // Snippets only make sense for a genuine single insertion; an
        // insert that will resolve as a replace takes the edit path, so
        // its parameters substitute concrete values instead of tab stops.
        let preview = FixContext {
            fix: fix.clone(),
            pointer: pointer.clone(),
            bulk,
            root: &root,
            target,
            text: &text,
            dialect,
        };
        let snippet_mode = !bulk
            && fix.fix_type == FixType::Insert
            && matches!(transform_insert_to_replace(&preview), Ok(None));

        let mut specialized = fix.clone();
        specialize_fix(
            &mut specialized,
            group_issues,
            version,
            bundle.as_ref(),
            sources,
            snippet_mode,
        );

        let context = FixContext {
            fix: specialized,
            pointer: pointer.clone(),
            bulk,
            root: &root,
            target,
            text: &text,
            dialect,
        };
        match execute_fix(&context, &mut edit) {
            Ok(produced) => {
                if produced.is_some() {
                    snippet = produced;
                }
                outcome
                    .fixed
                    .extend(group_issues.iter().map(|issue| (*issue).clone()));
            }
            Err(err) => {
                outcome.skipped.push((pointer, err));
                skipped_pointers.push((*group_pointer).to_string());
            }
        }
    }

    if let Some(snippet) = &snippet {
        host.insert_snippet(uri, snippet).await?;
    } else if !edit.is_empty() {
        host.apply_edit(uri, &edit).await?;
    }

    if !outcome.fixed.is_empty() {
        let new_text = host.document_text(uri).await?;
        let new_root = ast::parse(&new_text, dialect)?;
        reconcile(audits, uri, &outcome.fixed, &skipped_pointers, &new_root)?;
        if let Some(audit) = audits.audit_for_document(uri) {
            host.refresh_diagnostics(uri, audit.issues_for(uri)).await?;
        }
    }
    Ok(outcome)
}
