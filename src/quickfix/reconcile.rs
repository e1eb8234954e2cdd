use std::collections::HashSet;

use crate::ast::{version_marker, Node, Span};
use crate::audit::{AuditContext, Issue};

use super::error::FixError;
use super::splice::node_start;

/// Display range of an issue, derived from its pointer against the current
/// AST. An empty pointer addresses the whole document; the version marker
/// line stands in for it.
pub fn issue_range(root: &Node, pointer: &str) -> Result<Span, FixError> {
    let node = if pointer.is_empty() {
        version_marker(root).unwrap_or(root)
    } else {
        root.find(pointer).ok_or_else(|| FixError::unresolved(pointer))?
    };
    Ok(Span::new(node_start(node), node.span.end))
}

/// Walk every audit that references the edited document: evict the issues
/// just fixed (and any duplicate of a surviving issue), then recompute each
/// survivor's range against the freshly parsed AST. Every range is
/// recomputed, not just those near the edit; a fix anywhere shifts every
/// later node.
///
/// `skipped` names the pointers whose groups the fix command had to skip.
/// Those were unresolvable before the edit, so failing to resolve them now
/// is not the fix's doing; their ranges are left untouched. Any other
/// unresolvable survivor is an error.
pub fn reconcile(
    context: &mut AuditContext,
    uri: &str,
    fixed: &[Issue],
    skipped: &[String],
    root: &Node,
) -> Result<(), FixError> {
    let fixed_keys: HashSet<String> = fixed.iter().map(Issue::key).collect();

    for audit in context
        .audits
        .values_mut()
        .filter(|audit| audit.issues.contains_key(uri))
    {
        let Some(issues) = audit.issues.get_mut(uri) else {
            continue;
        };
        let mut seen = HashSet::new();
        issues.retain(|issue| !fixed_keys.contains(&issue.key()) && seen.insert(issue.key()));
        for issue in issues.iter_mut() {
            match issue_range(root, &issue.pointer) {
                Ok(range) => issue.range = Some(range),
                Err(_) if skipped.contains(&issue.pointer) => {}
                Err(err) => return Err(err),
            }
        }
    }
    Ok(())
}
