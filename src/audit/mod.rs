use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::ast::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Default for Severity {
    fn default() -> Severity {
        Severity::Medium
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::High => write!(f, "HIGH"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::Low => write!(f, "LOW"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

/// One finding produced by the audit engine. Identity for "is this fixed"
/// purposes is the `(id, pointer)` composite: the same rule at two
/// locations is two distinct issues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub pointer: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: Severity,
    /// Display range, derived from the pointer. Recomputed by the
    /// reconciler after every fix.
    #[serde(skip)]
    pub range: Option<Span>,
}

impl Issue {
    pub fn key(&self) -> String {
        format!("{}{}", self.id, self.pointer)
    }
}

/// A diagnostic as surfaced to the editor: the issue identity plus where it
/// is shown. The action assembler works from these.
#[derive(Debug, Clone)]
pub struct AuditDiagnostic {
    pub id: String,
    pub pointer: String,
    pub range: Span,
}

/// The result of one audit pass over a main document. Issues are keyed by
/// the uri they were reported in; multi-file documents carry entries for
/// their subsidiary files.
#[derive(Debug, Clone)]
pub struct Audit {
    pub document_uri: String,
    pub issues: HashMap<String, Vec<Issue>>,
}

impl Audit {
    pub fn new(document_uri: impl Into<String>, issues: Vec<Issue>) -> Audit {
        let document_uri = document_uri.into();
        let mut map = HashMap::new();
        map.insert(document_uri.clone(), issues);
        Audit {
            document_uri,
            issues: map,
        }
    }

    pub fn issues_for(&self, uri: &str) -> &[Issue] {
        self.issues.get(uri).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Process-wide audit state, keyed by main document uri. Owned by the host
/// application; this engine reads it and updates issue lists in place.
#[derive(Debug, Default)]
pub struct AuditContext {
    pub audits: HashMap<String, Audit>,
}

impl AuditContext {
    /// The audit responsible for a document: the one keyed by it, or the
    /// first one whose issue map references it.
    pub fn audit_for_document(&self, uri: &str) -> Option<&Audit> {
        self.audits.get(uri).or_else(|| {
            self.audits
                .values()
                .find(|audit| audit.issues.contains_key(uri))
        })
    }
}

/// Group issues by pointer, preserving a stable order. One group per
/// distinct location; a bulk application has more than one group.
pub fn issues_by_pointer(issues: &[Issue]) -> BTreeMap<&str, Vec<&Issue>> {
    let mut groups: BTreeMap<&str, Vec<&Issue>> = BTreeMap::new();
    for issue in issues {
        groups.entry(issue.pointer.as_str()).or_default().push(issue);
    }
    groups
}
