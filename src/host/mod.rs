use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::ast::{self, object::ast_to_object, Dialect, Node};
use crate::audit::Issue;
use crate::quickfix::edit::{SnippetEdit, WorkspaceEdit};

/// The editor-side surface the fix engine talks to. Document access and
/// mutation suspend; everything between two calls is synchronous and
/// atomic from the engine's point of view.
#[async_trait]
pub trait Host: Send + Sync {
    async fn document_text(&self, uri: &str) -> Result<String>;

    /// Freshly parsed tree for the document's current text.
    async fn document_ast(&self, uri: &str) -> Result<Node>;

    /// Resolved multi-file view of the document, used to supply fix
    /// parameter values. None when no bundle is available.
    async fn document_bundle(&self, uri: &str) -> Result<Option<Value>>;

    async fn dialect(&self, uri: &str) -> Result<Dialect>;

    /// Apply a set of range replacements atomically.
    async fn apply_edit(&self, uri: &str, edit: &WorkspaceEdit) -> Result<()>;

    /// Insert templated text at a cursor position, awaiting placeholder
    /// edits. Mutually exclusive with `apply_edit` within one invocation.
    async fn insert_snippet(&self, uri: &str, snippet: &SnippetEdit) -> Result<()>;

    /// Re-render diagnostics from the updated issue list.
    async fn refresh_diagnostics(&self, uri: &str, issues: &[Issue]) -> Result<()>;
}

struct Document {
    text: String,
    dialect: Dialect,
    path: Option<PathBuf>,
}

/// In-process host over local files. Documents are held in memory and
/// written back to disk on every mutation when opened from a path.
#[derive(Default)]
pub struct LocalHost {
    documents: RwLock<HashMap<String, Document>>,
    diagnostics: RwLock<HashMap<String, Vec<Issue>>>,
}

impl LocalHost {
    pub fn new() -> LocalHost {
        LocalHost::default()
    }

    /// Register an in-memory document, not backed by a file.
    pub async fn open(&self, uri: impl Into<String>, text: impl Into<String>, dialect: Dialect) {
        self.documents.write().await.insert(
            uri.into(),
            Document {
                text: text.into(),
                dialect,
                path: None,
            },
        );
    }

    /// Load a document from disk. The uri is the path as given.
    pub async fn open_file(&self, path: &Path) -> Result<String> {
        let dialect = Dialect::from_path(path)
            .ok_or_else(|| anyhow!("unsupported document type: {}", path.display()))?;
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let uri = path.to_string_lossy().into_owned();
        self.documents.write().await.insert(
            uri.clone(),
            Document {
                text,
                dialect,
                path: Some(path.to_path_buf()),
            },
        );
        Ok(uri)
    }

    pub async fn diagnostics_for(&self, uri: &str) -> Vec<Issue> {
        self.diagnostics
            .read()
            .await
            .get(uri)
            .cloned()
            .unwrap_or_default()
    }

    async fn update_text(&self, uri: &str, new_text: String) -> Result<()> {
        let mut documents = self.documents.write().await;
        let document = documents
            .get_mut(uri)
            .ok_or_else(|| anyhow!("unknown document: {}", uri))?;
        if let Some(path) = &document.path {
            tokio::fs::write(path, &new_text)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        document.text = new_text;
        Ok(())
    }
}

/// Collapse `${n:default}` tab stops into their default text. A host with a
/// real editor would leave them for interactive filling.
pub fn materialize_snippet(snippet: &str) -> String {
    let placeholder = Regex::new(r"\$\{\d+:([^}]*)\}").unwrap();
    placeholder.replace_all(snippet, "$1").into_owned()
}

#[async_trait]
impl Host for LocalHost {
    async fn document_text(&self, uri: &str) -> Result<String> {
        let documents = self.documents.read().await;
        documents
            .get(uri)
            .map(|document| document.text.clone())
            .ok_or_else(|| anyhow!("unknown document: {}", uri))
    }

    async fn document_ast(&self, uri: &str) -> Result<Node> {
        let documents = self.documents.read().await;
        let document = documents
            .get(uri)
            .ok_or_else(|| anyhow!("unknown document: {}", uri))?;
        ast::parse(&document.text, document.dialect)
            .with_context(|| format!("failed to parse {}", uri))
    }

    async fn document_bundle(&self, uri: &str) -> Result<Option<Value>> {
        let root = self.document_ast(uri).await?;
        Ok(Some(ast_to_object(&root)))
    }

    async fn dialect(&self, uri: &str) -> Result<Dialect> {
        let documents = self.documents.read().await;
        documents
            .get(uri)
            .map(|document| document.dialect)
            .ok_or_else(|| anyhow!("unknown document: {}", uri))
    }

    async fn apply_edit(&self, uri: &str, edit: &WorkspaceEdit) -> Result<()> {
        let text = self.document_text(uri).await?;
        let new_text = edit.apply(&text)?;
        self.update_text(uri, new_text).await
    }

    async fn insert_snippet(&self, uri: &str, snippet: &SnippetEdit) -> Result<()> {
        let mut edit = WorkspaceEdit::new();
        edit.insert(snippet.position, materialize_snippet(&snippet.snippet));
        self.apply_edit(uri, &edit).await
    }

    async fn refresh_diagnostics(&self, uri: &str, issues: &[Issue]) -> Result<()> {
        self.diagnostics
            .write()
            .await
            .insert(uri.to_string(), issues.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;

    #[test]
    fn test_materialize_snippet() {
        assert_eq!(
            materialize_snippet("\"contact\": {\"name\": \"${1:API Support}\"}"),
            "\"contact\": {\"name\": \"API Support\"}"
        );
        assert_eq!(materialize_snippet("plain text"), "plain text");
        assert_eq!(materialize_snippet("${1:a} and ${2:b}"), "a and b");
    }

    #[tokio::test]
    async fn test_open_and_edit_in_memory_document() {
        let host = LocalHost::new();
        host.open("api.json", r#"{"a": 1}"#, Dialect::Json).await;

        let mut edit = WorkspaceEdit::new();
        edit.replace(Span::new(6, 7), "2");
        host.apply_edit("api.json", &edit).await.unwrap();
        assert_eq!(host.document_text("api.json").await.unwrap(), r#"{"a": 2}"#);

        let root = host.document_ast("api.json").await.unwrap();
        assert_eq!(root.find("/a").unwrap().value(), Some(&serde_json::json!(2)));
    }

    #[tokio::test]
    async fn test_snippet_insertion_materializes_placeholders() {
        let host = LocalHost::new();
        host.open("api.json", r#"{"info": {}}"#, Dialect::Json).await;

        let snippet = SnippetEdit {
            position: 10,
            snippet: "\"title\": \"${1:My API}\"".to_string(),
        };
        host.insert_snippet("api.json", &snippet).await.unwrap();
        assert_eq!(
            host.document_text("api.json").await.unwrap(),
            r#"{"info": {"title": "My API"}}"#
        );
    }

    #[tokio::test]
    async fn test_file_backed_document_writes_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.yaml");
        std::fs::write(&path, "info:\n  title: x\n").unwrap();

        let host = LocalHost::new();
        let uri = host.open_file(&path).await.unwrap();
        assert_eq!(host.dialect(&uri).await.unwrap(), Dialect::Yaml);

        let mut edit = WorkspaceEdit::new();
        edit.replace(Span::new(15, 16), "y");
        host.apply_edit(&uri, &edit).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "info:\n  title: y\n");
    }

    #[tokio::test]
    async fn test_bundle_is_the_document_object() {
        let host = LocalHost::new();
        host.open("api.json", r#"{"components":{"securitySchemes":{"k":{}}}}"#, Dialect::Json)
            .await;
        let bundle = host.document_bundle("api.json").await.unwrap().unwrap();
        assert!(bundle.pointer("/components/securitySchemes/k").is_some());
    }

    #[tokio::test]
    async fn test_unknown_document_is_an_error() {
        let host = LocalHost::new();
        assert!(host.document_text("nope.json").await.is_err());
    }
}
