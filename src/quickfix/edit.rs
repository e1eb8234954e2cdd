use crate::ast::Span;

use super::error::FixError;

/// One range replacement. An empty span is an insertion; empty text is a
/// deletion.
#[derive(Debug, Clone)]
pub struct TextEdit {
    pub span: Span,
    pub new_text: String,
    /// Bulk insertions ask the host to confirm each entry.
    pub needs_confirmation: bool,
    pub label: Option<String>,
}

/// The edit accumulator shared by all issue-pointer groups of one command
/// invocation. Applied atomically: either every edit lands or none does.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceEdit {
    edits: Vec<TextEdit>,
}

impl WorkspaceEdit {
    pub fn new() -> WorkspaceEdit {
        WorkspaceEdit::default()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn edits(&self) -> &[TextEdit] {
        &self.edits
    }

    pub fn replace(&mut self, span: Span, new_text: impl Into<String>) {
        self.edits.push(TextEdit {
            span,
            new_text: new_text.into(),
            needs_confirmation: false,
            label: None,
        });
    }

    pub fn insert(&mut self, position: usize, new_text: impl Into<String>) {
        self.replace(Span::new(position, position), new_text);
    }

    pub fn insert_with_confirmation(
        &mut self,
        position: usize,
        new_text: impl Into<String>,
        label: impl Into<String>,
    ) {
        self.edits.push(TextEdit {
            span: Span::new(position, position),
            new_text: new_text.into(),
            needs_confirmation: true,
            label: Some(label.into()),
        });
    }

    pub fn delete(&mut self, span: Span) {
        self.replace(span, "");
    }

    /// Splice all edits into `text` in one pass. Edits are sorted by start
    /// offset; overlapping ranges are a hard error, not a merge.
    pub fn apply(&self, text: &str) -> Result<String, FixError> {
        let mut ordered: Vec<&TextEdit> = self.edits.iter().collect();
        ordered.sort_by_key(|edit| (edit.span.start, edit.span.end));

        let mut result = String::with_capacity(text.len());
        let mut cursor = 0;
        for edit in ordered {
            if edit.span.start < cursor {
                return Err(FixError::OverlappingEdits {
                    offset: edit.span.start,
                });
            }
            result.push_str(&text[cursor..edit.span.start]);
            result.push_str(&edit.new_text);
            cursor = edit.span.end;
        }
        result.push_str(&text[cursor..]);
        Ok(result)
    }
}

/// A templated insertion handed to the host editor for interactive
/// placeholder filling. Mutually exclusive with a `WorkspaceEdit` within one
/// invocation.
#[derive(Debug, Clone)]
pub struct SnippetEdit {
    pub position: usize,
    pub snippet: String,
}
