use thiserror::Error;

/// Failure kinds of a single fix application. An `UnresolvedPointer` aborts
/// only the group it occurred in; sibling groups of a bulk operation are
/// unaffected.
#[derive(Debug, Clone, Error)]
pub enum FixError {
    #[error("unable to locate node: {pointer}")]
    UnresolvedPointer { pointer: String },

    #[error("fix '{title}' does not apply here: {reason}")]
    UnsupportedTarget { title: String, reason: String },

    #[error("invalid fix template '{title}': {reason}")]
    InvalidTemplate { title: String, reason: String },

    #[error("conflicting edits at byte {offset}")]
    OverlappingEdits { offset: usize },
}

impl FixError {
    pub fn unresolved(pointer: impl Into<String>) -> FixError {
        FixError::UnresolvedPointer {
            pointer: pointer.into(),
        }
    }

    pub fn unsupported(title: impl Into<String>, reason: impl Into<String>) -> FixError {
        FixError::UnsupportedTarget {
            title: title.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid(title: impl Into<String>, reason: impl Into<String>) -> FixError {
        FixError::InvalidTemplate {
            title: title.into(),
            reason: reason.into(),
        }
    }
}
