use regex::Regex;
use serde_json::Value;

use super::edit::{SnippetEdit, WorkspaceEdit};
use super::error::FixError;
use super::fix::{Fix, FixType};
use super::render::{json_inline, json_key, yaml_scalar};
use super::splice::{
    delete_json_span, delete_yaml_span, insert_json_node, insert_yaml_node, replace_json_node,
    replace_yaml_node,
};
use super::FixContext;
use crate::ast::Dialect;

/// Run the executor for the context's fix type. Appends to the shared edit
/// accumulator, or returns a snippet; never both.
pub fn execute_fix(
    context: &FixContext,
    edit: &mut WorkspaceEdit,
) -> Result<Option<SnippetEdit>, FixError> {
    match context.fix.fix_type {
        FixType::Insert => match transform_insert_to_replace(context)? {
            Some(replace_context) => {
                fix_replace(&replace_context, edit);
                Ok(None)
            }
            None => fix_insert(context, edit),
        },
        FixType::Replace => {
            fix_replace(context, edit);
            Ok(None)
        }
        FixType::RegexReplace => {
            fix_regex_replace(context, edit)?;
            Ok(None)
        }
        FixType::RenameKey => {
            fix_rename_key(context, edit)?;
            Ok(None)
        }
        FixType::Delete => {
            fix_delete(context, edit)?;
            Ok(None)
        }
    }
}

/// A single-key Insert whose key already exists on the target becomes a
/// Replace of that child, keeping "add property" fixes idempotent. A
/// multi-key payload with a colliding key is refused outright; inserting it
/// would duplicate the key.
pub fn transform_insert_to_replace<'a>(
    context: &FixContext<'a>,
) -> Result<Option<FixContext<'a>>, FixError> {
    let Some(payload) = context.fix.fix.as_object() else {
        return Ok(None);
    };
    if !context.target.is_object() {
        return Ok(None);
    }

    let collides = |key: &str| {
        context
            .target
            .children()
            .iter()
            .any(|child| child.key() == Some(key))
    };

    if payload.len() == 1 {
        let (key, sub_payload) = payload.iter().next().unwrap();
        if collides(key) {
            let pointer = format!("{}/{}", context.pointer, escape_token(key));
            let target = context
                .root
                .find(&pointer)
                .ok_or_else(|| FixError::unresolved(&pointer))?;
            return Ok(Some(FixContext {
                fix: Fix {
                    problem: context.fix.problem.clone(),
                    title: context.fix.title.clone(),
                    fix_type: FixType::Replace,
                    fix: sub_payload.clone(),
                    pointer: None,
                    parameters: None,
                },
                pointer,
                bulk: context.bulk,
                root: context.root,
                target,
                text: context.text,
                dialect: context.dialect,
            }));
        }
    } else if let Some(key) = payload.keys().find(|key| collides(key)) {
        return Err(FixError::unsupported(
            &context.fix.title,
            format!("key '{}' already exists on the target", key),
        ));
    }
    Ok(None)
}

fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Insertions become editor snippets so the user can fill placeholders;
/// bulk insertions always produce plain edits flagged for confirmation,
/// since multiple simultaneous snippets are not representable.
fn fix_insert(
    context: &FixContext,
    edit: &mut WorkspaceEdit,
) -> Result<Option<SnippetEdit>, FixError> {
    let (new_text, position) = match context.dialect {
        Dialect::Json => {
            insert_json_node(context.text, context.target, &context.fix.fix, &context.fix.title)?
        }
        Dialect::Yaml => {
            insert_yaml_node(context.text, context.target, &context.fix.fix, &context.fix.title)?
        }
    };
    if context.bulk {
        edit.insert_with_confirmation(position, new_text, context.fix.title.clone());
        Ok(None)
    } else {
        Ok(Some(SnippetEdit {
            position,
            snippet: new_text,
        }))
    }
}

fn fix_replace(context: &FixContext, edit: &mut WorkspaceEdit) {
    let (new_text, span) = match context.dialect {
        Dialect::Json => replace_json_node(context.text, context.target, &context.fix.fix),
        Dialect::Yaml => replace_yaml_node(context.text, context.target, &context.fix.fix),
    };
    edit.replace(span, new_text);
}

/// Global pattern substitution on a scalar string value. A non-scalar
/// target no-ops; the issue may be stale.
fn fix_regex_replace(context: &FixContext, edit: &mut WorkspaceEdit) -> Result<(), FixError> {
    let Some(Value::String(current)) = context.target.value() else {
        return Ok(());
    };
    let pattern = context
        .fix
        .fix
        .get("match")
        .and_then(Value::as_str)
        .ok_or_else(|| FixError::invalid(&context.fix.title, "missing match pattern"))?;
    let replacement = context
        .fix
        .fix
        .get("replace")
        .and_then(Value::as_str)
        .ok_or_else(|| FixError::invalid(&context.fix.title, "missing replace template"))?;
    let regex = Regex::new(pattern)
        .map_err(|err| FixError::invalid(&context.fix.title, err.to_string()))?;
    let new_value = regex.replace_all(current, replacement).to_string();

    match context.dialect {
        Dialect::Json => {
            edit.replace(context.target.span, json_inline(&Value::String(new_value)));
        }
        Dialect::Yaml => {
            edit.replace(context.target.span, yaml_scalar(&Value::String(new_value)));
        }
    }
    Ok(())
}

/// Replace the key token, regenerating it from the fix payload.
fn fix_rename_key(context: &FixContext, edit: &mut WorkspaceEdit) -> Result<(), FixError> {
    let key_span = context
        .target
        .key_span
        .ok_or_else(|| FixError::unsupported(&context.fix.title, "target has no key"))?;
    let Value::String(new_key) = &context.fix.fix else {
        return Err(FixError::invalid(
            &context.fix.title,
            "rename payload must be a string",
        ));
    };
    let rendered = match context.dialect {
        Dialect::Json => json_key(new_key),
        Dialect::Yaml => yaml_scalar(&Value::String(new_key.clone())),
    };
    edit.replace(key_span, rendered);
    Ok(())
}

fn fix_delete(context: &FixContext, edit: &mut WorkspaceEdit) -> Result<(), FixError> {
    let span = match context.dialect {
        Dialect::Json => delete_json_span(
            context.root,
            &context.pointer,
            context.target,
            &context.fix.title,
        )?,
        Dialect::Yaml => delete_yaml_span(context.text, context.target),
    };
    edit.delete(span);
    Ok(())
}
