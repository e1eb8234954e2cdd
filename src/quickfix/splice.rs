use serde_json::Value;

use crate::ast::{Node, Span};

use super::error::FixError;
use super::render::{json_inline, json_key, render_json, render_yaml_block, yaml_scalar};

/// Where a node begins as written, key token included.
pub fn node_start(node: &Node) -> usize {
    node.key_span.map(|span| span.start).unwrap_or(node.span.start)
}

fn line_start(text: &str, offset: usize) -> usize {
    text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

fn line_end(text: &str, offset: usize) -> usize {
    text[offset..]
        .find('\n')
        .map(|i| offset + i)
        .unwrap_or(text.len())
}

fn line_indent(text: &str, offset: usize) -> String {
    let start = line_start(text, offset);
    text[start..].chars().take_while(|c| *c == ' ').collect()
}

fn parent_of<'a>(root: &'a Node, pointer: &str) -> Option<&'a Node> {
    let idx = pointer.rfind('/')?;
    root.find(&pointer[..idx])
}

/// Compute the text and position of a JSON insertion into an object or
/// array node.
pub fn insert_json_node(
    text: &str,
    target: &Node,
    payload: &Value,
    title: &str,
) -> Result<(String, usize), FixError> {
    if target.is_object() {
        let Some(entries) = payload.as_object() else {
            return Err(FixError::invalid(title, "insert payload must be an object"));
        };
        if let Some(last) = target.children().last() {
            let indent = line_indent(text, node_start(last));
            let rendered: Vec<String> = entries
                .iter()
                .map(|(key, value)| format!("{}: {}", json_key(key), render_json(value, &indent)))
                .collect();
            let body = rendered.join(&format!(",\n{}", indent));
            Ok((format!(",\n{}{}", indent, body), last.span.end))
        } else {
            let rendered: Vec<String> = entries
                .iter()
                .map(|(key, value)| format!("{}: {}", json_key(key), json_inline(value)))
                .collect();
            Ok((rendered.join(", "), target.span.start + 1))
        }
    } else if target.is_array() {
        if let Some(last) = target.children().last() {
            let indent = line_indent(text, last.span.start);
            Ok((
                format!(",\n{}{}", indent, render_json(payload, &indent)),
                last.span.end,
            ))
        } else {
            Ok((json_inline(payload), target.span.start + 1))
        }
    } else {
        Err(FixError::unsupported(
            title,
            "cannot insert into a scalar value",
        ))
    }
}

/// Compute the text and position of a YAML insertion. An empty mapping
/// appears in YAML as a keyed null scalar; inserting there starts the
/// block one indent step below the key.
pub fn insert_yaml_node(
    text: &str,
    target: &Node,
    payload: &Value,
    title: &str,
) -> Result<(String, usize), FixError> {
    if target.is_object() {
        let Some(last) = target.children().last() else {
            return Err(FixError::unsupported(title, "empty mapping has no anchor line"));
        };
        let position = line_end(text, last.span.end.max(node_start(last)));
        let indent = line_indent(text, node_start(last));
        Ok((format!("\n{}", render_yaml_block(payload, &indent)), position))
    } else if target.is_array() {
        let Some(last) = target.children().last() else {
            return Err(FixError::unsupported(title, "empty sequence has no anchor line"));
        };
        let position = line_end(text, last.span.end.max(node_start(last)));
        let indent = line_indent(text, node_start(last));
        let element = Value::Array(vec![payload.clone()]);
        Ok((format!("\n{}", render_yaml_block(&element, &indent)), position))
    } else if target.span.is_empty() && target.key_span.is_some() {
        let position = line_end(text, target.span.start);
        let key_indent = line_indent(text, target.key_span.unwrap().start);
        let indent = format!("{}  ", key_indent);
        Ok((format!("\n{}", render_yaml_block(payload, &indent)), position))
    } else {
        Err(FixError::unsupported(
            title,
            "cannot insert into a scalar value",
        ))
    }
}

/// Replacement text and range for a JSON node.
pub fn replace_json_node(text: &str, target: &Node, payload: &Value) -> (String, Span) {
    let indent = line_indent(text, target.span.start);
    (render_json(payload, &indent), target.span)
}

/// Replacement text and range for a YAML node. Scalars replace inline;
/// structured payloads become a block below the key line.
pub fn replace_yaml_node(text: &str, target: &Node, payload: &Value) -> (String, Span) {
    if !payload.is_object() && !payload.is_array() {
        let rendered = yaml_scalar(payload);
        if target.span.is_empty() {
            return (format!(" {}", rendered), target.span);
        }
        return (rendered, target.span);
    }

    let start_col = target.span.start - line_start(text, target.span.start);
    let indent = line_indent(text, target.span.start);
    if !target.span.is_empty() && start_col == indent.len() {
        // A block replacing a block at the same column.
        let block = render_yaml_block(payload, &indent);
        (block[indent.len()..].to_string(), target.span)
    } else {
        // A scalar (or missing) value replaced by a block under its key.
        let step = format!("{}  ", indent);
        let mut span = target.span;
        if !span.is_empty() && span.start > 0 && text.as_bytes()[span.start - 1] == b' ' {
            span.start -= 1;
        }
        (format!("\n{}", render_yaml_block(payload, &step)), span)
    }
}

/// Range to remove for a JSON node, swallowing the separating comma.
pub fn delete_json_span(
    root: &Node,
    pointer: &str,
    target: &Node,
    title: &str,
) -> Result<Span, FixError> {
    let parent = parent_of(root, pointer)
        .ok_or_else(|| FixError::unsupported(title, "cannot delete the document root"))?;
    let index = parent
        .children()
        .iter()
        .position(|child| std::ptr::eq(child, target))
        .ok_or_else(|| FixError::unresolved(pointer))?;

    if let Some(next) = parent.children().get(index + 1) {
        Ok(Span::new(node_start(target), node_start(next)))
    } else if index > 0 {
        Ok(Span::new(parent.children()[index - 1].span.end, target.span.end))
    } else {
        Ok(Span::new(parent.span.start + 1, parent.span.end - 1))
    }
}

/// Range to remove for a YAML node: its full lines, trailing newline
/// included.
pub fn delete_yaml_span(text: &str, target: &Node) -> Span {
    let start = line_start(text, node_start(target));
    let mut end = line_end(text, target.span.end.max(node_start(target)));
    if end < text.len() {
        end += 1;
    }
    Span::new(start, end)
}
