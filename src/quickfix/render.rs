use serde_json::Value;

use crate::ast::OpenApiVersion;
use crate::audit::Issue;

use super::fix::Fix;
use super::sources::SourceRegistry;

/// Substitute resolved parameter values into a cloned fix's payload. In
/// snippet mode each slot becomes a `${n:default}` tab stop instead, so the
/// host editor can prompt for the value.
pub fn specialize_fix(
    fix: &mut Fix,
    issues: &[&Issue],
    version: OpenApiVersion,
    bundle: Option<&Value>,
    sources: &SourceRegistry,
    snippet: bool,
) {
    let Some(parameters) = fix.parameters.clone() else {
        return;
    };
    for (index, parameter) in parameters.iter().enumerate() {
        let issue = parameter
            .fix_index
            .and_then(|fix_index| issues.get(fix_index))
            .or_else(|| issues.first());
        let Some(issue) = issue else {
            continue;
        };
        let values = sources.resolve(issue, fix, parameter, version, bundle);
        let Some(slot) = fix.fix.pointer_mut(&parameter.path) else {
            continue;
        };
        if snippet {
            let default = values.first().unwrap_or(slot);
            let default = scalar_text(default);
            *slot = Value::String(format!("${{{}:{}}}", index + 1, default));
        } else if let Some(value) = values.first() {
            *slot = value.clone();
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Render a payload as JSON fragment text. The first line carries no
/// indentation (it continues the current line); every following line is
/// prefixed with `indent`.
pub fn render_json(value: &Value, indent: &str) -> String {
    let pretty = serde_json::to_string_pretty(value).unwrap();
    let mut lines = pretty.lines();
    let mut result = lines.next().unwrap_or_default().to_string();
    for line in lines {
        result.push('\n');
        result.push_str(indent);
        result.push_str(line);
    }
    result
}

pub fn json_inline(value: &Value) -> String {
    serde_json::to_string(value).unwrap()
}

pub fn json_key(key: &str) -> String {
    serde_json::to_string(key).unwrap()
}

/// Render a payload as a YAML block with every line prefixed by `indent`.
pub fn render_yaml_block(value: &Value, indent: &str) -> String {
    let rendered = serde_yaml::to_string(value).unwrap();
    let mut result = String::new();
    for (i, line) in rendered.trim_end().lines().enumerate() {
        if i > 0 {
            result.push('\n');
        }
        result.push_str(indent);
        result.push_str(line);
    }
    result
}

/// Render a scalar for inline YAML, quoting only when a plain scalar would
/// change meaning.
pub fn yaml_scalar(value: &Value) -> String {
    match value {
        Value::String(text) => {
            if needs_yaml_quoting(text) {
                format!("'{}'", text.replace('\'', "''"))
            } else {
                text.clone()
            }
        }
        other => other.to_string(),
    }
}

fn needs_yaml_quoting(text: &str) -> bool {
    if text.is_empty() || text.trim() != text {
        return true;
    }
    if matches!(text, "null" | "~" | "true" | "false") {
        return true;
    }
    if serde_json::from_str::<Value>(text)
        .map(|parsed| parsed.is_number())
        .unwrap_or(false)
    {
        return true;
    }
    let first = text.as_bytes()[0];
    if matches!(
        first,
        b'-' | b'?' | b':' | b',' | b'[' | b']' | b'{' | b'}' | b'#' | b'&' | b'*' | b'!' | b'|'
            | b'>' | b'\'' | b'"' | b'%' | b'@' | b'`'
    ) {
        return true;
    }
    text.contains(": ") || text.ends_with(':') || text.contains(" #")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Severity;
    use crate::quickfix::fix::{FixParameter, FixType};
    use serde_json::json;

    fn make_issue(pointer: &str) -> Issue {
        Issue {
            id: "rule".to_string(),
            pointer: pointer.to_string(),
            description: String::new(),
            severity: Severity::Medium,
            range: None,
        }
    }

    fn contact_fix() -> Fix {
        Fix {
            problem: vec!["v3-info-contact".to_string()],
            title: "Add missing contact property".to_string(),
            fix_type: FixType::Insert,
            fix: json!({"contact": {"name": "API Support"}}),
            pointer: None,
            parameters: Some(vec![FixParameter {
                name: "name".to_string(),
                source: None,
                path: "/contact/name".to_string(),
                values: Some(vec![json!("Team A")]),
                fix_index: None,
            }]),
        }
    }

    #[test]
    fn test_specialize_substitutes_resolved_value() {
        let mut fix = contact_fix();
        let issue = make_issue("/info");
        let sources = SourceRegistry::default();
        specialize_fix(&mut fix, &[&issue], OpenApiVersion::V3, None, &sources, false);
        assert_eq!(fix.fix, json!({"contact": {"name": "Team A"}}));
    }

    #[test]
    fn test_specialize_snippet_emits_tab_stop() {
        let mut fix = contact_fix();
        let issue = make_issue("/info");
        let sources = SourceRegistry::default();
        specialize_fix(&mut fix, &[&issue], OpenApiVersion::V3, None, &sources, true);
        assert_eq!(fix.fix, json!({"contact": {"name": "${1:Team A}"}}));
    }

    #[test]
    fn test_specialize_snippet_falls_back_to_payload_default() {
        let mut fix = contact_fix();
        fix.parameters.as_mut().unwrap()[0].values = None;
        let issue = make_issue("/info");
        let sources = SourceRegistry::default();
        specialize_fix(&mut fix, &[&issue], OpenApiVersion::V3, None, &sources, true);
        assert_eq!(fix.fix, json!({"contact": {"name": "${1:API Support}"}}));
    }

    #[test]
    fn test_render_json_indents_continuation_lines() {
        let rendered = render_json(&json!({"a": {"b": 1}}), "    ");
        assert_eq!(rendered, "{\n      \"a\": {\n        \"b\": 1\n      }\n    }");
    }

    #[test]
    fn test_render_yaml_block() {
        let rendered = render_yaml_block(&json!({"contact": {"name": "x"}}), "  ");
        assert_eq!(rendered, "  contact:\n    name: x");
    }

    #[test]
    fn test_yaml_scalar_quoting() {
        assert_eq!(yaml_scalar(&json!("plain text")), "plain text");
        assert_eq!(yaml_scalar(&json!("1.0")), "'1.0'");
        assert_eq!(yaml_scalar(&json!("true")), "'true'");
        assert_eq!(yaml_scalar(&json!("a: b")), "'a: b'");
        assert_eq!(yaml_scalar(&json!("it's")), "it's");
        assert_eq!(yaml_scalar(&json!("'quoted'")), "'''quoted'''");
        assert_eq!(yaml_scalar(&json!(2.5)), "2.5");
        assert_eq!(yaml_scalar(&json!(null)), "null");
    }
}
