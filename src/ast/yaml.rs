use serde_json::Value;

use super::{Node, NodeKind, ParseError, Span};

/// Span-tracking parser for the block-style YAML subset OpenAPI documents
/// use: block mappings, block sequences, plain and quoted scalars, comments.
/// Flow collections, anchors, aliases and block scalars are rejected with a
/// located error instead of being silently mis-ranged.
pub fn parse_yaml(text: &str) -> Result<Node, ParseError> {
    let lines = scan_lines(text)?;
    if lines.is_empty() {
        return Err(ParseError::new(0, "empty document"));
    }
    let col = lines[0].indent;
    let mut parser = YamlParser {
        text,
        lines,
        idx: 0,
    };
    let root = parser.parse_block(col, false, None, None)?;
    if parser.idx < parser.lines.len() {
        let line = &parser.lines[parser.idx];
        return Err(ParseError::new(
            line.start + line.indent,
            "unexpected content after document root",
        ));
    }
    Ok(root)
}

/// One significant source line: comments stripped, trailing whitespace
/// trimmed, blank and comment-only lines dropped.
struct Line {
    start: usize,
    text_end: usize,
    indent: usize,
}

fn scan_lines(text: &str) -> Result<Vec<Line>, ParseError> {
    let mut lines = Vec::new();
    let mut offset = 0;
    let mut first = true;
    for raw in text.split('\n') {
        let start = offset;
        offset += raw.len() + 1;
        let raw = raw.strip_suffix('\r').unwrap_or(raw);

        let mut indent = 0;
        for b in raw.bytes() {
            match b {
                b' ' => indent += 1,
                b'\t' => {
                    return Err(ParseError::new(start + indent, "tab in indentation"));
                }
                _ => break,
            }
        }

        let content_end = strip_comment(raw, indent);
        let content = raw[indent..content_end].trim_end();
        if content.is_empty() {
            continue;
        }
        if first && content == "---" {
            first = false;
            continue;
        }
        first = false;
        if content == "..." {
            break;
        }
        lines.push(Line {
            start,
            text_end: start + indent + content.len(),
            indent,
        });
    }
    Ok(lines)
}

/// Byte index (into the raw line) where a trailing comment begins, or the
/// line length. A '#' opens a comment only outside quotes and only at the
/// content start or after whitespace.
fn strip_comment(raw: &str, indent: usize) -> usize {
    let bytes = raw.as_bytes();
    let mut in_single = false;
    let mut in_double = false;
    let mut i = indent;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_double => i += 1,
            b'"' if !in_single => in_double = !in_double,
            b'\'' if !in_double => in_single = !in_single,
            b'#' if !in_single && !in_double => {
                if i == indent || bytes[i - 1] == b' ' || bytes[i - 1] == b'\t' {
                    return i;
                }
            }
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

struct YamlParser<'a> {
    text: &'a str,
    lines: Vec<Line>,
    idx: usize,
}

impl<'a> YamlParser<'a> {
    fn content(&self, line: &Line, col: usize) -> &'a str {
        let text = self.text;
        &text[line.start + col..line.text_end]
    }

    /// Parse the block starting on the current line at `col`. When
    /// `mid_line` is set the first line is a sequence item's remainder and
    /// its real indentation is shallower than `col`.
    fn parse_block(
        &mut self,
        col: usize,
        mid_line: bool,
        key: Option<String>,
        key_span: Option<Span>,
    ) -> Result<Node, ParseError> {
        let line = &self.lines[self.idx];
        let content = self.content(line, col);
        if content == "-" || content.starts_with("- ") {
            self.parse_sequence(col, mid_line, key, key_span)
        } else if split_mapping_key(content).is_some() {
            self.parse_mapping(col, mid_line, key, key_span)
        } else {
            let node = self.scalar_node(col, key, key_span)?;
            self.idx += 1;
            Ok(node)
        }
    }

    fn parse_mapping(
        &mut self,
        col: usize,
        mid_line: bool,
        key: Option<String>,
        key_span: Option<Span>,
    ) -> Result<Node, ParseError> {
        let start = self.lines[self.idx].start + col;
        let mut end = start;
        let mut children = Vec::new();
        let mut first = true;

        while self.idx < self.lines.len() {
            let line = &self.lines[self.idx];
            if !(first && mid_line) && line.indent != col {
                if line.indent < col {
                    break;
                }
                return Err(ParseError::new(line.start + line.indent, "bad indentation"));
            }
            let content = self.content(line, col);
            if content == "-" || content.starts_with("- ") {
                return Err(ParseError::new(
                    line.start + col,
                    "sequence item in mapping",
                ));
            }
            let Some(entry) = split_mapping_key(content) else {
                return Err(ParseError::new(line.start + col, "expected mapping key"));
            };
            let entry_key_span = Span::new(line.start + col, line.start + col + entry.token_len);
            let rest = &content[entry.colon + 1..];
            let rest_trimmed = rest.trim_start();
            let child = if !rest_trimmed.is_empty() {
                let rest_col = col + entry.colon + 1 + (rest.len() - rest_trimmed.len());
                let line_start = line.start;
                self.idx += 1;
                scalar_from_str(
                    rest_trimmed,
                    line_start + rest_col,
                    Some(entry.key),
                    Some(entry_key_span),
                )?
            } else {
                let line_text_end = line.text_end;
                self.idx += 1;
                let nested_col = match self.lines.get(self.idx) {
                    Some(next) if next.indent > col => Some(next.indent),
                    Some(next) if next.indent == col => {
                        let c = self.content(next, next.indent);
                        if c == "-" || c.starts_with("- ") {
                            Some(next.indent)
                        } else {
                            None
                        }
                    }
                    _ => None,
                };
                match nested_col {
                    Some(next_col) => {
                        self.parse_block(next_col, false, Some(entry.key), Some(entry_key_span))?
                    }
                    None => Node {
                        kind: NodeKind::Scalar,
                        key: Some(entry.key),
                        key_span: Some(entry_key_span),
                        span: Span::new(line_text_end, line_text_end),
                        children: Vec::new(),
                        value: Some(Value::Null),
                    },
                }
            };
            end = end.max(child.span.end).max(entry_key_span.end);
            children.push(child);
            first = false;
        }

        Ok(Node {
            kind: NodeKind::Object,
            key,
            key_span,
            span: Span::new(start, end),
            children,
            value: None,
        })
    }

    fn parse_sequence(
        &mut self,
        col: usize,
        mid_line: bool,
        key: Option<String>,
        key_span: Option<Span>,
    ) -> Result<Node, ParseError> {
        let start = self.lines[self.idx].start + col;
        let mut end = start;
        let mut children = Vec::new();
        let mut first = true;

        while self.idx < self.lines.len() {
            let line = &self.lines[self.idx];
            if !(first && mid_line) && line.indent != col {
                if line.indent < col {
                    break;
                }
                return Err(ParseError::new(line.start + line.indent, "bad indentation"));
            }
            let content = self.content(line, col);
            if !(content == "-" || content.starts_with("- ")) {
                break;
            }
            let child = if content == "-" {
                let line_text_end = line.text_end;
                self.idx += 1;
                let nested_col = match self.lines.get(self.idx) {
                    Some(next) if next.indent > col => Some(next.indent),
                    _ => None,
                };
                match nested_col {
                    Some(next_col) => self.parse_block(next_col, false, None, None)?,
                    None => Node {
                        kind: NodeKind::Scalar,
                        key: None,
                        key_span: None,
                        span: Span::new(line_text_end, line_text_end),
                        children: Vec::new(),
                        value: Some(Value::Null),
                    },
                }
            } else {
                let rest = &content[1..];
                let rest_trimmed = rest.trim_start();
                let item_col = col + 1 + (rest.len() - rest_trimmed.len());
                if rest_trimmed.starts_with("- ")
                    || rest_trimmed == "-"
                    || split_mapping_key(rest_trimmed).is_some()
                {
                    self.parse_block(item_col, true, None, None)?
                } else {
                    let offset = line.start + item_col;
                    self.idx += 1;
                    scalar_from_str(rest_trimmed, offset, None, None)?
                }
            };
            end = end.max(child.span.end);
            children.push(child);
            first = false;
        }

        Ok(Node {
            kind: NodeKind::Array,
            key,
            key_span,
            span: Span::new(start, end),
            children,
            value: None,
        })
    }

    fn scalar_node(
        &mut self,
        col: usize,
        key: Option<String>,
        key_span: Option<Span>,
    ) -> Result<Node, ParseError> {
        let line = &self.lines[self.idx];
        let content = self.content(line, col);
        scalar_from_str(content, line.start + col, key, key_span)
    }
}

struct MappingEntry {
    key: String,
    /// Length of the key token as written, quotes included.
    token_len: usize,
    /// Byte index of the ':' within the line content.
    colon: usize,
}

/// Recognize `key: value` / `key:` lines. Returns None when the content is
/// not a mapping entry (making it a plain scalar line).
fn split_mapping_key(content: &str) -> Option<MappingEntry> {
    let bytes = content.as_bytes();
    if bytes.is_empty() {
        return None;
    }
    if bytes[0] == b'"' || bytes[0] == b'\'' {
        let quote = bytes[0];
        let mut i = 1;
        while i < bytes.len() {
            if bytes[i] == b'\\' && quote == b'"' {
                i += 2;
                continue;
            }
            if bytes[i] == quote {
                // '' is an escaped quote, not the end of the key.
                if quote == b'\'' && i + 1 < bytes.len() && bytes[i + 1] == b'\'' {
                    i += 2;
                    continue;
                }
                break;
            }
            i += 1;
        }
        if i >= bytes.len() {
            return None;
        }
        let token_len = i + 1;
        let mut j = token_len;
        while j < bytes.len() && bytes[j] == b' ' {
            j += 1;
        }
        if j >= bytes.len() || bytes[j] != b':' {
            return None;
        }
        if j + 1 < bytes.len() && bytes[j + 1] != b' ' {
            return None;
        }
        let key = unquote(&content[..token_len]).ok()?;
        return Some(MappingEntry {
            key,
            token_len,
            colon: j,
        });
    }

    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b':' && (i + 1 == bytes.len() || bytes[i + 1] == b' ') {
            let key = content[..i].trim_end();
            if key.is_empty() {
                return None;
            }
            return Some(MappingEntry {
                key: key.to_string(),
                token_len: key.len(),
                colon: i,
            });
        }
        i += 1;
    }
    None
}

/// Scalar from trimmed content starting at `offset`.
fn scalar_from_str(
    content: &str,
    offset: usize,
    key: Option<String>,
    key_span: Option<Span>,
) -> Result<Node, ParseError> {
    let first = content.as_bytes()[0];
    match first {
        b'&' | b'*' => {
            return Err(ParseError::new(offset, "anchors and aliases not supported"));
        }
        b'|' | b'>' => {
            return Err(ParseError::new(offset, "block scalars not supported"));
        }
        b'{' | b'[' => {
            return Err(ParseError::new(offset, "flow collections not supported"));
        }
        _ => {}
    }
    let value = if first == b'"' || first == b'\'' {
        Value::String(unquote(content).map_err(|message| ParseError::new(offset, message))?)
    } else {
        plain_scalar_value(content)
    };
    Ok(Node {
        kind: NodeKind::Scalar,
        key,
        key_span,
        span: Span::new(offset, offset + content.len()),
        children: Vec::new(),
        value: Some(value),
    })
}

fn unquote(token: &str) -> Result<String, String> {
    let bytes = token.as_bytes();
    let quote = bytes[0];
    if bytes.len() < 2 || bytes[bytes.len() - 1] != quote {
        return Err("unterminated quoted scalar".to_string());
    }
    if quote == b'\'' {
        let inner = &token[1..token.len() - 1];
        return Ok(inner.replace("''", "'"));
    }
    serde_json::from_str::<String>(token).map_err(|_| "invalid string escape".to_string())
}

fn plain_scalar_value(content: &str) -> Value {
    match content {
        "null" | "~" => return Value::Null,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(parsed) = serde_json::from_str::<Value>(content) {
        if parsed.is_number() {
            return parsed;
        }
    }
    Value::String(content.to_string())
}
