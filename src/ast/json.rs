use serde_json::Value;

use super::{Node, NodeKind, ParseError, Span};

/// Span-tracking JSON parser. Scalar token text is handed to serde_json so
/// escape and number handling match the rest of the crate.
pub fn parse_json(text: &str) -> Result<Node, ParseError> {
    let mut parser = Parser {
        text,
        bytes: text.as_bytes(),
        pos: 0,
    };
    parser.skip_ws();
    let root = parser.parse_value(None, None)?;
    parser.skip_ws();
    if parser.pos != parser.bytes.len() {
        return Err(ParseError::new(parser.pos, "unexpected trailing content"));
    }
    Ok(root)
}

struct Parser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while let Some(b) = self.peek() {
            if b == b' ' || b == b'\t' || b == b'\n' || b == b'\r' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn expect(&mut self, expected: u8) -> Result<(), ParseError> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(ParseError::new(
                self.pos,
                format!("expected '{}'", expected as char),
            ))
        }
    }

    fn parse_value(
        &mut self,
        key: Option<String>,
        key_span: Option<Span>,
    ) -> Result<Node, ParseError> {
        match self.peek() {
            Some(b'{') => self.parse_object(key, key_span),
            Some(b'[') => self.parse_array(key, key_span),
            Some(b'"') => {
                let (value, span) = self.parse_string_token()?;
                Ok(scalar(key, key_span, span, Value::String(value)))
            }
            Some(_) => self.parse_literal(key, key_span),
            None => Err(ParseError::new(self.pos, "unexpected end of input")),
        }
    }

    fn parse_object(
        &mut self,
        key: Option<String>,
        key_span: Option<Span>,
    ) -> Result<Node, ParseError> {
        let start = self.pos;
        self.expect(b'{')?;
        let mut children = Vec::new();
        self.skip_ws();
        if self.peek() != Some(b'}') {
            loop {
                self.skip_ws();
                let (member_key, member_key_span) = self.parse_string_token()?;
                self.skip_ws();
                self.expect(b':')?;
                self.skip_ws();
                let child = self.parse_value(Some(member_key), Some(member_key_span))?;
                children.push(child);
                self.skip_ws();
                match self.peek() {
                    Some(b',') => {
                        self.pos += 1;
                    }
                    Some(b'}') => break,
                    _ => return Err(ParseError::new(self.pos, "expected ',' or '}'")),
                }
            }
        }
        self.expect(b'}')?;
        Ok(Node {
            kind: NodeKind::Object,
            key,
            key_span,
            span: Span::new(start, self.pos),
            children,
            value: None,
        })
    }

    fn parse_array(
        &mut self,
        key: Option<String>,
        key_span: Option<Span>,
    ) -> Result<Node, ParseError> {
        let start = self.pos;
        self.expect(b'[')?;
        let mut children = Vec::new();
        self.skip_ws();
        if self.peek() != Some(b']') {
            loop {
                self.skip_ws();
                let child = self.parse_value(None, None)?;
                children.push(child);
                self.skip_ws();
                match self.peek() {
                    Some(b',') => {
                        self.pos += 1;
                    }
                    Some(b']') => break,
                    _ => return Err(ParseError::new(self.pos, "expected ',' or ']'")),
                }
            }
        }
        self.expect(b']')?;
        Ok(Node {
            kind: NodeKind::Array,
            key,
            key_span,
            span: Span::new(start, self.pos),
            children,
            value: None,
        })
    }

    /// Consume a quoted string token; returns the unescaped value and the
    /// span including quotes.
    fn parse_string_token(&mut self) -> Result<(String, Span), ParseError> {
        let start = self.pos;
        self.expect(b'"')?;
        loop {
            match self.peek() {
                Some(b'\\') => self.pos += 2,
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => self.pos += 1,
                None => return Err(ParseError::new(start, "unterminated string")),
            }
        }
        let span = Span::new(start, self.pos);
        let raw = &self.text[span.start..span.end];
        match serde_json::from_str::<String>(raw) {
            Ok(value) => Ok((value, span)),
            Err(_) => Err(ParseError::new(start, "invalid string escape")),
        }
    }

    /// Numbers, true, false, null.
    fn parse_literal(
        &mut self,
        key: Option<String>,
        key_span: Option<Span>,
    ) -> Result<Node, ParseError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'-' || b == b'+' || b == b'.' {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(ParseError::new(start, "unexpected character"));
        }
        let span = Span::new(start, self.pos);
        let raw = &self.text[span.start..span.end];
        match serde_json::from_str::<Value>(raw) {
            Ok(value @ (Value::Number(_) | Value::Bool(_) | Value::Null)) => {
                Ok(scalar(key, key_span, span, value))
            }
            _ => Err(ParseError::new(start, format!("invalid literal '{}'", raw))),
        }
    }
}

fn scalar(key: Option<String>, key_span: Option<Span>, span: Span, value: Value) -> Node {
    Node {
        kind: NodeKind::Scalar,
        key,
        key_span,
        span,
        children: Vec::new(),
        value: Some(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_scalars() {
        let root = parse_json(r#"{"a": 1, "b": true, "c": null, "d": "x", "e": -2.5}"#).unwrap();
        assert_eq!(root.find("/a").unwrap().value(), Some(&json!(1)));
        assert_eq!(root.find("/b").unwrap().value(), Some(&json!(true)));
        assert_eq!(root.find("/c").unwrap().value(), Some(&json!(null)));
        assert_eq!(root.find("/d").unwrap().value(), Some(&json!("x")));
        assert_eq!(root.find("/e").unwrap().value(), Some(&json!(-2.5)));
    }

    #[test]
    fn test_spans_cover_source_tokens() {
        let text = r#"{"info": {"title": "x"}}"#;
        let root = parse_json(text).unwrap();
        assert_eq!(&text[root.span.start..root.span.end], text);

        let info = root.find("/info").unwrap();
        assert_eq!(&text[info.span.start..info.span.end], r#"{"title": "x"}"#);

        let title = root.find("/info/title").unwrap();
        assert_eq!(&text[title.span.start..title.span.end], r#""x""#);
        let key_span = title.key_span.unwrap();
        assert_eq!(&text[key_span.start..key_span.end], r#""title""#);
    }

    #[test]
    fn test_nested_arrays() {
        let text = r#"{"tags": [{"name": "a"}, {"name": "b"}]}"#;
        let root = parse_json(text).unwrap();
        let tags = root.find("/tags").unwrap();
        assert!(tags.is_array());
        assert_eq!(tags.children().len(), 2);
        assert_eq!(root.find("/tags/1/name").unwrap().value(), Some(&json!("b")));
    }

    #[test]
    fn test_string_escapes() {
        let root = parse_json(r#"{"a": "line\nbreak \"q\" A"}"#).unwrap();
        assert_eq!(
            root.find("/a").unwrap().value(),
            Some(&json!("line\nbreak \"q\" A"))
        );
    }

    #[test]
    fn test_empty_containers() {
        let root = parse_json(r#"{"a": {}, "b": []}"#).unwrap();
        assert!(root.find("/a").unwrap().is_object());
        assert!(root.find("/a").unwrap().children().is_empty());
        assert!(root.find("/b").unwrap().is_array());
    }

    #[test]
    fn test_errors_are_located() {
        let err = parse_json(r#"{"a": }"#).unwrap_err();
        assert_eq!(err.offset, 6);

        let err = parse_json(r#"{"a": 1,}"#).unwrap_err();
        assert!(err.message.contains("expected"));

        assert!(parse_json(r#"{"a": 1} trailing"#).is_err());
        assert!(parse_json(r#"{"a": tru}"#).is_err());
        assert!(parse_json("").is_err());
    }
}
