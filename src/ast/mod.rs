pub mod json;
pub mod object;
pub mod yaml;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Serialization dialect of a document, selected once per document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dialect {
    Json,
    Yaml,
}

impl Dialect {
    pub fn from_path(path: &Path) -> Option<Dialect> {
        match path.extension()?.to_str()? {
            "json" => Some(Dialect::Json),
            "yaml" | "yml" => Some(Dialect::Yaml),
            _ => None,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Json => write!(f, "json"),
            Dialect::Yaml => write!(f, "yaml"),
        }
    }
}

/// Byte range in the source text, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Span {
        Span { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Object,
    Array,
    Scalar,
}

/// One node of a parsed document. Members of an object carry their key and
/// the span of the key token as written (including quotes, if any).
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub key: Option<String>,
    pub key_span: Option<Span>,
    pub span: Span,
    pub children: Vec<Node>,
    pub value: Option<Value>,
}

impl Node {
    pub fn is_object(&self) -> bool {
        self.kind == NodeKind::Object
    }

    pub fn is_array(&self) -> bool {
        self.kind == NodeKind::Array
    }

    pub fn is_scalar(&self) -> bool {
        self.kind == NodeKind::Scalar
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Scalar value; None for objects and arrays.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Resolve a JSON-pointer-style path against this node. The empty
    /// pointer addresses the node itself.
    pub fn find(&self, pointer: &str) -> Option<&Node> {
        let mut current = self;
        for token in pointer_tokens(pointer) {
            current = match current.kind {
                NodeKind::Object => current
                    .children
                    .iter()
                    .find(|child| child.key() == Some(token.as_str()))?,
                NodeKind::Array => {
                    let index: usize = token.parse().ok()?;
                    current.children.get(index)?
                }
                NodeKind::Scalar => return None,
            };
        }
        Some(current)
    }
}

/// Split a JSON pointer into unescaped reference tokens.
fn pointer_tokens(pointer: &str) -> Vec<String> {
    if pointer.is_empty() {
        return Vec::new();
    }
    pointer
        .split('/')
        .skip(1)
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
        .collect()
}

/// A parse failure located in the source text. Reported to the host as a
/// diagnostic; this engine never sees a partially parsed document.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message} at offset {offset}")]
pub struct ParseError {
    pub offset: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(offset: usize, message: impl Into<String>) -> ParseError {
        ParseError {
            offset,
            message: message.into(),
        }
    }
}

pub fn parse(text: &str, dialect: Dialect) -> Result<Node, ParseError> {
    match dialect {
        Dialect::Json => json::parse_json(text),
        Dialect::Yaml => yaml::parse_yaml(text),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpenApiVersion {
    Unknown,
    V2,
    V3,
}

/// Version markers live at `/swagger` ("2.0") or `/openapi` (3.0.x).
pub fn openapi_version(root: &Node) -> OpenApiVersion {
    if let Some(value) = root.find("/swagger").and_then(|node| node.value()) {
        if value == "2.0" {
            return OpenApiVersion::V2;
        }
    }
    if let Some(Value::String(version)) = root.find("/openapi").and_then(|node| node.value()) {
        let v3 = regex::Regex::new(r"^3\.0\.\d(-.+)?$").unwrap();
        if v3.is_match(version) {
            return OpenApiVersion::V3;
        }
    }
    OpenApiVersion::Unknown
}

/// The node whose line stands in for the whole document when an issue
/// carries an empty pointer.
pub fn version_marker<'a>(root: &'a Node) -> Option<&'a Node> {
    root.find("/openapi").or_else(|| root.find("/swagger"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_tokens_unescape() {
        assert_eq!(pointer_tokens(""), Vec::<String>::new());
        assert_eq!(pointer_tokens("/a/b"), vec!["a", "b"]);
        assert_eq!(pointer_tokens("/paths/~1pets/get"), vec!["paths", "/pets", "get"]);
        assert_eq!(pointer_tokens("/a~0b"), vec!["a~b"]);
    }

    #[test]
    fn test_find_by_pointer() {
        let root = parse(r#"{"info":{"title":"x"},"tags":["a","b"]}"#, Dialect::Json).unwrap();
        assert_eq!(
            root.find("/info/title").unwrap().value(),
            Some(&Value::String("x".to_string()))
        );
        assert_eq!(
            root.find("/tags/1").unwrap().value(),
            Some(&Value::String("b".to_string()))
        );
        assert!(root.find("/info/missing").is_none());
        assert!(root.find("/tags/7").is_none());
        assert!(root.find("/info/title/deeper").is_none());
        assert!(std::ptr::eq(root.find("").unwrap(), &root));
    }

    #[test]
    fn test_openapi_version_detection() {
        let v3 = parse(r#"{"openapi":"3.0.2"}"#, Dialect::Json).unwrap();
        assert_eq!(openapi_version(&v3), OpenApiVersion::V3);

        let v3_rc = parse(r#"{"openapi":"3.0.0-rc2"}"#, Dialect::Json).unwrap();
        assert_eq!(openapi_version(&v3_rc), OpenApiVersion::V3);

        let v2 = parse(r#"{"swagger":"2.0"}"#, Dialect::Json).unwrap();
        assert_eq!(openapi_version(&v2), OpenApiVersion::V2);

        let unknown = parse(r#"{"openapi":"3.1.0"}"#, Dialect::Json).unwrap();
        assert_eq!(openapi_version(&unknown), OpenApiVersion::Unknown);

        let none = parse(r#"{"info":{}}"#, Dialect::Json).unwrap();
        assert_eq!(openapi_version(&none), OpenApiVersion::Unknown);
    }

    #[test]
    fn test_dialect_from_path() {
        assert_eq!(Dialect::from_path(Path::new("api.json")), Some(Dialect::Json));
        assert_eq!(Dialect::from_path(Path::new("api.yaml")), Some(Dialect::Yaml));
        assert_eq!(Dialect::from_path(Path::new("api.yml")), Some(Dialect::Yaml));
        assert_eq!(Dialect::from_path(Path::new("api.txt")), None);
    }
}
