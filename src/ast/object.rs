use serde_json::{Map, Value};

use super::Node;

/// Depth-first conversion of a parsed document into a plain object, the
/// representation parameter sources and bundles work with.
pub fn ast_to_object(node: &Node) -> Value {
    if node.is_object() {
        let mut result = Map::new();
        for child in node.children() {
            let key = child.key().unwrap_or_default().to_string();
            result.insert(key, ast_to_object(child));
        }
        Value::Object(result)
    } else if node.is_array() {
        Value::Array(node.children().iter().map(ast_to_object).collect())
    } else {
        node.value().cloned().unwrap_or(Value::Null)
    }
}
