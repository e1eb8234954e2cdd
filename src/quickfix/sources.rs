use serde_json::Value;
use std::collections::HashMap;

use crate::ast::OpenApiVersion;
use crate::audit::Issue;

use super::fix::{Fix, FixParameter};

/// A resolver deriving concrete values for a declared fix parameter. An
/// empty result means the parameter is unresolvable for that issue.
pub type ParameterSource =
    fn(&Issue, &Fix, &FixParameter, OpenApiVersion, Option<&Value>) -> Vec<Value>;

/// Named parameter resolvers, constructed at startup alongside the fix
/// catalog.
pub struct SourceRegistry {
    sources: HashMap<String, ParameterSource>,
}

impl SourceRegistry {
    pub fn new() -> SourceRegistry {
        SourceRegistry {
            sources: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, source: ParameterSource) {
        self.sources.insert(name.into(), source);
    }

    /// Resolve a parameter; unknown sources resolve to nothing, which
    /// callers treat as "not fixable here" rather than an error.
    pub fn resolve(
        &self,
        issue: &Issue,
        fix: &Fix,
        parameter: &FixParameter,
        version: OpenApiVersion,
        bundle: Option<&Value>,
    ) -> Vec<Value> {
        let Some(name) = parameter.source.as_deref() else {
            return fixed_values(issue, fix, parameter, version, bundle);
        };
        match self.sources.get(name) {
            Some(source) => source(issue, fix, parameter, version, bundle),
            None => Vec::new(),
        }
    }
}

impl Default for SourceRegistry {
    fn default() -> SourceRegistry {
        let mut registry = SourceRegistry::new();
        registry.register("fixedValues", fixed_values);
        registry.register("securitySchemes", security_schemes);
        registry.register("responseCodes", response_codes);
        registry
    }
}

/// Values declared on the parameter itself; also the fallback when a
/// parameter names no source.
fn fixed_values(
    _issue: &Issue,
    _fix: &Fix,
    parameter: &FixParameter,
    _version: OpenApiVersion,
    _bundle: Option<&Value>,
) -> Vec<Value> {
    parameter.values.clone().unwrap_or_default()
}

/// Names of the security schemes declared in the resolved bundle.
fn security_schemes(
    _issue: &Issue,
    _fix: &Fix,
    _parameter: &FixParameter,
    version: OpenApiVersion,
    bundle: Option<&Value>,
) -> Vec<Value> {
    let pointer = match version {
        OpenApiVersion::V2 => "/securityDefinitions",
        _ => "/components/securitySchemes",
    };
    let Some(schemes) = bundle.and_then(|bundle| bundle.pointer(pointer)) else {
        return Vec::new();
    };
    match schemes.as_object() {
        Some(map) => map.keys().cloned().map(Value::String).collect(),
        None => Vec::new(),
    }
}

/// Response codes already declared under the issue's operation.
fn response_codes(
    issue: &Issue,
    _fix: &Fix,
    _parameter: &FixParameter,
    _version: OpenApiVersion,
    bundle: Option<&Value>,
) -> Vec<Value> {
    let pointer = format!("{}/responses", issue.pointer);
    let Some(responses) = bundle.and_then(|bundle| bundle.pointer(&pointer)) else {
        return Vec::new();
    };
    match responses.as_object() {
        Some(map) => map.keys().cloned().map(Value::String).collect(),
        None => Vec::new(),
    }
}
