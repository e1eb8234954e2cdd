use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Closed set of fix strategies. Adding a variant forces every dispatch
/// site to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixType {
    #[serde(rename = "insert")]
    Insert,
    #[serde(rename = "replace")]
    Replace,
    #[serde(rename = "regexReplace")]
    RegexReplace,
    #[serde(rename = "renameKey")]
    RenameKey,
    #[serde(rename = "delete")]
    Delete,
}

/// A declared input of a fix template, resolved at application time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixParameter {
    pub name: String,
    /// Name of the resolver function in the parameter source registry.
    #[serde(default)]
    pub source: Option<String>,
    /// Pointer into the fix payload naming the slot to substitute.
    pub path: String,
    /// Catalog-supplied candidate values, used by the fixedValues source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
    /// Index of the originating issue once merged into an assembled fix.
    #[serde(rename = "fixIndex", default, skip_serializing_if = "Option::is_none")]
    pub fix_index: Option<usize>,
}

/// An immutable fix template from the catalog. The payload shape depends on
/// the type: a structural fragment for Insert/Replace, a match/replace pair
/// for RegexReplace, the new key for RenameKey, nothing for Delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fix {
    pub problem: Vec<String>,
    pub title: String,
    #[serde(rename = "type")]
    pub fix_type: FixType,
    #[serde(default)]
    pub fix: Value,
    /// Optional suffix appended to the issue's pointer to reach the target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<FixParameter>>,
}

#[derive(Debug, Deserialize)]
struct Catalog {
    fixes: Vec<Fix>,
}

/// Fix templates keyed by the problem ids they remediate. Built once at
/// startup and passed by reference to every consumer.
#[derive(Debug, Default)]
pub struct FixRegistry {
    fixes: HashMap<String, Fix>,
}

impl FixRegistry {
    pub fn new(fixes: Vec<Fix>) -> FixRegistry {
        let mut map = HashMap::new();
        for fix in fixes {
            for problem_id in &fix.problem {
                map.insert(problem_id.clone(), fix.clone());
            }
        }
        FixRegistry { fixes: map }
    }

    pub fn from_json(json: &str) -> Result<FixRegistry> {
        let catalog: Catalog =
            serde_json::from_str(json).context("malformed quickfix catalog")?;
        Ok(FixRegistry::new(catalog.fixes))
    }

    pub fn find(&self, problem_id: &str) -> Option<&Fix> {
        self.fixes.get(problem_id)
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }
}

/// The built-in catalog shipped with the engine.
pub fn default_registry() -> FixRegistry {
    FixRegistry::from_json(include_str!("quickfixes.json"))
        .expect("built-in quickfix catalog is valid")
}
