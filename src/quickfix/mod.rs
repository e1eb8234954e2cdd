pub mod actions;
pub mod apply;
pub mod edit;
pub mod error;
pub mod executors;
pub mod fix;
pub mod reconcile;
pub mod render;
pub mod sources;
pub mod splice;
pub mod title;

pub use fix::{default_registry, Fix};

use crate::ast::{Dialect, Node};

/// Inputs of one executor invocation: one issue-pointer group, one
/// specialized fix. Built per group, used once, discarded. Executors read
/// it and return their output; they never write back into it.
pub struct FixContext<'a> {
    /// Cloned from the template and parameter-specialized for this group.
    pub fix: Fix,
    /// Issue pointer with the fix's pointer suffix appended.
    pub pointer: String,
    /// More than one pointer group in this invocation.
    pub bulk: bool,
    pub root: &'a Node,
    pub target: &'a Node,
    pub text: &'a str,
    pub dialect: Dialect,
}
