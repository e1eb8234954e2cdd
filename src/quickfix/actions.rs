use serde_json::Value;

use crate::ast::OpenApiVersion;
use crate::audit::{Audit, Issue};

use super::fix::{Fix, FixRegistry, FixType};
use super::sources::SourceRegistry;
use super::title::{bulk_title, combined_title, update_title};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Simple,
    Assembled,
    Bulk,
}

/// A candidate fix offered to the user: a fix (possibly synthesized from
/// several templates) plus the issues it applies to.
#[derive(Debug, Clone)]
pub struct CodeAction {
    pub title: String,
    pub kind: ActionKind,
    pub preferred: bool,
    pub fix: Fix,
    pub issues: Vec<Issue>,
}

/// Build the ordered action list for the issues under the current
/// selection: one simple action per fixable issue, one assembled action
/// when two or more co-located inserts can merge, then one bulk action per
/// rule id that recurs elsewhere in the document.
pub fn provide_actions(
    selected: &[&Issue],
    audit: &Audit,
    registry: &FixRegistry,
    sources: &SourceRegistry,
    version: OpenApiVersion,
    bundle: Option<&Value>,
) -> Vec<CodeAction> {
    let mut simple = Vec::new();
    let mut assembled_inputs: Vec<(&Issue, &Fix)> = Vec::new();
    let mut bulk = Vec::new();
    let mut bulk_seen: Vec<&str> = Vec::new();

    for issue in selected {
        let Some(fix) = registry.find(&issue.id) else {
            continue;
        };

        simple.push(CodeAction {
            title: fix.title.clone(),
            kind: ActionKind::Simple,
            preferred: true,
            fix: fix.clone(),
            issues: vec![(*issue).clone()],
        });

        if can_assemble(fix) {
            assembled_inputs.push((issue, fix));
        }

        if !bulk_seen.contains(&issue.id.as_str()) {
            bulk_seen.push(&issue.id);
            if let Some(action) = bulk_action(issue, fix, audit, sources, version, bundle) {
                bulk.push(action);
            }
        }
    }

    let mut actions = simple;
    if assembled_inputs.len() >= 2 {
        actions.push(assemble(&assembled_inputs));
    }
    actions.extend(bulk);
    actions
}

/// Only unconditional inserts merge: a pointer suffix or an array payload
/// would make the unioned payload ambiguous.
fn can_assemble(fix: &Fix) -> bool {
    fix.fix_type == FixType::Insert && fix.pointer.is_none() && !fix.fix.is_array()
}

/// Union the payloads key-wise, concatenate the parameter lists with each
/// parameter tagged with its originating issue, and merge the titles.
pub fn assemble(inputs: &[(&Issue, &Fix)]) -> CodeAction {
    let mut payload = serde_json::Map::new();
    let mut parameters = Vec::new();
    let mut problem = Vec::new();
    let mut titles = Vec::new();

    for (index, (_, fix)) in inputs.iter().enumerate() {
        if let Some(entries) = fix.fix.as_object() {
            for (key, value) in entries {
                payload.insert(key.clone(), value.clone());
            }
        }
        if let Some(fix_parameters) = &fix.parameters {
            for parameter in fix_parameters {
                let mut parameter = parameter.clone();
                parameter.fix_index = Some(index);
                parameters.push(parameter);
            }
        }
        problem.extend(fix.problem.iter().cloned());
        update_title(&mut titles, &fix.title);
    }

    let title = combined_title(&titles);
    CodeAction {
        title: title.clone(),
        kind: ActionKind::Assembled,
        preferred: true,
        fix: Fix {
            problem,
            title,
            fix_type: FixType::Insert,
            fix: Value::Object(payload),
            pointer: None,
            parameters: if parameters.is_empty() {
                None
            } else {
                Some(parameters)
            },
        },
        issues: inputs.iter().map(|(issue, _)| (*issue).clone()).collect(),
    }
}

/// A bulk action covers every issue in the document with the same rule id,
/// provided each instance can resolve all of the fix's parameters. Two or
/// more eligible instances are required.
fn bulk_action(
    current: &Issue,
    fix: &Fix,
    audit: &Audit,
    sources: &SourceRegistry,
    version: OpenApiVersion,
    bundle: Option<&Value>,
) -> Option<CodeAction> {
    let eligible: Vec<Issue> = audit
        .issues_for(&audit.document_uri)
        .iter()
        .filter(|issue| issue.id == current.id)
        .filter(|issue| parameters_resolvable(issue, fix, sources, version, bundle))
        .cloned()
        .collect();
    if eligible.len() < 2 {
        return None;
    }
    Some(CodeAction {
        title: bulk_title(&fix.title, eligible.len()),
        kind: ActionKind::Bulk,
        preferred: false,
        fix: fix.clone(),
        issues: eligible,
    })
}

fn parameters_resolvable(
    issue: &Issue,
    fix: &Fix,
    sources: &SourceRegistry,
    version: OpenApiVersion,
    bundle: Option<&Value>,
) -> bool {
    let Some(parameters) = &fix.parameters else {
        return true;
    };
    parameters
        .iter()
        .all(|parameter| !sources.resolve(issue, fix, parameter, version, bundle).is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Severity;
    use crate::quickfix::fix::FixParameter;
    use serde_json::json;

    fn make_issue(id: &str, pointer: &str) -> Issue {
        Issue {
            id: id.to_string(),
            pointer: pointer.to_string(),
            description: String::new(),
            severity: Severity::Medium,
            range: None,
        }
    }

    fn make_insert_fix(id: &str, title: &str, payload: Value) -> Fix {
        Fix {
            problem: vec![id.to_string()],
            title: title.to_string(),
            fix_type: FixType::Insert,
            fix: payload,
            pointer: None,
            parameters: None,
        }
    }

    fn make_audit(issues: Vec<Issue>) -> Audit {
        Audit::new("openapi.json", issues)
    }

    fn setup() -> (FixRegistry, SourceRegistry) {
        let fixes = vec![
            make_insert_fix(
                "missing-contact",
                "Add missing contact property",
                json!({"contact": {"name": "n"}}),
            ),
            make_insert_fix(
                "missing-license",
                "Add missing license property",
                json!({"license": {"name": "n"}}),
            ),
        ];
        (FixRegistry::new(fixes), SourceRegistry::default())
    }

    #[test]
    fn test_simple_action_per_fixable_issue() {
        let (registry, sources) = setup();
        let contact = make_issue("missing-contact", "/info");
        let unknown = make_issue("no-template", "/info");
        let audit = make_audit(vec![contact.clone()]);

        let actions = provide_actions(
            &[&contact, &unknown],
            &audit,
            &registry,
            &sources,
            OpenApiVersion::V3,
            None,
        );
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, ActionKind::Simple);
        assert_eq!(actions[0].title, "Add missing contact property");
        assert!(actions[0].preferred);
    }

    #[test]
    fn test_assembled_action_merges_colocated_inserts() {
        let (registry, sources) = setup();
        let contact = make_issue("missing-contact", "/info");
        let license = make_issue("missing-license", "/info");
        let audit = make_audit(vec![contact.clone(), license.clone()]);

        let actions = provide_actions(
            &[&contact, &license],
            &audit,
            &registry,
            &sources,
            OpenApiVersion::V3,
            None,
        );
        // Two simple actions then one assembled, no bulk (one instance each).
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[0].kind, ActionKind::Simple);
        assert_eq!(actions[1].kind, ActionKind::Simple);
        let assembled = &actions[2];
        assert_eq!(assembled.kind, ActionKind::Assembled);
        assert!(assembled.preferred);
        assert_eq!(assembled.title, "Add missing contact, license properties");
        assert_eq!(
            assembled.fix.fix,
            json!({"contact": {"name": "n"}, "license": {"name": "n"}})
        );
        assert_eq!(assembled.issues.len(), 2);
    }

    #[test]
    fn test_assembled_requires_two_contributors() {
        let (registry, sources) = setup();
        let contact = make_issue("missing-contact", "/info");
        let audit = make_audit(vec![contact.clone()]);

        let actions = provide_actions(
            &[&contact],
            &audit,
            &registry,
            &sources,
            OpenApiVersion::V3,
            None,
        );
        assert!(actions.iter().all(|action| action.kind != ActionKind::Assembled));
    }

    #[test]
    fn test_assembled_tags_parameters_with_origin_index() {
        let mut contact_fix = make_insert_fix(
            "missing-contact",
            "Add missing contact property",
            json!({"contact": {"name": "n"}}),
        );
        contact_fix.parameters = Some(vec![FixParameter {
            name: "name".to_string(),
            source: None,
            path: "/contact/name".to_string(),
            values: Some(vec![json!("x")]),
            fix_index: None,
        }]);
        let license_fix = make_insert_fix(
            "missing-license",
            "Add missing license property",
            json!({"license": {"name": "n"}}),
        );
        let registry = FixRegistry::new(vec![contact_fix, license_fix]);
        let sources = SourceRegistry::default();

        let contact = make_issue("missing-contact", "/info");
        let license = make_issue("missing-license", "/info");
        let audit = make_audit(vec![contact.clone(), license.clone()]);
        let actions = provide_actions(
            &[&contact, &license],
            &audit,
            &registry,
            &sources,
            OpenApiVersion::V3,
            None,
        );
        let assembled = actions
            .iter()
            .find(|action| action.kind == ActionKind::Assembled)
            .unwrap();
        let parameters = assembled.fix.parameters.as_ref().unwrap();
        assert_eq!(parameters.len(), 1);
        assert_eq!(parameters[0].fix_index, Some(0));
    }

    #[test]
    fn test_bulk_action_spans_whole_document() {
        let (registry, sources) = setup();
        let here = make_issue("missing-contact", "/paths/~1a/get");
        let there = make_issue("missing-contact", "/paths/~1b/get");
        let audit = make_audit(vec![here.clone(), there]);

        let actions = provide_actions(
            &[&here],
            &audit,
            &registry,
            &sources,
            OpenApiVersion::V3,
            None,
        );
        assert_eq!(actions.len(), 2);
        let bulk = &actions[1];
        assert_eq!(bulk.kind, ActionKind::Bulk);
        assert!(!bulk.preferred);
        assert_eq!(
            bulk.title,
            "Group fix: Add missing contact property in 2 locations"
        );
        assert_eq!(bulk.issues.len(), 2);
    }

    #[test]
    fn test_bulk_excludes_unresolvable_instances() {
        let mut fix = make_insert_fix(
            "missing-default",
            "Add default response",
            json!({"default": {"description": "d"}}),
        );
        fix.parameters = Some(vec![FixParameter {
            name: "code".to_string(),
            source: Some("responseCodes".to_string()),
            path: "/default/description".to_string(),
            values: None,
            fix_index: None,
        }]);
        let registry = FixRegistry::new(vec![fix]);
        let sources = SourceRegistry::default();

        // Only the first operation has a responses map in the bundle.
        let bundle = json!({
            "paths": {
                "/a": {"get": {"responses": {"200": {}}}},
                "/b": {"get": {}}
            }
        });
        let resolvable = make_issue("missing-default", "/paths/~1a/get");
        let unresolvable = make_issue("missing-default", "/paths/~1b/get");
        let audit = make_audit(vec![resolvable.clone(), unresolvable]);

        let actions = provide_actions(
            &[&resolvable],
            &audit,
            &registry,
            &sources,
            OpenApiVersion::V3,
            Some(&bundle),
        );
        assert!(actions.iter().all(|action| action.kind != ActionKind::Bulk));

        // With both operations resolvable the bulk action appears.
        let bundle = json!({
            "paths": {
                "/a": {"get": {"responses": {"200": {}}}},
                "/b": {"get": {"responses": {"404": {}}}}
            }
        });
        let actions = provide_actions(
            &[&resolvable],
            &audit,
            &registry,
            &sources,
            OpenApiVersion::V3,
            Some(&bundle),
        );
        let bulk = actions
            .iter()
            .find(|action| action.kind == ActionKind::Bulk)
            .unwrap();
        assert_eq!(bulk.issues.len(), 2);
    }

    #[test]
    fn test_bulk_requires_every_parameter_to_resolve() {
        let mut fix = make_insert_fix(
            "missing-default",
            "Add default response",
            json!({"default": {"description": "d"}}),
        );
        // One parameter resolves everywhere, the other only where the
        // operation declares responses.
        fix.parameters = Some(vec![
            FixParameter {
                name: "description".to_string(),
                source: None,
                path: "/default/description".to_string(),
                values: Some(vec![json!("Unexpected error")]),
                fix_index: None,
            },
            FixParameter {
                name: "code".to_string(),
                source: Some("responseCodes".to_string()),
                path: "/default/description".to_string(),
                values: None,
                fix_index: None,
            },
        ]);
        let registry = FixRegistry::new(vec![fix]);
        let sources = SourceRegistry::default();

        let bundle = json!({
            "paths": {
                "/a": {"get": {"responses": {"200": {}}}},
                "/b": {"get": {}},
                "/c": {"get": {"responses": {"404": {}}}}
            }
        });
        let full = make_issue("missing-default", "/paths/~1a/get");
        let partial = make_issue("missing-default", "/paths/~1b/get");
        let other = make_issue("missing-default", "/paths/~1c/get");
        let audit = make_audit(vec![full.clone(), partial.clone(), other]);

        let actions = provide_actions(
            &[&full],
            &audit,
            &registry,
            &sources,
            OpenApiVersion::V3,
            Some(&bundle),
        );
        let bulk = actions
            .iter()
            .find(|action| action.kind == ActionKind::Bulk)
            .unwrap();
        assert_eq!(bulk.issues.len(), 2);
        assert!(bulk
            .issues
            .iter()
            .all(|issue| issue.pointer != "/paths/~1b/get"));
    }

    #[test]
    fn test_action_ordering_simple_then_assembled_then_bulk() {
        let (registry, sources) = setup();
        let contact = make_issue("missing-contact", "/info");
        let license = make_issue("missing-license", "/info");
        let elsewhere = make_issue("missing-contact", "/components");
        let audit = make_audit(vec![contact.clone(), license.clone(), elsewhere]);

        let actions = provide_actions(
            &[&contact, &license],
            &audit,
            &registry,
            &sources,
            OpenApiVersion::V3,
            None,
        );
        let kinds: Vec<ActionKind> = actions.iter().map(|action| action.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ActionKind::Simple,
                ActionKind::Simple,
                ActionKind::Assembled,
                ActionKind::Bulk
            ]
        );
    }
}
