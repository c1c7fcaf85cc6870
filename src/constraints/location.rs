//! Location constraints with rules.

use super::BuildContext;
use super::common::{
    Options, ROLES, invalid_value, normalize_role, validate_option_names, validate_score,
};
use crate::error::{Error, Result};
use crate::kind::{ElementKind, kind_of};
use crate::locator;
use crate::reports::{ReportItem, ReportList, ReportMessage};
use crate::rule::{RuleExpr, export_rule, parse_rule};
use cibtree::{Document, NodeId};

const CONSTRAINT_OPTIONS: [&str; 2] = ["id", "resource-discovery"];
const RULE_OPTIONS: [&str; 4] = ["id", "role", "score", "score-attribute"];
const RESOURCE_DISCOVERY: [&str; 3] = ["always", "never", "exclusive"];

/// What a location constraint applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationTarget {
    /// A single resource, by id
    Resource(String),
    /// Every resource whose id matches a regular expression
    Pattern(String),
}

/// Validated rule options and the parsed rule.
struct PreparedRule {
    expr: RuleExpr,
    attributes: Vec<(&'static str, String)>,
}

fn prepare_rule(rule_text: &str, options: &Options, reports: &mut ReportList) -> Option<PreparedRule> {
    reports.append(validate_option_names(options, &RULE_OPTIONS, "rule"));

    let mut attributes = Vec::new();
    match (options.get("score"), options.get("score-attribute")) {
        (Some(_), Some(_)) => {
            reports.push(ReportItem::error(ReportMessage::MutuallyExclusiveOptions {
                option_names: vec!["score".to_string(), "score-attribute".to_string()],
                option_type: "rule".to_string(),
            }));
        }
        (Some(score), None) => {
            if let Some(item) = validate_score(score) {
                reports.push(item);
            }
            attributes.push(("score", score.clone()));
        }
        (None, Some(attribute)) => attributes.push(("score-attribute", attribute.clone())),
        (None, None) => attributes.push(("score", "INFINITY".to_string())),
    }
    if let Some(value) = options.get("role") {
        match normalize_role(value) {
            Some(role) => attributes.push(("role", role.to_string())),
            None => reports.push(invalid_value("role", value, &ROLES)),
        }
    }

    match parse_rule(rule_text) {
        Ok(expr) => Some(PreparedRule { expr, attributes }),
        Err(err) => {
            let reason = match err {
                Error::RuleParse { message, .. } => message,
                other => other.to_string(),
            };
            reports.push(ReportItem::error(ReportMessage::RuleExpressionParseError {
                rule_string: rule_text.to_string(),
                reason,
            }));
            None
        }
    }
}

fn append_rule(
    doc: &mut Document,
    ctx: &mut BuildContext,
    constraint: NodeId,
    constraint_id: &str,
    options: &Options,
    rule: &PreparedRule,
) -> NodeId {
    let rule_id = ctx.id_or_allocate(doc, options, &format!("{constraint_id}-rule"));
    let node = export_rule(doc, constraint, &rule_id, &rule.expr, &mut ctx.ids);
    for (name, value) in &rule.attributes {
        doc.set_attr(node, name, value);
    }
    node
}

/// Create an `rsc_location` for `target` holding one rule.
///
/// `constraint_options` accepts `id` and `resource-discovery`;
/// `rule_options` accepts `id`, `role`, `score` and `score-attribute`.
pub fn create_with_rule(
    doc: &mut Document,
    ctx: &mut BuildContext,
    target: &LocationTarget,
    rule_text: &str,
    constraint_options: &Options,
    rule_options: &Options,
) -> Result<Option<NodeId>> {
    let section = locator::constraints_section(doc)?;
    let mut reports = validate_option_names(constraint_options, &CONSTRAINT_OPTIONS, "constraint");

    let discovery = constraint_options.get("resource-discovery").and_then(|value| {
        let found = RESOURCE_DISCOVERY.iter().copied().find(|known| *known == value.as_str());
        if found.is_none() {
            reports.push(invalid_value("resource-discovery", value, &RESOURCE_DISCOVERY));
        }
        found
    });
    if let LocationTarget::Resource(rsc) = target {
        match locator::find_unique_by_id(doc, rsc)? {
            Some(node) if kind_of(doc, node).is_resource() => {}
            Some(node) => reports.push(ReportItem::error(ReportMessage::IdBelongsToUnexpectedType {
                id: rsc.clone(),
                expected_types: vec!["resource".to_string()],
                current_type: doc.tag(node).to_string(),
            })),
            None => reports.push(ReportItem::error(ReportMessage::IdNotFound {
                id: rsc.clone(),
                expected_types: vec!["resource".to_string()],
            })),
        }
    }
    let rule = prepare_rule(rule_text, rule_options, &mut reports);
    reports.append(ctx.book_requested_id(doc, constraint_options));
    reports.append(ctx.book_requested_id(doc, rule_options));
    let failed = ctx.absorb(reports);
    let Some(rule) = rule.filter(|_| !failed) else {
        return Ok(None);
    };

    let (target_attr, target_value, proposed) = match target {
        LocationTarget::Resource(rsc) => ("rsc", rsc, format!("location-{rsc}")),
        LocationTarget::Pattern(pattern) => ("rsc-pattern", pattern, format!("location-{pattern}")),
    };
    let id = ctx.id_or_allocate(doc, constraint_options, &proposed);
    let constraint = doc.append_element_with_attrs(
        section,
        "rsc_location",
        &[("id", id.as_str()), (target_attr, target_value.as_str())],
    );
    if let Some(discovery) = discovery {
        doc.set_attr(constraint, "resource-discovery", discovery);
    }
    append_rule(doc, ctx, constraint, &id, rule_options, &rule);
    log::debug!("Created location '{id}' with a rule");
    Ok(Some(constraint))
}

/// Add a rule to an existing `rsc_location`.
///
/// A constraint placing a resource on a node loses its `node` and `score`
/// attributes, which cannot be combined with rules. Returns the constraint.
pub fn add_rule(
    doc: &mut Document,
    ctx: &mut BuildContext,
    constraint_id: &str,
    rule_text: &str,
    rule_options: &Options,
) -> Result<Option<NodeId>> {
    let mut reports = ReportList::new();
    let constraint = match locator::find_unique_by_id(doc, constraint_id)? {
        Some(node) if kind_of(doc, node) == ElementKind::Location => Some(node),
        Some(node) => {
            reports.push(ReportItem::error(ReportMessage::IdBelongsToUnexpectedType {
                id: constraint_id.to_string(),
                expected_types: vec!["location constraint".to_string()],
                current_type: doc.tag(node).to_string(),
            }));
            None
        }
        None => {
            reports.push(ReportItem::error(ReportMessage::IdNotFound {
                id: constraint_id.to_string(),
                expected_types: vec!["location constraint".to_string()],
            }));
            None
        }
    };
    let rule = prepare_rule(rule_text, rule_options, &mut reports);
    reports.append(ctx.book_requested_id(doc, rule_options));
    let failed = ctx.absorb(reports);
    let (Some(constraint), Some(rule), false) = (constraint, rule, failed) else {
        return Ok(None);
    };

    for attr in ["node", "score"] {
        if doc.remove_attr(constraint, attr).is_some() {
            log::debug!("Removed '{attr}' from location '{constraint_id}' in favor of a rule");
        }
    }
    append_rule(doc, ctx, constraint, constraint_id, rule_options, &rule);
    Ok(Some(constraint))
}
