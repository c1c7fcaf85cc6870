//! Canonical text form of `rule` elements.

use crate::kind::{ElementKind, kind_of};
use cibtree::{Document, NodeId};

/// A value as a rule token. Values are literal: only the separators
/// between tokens are canonical, never the value's own whitespace.
fn token(value: &str) -> String {
    let bare = !value.is_empty()
        && !value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '(' | ')'));
    if bare {
        value.to_string()
    } else if !value.contains('"') {
        format!("\"{value}\"")
    } else if !value.contains('\'') {
        format!("'{value}'")
    } else {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

fn attr(doc: &Document, node: NodeId, name: &str) -> String {
    token(doc.attr(node, name).unwrap_or_default())
}

/// Render a `rule` element as rule text.
///
/// Two rules that differ only in attribute order, the order of `date_spec`
/// attributes or the spelling of keywords render identically. Values are
/// rendered verbatim, quoted when needed. Operand order is kept.
pub fn rule_to_str(doc: &Document, rule: NodeId) -> String {
    let operator = doc
        .attr(rule, "boolean-op")
        .map_or_else(|| "and".to_string(), |op| op.trim().to_lowercase());
    doc.children(rule)
        .iter()
        .filter_map(|&child| operand_to_str(doc, child))
        .collect::<Vec<_>>()
        .join(&format!(" {operator} "))
}

fn operand_to_str(doc: &Document, node: NodeId) -> Option<String> {
    match doc.tag(node) {
        "expression" => Some(expression_to_str(doc, node)),
        "date_expression" => Some(date_expression_to_str(doc, node)),
        _ if kind_of(doc, node) == ElementKind::Rule => {
            Some(format!("({})", rule_to_str(doc, node)))
        }
        _ => None,
    }
}

fn expression_to_str(doc: &Document, node: NodeId) -> String {
    let attribute = attr(doc, node, "attribute");
    let operation = doc.attr(node, "operation").unwrap_or_default().trim();
    if matches!(operation, "defined" | "not_defined") {
        return format!("{operation} {attribute}");
    }
    let mut parts = vec![attribute, operation.to_string()];
    if let Some(value_type) = doc.attr(node, "type") {
        parts.push(value_type.trim().to_lowercase());
    }
    parts.push(attr(doc, node, "value"));
    parts.join(" ")
}

fn date_expression_to_str(doc: &Document, node: NodeId) -> String {
    match doc.attr(node, "operation").unwrap_or_default().trim() {
        "gt" => format!("date gt {}", attr(doc, node, "start")),
        "lt" => format!("date lt {}", attr(doc, node, "end")),
        "in_range" => format!(
            "date in_range {} to {}",
            attr(doc, node, "start"),
            attr(doc, node, "end")
        ),
        "date_spec" => {
            let mut parts: Vec<String> = doc
                .first_child_by_tag(node, "date_spec")
                .map(|spec| {
                    doc.attrs(spec)
                        .iter()
                        .filter(|(name, _)| name != "id")
                        .map(|(name, value)| format!("{name}={}", token(value)))
                        .collect()
                })
                .unwrap_or_default();
            parts.sort();
            format!("date-spec {}", parts.join(" "))
        }
        other => format!("date {other}"),
    }
}
