//! Writing a parsed rule into the document.

use super::{BoolOperator, RuleExpr};
use crate::ids::IdProvider;
use cibtree::{Document, NodeId};

/// Append a `rule` element with id `rule_id` for `expr` under `parent`.
///
/// `rule_id` must be free or booked by the caller. Ids of the inner
/// elements are allocated from it. Attributes such as `score` or `role`
/// are left to the caller.
pub fn export_rule(
    doc: &mut Document,
    parent: NodeId,
    rule_id: &str,
    expr: &RuleExpr,
    ids: &mut IdProvider,
) -> NodeId {
    let rule = doc.append_element_with_attrs(parent, "rule", &[("id", rule_id)]);
    match expr {
        RuleExpr::Bool { operator, operands } => {
            doc.set_attr(rule, "boolean-op", operator.as_str());
            for operand in operands {
                export_operand(doc, rule, rule_id, operand, ids);
            }
        }
        single => {
            doc.set_attr(rule, "boolean-op", BoolOperator::And.as_str());
            export_operand(doc, rule, rule_id, single, ids);
        }
    }
    rule
}

fn export_operand(
    doc: &mut Document,
    rule: NodeId,
    rule_id: &str,
    expr: &RuleExpr,
    ids: &mut IdProvider,
) {
    let suffix = if matches!(expr, RuleExpr::Bool { .. }) { "rule" } else { "expr" };
    let expr_id = ids.allocate(doc, &format!("{rule_id}-{suffix}"));
    match expr {
        RuleExpr::Bool { .. } => {
            export_rule(doc, rule, &expr_id, expr, ids);
        }
        RuleExpr::Defined { attribute, defined } => {
            let operation = if *defined { "defined" } else { "not_defined" };
            doc.append_element_with_attrs(
                rule,
                "expression",
                &[("id", expr_id.as_str()), ("attribute", attribute.as_str()), ("operation", operation)],
            );
        }
        RuleExpr::Compare {
            attribute,
            operator,
            value_type,
            value,
        } => {
            let node = doc.append_element_with_attrs(
                rule,
                "expression",
                &[
                    ("id", expr_id.as_str()),
                    ("attribute", attribute.as_str()),
                    ("operation", operator.as_str()),
                ],
            );
            if let Some(value_type) = value_type {
                doc.set_attr(node, "type", value_type.as_str());
            }
            doc.set_attr(node, "value", value);
        }
        RuleExpr::DateAfter(date) => {
            doc.append_element_with_attrs(
                rule,
                "date_expression",
                &[("id", expr_id.as_str()), ("operation", "gt"), ("start", date.as_str())],
            );
        }
        RuleExpr::DateBefore(date) => {
            doc.append_element_with_attrs(
                rule,
                "date_expression",
                &[("id", expr_id.as_str()), ("operation", "lt"), ("end", date.as_str())],
            );
        }
        RuleExpr::DateInRange { start, end } => {
            doc.append_element_with_attrs(
                rule,
                "date_expression",
                &[
                    ("id", expr_id.as_str()),
                    ("operation", "in_range"),
                    ("start", start.as_str()),
                    ("end", end.as_str()),
                ],
            );
        }
        RuleExpr::DateSpec(parts) => {
            let node = doc.append_element_with_attrs(
                rule,
                "date_expression",
                &[("id", expr_id.as_str()), ("operation", "date_spec")],
            );
            let spec_id = ids.allocate(doc, &format!("{expr_id}-datespec"));
            let spec = doc.append_element_with_attrs(node, "date_spec", &[("id", spec_id.as_str())]);
            for (key, value) in parts {
                doc.set_attr(spec, key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::parse_rule;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_export_ids_and_attributes() {
        let mut doc = Document::parse(r#"<rsc_location id="L" rsc="A"/>"#).unwrap();
        let location = doc.root();
        let expr = parse_rule("defined pingd and date-spec weekdays=1-5 and (a eq 1 or b eq 2)")
            .unwrap();
        let mut ids = IdProvider::new();
        export_rule(&mut doc, location, "L-rule", &expr, &mut ids);

        assert_eq!(
            doc.to_xml_string().unwrap(),
            r#"<rsc_location id="L" rsc="A">
  <rule id="L-rule" boolean-op="and">
    <expression id="L-rule-expr" attribute="pingd" operation="defined"/>
    <date_expression id="L-rule-expr-1" operation="date_spec">
      <date_spec id="L-rule-expr-1-datespec" weekdays="1-5"/>
    </date_expression>
    <rule id="L-rule-rule" boolean-op="or">
      <expression id="L-rule-rule-expr" attribute="a" operation="eq" value="1"/>
      <expression id="L-rule-rule-expr-1" attribute="b" operation="eq" value="2"/>
    </rule>
  </rule>
</rsc_location>"#
        );
    }
}
