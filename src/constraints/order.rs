//! Order constraints.

use super::common::{
    BOOLEAN_VALUES, Options, invalid_value, normalize_bool, validate_option_names,
    validate_resources,
};
use super::resource_set::create_set_constraint;
use super::{BuildContext, ResourceSetSpec};
use crate::error::Result;
use crate::kind::ElementKind;
use crate::locator;
use crate::reports::ReportList;
use cibtree::{Document, NodeId};

const KINDS: [&str; 3] = ["Optional", "Mandatory", "Serialize"];
const ACTIONS: [&str; 4] = ["start", "stop", "promote", "demote"];
const SET_OPTIONS: [&str; 3] = ["id", "kind", "symmetrical"];
const PLAIN_OPTIONS: [&str; 5] = ["first-action", "id", "kind", "symmetrical", "then-action"];

/// Canonical spelling of an order kind.
pub fn normalize_kind(kind: &str) -> Option<&'static str> {
    KINDS
        .iter()
        .copied()
        .find(|known| known.eq_ignore_ascii_case(kind.trim()))
}

/// Validate `kind` and `symmetrical`, returning them canonicalized.
fn prepare_options(options: &Options, reports: &mut ReportList) -> Vec<(String, String)> {
    let mut attributes = Vec::new();
    if let Some(kind) = options.get("kind") {
        match normalize_kind(kind) {
            Some(kind) => attributes.push(("kind".to_string(), kind.to_string())),
            None => reports.push(invalid_value("kind", kind, &KINDS)),
        }
    }
    if let Some(symmetrical) = options.get("symmetrical") {
        match normalize_bool(symmetrical) {
            Some(value) => attributes.push(("symmetrical".to_string(), value.to_string())),
            None => reports.push(invalid_value("symmetrical", symmetrical, &BOOLEAN_VALUES)),
        }
    }
    attributes
}

/// Create an `rsc_order` over resource sets.
pub fn create_with_sets(
    doc: &mut Document,
    ctx: &mut BuildContext,
    sets: &[ResourceSetSpec],
    options: &Options,
) -> Result<Option<NodeId>> {
    let mut reports = validate_option_names(options, &SET_OPTIONS, "set constraint");
    let attributes = prepare_options(options, &mut reports);
    create_set_constraint(doc, ctx, ElementKind::Order, sets, options, reports, &attributes)
}

/// Create an `rsc_order` starting `then` after `first`.
pub fn create_plain(
    doc: &mut Document,
    ctx: &mut BuildContext,
    first: &str,
    then: &str,
    options: &Options,
) -> Result<Option<NodeId>> {
    let section = locator::constraints_section(doc)?;
    let mut reports = validate_option_names(options, &PLAIN_OPTIONS, "constraint");

    let mut actions = Vec::new();
    for name in ["first-action", "then-action"] {
        if let Some(value) = options.get(name) {
            let lowered = value.to_lowercase();
            match ACTIONS.iter().copied().find(|action| *action == lowered) {
                Some(action) => actions.push((name, action)),
                None => reports.push(invalid_value(name, value, &ACTIONS)),
            }
        }
    }
    let attributes = prepare_options(options, &mut reports);
    reports.append(validate_resources(doc, [first, then], &ctx.force_flags)?);
    reports.append(ctx.book_requested_id(doc, options));
    if ctx.absorb(reports) {
        return Ok(None);
    }

    let kind = options
        .get("kind")
        .and_then(|kind| normalize_kind(kind))
        .unwrap_or("Mandatory")
        .to_lowercase();
    let id = ctx.id_or_allocate(doc, options, &format!("order-{first}-{then}-{kind}"));
    let constraint = doc.append_element_with_attrs(section, "rsc_order", &[("id", id.as_str())]);
    let action_of = |name: &str| actions.iter().find(|(n, _)| *n == name).map(|(_, a)| *a);
    if let Some(action) = action_of("first-action") {
        doc.set_attr(constraint, "first-action", action);
    }
    doc.set_attr(constraint, "first", first);
    if let Some(action) = action_of("then-action") {
        doc.set_attr(constraint, "then-action", action);
    }
    doc.set_attr(constraint, "then", then);
    for (name, value) in &attributes {
        doc.set_attr(constraint, name, value);
    }
    log::debug!("Created order '{id}'");
    Ok(Some(constraint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::reports::ReportMessage;
    use pretty_assertions::assert_eq;

    fn doc() -> Document {
        Document::parse(
            r#"<cib><configuration>
                 <resources><primitive id="A"/><primitive id="B"/></resources>
                 <constraints/>
               </configuration></cib>"#,
        )
        .unwrap()
    }

    fn options(pairs: &[(&str, &str)]) -> Options {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_normalize_kind() {
        assert_eq!(normalize_kind("optional"), Some("Optional"));
        assert_eq!(normalize_kind("SERIALIZE"), Some("Serialize"));
        assert_eq!(normalize_kind("sometimes"), None);
    }

    #[test]
    fn test_plain_order() {
        let mut doc = doc();
        let mut ctx = BuildContext::new(&Config::default());
        let created = create_plain(
            &mut doc,
            &mut ctx,
            "A",
            "B",
            &options(&[("kind", "optional"), ("symmetrical", "FALSE"), ("then-action", "Promote")]),
        )
        .unwrap()
        .unwrap();

        assert_eq!(
            doc.attrs(created),
            &[
                ("id".to_string(), "order-A-B-optional".to_string()),
                ("first".to_string(), "A".to_string()),
                ("then-action".to_string(), "promote".to_string()),
                ("then".to_string(), "B".to_string()),
                ("kind".to_string(), "Optional".to_string()),
                ("symmetrical".to_string(), "false".to_string()),
            ]
        );
    }

    #[test]
    fn test_plain_order_default_id() {
        let mut doc = doc();
        let mut ctx = BuildContext::new(&Config::default());
        let first = create_plain(&mut doc, &mut ctx, "A", "B", &Options::new())
            .unwrap()
            .unwrap();
        let second = create_plain(&mut doc, &mut ctx, "A", "B", &Options::new())
            .unwrap()
            .unwrap();
        assert_eq!(doc.attr(first, "id"), Some("order-A-B-mandatory"));
        assert_eq!(doc.attr(second, "id"), Some("order-A-B-mandatory-1"));
    }

    #[test]
    fn test_order_with_sets_invalid_options() {
        let mut doc = doc();
        let mut ctx = BuildContext::new(&Config::default());
        let sets = [ResourceSetSpec::new(["A", "B"])];
        let created = create_with_sets(
            &mut doc,
            &mut ctx,
            &sets,
            &options(&[("kind", "always"), ("symmetrical", "sure"), ("score", "10")]),
        )
        .unwrap();

        assert!(created.is_none());
        let messages: Vec<&ReportMessage> = ctx.reports.iter().map(|item| &item.message).collect();
        assert_eq!(messages.len(), 3);
        assert!(matches!(messages[0], ReportMessage::InvalidOptions { .. }));
    }

    #[test]
    fn test_order_with_sets() {
        let mut doc = doc();
        let mut ctx = BuildContext::new(&Config::default());
        let sets = [
            ResourceSetSpec::new(["A"]).with_option("action", "stop"),
            ResourceSetSpec::new(["B"]).with_option("require-all", "no"),
        ];
        let created = create_with_sets(&mut doc, &mut ctx, &sets, &options(&[("kind", "serialize")]))
            .unwrap()
            .unwrap();
        assert_eq!(doc.attr(created, "kind"), Some("Serialize"));
        let second_set = doc.children(created)[1];
        assert_eq!(doc.attr(second_set, "require-all"), Some("false"));
    }
}
