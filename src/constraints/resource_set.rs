//! Resource sets and the constraints built from them.

use super::BuildContext;
use super::common::{
    BOOLEAN_VALUES, Options, ROLES, invalid_value, normalize_bool, normalize_role,
    set_constraint_id_stem, validate_option_names, validate_resources,
};
use crate::error::Result;
use crate::kind::ElementKind;
use crate::locator;
use crate::reports::{ReportItem, ReportList, ReportMessage};
use cibtree::{Document, NodeId};

const ACTIONS: [&str; 4] = ["start", "stop", "promote", "demote"];
const ORDERINGS: [&str; 2] = ["group", "listed"];

/// One resource set of a constraint to create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceSetSpec {
    /// Referenced resources, in order
    pub resource_ids: Vec<String>,
    /// Set options such as `sequential` or `role`
    pub options: Options,
}

impl ResourceSetSpec {
    /// A set of the given resources without options.
    pub fn new<I, S>(resource_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            resource_ids: resource_ids.into_iter().map(Into::into).collect(),
            options: Options::new(),
        }
    }

    /// Add a set option.
    pub fn with_option(mut self, name: &str, value: &str) -> Self {
        self.options.insert(name.to_string(), value.to_string());
        self
    }
}

/// Set options accepted in constraints of `kind`.
pub fn allowed_set_options(kind: ElementKind) -> &'static [&'static str] {
    match kind {
        ElementKind::Colocation | ElementKind::Order => {
            &["action", "ordering", "require-all", "role", "sequential"]
        }
        _ => &["action", "require-all", "role", "sequential"],
    }
}

/// Validate set options and return them with canonical values.
fn prepare_set_options(options: &Options, kind: ElementKind) -> (ReportList, Vec<(String, String)>) {
    let mut reports = validate_option_names(options, allowed_set_options(kind), "set");
    let mut attributes = Vec::new();

    for (name, value) in options {
        let normalized = match name.as_str() {
            "sequential" | "require-all" => {
                normalize_bool(value).ok_or_else(|| invalid_value(name, value, &BOOLEAN_VALUES))
            }
            "role" => normalize_role(value).ok_or_else(|| invalid_value(name, value, &ROLES)),
            "action" => ACTIONS
                .iter()
                .copied()
                .find(|action| *action == value.to_lowercase())
                .ok_or_else(|| invalid_value(name, value, &ACTIONS)),
            "ordering" => ORDERINGS
                .iter()
                .copied()
                .find(|ordering| *ordering == value.to_lowercase())
                .ok_or_else(|| invalid_value(name, value, &ORDERINGS)),
            _ => continue,
        };
        match normalized {
            Ok(value) => attributes.push((name.clone(), value.to_string())),
            Err(item) => reports.push(item),
        }
    }
    (reports, attributes)
}

/// Validate a set list for a constraint of `kind`.
pub fn validate_sets(
    doc: &Document,
    ctx: &BuildContext,
    sets: &[ResourceSetSpec],
    kind: ElementKind,
) -> Result<ReportList> {
    let mut reports = ReportList::new();
    if sets.is_empty() {
        reports.push(ReportItem::error(ReportMessage::EmptyResourceSetList));
    }
    for set in sets {
        if set.resource_ids.is_empty() {
            reports.push(ReportItem::error(ReportMessage::EmptyResourceSet));
        }
        reports.append(prepare_set_options(&set.options, kind).0);
    }
    reports.append(validate_resources(
        doc,
        sets.iter().flat_map(|set| set.resource_ids.iter().map(String::as_str)),
        &ctx.force_flags,
    )?);
    Ok(reports)
}

/// Append a `resource_set` for `spec` to `constraint`.
pub fn append_resource_set(
    doc: &mut Document,
    ctx: &mut BuildContext,
    constraint: NodeId,
    constraint_id: &str,
    spec: &ResourceSetSpec,
    kind: ElementKind,
) -> NodeId {
    let set_id = ctx.ids.allocate(doc, &format!("{constraint_id}-set"));
    let set = doc.append_element_with_attrs(constraint, "resource_set", &[("id", set_id.as_str())]);
    for (name, value) in prepare_set_options(&spec.options, kind).1 {
        doc.set_attr(set, &name, &value);
    }
    for resource_id in &spec.resource_ids {
        doc.append_element_with_attrs(set, "resource_ref", &[("id", resource_id.as_str())]);
    }
    set
}

/// Create a constraint of `kind` over `sets`.
///
/// `option_reports` and `attributes` come from the caller's validation of
/// the constraint options; the id is taken from `options` or generated.
pub(crate) fn create_set_constraint(
    doc: &mut Document,
    ctx: &mut BuildContext,
    kind: ElementKind,
    sets: &[ResourceSetSpec],
    options: &Options,
    mut option_reports: ReportList,
    attributes: &[(String, String)],
) -> Result<Option<NodeId>> {
    let Some(tag) = kind.tag() else {
        return Ok(None);
    };
    let section = locator::constraints_section(doc)?;

    option_reports.append(validate_sets(doc, ctx, sets, kind)?);
    option_reports.append(ctx.book_requested_id(doc, options));
    if ctx.absorb(option_reports) {
        log::debug!("Not creating {kind} with resource sets, validation failed");
        return Ok(None);
    }

    let stem = set_constraint_id_stem(
        &ctx.ids_config.set_constraint_prefix_for(tag),
        sets.iter().flat_map(|set| set.resource_ids.iter().map(String::as_str)),
    );
    let constraint_id = ctx.id_or_allocate(doc, options, &stem);

    let constraint = doc.append_element_with_attrs(section, tag, &[("id", constraint_id.as_str())]);
    for (name, value) in attributes {
        doc.set_attr(constraint, name, value);
    }
    for set in sets {
        append_resource_set(doc, ctx, constraint, &constraint_id, set, kind);
    }
    log::debug!("Created {kind} '{constraint_id}' with {} set(s)", sets.len());
    Ok(Some(constraint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use pretty_assertions::assert_eq;

    fn doc() -> Document {
        Document::parse(
            r#"<cib><configuration>
                 <resources>
                   <primitive id="A"/><primitive id="B"/>
                   <clone id="C-clone"><primitive id="C"/></clone>
                 </resources>
                 <constraints/>
               </configuration></cib>"#,
        )
        .unwrap()
    }

    #[test]
    fn test_set_options_normalized() {
        let options: Options = [("sequential", "YES"), ("role", "master"), ("action", "Start")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let (reports, attributes) = prepare_set_options(&options, ElementKind::Order);
        assert!(reports.is_empty());
        assert_eq!(
            attributes,
            vec![
                ("action".to_string(), "start".to_string()),
                ("role".to_string(), "Promoted".to_string()),
                ("sequential".to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn test_set_options_rejected() {
        let options: Options = [("ordering", "listed"), ("require-all", "perhaps")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let (reports, _) = prepare_set_options(&options, ElementKind::Ticket);
        assert_eq!(reports.len(), 2);
    }

    #[test]
    fn test_validate_sets() {
        let doc = doc();
        let ctx = BuildContext::new(&Config::default());

        let reports = validate_sets(&doc, &ctx, &[], ElementKind::Order).unwrap();
        assert_eq!(
            reports.iter().next().unwrap().message,
            ReportMessage::EmptyResourceSetList
        );

        let sets = [ResourceSetSpec::new(["A"]), ResourceSetSpec::new(Vec::<String>::new())];
        let reports = validate_sets(&doc, &ctx, &sets, ElementKind::Order).unwrap();
        assert_eq!(
            reports.iter().next().unwrap().message,
            ReportMessage::EmptyResourceSet
        );

        let sets = [ResourceSetSpec::new(["A", "C"])];
        let reports = validate_sets(&doc, &ctx, &sets, ElementKind::Order).unwrap();
        assert!(matches!(
            reports.iter().next().unwrap().message,
            ReportMessage::ResourceForConstraintIsMultiinstance { .. }
        ));
    }

    #[test]
    fn test_create_set_constraint_ids() {
        let mut doc = doc();
        let mut ctx = BuildContext::new(&Config::default());
        let sets = [
            ResourceSetSpec::new(["A"]).with_option("sequential", "false"),
            ResourceSetSpec::new(["B"]),
        ];
        let created = create_set_constraint(
            &mut doc,
            &mut ctx,
            ElementKind::Order,
            &sets,
            &Options::new(),
            ReportList::new(),
            &[],
        )
        .unwrap()
        .unwrap();

        assert_eq!(doc.attr(created, "id"), Some("pcs_rsc_order_set_AABB"));
        let set_ids: Vec<&str> = doc
            .children(created)
            .iter()
            .filter_map(|&set| doc.attr(set, "id"))
            .collect();
        assert_eq!(
            set_ids,
            vec!["pcs_rsc_order_set_AABB-set", "pcs_rsc_order_set_AABB-set-1"]
        );
        assert_eq!(doc.attr(doc.children(created)[0], "sequential"), Some("false"));
    }
}
