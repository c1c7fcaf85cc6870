//! Colocation constraints.

use super::common::{
    Options, ROLES, invalid_value, normalize_role, validate_option_names, validate_resources,
    validate_score,
};
use super::resource_set::create_set_constraint;
use super::{BuildContext, ResourceSetSpec};
use crate::error::Result;
use crate::kind::ElementKind;
use crate::locator;
use crate::reports::ReportList;
use cibtree::{Document, NodeId};

const SET_OPTIONS: [&str; 2] = ["id", "score"];
const PLAIN_OPTIONS: [&str; 4] = ["id", "rsc-role", "score", "with-rsc-role"];
const DEFAULT_SCORE: &str = "INFINITY";

fn validate_score_option(options: &Options, reports: &mut ReportList) {
    if let Some(item) = options.get("score").and_then(|score| validate_score(score)) {
        reports.push(item);
    }
}

/// Create an `rsc_colocation` over resource sets.
pub fn create_with_sets(
    doc: &mut Document,
    ctx: &mut BuildContext,
    sets: &[ResourceSetSpec],
    options: &Options,
) -> Result<Option<NodeId>> {
    let mut reports = validate_option_names(options, &SET_OPTIONS, "set constraint");
    validate_score_option(options, &mut reports);
    let attributes = [(
        "score".to_string(),
        options
            .get("score")
            .cloned()
            .unwrap_or_else(|| DEFAULT_SCORE.to_string()),
    )];
    create_set_constraint(
        doc,
        ctx,
        ElementKind::Colocation,
        sets,
        options,
        reports,
        &attributes,
    )
}

/// Create an `rsc_colocation` placing `rsc` with `with_rsc`.
pub fn create_plain(
    doc: &mut Document,
    ctx: &mut BuildContext,
    rsc: &str,
    with_rsc: &str,
    options: &Options,
) -> Result<Option<NodeId>> {
    let section = locator::constraints_section(doc)?;
    let mut reports = validate_option_names(options, &PLAIN_OPTIONS, "constraint");
    validate_score_option(options, &mut reports);

    let mut roles = Vec::new();
    for name in ["rsc-role", "with-rsc-role"] {
        if let Some(value) = options.get(name) {
            match normalize_role(value) {
                Some(role) => roles.push((name, role)),
                None => reports.push(invalid_value(name, value, &ROLES)),
            }
        }
    }
    reports.append(validate_resources(doc, [rsc, with_rsc], &ctx.force_flags)?);
    reports.append(ctx.book_requested_id(doc, options));
    if ctx.absorb(reports) {
        return Ok(None);
    }

    let score = options.get("score").map_or(DEFAULT_SCORE, String::as_str);
    let id = ctx.id_or_allocate(doc, options, &format!("colocation-{rsc}-{with_rsc}-{score}"));
    let constraint = doc.append_element_with_attrs(
        section,
        "rsc_colocation",
        &[
            ("id", id.as_str()),
            ("rsc", rsc),
            ("with-rsc", with_rsc),
            ("score", score),
        ],
    );
    for (name, role) in roles {
        doc.set_attr(constraint, name, role);
    }
    log::debug!("Created colocation '{id}'");
    Ok(Some(constraint))
}
