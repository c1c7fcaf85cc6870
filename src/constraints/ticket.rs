//! Ticket constraints.

use super::common::{
    Options, ROLES, invalid_value, normalize_role, validate_option_names, validate_required,
    validate_resources,
};
use super::resource_set::create_set_constraint;
use super::{BuildContext, ResourceSetSpec};
use crate::error::Result;
use crate::ids::validate_id;
use crate::kind::ElementKind;
use crate::locator;
use crate::reports::ReportList;
use cibtree::{Document, NodeId};

const LOSS_POLICIES: [&str; 4] = ["fence", "stop", "freeze", "demote"];
const SET_OPTIONS: [&str; 3] = ["id", "loss-policy", "ticket"];
const PLAIN_OPTIONS: [&str; 3] = ["id", "loss-policy", "rsc-role"];

fn validate_ticket(ticket: &str, reports: &mut ReportList) {
    if let Some(item) = validate_id(ticket, "ticket name") {
        reports.push(item);
    }
}

fn prepare_loss_policy(options: &Options, reports: &mut ReportList) -> Option<(String, String)> {
    let policy = options.get("loss-policy")?;
    let lowered = policy.to_lowercase();
    match LOSS_POLICIES.iter().find(|known| **known == lowered) {
        Some(known) => Some(("loss-policy".to_string(), (*known).to_string())),
        None => {
            reports.push(invalid_value("loss-policy", policy, &LOSS_POLICIES));
            None
        }
    }
}

/// Create an `rsc_ticket` over resource sets. The `ticket` option is
/// required.
pub fn create_with_sets(
    doc: &mut Document,
    ctx: &mut BuildContext,
    sets: &[ResourceSetSpec],
    options: &Options,
) -> Result<Option<NodeId>> {
    let mut reports = validate_option_names(options, &SET_OPTIONS, "set constraint");
    reports.append(validate_required(options, &["ticket"], "set constraint"));

    let mut attributes = Vec::new();
    if let Some(ticket) = options.get("ticket") {
        validate_ticket(ticket, &mut reports);
        attributes.push(("ticket".to_string(), ticket.clone()));
    }
    attributes.extend(prepare_loss_policy(options, &mut reports));
    create_set_constraint(doc, ctx, ElementKind::Ticket, sets, options, reports, &attributes)
}

/// Create an `rsc_ticket` making `rsc` depend on `ticket`.
pub fn create_plain(
    doc: &mut Document,
    ctx: &mut BuildContext,
    ticket: &str,
    rsc: &str,
    options: &Options,
) -> Result<Option<NodeId>> {
    let section = locator::constraints_section(doc)?;
    let mut reports = validate_option_names(options, &PLAIN_OPTIONS, "constraint");
    validate_ticket(ticket, &mut reports);

    let role = match options.get("rsc-role") {
        Some(value) => {
            let role = normalize_role(value);
            if role.is_none() {
                reports.push(invalid_value("rsc-role", value, &ROLES));
            }
            role
        }
        None => None,
    };
    let loss_policy = prepare_loss_policy(options, &mut reports);
    reports.append(validate_resources(doc, [rsc], &ctx.force_flags)?);
    reports.append(ctx.book_requested_id(doc, options));
    if ctx.absorb(reports) {
        return Ok(None);
    }

    let proposed = match role {
        Some(role) => format!("ticket-{ticket}-{rsc}-{role}"),
        None => format!("ticket-{ticket}-{rsc}"),
    };
    let id = ctx.id_or_allocate(doc, options, &proposed);
    let constraint = doc.append_element_with_attrs(
        section,
        "rsc_ticket",
        &[("id", id.as_str()), ("ticket", ticket), ("rsc", rsc)],
    );
    if let Some(role) = role {
        doc.set_attr(constraint, "rsc-role", role);
    }
    if let Some((name, value)) = loss_policy {
        doc.set_attr(constraint, &name, &value);
    }
    log::debug!("Created ticket constraint '{id}'");
    Ok(Some(constraint))
}
