//! Command-level operations.
//!
//! Every operation works on a copy of the caller's document. The copy
//! replaces the original only when no error was reported, so a failed
//! operation leaves the document exactly as it was. Errors come back as
//! [`Error::Reports`] carrying every report collected, not just the first;
//! on success the returned list holds the warnings and informational
//! items.

use crate::config::Config;
use crate::constraints::{
    BuildContext, LocationTarget, Options, ResourceSetSpec, colocation, location, order, ticket,
};
use crate::duplicates;
use crate::error::{Error, Result};
use crate::locator;
use crate::removal::{ElementsToRemove, remove_specified_elements};
use crate::reports::{ReportItem, ReportList, ReportMessage};
use cibtree::{Document, NodeId};

/// Remove elements and everything depending on them.
pub fn remove_elements<I, S>(doc: &mut Document, ids: I, config: &Config) -> Result<ReportList>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let elements = ElementsToRemove::new(doc, ids)?;
    let mut reports = elements.reports(&config.removal);
    if reports.has_errors() {
        return Err(Error::Reports(reports));
    }
    if !elements.resources_to_remove().is_empty() {
        reports.push(ReportItem::info(ReportMessage::CibRemoveResources {
            id_list: elements.resources_to_remove().to_vec(),
        }));
    }

    remove_specified_elements(doc, &elements);
    Ok(reports)
}

/// Run a builder and the duplicate check on a copy of `doc`.
fn build_checked<F>(doc: &mut Document, config: &Config, build: F) -> Result<ReportList>
where
    F: FnOnce(&mut Document, &mut BuildContext) -> Result<Option<NodeId>>,
{
    let mut wip = doc.clone();
    let mut ctx = BuildContext::new(config);

    if let Some(constraint) = build(&mut wip, &mut ctx)? {
        let section = locator::constraints_section(&wip)?;
        let duplicates = duplicates::check(&wip, section, constraint, &ctx.force_flags)?;
        ctx.reports.append(duplicates);
    }

    if ctx.reports.has_errors() {
        return Err(Error::Reports(ctx.reports));
    }
    *doc = wip;
    Ok(ctx.reports)
}

/// Create a colocation constraint over resource sets.
pub fn create_colocation_with_sets(
    doc: &mut Document,
    sets: &[ResourceSetSpec],
    options: &Options,
    config: &Config,
) -> Result<ReportList> {
    build_checked(doc, config, |wip, ctx| {
        colocation::create_with_sets(wip, ctx, sets, options)
    })
}

/// Create an order constraint over resource sets.
pub fn create_order_with_sets(
    doc: &mut Document,
    sets: &[ResourceSetSpec],
    options: &Options,
    config: &Config,
) -> Result<ReportList> {
    build_checked(doc, config, |wip, ctx| {
        order::create_with_sets(wip, ctx, sets, options)
    })
}

/// Create a ticket constraint over resource sets.
pub fn create_ticket_with_sets(
    doc: &mut Document,
    sets: &[ResourceSetSpec],
    options: &Options,
    config: &Config,
) -> Result<ReportList> {
    build_checked(doc, config, |wip, ctx| {
        ticket::create_with_sets(wip, ctx, sets, options)
    })
}

/// Create a colocation constraint between two resources.
pub fn create_colocation(
    doc: &mut Document,
    rsc: &str,
    with_rsc: &str,
    options: &Options,
    config: &Config,
) -> Result<ReportList> {
    build_checked(doc, config, |wip, ctx| {
        colocation::create_plain(wip, ctx, rsc, with_rsc, options)
    })
}

/// Create an order constraint between two resources.
pub fn create_order(
    doc: &mut Document,
    first: &str,
    then: &str,
    options: &Options,
    config: &Config,
) -> Result<ReportList> {
    build_checked(doc, config, |wip, ctx| {
        order::create_plain(wip, ctx, first, then, options)
    })
}

/// Create a ticket constraint for a resource.
pub fn create_ticket(
    doc: &mut Document,
    ticket_name: &str,
    rsc: &str,
    options: &Options,
    config: &Config,
) -> Result<ReportList> {
    build_checked(doc, config, |wip, ctx| {
        ticket::create_plain(wip, ctx, ticket_name, rsc, options)
    })
}

/// Create a location constraint holding one rule.
pub fn create_location_with_rule(
    doc: &mut Document,
    target: &LocationTarget,
    rule: &str,
    constraint_options: &Options,
    rule_options: &Options,
    config: &Config,
) -> Result<ReportList> {
    build_checked(doc, config, |wip, ctx| {
        location::create_with_rule(wip, ctx, target, rule, constraint_options, rule_options)
    })
}

/// Add a rule to an existing location constraint.
pub fn add_rule_to_location(
    doc: &mut Document,
    constraint_id: &str,
    rule: &str,
    rule_options: &Options,
    config: &Config,
) -> Result<ReportList> {
    build_checked(doc, config, |wip, ctx| {
        location::add_rule(wip, ctx, constraint_id, rule, rule_options)
    })
}
