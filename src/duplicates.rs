//! Detecting constraints that duplicate existing ones.
//!
//! A [`DuplicatesChecker`] answers whether two constraints of the same
//! shape mean the same thing. [`check`] picks the checker from the
//! candidate's kind, scans its section and reports every duplicate found
//! as one forceable error.

use crate::constraints::common::normalize_role;
use crate::error::{Error, Result};
use crate::kind::{ElementKind, has_resource_sets, kind_of};
use crate::reports::{ForceFlag, ForceFlags, ReportItem, ReportList, ReportMessage};
use crate::rule::rule_to_str;
use cibtree::{Document, NodeId};
use std::collections::BTreeSet;

/// Shape-specific equality of two constraints.
///
/// `candidate` stays the same for the whole scan, so implementations may
/// cache whatever they derive from it.
pub trait DuplicatesChecker {
    /// Check if `existing` duplicates `candidate`.
    fn are_duplicate(&mut self, doc: &Document, candidate: NodeId, existing: NodeId) -> bool;
}

/// Resource ids referenced by every set of a constraint, in order.
pub fn resource_set_id_lists(doc: &Document, constraint: NodeId) -> Vec<Vec<String>> {
    doc.children_by_tag(constraint, "resource_set")
        .into_iter()
        .map(|set| {
            doc.children_by_tag(set, "resource_ref")
                .into_iter()
                .filter_map(|reference| doc.attr(reference, "id"))
                .map(str::to_string)
                .collect()
        })
        .collect()
}

/// Colocation, order and ticket constraints over resource sets.
///
/// Set options are ignored; resource membership and order must match
/// exactly. Ticket constraints must also name the same ticket.
#[derive(Debug, Default)]
pub struct SetConstraintChecker;

impl DuplicatesChecker for SetConstraintChecker {
    fn are_duplicate(&mut self, doc: &Document, candidate: NodeId, existing: NodeId) -> bool {
        if kind_of(doc, candidate) == ElementKind::Ticket
            && doc.attr(candidate, "ticket") != doc.attr(existing, "ticket")
        {
            return false;
        }
        resource_set_id_lists(doc, candidate) == resource_set_id_lists(doc, existing)
    }
}

/// Plain colocation constraints, matched in either direction.
#[derive(Debug, Default)]
pub struct ColocationChecker;

impl DuplicatesChecker for ColocationChecker {
    fn are_duplicate(&mut self, doc: &Document, candidate: NodeId, existing: NodeId) -> bool {
        let pair = |node| (doc.attr(node, "rsc"), doc.attr(node, "with-rsc"));
        let (rsc, with_rsc) = pair(candidate);
        let existing = pair(existing);
        existing == (rsc, with_rsc) || existing == (with_rsc, rsc)
    }
}

/// Plain order constraints.
#[derive(Debug, Default)]
pub struct OrderChecker;

impl DuplicatesChecker for OrderChecker {
    fn are_duplicate(&mut self, doc: &Document, candidate: NodeId, existing: NodeId) -> bool {
        ["first", "then"]
            .iter()
            .all(|attr| doc.attr(candidate, attr) == doc.attr(existing, attr))
    }
}

/// Plain ticket constraints.
#[derive(Debug, Default)]
pub struct TicketChecker;

fn ticket_key(doc: &Document, node: NodeId) -> (Option<&str>, Option<&str>, Option<String>) {
    let role = doc.attr(node, "rsc-role").map(|role| {
        normalize_role(role).map_or_else(|| role.to_string(), str::to_string)
    });
    (doc.attr(node, "ticket"), doc.attr(node, "rsc"), role)
}

impl DuplicatesChecker for TicketChecker {
    fn are_duplicate(&mut self, doc: &Document, candidate: NodeId, existing: NodeId) -> bool {
        ticket_key(doc, candidate) == ticket_key(doc, existing)
    }
}

/// Location constraints, plain or over resource sets.
///
/// Both constraints must target the same resource, pattern or resource
/// sets. A constraint with rules never duplicates one with `node`/`score`.
/// Two ruled constraints are duplicates when they share at least one rule
/// with the same canonical text. Two node constraints are duplicates when
/// node and role match.
#[derive(Debug, Default)]
pub struct LocationChecker {
    candidate_rules: Option<BTreeSet<String>>,
}

fn location_rules(doc: &Document, node: NodeId) -> BTreeSet<String> {
    doc.children_by_tag(node, "rule")
        .into_iter()
        .map(|rule| rule_to_str(doc, rule))
        .collect()
}

impl DuplicatesChecker for LocationChecker {
    fn are_duplicate(&mut self, doc: &Document, candidate: NodeId, existing: NodeId) -> bool {
        let same_target = ["rsc", "rsc-pattern"]
            .iter()
            .all(|attr| doc.attr(candidate, attr) == doc.attr(existing, attr))
            && resource_set_id_lists(doc, candidate) == resource_set_id_lists(doc, existing);
        if !same_target {
            return false;
        }

        let candidate_rules = self
            .candidate_rules
            .get_or_insert_with(|| location_rules(doc, candidate));
        let existing_has_rules = doc.first_child_by_tag(existing, "rule").is_some();

        match (candidate_rules.is_empty(), existing_has_rules) {
            (true, false) => ["node", "role"]
                .iter()
                .all(|attr| doc.attr(candidate, attr) == doc.attr(existing, attr)),
            (false, true) => !candidate_rules.is_disjoint(&location_rules(doc, existing)),
            _ => false,
        }
    }
}

/// The checker for a constraint, or `None` for elements that are not
/// constraints.
pub fn checker_for(doc: &Document, constraint: NodeId) -> Option<Box<dyn DuplicatesChecker>> {
    let kind = kind_of(doc, constraint);
    if has_resource_sets(doc, constraint) && kind != ElementKind::Location {
        return Some(Box::new(SetConstraintChecker));
    }
    match kind {
        ElementKind::Colocation => Some(Box::new(ColocationChecker)),
        ElementKind::Order => Some(Box::new(OrderChecker)),
        ElementKind::Ticket => Some(Box::new(TicketChecker)),
        ElementKind::Location => Some(Box::new(LocationChecker::default())),
        _ => None,
    }
}

/// Ids of constraints in `section` duplicating `candidate`.
///
/// Only constraints with the same tag and the same use of resource sets
/// are compared. `candidate` itself is skipped.
pub fn find_duplicates(
    doc: &Document,
    section: NodeId,
    candidate: NodeId,
    checker: &mut dyn DuplicatesChecker,
) -> Vec<String> {
    let tag = doc.tag(candidate);
    let with_sets = has_resource_sets(doc, candidate);
    doc.children(section)
        .iter()
        .copied()
        .filter(|&existing| {
            existing != candidate
                && doc.tag(existing) == tag
                && has_resource_sets(doc, existing) == with_sets
        })
        .filter(|&existing| checker.are_duplicate(doc, candidate, existing))
        .filter_map(|existing| doc.attr(existing, "id"))
        .map(str::to_string)
        .collect()
}

/// The report for a candidate duplicating `constraint_ids`.
///
/// An error unless `force_flags` allow duplicates. Asking for a report
/// without any duplicate is a caller bug.
pub fn duplicates_report(constraint_ids: Vec<String>, force_flags: &ForceFlags) -> Result<ReportItem> {
    if constraint_ids.is_empty() {
        return Err(Error::EmptyReport {
            context: "duplicate constraints".to_string(),
        });
    }
    Ok(ReportItem::forceable_error(
        ForceFlag::AllowDuplicates,
        force_flags,
        ReportMessage::DuplicateConstraintsExist { constraint_ids },
    ))
}

/// Report constraints in `section` duplicating `candidate`.
///
/// Returns one `DuplicateConstraintsExist` item listing every duplicate.
/// Nothing is reported when there are no duplicates or `candidate` is not
/// a constraint.
pub fn check(
    doc: &Document,
    section: NodeId,
    candidate: NodeId,
    force_flags: &ForceFlags,
) -> Result<ReportList> {
    let mut reports = ReportList::new();
    let Some(mut checker) = checker_for(doc, candidate) else {
        return Ok(reports);
    };

    let duplicates = find_duplicates(doc, section, candidate, checker.as_mut());
    if !duplicates.is_empty() {
        log::debug!(
            "'{}' duplicates {}",
            doc.attr(candidate, "id").unwrap_or_default(),
            duplicates.join(", ")
        );
        reports.push(duplicates_report(duplicates, force_flags)?);
    }
    Ok(reports)
}
