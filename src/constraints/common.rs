//! Validation shared by the constraint builders.

use crate::error::Result;
use crate::kind::{ElementKind, kind_of, multi_instance_parent};
use crate::locator;
use crate::reports::{ForceFlag, ForceFlags, ReportItem, ReportList, ReportMessage};
use cibtree::Document;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Options of a constraint, a resource set or a rule: name -> value.
pub type Options = BTreeMap<String, String>;

static SCORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+|INFINITY)$").expect("valid score pattern"));

/// Canonical role values.
pub const ROLES: [&str; 4] = ["Stopped", "Started", "Promoted", "Unpromoted"];

/// Values accepted for boolean options.
pub const BOOLEAN_VALUES: [&str; 8] = ["true", "false", "yes", "no", "on", "off", "1", "0"];

/// Check if a score is an integer or (+/-)INFINITY.
pub fn is_valid_score(score: &str) -> bool {
    SCORE_RE.is_match(score)
}

/// Canonical spelling of a role, accepting the legacy `Master`/`Slave`
/// names. Matching is case-insensitive.
pub fn normalize_role(role: &str) -> Option<&'static str> {
    let role = role.trim().to_lowercase();
    match role.as_str() {
        "master" => Some("Promoted"),
        "slave" => Some("Unpromoted"),
        _ => ROLES.iter().copied().find(|r| r.to_lowercase() == role),
    }
}

/// `true` or `false` for any accepted boolean spelling.
pub fn normalize_bool(value: &str) -> Option<&'static str> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some("true"),
        "false" | "no" | "off" | "0" => Some("false"),
        _ => None,
    }
}

/// Report option names outside `allowed`.
pub fn validate_option_names(options: &Options, allowed: &[&str], option_type: &str) -> ReportList {
    let invalid: Vec<String> = options
        .keys()
        .filter(|name| !allowed.contains(&name.as_str()))
        .cloned()
        .collect();
    let mut reports = ReportList::new();
    if !invalid.is_empty() {
        let mut allowed: Vec<String> = allowed.iter().map(|a| (*a).to_string()).collect();
        allowed.sort();
        reports.push(ReportItem::error(ReportMessage::InvalidOptions {
            option_names: invalid,
            allowed,
            option_type: option_type.to_string(),
        }));
    }
    reports
}

/// Report required options that are missing.
pub fn validate_required(options: &Options, required: &[&str], option_type: &str) -> ReportList {
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !options.contains_key(**name))
        .map(|name| (*name).to_string())
        .collect();
    let mut reports = ReportList::new();
    if !missing.is_empty() {
        reports.push(ReportItem::error(ReportMessage::RequiredOptionsMissing {
            option_names: missing,
            option_type: option_type.to_string(),
        }));
    }
    reports
}

/// Report an option value outside its allowed set.
pub fn invalid_value(name: &str, value: &str, allowed: &[&str]) -> ReportItem {
    ReportItem::error(ReportMessage::InvalidOptionValue {
        option_name: name.to_string(),
        option_value: value.to_string(),
        allowed_values: allowed.iter().map(|a| (*a).to_string()).collect(),
    })
}

/// Report an invalid score.
pub fn validate_score(score: &str) -> Option<ReportItem> {
    (!is_valid_score(score)).then(|| {
        ReportItem::error(ReportMessage::InvalidScore {
            score: score.to_string(),
        })
    })
}

/// Check that every id names a resource that can be constrained.
///
/// Resources inside a clone, master or bundle raise a forceable error
/// suggesting the multi-instance parent instead.
pub fn validate_resources<'a, I>(
    doc: &Document,
    resource_ids: I,
    force_flags: &ForceFlags,
) -> Result<ReportList>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut reports = ReportList::new();
    for id in resource_ids {
        let Some(node) = locator::find_unique_by_id(doc, id)? else {
            reports.push(ReportItem::error(ReportMessage::IdNotFound {
                id: id.to_string(),
                expected_types: vec!["resource".to_string()],
            }));
            continue;
        };
        let kind = kind_of(doc, node);
        if !kind.is_resource() {
            reports.push(ReportItem::error(ReportMessage::IdBelongsToUnexpectedType {
                id: id.to_string(),
                expected_types: vec!["resource".to_string()],
                current_type: doc.tag(node).to_string(),
            }));
            continue;
        }
        if let Some(parent) = multi_instance_parent(doc, node) {
            let parent_type = match kind_of(doc, parent) {
                ElementKind::Bundle => "bundle",
                _ => "clone",
            };
            reports.push(ReportItem::forceable_error(
                ForceFlag::AllowMultiInstance,
                force_flags,
                ReportMessage::ResourceForConstraintIsMultiinstance {
                    resource_id: id.to_string(),
                    parent_type: parent_type.to_string(),
                    parent_id: doc.attr(parent, "id").unwrap_or_default().to_string(),
                },
            ));
        }
    }
    Ok(reports)
}

/// Id stem for a constraint over resource sets: the prefix followed by the
/// first and last character of up to three resource ids.
pub fn set_constraint_id_stem<'a, I>(prefix: &str, resource_ids: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut stem = format!("{prefix}_set_");
    for id in resource_ids.into_iter().take(3) {
        let mut chars = id.chars();
        if let Some(first) = chars.next() {
            stem.push(first);
            stem.push(chars.next_back().unwrap_or(first));
        }
    }
    stem
}
