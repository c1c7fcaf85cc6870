//! Removing CIB elements together with everything that depends on them.
//!
//! [`ElementsToRemove::new`] computes, without touching the caller's
//! document, the full set of elements that have to go together with the
//! requested ones and the references that have to be edited out of
//! elements that stay. [`remove_specified_elements`] then applies that
//! result to the real document.
//!
//! Dependencies followed by the closure:
//! - constraints, tags, ACL permissions and resource sets referring to a
//!   removed element
//! - resources contained in a removed resource
//! - location constraints naming the node a removed guest or remote node
//!   resource provides
//! - fencing levels using a removed fencing device, stripped of it and
//!   removed once they have no device left
//! - containers left pointless: a clone without its resource, a group
//!   without primitives, an empty tag, resource set, set constraint, or a
//!   location constraint without rules

mod commit;
mod dependencies;

pub use commit::remove_specified_elements;

use crate::config::RemovalConfig;
use crate::error::Result;
use crate::kind::{is_location_rule, kind_of};
use crate::locator::{self, configuration_elements};
use crate::reports::{ReportItem, ReportList, ReportMessage};
use cibtree::{Document, NodeId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Element types accepted in a removal request.
const SUPPORTED_TYPES: [&str; 3] = ["constraint", "location rule", "resource"];

fn is_supported(doc: &Document, node: NodeId) -> bool {
    let kind = kind_of(doc, node);
    kind.is_constraint() || kind.is_resource() || is_location_rule(doc, node)
}

/// The elements to remove from a CIB, and what else changes with them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ElementsToRemove {
    ids_to_remove: BTreeSet<String>,
    resources_to_remove: Vec<String>,
    dependant_elements: BTreeMap<String, String>,
    element_references: BTreeMap<String, BTreeMap<String, String>>,
    missing_ids: Vec<String>,
    unsupported_elements: BTreeMap<String, String>,
    element_tags: BTreeMap<String, String>,
}

impl ElementsToRemove {
    /// Compute the removal closure of `ids` in `doc`.
    ///
    /// Missing and unsupported ids are recorded, not fatal. The only error
    /// is a document carrying the same id more than once.
    pub fn new<I, S>(doc: &Document, ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut wip = doc.clone();
        let mut result = Self::default();
        let mut requested = BTreeSet::new();
        let mut start = Vec::new();
        let mut seen = BTreeSet::new();

        for id in ids {
            let id = id.as_ref();
            if !seen.insert(id.to_string()) {
                continue;
            }
            match locator::find_unique_by_id(&wip, id)? {
                None => result.missing_ids.push(id.to_string()),
                Some(node) if is_supported(&wip, node) => {
                    if let Some(element_id) = wip.attr(node, "id") {
                        requested.insert(element_id.to_string());
                    }
                    start.push(node);
                }
                Some(node) => {
                    result
                        .unsupported_elements
                        .insert(id.to_string(), wip.tag(node).to_string());
                }
            }
        }

        let closure = dependencies::compute(&mut wip, start);
        log::debug!(
            "Removal of {} requested element(s) affects {} element(s)",
            requested.len(),
            closure.removed.len()
        );

        for (id, &node) in &closure.removed {
            result.ids_to_remove.insert(id.clone());
            if !requested.contains(id) {
                result
                    .dependant_elements
                    .insert(id.clone(), wip.tag(node).to_string());
            }
        }
        for (removed_id, referencing) in &closure.references {
            let by_tag = referencing
                .iter()
                .map(|id| (id.clone(), closure.tags.get(id).cloned().unwrap_or_default()))
                .collect();
            result.element_references.insert(removed_id.clone(), by_tag);
        }
        result.element_tags = closure.tags;

        result.resources_to_remove = configuration_elements(doc)
            .into_iter()
            .filter(|&node| kind_of(doc, node).is_resource())
            .filter_map(|node| doc.attr(node, "id"))
            .filter(|id| result.ids_to_remove.contains(*id))
            .map(str::to_string)
            .collect();

        Ok(result)
    }

    /// Ids of every element to delete, requested and dependant.
    pub fn ids_to_remove(&self) -> &BTreeSet<String> {
        &self.ids_to_remove
    }

    /// Ids of resources among the removed elements, in document order.
    pub fn resources_to_remove(&self) -> &[String] {
        &self.resources_to_remove
    }

    /// Elements removed only because of a dependency: id -> tag.
    pub fn dependant_elements(&self) -> &BTreeMap<String, String> {
        &self.dependant_elements
    }

    /// Removed id -> elements that stay but reference it: id -> tag.
    pub fn element_references(&self) -> &BTreeMap<String, BTreeMap<String, String>> {
        &self.element_references
    }

    /// Requested ids not found in the document, in request order.
    pub fn missing_ids(&self) -> &[String] {
        &self.missing_ids
    }

    /// Requested ids of elements that cannot be removed this way: id -> tag.
    pub fn unsupported_elements(&self) -> &BTreeMap<String, String> {
        &self.unsupported_elements
    }

    /// Check whether the request resolved to nothing removable.
    pub fn is_empty(&self) -> bool {
        self.ids_to_remove.is_empty()
    }

    /// Reports describing the request: errors for missing and unsupported
    /// ids, informational items for dependant elements and references.
    pub fn reports(&self, config: &RemovalConfig) -> ReportList {
        let mut reports = ReportList::new();
        let expected_types: Vec<String> = SUPPORTED_TYPES.iter().map(|t| (*t).to_string()).collect();

        for id in &self.missing_ids {
            reports.push(ReportItem::error(ReportMessage::IdNotFound {
                id: id.clone(),
                expected_types: expected_types.clone(),
            }));
        }
        for (id, tag) in &self.unsupported_elements {
            reports.push(ReportItem::error(ReportMessage::IdBelongsToUnexpectedType {
                id: id.clone(),
                expected_types: expected_types.clone(),
                current_type: tag.clone(),
            }));
        }
        if config.report_dependants && !self.dependant_elements.is_empty() {
            reports.push(ReportItem::info(ReportMessage::CibRemoveDependantElements {
                id_tag_map: self.dependant_elements.clone(),
            }));
        }
        if config.report_references && !self.element_references.is_empty() {
            let removing_references_from = self
                .element_references
                .iter()
                .map(|(id, referencing)| (id.clone(), referencing.keys().cloned().collect()))
                .collect();
            let id_tag_map = self
                .element_tags
                .iter()
                .filter(|(id, _)| {
                    self.element_references.contains_key(*id)
                        || self
                            .element_references
                            .values()
                            .any(|referencing| referencing.contains_key(*id))
                })
                .map(|(id, tag)| (id.clone(), tag.clone()))
                .collect();
            reports.push(ReportItem::info(ReportMessage::CibRemoveReferences {
                id_tag_map,
                removing_references_from,
            }));
        }
        reports
    }
}
