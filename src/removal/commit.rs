//! Applying a computed removal to the real document.

use super::ElementsToRemove;
use super::dependencies::remove_device;
use crate::kind::{ElementKind, kind_of};
use crate::locator::find_by_id_strict;
use cibtree::{Document, NodeId};

/// Remove the elements and references described by `elements` from `doc`.
///
/// Ids that no longer exist are skipped silently: the closure can reach the
/// same element for several reasons, and committing twice must be
/// harmless. Returns the number of edits made.
pub fn remove_specified_elements(doc: &mut Document, elements: &ElementsToRemove) -> usize {
    let mut edits = 0;

    for id in elements.ids_to_remove() {
        for node in find_by_id_strict(doc, id) {
            log::debug!("Removing {} '{id}'", doc.tag(node));
            doc.detach(node);
            edits += 1;
        }
    }

    for (removed_id, referencing) in elements.element_references() {
        for referencing_id in referencing.keys() {
            for node in find_by_id_strict(doc, referencing_id) {
                edits += remove_reference(doc, node, removed_id);
            }
        }
    }

    log::info!(
        "Removed {} element(s) with {edits} edit(s)",
        elements.ids_to_remove().len()
    );
    edits
}

/// Strip every reference to `removed_id` held by `referencing`.
fn remove_reference(doc: &mut Document, referencing: NodeId, removed_id: &str) -> usize {
    let mut edits = 0;

    let reference_nodes: Vec<NodeId> = doc
        .children(referencing)
        .iter()
        .copied()
        .filter(|&child| {
            kind_of(doc, child).is_reference_only() && doc.attr(child, "id") == Some(removed_id)
        })
        .collect();
    for node in reference_nodes {
        log::debug!(
            "Removing reference to '{removed_id}' from '{}'",
            doc.attr(referencing, "id").unwrap_or_default()
        );
        doc.detach(node);
        edits += 1;
    }

    let holds_device = kind_of(doc, referencing) == ElementKind::FencingLevel
        && doc
            .attr(referencing, "devices")
            .is_some_and(|devices| devices.split(',').any(|d| d == removed_id));
    if holds_device {
        if remove_device(doc, referencing, removed_id) {
            doc.detach(referencing);
        }
        edits += 1;
    }

    edits
}
