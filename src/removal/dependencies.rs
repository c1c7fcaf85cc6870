//! Dependency closure over a working copy of the CIB.
//!
//! The worklist is processed against a private copy of the document and
//! every processed element is detached from it right away. Reference
//! searches run on that copy, so they never rediscover elements that are
//! already on their way out.

use crate::kind::{
    ElementKind, inner_resources, is_stonith, kind_of, provided_node_names,
};
use crate::locator::configuration_elements;
use cibtree::{Document, NodeId};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Outcome of a closure computation.
#[derive(Debug, Default)]
pub(super) struct Closure {
    /// Ids to remove, with their node in the working copy
    pub removed: BTreeMap<String, NodeId>,
    /// Removed id -> ids of surviving-candidate elements referencing it
    pub references: BTreeMap<String, BTreeSet<String>>,
    /// Tags of every id mentioned in `references`
    pub tags: BTreeMap<String, String>,
}

impl Closure {
    fn add_reference(&mut self, removed_id: &str, referencing_id: &str, referencing_tag: &str) {
        self.references
            .entry(removed_id.to_string())
            .or_default()
            .insert(referencing_id.to_string());
        self.tags
            .insert(referencing_id.to_string(), referencing_tag.to_string());
    }
}

/// Compute everything that has to go together with `start`.
///
/// `wip` is consumed as scratch space: processed elements end up detached.
pub(super) fn compute(wip: &mut Document, start: Vec<NodeId>) -> Closure {
    let mut closure = Closure::default();
    let mut queue: VecDeque<NodeId> = start.into();

    while let Some(element) = queue.pop_front() {
        let kind = kind_of(wip, element);
        let Some(element_id) = wip.attr(element, "id").map(str::to_string) else {
            log::warn!("Skipping '{}' element without an id", wip.tag(element));
            continue;
        };

        if !kind.is_reference_only() {
            if closure.removed.contains_key(&element_id) {
                continue;
            }
            log::trace!("Removing {} '{element_id}'", wip.tag(element));
            closure.removed.insert(element_id.clone(), element);
            closure
                .tags
                .insert(element_id.clone(), wip.tag(element).to_string());

            queue.extend(referencing_elements(wip, &element_id));
            queue.extend(inner_resources(wip, element));
            for node_name in provided_node_names(wip, element) {
                queue.extend(location_constraints_for_node(wip, &node_name));
            }
            if is_stonith(wip, element) {
                for level in strip_device_from_levels(wip, &element_id, &mut closure) {
                    queue.push_back(level);
                }
            }
        }

        if let Some(parent) = wip.parent(element) {
            if is_pointless_without(wip, parent, element) {
                log::trace!("'{}' becomes pointless without '{element_id}'", wip.tag(parent));
                queue.push_back(parent);
            }
            wip.detach(element);
            if let Some(parent_id) = wip.attr(parent, "id").map(str::to_string) {
                let parent_tag = wip.tag(parent).to_string();
                closure.add_reference(&element_id, &parent_id, &parent_tag);
            }
        }
    }

    // Elements removed as a whole need no reference edits.
    let removed = &closure.removed;
    for referencing in closure.references.values_mut() {
        referencing.retain(|id| !removed.contains_key(id));
    }
    closure.references.retain(|_, referencing| !referencing.is_empty());

    closure
}

/// Elements that point at `id` without owning it.
fn referencing_elements(doc: &Document, id: &str) -> Vec<NodeId> {
    const CONSTRAINT_REFERENCE_ATTRS: [&str; 4] = ["rsc", "with-rsc", "first", "then"];

    configuration_elements(doc)
        .into_iter()
        .filter(|&node| match kind_of(doc, node) {
            kind if kind.is_constraint() => {
                doc.first_child_by_tag(node, "resource_set").is_none()
                    && CONSTRAINT_REFERENCE_ATTRS
                        .iter()
                        .any(|attr| doc.attr(node, attr) == Some(id))
            }
            ElementKind::AclPermission => doc.attr(node, "reference") == Some(id),
            ElementKind::ResourceRef | ElementKind::ObjRef | ElementKind::AclRoleRef => {
                doc.attr(node, "id") == Some(id)
            }
            _ => false,
        })
        .collect()
}

/// Location constraints placing resources on or away from a node.
fn location_constraints_for_node(doc: &Document, node_name: &str) -> Vec<NodeId> {
    configuration_elements(doc)
        .into_iter()
        .filter(|&node| {
            kind_of(doc, node) == ElementKind::Location
                && doc.attr(node, "node") == Some(node_name)
        })
        .collect()
}

/// Remove a fencing device from every level using it. Returns levels left
/// without any device.
fn strip_device_from_levels(doc: &mut Document, device: &str, closure: &mut Closure) -> Vec<NodeId> {
    let levels: Vec<NodeId> = configuration_elements(doc)
        .into_iter()
        .filter(|&node| {
            kind_of(doc, node) == ElementKind::FencingLevel
                && doc
                    .attr(node, "devices")
                    .is_some_and(|devices| devices.split(',').any(|d| d == device))
        })
        .collect();

    let mut emptied = Vec::new();
    for level in levels {
        if let Some(level_id) = doc.attr(level, "id").map(str::to_string) {
            let tag = doc.tag(level).to_string();
            closure.add_reference(device, &level_id, &tag);
        }
        if remove_device(doc, level, device) {
            emptied.push(level);
        }
    }
    emptied
}

/// Drop `device` from a level's device list. Returns true when the list is
/// empty afterwards.
pub(super) fn remove_device(doc: &mut Document, level: NodeId, device: &str) -> bool {
    let remaining: Vec<String> = doc
        .attr(level, "devices")
        .unwrap_or_default()
        .split(',')
        .filter(|d| !d.is_empty() && *d != device)
        .map(str::to_string)
        .collect();
    doc.set_attr(level, "devices", &remaining.join(","));
    remaining.is_empty()
}

/// Whether `parent` has no reason to exist once `child` is gone.
fn is_pointless_without(doc: &Document, parent: NodeId, child: NodeId) -> bool {
    let count = |tag: &str| doc.children_by_tag(parent, tag).len();
    let child_kind = kind_of(doc, child);

    match kind_of(doc, parent) {
        ElementKind::Clone | ElementKind::Master => true,
        ElementKind::Group => child_kind == ElementKind::Primitive && count("primitive") == 1,
        ElementKind::Tag => child_kind == ElementKind::ObjRef && count("obj_ref") == 1,
        ElementKind::ResourceSet => {
            child_kind == ElementKind::ResourceRef && count("resource_ref") == 1
        }
        ElementKind::Colocation | ElementKind::Order | ElementKind::Ticket => {
            child_kind == ElementKind::ResourceSet && count("resource_set") == 1
        }
        ElementKind::Location => match child_kind {
            ElementKind::Rule => count("rule") == 1,
            ElementKind::ResourceSet => count("resource_set") == 1,
            _ => false,
        },
        ElementKind::Primitive
        | ElementKind::Bundle
        | ElementKind::Rule
        | ElementKind::ResourceRef
        | ElementKind::ObjRef
        | ElementKind::AclRole
        | ElementKind::AclTarget
        | ElementKind::AclGroup
        | ElementKind::AclRoleRef
        | ElementKind::AclPermission
        | ElementKind::FencingLevel
        | ElementKind::Status
        | ElementKind::Other => false,
    }
}
