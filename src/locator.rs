//! Finding configuration elements by id.
//!
//! Identity search covers the whole document except the `status` section.
//! Reference-only elements (`resource_ref`, `obj_ref`, ACL `role`) carry an
//! `id` attribute naming somebody else and are never returned. A primitive
//! acting as a guest node is also found by its node name.

use crate::error::{Error, Result};
use crate::kind::{ElementKind, guest_node_name, kind_of};
use cibtree::{Document, NodeId};

/// Configuration elements, the `status` subtree excluded.
pub fn configuration_elements(doc: &Document) -> Vec<NodeId> {
    let root = doc.root();
    let mut nodes = vec![root];
    nodes.extend(doc.descendants_pruned(root, |d, n| kind_of(d, n) == ElementKind::Status));
    nodes
}

fn is_identity_match(doc: &Document, node: NodeId, id: &str) -> bool {
    doc.attr(node, "id") == Some(id) && !kind_of(doc, node).is_reference_only()
}

/// Elements whose own `id` attribute equals `id`.
pub fn find_by_id_strict(doc: &Document, id: &str) -> Vec<NodeId> {
    configuration_elements(doc)
        .into_iter()
        .filter(|&node| is_identity_match(doc, node, id))
        .collect()
}

/// Elements identified by `id`, including guest node primitives whose
/// `remote-node` meta attribute equals `id`.
///
/// More than one result means the document is broken.
pub fn find_by_id(doc: &Document, id: &str) -> Vec<NodeId> {
    configuration_elements(doc)
        .into_iter()
        .filter(|&node| is_identity_match(doc, node, id) || guest_node_name(doc, node) == Some(id))
        .collect()
}

/// The single element identified by `id`.
pub fn find_unique_by_id(doc: &Document, id: &str) -> Result<Option<NodeId>> {
    let found = find_by_id(doc, id);
    match found.as_slice() {
        [] => Ok(None),
        [node] => Ok(Some(*node)),
        _ => Err(Error::AmbiguousId {
            id: id.to_string(),
            count: found.len(),
        }),
    }
}

/// Check whether `id` identifies an element.
pub fn exists(doc: &Document, id: &str) -> bool {
    !find_by_id(doc, id).is_empty()
}

/// Batch lookup. Returns the elements found, in the order of `ids`, and
/// the ids that were not found.
pub fn find_by_ids<I, S>(doc: &Document, ids: I) -> Result<(Vec<NodeId>, Vec<String>)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut found = Vec::new();
    let mut missing = Vec::new();
    for id in ids {
        let id = id.as_ref();
        match find_unique_by_id(doc, id)? {
            Some(node) => found.push(node),
            None => missing.push(id.to_string()),
        }
    }
    Ok((found, missing))
}

/// Follow a path of child tags from the root, accepting documents rooted
/// either at `cib` or directly at `configuration`.
pub fn section(doc: &Document, path: &[&str]) -> Result<NodeId> {
    let mut path = path;
    if let Some((first, rest)) = path.split_first()
        && doc.tag(doc.root()) == *first
    {
        path = rest;
    }
    let mut current = doc.root();
    for tag in path {
        current = doc
            .first_child_by_tag(current, tag)
            .ok_or_else(|| Error::MissingSection(tag.to_string()))?;
    }
    Ok(current)
}

/// The `configuration/constraints` section.
pub fn constraints_section(doc: &Document) -> Result<NodeId> {
    section(doc, &["configuration", "constraints"])
}

/// The `configuration/resources` section.
pub fn resources_section(doc: &Document) -> Result<NodeId> {
    section(doc, &["configuration", "resources"])
}

#[cfg(test)]
mod tests {
    use super::*;

    const CIB: &str = r#"
        <cib>
          <configuration>
            <resources>
              <primitive id="R1"/>
              <primitive id="vm1">
                <meta_attributes id="vm1-meta">
                  <nvpair id="vm1-meta-rn" name="remote-node" value="guest1"/>
                </meta_attributes>
              </primitive>
            </resources>
            <constraints>
              <rsc_order id="o1">
                <resource_set id="o1-set">
                  <resource_ref id="R1"/>
                </resource_set>
              </rsc_order>
            </constraints>
            <tags><tag id="T1"><obj_ref id="R1"/></tag></tags>
            <acls>
              <acl_target id="user1"><role id="role1"/></acl_target>
              <acl_role id="role1"/>
            </acls>
          </configuration>
          <status>
            <node_state id="R1"/>
          </status>
        </cib>"#;

    #[test]
    fn test_find_skips_references_and_status() {
        let doc = Document::parse(CIB).unwrap();
        let found = find_by_id(&doc, "R1");
        assert_eq!(found.len(), 1);
        assert_eq!(doc.tag(found[0]), "primitive");

        let found = find_by_id(&doc, "role1");
        assert_eq!(found.len(), 1);
        assert_eq!(doc.tag(found[0]), "acl_role");
    }

    #[test]
    fn test_find_guest_node_by_name() {
        let doc = Document::parse(CIB).unwrap();
        let found = find_by_id(&doc, "guest1");
        assert_eq!(found.len(), 1);
        assert_eq!(doc.attr(found[0], "id"), Some("vm1"));
        assert!(find_by_id_strict(&doc, "guest1").is_empty());
    }

    #[test]
    fn test_find_by_ids() {
        let doc = Document::parse(CIB).unwrap();
        let (found, missing) = find_by_ids(&doc, ["o1", "nope", "T1"]).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(doc.tag(found[0]), "rsc_order");
        assert_eq!(doc.tag(found[1]), "tag");
        assert_eq!(missing, vec!["nope".to_string()]);
    }

    #[test]
    fn test_ambiguous_id() {
        let doc = Document::parse(r#"<cib><a id="x"/><b id="x"/></cib>"#).unwrap();
        let err = find_unique_by_id(&doc, "x").unwrap_err();
        assert!(matches!(err, Error::AmbiguousId { count: 2, .. }));
    }

    #[test]
    fn test_exists() {
        let doc = Document::parse(CIB).unwrap();
        assert!(exists(&doc, "o1-set"));
        assert!(!exists(&doc, "user2"));
    }

    #[test]
    fn test_section() {
        let doc = Document::parse(CIB).unwrap();
        let constraints = constraints_section(&doc).unwrap();
        assert_eq!(doc.tag(constraints), "constraints");

        let bare = Document::parse("<configuration><constraints/></configuration>").unwrap();
        assert!(constraints_section(&bare).is_ok());

        let empty = Document::parse("<cib/>").unwrap();
        assert!(matches!(
            resources_section(&empty),
            Err(Error::MissingSection(name)) if name == "configuration"
        ));
    }
}
