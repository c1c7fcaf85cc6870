//! Element kinds of the CIB.
//!
//! Every decision that depends on what an element *is* goes through
//! [`ElementKind`] rather than comparing tag strings at the call site.

use cibtree::{Document, NodeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of CIB elements this crate reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Primitive,
    Group,
    Clone,
    /// Legacy promotable clone
    Master,
    Bundle,
    Colocation,
    Order,
    Ticket,
    Location,
    ResourceSet,
    /// `resource_ref`, a reference to a resource from a set
    ResourceRef,
    Rule,
    Tag,
    /// `obj_ref`, a reference to an element from a tag
    ObjRef,
    AclRole,
    AclTarget,
    AclGroup,
    /// `role` below an ACL target or group, a reference to an ACL role
    AclRoleRef,
    AclPermission,
    FencingLevel,
    Status,
    /// Anything not listed above
    Other,
}

impl ElementKind {
    /// Classify a tag name.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "primitive" => Self::Primitive,
            "group" => Self::Group,
            "clone" => Self::Clone,
            "master" => Self::Master,
            "bundle" => Self::Bundle,
            "rsc_colocation" => Self::Colocation,
            "rsc_order" => Self::Order,
            "rsc_ticket" => Self::Ticket,
            "rsc_location" => Self::Location,
            "resource_set" => Self::ResourceSet,
            "resource_ref" => Self::ResourceRef,
            "rule" => Self::Rule,
            "tag" => Self::Tag,
            "obj_ref" => Self::ObjRef,
            "acl_role" => Self::AclRole,
            "acl_target" => Self::AclTarget,
            "acl_group" => Self::AclGroup,
            "role" | "role_ref" => Self::AclRoleRef,
            "acl_permission" => Self::AclPermission,
            "fencing-level" => Self::FencingLevel,
            "status" => Self::Status,
            _ => Self::Other,
        }
    }

    /// Canonical tag for kinds that map to exactly one tag.
    pub fn tag(&self) -> Option<&'static str> {
        let tag = match self {
            Self::Primitive => "primitive",
            Self::Group => "group",
            Self::Clone => "clone",
            Self::Master => "master",
            Self::Bundle => "bundle",
            Self::Colocation => "rsc_colocation",
            Self::Order => "rsc_order",
            Self::Ticket => "rsc_ticket",
            Self::Location => "rsc_location",
            Self::ResourceSet => "resource_set",
            Self::ResourceRef => "resource_ref",
            Self::Rule => "rule",
            Self::Tag => "tag",
            Self::ObjRef => "obj_ref",
            Self::AclRole => "acl_role",
            Self::AclTarget => "acl_target",
            Self::AclGroup => "acl_group",
            Self::AclRoleRef => "role",
            Self::AclPermission => "acl_permission",
            Self::FencingLevel => "fencing-level",
            Self::Status => "status",
            Self::Other => return None,
        };
        Some(tag)
    }

    /// Check if this kind is a resource of any type.
    pub fn is_resource(&self) -> bool {
        matches!(
            self,
            Self::Primitive | Self::Group | Self::Clone | Self::Master | Self::Bundle
        )
    }

    /// Check if this kind is a clone of any flavor.
    pub fn is_any_clone(&self) -> bool {
        matches!(self, Self::Clone | Self::Master)
    }

    /// Check if resources inside this kind run as several instances.
    pub fn is_multi_instance(&self) -> bool {
        matches!(self, Self::Clone | Self::Master | Self::Bundle)
    }

    /// Check if this kind is a constraint.
    pub fn is_constraint(&self) -> bool {
        matches!(
            self,
            Self::Colocation | Self::Order | Self::Ticket | Self::Location
        )
    }

    /// Elements whose `id` attribute names another element instead of
    /// identifying themselves.
    pub fn is_reference_only(&self) -> bool {
        matches!(self, Self::ResourceRef | Self::ObjRef | Self::AclRoleRef)
    }

    /// Short human description used in reports.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Primitive => "primitive",
            Self::Group => "group",
            Self::Clone => "clone",
            Self::Master => "clone",
            Self::Bundle => "bundle",
            Self::Colocation => "colocation constraint",
            Self::Order => "order constraint",
            Self::Ticket => "ticket constraint",
            Self::Location => "location constraint",
            Self::ResourceSet => "resource set",
            Self::ResourceRef => "resource reference",
            Self::Rule => "rule",
            Self::Tag => "tag",
            Self::ObjRef => "tag reference",
            Self::AclRole => "acl role",
            Self::AclTarget => "acl target",
            Self::AclGroup => "acl group",
            Self::AclRoleRef => "acl role reference",
            Self::AclPermission => "acl permission",
            Self::FencingLevel => "fencing level",
            Self::Status => "status",
            Self::Other => "element",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Kind of a node.
pub fn kind_of(doc: &Document, node: NodeId) -> ElementKind {
    ElementKind::from_tag(doc.tag(node))
}

/// Check if a node is a resource.
pub fn is_resource(doc: &Document, node: NodeId) -> bool {
    kind_of(doc, node).is_resource()
}

/// Check if a node is a fencing device.
pub fn is_stonith(doc: &Document, node: NodeId) -> bool {
    kind_of(doc, node) == ElementKind::Primitive && doc.attr(node, "class") == Some("stonith")
}

/// Check if a constraint is defined through resource sets.
pub fn has_resource_sets(doc: &Document, constraint: NodeId) -> bool {
    doc.first_child_by_tag(constraint, "resource_set").is_some()
}

/// Check if a node is a top-level rule of a location constraint.
pub fn is_location_rule(doc: &Document, node: NodeId) -> bool {
    kind_of(doc, node) == ElementKind::Rule
        && doc
            .parent(node)
            .is_some_and(|parent| kind_of(doc, parent) == ElementKind::Location)
}

/// Resources directly contained in a resource.
pub fn inner_resources(doc: &Document, resource: NodeId) -> Vec<NodeId> {
    if !is_resource(doc, resource) {
        return Vec::new();
    }
    doc.children(resource)
        .iter()
        .copied()
        .filter(|&child| is_resource(doc, child))
        .collect()
}

/// The closest clone, master or bundle containing a resource.
pub fn multi_instance_parent(doc: &Document, resource: NodeId) -> Option<NodeId> {
    doc.ancestors(resource)
        .into_iter()
        .find(|&ancestor| kind_of(doc, ancestor).is_multi_instance())
}

/// Value of a `meta_attributes` nvpair of a resource.
pub fn meta_attribute<'a>(doc: &'a Document, resource: NodeId, name: &str) -> Option<&'a str> {
    doc.children_by_tag(resource, "meta_attributes")
        .into_iter()
        .flat_map(|meta| doc.children_by_tag(meta, "nvpair"))
        .find(|&nvpair| doc.attr(nvpair, "name") == Some(name))
        .and_then(|nvpair| doc.attr(nvpair, "value"))
}

/// Node name of a primitive acting as a guest node.
pub fn guest_node_name<'a>(doc: &'a Document, resource: NodeId) -> Option<&'a str> {
    if kind_of(doc, resource) != ElementKind::Primitive {
        return None;
    }
    meta_attribute(doc, resource, "remote-node")
}

/// Node name of a primitive acting as a remote node.
pub fn remote_node_name<'a>(doc: &'a Document, resource: NodeId) -> Option<&'a str> {
    let is_remote = kind_of(doc, resource) == ElementKind::Primitive
        && doc.attr(resource, "class") == Some("ocf")
        && doc.attr(resource, "provider") == Some("pacemaker")
        && doc.attr(resource, "type") == Some("remote");
    if is_remote { doc.attr(resource, "id") } else { None }
}

/// Cluster node names a resource provides, as a guest or remote node.
pub fn provided_node_names(doc: &Document, resource: NodeId) -> Vec<String> {
    [guest_node_name(doc, resource), remote_node_name(doc, resource)]
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag_roundtrip() {
        for kind in [
            ElementKind::Primitive,
            ElementKind::Master,
            ElementKind::Ticket,
            ElementKind::ResourceRef,
            ElementKind::AclRoleRef,
            ElementKind::FencingLevel,
        ] {
            let tag = kind.tag().unwrap();
            assert_eq!(ElementKind::from_tag(tag), kind);
        }
        assert_eq!(ElementKind::from_tag("nvpair"), ElementKind::Other);
        assert_eq!(ElementKind::Other.tag(), None);
    }

    #[test]
    fn test_predicates() {
        assert!(ElementKind::Bundle.is_resource());
        assert!(ElementKind::Bundle.is_multi_instance());
        assert!(!ElementKind::Bundle.is_any_clone());
        assert!(ElementKind::Location.is_constraint());
        assert!(!ElementKind::ResourceSet.is_constraint());
        assert!(ElementKind::ObjRef.is_reference_only());
        assert!(!ElementKind::AclRole.is_reference_only());
    }

    #[test]
    fn test_node_names() {
        let doc = Document::parse(
            r#"<resources>
                <primitive id="vm" class="ocf" provider="heartbeat" type="VirtualDomain">
                  <meta_attributes id="vm-meta">
                    <nvpair id="vm-meta-rn" name="remote-node" value="guest1"/>
                  </meta_attributes>
                </primitive>
                <primitive id="rn1" class="ocf" provider="pacemaker" type="remote"/>
                <primitive id="d1" class="stonith" type="fence_xvm"/>
              </resources>"#,
        )
        .unwrap();
        let resources = doc.children(doc.root()).to_vec();
        assert_eq!(provided_node_names(&doc, resources[0]), vec!["guest1"]);
        assert_eq!(provided_node_names(&doc, resources[1]), vec!["rn1"]);
        assert!(provided_node_names(&doc, resources[2]).is_empty());
        assert!(is_stonith(&doc, resources[2]));
        assert!(!is_stonith(&doc, resources[0]));
    }

    #[test]
    fn test_multi_instance_parent() {
        let doc = Document::parse(
            r#"<clone id="C"><group id="G"><primitive id="R"/></group></clone>"#,
        )
        .unwrap();
        let group = doc.children(doc.root())[0];
        let primitive = doc.children(group)[0];
        assert_eq!(multi_instance_parent(&doc, primitive), Some(doc.root()));
        assert_eq!(inner_resources(&doc, group), vec![primitive]);
        assert_eq!(multi_instance_parent(&doc, doc.root()), None);
    }
}
