//! Arena-backed element tree.
//!
//! Nodes live in a flat arena and are addressed by [`NodeId`]. Detaching a
//! node only unlinks it from its parent; the node stays in the arena but is
//! no longer reachable from the root, so every traversal starting at the
//! root stops seeing it. Cloning a [`Document`] copies the arena, which keeps
//! node handles valid across the copy.

/// Handle of a node inside a [`Document`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    text: Option<String>,
}

impl Node {
    fn new(tag: &str, parent: Option<NodeId>) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
            parent,
            text: None,
        }
    }
}

/// A mutable, ordered, attributed element tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    /// Create a document holding only a root element.
    pub fn new(root_tag: &str) -> Self {
        Self {
            nodes: vec![Node::new(root_tag, None)],
            root: NodeId(0),
        }
    }

    /// The root element.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Tag name of a node.
    pub fn tag(&self, id: NodeId) -> &str {
        &self.nodes[id.0].tag
    }

    /// Value of an attribute, if present.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0]
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Check whether an attribute is present.
    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// All attributes in document order.
    pub fn attrs(&self, id: NodeId) -> &[(String, String)] {
        &self.nodes[id.0].attributes
    }

    /// Set an attribute, keeping its position when it already exists.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        let attributes = &mut self.nodes[id.0].attributes;
        if let Some((_, existing)) = attributes.iter_mut().find(|(key, _)| key == name) {
            *existing = value.to_string();
        } else {
            attributes.push((name.to_string(), value.to_string()));
        }
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        let attributes = &mut self.nodes[id.0].attributes;
        let pos = attributes.iter().position(|(key, _)| key == name)?;
        Some(attributes.remove(pos).1)
    }

    /// Text content of a node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].text.as_deref()
    }

    /// Replace the text content of a node.
    pub fn set_text(&mut self, id: NodeId, text: Option<&str>) {
        self.nodes[id.0].text = text.map(str::to_string);
    }

    /// Child elements in document order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Child elements carrying the given tag.
    pub fn children_by_tag(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.tag(child) == tag)
            .collect()
    }

    /// First child element carrying the given tag.
    pub fn first_child_by_tag(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&child| self.tag(child) == tag)
    }

    /// Parent element, `None` for the root and for detached nodes.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Ancestors from the parent up to the topmost reachable element.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = self.parent(id);
        while let Some(node) = current {
            result.push(node);
            current = self.parent(node);
        }
        result
    }

    /// Whether the node is still reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root || self.ancestors(id).last() == Some(&self.root)
    }

    /// All descendants of a node in preorder, the node itself excluded.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            result.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        result
    }

    /// Descendants of a node in preorder, skipping whole subtrees for which
    /// `prune` returns true.
    pub fn descendants_pruned<F>(&self, id: NodeId, prune: F) -> Vec<NodeId>
    where
        F: Fn(&Self, NodeId) -> bool,
    {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if prune(self, node) {
                continue;
            }
            result.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        result
    }

    /// Append a new child element and return its handle.
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(tag, Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Append a new child element with attributes.
    pub fn append_element_with_attrs(
        &mut self,
        parent: NodeId,
        tag: &str,
        attributes: &[(&str, &str)],
    ) -> NodeId {
        let id = self.append_element(parent, tag);
        for (name, value) in attributes {
            self.set_attr(id, name, value);
        }
        id
    }

    /// Unlink a node from its parent. Detaching the root or an already
    /// detached node does nothing.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.0].parent.take() else {
            return;
        };
        self.nodes[parent.0].children.retain(|&child| child != id);
    }

    /// Number of nodes reachable from the root, the root included.
    pub fn len(&self) -> usize {
        self.descendants(self.root).len() + 1
    }

    /// A document always holds its root element.
    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new("cib");
        let configuration = doc.append_element(doc.root(), "configuration");
        let resources = doc.append_element(configuration, "resources");
        let primitive = doc.append_element_with_attrs(resources, "primitive", &[("id", "R1")]);
        (doc, configuration, resources, primitive)
    }

    #[test]
    fn test_set_attr_keeps_position() {
        let (mut doc, _, _, primitive) = sample();
        doc.set_attr(primitive, "class", "ocf");
        doc.set_attr(primitive, "id", "R2");
        let names: Vec<_> = doc.attrs(primitive).iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["id", "class"]);
        assert_eq!(doc.attr(primitive, "id"), Some("R2"));
    }

    #[test]
    fn test_remove_attr() {
        let (mut doc, _, _, primitive) = sample();
        assert_eq!(doc.remove_attr(primitive, "id"), Some("R1".to_string()));
        assert_eq!(doc.remove_attr(primitive, "id"), None);
        assert!(!doc.has_attr(primitive, "id"));
    }

    #[test]
    fn test_detach_hides_subtree() {
        let (mut doc, configuration, resources, primitive) = sample();
        doc.detach(resources);
        assert!(!doc.is_attached(resources));
        assert!(!doc.is_attached(primitive));
        assert!(doc.descendants(doc.root()).iter().all(|&n| n == configuration));
        assert_eq!(doc.parent(resources), None);
        // still linked below the detached node
        assert_eq!(doc.parent(primitive), Some(resources));
    }

    #[test]
    fn test_detach_root_is_noop() {
        let (mut doc, ..) = sample();
        let root = doc.root();
        doc.detach(root);
        assert!(doc.is_attached(root));
        assert_eq!(doc.len(), 4);
    }

    #[test]
    fn test_clone_keeps_handles() {
        let (doc, _, _, primitive) = sample();
        let mut copy = doc.clone();
        copy.detach(primitive);
        assert!(doc.is_attached(primitive));
        assert!(!copy.is_attached(primitive));
        assert_eq!(copy.attr(primitive, "id"), Some("R1"));
    }

    #[test]
    fn test_descendants_preorder() {
        let (mut doc, configuration, resources, primitive) = sample();
        let constraints = doc.append_element(configuration, "constraints");
        assert_eq!(
            doc.descendants(doc.root()),
            vec![configuration, resources, primitive, constraints]
        );
    }

    #[test]
    fn test_descendants_pruned() {
        let (mut doc, configuration, _, _) = sample();
        let constraints = doc.append_element(configuration, "constraints");
        let found = doc.descendants_pruned(doc.root(), |d, n| d.tag(n) == "resources");
        assert_eq!(found, vec![configuration, constraints]);
    }
}
