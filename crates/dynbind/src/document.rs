//! document tree
//!
//! An arena of [Node]s addressed by [NodeId]. Ids are stable: nodes are never removed and a cloned [Document]
//! shares the ids of its original, so ids collected on one copy stay valid on the other.
//!
//! Elements carry a tag, ordered attributes and children. Text nodes carry a string.
use indexmap::IndexMap;
use serde::{ser::SerializeMap, Serialize, Serializer};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    parent: Option<NodeId>,
    node: Node,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    entries: Vec<Entry>,
}

impl Document {
    /// New document consisting of a single root element
    pub fn new(root_tag: impl Into<String>) -> Self {
        Self {
            entries: vec![Entry {
                parent: None,
                node: Node::Element(Element {
                    tag: root_tag.into(),
                    ..Default::default()
                }),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// # Panic
    /// Panics if `id` was not created by this document (or the document it was cloned from)
    pub fn node(&self, id: NodeId) -> &Node {
        &self.entries[id.0].node
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entries[id.0].parent
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.node(id) {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.entries[id.0].node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|element| element.tag.as_str())
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.element(id)
            .map(|element| element.children.as_slice())
            .unwrap_or_default()
    }

    /// Create an element and append it to `parent`
    pub fn create_element(&mut self, parent: NodeId, tag: impl Into<String>) -> NodeId {
        self.append(
            parent,
            Node::Element(Element {
                tag: tag.into(),
                ..Default::default()
            }),
        )
    }

    /// Create a text node and append it to `parent`
    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.append(parent, Node::Text(text.into()))
    }

    fn append(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = NodeId(self.entries.len());
        match self.element_mut(parent) {
            Some(element) => element.children.push(id),
            None => tracing::debug!(?parent, "text nodes have no children, node stays detached"),
        }
        self.entries.push(Entry {
            parent: Some(parent),
            node,
        });
        id
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)
            .and_then(|element| element.attributes.get(name))
            .map(String::as_str)
    }

    /// Insert or replace an attribute. Ignored for text nodes.
    pub fn set_attribute(&mut self, id: NodeId, name: impl Into<String>, value: impl Into<String>) {
        if let Some(element) = self.element_mut(id) {
            element.attributes.insert(name.into(), value.into());
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.node(id) {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }

    /// Replace the text of a text node. Ignored for elements.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        if let Node::Text(existing) = &mut self.entries[id.0].node {
            *existing = text.into();
        }
    }

    /// Concatenated text of the direct text children
    pub fn inner_text(&self, id: NodeId) -> String {
        self.children(id)
            .iter()
            .filter_map(|child| self.text(*child))
            .collect()
    }

    /// First child element with the given tag
    pub fn child_element(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|child| self.tag(*child) == Some(tag))
    }

    /// Follow a `/` separated list of child tags, e.g. `dynamicValues/directValue`
    pub fn find(&self, from: NodeId, path: &str) -> Option<NodeId> {
        path.split('/')
            .filter(|tag| !tag.is_empty())
            .try_fold(from, |current, tag| self.child_element(current, tag))
    }

    /// Tags from below `root` down to (and including) `id`, joined by `/`
    ///
    /// Empty for `root` itself. Text nodes contribute nothing, so a text node has the path of its element.
    pub fn origin_path(&self, root: NodeId, id: NodeId) -> String {
        let mut tags = vec![];
        let mut current = Some(id);
        while let Some(node) = current {
            if node == root {
                break;
            }
            if let Some(tag) = self.tag(node) {
                tags.push(tag);
            }
            current = self.parent(node);
        }

        tags.reverse();
        tags.join("/")
    }

    fn fmt_node(&self, f: &mut Formatter<'_>, id: NodeId, depth: usize) -> std::fmt::Result {
        let indent = "  ".repeat(depth);
        match self.node(id) {
            Node::Text(text) => writeln!(f, "{indent}{text:?}"),
            Node::Element(element) => {
                write!(f, "{indent}{}", element.tag)?;
                for (name, value) in &element.attributes {
                    write!(f, " {name}={value:?}")?;
                }
                writeln!(f)?;
                for child in &element.children {
                    self.fmt_node(f, *child, depth + 1)?;
                }
                Ok(())
            }
        }
    }
}

/// Indented outline, one node per line
impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.fmt_node(f, self.root(), 0)
    }
}

/// Serialization view of a single node
struct NodeRef<'d> {
    document: &'d Document,
    id: NodeId,
}

impl Serialize for NodeRef<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.document.node(self.id) {
            Node::Text(text) => serializer.serialize_str(text),
            Node::Element(element) => {
                let mut ser = serializer.serialize_map(None)?;
                ser.serialize_entry("tag", &element.tag)?;
                if !element.attributes.is_empty() {
                    ser.serialize_entry("attributes", &element.attributes)?;
                }
                if !element.children.is_empty() {
                    let children: Vec<_> = element
                        .children
                        .iter()
                        .map(|child| NodeRef {
                            document: self.document,
                            id: *child,
                        })
                        .collect();
                    ser.serialize_entry("children", &children)?;
                }
                ser.end()
            }
        }
    }
}

impl Serialize for Document {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        NodeRef {
            document: self,
            id: self.root(),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> (Document, NodeId, NodeId) {
        let mut document = Document::new("config");
        let tasks = document.create_element(document.root(), "tasks");
        let build = document.create_element(tasks, "build");
        document.set_attribute(build, "timeout", "30");
        let text = document.append_text(build, "make all");
        (document, build, text)
    }

    #[test]
    fn attributes_and_text() {
        let (mut document, build, text) = sample();
        assert_eq!(document.attribute(build, "timeout"), Some("30"));
        assert_eq!(document.text(text), Some("make all"));

        document.set_attribute(build, "timeout", "60");
        document.set_text(text, "make test");
        assert_eq!(document.attribute(build, "timeout"), Some("60"));
        assert_eq!(document.inner_text(build), "make test");

        // no-ops on the wrong node kind
        document.set_text(build, "ignored");
        document.set_attribute(text, "ignored", "ignored");
        assert_eq!(document.text(build), None);
        assert_eq!(document.attribute(text, "ignored"), None);
    }

    #[test]
    fn find_and_origin_path() {
        let (document, build, text) = sample();
        let root = document.root();

        assert_eq!(document.find(root, "tasks/build"), Some(build));
        assert_eq!(document.find(root, "tasks/missing"), None);
        assert_eq!(document.find(root, ""), Some(root));

        assert_eq!(document.origin_path(root, build), "tasks/build");
        assert_eq!(document.origin_path(root, text), "tasks/build");
        assert_eq!(document.origin_path(root, root), "");

        let tasks = document.find(root, "tasks").unwrap();
        assert_eq!(document.origin_path(tasks, text), "build");
    }

    #[test]
    fn outline() {
        let (document, _, _) = sample();
        assert_eq!(
            document.to_string(),
            "config\n  tasks\n    build timeout=\"30\"\n      \"make all\"\n"
        );
    }

    #[test]
    fn serializes_as_nested_maps() {
        let (document, _, _) = sample();
        let json = serde_json::to_string(&document).unwrap();
        assert_eq!(
            json,
            r#"{"tag":"config","children":[{"tag":"tasks","children":[{"tag":"build","attributes":{"timeout":"30"},"children":["make all"]}]}]}"#
        );
    }

    #[test]
    fn clones_share_ids() {
        let (document, build, _) = sample();
        let mut copy = document.clone();
        copy.set_attribute(build, "timeout", "1");
        assert_eq!(document.attribute(build, "timeout"), Some("30"));
        assert_eq!(copy.attribute(build, "timeout"), Some("1"));
    }
}
