use super::VisitMut;
use crate::document::{Document, Node, NodeId};

/// Where a piece of text lives
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    Text(NodeId),
    Attribute { element: NodeId, name: String },
}

/// A text node or attribute value handed to a visitor
///
/// Changes to `text` are written back to the document after the visitor returns.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSite {
    pub location: Location,
    /// `/` joined tags from below the visited root, attributes append their name
    pub origin: String,
    pub text: String,
}

/// Visit every attribute value and text node below a root in document order
///
/// Per element its attributes come first (in order), then its children.
pub trait VisitTextMut {
    fn visit_text_mut(&mut self, root: NodeId, visitor: &mut dyn VisitMut<TextSite>);
}

impl VisitTextMut for Document {
    fn visit_text_mut(&mut self, root: NodeId, visitor: &mut dyn VisitMut<TextSite>) {
        let mut locations = vec![];
        collect_locations(self, root, &mut locations);

        for location in locations {
            let (origin, text) = match &location {
                Location::Text(id) => (
                    self.origin_path(root, *id),
                    self.text(*id).unwrap_or_default().to_string(),
                ),
                Location::Attribute { element, name } => {
                    let element_path = self.origin_path(root, *element);
                    let origin = if element_path.is_empty() {
                        name.clone()
                    } else {
                        format!("{element_path}/{name}")
                    };
                    (
                        origin,
                        self.attribute(*element, name).unwrap_or_default().to_string(),
                    )
                }
            };

            let original = text.clone();
            let mut site = TextSite {
                location,
                origin,
                text,
            };
            visitor.visit_mut(&mut site);

            if site.text == original {
                continue;
            }

            tracing::trace!(origin = site.origin.as_str(), "text rewritten");
            match site.location {
                Location::Text(id) => self.set_text(id, site.text),
                Location::Attribute { element, name } => {
                    self.set_attribute(element, name, site.text)
                }
            }
        }
    }
}

fn collect_locations(document: &Document, id: NodeId, out: &mut Vec<Location>) {
    match document.node(id) {
        Node::Text(_) => out.push(Location::Text(id)),
        Node::Element(element) => {
            out.extend(element.attributes.keys().map(|name| Location::Attribute {
                element: id,
                name: name.clone(),
            }));
            for child in &element.children {
                collect_locations(document, *child, out);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn document_order_and_write_back() {
        let mut document = Document::new("config");
        let root = document.root();
        document.set_attribute(root, "version", "1");
        let task = document.create_element(root, "task");
        document.set_attribute(task, "name", "build");
        document.set_attribute(task, "timeout", "30");
        let text = document.append_text(task, "make");

        let mut visited = vec![];
        document.visit_text_mut(root, &mut |site: &mut TextSite| {
            visited.push(site.origin.clone());
            site.text = site.text.to_uppercase();
        });

        assert_eq!(
            visited,
            vec!["version", "task/name", "task/timeout", "task"]
        );
        assert_eq!(document.attribute(task, "name"), Some("BUILD"));
        assert_eq!(document.text(text), Some("MAKE"));
    }
}
