//! Read-only tree view over an XML document.
//!
//! The model only needs a tag name, attribute lookup, ordered element
//! children and a parent link. Any tree library can back it; `roxmltree`
//! is wired in below.

use std::fmt;

use storyline_core::{Result, StorylineError};

/// A cheap, copyable handle to an element in an immutable document.
pub trait XmlNode: Copy + PartialEq + fmt::Debug + Send + Sync {
    /// Local tag name, e.g. `asset-clip`.
    fn tag(&self) -> &str;

    /// Attribute value by name.
    fn attribute(&self, name: &str) -> Option<&str>;

    /// Element children in document order. Text and comments are skipped.
    fn children(&self) -> Vec<Self>;

    /// Parent element, `None` at the document root.
    fn parent(&self) -> Option<Self>;

    /// First child element with the given tag.
    fn first_child(&self, tag: &str) -> Option<Self> {
        self.children().into_iter().find(|child| child.tag() == tag)
    }

    /// All child elements with the given tag.
    fn children_named(&self, tag: &str) -> Vec<Self> {
        self.children()
            .into_iter()
            .filter(|child| child.tag() == tag)
            .collect()
    }

    /// Ancestors via parent links, furthest (document root) first.
    fn ancestors(&self) -> Vec<Self> {
        let mut chain = Vec::new();
        let mut current = self.parent();
        while let Some(node) = current {
            chain.push(node);
            current = node.parent();
        }
        chain.reverse();
        chain
    }
}

impl<'a, 'input: 'a> XmlNode for roxmltree::Node<'a, 'input> {
    fn tag(&self) -> &str {
        self.tag_name().name()
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        roxmltree::Node::attribute(self, name)
    }

    fn children(&self) -> Vec<Self> {
        roxmltree::Node::children(self)
            .filter(|child| child.is_element())
            .collect()
    }

    fn parent(&self) -> Option<Self> {
        self.parent_element()
    }
}

/// Parse XML text into a `roxmltree` document.
pub fn parse_xml(text: &str) -> Result<roxmltree::Document<'_>> {
    roxmltree::Document::parse(text).map_err(|e| StorylineError::Xml(e.to_string()))
}

/// Short human-readable description of a node for diagnostics:
/// `asset-clip "Interview"`.
pub fn describe<N: XmlNode>(node: N) -> String {
    match node.attribute("name").or_else(|| node.attribute("value")) {
        Some(name) => format!("{} \"{}\"", node.tag(), name),
        None => match node.attribute("id") {
            Some(id) => format!("{} #{}", node.tag(), id),
            None => node.tag().to_string(),
        },
    }
}
