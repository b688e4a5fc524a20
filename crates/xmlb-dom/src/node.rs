//! Read access shared by the mutable and the read-only tree.
//!
//! Everything that consumes markup (bindings, include resolution) is generic
//! over [`Node`], so both [`crate::Element`] and [`crate::XmlElement`] can be
//! fed to the same code.

use crate::element::Element;

/// A child of a node: either an element or a text run.
#[derive(Debug)]
pub enum NodeRef<'a, N: ?Sized> {
    Element(&'a N),
    Text(&'a str),
}

impl<N: ?Sized> Clone for NodeRef<'_, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N: ?Sized> Copy for NodeRef<'_, N> {}

/// Read-only view of an element.
pub trait Node: Sized {
    /// Tag name.
    fn name(&self) -> &str;

    fn attribute(&self, name: &str) -> Option<&str>;

    /// Attributes in document order.
    fn attributes(&self) -> impl Iterator<Item = (&str, &str)>;

    /// Content in document order.
    fn child_nodes(&self) -> impl Iterator<Item = NodeRef<'_, Self>>;

    /// Deep copy into the mutable representation.
    fn to_element(&self) -> Element;

    /// Child elements in document order.
    fn child_elements(&self) -> impl Iterator<Item = &Self> {
        self.child_nodes().filter_map(|c| match c {
            NodeRef::Element(e) => Some(e),
            NodeRef::Text(_) => None,
        })
    }

    fn first_child(&self, name: &str) -> Option<&Self> {
        self.child_elements().find(|e| e.name() == name)
    }

    /// Concatenated direct text content.
    fn text_content(&self) -> String {
        let mut out = String::new();
        for c in self.child_nodes() {
            if let NodeRef::Text(t) = c {
                out.push_str(t);
            }
        }
        out
    }

    fn has_attributes(&self) -> bool {
        self.attributes().next().is_some()
    }

    /// True when the node has neither attributes nor content.
    fn is_blank(&self) -> bool {
        !self.has_attributes() && self.child_nodes().next().is_none()
    }
}
