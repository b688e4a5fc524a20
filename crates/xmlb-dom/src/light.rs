//! Lightweight read-only markup tree.
//!
//! [`XmlElement`] is immutable and shares its storage behind an `Arc`, so
//! clones are cheap and trees can be handed across threads. It is produced
//! directly by [`crate::reader::parse_light`] or frozen from an [`Element`].

use std::sync::Arc;

use crate::element::{Content, Element};
use crate::node::{Node, NodeRef};

#[derive(Debug, PartialEq, Eq)]
struct Inner {
    name: Box<str>,
    attributes: Box<[(Box<str>, Box<str>)]>,
    content: Box<[XmlContent]>,
}

/// Content item of an [`XmlElement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlContent {
    Element(XmlElement),
    Text(Box<str>),
}

/// Immutable element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement(Arc<Inner>);

impl XmlElement {
    pub(crate) fn from_parts(
        name: String,
        attributes: Vec<(String, String)>,
        content: Vec<XmlContent>,
    ) -> Self {
        XmlElement(Arc::new(Inner {
            name: name.into_boxed_str(),
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.into_boxed_str(), v.into_boxed_str()))
                .collect(),
            content: content.into_boxed_slice(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.0
            .attributes
            .iter()
            .find(|(k, _)| &**k == name)
            .map(|(_, v)| &**v)
    }

    pub fn content(&self) -> &[XmlContent] {
        &self.0.content
    }

    pub fn children(&self) -> impl Iterator<Item = &XmlElement> {
        self.0.content.iter().filter_map(|c| match c {
            XmlContent::Element(e) => Some(e),
            XmlContent::Text(_) => None,
        })
    }
}

impl From<Element> for XmlElement {
    fn from(mut element: Element) -> Self {
        let attributes = element
            .attributes()
            .iter()
            .map(|a| (a.name.clone(), a.value.clone()))
            .collect();
        let content = element
            .take_content()
            .into_iter()
            .map(|c| match c {
                Content::Element(e) => XmlContent::Element(XmlElement::from(e)),
                Content::Text(t) => XmlContent::Text(t.into_boxed_str()),
            })
            .collect();
        XmlElement::from_parts(element.name().to_string(), attributes, content)
    }
}

impl From<&Element> for XmlElement {
    fn from(element: &Element) -> Self {
        XmlElement::from(element.clone())
    }
}

impl Node for XmlElement {
    fn name(&self) -> &str {
        &self.0.name
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        XmlElement::attribute(self, name)
    }

    fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.attributes.iter().map(|(k, v)| (&**k, &**v))
    }

    fn child_nodes(&self) -> impl Iterator<Item = NodeRef<'_, Self>> {
        self.0.content.iter().map(|c| match c {
            XmlContent::Element(e) => NodeRef::Element(e),
            XmlContent::Text(t) => NodeRef::Text(&**t),
        })
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new(self.name());
        for (k, v) in self.0.attributes.iter() {
            element.set_attribute(&**k, &**v);
        }
        for c in self.0.content.iter() {
            match c {
                XmlContent::Element(e) => {
                    element.add_child(e.to_element());
                }
                XmlContent::Text(t) => {
                    element.add_text(&**t);
                }
            }
        }
        element
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freeze_and_thaw_preserve_tree() {
        let mut e = Element::new("root").with_attribute("a", "1");
        e.add_child(Element::new("child").with_attribute("b", "2"));
        e.add_text("tail");

        let light = XmlElement::from(&e);
        assert_eq!(light.name(), "root");
        assert_eq!(light.attribute("a"), Some("1"));
        assert_eq!(light.children().count(), 1);
        assert_eq!(light.text_content(), "tail");
        assert_eq!(light.to_element(), e);
    }

    #[test]
    fn test_clone_shares_storage() {
        let light = XmlElement::from(Element::new("x"));
        let other = light.clone();
        assert!(Arc::ptr_eq(&light.0, &other.0));
    }
}
