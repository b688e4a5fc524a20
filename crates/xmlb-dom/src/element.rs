//! The mutable markup tree.
//!
//! An [`Element`] owns an ordered list of attributes and an ordered list of
//! content items (child elements and text runs). Attribute names are unique
//! within one element: [`Element::set_attribute`] replaces an existing value
//! in place, keeping its position.

use std::fmt;

use crate::node::{Node, NodeRef};

/// A single `name="value"` pair on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// One item of element content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Element(Element),
    Text(String),
}

/// A mutable XML element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    name: String,
    attributes: Vec<Attribute>,
    content: Vec<Content>,
}

impl Element {
    /// Creates an empty element with the given tag name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            content: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Returns the value of the named attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Sets an attribute, replacing the value of an existing one with the same name.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
    }

    /// Builder-style variant of [`Element::set_attribute`].
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Removes the named attribute, returning its value.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|a| a.name == name)?;
        Some(self.attributes.remove(index).value)
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    pub fn content(&self) -> &[Content] {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut Vec<Content> {
        &mut self.content
    }

    /// Iterates over child elements, skipping text.
    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.content.iter().filter_map(|c| match c {
            Content::Element(e) => Some(e),
            Content::Text(_) => None,
        })
    }

    /// Iterates over the child elements with the given tag name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children().filter(move |e| e.name == name)
    }

    /// Returns the first child element with the given tag name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children().find(|e| e.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.content.iter_mut().find_map(|c| match c {
            Content::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    pub fn add_child(&mut self, child: Element) -> &mut Self {
        self.content.push(Content::Element(child));
        self
    }

    /// Builder-style variant of [`Element::add_child`].
    pub fn with_child(mut self, child: Element) -> Self {
        self.add_child(child);
        self
    }

    pub fn add_text(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        if !text.is_empty() {
            self.content.push(Content::Text(text));
        }
        self
    }

    /// Replaces all content with a single text run.
    pub fn set_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.content.clear();
        self.add_text(text)
    }

    /// Concatenation of the direct text runs of this element.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for c in &self.content {
            if let Content::Text(t) = c {
                out.push_str(t);
            }
        }
        out
    }

    /// Removes and returns all content.
    pub fn take_content(&mut self) -> Vec<Content> {
        std::mem::take(&mut self.content)
    }

    /// True when the element carries no attributes and no content.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.content.is_empty()
    }

    /// Generic JSON view of the tree: `{"name":..,"attributes":{..},"content":[..]}`.
    ///
    /// This is a raw structural dump, independent of any bean binding.
    pub fn to_json(&self) -> serde_json::Value {
        let mut attributes = serde_json::Map::new();
        for a in &self.attributes {
            attributes.insert(a.name.clone(), serde_json::Value::String(a.value.clone()));
        }
        let content: Vec<serde_json::Value> = self
            .content
            .iter()
            .map(|c| match c {
                Content::Element(e) => e.to_json(),
                Content::Text(t) => serde_json::Value::String(t.clone()),
            })
            .collect();
        serde_json::json!({
            "name": self.name,
            "attributes": attributes,
            "content": content,
        })
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match crate::writer::to_string_with_indent(self, 0) {
            Ok(s) => f.write_str(&s),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl Node for Element {
    fn name(&self) -> &str {
        &self.name
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        Element::attribute(self, name)
    }

    fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|a| (a.name.as_str(), a.value.as_str()))
    }

    fn child_nodes(&self) -> impl Iterator<Item = NodeRef<'_, Self>> {
        self.content.iter().map(|c| match c {
            Content::Element(e) => NodeRef::Element(e),
            Content::Text(t) => NodeRef::Text(t.as_str()),
        })
    }

    fn to_element(&self) -> Element {
        self.clone()
    }
}
