//! Building markup trees from XML text with quick-xml.
//!
//! Whitespace-only text runs are dropped; all other text is kept verbatim
//! (adjacent text, CDATA and entity references are merged into one run).
//! Comments, processing instructions and the declaration are skipped.

use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::element::Element;
use crate::error::{DomError, Result};
use crate::light::{XmlContent, XmlElement};

/// Parses a document into a mutable [`Element`] tree.
pub fn parse_str(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    build(&mut reader, &mut Vec::new(), &MutableSink)
}

/// Parses a document from any buffered reader.
pub fn parse_reader<R: BufRead>(input: R) -> Result<Element> {
    let mut reader = Reader::from_reader(input);
    build(&mut reader, &mut Vec::new(), &MutableSink)
}

/// Parses a document into the read-only [`XmlElement`] tree.
pub fn parse_light(xml: &str) -> Result<XmlElement> {
    let mut reader = Reader::from_str(xml);
    build(&mut reader, &mut Vec::new(), &LightSink)
}

enum Item<T> {
    Element(T),
    Text(String),
}

/// Assembles finished elements of one tree representation.
trait Sink {
    type Out;

    fn finish(&self, name: String, attributes: Vec<(String, String)>, content: Vec<Item<Self::Out>>)
    -> Self::Out;
}

struct MutableSink;

impl Sink for MutableSink {
    type Out = Element;

    fn finish(
        &self,
        name: String,
        attributes: Vec<(String, String)>,
        content: Vec<Item<Element>>,
    ) -> Element {
        let mut element = Element::new(name);
        for (k, v) in attributes {
            element.set_attribute(k, v);
        }
        for item in content {
            match item {
                Item::Element(e) => {
                    element.add_child(e);
                }
                Item::Text(t) => {
                    element.add_text(t);
                }
            }
        }
        element
    }
}

struct LightSink;

impl Sink for LightSink {
    type Out = XmlElement;

    fn finish(
        &self,
        name: String,
        attributes: Vec<(String, String)>,
        content: Vec<Item<XmlElement>>,
    ) -> XmlElement {
        let content = content
            .into_iter()
            .map(|item| match item {
                Item::Element(e) => XmlContent::Element(e),
                Item::Text(t) => XmlContent::Text(t.into_boxed_str()),
            })
            .collect();
        XmlElement::from_parts(name, attributes, content)
    }
}

struct Frame<T> {
    name: String,
    attributes: Vec<(String, String)>,
    content: Vec<Item<T>>,
    text: String,
}

impl<T> Frame<T> {
    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.text);
        if !text.chars().all(char::is_whitespace) {
            self.content.push(Item::Text(text));
        }
    }
}

fn build<R: BufRead, S: Sink>(
    reader: &mut Reader<R>,
    buf: &mut Vec<u8>,
    sink: &S,
) -> Result<S::Out> {
    let mut stack: Vec<Frame<S::Out>> = Vec::new();
    let mut root: Option<S::Out> = None;

    loop {
        buf.clear();
        let event = reader.read_event_into(buf)?;
        match event {
            Event::Start(start) => {
                if let Some(parent) = stack.last_mut() {
                    parent.flush_text();
                }
                let (name, attributes) = open(&start)?;
                stack.push(Frame {
                    name,
                    attributes,
                    content: Vec::new(),
                    text: String::new(),
                });
            }
            Event::Empty(start) => {
                let (name, attributes) = open(&start)?;
                let element = sink.finish(name, attributes, Vec::new());
                match stack.last_mut() {
                    Some(parent) => {
                        parent.flush_text();
                        parent.content.push(Item::Element(element));
                    }
                    None => {
                        root.get_or_insert(element);
                    }
                }
            }
            Event::End(_) => {
                let mut frame = stack
                    .pop()
                    .ok_or_else(|| DomError::Malformed("unbalanced end tag".to_string()))?;
                frame.flush_text();
                let element = sink.finish(frame.name, frame.attributes, frame.content);
                match stack.last_mut() {
                    Some(parent) => parent.content.push(Item::Element(element)),
                    None => {
                        root.get_or_insert(element);
                    }
                }
            }
            Event::Text(text) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&text));
                }
            }
            Event::CData(data) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::GeneralRef(reference) => {
                if let Some(frame) = stack.last_mut() {
                    let name = String::from_utf8_lossy(&reference).to_string();
                    frame.text.push_str(&resolve_reference(&name)?);
                }
            }
            Event::Eof => break,
            Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_) => {}
        }
    }

    if !stack.is_empty() {
        return Err(DomError::Malformed(format!(
            "unexpected end of document inside <{}>",
            stack.last().map(|f| f.name.as_str()).unwrap_or_default()
        )));
    }
    root.ok_or(DomError::NoRootElement)
}

fn open(start: &BytesStart<'_>) -> Result<(String, Vec<(String, String)>)> {
    let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let raw = String::from_utf8_lossy(&attr.value).to_string();
        let value = quick_xml::escape::unescape(&raw)
            .map_err(|e| DomError::Malformed(format!("attribute '{}': {}", key, e)))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok((name, attributes))
}

/// Resolves `&name;` where `name` is one of the predefined entities or a
/// character reference.
fn resolve_reference(name: &str) -> Result<String> {
    let resolved = match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                None
            }
        }
    };
    resolved
        .map(String::from)
        .ok_or_else(|| DomError::Malformed(format!("unknown entity reference &{};", name)))
}
