//! Writing markup trees as XML text with quick-xml.

use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::element::{Content, Element};
use crate::error::{DomError, Result};

/// Default indentation used by [`to_string`].
pub const DEFAULT_INDENT: usize = 2;

/// Serializes an element (without XML declaration) using two-space indentation.
pub fn to_string(element: &Element) -> Result<String> {
    to_string_with_indent(element, DEFAULT_INDENT)
}

/// Serializes an element with the given indentation; `0` writes everything on one line.
pub fn to_string_with_indent(element: &Element, indent: usize) -> Result<String> {
    let mut buffer = Vec::new();
    write_element_to(element, &mut buffer, indent)?;
    String::from_utf8(buffer).map_err(|e| DomError::Malformed(e.to_string()))
}

/// Writes a complete document, including the XML declaration.
pub fn write_document<W: Write>(element: &Element, out: W, indent: usize) -> Result<()> {
    let mut writer = new_writer(out, indent);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write_element(&mut writer, element)?;
    writer.get_mut().write_all(b"\n")?;
    Ok(())
}

/// Writes an element (no declaration) to any writer.
pub fn write_element_to<W: Write>(element: &Element, out: W, indent: usize) -> Result<()> {
    let mut writer = new_writer(out, indent);
    write_element(&mut writer, element)
}

fn new_writer<W: Write>(out: W, indent: usize) -> Writer<W> {
    if indent == 0 {
        Writer::new(out)
    } else {
        Writer::new_with_indent(out, b' ', indent)
    }
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name());
    for attribute in element.attributes() {
        start.push_attribute((attribute.name.as_str(), attribute.value.as_str()));
    }

    if element.content().is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for content in element.content() {
        match content {
            Content::Element(child) => write_element(writer, child)?,
            Content::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::parse_str;

    #[test]
    fn test_self_closing_and_escaping() -> Result<()> {
        let element = Element::new("option")
            .with_attribute("name", "a")
            .with_attribute("value", "x < y & \"z\"");
        let xml = to_string_with_indent(&element, 0)?;
        assert_eq!(
            xml,
            r#"<option name="a" value="x &lt; y &amp; &quot;z&quot;"/>"#
        );
        Ok(())
    }

    #[test]
    fn test_text_content_inline() -> Result<()> {
        let mut element = Element::new("tag");
        element.add_text("a & b");
        assert_eq!(to_string_with_indent(&element, 0)?, "<tag>a &amp; b</tag>");
        Ok(())
    }

    #[test]
    fn test_written_text_reparses_to_same_tree() -> Result<()> {
        let mut root = Element::new("root").with_attribute("k", "v&w");
        let mut child = Element::new("child");
        child.add_text("text <with> markup");
        root.add_child(child);
        root.add_child(Element::new("empty"));

        let xml = to_string(&root)?;
        assert_eq!(parse_str(&xml)?, root);
        Ok(())
    }

    #[test]
    fn test_document_has_declaration() -> Result<()> {
        let mut out = Vec::new();
        write_document(&Element::new("a"), &mut out, 2)?;
        let text = String::from_utf8(out).map_err(|e| DomError::Malformed(e.to_string()))?;
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(text.contains("<a/>"));
        Ok(())
    }
}
