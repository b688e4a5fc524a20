//! # xmlb-dom
//!
//! Markup trees consumed and produced by the `xmlb` binding library.
//!
//! - [`Element`]: the mutable tree. Bindings produce it on serialization.
//! - [`XmlElement`]: an immutable, `Arc`-shared tree for read-only paths.
//! - [`Node`]: the read interface both implement; every deserialization entry
//!   point of `xmlb` is generic over it.
//! - [`reader`] / [`writer`]: conversion from and to XML text (quick-xml).
//! - [`include`]: resolution of XInclude directives as a pre-pass.
//!
//! ```
//! use xmlb_dom::{Element, Node, parse_str, to_string};
//!
//! let root = parse_str(r#"<component name="x"><option name="a" value="1"/></component>"#)?;
//! assert_eq!(root.first_child("option").and_then(|o| o.attribute("value")), Some("1"));
//! let xml = to_string(&root)?;
//! assert!(xml.contains("<option name=\"a\" value=\"1\"/>"));
//! # Ok::<(), xmlb_dom::DomError>(())
//! ```

pub mod element;
pub mod error;
pub mod include;
pub mod light;
pub mod node;
pub mod reader;
pub mod writer;

pub use element::{Attribute, Content, Element};
pub use error::{DomError, Result};
pub use include::{FileLoader, IncludeLoader, IncludeResolver, MemoryLoader, XINCLUDE_URI};
pub use light::{XmlContent, XmlElement};
pub use node::{Node, NodeRef};
pub use reader::{parse_light, parse_reader, parse_str};
pub use writer::{to_string, to_string_with_indent, write_document, write_element_to};
