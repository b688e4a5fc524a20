//! Include resolution pre-pass.
//!
//! Replaces `<xi:include href="..."/>` directives (XInclude namespace) with the
//! content of the referenced document before any binding looks at the tree.
//!
//! ```xml
//! <component xmlns:xi="http://www.w3.org/2001/XInclude">
//!   <xi:include href="shared.xml" xpointer="xpointer(/shared/*)">
//!     <xi:fallback/>
//!   </xi:include>
//! </component>
//! ```
//!
//! - `href` is resolved against the location of the including document.
//! - `xpointer(/root/*)` splices the children of the included root (whose tag
//!   must be `root`); `xpointer(/root/sub/*)` the children of its `sub` child.
//!   Without `xpointer` the included root element itself is spliced.
//! - A `<xi:fallback>` child makes a missing document tolerable: the fallback's
//!   own content (often nothing) is spliced instead.
//! - Included documents are resolved recursively relative to their own location;
//!   a document that includes itself, directly or not, is an error.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::element::{Content, Element};
use crate::error::{DomError, Result};
use crate::reader::parse_str;

/// XInclude namespace URI.
pub const XINCLUDE_URI: &str = "http://www.w3.org/2001/XInclude";

static XPOINTER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^xpointer\((.*)\)$").expect("valid xpointer pattern"));
static CHILDREN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/([^/]*)(/[^/]*)?/\*$").expect("valid children pattern"));

/// Locates and loads included documents.
pub trait IncludeLoader {
    /// Resolves `href` against the location of the including document.
    fn resolve(&self, base: &str, href: &str) -> String;

    /// Loads and parses the document at an already resolved location.
    fn load(&self, location: &str) -> Result<Element>;
}

/// Loads included documents from the filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl IncludeLoader for FileLoader {
    fn resolve(&self, base: &str, href: &str) -> String {
        let href_path = Path::new(href);
        if href_path.is_absolute() {
            return href.to_string();
        }
        let dir = Path::new(base).parent().unwrap_or_else(|| Path::new(""));
        normalize(&dir.join(href_path)).to_string_lossy().into_owned()
    }

    fn load(&self, location: &str) -> Result<Element> {
        let text = std::fs::read_to_string(location)?;
        parse_str(&text)
    }
}

/// Serves included documents from memory, keyed by location.
///
/// Locations are `/`-separated paths; relative `href`s are joined onto the
/// directory of the base location.
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    documents: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, location: impl Into<String>, xml: impl Into<String>) -> Self {
        self.documents.insert(location.into(), xml.into());
        self
    }
}

impl IncludeLoader for MemoryLoader {
    fn resolve(&self, base: &str, href: &str) -> String {
        if href.starts_with('/') {
            return href.to_string();
        }
        let dir = base.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
        let joined = if dir.is_empty() {
            PathBuf::from(href)
        } else {
            Path::new(dir).join(href)
        };
        normalize(&joined).to_string_lossy().replace('\\', "/")
    }

    fn load(&self, location: &str) -> Result<Element> {
        let xml = self.documents.get(location).ok_or_else(|| {
            DomError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no document at {}", location),
            ))
        })?;
        parse_str(xml)
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolves include directives with a given loader.
pub struct IncludeResolver<L: IncludeLoader> {
    loader: L,
}

impl<L: IncludeLoader> IncludeResolver<L> {
    pub fn new(loader: L) -> Self {
        Self { loader }
    }

    /// Resolves every include in `root`, which was loaded from `base`.
    ///
    /// If `root` is itself an include directive it must resolve to exactly one element.
    pub fn resolve(&self, root: Element, base: &str) -> Result<Element> {
        let mut stack = vec![base.to_string()];
        let mut scope = Vec::new();
        let mut resolved = self.resolve_element(root, &mut stack, &mut scope)?;
        match resolved.len() {
            1 => match resolved.pop() {
                Some(Content::Element(e)) => Ok(e),
                _ => Err(DomError::Malformed(
                    "root include resolved to text".to_string(),
                )),
            },
            n => Err(DomError::Malformed(format!(
                "root include resolved to {} nodes, expected one element",
                n
            ))),
        }
    }

    fn resolve_element(
        &self,
        mut element: Element,
        stack: &mut Vec<String>,
        scope: &mut Vec<(String, String)>,
    ) -> Result<Vec<Content>> {
        let declared = push_namespaces(&element, scope);

        let result = if is_include(&element, scope) {
            self.expand(element, stack, scope)
        } else {
            let content = element.take_content();
            let mut resolved = Vec::with_capacity(content.len());
            let mut failure = None;
            for item in content {
                match item {
                    Content::Element(child) => match self.resolve_element(child, stack, scope) {
                        Ok(items) => resolved.extend(items),
                        Err(e) => {
                            failure = Some(e);
                            break;
                        }
                    },
                    text => resolved.push(text),
                }
            }
            match failure {
                Some(e) => Err(e),
                None => {
                    *element.content_mut() = resolved;
                    Ok(vec![Content::Element(element)])
                }
            }
        };

        scope.truncate(scope.len() - declared);
        result
    }

    fn expand(
        &self,
        include: Element,
        stack: &mut Vec<String>,
        scope: &mut Vec<(String, String)>,
    ) -> Result<Vec<Content>> {
        let base = stack.last().cloned().unwrap_or_default();
        let href = include
            .attribute("href")
            .ok_or_else(|| DomError::Include {
                href: String::new(),
                base: base.clone(),
                message: "missing href attribute".to_string(),
            })?
            .to_string();
        if let Some(parse) = include.attribute("parse") {
            if parse != "xml" {
                return Err(DomError::Include {
                    href,
                    base,
                    message: format!("unsupported parse mode '{}'", parse),
                });
            }
        }

        let location = self.loader.resolve(&base, &href);
        if stack.contains(&location) {
            return Err(DomError::CircularInclude(location));
        }

        let loaded = match self.loader.load(&location) {
            Ok(doc) => doc,
            Err(e) => {
                return match fallback(&include, scope) {
                    Some(fallback) => {
                        warn!(href = %href, error = %e, "Include not found, using fallback");
                        let mut out = Vec::new();
                        for item in fallback.content().iter().cloned() {
                            match item {
                                Content::Element(child) => {
                                    out.extend(self.resolve_element(child, stack, scope)?)
                                }
                                text => out.push(text),
                            }
                        }
                        Ok(out)
                    }
                    None => Err(DomError::Include {
                        href,
                        base,
                        message: e.to_string(),
                    }),
                };
            }
        };
        debug!(href = %href, location = %location, "Resolved include");

        stack.push(location);
        let mut nested_scope = Vec::new();
        let resolved = self.resolve_element(loaded, stack, &mut nested_scope);
        stack.pop();
        let mut resolved = resolved?;

        let Some(xpointer) = include.attribute("xpointer") else {
            return Ok(resolved);
        };
        let root = match resolved.pop() {
            Some(Content::Element(root)) if resolved.is_empty() => root,
            _ => {
                return Err(DomError::Include {
                    href,
                    base,
                    message: "included document did not resolve to one element".to_string(),
                });
            }
        };
        select(root, xpointer).map_err(|message| DomError::Include {
            href,
            base,
            message,
        })
    }
}

/// Applies an `xpointer(/root/*)` or `xpointer(/root/sub/*)` selection.
fn select(root: Element, xpointer: &str) -> std::result::Result<Vec<Content>, String> {
    let pointer = XPOINTER_PATTERN
        .captures(xpointer)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| format!("unsupported xpointer '{}'", xpointer))?;
    let captures = CHILDREN_PATTERN
        .captures(&pointer)
        .ok_or_else(|| format!("unsupported xpointer '{}'", xpointer))?;
    let root_name = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    if root_name != root.name() {
        return Err(format!(
            "xpointer root '{}' does not match document root '{}'",
            root_name,
            root.name()
        ));
    }

    let mut root = root;
    match captures.get(2).map(|m| m.as_str().trim_start_matches('/')) {
        Some(sub) => {
            let mut selected = root
                .take_content()
                .into_iter()
                .find_map(|c| match c {
                    Content::Element(e) if e.name() == sub => Some(e),
                    _ => None,
                })
                .ok_or_else(|| format!("xpointer child '{}' not found", sub))?;
            Ok(selected.take_content())
        }
        None => Ok(root.take_content()),
    }
}

fn push_namespaces(element: &Element, scope: &mut Vec<(String, String)>) -> usize {
    let before = scope.len();
    for attribute in element.attributes() {
        if attribute.name == "xmlns" {
            scope.push((String::new(), attribute.value.clone()));
        } else if let Some(prefix) = attribute.name.strip_prefix("xmlns:") {
            scope.push((prefix.to_string(), attribute.value.clone()));
        }
    }
    scope.len() - before
}

fn namespace_of<'a>(name: &str, scope: &'a [(String, String)]) -> Option<&'a str> {
    let prefix = name.split_once(':').map(|(p, _)| p).unwrap_or("");
    scope
        .iter()
        .rev()
        .find(|(p, _)| p == prefix)
        .map(|(_, uri)| uri.as_str())
}

fn local_name(name: &str) -> &str {
    name.split_once(':').map(|(_, l)| l).unwrap_or(name)
}

fn is_include(element: &Element, scope: &[(String, String)]) -> bool {
    local_name(element.name()) == "include"
        && namespace_of(element.name(), scope) == Some(XINCLUDE_URI)
}

fn fallback<'a>(include: &'a Element, scope: &[(String, String)]) -> Option<&'a Element> {
    include.children().find(|c| {
        local_name(c.name()) == "fallback" && namespace_of(c.name(), scope) == Some(XINCLUDE_URI)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_loader_resolves_relative() {
        let loader = MemoryLoader::new();
        assert_eq!(loader.resolve("conf/main.xml", "parts/a.xml"), "conf/parts/a.xml");
        assert_eq!(loader.resolve("conf/main.xml", "../b.xml"), "b.xml");
        assert_eq!(loader.resolve("main.xml", "b.xml"), "b.xml");
        assert_eq!(loader.resolve("conf/main.xml", "/abs.xml"), "/abs.xml");
    }

    #[test]
    fn test_select_children_of_root() -> std::result::Result<(), String> {
        let root = parse_str("<shared><a/><b/></shared>").map_err(|e| e.to_string())?;
        let selected = select(root, "xpointer(/shared/*)")?;
        assert_eq!(selected.len(), 2);
        Ok(())
    }

    #[test]
    fn test_select_children_of_sub() -> std::result::Result<(), String> {
        let root =
            parse_str("<shared><x><a/></x><y><b/><c/></y></shared>").map_err(|e| e.to_string())?;
        let selected = select(root, "xpointer(/shared/y/*)")?;
        assert_eq!(selected.len(), 2);
        Ok(())
    }

    #[test]
    fn test_select_root_mismatch() {
        let root = Element::new("other");
        assert!(select(root, "xpointer(/shared/*)").is_err());
    }

    #[test]
    fn test_is_include_requires_namespace() {
        let scope = vec![("xi".to_string(), XINCLUDE_URI.to_string())];
        assert!(is_include(&Element::new("xi:include"), &scope));
        assert!(!is_include(&Element::new("include"), &scope));
        assert!(!is_include(&Element::new("xi:include"), &[]));
    }
}
