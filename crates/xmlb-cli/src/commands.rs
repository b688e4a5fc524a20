//! Subcommand implementations over the markup layer.

use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::{debug, info};
use xmlb_dom::{Element, FileLoader, IncludeResolver};

fn read(input: &Path) -> anyhow::Result<Element> {
    let text = fs::read_to_string(input).with_context(|| format!("cannot read {}", input.display()))?;
    let root = xmlb_dom::parse_str(&text).with_context(|| format!("cannot parse {}", input.display()))?;
    debug!(path = %input.display(), root = root.name(), "Parsed document");
    Ok(root)
}

fn resolved(input: &Path) -> anyhow::Result<Element> {
    let root = read(input)?;
    let base = input.to_string_lossy();
    let root = IncludeResolver::new(FileLoader)
        .resolve(root, &base)
        .with_context(|| format!("cannot resolve includes of {}", input.display()))?;
    info!(path = %input.display(), "Resolved includes");
    Ok(root)
}

pub fn format(input: &Path, indent: usize) -> anyhow::Result<String> {
    Ok(xmlb_dom::to_string_with_indent(&read(input)?, indent)?)
}

pub fn resolve_includes(input: &Path, indent: usize) -> anyhow::Result<String> {
    Ok(xmlb_dom::to_string_with_indent(&resolved(input)?, indent)?)
}

pub fn json(input: &Path, resolve: bool, indent: usize) -> anyhow::Result<String> {
    let root = if resolve { resolved(input)? } else { read(input)? };
    let value = root.to_json();
    let text = if indent == 0 {
        serde_json::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };
    Ok(text)
}
