//! Dense layout for string lists:
//!
//! ```text
//! <tag>
//!   <item value="a"/>
//!   <item value="b"/>
//! </tag>
//! ```
//!
//! Older documents nest the items as `<tag><value><list><item itemvalue="a"/>`;
//! both are read.

use xmlb_dom::{Element, Node};

use super::present;
use crate::error::{Result, XmlbError};
use crate::reflect::{Reflect, ReflectRef};
use crate::scalar;

const ITEM_TAG: &str = "item";
const VALUE_ATTRIBUTE: &str = "value";
const LEGACY_VALUE_ATTRIBUTE: &str = "itemvalue";

/// `None` when the list is absent.
pub(crate) fn serialize(tag: &str, value: &dyn Reflect) -> Result<Option<Element>> {
    let Some(value) = present(value) else {
        return Ok(None);
    };
    let ReflectRef::List(list) = value.reflect_ref() else {
        return Err(XmlbError::mismatch("string list", value.type_name()));
    };

    let mut element = Element::new(tag);
    for item in list.items() {
        if let Some(text) = scalar::to_text(item) {
            element.add_child(Element::new(ITEM_TAG).with_attribute(VALUE_ATTRIBUTE, text));
        }
    }
    Ok(Some(element))
}

pub(crate) fn deserialize<N: Node>(node: &N) -> Vec<Box<dyn Reflect>> {
    let legacy = node
        .first_child(VALUE_ATTRIBUTE)
        .and_then(|value| value.first_child("list"));
    let (container, attribute) = match legacy {
        Some(list) => (list, LEGACY_VALUE_ATTRIBUTE),
        None => (node, VALUE_ATTRIBUTE),
    };

    container
        .child_elements()
        .filter(|child| child.name() == ITEM_TAG)
        .filter_map(|child| child.attribute(attribute))
        .map(|text| Box::new(text.to_string()) as Box<dyn Reflect>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: Vec<Box<dyn Reflect>>) -> Vec<String> {
        items
            .iter()
            .filter_map(|item| item.downcast_ref::<String>().cloned())
            .collect()
    }

    #[test]
    fn test_writes_items() -> Result<()> {
        let list = vec!["a".to_string(), "b".to_string()];
        let element = serialize("paths", &list)?.ok_or_else(|| XmlbError::mismatch("element", "none"))?;
        assert_eq!(
            element.to_string(),
            r#"<paths><item value="a"/><item value="b"/></paths>"#
        );
        Ok(())
    }

    #[test]
    fn test_reads_both_layouts() -> Result<()> {
        let current = xmlb_dom::parse_str(r#"<paths><item value="a"/><item value="b"/></paths>"#)?;
        let legacy = xmlb_dom::parse_str(
            r#"<paths><value><list><item itemvalue="a"/><item itemvalue="b"/></list></value></paths>"#,
        )?;
        assert_eq!(strings(deserialize(&current)), vec!["a", "b"]);
        assert_eq!(strings(deserialize(&legacy)), vec!["a", "b"]);
        Ok(())
    }

    #[test]
    fn test_absent_list_writes_nothing() -> Result<()> {
        let list: Option<Vec<String>> = None;
        assert!(serialize("paths", &list)?.is_none());
        Ok(())
    }
}
