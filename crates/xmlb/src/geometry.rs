//! Rectangle value with a fixed attribute layout.
//!
//! As a `flat_attributes()` slot it writes `x`, `y`, `width` and `height`
//! on the owner element; anywhere else it is an ordinary bean.

use once_cell::sync::Lazy;

use crate::bean::{Bean, BeanInfo};
use crate::slot::Slot;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rectangle {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

impl Bean for Rectangle {
    fn bean_info() -> &'static BeanInfo {
        static INFO: Lazy<BeanInfo> = Lazy::new(|| {
            BeanInfo::builder::<Rectangle>()
                .tag("rectangle")
                .field_with("x", |r| &r.x, |r| &mut r.x, Slot::new().attribute(""))
                .field_with("y", |r| &r.y, |r| &mut r.y, Slot::new().attribute(""))
                .field_with("width", |r| &r.width, |r| &mut r.width, Slot::new().attribute(""))
                .field_with("height", |r| &r.height, |r| &mut r.height, Slot::new().attribute(""))
                .with_eq()
                .build()
        });
        &INFO
    }
}
crate::impl_reflect_bean!(Rectangle);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::XmlSerializer;

    #[test]
    fn test_rectangle_element() -> crate::Result<()> {
        let element = XmlSerializer::new().serialize(&Rectangle::new(1, 2, 30, 40), None)?;
        assert_eq!(element.to_string(), r#"<rectangle x="1" y="2" width="30" height="40"/>"#);
        Ok(())
    }

    #[test]
    fn test_is_empty() {
        assert!(Rectangle::default().is_empty());
        assert!(!Rectangle::new(0, 0, 1, 1).is_empty());
    }
}
