#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use once_cell::sync::Lazy;
use xmlb::{
    Bean, BeanInfo, CollectionOptions, CommaSeparatedConverter, DurationConverter, Rectangle, Reflect, Slot,
};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}
xmlb::reflect_enum!(Theme { Light, Dark });

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Bean for Point {
    fn bean_info() -> &'static BeanInfo {
        static INFO: Lazy<BeanInfo> = Lazy::new(|| {
            BeanInfo::builder::<Point>()
                .tag("point")
                .field_with("x", |p| &p.x, |p| &mut p.x, Slot::new().attribute(""))
                .field_with("y", |p| &p.y, |p| &mut p.y, Slot::new().attribute(""))
                .with_eq()
                .build()
        });
        &INFO
    }
}
xmlb::impl_reflect_bean!(Point);

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub id: String,
    pub count: i32,
    pub enabled: bool,
    pub theme: Theme,
    pub label: Option<String>,
    pub modified: DateTime<Utc>,
    pub origin: Point,
    pub tags: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            id: String::new(),
            count: 0,
            enabled: true,
            theme: Theme::Light,
            label: None,
            modified: DateTime::<Utc>::default(),
            origin: Point::default(),
            tags: Vec::new(),
        }
    }
}

impl Bean for Settings {
    fn bean_info() -> &'static BeanInfo {
        static INFO: Lazy<BeanInfo> = Lazy::new(|| {
            BeanInfo::builder::<Settings>()
                .tag("settings")
                .field_with("id", |s| &s.id, |s| &mut s.id, Slot::new().attribute(""))
                .field("count", |s| &s.count, |s| &mut s.count)
                .field("enabled", |s| &s.enabled, |s| &mut s.enabled)
                .field("theme", |s| &s.theme, |s| &mut s.theme)
                .field("label", |s| &s.label, |s| &mut s.label)
                .field("modified", |s| &s.modified, |s| &mut s.modified)
                .field("origin", |s| &s.origin, |s| &mut s.origin)
                .field("tags", |s| &s.tags, |s| &mut s.tags)
                .build()
        });
        &INFO
    }
}
xmlb::impl_reflect_bean!(Settings);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Bag {
    pub hashed: HashSet<i32>,
    pub linked: IndexSet<String>,
    pub counts: HashMap<String, i32>,
    pub points: Vec<Point>,
}

impl Bean for Bag {
    fn bean_info() -> &'static BeanInfo {
        static INFO: Lazy<BeanInfo> = Lazy::new(|| {
            BeanInfo::builder::<Bag>()
                .tag("bag")
                .field("hashed", |b| &b.hashed, |b| &mut b.hashed)
                .field("linked", |b| &b.linked, |b| &mut b.linked)
                .field("counts", |b| &b.counts, |b| &mut b.counts)
                .field("points", |b| &b.points, |b| &mut b.points)
                .build()
        });
        &INFO
    }
}
xmlb::impl_reflect_bean!(Bag);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Inner {
    pub note: String,
    pub level: i32,
}

impl Bean for Inner {
    fn bean_info() -> &'static BeanInfo {
        static INFO: Lazy<BeanInfo> = Lazy::new(|| {
            BeanInfo::builder::<Inner>()
                .tag("inner")
                .field_with("note", |i| &i.note, |i| &mut i.note, Slot::new().attribute(""))
                .field("level", |i| &i.level, |i| &mut i.level)
                .build()
        });
        &INFO
    }
}
xmlb::impl_reflect_bean!(Inner);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Outer {
    pub name: String,
    pub inner: Inner,
}

impl Bean for Outer {
    fn bean_info() -> &'static BeanInfo {
        static INFO: Lazy<BeanInfo> = Lazy::new(|| {
            BeanInfo::builder::<Outer>()
                .tag("outer")
                .field_with("name", |o| &o.name, |o| &mut o.name, Slot::new().attribute(""))
                .field_with("inner", |o| &o.inner, |o| &mut o.inner, Slot::new().flat())
                .build()
        });
        &INFO
    }
}
xmlb::impl_reflect_bean!(Outer);

/// Optional flat bean.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Framed {
    pub name: String,
    pub extra: Option<Inner>,
}

impl Bean for Framed {
    fn bean_info() -> &'static BeanInfo {
        static INFO: Lazy<BeanInfo> = Lazy::new(|| {
            BeanInfo::builder::<Framed>()
                .tag("framed")
                .field_with("name", |f| &f.name, |f| &mut f.name, Slot::new().attribute(""))
                .field_with("extra", |f| &f.extra, |f| &mut f.extra, Slot::new().flat())
                .build()
        });
        &INFO
    }
}
xmlb::impl_reflect_bean!(Framed);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Window {
    pub title: String,
    pub bounds: Rectangle,
}

impl Bean for Window {
    fn bean_info() -> &'static BeanInfo {
        static INFO: Lazy<BeanInfo> = Lazy::new(|| {
            BeanInfo::builder::<Window>()
                .tag("window")
                .field_with("title", |w| &w.title, |w| &mut w.title, Slot::new().attribute(""))
                .field_with("bounds", |w| &w.bounds, |w| &mut w.bounds, Slot::new().flat_attributes())
                .build()
        });
        &INFO
    }
}
xmlb::impl_reflect_bean!(Window);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct History {
    pub recent: Vec<String>,
}

impl Bean for History {
    fn bean_info() -> &'static BeanInfo {
        static INFO: Lazy<BeanInfo> = Lazy::new(|| {
            BeanInfo::builder::<History>()
                .tag("history")
                .field_with("recent", |h| &h.recent, |h| &mut h.recent, Slot::new().compact_list("recent"))
                .build()
        });
        &INFO
    }
}
xmlb::impl_reflect_bean!(History);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Job {
    pub timeout: Duration,
    pub owners: Vec<String>,
}

impl Bean for Job {
    fn bean_info() -> &'static BeanInfo {
        static INFO: Lazy<BeanInfo> = Lazy::new(|| {
            BeanInfo::builder::<Job>()
                .tag("job")
                .field_with(
                    "timeout",
                    |j| &j.timeout,
                    |j| &mut j.timeout,
                    Slot::new().converter(DurationConverter),
                )
                .field_with(
                    "owners",
                    |j| &j.owners,
                    |j| &mut j.owners,
                    Slot::new().attribute("owners").converter(CommaSeparatedConverter),
                )
                .build()
        });
        &INFO
    }
}
xmlb::impl_reflect_bean!(Job);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Circle {
    pub radius: u32,
}

impl Bean for Circle {
    fn bean_info() -> &'static BeanInfo {
        static INFO: Lazy<BeanInfo> = Lazy::new(|| {
            BeanInfo::builder::<Circle>()
                .tag("circle")
                .field_with("radius", |c| &c.radius, |c| &mut c.radius, Slot::new().attribute(""))
                .build()
        });
        &INFO
    }
}
xmlb::impl_reflect_bean!(Circle);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Square {
    pub side: u32,
}

impl Bean for Square {
    fn bean_info() -> &'static BeanInfo {
        static INFO: Lazy<BeanInfo> = Lazy::new(|| {
            BeanInfo::builder::<Square>()
                .tag("square")
                .field_with("side", |s| &s.side, |s| &mut s.side, Slot::new().attribute(""))
                .build()
        });
        &INFO
    }
}
xmlb::impl_reflect_bean!(Square);

#[derive(Debug, Default)]
pub struct Drawing {
    pub shapes: Vec<Box<dyn Reflect>>,
}

impl Bean for Drawing {
    fn bean_info() -> &'static BeanInfo {
        static INFO: Lazy<BeanInfo> = Lazy::new(|| {
            BeanInfo::builder::<Drawing>()
                .tag("drawing")
                .field_with(
                    "shapes",
                    |d| &d.shapes,
                    |d| &mut d.shapes,
                    Slot::new().collection(
                        CollectionOptions::default()
                            .element_type::<Circle>()
                            .element_type::<Square>(),
                    ),
                )
                .build()
        });
        &INFO
    }
}
xmlb::impl_reflect_bean!(Drawing);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Account {
    pub age: i32,
    pub version: i32,
    pub home: Point,
    pub cache: String,
}

impl Bean for Account {
    fn bean_info() -> &'static BeanInfo {
        static INFO: Lazy<BeanInfo> = Lazy::new(|| {
            BeanInfo::builder::<Account>()
                .tag("account")
                .property(
                    "age",
                    |a: &Account| a.age,
                    |a: &mut Account, age: i32| {
                        if age < 0 {
                            return Err("age must not be negative".into());
                        }
                        a.age = age;
                        Ok(())
                    },
                    Slot::new(),
                )
                .read_only("version", |a| &a.version, |a| &mut a.version, Slot::new())
                .read_only("home", |a| &a.home, |a| &mut a.home, Slot::new())
                .field_with("cache", |a| &a.cache, |a| &mut a.cache, Slot::new().transient())
                .build()
        });
        &INFO
    }
}
xmlb::impl_reflect_bean!(Account);

pub fn sample_settings() -> Settings {
    Settings {
        id: "main".to_string(),
        count: 3,
        enabled: true,
        theme: Theme::Dark,
        label: None,
        modified: DateTime::<Utc>::default(),
        origin: Point { x: 1, y: 2 },
        tags: vec!["a".to_string(), "b".to_string()],
    }
}
