mod common;

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use common::{Bag, Point, Settings};
use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use xmlb::{
    Bean, BeanInfo, Element, Result, SerializerConfig, Slot, SkipDefaultsFilter, SkipEmptyFilter, SmartSerializer,
    XmlSerializer, XmlbError,
};

#[derive(Debug, Default, Clone, PartialEq)]
struct Flags {
    name: String,
    note: String,
    level: i32,
}

impl Bean for Flags {
    fn bean_info() -> &'static BeanInfo {
        static INFO: Lazy<BeanInfo> = Lazy::new(|| {
            BeanInfo::builder::<Flags>()
                .tag("flags")
                .field_with("name", |f| &f.name, |f| &mut f.name, Slot::new().always_write())
                .field_with(
                    "note",
                    |f| &f.note,
                    |f| &mut f.note,
                    Slot::new().filter(Arc::new(SkipEmptyFilter)),
                )
                .field("level", |f| &f.level, |f| &mut f.level)
                .build()
        });
        &INFO
    }
}
xmlb::impl_reflect_bean!(Flags);

#[derive(Debug, Default)]
struct BadCompact {
    numbers: Vec<i32>,
}

impl Bean for BadCompact {
    fn bean_info() -> &'static BeanInfo {
        static INFO: Lazy<BeanInfo> = Lazy::new(|| {
            BeanInfo::builder::<BadCompact>()
                .field_with("numbers", |b| &b.numbers, |b| &mut b.numbers, Slot::new().compact_list("numbers"))
                .build()
        });
        &INFO
    }
}
xmlb::impl_reflect_bean!(BadCompact);

#[derive(Debug, Default)]
struct Twice {
    first: i32,
    second: i32,
}

impl Bean for Twice {
    fn bean_info() -> &'static BeanInfo {
        static INFO: Lazy<BeanInfo> = Lazy::new(|| {
            BeanInfo::builder::<Twice>()
                .field("value", |t| &t.first, |t| &mut t.first)
                .field("value", |t| &t.second, |t| &mut t.second)
                .build()
        });
        &INFO
    }
}
xmlb::impl_reflect_bean!(Twice);

#[derive(Debug, Default, PartialEq)]
struct Sequences {
    linked: IndexMap<String, i32>,
    sorted: BTreeMap<String, i32>,
    fixed: Box<[i32]>,
    queue: VecDeque<String>,
}

impl Bean for Sequences {
    fn bean_info() -> &'static BeanInfo {
        static INFO: Lazy<BeanInfo> = Lazy::new(|| {
            BeanInfo::builder::<Sequences>()
                .tag("sequences")
                .field("linked", |s| &s.linked, |s| &mut s.linked)
                .field("sorted", |s| &s.sorted, |s| &mut s.sorted)
                .field("fixed", |s| &s.fixed, |s| &mut s.fixed)
                .field("queue", |s| &s.queue, |s| &mut s.queue)
                .build()
        });
        &INFO
    }
}
xmlb::impl_reflect_bean!(Sequences);

fn bag() -> Bag {
    let mut counts = HashMap::new();
    counts.insert("b".to_string(), 2);
    counts.insert("a".to_string(), 1);
    Bag {
        hashed: [3, 1, 2].into_iter().collect(),
        linked: ["b", "a"].into_iter().map(String::from).collect(),
        counts,
        points: vec![Point { x: 1, y: 2 }],
    }
}

#[test]
fn test_collection_layouts() -> Result<()> {
    let element = XmlSerializer::new().serialize(&bag(), None)?;
    assert_eq!(
        element.to_string(),
        concat!(
            r#"<bag>"#,
            r#"<option name="hashed"><set><option value="1"/><option value="2"/><option value="3"/></set></option>"#,
            r#"<option name="linked"><set><option value="b"/><option value="a"/></set></option>"#,
            r#"<option name="counts"><map><entry key="a" value="1"/><entry key="b" value="2"/></map></option>"#,
            r#"<option name="points"><list><point x="1" y="2"/></list></option>"#,
            r#"</bag>"#
        )
    );
    Ok(())
}

#[test]
fn test_hash_ordered_output_is_stable() -> Result<()> {
    let serializer = XmlSerializer::new();
    let mut other = bag();
    other.hashed = [2, 3, 1].into_iter().collect::<HashSet<_>>();
    let mut counts = HashMap::with_capacity(16);
    counts.insert("a".to_string(), 1);
    counts.insert("b".to_string(), 2);
    other.counts = counts;

    let first = serializer.serialize(&bag(), None)?.to_string();
    let second = serializer.serialize(&other, None)?.to_string();
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_collections_round_trip() -> Result<()> {
    let serializer = XmlSerializer::new();
    let element = serializer.serialize(&bag(), None)?;
    let back: Bag = serializer.deserialize(&element)?;
    assert_eq!(back, bag());
    let order: Vec<&str> = back.linked.iter().map(String::as_str).collect();
    assert_eq!(order, vec!["b", "a"]);
    Ok(())
}

#[test]
fn test_items_without_wrapper_are_read() -> Result<()> {
    let xml = r#"<bag><option name="linked"><option value="x"/><option value="y"/></option></bag>"#;
    let back: Bag = XmlSerializer::new().deserialize(&xmlb::xmlb_dom::parse_str(xml)?)?;
    let expected: IndexSet<String> = ["x", "y"].into_iter().map(String::from).collect();
    assert_eq!(back.linked, expected);
    Ok(())
}

#[test]
fn test_ordered_containers_keep_their_order() -> Result<()> {
    let serializer = XmlSerializer::new();
    let mut linked = IndexMap::new();
    linked.insert("b".to_string(), 2);
    linked.insert("a".to_string(), 1);
    let mut sorted = BTreeMap::new();
    sorted.insert("z".to_string(), 26);
    sorted.insert("y".to_string(), 25);
    let sequences = Sequences {
        linked,
        sorted,
        fixed: vec![3, 1, 2].into_boxed_slice(),
        queue: ["q2", "q1"].into_iter().map(String::from).collect(),
    };

    let element = serializer.serialize(&sequences, None)?;
    assert_eq!(
        element.to_string(),
        concat!(
            r#"<sequences>"#,
            r#"<option name="linked"><map><entry key="b" value="2"/><entry key="a" value="1"/></map></option>"#,
            r#"<option name="sorted"><map><entry key="y" value="25"/><entry key="z" value="26"/></map></option>"#,
            r#"<option name="fixed"><array><option value="3"/><option value="1"/><option value="2"/></array></option>"#,
            r#"<option name="queue"><collection><option value="q2"/><option value="q1"/></collection></option>"#,
            r#"</sequences>"#
        )
    );

    let back: Sequences = serializer.deserialize(&element)?;
    assert_eq!(back, sequences);
    let keys: Vec<&str> = back.linked.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["b", "a"]);
    Ok(())
}

#[test]
fn test_skip_defaults_is_idempotent() -> Result<()> {
    let serializer = XmlSerializer::new();
    let filter = SkipDefaultsFilter::new();

    let element = serializer.serialize(&Settings::default(), Some(&filter))?;
    assert_eq!(element.to_string(), "<settings/>");

    let back: Settings = serializer.deserialize(&element)?;
    assert_eq!(back, Settings::default());
    assert_eq!(serializer.serialize(&back, Some(&filter))?, element);

    let changed = Settings {
        count: 5,
        ..Settings::default()
    };
    assert_eq!(
        serializer.serialize(&changed, Some(&filter))?.to_string(),
        r#"<settings><option name="count" value="5"/></settings>"#
    );
    Ok(())
}

#[test]
fn test_slot_filters_take_precedence() -> Result<()> {
    let serializer = XmlSerializer::new();

    let element = serializer.serialize(&Flags::default(), Some(&SkipDefaultsFilter::new()))?;
    assert_eq!(element.to_string(), r#"<flags><option name="name" value=""/></flags>"#);

    let element = serializer.serialize(&Flags::default(), None)?;
    assert_eq!(
        element.to_string(),
        r#"<flags><option name="name" value=""/><option name="level" value="0"/></flags>"#
    );
    Ok(())
}

#[test]
fn test_skip_empty_filter() -> Result<()> {
    let settings = Settings {
        enabled: false,
        ..common::sample_settings()
    };
    let element = XmlSerializer::new().serialize(&settings, Some(&SkipEmptyFilter))?;
    let xml = element.to_string();
    assert!(!xml.contains(r#"name="enabled""#));
    assert!(!xml.contains(r#"name="label""#));
    assert!(xml.contains(r#"name="tags""#));
    Ok(())
}

#[test]
fn test_smart_serializer_keeps_read_slots() -> Result<()> {
    let smart = SmartSerializer::new();
    let input = xmlb::xmlb_dom::parse_str(
        r#"<settings><option name="theme" value="Light"/><option name="count" value="3"/></settings>"#,
    )?;

    let mut settings = Settings::default();
    smart.read_external(&mut settings, &input)?;
    assert_eq!(smart.serialized_names(), Some(vec!["theme".to_string(), "count".to_string()]));

    settings.tags = vec!["x".to_string()];
    let mut output = Element::new("settings");
    smart.write_external(&settings, &mut output)?;
    assert_eq!(
        output.to_string(),
        concat!(
            r#"<settings>"#,
            r#"<option name="theme" value="Light"/>"#,
            r#"<option name="tags"><list><option value="x"/></list></option>"#,
            r#"<option name="count" value="3"/>"#,
            r#"</settings>"#
        )
    );
    Ok(())
}

#[test]
fn test_smart_serializer_without_tracking() -> Result<()> {
    let smart = SmartSerializer::without_tracking();
    let input = xmlb::xmlb_dom::parse_str(r#"<settings><option name="theme" value="Light"/></settings>"#)?;
    let mut settings = Settings::default();
    smart.read_external(&mut settings, &input)?;
    assert_eq!(smart.serialized_names(), None);

    let mut output = Element::new("settings");
    smart.write_external(&settings, &mut output)?;
    assert_eq!(output.to_string(), "<settings/>");
    Ok(())
}

#[test]
fn test_smart_serializer_uses_the_given_serializer() -> Result<()> {
    let serializer = XmlSerializer::with_config(SerializerConfig {
        legacy_option_names: false,
        ..Default::default()
    })?;
    let smart = SmartSerializer::with_serializer(&serializer);
    let input = xmlb::xmlb_dom::parse_str(
        r#"<settings><option name="myCount" value="7"/><option name="theme" value="Light"/></settings>"#,
    )?;

    let mut settings = Settings::default();
    smart.read_external(&mut settings, &input)?;
    assert_eq!(settings.count, 0);
    assert_eq!(smart.serialized_names(), Some(vec!["theme".to_string()]));
    assert!(serializer.cached_bindings() > 0);

    let mut output = Element::new("settings");
    smart.write_external(&settings, &mut output)?;
    assert_eq!(output.to_string(), r#"<settings><option name="theme" value="Light"/></settings>"#);
    Ok(())
}

#[test]
fn test_binding_cache() -> Result<()> {
    let serializer = XmlSerializer::new();
    assert_eq!(serializer.cached_bindings(), 0);
    serializer.serialize(&common::sample_settings(), None)?;
    assert_eq!(serializer.cached_bindings(), 2);
    serializer.clear_cache();
    assert_eq!(serializer.cached_bindings(), 0);
    Ok(())
}

#[test]
fn test_invalid_declarations_fail_every_time() {
    let serializer = XmlSerializer::new();
    for _ in 0..2 {
        let result = serializer.serialize(&BadCompact::default(), None);
        assert!(matches!(result, Err(XmlbError::Config { .. })));
    }
    assert_eq!(serializer.cached_bindings(), 0);

    let result = serializer.serialize(&Twice::default(), None);
    assert!(matches!(result, Err(XmlbError::Config { .. })));
}
