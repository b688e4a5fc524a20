use std::fs;

use xmlb_dom::{DomError, FileLoader, IncludeResolver, MemoryLoader, Node, Result, parse_str};

const MAIN: &str = r#"<component xmlns:xi="http://www.w3.org/2001/XInclude" name="main">
  <option name="before" value="1"/>
  <xi:include href="parts/shared.xml" xpointer="xpointer(/shared/*)"/>
  <option name="after" value="2"/>
</component>"#;

const SHARED: &str = r#"<shared>
  <option name="first" value="a"/>
  <option name="second" value="b"/>
</shared>"#;

fn option_names(root: &xmlb_dom::Element) -> Vec<String> {
    root.children()
        .filter_map(|c| c.attribute("name").map(String::from))
        .collect()
}

#[test]
fn test_include_splices_children_in_place() -> Result<()> {
    let loader = MemoryLoader::new().with_document("conf/parts/shared.xml", SHARED);
    let resolver = IncludeResolver::new(loader);

    let root = resolver.resolve(parse_str(MAIN)?, "conf/main.xml")?;

    assert_eq!(option_names(&root), vec!["before", "first", "second", "after"]);
    Ok(())
}

#[test]
fn test_include_without_xpointer_splices_root() -> Result<()> {
    let main = r#"<root xmlns:xi="http://www.w3.org/2001/XInclude"><xi:include href="a.xml"/></root>"#;
    let loader = MemoryLoader::new().with_document("a.xml", "<a><b/></a>");

    let root = IncludeResolver::new(loader).resolve(parse_str(main)?, "main.xml")?;

    let child = root.children().next().map(|c| c.name().to_string());
    assert_eq!(child.as_deref(), Some("a"));
    Ok(())
}

#[test]
fn test_missing_include_without_fallback_fails() -> Result<()> {
    let resolver = IncludeResolver::new(MemoryLoader::new());
    let result = resolver.resolve(parse_str(MAIN)?, "conf/main.xml");
    assert!(matches!(result, Err(DomError::Include { .. })));
    Ok(())
}

#[test]
fn test_missing_include_with_fallback_is_tolerated() -> Result<()> {
    let main = r#"<root xmlns:xi="http://www.w3.org/2001/XInclude">
        <xi:include href="missing.xml"><xi:fallback><default/></xi:fallback></xi:include>
        <xi:include href="missing.xml"><xi:fallback/></xi:include>
        <kept/>
    </root>"#;

    let root = IncludeResolver::new(MemoryLoader::new()).resolve(parse_str(main)?, "main.xml")?;

    let names: Vec<&str> = root.children().map(|c| c.name()).collect();
    assert_eq!(names, vec!["default", "kept"]);
    Ok(())
}

#[test]
fn test_nested_includes_resolve_relative_to_including_document() -> Result<()> {
    let loader = MemoryLoader::new()
        .with_document(
            "conf/a.xml",
            r#"<a xmlns:xi="http://www.w3.org/2001/XInclude"><xi:include href="deep/b.xml"/></a>"#,
        )
        .with_document("conf/deep/b.xml", "<b/>");
    let main = r#"<root xmlns:xi="http://www.w3.org/2001/XInclude"><xi:include href="a.xml"/></root>"#;

    let root = IncludeResolver::new(loader).resolve(parse_str(main)?, "conf/main.xml")?;

    let a = root.first_child("a").map(|a| a.children().count());
    assert_eq!(a, Some(1));
    Ok(())
}

#[test]
fn test_circular_include_is_error() -> Result<()> {
    let loader = MemoryLoader::new().with_document(
        "loop.xml",
        r#"<l xmlns:xi="http://www.w3.org/2001/XInclude"><xi:include href="loop.xml"/></l>"#,
    );
    let main = r#"<root xmlns:xi="http://www.w3.org/2001/XInclude"><xi:include href="loop.xml"/></root>"#;

    let result = IncludeResolver::new(loader).resolve(parse_str(main)?, "main.xml");

    assert!(matches!(result, Err(DomError::CircularInclude(_))));
    Ok(())
}

#[test]
fn test_file_loader_reads_relative_files() -> Result<()> {
    let dir = tempfile::tempdir()?;
    fs::create_dir_all(dir.path().join("parts"))?;
    fs::write(dir.path().join("parts/shared.xml"), SHARED)?;
    let main_path = dir.path().join("main.xml");
    fs::write(&main_path, MAIN)?;

    let root = parse_str(&fs::read_to_string(&main_path)?)?;
    let root = IncludeResolver::new(FileLoader).resolve(root, &main_path.to_string_lossy())?;

    assert_eq!(option_names(&root), vec!["before", "first", "second", "after"]);
    Ok(())
}
