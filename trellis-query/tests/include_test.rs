mod common;

use trellis_query::{ErrorKind, MapBy, Ordering, RequestParams, SortDirection};

#[test]
fn test_bare_paths_share_nodes() {
    let compiler = common::bare_compiler();
    let tree = compiler
        .compile(
            "E2",
            &RequestParams::new()
                .include("e3s.name")
                .include("e3s.e5.name")
                .include("e3s.phoneNumber"),
        )
        .unwrap();

    let e3 = tree.root.child("e3s").unwrap();
    assert_eq!(e3.entity(), "E3");
    assert!(e3.is_to_many());
    assert_eq!(
        e3.attributes().iter().collect::<Vec<_>>(),
        vec!["name", "phoneNumber"]
    );
    assert!(e3.child("e5").unwrap().has_attribute("name"));
    assert!(tree.root.attributes().is_empty());
}

#[test]
fn test_relationship_include_implies_no_attributes() {
    let compiler = common::bare_compiler();
    let tree = compiler
        .compile("E2", &RequestParams::new().include("e3s"))
        .unwrap();
    let e3 = tree.root.child("e3s").unwrap();
    assert!(e3.attributes().is_empty());
    assert!(e3.id_included());
}

#[test]
fn test_default_attributes_fill_empty_nodes() {
    let compiler = common::compiler();
    let tree = compiler
        .compile("E2", &RequestParams::new().include("e3s").include("e3s.e5.date"))
        .unwrap();

    assert_eq!(
        tree.root.attributes().iter().collect::<Vec<_>>(),
        vec!["name", "address"]
    );
    let e3 = tree.root.child("e3s").unwrap();
    assert_eq!(
        e3.attributes().iter().collect::<Vec<_>>(),
        vec!["name", "phoneNumber"]
    );
    // e5 already has an explicit attribute
    assert_eq!(
        e3.child("e5").unwrap().attributes().iter().collect::<Vec<_>>(),
        vec!["date"]
    );
}

#[test]
fn test_json_array_mixes_paths_and_objects() {
    let compiler = common::bare_compiler();
    let tree = compiler
        .compile(
            "E3",
            &RequestParams::new().include(r#"["name", {"path": "e2"}, "e5.name"]"#),
        )
        .unwrap();
    assert!(tree.root.has_attribute("name"));
    assert!(tree.root.child("e2").is_some());
    assert!(tree.root.child("e5").unwrap().has_attribute("name"));
}

#[test]
fn test_object_path_must_be_a_relationship() {
    let compiler = common::compiler();
    let err = compiler
        .compile("E4", &RequestParams::new().include(r#"{"path": "cInt"}"#))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInclude);
    assert_eq!(
        err.message(),
        "Bad include spec, non-relationship 'path' in include object: cInt"
    );
}

#[test]
fn test_object_path_missing_or_not_text() {
    let compiler = common::compiler();
    for raw in [r#"{"mapBy": "name"}"#, r#"{"path": 5}"#, r#"[{"path": null}]"#] {
        let err = compiler
            .compile("E2", &RequestParams::new().include(raw))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInclude, "{raw}");
    }
}

#[test]
fn test_unparseable_array() {
    let compiler = common::compiler();
    let err = compiler
        .compile("E2", &RequestParams::new().include("[e3s"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInclude);
}

#[test]
fn test_map_by_to_many() {
    let compiler = common::compiler();
    for map_by in ["id", "e5.id", "e5.name", "e5.date", "name"] {
        let raw = format!(r#"{{"path": "e3s", "mapBy": "{map_by}"}}"#);
        let tree = compiler
            .compile("E2", &RequestParams::new().include(raw))
            .unwrap();
        assert_eq!(
            tree.root.child("e3s").unwrap().map_by(),
            Some(&MapBy::new(map_by))
        );
    }
}

#[test]
fn test_map_by_to_one_is_ignored() {
    let compiler = common::compiler();
    let tree = compiler
        .compile(
            "E3",
            &RequestParams::new().include(r#"{"path": "e2", "mapBy": "name"}"#),
        )
        .unwrap();
    let e2 = tree.root.child("e2").unwrap();
    assert!(e2.map_by().is_none());
    assert!(!e2.is_to_many());
}

#[test]
fn test_map_by_errors() {
    let compiler = common::compiler();

    let err = compiler
        .compile(
            "E2",
            &RequestParams::new().include(r#"{"path": "e3s", "mapBy": "nosuch"}"#),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidPath);

    let err = compiler
        .compile(
            "E2",
            &RequestParams::new().include(r#"{"path": "e3s", "mapBy": 1}"#),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInclude);
}

#[test]
fn test_object_modifiers_apply_to_child() {
    let compiler = common::compiler();
    let tree = compiler
        .compile(
            "E2",
            &RequestParams::new().include(
                r#"{"path": "e3s",
                    "sort": [{"property": "name", "direction": "DESC"}, {"property": "name"}],
                    "cayenneExp": {"exp": "name like $n", "params": {"n": "x%"}}}"#,
            ),
        )
        .unwrap();

    let e3 = tree.root.child("e3s").unwrap();
    assert_eq!(
        e3.orderings(),
        &[Ordering::new("name", SortDirection::Descending)]
    );
    assert_eq!(e3.qualifier().unwrap().to_string(), "name like 'x%'");
    assert!(tree.root.orderings().is_empty());
    assert!(tree.root.qualifier().is_none());
}

#[test]
fn test_object_sort_as_string_and_filter_key() {
    let compiler = common::compiler();
    let tree = compiler
        .compile(
            "E2",
            &RequestParams::new()
                .include(r#"{"path": "e3s", "sort": "phoneNumber", "filter": "name = 'a'"}"#),
        )
        .unwrap();
    let e3 = tree.root.child("e3s").unwrap();
    assert_eq!(
        e3.orderings(),
        &[Ordering::new("phoneNumber", SortDirection::Ascending)]
    );
    assert_eq!(e3.qualifier().unwrap().to_string(), "name = 'a'");
}

#[test]
fn test_invalid_path() {
    let compiler = common::compiler();
    for raw in ["nosuch", "e3s.nosuch", ".name", "name.", "name.e3s"] {
        let err = compiler
            .compile("E2", &RequestParams::new().include(raw))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPath, "{raw}");
    }
}
