mod common;

use trellis_query::{ErrorKind, Ordering, RequestParams, SortDirection};

fn orderings(params: RequestParams) -> Vec<Ordering> {
    common::compiler()
        .compile("E2", &params)
        .unwrap()
        .root
        .orderings()
        .to_vec()
}

#[test]
fn test_simple_sort_defaults_to_ascending() {
    assert_eq!(
        orderings(RequestParams::new().sort("name")),
        vec![Ordering::new("name", SortDirection::Ascending)]
    );
    assert_eq!(
        orderings(RequestParams::new().sort("name").direction("DESC")),
        vec![Ordering::new("name", SortDirection::Descending)]
    );
}

#[test]
fn test_duplicate_property_yields_one_entry() {
    assert_eq!(
        orderings(RequestParams::new().sort(r#"[{"property": "name"}, {"property": "name"}]"#)),
        vec![Ordering::new("name", SortDirection::Ascending)]
    );
}

#[test]
fn test_first_direction_is_retained() {
    assert_eq!(
        orderings(RequestParams::new().sort(
            r#"[{"property": "name", "direction": "DESC"}, {"property": "name"}]"#
        )),
        vec![Ordering::new("name", SortDirection::Descending)]
    );
}

#[test]
fn test_multiple_properties_keep_order() {
    assert_eq!(
        orderings(RequestParams::new().sort(
            r#"[{"property": "address"}, {"property": "e3s.phoneNumber", "direction": "DESC"}, {"property": "id"}]"#
        )),
        vec![
            Ordering::new("address", SortDirection::Ascending),
            Ordering::new("e3s.phoneNumber", SortDirection::Descending),
            Ordering::new("db:id", SortDirection::Ascending),
        ]
    );
}

#[test]
fn test_storage_prefix_is_preserved() {
    assert_eq!(
        orderings(RequestParams::new().sort("db:NAME_COLUMN").direction("DESC")),
        vec![Ordering::new("db:NAME_COLUMN", SortDirection::Descending)]
    );
}

#[test]
fn test_null_property_is_skipped() {
    assert_eq!(
        orderings(RequestParams::new().sort(r#"[{"property": null}, {"property": "name"}]"#)),
        vec![Ordering::new("name", SortDirection::Ascending)]
    );
}

#[test]
fn test_direction_is_case_sensitive() {
    for direction in ["asc", "desc", "Ascending", ""] {
        let err = common::compiler()
            .compile("E2", &RequestParams::new().sort("name").direction(direction))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDirection, "{direction}");
    }

    let err = common::compiler()
        .compile(
            "E2",
            &RequestParams::new().sort(r#"[{"property": "name", "direction": "up"}]"#),
        )
        .unwrap_err();
    assert_eq!(err.message(), "Direction is invalid: up");
}

#[test]
fn test_malformed_structured_sort() {
    for raw in [r#"[{"property": 1}]"#, r#"["#, r#"[true]"#, r#"[{"dir": "ASC"}]"#] {
        let err = common::compiler()
            .compile("E2", &RequestParams::new().sort(raw))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedSort, "{raw}");
    }
}

#[test]
fn test_unknown_sort_path() {
    let err = common::compiler()
        .compile("E2", &RequestParams::new().sort("nosuch"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidPath);
}
