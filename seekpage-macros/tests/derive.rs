//! End-to-end checks for `#[derive(SortKeys)]`.

use seekpage::{CursorValue, PaginateError, SortKeys, extract_boundary};
use serde::Serialize;

#[derive(SortKeys, Serialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    id: i64,
    created_at: String,
    #[serde(rename = "headline")]
    title: String,
    rating: Option<f64>,
    #[serde(skip)]
    #[allow(dead_code)]
    draft_notes: String,
    #[sort_key(rename = "pinnedFlag")]
    pinned: bool,
}

#[derive(SortKeys)]
struct Wrapper<T> {
    seq: T,
}

fn article() -> Article {
    Article {
        id: 7,
        created_at: "2024-03-01T00:00:00Z".into(),
        title: "Keyset all the things".into(),
        rating: None,
        draft_notes: String::new(),
        pinned: true,
    }
}

#[test]
fn external_names_match_serialized_keys() {
    assert_eq!(
        Article::SORT_KEYS,
        &["id", "createdAt", "headline", "rating", "pinnedFlag"]
    );

    // The serde-derived names agree with what the row serializes as
    let json = serde_json::to_value(article()).unwrap();
    for key in ["id", "createdAt", "headline", "rating"] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
}

#[test]
fn lookups_convert_values() {
    let row = article();
    assert_eq!(row.sort_key("id"), Some(CursorValue::Int(7)));
    assert_eq!(
        row.sort_key("headline"),
        Some(CursorValue::Text("Keyset all the things".into()))
    );
    assert_eq!(row.sort_key("rating"), Some(CursorValue::Null));
    assert_eq!(row.sort_key("pinnedFlag"), Some(CursorValue::Bool(true)));
    assert_eq!(row.sort_key("title"), None);
    assert_eq!(row.sort_key("draftNotes"), None);
}

#[test]
fn boundary_uses_external_names() {
    let fields = vec!["a.createdAt".to_string(), "a.id".to_string()];
    let cursor = extract_boundary(&article(), &fields).unwrap();

    assert_eq!(cursor.fields[0].0, "createdAt");
    assert_eq!(cursor.fields[1], ("id".to_string(), CursorValue::Int(7)));

    let err = extract_boundary(&article(), &["created_at".to_string()]).unwrap_err();
    assert!(matches!(err, PaginateError::SchemaMismatch { .. }));
}

#[test]
fn generic_rows() {
    let row = Wrapper { seq: 3u32 };
    assert_eq!(Wrapper::<u32>::SORT_KEYS, &["seq"]);
    assert_eq!(row.sort_key("seq"), Some(CursorValue::Int(3)));
}
