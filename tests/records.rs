use std::collections::HashMap;

use chrono::{DateTime, Utc};
use facet::Facet;
use facet_query::{Container, QueryErrorKind, query, query_with_metadata_keys};

#[derive(Facet)]
struct Querier {
    #[facet(json = "a")]
    a: String,
    #[facet(json = "age")]
    age: i32,
    #[facet(header = "map_items")]
    #[facet(xml = "xmap-items")]
    map_items: HashMap<String, String>,
    #[facet(header = "hchildren")]
    #[facet(xml = "children")]
    children: Vec<Box<Child>>,
}

#[derive(Facet)]
struct Child {
    #[facet(param = "marco")]
    marco: DateTime<Utc>,
    #[facet(param = "polo")]
    polo: Option<DateTime<Utc>>,
    #[facet(json = "scoreboard")]
    scoreboard: Vec<i32>,
}

fn fixture() -> Querier {
    let at = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
    Querier {
        a: "real nice".to_string(),
        age: 42,
        map_items: HashMap::from([
            ("waldo".to_string(), "weldo".to_string()),
            ("fred".to_string(), "flintspears".to_string()),
        ]),
        children: vec![
            Box::new(Child {
                marco: at,
                polo: Some(at),
                scoreboard: vec![1, 2, 3, 4, 5],
            }),
            Box::new(Child {
                marco: at,
                polo: None,
                scoreboard: vec![6, 7, 8, 9, 10, 11],
            }),
        ],
    }
}

#[test]
fn annotations_and_names() {
    let qx = fixture();

    assert_eq!(query(&qx, ["a"]).as_string(), qx.a);
    assert_eq!(query(&qx, ["age"]).as_int(), 42);
    assert_eq!(query(&qx, ["Age"]).as_int(), 42);
    assert_eq!(query(&qx, ["xmap-items", "waldo"]).as_string(), "weldo");
    assert_eq!(query(&qx, ["MapItems", "waldo"]).as_string(), "weldo");
    assert_eq!(query(&qx, ["map_items", "fred"]).as_string(), "flintspears");
}

#[test]
fn multi_step_path() {
    let qx = fixture();
    assert_eq!(
        query(&qx, ["hchildren", "0", "Scoreboard", "1"]).as_int(),
        qx.children[0].scoreboard[1] as i64
    );
    assert_eq!(query(&qx, ["children", "last", "scoreboard", "last"]).as_int(), 11);
}

#[test]
fn optional_fields() {
    let qx = fixture();

    let mut marco = query(&qx, ["hchildren", "0", "marco"]);
    assert_eq!(marco.as_timestamp(), qx.children[0].marco);

    let mut polo = query(&qx, ["hchildren", "0", "polo"]);
    assert_eq!(polo.as_timestamp().timestamp(), 1_700_000_000);
    assert!(polo.last_error().is_none());

    let mut polo = query(&qx, ["hchildren", "1", "polo"]);
    assert!(polo.last_error().is_none());
    assert_eq!(polo.as_timestamp().timestamp(), 0);
    assert_eq!(
        polo.last_error().map(|e| e.kind()),
        Some(&QueryErrorKind::NilValue)
    );
}

#[test]
fn unknown_field() {
    let qx = fixture();
    let node = query(&qx, ["nope"]);
    assert_eq!(
        node.last_error().map(|e| e.kind()),
        Some(&QueryErrorKind::FieldNotFound("nope".to_string()))
    );
}

#[test]
fn lower_case_tokens_do_not_match_names() {
    #[derive(Facet)]
    struct Plain {
        count: u32,
    }

    let value = Plain { count: 1 };
    let node = query(&value, ["count"]);
    assert!(matches!(
        node.last_error().map(|e| e.kind()),
        Some(QueryErrorKind::FieldNotFound(_))
    ));
}

#[test]
fn name_match_bypasses_annotations() {
    #[derive(Facet)]
    struct Shadowed {
        #[facet(json = "Total")]
        first: u32,
        total: u32,
    }

    let value = Shadowed {
        first: 1,
        total: 2,
    };
    assert_eq!(query(&value, ["Total"]).as_int(), 2);
}

#[test]
fn field_order_outranks_key_order() {
    #[derive(Facet)]
    struct Tied {
        #[facet(header = "id")]
        first: u32,
        #[facet(json = "id")]
        second: u32,
    }

    let value = Tied {
        first: 1,
        second: 2,
    };
    let mut node = query_with_metadata_keys(&value, ["json", "header"], ["id"]);
    assert_eq!(node.as_int(), 1);
}

#[test]
fn key_order_breaks_ties_on_one_field() {
    #[derive(Facet)]
    struct Dual {
        #[facet(json = "x")]
        #[facet(header = "y")]
        only: u32,
    }

    let value = Dual { only: 5 };
    assert_eq!(query(&value, ["x"]).as_int(), 5);
    assert_eq!(query(&value, ["y"]).as_int(), 5);
}

#[test]
fn metadata_keys_restrict_annotations() {
    let qx = fixture();

    let node = query_with_metadata_keys(&qx, ["xml"], ["hchildren"]);
    assert!(matches!(
        node.last_error().map(|e| e.kind()),
        Some(QueryErrorKind::FieldNotFound(_))
    ));

    let mut node = query_with_metadata_keys(&qx, ["xml"], ["children", "1", "Scoreboard", "0"]);
    assert_eq!(node.as_int(), 6);
    assert_eq!(node.metadata_keys(), ["xml".to_string()]);
}

#[test]
fn empty_record() {
    #[derive(Facet)]
    struct Empty {}

    let value = Empty {};
    let node = query(&value, ["anything"]);
    assert_eq!(
        node.last_error().map(|e| e.kind()),
        Some(&QueryErrorKind::EmptyContainer(Container::Record))
    );
}

#[test]
fn scalars_are_unsupported() {
    let node = query(&7_u32, ["0"]);
    assert!(matches!(
        node.last_error().map(|e| e.kind()),
        Some(QueryErrorKind::UnsupportedType(_))
    ));
    assert!(node.raw_value().is_none());

    let text = "text".to_string();
    let node = query(&text, ["0"]);
    assert!(matches!(
        node.last_error().map(|e| e.kind()),
        Some(QueryErrorKind::UnsupportedType(_))
    ));
}

#[test]
fn nil_root() {
    let nothing: Option<Child> = None;
    let node = query(&nothing, ["marco"]);
    assert_eq!(
        node.last_error().map(|e| e.kind()),
        Some(&QueryErrorKind::NilValue)
    );
}

#[test]
fn no_tokens_returns_the_value() {
    let mut node = query(&42_u16, Vec::<String>::new());
    assert!(node.last_error().is_none());
    assert_eq!(node.as_int(), 42);
}

#[test]
fn chained_queries() {
    let qx = fixture();
    let children = query(&qx, ["hchildren"]);

    assert_eq!(children.query(["0", "Scoreboard", "2"]).as_int(), 3);
    assert_eq!(children.query(["1", "scoreboard", "0"]).as_int(), 6);
}

#[test]
fn set_metadata_keys_applies_to_later_steps() {
    let qx = fixture();
    let mut root = query(&qx, Vec::<&str>::new());
    root.set_metadata_keys(["xml"]);

    assert_eq!(root.query(["children", "0", "Scoreboard", "4"]).as_int(), 5);
    assert!(root.query(["hchildren"]).last_error().is_some());
}

#[test]
fn descending_into_none_field() {
    #[derive(Facet)]
    struct Holder {
        #[facet(json = "maybe")]
        maybe: Option<Vec<u32>>,
    }

    let empty = Holder { maybe: None };
    let node = query(&empty, ["maybe", "0"]);
    assert_eq!(
        node.last_error().map(|e| e.kind()),
        Some(&QueryErrorKind::NilValue)
    );

    let full = Holder {
        maybe: Some(vec![9]),
    };
    assert_eq!(query(&full, ["maybe", "0"]).as_int(), 9);
}

#[test]
fn empty_token_matches_no_field() {
    #[derive(Facet)]
    struct Mixed {
        bare: u32,
        #[facet(json = "tagged")]
        tagged: u32,
    }

    let value = Mixed { bare: 1, tagged: 2 };
    let node = query(&value, [""]);
    assert_eq!(
        node.last_error().map(|e| e.kind()),
        Some(&QueryErrorKind::FieldNotFound(String::new()))
    );
}
