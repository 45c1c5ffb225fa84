// document_tests.rs
// Query, insert, save and remove through the facade


use bson::{doc, Bson};
use mongoadmin_core::{AdminError, Primitive, QueryRequest};
use test_helpers::*;

#[test]
fn test_query_limit_is_clamped() {
    let client = setup();
    seed(&client, "test", "many", 200);

    let count = |limit: u32| {
        client
            .query_documents(&QueryRequest::new("test", "many").with_limit(limit))
            .unwrap()
            .len()
    };

    assert_eq!(count(0), 50);
    assert_eq!(count(200), 50);
    assert_eq!(count(52), 50);
    assert_eq!(count(51), 51);
    assert_eq!(count(10), 10);
}

#[test]
fn test_query_filter_sort_skip_projection() {
    let client = setup();
    for (id, name, age) in [(1, "Ann", 31), (2, "Bob", 25), (3, "Cid", 40), (4, "Dee", 19)] {
        client
            .insert_document(&doc! {"_id": id, "name": name, "age": age}, "test", "people")
            .unwrap();
    }

    let request = QueryRequest::new("test", "people")
        .with_filter(doc! {"age": {"$gte": 20}})
        .with_sort(doc! {"age": -1})
        .with_skip(1)
        .with_projection(doc! {"name": 1, "_id": 0});
    let docs = client.query_documents(&request).unwrap();

    assert_eq!(docs, vec![doc! {"name": "Ann"}, doc! {"name": "Bob"}]);
}

#[test]
fn test_query_missing_collection_is_empty() {
    let client = setup();
    let docs = client
        .query_documents(&QueryRequest::new("test", "nothing"))
        .unwrap();
    assert!(docs.is_empty());
}

#[test]
fn test_insert_generates_id_first() {
    let client = setup();
    client
        .insert_document(&doc! {"name": "x"}, "test", "c")
        .unwrap();

    let docs = all_documents(&client, &ns("test", "c"));
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].keys().collect::<Vec<_>>(), vec!["_id", "name"]);
    assert!(matches!(docs[0].get("_id"), Some(Bson::ObjectId(_))));
}

#[test]
fn test_insert_duplicate_id_fails() {
    let client = setup();
    client.insert_document(&doc! {"_id": 1}, "test", "c").unwrap();

    let err = client
        .insert_document(&doc! {"_id": 1, "again": true}, "test", "c")
        .unwrap_err();
    match err {
        AdminError::Command { code, message } => {
            assert_eq!(code, Some(11000));
            assert!(message.contains("E11000"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_save_without_id_writes_nothing() {
    let client = setup();

    let err = client
        .save_document(&doc! {"name": "no id"}, "test", "c")
        .unwrap_err();

    assert!(matches!(err, AdminError::InvalidArgument(_)));
    assert_eq!(calls(&client, Primitive::Update), 0);
    assert_eq!(calls(&client, Primitive::Insert), 0);
}

#[test]
fn test_save_replaces_then_inserts() {
    let client = setup();
    client
        .insert_document(&doc! {"_id": 1, "name": "a", "extra": true}, "test", "c")
        .unwrap();

    client
        .save_document(&doc! {"_id": 1, "name": "b"}, "test", "c")
        .unwrap();
    client
        .save_document(&doc! {"_id": 2, "name": "new"}, "test", "c")
        .unwrap();

    let found = client
        .query_documents(&QueryRequest::new("test", "c").with_filter(doc! {"_id": 1}))
        .unwrap();
    assert_eq!(found, vec![doc! {"_id": 1, "name": "b"}]);
    assert_eq!(
        all_documents(&client, &ns("test", "c")),
        vec![doc! {"_id": 1, "name": "b"}, doc! {"_id": 2, "name": "new"}]
    );

    let updates: Vec<_> = client
        .connection()
        .journal()
        .into_iter()
        .filter(|e| e.primitive == Primitive::Update)
        .collect();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].target, "test.c");
}

#[test]
fn test_remove_one_or_all() {
    let client = setup();
    for i in 0..4 {
        client
            .insert_document(&doc! {"_id": i, "kind": "tmp"}, "test", "c")
            .unwrap();
    }

    client
        .remove_documents("test", "c", &doc! {"kind": "tmp"}, true)
        .unwrap();
    assert_eq!(all_documents(&client, &ns("test", "c")).len(), 3);

    client
        .remove_documents("test", "c", &doc! {"kind": "tmp"}, false)
        .unwrap();
    assert!(all_documents(&client, &ns("test", "c")).is_empty());
}

#[test]
fn test_connection_failure_surfaces_unchanged() {
    let client = setup();
    client
        .connection()
        .fail_next(Primitive::Query, AdminError::Connection("socket closed".into()));

    let err = client
        .query_documents(&QueryRequest::new("test", "c"))
        .unwrap_err();
    assert!(matches!(err, AdminError::Connection(msg) if msg == "socket closed"));

    // Only the next call fails
    assert!(client.query_documents(&QueryRequest::new("test", "c")).is_ok());
}
