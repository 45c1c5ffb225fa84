// index_tests.rs
// Index listing, ensure, rename and drop


use bson::doc;
use mongoadmin_core::{AdminError, Connection, IndexSpec, Primitive};
use test_helpers::*;

#[test]
fn test_every_collection_has_id_index() {
    let client = setup();
    seed(&client, "test", "c", 1);

    let listing = client.list_indexes(&ns("test", "c")).unwrap();
    assert!(listing.is_complete());
    assert_eq!(listing.items.len(), 1);
    assert_eq!(listing.items[0].name, "_id_");
    assert_eq!(listing.items[0].keys, doc! {"_id": 1});
}

#[test]
fn test_ensure_index_with_flags() {
    let client = setup();
    let target = ns("test", "people");
    seed(&client, "test", "people", 3);

    client
        .ensure_index(&target, "by_name", r#"{"name": 1, "age": -1}"#, true, true, false)
        .unwrap();

    let indexes = client.list_indexes(&target).unwrap().into_strict().unwrap();
    let by_name = indexes.iter().find(|i| i.name == "by_name").unwrap();
    assert_eq!(by_name.keys.keys().collect::<Vec<_>>(), vec!["name", "age"]);
    assert!(by_name.unique);
    assert!(by_name.background);
    assert!(!by_name.drop_dups);
}

#[test]
fn test_ensure_index_generates_name() {
    let client = setup();
    let target = ns("test", "c");

    client
        .ensure_index(&target, "", r#"{"a": 1, "b": -1}"#, false, false, false)
        .unwrap();

    assert_eq!(
        client.list_index_names(&target).unwrap(),
        vec!["_id_", "a_1_b_-1"]
    );
}

#[test]
fn test_ensure_index_is_idempotent() {
    let client = setup();
    let target = ns("test", "c");

    for _ in 0..2 {
        client
            .ensure_index(&target, "x_1", r#"{"x": 1}"#, false, false, false)
            .unwrap();
    }
    assert_eq!(client.list_index_names(&target).unwrap(), vec!["_id_", "x_1"]);
}

#[test]
fn test_malformed_key_spec_sends_nothing() {
    let client = setup();

    let err = client
        .ensure_index(&ns("test", "c"), "bad", "{name: 1", false, false, false)
        .unwrap_err();

    assert!(matches!(err, AdminError::Parse(_)));
    assert!(err.is_user_error());
    assert_eq!(calls(&client, Primitive::EnsureIndex), 0);
}

#[test]
fn test_unique_index_enforced() {
    let client = setup();
    let target = ns("test", "users");
    client
        .ensure_index(&target, "email_1", r#"{"email": 1}"#, true, false, false)
        .unwrap();
    client
        .insert_document(&doc! {"_id": 1, "email": "a@x"}, "test", "users")
        .unwrap();

    let err = client
        .insert_document(&doc! {"_id": 2, "email": "a@x"}, "test", "users")
        .unwrap_err();
    assert!(matches!(err, AdminError::Command { code: Some(11000), .. }));
}

#[test]
fn test_unique_build_over_duplicates() {
    let client = setup();
    let target = ns("test", "users");
    for (id, email) in [(1, "a@x"), (2, "a@x"), (3, "b@x")] {
        client
            .insert_document(&doc! {"_id": id, "email": email}, "test", "users")
            .unwrap();
    }

    let err = client
        .ensure_index(&target, "email_1", r#"{"email": 1}"#, true, false, false)
        .unwrap_err();
    assert!(matches!(err, AdminError::Command { code: Some(11000), .. }));
    assert_eq!(client.list_index_names(&target).unwrap(), vec!["_id_"]);

    client
        .ensure_index(&target, "email_1", r#"{"email": 1}"#, true, false, true)
        .unwrap();
    let ids: Vec<i32> = all_documents(&client, &target)
        .iter()
        .map(|d| d.get_i32("_id").unwrap())
        .collect();
    assert_eq!(ids, vec![1, 3]);
}

#[test]
fn test_rename_index_keeps_entry_fields_in_order() {
    let client = setup();
    let target = ns("test", "people");
    let spec = IndexSpec::from_json("by_name", r#"{"name": 1}"#)
        .unwrap()
        .with_unique(true)
        .with_background(true);
    client.ensure_index_spec(&target, &spec).unwrap();

    let catalog = target.index_catalog().unwrap();
    let before = client
        .connection()
        .find_one(&catalog, &doc! {"name": "by_name"})
        .unwrap()
        .unwrap();

    client.rename_index(&target, "by_name", "name_idx").unwrap();

    let after = client
        .connection()
        .find_one(&catalog, &doc! {"name": "name_idx"})
        .unwrap()
        .unwrap();
    assert_eq!(
        after.keys().collect::<Vec<_>>(),
        before.keys().collect::<Vec<_>>()
    );
    assert_eq!(after.get_str("ns").unwrap(), "test.people");
    assert_eq!(after.get_document("key").unwrap(), &doc! {"name": 1});
    assert!(after.get_bool("unique").unwrap());
    assert!(after.get_bool("background").unwrap());

    assert_eq!(
        client.list_index_names(&target).unwrap(),
        vec!["_id_", "name_idx"]
    );
}

#[test]
fn test_rename_index_renamed_index_still_enforces_uniqueness() {
    let client = setup();
    let target = ns("test", "users");
    client
        .ensure_index(&target, "email_1", r#"{"email": 1}"#, true, false, false)
        .unwrap();
    client.rename_index(&target, "email_1", "email_unique").unwrap();

    client
        .insert_document(&doc! {"_id": 1, "email": "a@x"}, "test", "users")
        .unwrap();
    let err = client
        .insert_document(&doc! {"_id": 2, "email": "a@x"}, "test", "users")
        .unwrap_err();
    match err {
        AdminError::Command { message, .. } => assert!(message.contains("email_unique")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_rename_missing_index_is_a_noop() {
    let client = setup();
    seed(&client, "test", "c", 1);
    client.connection().clear_journal();

    client.rename_index(&ns("test", "c"), "nope", "still_nope").unwrap();

    assert_eq!(calls(&client, Primitive::DropIndex), 0);
    assert_eq!(calls(&client, Primitive::Insert), 0);
    assert_eq!(client.list_index_names(&ns("test", "c")).unwrap(), vec!["_id_"]);
}

#[test]
fn test_rename_index_only_looks_in_its_own_collection() {
    let client = setup();
    client
        .ensure_index(&ns("test", "a"), "shared", r#"{"x": 1}"#, false, false, false)
        .unwrap();
    seed(&client, "test", "b", 1);

    client.rename_index(&ns("test", "b"), "shared", "moved").unwrap();

    assert_eq!(
        client.list_index_names(&ns("test", "a")).unwrap(),
        vec!["_id_", "shared"]
    );
    assert_eq!(client.list_index_names(&ns("test", "b")).unwrap(), vec!["_id_"]);
}

#[test]
fn test_drop_index() {
    let client = setup();
    let target = ns("test", "c");
    client
        .ensure_index(&target, "x_1", r#"{"x": 1}"#, false, false, false)
        .unwrap();

    client.drop_index(&target, "x_1").unwrap();
    assert_eq!(client.list_index_names(&target).unwrap(), vec!["_id_"]);

    // Missing index: no error
    client.drop_index(&target, "x_1").unwrap();
    client.drop_index(&ns("test", "nowhere"), "x_1").unwrap();
}

#[test]
fn test_drop_id_index_rejected() {
    let client = setup();
    seed(&client, "test", "c", 1);

    let err = client.drop_index(&ns("test", "c"), "_id_").unwrap_err();
    assert!(matches!(err, AdminError::Command { code: Some(72), .. }));
}
