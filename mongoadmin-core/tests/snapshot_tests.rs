// snapshot_tests.rs
// Saving and reopening the in-memory server


use bson::doc;
use mongoadmin_core::{AdminClient, AdminError, Function, MemoryConnection, User};
use tempfile::TempDir;
use test_helpers::*;

#[test]
fn test_snapshot_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("server.snapshot");

    let client = setup();
    seed(&client, "shop", "orders", 10);
    client
        .ensure_index(&ns("shop", "orders"), "n_1", r#"{"n": 1}"#, true, false, false)
        .unwrap();
    client
        .create_user("shop", &User::with_password("admin", "pw"), false)
        .unwrap();
    client
        .create_function("shop", &Function::new("f", "function() {}"), None)
        .unwrap();
    client.create_database("empty").unwrap();
    client.connection().save_snapshot(&path).unwrap();

    let reopened = AdminClient::new(MemoryConnection::open_snapshot(&path).unwrap());

    assert_eq!(
        reopened.list_database_names().unwrap(),
        client.list_database_names().unwrap()
    );
    assert_eq!(
        reopened.list_collection_names("shop").unwrap(),
        vec!["orders", "system.js", "system.users"]
    );
    assert_eq!(
        all_documents(&reopened, &ns("shop", "orders")),
        all_documents(&client, &ns("shop", "orders"))
    );
    assert_eq!(
        reopened.list_index_names(&ns("shop", "orders")).unwrap(),
        vec!["_id_", "n_1"]
    );
    assert_eq!(reopened.list_users("shop").unwrap(), client.list_users("shop").unwrap());

    // Unique index still enforced after reload
    let err = reopened
        .insert_document(&doc! {"_id": 100, "n": 3}, "shop", "orders")
        .unwrap_err();
    assert!(matches!(err, AdminError::Command { code: Some(11000), .. }));
}

#[test]
fn test_open_or_create_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.snapshot");

    let conn = MemoryConnection::open_or_create(&path).unwrap();
    let client = AdminClient::new(conn);
    assert!(client.list_database_names().unwrap().is_empty());
    assert!(!path.exists());
}

#[test]
fn test_open_snapshot_missing_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = MemoryConnection::open_snapshot(temp_dir.path().join("absent")).err().unwrap();
    assert!(matches!(err, AdminError::Io(_)));
}

#[test]
fn test_open_snapshot_rejects_garbage() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("garbage.snapshot");
    std::fs::write(&path, b"definitely not bson").unwrap();

    assert!(MemoryConnection::open_snapshot(&path).is_err());
}

#[test]
fn test_open_snapshot_rejects_foreign_document() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("foreign.snapshot");
    let mut bytes = Vec::new();
    doc! {"hello": "world"}.to_writer(&mut bytes).unwrap();
    std::fs::write(&path, bytes).unwrap();

    let err = MemoryConnection::open_snapshot(&path).err().unwrap();
    assert!(matches!(err, AdminError::InvalidArgument(_)));
}
