// mongoadmin-core/src/memory/commands.rs
//! Administrative commands understood by the in-memory server
//!
//! Failures are reported the way the server does it: an `ok: 0` reply with
//! `errmsg` and `code`, not an `Err`. Only internal encoding problems
//! surface as `Err`.

use bson::{doc, Bson, Document};

use super::state::ServerState;
use crate::client::ADMIN_DATABASE;
use crate::document::with_field_replaced;
use crate::error::Result;
use crate::namespace::Namespace;
use crate::value_utils::as_i64;
use crate::SYSTEM_INDEXES;

const ILLEGAL_OPERATION: i32 = 20;
const UNAUTHORIZED: i32 = 13;
const NAMESPACE_NOT_FOUND: i32 = 26;
const NAMESPACE_EXISTS: i32 = 48;
const COMMAND_NOT_FOUND: i32 = 59;
const INVALID_NAMESPACE: i32 = 73;
const BAD_VALUE: i32 = 2;

/// Reported size of one index, in bytes
const INDEX_BUCKET_SIZE: i64 = 8176;

/// Storage is reported in whole blocks of this size
const STORAGE_BLOCK: i64 = 4096;

pub(crate) fn run(state: &mut ServerState, database: &str, command: &Document) -> Result<Document> {
    let Some((name, argument)) = command.iter().next() else {
        return Ok(failure(COMMAND_NOT_FOUND, "no such cmd: "));
    };
    match name.as_str() {
        "ping" => Ok(doc! {"ok": 1.0}),
        "renameCollection" => Ok(rename_collection(state, database, argument, command)),
        "collStats" => coll_stats(state, database, argument, command),
        "dbStats" => db_stats(state, database),
        other => Ok(failure(COMMAND_NOT_FOUND, format!("no such cmd: {}", other))),
    }
}

fn failure(code: i32, message: impl Into<String>) -> Document {
    let message: String = message.into();
    doc! {"ok": 0.0, "errmsg": message, "code": code}
}

// ============================================================================
// renameCollection
// ============================================================================

fn rename_collection(
    state: &mut ServerState,
    database: &str,
    source: &Bson,
    command: &Document,
) -> Document {
    if database != ADMIN_DATABASE {
        return failure(
            UNAUTHORIZED,
            "renameCollection may only be run against the admin database.",
        );
    }
    let parsed = match (source, command.get("to")) {
        (Bson::String(from), Some(Bson::String(to))) => {
            Namespace::parse(from).and_then(|f| Namespace::parse(to).map(|t| (f, t)))
        }
        _ => return failure(BAD_VALUE, "renameCollection and to must be namespace strings"),
    };
    let (from, to) = match parsed {
        Ok(pair) => pair,
        Err(err) => return failure(INVALID_NAMESPACE, err.to_string()),
    };
    if from == to {
        return failure(ILLEGAL_OPERATION, "Can't rename a collection to itself");
    }
    if state.collection(&from).is_none() {
        return failure(NAMESPACE_NOT_FOUND, "source namespace does not exist");
    }
    if state.collection(&to).is_some() {
        if !command.get_bool("dropTarget").unwrap_or(false) {
            return failure(NAMESPACE_EXISTS, "target namespace exists");
        }
        drop_collection(state, &to);
    }

    let documents = state
        .databases
        .get_mut(from.database_name())
        .and_then(|db| db.collections.remove(from.collection_name()))
        .unwrap_or_default();

    let mut moved = Vec::new();
    let target_ns = Bson::String(to.to_string());
    state.remove_index_entries(&from, |entry| {
        moved.push(with_field_replaced(entry, "ns", target_ns.clone()));
        true
    });

    let target_db = state
        .databases
        .entry(to.database_name().to_string())
        .or_default();
    target_db
        .collections
        .insert(to.collection_name().to_string(), documents);
    target_db
        .collections
        .entry(SYSTEM_INDEXES.to_string())
        .or_default()
        .extend(moved);

    tracing::debug!(from = %from, to = %to, "collection renamed");
    doc! {"ok": 1.0}
}

/// Remove a collection and its catalog entries
pub(crate) fn drop_collection(state: &mut ServerState, ns: &Namespace) -> bool {
    let existed = state
        .databases
        .get_mut(ns.database_name())
        .and_then(|db| db.collections.remove(ns.collection_name()))
        .is_some();
    state.remove_index_entries(ns, |_| true);
    existed
}

// ============================================================================
// collStats / dbStats
// ============================================================================

fn bson_size(doc: &Document) -> Result<i64> {
    let mut buf = Vec::new();
    doc.to_writer(&mut buf)?;
    Ok(buf.len() as i64)
}

fn storage_for(size: i64) -> i64 {
    let blocks = (size + STORAGE_BLOCK - 1) / STORAGE_BLOCK;
    blocks.max(1) * STORAGE_BLOCK
}

fn coll_stats(
    state: &ServerState,
    database: &str,
    collection: &Bson,
    command: &Document,
) -> Result<Document> {
    let Bson::String(collection) = collection else {
        return Ok(failure(BAD_VALUE, "collStats needs a collection name"));
    };
    let ns = match Namespace::new(database, collection.as_str()) {
        Ok(ns) => ns,
        Err(err) => return Ok(failure(INVALID_NAMESPACE, err.to_string())),
    };
    let scale = command.get("scale").and_then(as_i64).unwrap_or(1);
    if scale < 1 {
        return Ok(failure(BAD_VALUE, "scale has to be >= 1"));
    }
    let Some(documents) = state.collection(&ns) else {
        return Ok(failure(NAMESPACE_NOT_FOUND, "ns not found"));
    };

    let count = documents.len() as i64;
    let mut size = 0;
    for doc in documents {
        size += bson_size(doc)?;
    }
    let avg_obj_size = if count == 0 { 0.0 } else { size as f64 / count as f64 };

    let mut index_sizes = Document::new();
    for entry in state.index_entries(&ns) {
        if let Ok(name) = entry.get_str("name") {
            index_sizes.insert(name, INDEX_BUCKET_SIZE / scale);
        }
    }
    let index_count = index_sizes.len() as i32;
    let total_index_size = i64::from(index_count) * INDEX_BUCKET_SIZE / scale;
    let scaled_size = size / scale;
    let scaled_storage = storage_for(size) / scale;

    Ok(doc! {
        "ns": ns.to_string(),
        "count": count,
        "size": scaled_size,
        "avgObjSize": avg_obj_size,
        "storageSize": scaled_storage,
        "nindexes": index_count,
        "totalIndexSize": total_index_size,
        "indexSizes": index_sizes,
        "scale": scale,
        "ok": 1.0,
    })
}

fn db_stats(state: &ServerState, database: &str) -> Result<Document> {
    let mut collections = 0i32;
    let mut objects = 0i64;
    let mut data_size = 0i64;
    let mut storage_size = 0i64;
    let mut indexes = 0i64;

    if let Some(db) = state.databases.get(database) {
        for (name, documents) in &db.collections {
            collections += 1;
            objects += documents.len() as i64;
            let mut size = 0;
            for doc in documents {
                size += bson_size(doc)?;
            }
            data_size += size;
            storage_size += storage_for(size);
            if name == SYSTEM_INDEXES {
                indexes += documents.len() as i64;
            }
        }
    }

    let avg_obj_size = if objects == 0 { 0.0 } else { data_size as f64 / objects as f64 };
    let index_size = indexes * INDEX_BUCKET_SIZE;
    Ok(doc! {
        "db": database,
        "collections": collections,
        "objects": objects,
        "avgObjSize": avg_obj_size,
        "dataSize": data_size,
        "storageSize": storage_size,
        "indexes": indexes,
        "indexSize": index_size,
        "ok": 1.0,
    })
}
