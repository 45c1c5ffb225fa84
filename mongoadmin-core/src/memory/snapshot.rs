// mongoadmin-core/src/memory/snapshot.rs
// Whole-server snapshots as a single BSON document
//
// Layout:
//   { format: "mongoadmin-snapshot", version: 1,
//     databases: { <db>: { <collection>: [ <doc>, ... ], ... }, ... } }

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use bson::{Bson, Document};

use super::state::{DatabaseState, ServerState};
use crate::error::{AdminError, Result};

const FORMAT: &str = "mongoadmin-snapshot";
const VERSION: i32 = 1;

pub(crate) fn encode(state: &ServerState) -> Document {
    let mut databases = Document::new();
    for (db_name, db) in &state.databases {
        let mut collections = Document::new();
        for (coll_name, documents) in &db.collections {
            let docs: Vec<Bson> = documents.iter().cloned().map(Bson::Document).collect();
            collections.insert(coll_name.clone(), docs);
        }
        databases.insert(db_name.clone(), collections);
    }

    let mut snapshot = Document::new();
    snapshot.insert("format", FORMAT);
    snapshot.insert("version", VERSION);
    snapshot.insert("databases", databases);
    snapshot
}

pub(crate) fn decode(snapshot: &Document) -> Result<ServerState> {
    if snapshot.get_str("format").ok() != Some(FORMAT) {
        return Err(AdminError::InvalidArgument(
            "not a mongoadmin snapshot".to_string(),
        ));
    }
    let version = snapshot.get_i32("version").unwrap_or(0);
    if version != VERSION {
        return Err(AdminError::InvalidArgument(format!(
            "unsupported snapshot version {}",
            version
        )));
    }
    let databases = snapshot
        .get_document("databases")
        .map_err(|e| AdminError::InvalidArgument(format!("snapshot databases: {}", e)))?;

    let mut state = ServerState::default();
    for (db_name, collections) in databases {
        let Bson::Document(collections) = collections else {
            return Err(AdminError::InvalidArgument(format!(
                "snapshot database '{}' is not a document",
                db_name
            )));
        };
        let mut db = DatabaseState::default();
        for (coll_name, documents) in collections {
            let Bson::Array(items) = documents else {
                return Err(AdminError::InvalidArgument(format!(
                    "snapshot collection '{}.{}' is not an array",
                    db_name, coll_name
                )));
            };
            let docs = items
                .iter()
                .map(|item| match item {
                    Bson::Document(d) => Ok(d.clone()),
                    _ => Err(AdminError::InvalidArgument(format!(
                        "non-document entry in '{}.{}'",
                        db_name, coll_name
                    ))),
                })
                .collect::<Result<Vec<_>>>()?;
            db.collections.insert(coll_name.clone(), docs);
        }
        state.databases.insert(db_name.clone(), db);
    }
    Ok(state)
}

/// Write the snapshot next to `path` and rename it into place
pub(crate) fn write(state: &ServerState, path: &Path) -> Result<()> {
    let tmp = path.with_extension("tmp");
    {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        encode(state).to_writer(&mut writer)?;
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

pub(crate) fn read(path: &Path) -> Result<ServerState> {
    let mut reader = BufReader::new(File::open(path)?);
    let snapshot = Document::from_reader(&mut reader)?;
    decode(&snapshot)
}
