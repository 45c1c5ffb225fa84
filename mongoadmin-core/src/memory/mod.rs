// mongoadmin-core/src/memory/mod.rs
//! In-memory document server implementing [`Connection`]
//!
//! Behaves like a legacy server as far as the facade can observe:
//!
//! - a database exists from its first write until it is dropped; dropping
//!   its last collection keeps it
//! - every collection gets an `_id_` index, and the index catalog is the
//!   ordinary `<db>.system.indexes` collection (inserting into it creates
//!   an index)
//! - `_id` and unique indexes are enforced with E11000 errors
//!
//! Each primitive call is recorded in a journal, and failures can be
//! injected per primitive, so tests can observe exactly what the facade
//! sent.
//!
//! # Examples
//!
//! ```
//! use bson::doc;
//! use mongoadmin_core::{AdminClient, MemoryConnection};
//!
//! let client = AdminClient::new(MemoryConnection::new());
//! client.insert_document(&doc! {"_id": 1}, "test", "coll")?;
//! assert_eq!(client.list_collection_names("test")?, vec!["coll"]);
//! # Ok::<(), mongoadmin_core::AdminError>(())
//! ```

mod commands;
mod find_options;
mod matcher;
mod snapshot;
mod state;

use std::path::Path;

use bson::oid::ObjectId;
use bson::{Bson, Document};
use parking_lot::{Mutex, RwLock};

use crate::connection::{Connection, DocumentCursor};
use crate::document::{field_filter, ID_FIELD};
use crate::error::{AdminError, Result};
use crate::index::{IndexSpec, ID_INDEX_NAME};
use crate::namespace::Namespace;
use crate::query::QuerySpec;
use crate::SYSTEM_INDEXES;

pub use find_options::{apply_projection, apply_sort};
pub use matcher::matches_filter;

use state::{index_key, keys_equal, ServerState};

const ILLEGAL_OPERATION: i32 = 20;
const CANNOT_DROP_ID_INDEX: i32 = 72;
const IMMUTABLE_FIELD: i32 = 66;
const INDEX_OPTIONS_CONFLICT: i32 = 85;
const INDEX_KEY_SPECS_CONFLICT: i32 = 86;
const NAMESPACE_EXISTS: i32 = 48;
const INVALID_NAMESPACE: i32 = 73;

/// Connection primitives, as recorded in the journal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    DatabaseNames,
    CollectionNames,
    ListIndexes,
    Query,
    Insert,
    Update,
    Remove,
    EnsureIndex,
    DropIndex,
    CreateCollection,
    DropCollection,
    DropDatabase,
    Exists,
    RunCommand,
}

/// One primitive call and its target (namespace or database)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub primitive: Primitive,
    pub target: String,
}

#[derive(Default)]
pub struct MemoryConnection {
    state: RwLock<ServerState>,
    journal: Mutex<Vec<JournalEntry>>,
    failures: Mutex<Vec<(Primitive, AdminError)>>,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a server previously written with [`save_snapshot`](Self::save_snapshot)
    pub fn open_snapshot<P: AsRef<Path>>(path: P) -> Result<Self> {
        let state = snapshot::read(path.as_ref())?;
        Ok(MemoryConnection {
            state: RwLock::new(state),
            ..Self::default()
        })
    }

    /// Like [`open_snapshot`](Self::open_snapshot), but a missing file gives
    /// an empty server
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open_snapshot(path)
        } else {
            Ok(Self::new())
        }
    }

    pub fn save_snapshot<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let state = self.state.read();
        snapshot::write(&state, path.as_ref())
    }

    /// Make the next call of `primitive` fail with `error`
    pub fn fail_next(&self, primitive: Primitive, error: AdminError) {
        self.failures.lock().push((primitive, error));
    }

    /// Every primitive call so far, in call order
    pub fn journal(&self) -> Vec<JournalEntry> {
        self.journal.lock().clone()
    }

    /// Number of journalled calls of `primitive`
    pub fn calls(&self, primitive: Primitive) -> usize {
        self.journal
            .lock()
            .iter()
            .filter(|e| e.primitive == primitive)
            .count()
    }

    pub fn clear_journal(&self) {
        self.journal.lock().clear();
    }

    /// Journal the call, then fire an injected failure if one is pending
    fn enter(&self, primitive: Primitive, target: impl ToString) -> Result<()> {
        self.journal.lock().push(JournalEntry {
            primitive,
            target: target.to_string(),
        });
        let mut failures = self.failures.lock();
        if let Some(pos) = failures.iter().position(|(p, _)| *p == primitive) {
            let (_, error) = failures.remove(pos);
            return Err(error);
        }
        Ok(())
    }

    // ========================================================================
    // WRITE HELPERS (caller holds the write lock)
    // ========================================================================

    fn insert_locked(state: &mut ServerState, ns: &Namespace, doc: &Document) -> Result<()> {
        if ns.is_database() {
            return Err(AdminError::command_with_code(
                INVALID_NAMESPACE,
                format!("invalid ns to insert into: {}", ns),
            ));
        }
        if ns.collection_name() == SYSTEM_INDEXES {
            return Self::insert_catalog_entry(state, ns, doc);
        }

        let doc = with_id(doc);
        state.check_unique(ns, &doc, None)?;
        state.ensure_collection(ns).push(doc);
        Ok(())
    }

    /// Insert straight into the index catalog, which creates the index
    fn insert_catalog_entry(state: &mut ServerState, catalog: &Namespace, entry: &Document) -> Result<()> {
        let spec = IndexSpec::from_catalog_entry(entry)?;
        let target = match entry.get_str("ns") {
            Ok(ns) => Namespace::parse(ns)?,
            Err(_) => {
                return Err(AdminError::InvalidArgument(
                    "index catalog entry has no 'ns'".to_string(),
                ))
            }
        };
        if target.database_name() != catalog.database_name() {
            return Err(AdminError::command_with_code(
                INVALID_NAMESPACE,
                format!("index ns {} is not in database {}", target, catalog.database_name()),
            ));
        }

        state.ensure_collection(&target);
        if let Some(existing) = find_index(state, &target, &spec.name)? {
            if existing.keys.iter().eq(spec.keys.iter()) {
                return Ok(());
            }
            return Err(AdminError::command_with_code(
                INDEX_KEY_SPECS_CONFLICT,
                format!("Index with name: {} already exists with different options", spec.name),
            ));
        }
        build_unique(state, &target, &spec)?;
        state.ensure_collection(catalog).push(entry.clone());
        Ok(())
    }

    fn update_locked(
        state: &mut ServerState,
        ns: &Namespace,
        filter: &Document,
        update: &Document,
        upsert: bool,
        multi: bool,
    ) -> Result<()> {
        let operators = is_operator_update(update)?;
        if multi && !operators {
            return Err(AdminError::command_with_code(
                ILLEGAL_OPERATION,
                "multi update only works with $ operators",
            ));
        }

        let positions: Vec<usize> = match state.collection(ns) {
            Some(docs) => {
                let mut hits = Vec::new();
                for (i, doc) in docs.iter().enumerate() {
                    if matches_filter(doc, filter)? {
                        hits.push(i);
                        if !multi {
                            break;
                        }
                    }
                }
                hits
            }
            None => Vec::new(),
        };

        if positions.is_empty() {
            if !upsert {
                return Ok(());
            }
            let mut seed = Document::new();
            if operators {
                for (key, value) in filter {
                    if !key.starts_with('$') && !is_operator_value(value) {
                        seed.insert(key.clone(), value.clone());
                    }
                }
                apply_operators(&mut seed, update)?;
            } else {
                if let Some(id) = filter.get(ID_FIELD).filter(|v| !is_operator_value(v)) {
                    seed.insert(ID_FIELD, id.clone());
                }
                for (key, value) in update {
                    seed.insert(key.clone(), value.clone());
                }
            }
            return Self::insert_locked(state, ns, &seed);
        }

        for pos in positions {
            let Some(current) = state.collection(ns).and_then(|docs| docs.get(pos)) else {
                continue;
            };
            let replacement = if operators {
                let mut next = current.clone();
                apply_operators(&mut next, update)?;
                next
            } else {
                replace_keeping_id(current, update)?
            };
            state.check_unique(ns, &replacement, Some(pos))?;
            if let Some(slot) = state.collection_mut(ns).and_then(|docs| docs.get_mut(pos)) {
                *slot = replacement;
            }
        }
        Ok(())
    }
}

/// Document with `_id` first, generating an ObjectId when it has none
fn with_id(doc: &Document) -> Document {
    if doc.contains_key(ID_FIELD) {
        return doc.clone();
    }
    let mut out = Document::new();
    out.insert(ID_FIELD, ObjectId::new());
    for (key, value) in doc {
        out.insert(key.clone(), value.clone());
    }
    out
}

fn is_operator_value(value: &Bson) -> bool {
    matches!(value, Bson::Document(d) if d.keys().next().map(|k| k.starts_with('$')).unwrap_or(false))
}

/// True for `{$set: ..}` style updates, false for replacements
fn is_operator_update(update: &Document) -> Result<bool> {
    let dollar = update.keys().filter(|k| k.starts_with('$')).count();
    if dollar == 0 {
        return Ok(false);
    }
    if dollar != update.len() {
        return Err(AdminError::command_with_code(
            ILLEGAL_OPERATION,
            "cannot mix update operators and replacement fields",
        ));
    }
    Ok(true)
}

fn apply_operators(doc: &mut Document, update: &Document) -> Result<()> {
    for (op, fields) in update {
        let Bson::Document(fields) = fields else {
            return Err(AdminError::command_with_code(
                ILLEGAL_OPERATION,
                format!("{} needs a document", op),
            ));
        };
        match op.as_str() {
            "$set" => {
                for (field, value) in fields {
                    if field == ID_FIELD && doc.get(ID_FIELD).map(|v| v != value).unwrap_or(false) {
                        return Err(id_altered());
                    }
                    set_path(doc, field, value.clone());
                }
            }
            "$unset" => {
                for (field, _) in fields {
                    unset_path(doc, field);
                }
            }
            other => {
                return Err(AdminError::command_with_code(
                    ILLEGAL_OPERATION,
                    format!("unsupported update operator: {}", other),
                ))
            }
        }
    }
    Ok(())
}

fn set_path(doc: &mut Document, path: &str, value: Bson) {
    match path.split_once('.') {
        None => {
            doc.insert(path, value);
        }
        Some((head, rest)) => {
            if !matches!(doc.get(head), Some(Bson::Document(_))) {
                doc.insert(head, Document::new());
            }
            if let Some(Bson::Document(inner)) = doc.get_mut(head) {
                set_path(inner, rest, value);
            }
        }
    }
}

fn unset_path(doc: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            doc.remove(path);
        }
        Some((head, rest)) => {
            if let Some(Bson::Document(inner)) = doc.get_mut(head) {
                unset_path(inner, rest);
            }
        }
    }
}

fn id_altered() -> AdminError {
    AdminError::command_with_code(
        IMMUTABLE_FIELD,
        "the (immutable) field '_id' was found to have been altered",
    )
}

/// Whole-document replacement that keeps the stored `_id` in front
fn replace_keeping_id(current: &Document, replacement: &Document) -> Result<Document> {
    let mut out = Document::new();
    if let Some(id) = current.get(ID_FIELD) {
        if let Some(new_id) = replacement.get(ID_FIELD) {
            if new_id != id {
                return Err(id_altered());
            }
        }
        out.insert(ID_FIELD, id.clone());
    }
    for (key, value) in replacement {
        if key != ID_FIELD {
            out.insert(key.clone(), value.clone());
        }
    }
    Ok(out)
}

fn find_index(state: &ServerState, ns: &Namespace, name: &str) -> Result<Option<IndexSpec>> {
    for entry in state.index_entries(ns) {
        if entry.get_str("name").map(|n| n == name).unwrap_or(false) {
            return IndexSpec::from_catalog_entry(entry).map(Some);
        }
    }
    Ok(None)
}

/// Check (or with `drop_dups`, enforce) uniqueness before a unique index exists
fn build_unique(state: &mut ServerState, ns: &Namespace, spec: &IndexSpec) -> Result<()> {
    if !spec.unique {
        return Ok(());
    }
    let Some(docs) = state.collection_mut(ns) else {
        return Ok(());
    };

    let mut seen: Vec<Vec<Bson>> = Vec::new();
    let mut duplicates = Vec::new();
    for (i, doc) in docs.iter().enumerate() {
        let key = index_key(doc, &spec.keys);
        if seen.iter().any(|k| keys_equal(k, &key)) {
            duplicates.push(i);
        } else {
            seen.push(key);
        }
    }
    if duplicates.is_empty() {
        return Ok(());
    }
    if !spec.drop_dups {
        let key = index_key(&docs[duplicates[0]], &spec.keys);
        let key_doc: Document = spec
            .keys
            .keys()
            .cloned()
            .zip(key)
            .collect();
        return Err(state::duplicate_key(ns, &spec.effective_name(), &key_doc));
    }
    for i in duplicates.into_iter().rev() {
        docs.remove(i);
    }
    Ok(())
}

impl Connection for MemoryConnection {
    fn database_names(&self) -> Result<Vec<String>> {
        self.enter(Primitive::DatabaseNames, "")?;
        Ok(self.state.read().databases.keys().cloned().collect())
    }

    fn collection_names(&self, database: &str) -> Result<Vec<String>> {
        self.enter(Primitive::CollectionNames, database)?;
        let state = self.state.read();
        Ok(state
            .databases
            .get(database)
            .map(|db| {
                db.collections
                    .keys()
                    .filter(|name| name.as_str() != SYSTEM_INDEXES)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_indexes(&self, ns: &Namespace) -> Result<DocumentCursor<'_>> {
        self.enter(Primitive::ListIndexes, ns)?;
        let entries: Vec<Document> = self
            .state
            .read()
            .index_entries(ns)
            .into_iter()
            .cloned()
            .collect();
        Ok(Box::new(entries.into_iter().map(Ok)))
    }

    fn query(&self, ns: &Namespace, spec: &QuerySpec) -> Result<DocumentCursor<'_>> {
        self.enter(Primitive::Query, ns)?;
        let state = self.state.read();
        let Some(docs) = state.collection(ns) else {
            return Ok(Box::new(std::iter::empty::<Result<Document>>()));
        };

        let mut hits = Vec::new();
        for doc in docs {
            if matches_filter(doc, &spec.filter)? {
                hits.push(doc.clone());
            }
        }
        if let Some(sort) = &spec.sort {
            apply_sort(&mut hits, sort);
        }

        let limit = if spec.limit == 0 { usize::MAX } else { spec.limit as usize };
        let projection = spec.projection.clone();
        let results: Vec<Document> = hits
            .into_iter()
            .skip(spec.skip as usize)
            .take(limit)
            .map(|doc| match &projection {
                Some(p) => apply_projection(&doc, p),
                None => doc,
            })
            .collect();
        Ok(Box::new(results.into_iter().map(Ok)))
    }

    fn insert(&self, ns: &Namespace, doc: &Document) -> Result<()> {
        self.enter(Primitive::Insert, ns)?;
        Self::insert_locked(&mut self.state.write(), ns, doc)
    }

    fn update(
        &self,
        ns: &Namespace,
        filter: &Document,
        doc: &Document,
        upsert: bool,
        multi: bool,
    ) -> Result<()> {
        self.enter(Primitive::Update, ns)?;
        Self::update_locked(&mut self.state.write(), ns, filter, doc, upsert, multi)
    }

    fn remove(&self, ns: &Namespace, filter: &Document, just_one: bool) -> Result<()> {
        self.enter(Primitive::Remove, ns)?;
        let mut state = self.state.write();
        let Some(docs) = state.collection_mut(ns) else {
            return Ok(());
        };

        let mut doomed = Vec::new();
        for (i, doc) in docs.iter().enumerate() {
            if matches_filter(doc, filter)? {
                doomed.push(i);
                if just_one {
                    break;
                }
            }
        }
        for i in doomed.iter().rev() {
            docs.remove(*i);
        }
        tracing::trace!(ns = %ns, removed = doomed.len(), "documents removed");
        Ok(())
    }

    fn ensure_index(&self, ns: &Namespace, spec: &IndexSpec) -> Result<()> {
        self.enter(Primitive::EnsureIndex, ns)?;
        let mut state = self.state.write();
        state.ensure_collection(ns);

        let name = spec.effective_name();
        for entry in state.index_entries(ns) {
            let Ok(existing) = IndexSpec::from_catalog_entry(entry) else {
                continue;
            };
            let same_keys = existing.keys.iter().eq(spec.keys.iter());
            if same_keys && existing.name == name {
                return Ok(());
            }
            if same_keys {
                return Err(AdminError::command_with_code(
                    INDEX_OPTIONS_CONFLICT,
                    format!("Index with keys {} already exists with name {}", spec.keys, existing.name),
                ));
            }
            if existing.name == name {
                return Err(AdminError::command_with_code(
                    INDEX_KEY_SPECS_CONFLICT,
                    format!("Index with name: {} already exists with different options", name),
                ));
            }
        }

        build_unique(&mut state, ns, spec)?;
        let catalog = ns.index_catalog()?;
        let mut named = spec.clone();
        named.name = name;
        state.ensure_collection(&catalog).push(named.to_catalog_entry(ns));
        Ok(())
    }

    fn drop_index(&self, ns: &Namespace, name: &str) -> Result<()> {
        self.enter(Primitive::DropIndex, ns)?;
        if name == ID_INDEX_NAME {
            return Err(AdminError::command_with_code(
                CANNOT_DROP_ID_INDEX,
                "cannot drop _id index",
            ));
        }
        let mut state = self.state.write();
        let removed = if name == "*" {
            state.remove_index_entries(ns, |e| e.get_str("name").map(|n| n != ID_INDEX_NAME).unwrap_or(true))
        } else {
            state.remove_index_entries(ns, |e| e.get_str("name").map(|n| n == name).unwrap_or(false))
        };
        tracing::trace!(ns = %ns, index = name, removed, "index entries removed");
        Ok(())
    }

    fn create_collection(&self, ns: &Namespace) -> Result<()> {
        self.enter(Primitive::CreateCollection, ns)?;
        if ns.is_database() {
            return Err(AdminError::command_with_code(
                INVALID_NAMESPACE,
                format!("invalid collection name: {}", ns),
            ));
        }
        let mut state = self.state.write();
        if state.collection(ns).is_some() {
            return Err(AdminError::command_with_code(
                NAMESPACE_EXISTS,
                format!("collection {} already exists", ns),
            ));
        }
        state.ensure_collection(ns);
        Ok(())
    }

    fn drop_collection(&self, ns: &Namespace) -> Result<()> {
        self.enter(Primitive::DropCollection, ns)?;
        let existed = commands::drop_collection(&mut self.state.write(), ns);
        tracing::trace!(ns = %ns, existed, "collection dropped");
        Ok(())
    }

    fn drop_database(&self, database: &str) -> Result<()> {
        self.enter(Primitive::DropDatabase, database)?;
        self.state.write().databases.remove(database);
        Ok(())
    }

    fn exists(&self, ns: &Namespace) -> Result<bool> {
        self.enter(Primitive::Exists, ns)?;
        Ok(self.state.read().collection(ns).is_some())
    }

    fn run_command(&self, database: &str, command: &Document) -> Result<Document> {
        self.enter(Primitive::RunCommand, database)?;
        commands::run(&mut self.state.write(), database, command)
    }
}

impl MemoryConnection {
    /// Documents of `ns` matching `{field: value}`, bypassing the journal
    ///
    /// Test helper for inspecting server state.
    pub fn peek(&self, ns: &Namespace, field: &str, value: impl Into<Bson>) -> Result<Vec<Document>> {
        let filter = field_filter(field, value);
        let state = self.state.read();
        let mut out = Vec::new();
        for doc in state.collection(ns).map(|d| d.as_slice()).unwrap_or_default() {
            if matches_filter(doc, &filter)? {
                out.push(doc.clone());
            }
        }
        Ok(out)
    }

    /// Every document of `ns`, bypassing the journal
    pub fn dump(&self, ns: &Namespace) -> Vec<Document> {
        self.state.read().collection(ns).cloned().unwrap_or_default()
    }
}
