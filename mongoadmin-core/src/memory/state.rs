// mongoadmin-core/src/memory/state.rs
// Server state held by MemoryConnection

use std::collections::HashMap;

use bson::{doc, Bson, Document};

use crate::document::ID_FIELD;
use crate::error::{AdminError, Result};
use crate::index::{IndexSpec, ID_INDEX_NAME};
use crate::namespace::Namespace;
use crate::value_utils::{get_path, values_equal};
use crate::SYSTEM_INDEXES;

/// Server error code for duplicate keys
pub(crate) const DUPLICATE_KEY: i32 = 11000;

pub(crate) type Collection = Vec<Document>;

#[derive(Debug, Default, Clone)]
pub(crate) struct DatabaseState {
    /// Includes the `system.indexes` catalog once any collection exists
    pub collections: HashMap<String, Collection>,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct ServerState {
    pub databases: HashMap<String, DatabaseState>,
}

impl ServerState {
    pub fn collection(&self, ns: &Namespace) -> Option<&Collection> {
        self.databases
            .get(ns.database_name())?
            .collections
            .get(ns.collection_name())
    }

    pub fn collection_mut(&mut self, ns: &Namespace) -> Option<&mut Collection> {
        self.databases
            .get_mut(ns.database_name())?
            .collections
            .get_mut(ns.collection_name())
    }

    /// Get or create the collection (and its database)
    ///
    /// New collections other than the catalog itself get an `_id_` index.
    pub fn ensure_collection(&mut self, ns: &Namespace) -> &mut Collection {
        let db = self
            .databases
            .entry(ns.database_name().to_string())
            .or_default();
        let name = ns.collection_name();

        if !db.collections.contains_key(name) && name != SYSTEM_INDEXES {
            let entry = IndexSpec::new(ID_INDEX_NAME, doc! {"_id": 1}).to_catalog_entry(ns);
            db.collections
                .entry(SYSTEM_INDEXES.to_string())
                .or_default()
                .push(entry);
        }
        db.collections.entry(name.to_string()).or_default()
    }

    /// Catalog entries belonging to the collection `ns`, in catalog order
    pub fn index_entries(&self, ns: &Namespace) -> Vec<&Document> {
        let target = ns.to_string();
        self.databases
            .get(ns.database_name())
            .and_then(|db| db.collections.get(SYSTEM_INDEXES))
            .map(|catalog| {
                catalog
                    .iter()
                    .filter(|entry| entry.get_str("ns").map(|n| n == target).unwrap_or(false))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Remove the catalog entries of `ns` matching `pred`; returns how many
    pub fn remove_index_entries<F>(&mut self, ns: &Namespace, mut pred: F) -> usize
    where
        F: FnMut(&Document) -> bool,
    {
        let target = ns.to_string();
        let Some(catalog) = self
            .databases
            .get_mut(ns.database_name())
            .and_then(|db| db.collections.get_mut(SYSTEM_INDEXES))
        else {
            return 0;
        };
        let before = catalog.len();
        catalog.retain(|entry| {
            let owned = entry.get_str("ns").map(|n| n == target).unwrap_or(false);
            !(owned && pred(entry))
        });
        before - catalog.len()
    }

    /// Reject `candidate` if it collides on `_id` or on a unique index with a
    /// document of `ns` other than the one at `skip`
    pub fn check_unique(&self, ns: &Namespace, candidate: &Document, skip: Option<usize>) -> Result<()> {
        let Some(docs) = self.collection(ns) else {
            return Ok(());
        };
        let others = || {
            docs.iter()
                .enumerate()
                .filter(move |(i, _)| Some(*i) != skip)
                .map(|(_, d)| d)
        };

        if ns.collection_name() != SYSTEM_INDEXES {
            if let Some(id) = candidate.get(ID_FIELD) {
                if others().any(|d| d.get(ID_FIELD).map(|v| values_equal(v, id)).unwrap_or(false)) {
                    return Err(duplicate_key(ns, ID_INDEX_NAME, &doc! {"_id": id.clone()}));
                }
            }
        }

        for entry in self.index_entries(ns) {
            let Ok(spec) = IndexSpec::from_catalog_entry(entry) else {
                continue;
            };
            if !spec.unique || spec.name == ID_INDEX_NAME {
                continue;
            }
            let key = index_key(candidate, &spec.keys);
            if others().any(|d| keys_equal(&index_key(d, &spec.keys), &key)) {
                return Err(duplicate_key(ns, &spec.name, &key_document(&spec.keys, &key)));
            }
        }
        Ok(())
    }
}

/// Values of the indexed fields of `doc`; missing fields read as null
pub(crate) fn index_key(doc: &Document, keys: &Document) -> Vec<Bson> {
    keys.keys()
        .map(|field| get_path(doc, field).cloned().unwrap_or(Bson::Null))
        .collect()
}

pub(crate) fn keys_equal(a: &[Bson], b: &[Bson]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
}

fn key_document(keys: &Document, values: &[Bson]) -> Document {
    keys.keys()
        .zip(values)
        .map(|(field, value)| (field.clone(), value.clone()))
        .collect()
}

pub(crate) fn duplicate_key(ns: &Namespace, index: &str, key: &Document) -> AdminError {
    AdminError::command_with_code(
        DUPLICATE_KEY,
        format!(
            "E11000 duplicate key error index: {}.${} dup key: {}",
            ns, index, key
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_collection_registers_id_index() {
        let mut state = ServerState::default();
        let ns = Namespace::new("test", "coll").unwrap();
        state.ensure_collection(&ns).push(doc! {"_id": 1});

        let entries = state.index_entries(&ns);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].get_str("name").unwrap(), "_id_");

        // Second call must not register the index again
        state.ensure_collection(&ns);
        assert_eq!(state.index_entries(&ns).len(), 1);
    }

    #[test]
    fn test_check_unique_on_id() {
        let mut state = ServerState::default();
        let ns = Namespace::new("test", "coll").unwrap();
        state.ensure_collection(&ns).push(doc! {"_id": 1});

        let err = state.check_unique(&ns, &doc! {"_id": 1.0}, None).unwrap_err();
        assert!(matches!(err, AdminError::Command { code: Some(DUPLICATE_KEY), .. }));
        assert!(state.check_unique(&ns, &doc! {"_id": 1}, Some(0)).is_ok());
        assert!(state.check_unique(&ns, &doc! {"_id": 2}, None).is_ok());
    }
}
