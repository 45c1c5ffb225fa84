// mongoadmin-core/src/client/indexes.rs
// Index listing, creation, rename and drop

use bson::{doc, Bson};

use super::AdminClient;
use crate::connection::Connection;
use crate::document::with_field_replaced;
use crate::error::Result;
use crate::index::{IndexListing, IndexSpec};
use crate::namespace::Namespace;

impl<C: Connection> AdminClient<C> {
    /// Index names in catalog order; entries without a string name are skipped
    pub fn list_index_names(&self, ns: &Namespace) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in self.conn.list_indexes(ns)? {
            match entry?.get("name") {
                Some(Bson::String(name)) => names.push(name.clone()),
                _ => continue,
            }
        }
        Ok(names)
    }

    /// Typed catalog entries; unreadable ones are reported, not fatal
    pub fn list_indexes(&self, ns: &Namespace) -> Result<IndexListing> {
        IndexListing::collect(self.conn.list_indexes(ns)?, IndexSpec::from_catalog_entry)
    }

    /// Create an index from a JSON key specification
    ///
    /// Malformed `key_spec` fails with `AdminError::Parse` before anything is
    /// sent. When an index with the same keys already exists this is a no-op:
    /// changing an existing index's name or flags needs a drop first.
    pub fn ensure_index(
        &self,
        ns: &Namespace,
        name: &str,
        key_spec: &str,
        unique: bool,
        background: bool,
        drop_dups: bool,
    ) -> Result<()> {
        let spec = IndexSpec::from_json(name, key_spec)?
            .with_unique(unique)
            .with_background(background)
            .with_drop_dups(drop_dups);
        self.ensure_index_spec(ns, &spec)
    }

    /// Same as [`ensure_index`](Self::ensure_index) with an already built spec
    pub fn ensure_index_spec(&self, ns: &Namespace, spec: &IndexSpec) -> Result<()> {
        self.conn.ensure_index(ns, spec)?;
        tracing::info!(ns = %ns, index = %spec.effective_name(), "index ensured");
        Ok(())
    }

    /// Rename an index by rewriting its catalog entry
    ///
    /// The entry for `old_name` is copied with only `name` changed, the old
    /// index is dropped and the copy inserted straight into the index
    /// catalog. Every other field of the entry is kept, in order; the entry
    /// itself moves to the end of the catalog.
    /// Does nothing when no index is called `old_name`.
    pub fn rename_index(&self, ns: &Namespace, old_name: &str, new_name: &str) -> Result<()> {
        let catalog = ns.index_catalog()?;
        let filter = doc! {"ns": ns.to_string(), "name": old_name};

        let entry = match self.conn.find_one(&catalog, &filter)? {
            Some(entry) => entry,
            None => {
                tracing::debug!(ns = %ns, index = old_name, "no index to rename");
                return Ok(());
            }
        };

        let renamed = with_field_replaced(&entry, "name", Bson::String(new_name.to_string()));
        self.conn.drop_index(ns, old_name)?;
        self.conn.insert(&catalog, &renamed)?;
        tracing::info!(ns = %ns, from = old_name, to = new_name, "index renamed");
        Ok(())
    }

    /// Drop by name; a missing index is not an error
    pub fn drop_index(&self, ns: &Namespace, name: &str) -> Result<()> {
        self.conn.drop_index(ns, name)?;
        tracing::info!(ns = %ns, index = name, "index dropped");
        Ok(())
    }
}
