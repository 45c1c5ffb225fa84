// mongoadmin-core/src/connection.rs
//! Connection boundary
//!
//! The facade never talks to the wire itself. Everything it needs from the
//! server goes through the [`Connection`] trait: catalog enumeration, the
//! query/write primitives and raw commands.
//!
//! # Architecture
//!
//! ```text
//! AdminClient<C: Connection>
//!   ├── MemoryConnection (in-process server, tests + CLI)
//!   └── any wire-protocol client adapted to the trait
//! ```
//!
//! Implementations are used from one caller at a time; the facade adds no
//! locking of its own. Every method may block for a network round trip.

use bson::Document;

use crate::error::Result;
use crate::index::IndexSpec;
use crate::namespace::Namespace;
use crate::query::QuerySpec;

/// Forward-only, single-pass stream of raw documents
///
/// Finite per call. Dropping it abandons the rest of the results.
pub type DocumentCursor<'a> = Box<dyn Iterator<Item = Result<Document>> + 'a>;

pub trait Connection {
    // ========================================================================
    // CATALOG ENUMERATION
    // ========================================================================

    /// Names of every database on the server, in server order
    fn database_names(&self) -> Result<Vec<String>>;

    /// Names of the collections of `database`, in server order
    fn collection_names(&self, database: &str) -> Result<Vec<String>>;

    /// Raw index catalog entries of the collection `ns`
    fn list_indexes(&self, ns: &Namespace) -> Result<DocumentCursor<'_>>;

    // ========================================================================
    // QUERIES
    // ========================================================================

    fn query(&self, ns: &Namespace, spec: &QuerySpec) -> Result<DocumentCursor<'_>>;

    /// First document matching `filter`, if any
    fn find_one(&self, ns: &Namespace, filter: &Document) -> Result<Option<Document>> {
        let spec = QuerySpec {
            limit: 1,
            ..QuerySpec::filter(filter.clone())
        };
        self.query(ns, &spec)?.next().transpose()
    }

    // ========================================================================
    // WRITES
    // ========================================================================

    fn insert(&self, ns: &Namespace, doc: &Document) -> Result<()>;

    /// Replace (or `$set`/`$unset`) the first match, or every match when
    /// `multi`; with `upsert`, insert when nothing matches
    fn update(
        &self,
        ns: &Namespace,
        filter: &Document,
        doc: &Document,
        upsert: bool,
        multi: bool,
    ) -> Result<()>;

    fn remove(&self, ns: &Namespace, filter: &Document, just_one: bool) -> Result<()>;

    // ========================================================================
    // INDEXES
    // ========================================================================

    /// Create the index, or do nothing when one with the same keys exists
    fn ensure_index(&self, ns: &Namespace, spec: &IndexSpec) -> Result<()>;

    /// Drop by name; succeeds when no such index exists
    fn drop_index(&self, ns: &Namespace, name: &str) -> Result<()>;

    // ========================================================================
    // COLLECTIONS AND DATABASES
    // ========================================================================

    fn create_collection(&self, ns: &Namespace) -> Result<()>;

    fn drop_collection(&self, ns: &Namespace) -> Result<()>;

    fn drop_database(&self, database: &str) -> Result<()>;

    fn exists(&self, ns: &Namespace) -> Result<bool>;

    // ========================================================================
    // COMMANDS
    // ========================================================================

    /// Run `command` against `database` and return the raw reply
    fn run_command(&self, database: &str, command: &Document) -> Result<Document>;
}

impl<C: Connection + ?Sized> Connection for &C {
    fn database_names(&self) -> Result<Vec<String>> {
        (**self).database_names()
    }

    fn collection_names(&self, database: &str) -> Result<Vec<String>> {
        (**self).collection_names(database)
    }

    fn list_indexes(&self, ns: &Namespace) -> Result<DocumentCursor<'_>> {
        (**self).list_indexes(ns)
    }

    fn query(&self, ns: &Namespace, spec: &QuerySpec) -> Result<DocumentCursor<'_>> {
        (**self).query(ns, spec)
    }

    fn find_one(&self, ns: &Namespace, filter: &Document) -> Result<Option<Document>> {
        (**self).find_one(ns, filter)
    }

    fn insert(&self, ns: &Namespace, doc: &Document) -> Result<()> {
        (**self).insert(ns, doc)
    }

    fn update(
        &self,
        ns: &Namespace,
        filter: &Document,
        doc: &Document,
        upsert: bool,
        multi: bool,
    ) -> Result<()> {
        (**self).update(ns, filter, doc, upsert, multi)
    }

    fn remove(&self, ns: &Namespace, filter: &Document, just_one: bool) -> Result<()> {
        (**self).remove(ns, filter, just_one)
    }

    fn ensure_index(&self, ns: &Namespace, spec: &IndexSpec) -> Result<()> {
        (**self).ensure_index(ns, spec)
    }

    fn drop_index(&self, ns: &Namespace, name: &str) -> Result<()> {
        (**self).drop_index(ns, name)
    }

    fn create_collection(&self, ns: &Namespace) -> Result<()> {
        (**self).create_collection(ns)
    }

    fn drop_collection(&self, ns: &Namespace) -> Result<()> {
        (**self).drop_collection(ns)
    }

    fn drop_database(&self, database: &str) -> Result<()> {
        (**self).drop_database(database)
    }

    fn exists(&self, ns: &Namespace) -> Result<bool> {
        (**self).exists(ns)
    }

    fn run_command(&self, database: &str, command: &Document) -> Result<Document> {
        (**self).run_command(database, command)
    }
}
