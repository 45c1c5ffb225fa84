// mongoadmin-core/src/client/catalog.rs
// Databases and collections

use bson::doc;

use super::{AdminClient, ADMIN_DATABASE};
use crate::connection::Connection;
use crate::error::Result;
use crate::namespace::Namespace;
use crate::query::QuerySpec;

/// Scratch collection used to materialize a database
pub const TEMP_COLLECTION: &str = "temp";

impl<C: Connection> AdminClient<C> {
    /// Database names, sorted ordinally
    pub fn list_database_names(&self) -> Result<Vec<String>> {
        let mut names = self.conn.database_names()?;
        names.sort();
        Ok(names)
    }

    /// Collection names of `database`, sorted ordinally
    pub fn list_collection_names(&self, database: &str) -> Result<Vec<String>> {
        let ns = Namespace::database(database)?;
        let mut names = self.conn.collection_names(ns.database_name())?;
        names.sort();
        Ok(names)
    }

    /// Make `database` exist
    ///
    /// There is no create-database primitive: a sentinel `{_id: "temp"}` is
    /// written to `<database>.temp` and the collection dropped again. When
    /// `<database>.temp` already exists nothing is touched. Two concurrent
    /// callers can race between the existence check and the drop.
    pub fn create_database(&self, database: &str) -> Result<()> {
        let ns = Namespace::new(database, TEMP_COLLECTION)?;
        if self.conn.exists(&ns)? {
            tracing::debug!(ns = %ns, "scratch collection exists, leaving database as is");
            return Ok(());
        }

        self.conn.insert(&ns, &doc! {"_id": TEMP_COLLECTION})?;
        self.conn.drop_collection(&ns)?;
        tracing::info!(database, "database created");
        Ok(())
    }

    pub fn drop_database(&self, database: &str) -> Result<()> {
        let ns = Namespace::database(database)?;
        self.conn.drop_database(ns.database_name())?;
        tracing::info!(database, "database dropped");
        Ok(())
    }

    pub fn create_collection(&self, database: &str, name: &str) -> Result<()> {
        let ns = Namespace::new(database, name)?;
        self.conn.create_collection(&ns)?;
        tracing::info!(ns = %ns, "collection created");
        Ok(())
    }

    /// Rename inside one database via the admin `renameCollection` command
    pub fn rename_collection(&self, database: &str, from: &str, to: &str) -> Result<()> {
        let source = Namespace::new(database, from)?;
        let target = Namespace::new(database, to)?;

        let command = doc! {
            "renameCollection": source.to_string(),
            "to": target.to_string(),
        };
        self.run_command(ADMIN_DATABASE, &command)?;
        tracing::info!(from = %source, to = %target, "collection renamed");
        Ok(())
    }

    /// Copy every document of `from` into `to`, one insert per document
    ///
    /// Not transactional: a failure part way leaves `to` partially filled.
    /// Returns the number of documents copied.
    pub fn duplicate_collection(&self, database: &str, from: &str, to: &str) -> Result<usize> {
        let source = Namespace::new(database, from)?;
        let target = Namespace::new(database, to)?;

        let mut copied = 0;
        for doc in self.conn.query(&source, &QuerySpec::all())? {
            self.conn.insert(&target, &doc?)?;
            copied += 1;
        }
        tracing::info!(from = %source, to = %target, copied, "collection duplicated");
        Ok(copied)
    }

    pub fn drop_collection(&self, database: &str, name: &str) -> Result<()> {
        let ns = Namespace::new(database, name)?;
        self.conn.drop_collection(&ns)?;
        tracing::info!(ns = %ns, "collection dropped");
        Ok(())
    }
}
