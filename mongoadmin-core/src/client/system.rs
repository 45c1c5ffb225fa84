// mongoadmin-core/src/client/system.rs
// Users (system.users) and stored functions (system.js)

use bson::oid::ObjectId;

use super::AdminClient;
use crate::connection::Connection;
use crate::document::{field_filter, id_filter, ID_FIELD};
use crate::error::Result;
use crate::function::{Function, FunctionListing};
use crate::namespace::Namespace;
use crate::query::QuerySpec;
use crate::user::User;
use crate::{SYSTEM_JS, SYSTEM_USERS};

impl<C: Connection> AdminClient<C> {
    // ========================================================================
    // USERS
    // ========================================================================

    /// Every user of `database`, in catalog order
    pub fn list_users(&self, database: &str) -> Result<Vec<User>> {
        let ns = Namespace::new(database, SYSTEM_USERS)?;
        self.conn
            .query(&ns, &QuerySpec::all())?
            .map(|doc| doc.map(|d| User::from_document(&d)))
            .collect()
    }

    /// First entry of `database` whose `user` field is `name`
    pub fn find_user(&self, database: &str, name: &str) -> Result<Option<User>> {
        let ns = Namespace::new(database, SYSTEM_USERS)?;
        let found = self.conn.find_one(&ns, &field_filter("user", name))?;
        Ok(found.as_ref().map(User::from_document))
    }

    /// Insert `user`, or replace the entry with the same `_id` when `overwrite`
    ///
    /// Without `overwrite` a duplicate `_id` fails with whatever the server's
    /// uniqueness check reports.
    pub fn create_user(&self, database: &str, user: &User, overwrite: bool) -> Result<()> {
        let ns = Namespace::new(database, SYSTEM_USERS)?;
        let doc = user.to_document();
        if overwrite {
            let filter = id_filter(&doc)?;
            self.conn.update(&ns, &filter, &doc, true, false)?;
        } else {
            self.conn.insert(&ns, &doc)?;
        }
        tracing::info!(ns = %ns, user = %user.name, overwrite, "user saved");
        Ok(())
    }

    pub fn drop_user(&self, database: &str, id: ObjectId) -> Result<()> {
        let ns = Namespace::new(database, SYSTEM_USERS)?;
        self.conn.remove(&ns, &field_filter(ID_FIELD, id), true)?;
        tracing::info!(ns = %ns, id = %id, "user dropped");
        Ok(())
    }

    // ========================================================================
    // STORED FUNCTIONS
    // ========================================================================

    /// Functions of `database`; documents that are not valid functions are
    /// skipped and reported in the listing
    pub fn list_functions(&self, database: &str) -> Result<FunctionListing> {
        let ns = Namespace::new(database, SYSTEM_JS)?;
        let listing =
            FunctionListing::collect(self.conn.query(&ns, &QuerySpec::all())?, Function::from_document)?;
        if !listing.is_complete() {
            tracing::warn!(ns = %ns, skipped = listing.skipped.len(), "malformed functions skipped");
        }
        Ok(listing)
    }

    /// Store `function`
    ///
    /// - no `existing_name`: plain insert
    /// - `existing_name` equal to the function's name: upsert by name
    /// - different `existing_name`: insert the new document, and only once
    ///   that succeeded remove the old one, so a failed insert never loses
    ///   the old body (both documents exist for a moment)
    pub fn create_function(
        &self,
        database: &str,
        function: &Function,
        existing_name: Option<&str>,
    ) -> Result<()> {
        let ns = Namespace::new(database, SYSTEM_JS)?;
        let doc = function.to_document();

        match existing_name {
            None => self.conn.insert(&ns, &doc)?,
            Some(existing) if existing == function.name => {
                let filter = field_filter(ID_FIELD, function.name.as_str());
                self.conn.update(&ns, &filter, &doc, true, false)?;
            }
            Some(existing) => {
                self.conn.insert(&ns, &doc)?;
                self.conn.remove(&ns, &field_filter(ID_FIELD, existing), true)?;
                tracing::info!(ns = %ns, from = existing, to = %function.name, "function renamed");
            }
        }
        tracing::info!(ns = %ns, function = %function.name, "function saved");
        Ok(())
    }

    pub fn drop_function(&self, database: &str, name: &str) -> Result<()> {
        let ns = Namespace::new(database, SYSTEM_JS)?;
        self.conn.remove(&ns, &field_filter(ID_FIELD, name), true)?;
        tracing::info!(ns = %ns, function = name, "function dropped");
        Ok(())
    }
}
