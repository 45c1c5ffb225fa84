// mongoadmin-core/src/client/documents.rs
// Query, insert, save (upsert by _id), remove

use bson::Document;

use super::AdminClient;
use crate::connection::Connection;
use crate::document::id_filter;
use crate::error::Result;
use crate::namespace::Namespace;
use crate::query::QueryRequest;

impl<C: Connection> AdminClient<C> {
    /// Run a query and drain its cursor
    ///
    /// The limit sent to the server is [`QueryRequest::effective_limit`], so
    /// at most 51 documents come back. Documents keep server order.
    pub fn query_documents(&self, request: &QueryRequest) -> Result<Vec<Document>> {
        let ns = Namespace::new(request.database.as_str(), request.collection.as_str())?;
        let spec = request.to_spec();
        tracing::debug!(ns = %ns, limit = spec.limit, skip = spec.skip, "query");

        self.conn.query(&ns, &spec)?.collect()
    }

    pub fn insert_document(&self, doc: &Document, database: &str, collection: &str) -> Result<()> {
        let ns = Namespace::new(database, collection)?;
        self.conn.insert(&ns, doc)
    }

    /// Replace the document with the same `_id`, or insert it
    ///
    /// Fails with `InvalidArgument` before any write when `_id` is missing.
    pub fn save_document(&self, doc: &Document, database: &str, collection: &str) -> Result<()> {
        let ns = Namespace::new(database, collection)?;
        let filter = id_filter(doc)?;
        self.conn.update(&ns, &filter, doc, true, false)
    }

    /// Remove the first match, or every match when `just_one` is false
    pub fn remove_documents(
        &self,
        database: &str,
        collection: &str,
        filter: &Document,
        just_one: bool,
    ) -> Result<()> {
        let ns = Namespace::new(database, collection)?;
        self.conn.remove(&ns, filter, just_one)
    }
}
