// mongoadmin-core/src/client/stats.rs
// collStats

use bson::doc;

use super::AdminClient;
use crate::connection::Connection;
use crate::error::Result;
use crate::namespace::Namespace;
use crate::stats::CollectionInfo;

impl<C: Connection> AdminClient<C> {
    /// `{collStats: <collection>, scale: 1}` against the owning database
    pub fn collection_stats(&self, ns: &str) -> Result<CollectionInfo> {
        let ns = Namespace::parse(ns)?;
        let command = doc! {
            "collStats": ns.collection_name(),
            "scale": 1,
        };
        let reply = self.run_command(ns.database_name(), &command)?;
        CollectionInfo::from_stats(&ns, &reply)
    }

    /// Stats for each namespace in order; the first failure aborts the batch
    pub fn collection_stats_batch<I, S>(&self, namespaces: I) -> Result<Vec<CollectionInfo>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        namespaces
            .into_iter()
            .map(|ns| self.collection_stats(ns.as_ref()))
            .collect()
    }
}
