// mongoadmin-core/src/stats.rs
// Typed view of a collStats reply

use bson::Document;
use serde::Serialize;

use crate::error::Result;
use crate::namespace::Namespace;
use crate::value_utils::as_i64;

/// Collection namespace plus the statistics the server reported for it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionInfo {
    pub ns: Namespace,
    pub count: i64,
    /// Total size of the documents, in bytes (scale 1)
    pub size: i64,
    pub avg_obj_size: i64,
    pub storage_size: i64,
    pub total_index_size: i64,
    pub index_count: i64,
}

impl CollectionInfo {
    /// Parse a collStats reply for `requested`
    ///
    /// The reply's own `ns` wins when present and well formed. Size fields
    /// may come back as int32, int64 or double; absent ones read as 0.
    pub fn from_stats(requested: &Namespace, reply: &Document) -> Result<Self> {
        let ns = match reply.get_str("ns") {
            Ok(reported) => Namespace::parse(reported).unwrap_or_else(|_| requested.clone()),
            Err(_) => requested.clone(),
        };
        Ok(CollectionInfo {
            ns,
            count: number(reply, "count"),
            size: number(reply, "size"),
            avg_obj_size: number(reply, "avgObjSize"),
            storage_size: number(reply, "storageSize"),
            total_index_size: number(reply, "totalIndexSize"),
            index_count: number(reply, "nindexes"),
        })
    }
}

fn number(reply: &Document, field: &str) -> i64 {
    reply.get(field).and_then(as_i64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_mixed_numeric_encodings() {
        let ns = Namespace::new("test", "coll").unwrap();
        let reply = doc! {
            "ns": "test.coll",
            "count": 3,
            "size": 120_i64,
            "avgObjSize": 40.0,
            "storageSize": 4096,
            "totalIndexSize": 8176_i64,
            "nindexes": 1,
            "ok": 1.0,
        };
        let info = CollectionInfo::from_stats(&ns, &reply).unwrap();
        assert_eq!(info.ns, ns);
        assert_eq!(info.count, 3);
        assert_eq!(info.size, 120);
        assert_eq!(info.avg_obj_size, 40);
        assert_eq!(info.storage_size, 4096);
        assert_eq!(info.total_index_size, 8176);
        assert_eq!(info.index_count, 1);
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let ns = Namespace::new("test", "empty").unwrap();
        let info = CollectionInfo::from_stats(&ns, &doc! {"ok": 1}).unwrap();
        assert_eq!(info.ns, ns);
        assert_eq!(info.count, 0);
        assert_eq!(info.size, 0);
    }
}
