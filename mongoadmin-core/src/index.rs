// mongoadmin-core/src/index.rs
//! Index specifications and their catalog representation
//!
//! A catalog entry (one document of `<db>.system.indexes`) looks like:
//!
//! ```text
//! { v: 1, key: { name: 1, age: -1 }, name: "name_1_age_-1", ns: "db.coll",
//!   unique: true, background: true, dropDups: true }
//! ```
//!
//! The flag fields are only present when set.

use bson::{Bson, Document};

use crate::document::parse_json_document;
use crate::error::{AdminError, Result};
use crate::namespace::Namespace;
use crate::value_utils::as_i64;

/// Catalog format version written for new entries
pub const INDEX_VERSION: i32 = 1;

/// Name of the index every collection gets on `_id`
pub const ID_INDEX_NAME: &str = "_id_";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndexSpec {
    /// Empty means "let the server generate one from the keys"
    pub name: String,
    pub keys: Document,
    pub unique: bool,
    pub background: bool,
    /// Allow duplicate keys during a unique build (duplicates are dropped)
    pub drop_dups: bool,
}

impl IndexSpec {
    pub fn new(name: impl Into<String>, keys: Document) -> Self {
        IndexSpec {
            name: name.into(),
            keys,
            ..Self::default()
        }
    }

    /// Parse the key document from JSON text, e.g. `{"name": 1, "age": -1}`
    pub fn from_json(name: impl Into<String>, key_spec: &str) -> Result<Self> {
        let keys = parse_json_document(key_spec)?;
        if keys.is_empty() {
            return Err(AdminError::Parse(
                "index key specification has no fields".to_string(),
            ));
        }
        Ok(Self::new(name, keys))
    }

    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn with_background(mut self, background: bool) -> Self {
        self.background = background;
        self
    }

    pub fn with_drop_dups(mut self, drop_dups: bool) -> Self {
        self.drop_dups = drop_dups;
        self
    }

    /// The given name, or the conventional `field_dir` name derived from the keys
    pub fn effective_name(&self) -> String {
        if self.name.is_empty() {
            generated_index_name(&self.keys)
        } else {
            self.name.clone()
        }
    }

    /// Catalog entry for this index on `ns`
    pub fn to_catalog_entry(&self, ns: &Namespace) -> Document {
        let mut entry = Document::new();
        entry.insert("v", INDEX_VERSION);
        entry.insert("key", self.keys.clone());
        entry.insert("name", self.effective_name());
        entry.insert("ns", ns.to_string());
        if self.unique {
            entry.insert("unique", true);
        }
        if self.background {
            entry.insert("background", true);
        }
        if self.drop_dups {
            entry.insert("dropDups", true);
        }
        entry
    }

    /// Read a catalog entry back; `name` and `key` are required
    pub fn from_catalog_entry(entry: &Document) -> Result<Self> {
        let name = match entry.get("name") {
            Some(Bson::String(name)) => name.clone(),
            _ => {
                return Err(AdminError::InvalidArgument(
                    "index catalog entry has no string 'name'".to_string(),
                ))
            }
        };
        let keys = match entry.get("key") {
            Some(Bson::Document(keys)) => keys.clone(),
            _ => {
                return Err(AdminError::InvalidArgument(format!(
                    "index '{}' has no 'key' document",
                    name
                )))
            }
        };
        Ok(IndexSpec {
            name,
            keys,
            unique: flag(entry, "unique"),
            background: flag(entry, "background"),
            drop_dups: flag(entry, "dropDups"),
        })
    }
}

fn flag(entry: &Document, field: &str) -> bool {
    match entry.get(field) {
        Some(Bson::Boolean(b)) => *b,
        Some(other) => as_i64(other).map(|n| n != 0).unwrap_or(false),
        None => false,
    }
}

/// `{a: 1, b: -1}` -> `a_1_b_-1`, `{loc: "2d"}` -> `loc_2d`
pub fn generated_index_name(keys: &Document) -> String {
    keys.iter()
        .map(|(field, direction)| {
            let direction = match direction {
                Bson::String(s) => s.clone(),
                other => as_i64(other)
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| other.to_string()),
            };
            format!("{}_{}", field, direction)
        })
        .collect::<Vec<_>>()
        .join("_")
}

/// Index specs read from a catalog, plus the entries that could not be read
pub type IndexListing = crate::listing::PartialListing<IndexSpec>;

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_generated_names() {
        assert_eq!(generated_index_name(&doc! {"a": 1, "b": -1}), "a_1_b_-1");
        assert_eq!(generated_index_name(&doc! {"loc": "2d"}), "loc_2d");
        assert_eq!(generated_index_name(&doc! {"x": 1.0}), "x_1");
    }

    #[test]
    fn test_from_json_errors() {
        assert!(matches!(IndexSpec::from_json("i", "{"), Err(AdminError::Parse(_))));
        assert!(matches!(IndexSpec::from_json("i", "{}"), Err(AdminError::Parse(_))));
        assert!(matches!(IndexSpec::from_json("i", "42"), Err(AdminError::Parse(_))));
    }

    #[test]
    fn test_catalog_entry_layout() {
        let ns = Namespace::new("shop", "orders").unwrap();
        let spec = IndexSpec::from_json("", r#"{"customer": 1, "date": -1}"#)
            .unwrap()
            .with_unique(true);
        let entry = spec.to_catalog_entry(&ns);
        assert_eq!(
            entry.keys().collect::<Vec<_>>(),
            vec!["v", "key", "name", "ns", "unique"]
        );
        assert_eq!(entry.get_str("name").unwrap(), "customer_1_date_-1");
        assert_eq!(entry.get_str("ns").unwrap(), "shop.orders");
    }

    #[test]
    fn test_catalog_entry_read_back() {
        let entry = doc! {
            "v": 1, "key": {"a": 1}, "name": "a_1", "ns": "t.c",
            "background": true, "dropDups": 1
        };
        let spec = IndexSpec::from_catalog_entry(&entry).unwrap();
        assert_eq!(spec.name, "a_1");
        assert!(spec.background);
        assert!(spec.drop_dups);
        assert!(!spec.unique);

        assert!(IndexSpec::from_catalog_entry(&doc! {"key": {"a": 1}}).is_err());
        assert!(IndexSpec::from_catalog_entry(&doc! {"name": "x"}).is_err());
    }
}
