// mongoadmin-core/src/namespace.rs
//! Fully-qualified `database.collection` identifiers
//!
//! Every command and query target is built through [`Namespace`]; nothing
//! else in the crate concatenates database and collection names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{AdminError, Result};

/// Characters the server refuses in database names
const INVALID_DATABASE_CHARS: &[char] = &['/', '\\', '.', ' ', '"', '$', '*', '<', '>', ':', '|', '?', '\0'];

/// Database + collection pair
///
/// An empty collection name refers to the whole database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace {
    database: String,
    collection: String,
}

impl Namespace {
    /// Build a namespace from its parts
    ///
    /// # Examples
    ///
    /// ```
    /// use mongoadmin_core::Namespace;
    ///
    /// let ns = Namespace::new("shop", "orders")?;
    /// assert_eq!(ns.to_string(), "shop.orders");
    /// # Ok::<(), mongoadmin_core::AdminError>(())
    /// ```
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Result<Self> {
        let database = database.into();
        let collection = collection.into();
        validate_database_name(&database)?;
        if collection.contains('\0') {
            return Err(AdminError::InvalidArgument(format!(
                "collection name '{}' contains a NUL character",
                collection.escape_debug()
            )));
        }
        Ok(Namespace {
            database,
            collection,
        })
    }

    /// Namespace that addresses a whole database
    pub fn database(database: impl Into<String>) -> Result<Self> {
        Self::new(database, String::new())
    }

    /// Split a `database.collection` string on its first dot
    ///
    /// Collection names may contain further dots (`system.users`).
    pub fn parse(full: &str) -> Result<Self> {
        match full.split_once('.') {
            Some((database, collection)) => Self::new(database, collection),
            None => Err(AdminError::InvalidArgument(format!(
                "namespace '{}' has no '.' separator",
                full
            ))),
        }
    }

    pub fn database_name(&self) -> &str {
        &self.database
    }

    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    /// True when the namespace names a database rather than a collection
    pub fn is_database(&self) -> bool {
        self.collection.is_empty()
    }

    /// Sibling namespace in the same database
    pub fn sibling(&self, collection: impl Into<String>) -> Result<Self> {
        Self::new(self.database.clone(), collection)
    }

    /// The index catalog collection of this namespace's database
    pub fn index_catalog(&self) -> Result<Self> {
        self.sibling(crate::SYSTEM_INDEXES)
    }
}

fn validate_database_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AdminError::InvalidArgument(
            "database name must not be empty".to_string(),
        ));
    }
    if let Some(bad) = name.chars().find(|c| INVALID_DATABASE_CHARS.contains(c)) {
        return Err(AdminError::InvalidArgument(format!(
            "database name '{}' contains invalid character {:?}",
            name.escape_debug(),
            bad
        )));
    }
    Ok(())
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

impl Serialize for Namespace {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Namespace {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let full = String::deserialize(deserializer)?;
        Namespace::parse(&full).map_err(serde::de::Error::custom)
    }
}

impl FromStr for Namespace {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self> {
        Namespace::parse(s)
    }
}
