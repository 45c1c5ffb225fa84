// mongoadmin-core/src/listing.rs
// Listings that tolerate per-entry parse failures

use bson::Document;

use crate::error::{AdminError, Result};

/// A raw entry that could not be turned into a domain object
#[derive(Debug, Clone)]
pub struct SkippedEntry {
    /// Position of the entry in the server's iteration order
    pub position: usize,
    pub reason: String,
    pub raw: Document,
}

/// Items that parsed plus the entries that were skipped
#[derive(Debug, Clone)]
pub struct PartialListing<T> {
    pub items: Vec<T>,
    pub skipped: Vec<SkippedEntry>,
}

impl<T> Default for PartialListing<T> {
    fn default() -> Self {
        PartialListing {
            items: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> PartialListing<T> {
    /// Parse every raw document with `parse`, collecting failures instead of
    /// stopping at the first one
    pub fn collect<I, F>(raw: I, mut parse: F) -> Result<Self>
    where
        I: IntoIterator<Item = Result<Document>>,
        F: FnMut(&Document) -> Result<T>,
    {
        let mut listing = PartialListing::default();
        for (position, doc) in raw.into_iter().enumerate() {
            let doc = doc?;
            match parse(&doc) {
                Ok(item) => listing.items.push(item),
                Err(err) => {
                    tracing::warn!(position, error = %err, "skipping malformed entry");
                    listing.skipped.push(SkippedEntry {
                        position,
                        reason: err.to_string(),
                        raw: doc,
                    });
                }
            }
        }
        Ok(listing)
    }

    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    /// The items, or `PartialResult` when anything was skipped
    pub fn into_strict(self) -> Result<Vec<T>> {
        if self.skipped.is_empty() {
            Ok(self.items)
        } else {
            Err(AdminError::PartialResult {
                loaded: self.items.len(),
                skipped: self.skipped.len(),
            })
        }
    }
}
