// mongoadmin-core/src/query.rs
// Query request (caller side) and query spec (connection side)

use bson::Document;

/// Limit used when the caller asks for no limit or for too many documents
pub const DEFAULT_QUERY_LIMIT: u32 = 50;

/// Largest limit passed through unchanged
pub const MAX_PASSTHROUGH_LIMIT: u32 = 51;

/// Cursor flags forwarded to the connection untouched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorOptions {
    pub tailable: bool,
    pub secondary_ok: bool,
    pub no_cursor_timeout: bool,
    pub await_data: bool,
    pub exhaust: bool,
    pub partial: bool,
}

/// Query as issued by callers of the facade
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    pub database: String,
    pub collection: String,
    pub filter: Document,
    /// Sent to the server only when it has at least one field
    pub projection: Document,
    pub sort: Option<Document>,
    /// 0 means "server default"
    pub limit: u32,
    pub skip: u32,
    pub options: CursorOptions,
    pub batch_size: u32,
}

impl QueryRequest {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        QueryRequest {
            database: database.into(),
            collection: collection.into(),
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, filter: Document) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_projection(mut self, projection: Document) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_skip(mut self, skip: u32) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_options(mut self, options: CursorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Limit actually sent to the server
    ///
    /// 0 and anything above 51 become 50; 1..=51 pass through.
    pub fn effective_limit(&self) -> u32 {
        if self.limit == 0 || self.limit > MAX_PASSTHROUGH_LIMIT {
            DEFAULT_QUERY_LIMIT
        } else {
            self.limit
        }
    }

    /// Wire-level form of this request
    pub fn to_spec(&self) -> QuerySpec {
        QuerySpec {
            filter: self.filter.clone(),
            projection: if self.projection.is_empty() {
                None
            } else {
                Some(self.projection.clone())
            },
            sort: self.sort.clone(),
            limit: self.effective_limit(),
            skip: self.skip,
            options: self.options,
            batch_size: self.batch_size,
        }
    }
}

/// Query primitive arguments as the connection receives them
///
/// `limit == 0` means "no limit" at this level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    pub filter: Document,
    pub projection: Option<Document>,
    pub sort: Option<Document>,
    pub limit: u32,
    pub skip: u32,
    pub options: CursorOptions,
    pub batch_size: u32,
}

impl QuerySpec {
    /// Every document matching `filter`, no limit
    pub fn filter(filter: Document) -> Self {
        QuerySpec {
            filter,
            ..Self::default()
        }
    }

    /// Every document of the collection
    pub fn all() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_effective_limit_clamping() {
        let base = QueryRequest::new("test", "coll");
        assert_eq!(base.clone().with_limit(0).effective_limit(), 50);
        assert_eq!(base.clone().with_limit(200).effective_limit(), 50);
        assert_eq!(base.clone().with_limit(52).effective_limit(), 50);
        assert_eq!(base.clone().with_limit(51).effective_limit(), 51);
        assert_eq!(base.clone().with_limit(10).effective_limit(), 10);
    }

    #[test]
    fn test_empty_projection_not_sent() {
        let spec = QueryRequest::new("test", "coll").to_spec();
        assert!(spec.projection.is_none());

        let spec = QueryRequest::new("test", "coll")
            .with_projection(doc! {"name": 1})
            .to_spec();
        assert_eq!(spec.projection, Some(doc! {"name": 1}));
    }
}
