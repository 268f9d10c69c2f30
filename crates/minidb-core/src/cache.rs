use crate::error::DbResult;
use crate::row::Row;
use crate::values::Value;
use std::collections::HashMap;

/// Identifies one query shape: a table plus an optional equality filter.
/// `filter: None` is the unfiltered select.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub table: String,
    pub filter: Option<(String, Value)>,
}

impl QueryKey {
    pub fn select_all(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filter: None,
        }
    }

    pub fn filtered(table: impl Into<String>, column: impl Into<String>, value: Value) -> Self {
        Self {
            table: table.into(),
            filter: Some((column.into(), value)),
        }
    }
}

/// Memoizes read results by query shape.
///
/// Entries hold owned row clones, so a later in-place update can never alias
/// a cached sequence. Invalidation is wholesale: any mutation on any table
/// clears everything. Blunt, but it keeps the staleness guarantee trivially:
/// no read after a mutation can be served from before it.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, Vec<Row>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, key: &QueryKey) -> Option<&[Row]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn store(&mut self, key: QueryKey, rows: Vec<Row>) {
        self.entries.insert(key, rows);
    }

    /// Return the cached rows for `key`, or run `compute`, cache its result,
    /// and return it. The bool is true on a cache hit.
    pub fn get_or_compute<F>(&mut self, key: QueryKey, compute: F) -> DbResult<(Vec<Row>, bool)>
    where
        F: FnOnce() -> DbResult<Vec<Row>>,
    {
        if let Some(rows) = self.entries.get(&key) {
            return Ok((rows.clone(), true));
        }
        let rows = compute()?;
        self.entries.insert(key, rows.clone());
        Ok((rows, false))
    }

    /// Drop every entry. Called after any insert, update, delete, or drop.
    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
