use crate::cache::{QueryCache, QueryKey};
use crate::error::{DbError, DbResult};
use crate::row::Row;
use crate::schema::{Catalog, TableSchema};
use crate::storage::Storage;
use crate::table::{DeleteOutcome, Table, UpdateOutcome};
use crate::values::parse_value;
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;

/// The top-level database: catalog plus storage plus the read cache.
///
/// Every operation is all-or-nothing against storage: rows are loaded, the
/// mutation runs in memory, and only a fully successful result is written
/// back. A failed operation leaves both the in-memory catalog and the files
/// as they were. Any mutation clears the whole query cache.
#[derive(Debug)]
pub struct Database {
    catalog: Catalog,
    storage: Storage,
    cache: QueryCache,
}

impl Database {
    /// Open (or initialize) a database rooted at `base_dir`.
    pub fn open(base_dir: impl Into<PathBuf>) -> DbResult<Self> {
        let storage = Storage::new(base_dir)?;
        let catalog = storage.load_catalog()?;
        debug!(tables = catalog.len(), "database opened");
        Ok(Self {
            catalog,
            storage,
            cache: QueryCache::new(),
        })
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.catalog.contains(name)
    }

    /// Table names in catalog load order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.catalog.names()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    /// A table's schema, for `info` and rendering.
    pub fn describe(&self, name: &str) -> DbResult<&TableSchema> {
        self.catalog.get(name)
    }

    /// Create a table from `"name:type"` column specs and persist the
    /// catalog. Returns the created schema (including the implicit `ID`).
    pub fn create_table<S: AsRef<str>>(
        &mut self,
        name: &str,
        specs: &[S],
    ) -> DbResult<&TableSchema> {
        let schema = TableSchema::from_specs(specs)?;
        self.catalog.create(name, schema)?;
        if let Err(e) = self.storage.save_catalog(&self.catalog) {
            // Keep memory and disk consistent if the write failed.
            let _ = self.catalog.remove(name);
            return Err(e);
        }
        self.catalog.get(name)
    }

    /// Drop a table: schema, persisted rows, and every cached read.
    /// Confirmation is the caller's job.
    pub fn drop_table(&mut self, name: &str) -> DbResult<()> {
        let schema = self.catalog.remove(name)?;
        if let Err(e) = self.storage.save_catalog(&self.catalog) {
            let _ = self.catalog.create(name, schema);
            return Err(e);
        }
        self.storage.delete_rows(name)?;
        self.cache.invalidate_all();
        Ok(())
    }

    fn load_table(&self, name: &str) -> DbResult<Table> {
        let schema = self.catalog.get(name)?.clone();
        let rows = self.storage.load_rows(name)?;
        Ok(Table::new(name, schema, rows))
    }

    /// Insert one row, returning its assigned ID.
    pub fn insert<S: AsRef<str>>(&mut self, table: &str, values: &[S]) -> DbResult<i64> {
        let started = Instant::now();
        let mut loaded = self.load_table(table)?;
        let id = loaded.insert(values)?;
        self.storage.save_rows(table, loaded.rows())?;
        self.cache.invalidate_all();
        debug!(table, id, elapsed = ?started.elapsed(), "insert");
        Ok(id)
    }

    /// Select rows, optionally filtered by `column = value`, through the
    /// query cache. The bool is true when the result came from cache.
    pub fn select(
        &mut self,
        table: &str,
        filter: Option<(&str, &str)>,
    ) -> DbResult<(Vec<Row>, bool)> {
        let started = Instant::now();
        // The cache key uses the typed value, so "30" and " 30 " share an
        // entry. Building the key also surfaces column/type errors before
        // the cache is consulted.
        let schema = self.catalog.get(table)?;
        let key = match filter {
            None => QueryKey::select_all(table),
            Some((column, raw)) => {
                let ty = schema
                    .column_type(column)
                    .ok_or_else(|| DbError::ColumnNotFound(column.to_owned()))?;
                QueryKey::filtered(table, column, parse_value(raw, ty)?)
            }
        };

        let storage = &self.storage;
        let catalog = &self.catalog;
        let (rows, hit) = self.cache.get_or_compute(key, || {
            let schema = catalog.get(table)?.clone();
            let all_rows = storage.load_rows(table)?;
            let loaded = Table::new(table, schema, all_rows);
            match filter {
                None => Ok(loaded.rows().to_vec()),
                Some((column, raw)) => Ok(loaded
                    .filter(column, raw)?
                    .into_iter()
                    .cloned()
                    .collect()),
            }
        })?;
        debug!(table, hit, rows = rows.len(), elapsed = ?started.elapsed(), "select");
        Ok((rows, hit))
    }

    /// Update matching rows and persist the result.
    pub fn update(
        &mut self,
        table: &str,
        set_column: &str,
        set_raw: &str,
        where_column: &str,
        where_raw: &str,
    ) -> DbResult<UpdateOutcome> {
        let started = Instant::now();
        let mut loaded = self.load_table(table)?;
        let outcome = loaded.update(set_column, set_raw, where_column, where_raw)?;
        self.storage.save_rows(table, loaded.rows())?;
        self.cache.invalidate_all();
        debug!(table, updated = outcome.updated_ids.len(), elapsed = ?started.elapsed(), "update");
        Ok(outcome)
    }

    /// Delete matching rows and persist the remainder.
    /// Confirmation is the caller's job.
    pub fn delete(&mut self, table: &str, column: &str, raw: &str) -> DbResult<DeleteOutcome> {
        let started = Instant::now();
        let mut loaded = self.load_table(table)?;
        let outcome = loaded.delete(column, raw)?;
        self.storage.save_rows(table, loaded.rows())?;
        self.cache.invalidate_all();
        debug!(table, deleted = outcome.deleted_ids.len(), elapsed = ?started.elapsed(), "delete");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::Value;

    fn open_temp() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("data")).unwrap();
        (dir, db)
    }

    fn users_db() -> (tempfile::TempDir, Database) {
        let (dir, mut db) = open_temp();
        db.create_table("users", &["name:str", "age:int"]).unwrap();
        (dir, db)
    }

    #[test]
    fn create_table_reports_full_schema() {
        let (_dir, mut db) = open_temp();
        let schema = db.create_table("users", &["name:str", "age:int"]).unwrap();
        assert_eq!(schema.describe(), "ID:int, name:str, age:int");
        assert!(db.has_table("users"));
    }

    #[test]
    fn create_duplicate_table_fails() {
        let (_dir, mut db) = users_db();
        assert!(matches!(
            db.create_table("users", &["x:int"]).unwrap_err(),
            DbError::TableExists(_)
        ));
    }

    #[test]
    fn create_table_with_bad_spec_fails() {
        let (_dir, mut db) = open_temp();
        assert!(db.create_table("users", &["nocolon"]).is_err());
        assert!(db.create_table("users", &["age:float"]).is_err());
        assert!(!db.has_table("users"));
    }

    #[test]
    fn insert_select_round_trip() {
        let (_dir, mut db) = users_db();
        let id = db.insert("users", &["\"Ann\"", "30"]).unwrap();
        assert_eq!(id, 1);

        let (rows, hit) = db.select("users", Some(("age", "30"))).unwrap();
        assert!(!hit);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id(), 1);
        assert_eq!(rows[0].get("name"), Some(Value::from("Ann")));
        assert_eq!(rows[0].get("age"), Some(Value::Int(30)));
    }

    #[test]
    fn repeated_select_hits_cache_until_mutation() {
        let (_dir, mut db) = users_db();
        db.insert("users", &["\"Ann\"", "30"]).unwrap();

        let (first, hit) = db.select("users", None).unwrap();
        assert!(!hit);
        let (second, hit) = db.select("users", None).unwrap();
        assert!(hit);
        assert_eq!(first, second);

        db.insert("users", &["\"Bob\"", "25"]).unwrap();
        let (third, hit) = db.select("users", None).unwrap();
        assert!(!hit);
        assert_eq!(third.len(), 2);
    }

    #[test]
    fn equivalent_raw_filters_share_a_cache_entry() {
        let (_dir, mut db) = users_db();
        db.insert("users", &["\"Ann\"", "30"]).unwrap();

        let (_, hit) = db.select("users", Some(("age", "30"))).unwrap();
        assert!(!hit);
        let (_, hit) = db.select("users", Some(("age", " 30 "))).unwrap();
        assert!(hit);
    }

    #[test]
    fn update_persists_and_invalidates() {
        let (dir, mut db) = users_db();
        db.insert("users", &["\"Ann\"", "30"]).unwrap();
        db.select("users", None).unwrap();

        let outcome = db
            .update("users", "age", "31", "name", "\"Ann\"")
            .unwrap();
        assert_eq!(outcome.updated_ids, vec![1]);

        let (rows, hit) = db.select("users", None).unwrap();
        assert!(!hit);
        assert_eq!(rows[0].get("age"), Some(Value::Int(31)));

        // Survives a reopen.
        drop(db);
        let mut db = Database::open(dir.path().join("data")).unwrap();
        let (rows, _) = db.select("users", None).unwrap();
        assert_eq!(rows[0].get("age"), Some(Value::Int(31)));
    }

    #[test]
    fn delete_removes_matching_rows() {
        let (_dir, mut db) = users_db();
        db.insert("users", &["\"Ann\"", "30"]).unwrap();
        db.insert("users", &["\"Bob\"", "30"]).unwrap();
        db.insert("users", &["\"Cal\"", "40"]).unwrap();

        let outcome = db.delete("users", "age", "30").unwrap();
        assert_eq!(outcome.deleted_ids, vec![1, 2]);

        let (rows, _) = db.select("users", None).unwrap();
        assert_eq!(rows.len(), 1);
        let (rows, _) = db.select("users", Some(("age", "30"))).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn failed_operation_leaves_state_unchanged() {
        let (_dir, mut db) = users_db();
        db.insert("users", &["\"Ann\"", "30"]).unwrap();

        assert!(db.update("users", "height", "1", "age", "30").is_err());
        assert!(db.delete("users", "height", "1").is_err());
        assert!(db.insert("users", &["\"Bob\""]).is_err());

        let (rows, _) = db.select("users", None).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("age"), Some(Value::Int(30)));
    }

    #[test]
    fn drop_table_discards_rows_and_storage() {
        let (dir, mut db) = users_db();
        db.insert("users", &["\"Ann\"", "30"]).unwrap();
        db.drop_table("users").unwrap();

        assert!(!db.has_table("users"));
        assert!(db.select("users", None).is_err());

        // Recreating the table starts from scratch, not from old rows.
        db.create_table("users", &["name:str", "age:int"]).unwrap();
        let (rows, _) = db.select("users", None).unwrap();
        assert!(rows.is_empty());
        assert!(!dir.path().join("data").join("users.json").exists());
    }

    #[test]
    fn drop_unknown_table_fails() {
        let (_dir, mut db) = open_temp();
        assert!(matches!(
            db.drop_table("ghosts").unwrap_err(),
            DbError::TableNotFound(_)
        ));
    }

    #[test]
    fn select_unknown_table_or_column_fails() {
        let (_dir, mut db) = users_db();
        assert!(matches!(
            db.select("ghosts", None).unwrap_err(),
            DbError::TableNotFound(_)
        ));
        assert!(matches!(
            db.select("users", Some(("height", "1"))).unwrap_err(),
            DbError::ColumnNotFound(_)
        ));
    }
}
