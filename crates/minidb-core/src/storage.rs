use crate::error::DbResult;
use crate::row::Row;
use crate::schema::Catalog;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const CATALOG_FILE: &str = "db_meta.json";

/// File-backed persistence: one JSON file for the catalog, one per table for
/// its rows. All reads and writes are whole-file and synchronous.
///
/// Missing files are "no data yet", not errors: a fresh directory loads as an
/// empty catalog and every table as an empty row set.
#[derive(Debug)]
pub struct Storage {
    base_dir: PathBuf,
}

impl Storage {
    /// Open storage rooted at `base_dir`, creating the directory if needed.
    pub fn new(base_dir: impl Into<PathBuf>) -> DbResult<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn catalog_path(&self) -> PathBuf {
        self.base_dir.join(CATALOG_FILE)
    }

    fn rows_path(&self, table: &str) -> PathBuf {
        self.base_dir.join(format!("{table}.json"))
    }

    pub fn load_catalog(&self) -> DbResult<Catalog> {
        match fs::read_to_string(self.catalog_path()) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Catalog::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_catalog(&self, catalog: &Catalog) -> DbResult<()> {
        let text = serde_json::to_string_pretty(catalog)?;
        fs::write(self.catalog_path(), text)?;
        Ok(())
    }

    pub fn load_rows(&self, table: &str) -> DbResult<Vec<Row>> {
        match fs::read_to_string(self.rows_path(table)) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_rows(&self, table: &str, rows: &[Row]) -> DbResult<()> {
        let text = serde_json::to_string_pretty(rows)?;
        fs::write(self.rows_path(table), text)?;
        Ok(())
    }

    /// Remove a table's row file. A table that never persisted rows has no
    /// file, which is fine.
    pub fn delete_rows(&self, table: &str) -> DbResult<()> {
        match fs::remove_file(self.rows_path(table)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
