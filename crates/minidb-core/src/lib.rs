pub mod cache;
pub mod database;
pub mod error;
pub mod row;
pub mod schema;
pub mod storage;
pub mod table;
pub mod values;

pub use cache::{QueryCache, QueryKey};
pub use database::Database;
pub use error::{DbError, DbResult};
pub use row::Row;
pub use schema::{Catalog, Column, TableSchema, ID_COLUMN};
pub use storage::Storage;
pub use table::{DeleteOutcome, Table, UpdateOutcome};
pub use values::{parse_value, ColumnType, Value};
