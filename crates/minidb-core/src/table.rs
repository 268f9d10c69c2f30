use crate::error::{DbError, DbResult};
use crate::row::Row;
use crate::schema::{TableSchema, ID_COLUMN};
use crate::values::{parse_value, ColumnType};
use std::collections::BTreeMap;

/// Outcome of an `update`: which rows were touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub updated_ids: Vec<i64>,
}

/// Outcome of a `delete`: which rows were removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted_ids: Vec<i64>,
}

/// One table's schema plus its full row set, with the schema-validated
/// mutation operations.
///
/// Every operation validates before mutating: a failed insert, update, or
/// delete leaves the row sequence exactly as it was.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    schema: TableSchema,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(name: impl Into<String>, schema: TableSchema, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            schema,
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Resolve a column's type or fail with `ColumnNotFound`.
    fn column_type(&self, column: &str) -> DbResult<ColumnType> {
        self.schema
            .column_type(column)
            .ok_or_else(|| DbError::ColumnNotFound(column.to_owned()))
    }

    /// Insert one row from positional raw values, returning the assigned ID.
    ///
    /// Arity must match the non-ID columns exactly, and every value must
    /// coerce to its column's declared type. The new ID is
    /// `max(existing IDs, 0) + 1`; after deleting every row the sequence
    /// restarts at 1, which is intended.
    pub fn insert<S: AsRef<str>>(&mut self, raw_values: &[S]) -> DbResult<i64> {
        let columns = self.schema.user_columns();
        if raw_values.len() != columns.len() {
            return Err(DbError::Validation(format!(
                "expected {} values, got {}",
                columns.len(),
                raw_values.len()
            )));
        }

        let mut fields = BTreeMap::new();
        for (column, raw) in columns.iter().zip(raw_values) {
            let value = parse_value(raw.as_ref(), column.ty)?;
            fields.insert(column.name.clone(), value);
        }

        let new_id = self.rows.iter().map(Row::id).max().unwrap_or(0) + 1;
        self.rows.push(Row::new(new_id, fields));
        Ok(new_id)
    }

    /// All rows whose `column` equals the typed rendering of `raw`.
    /// Exact equality, order-preserving, no mutation.
    pub fn filter(&self, column: &str, raw: &str) -> DbResult<Vec<&Row>> {
        let ty = self.column_type(column)?;
        let wanted = parse_value(raw, ty)?;
        Ok(self
            .rows
            .iter()
            .filter(|row| row.get(column).as_ref() == Some(&wanted))
            .collect())
    }

    /// Set `set_column` on every row where `where_column` equals the typed
    /// where-value. Non-matching rows are untouched.
    pub fn update(
        &mut self,
        set_column: &str,
        set_raw: &str,
        where_column: &str,
        where_raw: &str,
    ) -> DbResult<UpdateOutcome> {
        if set_column == ID_COLUMN {
            return Err(DbError::Validation(
                "column \"ID\" is immutable".to_owned(),
            ));
        }
        let set_ty = self.column_type(set_column)?;
        let where_ty = self.column_type(where_column)?;
        let set_value = parse_value(set_raw, set_ty)?;
        let where_value = parse_value(where_raw, where_ty)?;

        let mut updated_ids = Vec::new();
        for row in &mut self.rows {
            if row.get(where_column).as_ref() == Some(&where_value) {
                row.set(set_column.to_owned(), set_value.clone());
                updated_ids.push(row.id());
            }
        }
        Ok(UpdateOutcome { updated_ids })
    }

    /// Remove every row where `column` equals the typed value, keeping the
    /// rest in order.
    pub fn delete(&mut self, column: &str, raw: &str) -> DbResult<DeleteOutcome> {
        let ty = self.column_type(column)?;
        let wanted = parse_value(raw, ty)?;

        let mut deleted_ids = Vec::new();
        self.rows.retain(|row| {
            if row.get(column).as_ref() == Some(&wanted) {
                deleted_ids.push(row.id());
                false
            } else {
                true
            }
        });
        Ok(DeleteOutcome { deleted_ids })
    }
}
