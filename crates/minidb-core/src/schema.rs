use crate::error::{DbError, DbResult};
use crate::values::ColumnType;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Name of the reserved auto-increment identifier column.
pub const ID_COLUMN: &str = "ID";

/// A single column: name plus declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
}

/// An ordered column list for one table.
///
/// Column order is the declaration order, with the reserved `ID:int` column
/// always first. Serialized as an ordered JSON map (`{"ID":"int","name":"str"}`)
/// so the metadata file stays human-readable and re-loadable across sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    columns: Vec<Column>,
}

impl TableSchema {
    /// Build a schema from `"name:type"` tokens, prepending the implicit
    /// `ID:int` column.
    ///
    /// Fails if a spec lacks the `:` separator, declares a type outside the
    /// supported set, redeclares `ID`, or repeats a column name.
    pub fn from_specs<S: AsRef<str>>(specs: &[S]) -> DbResult<Self> {
        let mut columns = vec![Column {
            name: ID_COLUMN.to_owned(),
            ty: ColumnType::Int,
        }];
        for spec in specs {
            let spec = spec.as_ref();
            let (name, ty) = spec
                .split_once(':')
                .ok_or_else(|| DbError::Validation(format!("invalid column spec: {spec}")))?;
            if name == ID_COLUMN {
                return Err(DbError::Validation(
                    "column \"ID\" is reserved and assigned automatically".to_owned(),
                ));
            }
            if name.is_empty() {
                return Err(DbError::Validation(format!("invalid column spec: {spec}")));
            }
            if columns.iter().any(|c| c.name == name) {
                return Err(DbError::Validation(format!("duplicate column: {name}")));
            }
            columns.push(Column {
                name: name.to_owned(),
                ty: ty.parse()?,
            });
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Columns after the reserved `ID`, in declaration order. Insert values
    /// are matched positionally against exactly these.
    pub fn user_columns(&self) -> &[Column] {
        &self.columns[1..]
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.ty)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_type(name).is_some()
    }

    /// Renders the schema as `ID:int, name:str, ...` for user-facing reports.
    pub fn describe(&self) -> String {
        self.columns
            .iter()
            .map(|c| format!("{}:{}", c.name, c.ty))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Serialize for TableSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for column in &self.columns {
            map.serialize_entry(&column.name, &column.ty)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TableSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SchemaVisitor;

        impl<'de> Visitor<'de> for SchemaVisitor {
            type Value = TableSchema;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of column name to column type")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut columns = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, ty)) = access.next_entry::<String, ColumnType>()? {
                    columns.push(Column { name, ty });
                }
                Ok(TableSchema { columns })
            }
        }

        deserializer.deserialize_map(SchemaVisitor)
    }
}

/// The set of table schemas, keyed by table name.
///
/// Backed by a `Vec` so iteration follows the order schemas were loaded or
/// created; the table count is small enough that linear lookup is fine.
/// Serialized as a JSON map of table name to schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    tables: Vec<(String, TableSchema)>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> DbResult<&TableSchema> {
        self.tables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, schema)| schema)
            .ok_or_else(|| DbError::TableNotFound(name.to_owned()))
    }

    /// Register a new table. Fails if the name is already taken.
    pub fn create(&mut self, name: &str, schema: TableSchema) -> DbResult<()> {
        if self.contains(name) {
            return Err(DbError::TableExists(name.to_owned()));
        }
        self.tables.push((name.to_owned(), schema));
        Ok(())
    }

    /// Remove a table's schema, returning it. Fails if the name is unknown.
    pub fn remove(&mut self, name: &str) -> DbResult<TableSchema> {
        let pos = self
            .tables
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| DbError::TableNotFound(name.to_owned()))?;
        Ok(self.tables.remove(pos).1)
    }

    /// Table names in load order. Restartable: each call starts a fresh pass.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl Serialize for Catalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tables.len()))?;
        for (name, schema) in &self.tables {
            map.serialize_entry(name, schema)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Catalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CatalogVisitor;

        impl<'de> Visitor<'de> for CatalogVisitor {
            type Value = Catalog;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of table name to schema")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut tables = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, schema)) = access.next_entry::<String, TableSchema>()? {
                    tables.push((name, schema));
                }
                Ok(Catalog { tables })
            }
        }

        deserializer.deserialize_map(CatalogVisitor)
    }
}
