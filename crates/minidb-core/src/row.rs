use crate::schema::ID_COLUMN;
use crate::values::Value;
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// One record in a table.
///
/// The reserved `ID` is stored apart from the user fields but persisted in
/// the same flat JSON object (`{"ID": 1, "name": "Ann", ...}`), matching the
/// on-disk row layout. A row may lack columns the schema has gained since it
/// was written; those read back as `None` and render as `null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    id: i64,
    fields: BTreeMap<String, Value>,
}

impl Row {
    pub fn new(id: i64, fields: BTreeMap<String, Value>) -> Self {
        Self { id, fields }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    /// Look up a cell by column name. `"ID"` resolves to the row identifier.
    pub fn get(&self, column: &str) -> Option<Value> {
        if column == ID_COLUMN {
            Some(Value::Int(self.id))
        } else {
            self.fields.get(column).cloned()
        }
    }

    pub fn set(&mut self, column: String, value: Value) {
        self.fields.insert(column, value);
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(ID_COLUMN, &self.id)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = Row;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a row object with an ID column")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut id = None;
                let mut fields = BTreeMap::new();
                while let Some(name) = access.next_key::<String>()? {
                    if name == ID_COLUMN {
                        id = Some(access.next_value::<i64>()?);
                    } else {
                        fields.insert(name, access.next_value::<Value>()?);
                    }
                }
                let id = id.ok_or_else(|| de::Error::missing_field(ID_COLUMN))?;
                Ok(Row { id, fields })
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Row {
        let fields = BTreeMap::from([
            ("name".to_owned(), Value::from("Ann")),
            ("age".to_owned(), Value::Int(30)),
        ]);
        Row::new(1, fields)
    }

    #[test]
    fn get_resolves_id_and_fields() {
        let row = sample();
        assert_eq!(row.get("ID"), Some(Value::Int(1)));
        assert_eq!(row.get("name"), Some(Value::from("Ann")));
        assert_eq!(row.get("nickname"), None);
    }

    #[test]
    fn set_overwrites() {
        let mut row = sample();
        row.set("age".to_owned(), Value::Int(31));
        assert_eq!(row.get("age"), Some(Value::Int(31)));
    }

    #[test]
    fn serde_flat_object() {
        let row = sample();
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"ID": 1, "age": 30, "name": "Ann"})
        );
        let back: Row = serde_json::from_value(json).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn deserialize_without_id_fails() {
        let err = serde_json::from_str::<Row>(r#"{"name":"Ann"}"#);
        assert!(err.is_err());
    }
}
