use comfy_table::{Cell, ContentArrangement, Table};
use minidb_core::{Row, TableSchema};

/// Render rows as a table, columns in schema order. A row missing a column
/// (schema gained it later) shows `null` in that cell.
pub fn render_rows(schema: &TableSchema, rows: &[Row]) -> String {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);

    table.set_header(schema.columns().iter().map(|c| Cell::new(&c.name)));

    for row in rows {
        table.add_row(schema.columns().iter().map(|c| {
            match row.get(&c.name) {
                Some(value) => Cell::new(value.to_string()),
                None => Cell::new("null"),
            }
        }));
    }

    table.to_string()
}

/// Render a schema for `info`: one line per column.
pub fn render_schema(name: &str, schema: &TableSchema) -> String {
    let mut out = format!("table \"{name}\":\n");
    for column in schema.columns() {
        out.push_str(&format!("  {}: {}\n", column.name, column.ty));
    }
    out.push_str(&format!("  ({} columns)", schema.columns().len()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use minidb_core::Value;
    use std::collections::BTreeMap;

    fn users_schema() -> TableSchema {
        TableSchema::from_specs(&["name:str", "age:int"]).unwrap()
    }

    #[test]
    fn renders_cells_in_schema_order() {
        let rows = vec![Row::new(
            1,
            BTreeMap::from([
                ("name".to_owned(), Value::from("Ann")),
                ("age".to_owned(), Value::Int(30)),
            ]),
        )];
        let out = render_rows(&users_schema(), &rows);
        assert!(out.contains("ID"));
        assert!(out.contains("Ann"));
        assert!(out.contains("30"));
        // Header order: ID before name before age.
        let id_pos = out.find("ID").unwrap();
        let name_pos = out.find("name").unwrap();
        let age_pos = out.find("age").unwrap();
        assert!(id_pos < name_pos && name_pos < age_pos);
    }

    #[test]
    fn missing_cell_renders_null() {
        // Row written before the schema gained "age".
        let rows = vec![Row::new(
            1,
            BTreeMap::from([("name".to_owned(), Value::from("Ann"))]),
        )];
        let out = render_rows(&users_schema(), &rows);
        assert!(out.contains("null"));
    }

    #[test]
    fn schema_info_lists_columns() {
        let out = render_schema("users", &users_schema());
        assert!(out.contains("table \"users\""));
        assert!(out.contains("ID: int"));
        assert!(out.contains("name: str"));
        assert!(out.contains("age: int"));
        assert!(out.contains("(3 columns)"));
    }
}
