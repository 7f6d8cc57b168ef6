use serde_json::Value;

/// A row is an opaque mapping from field name to value, externally supplied
/// and read-only to the grid core. Key order is preserved so auto-generated
/// field catalogs follow the order of the source data.
pub type Row = serde_json::Map<String, Value>;

/// Text rendering of a single cell. Missing and null values render empty,
/// everything else renders the way it would serialize.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

pub fn row_text(row: &Row, field: &str) -> String {
    row.get(field).map(cell_text).unwrap_or_default()
}

/// All cell texts of a row joined with spaces, the haystack for the global
/// filter mode.
pub fn row_concat(row: &Row) -> String {
    row.values().map(cell_text).collect::<Vec<_>>().join(" ")
}

/// Canonical identity of a row, taken from the configured id field.
/// Rows without that field have no identity and cannot be selected.
pub fn row_id(row: &Row, id_field: &str) -> Option<String> {
    match row.get(id_field) {
        None | Some(Value::Null) => None,
        Some(value) => Some(cell_text(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    pub fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn cell_text_renders_scalars() {
        assert_eq!(cell_text(&Value::Null), "");
        assert_eq!(cell_text(&json!("abc")), "abc");
        assert_eq!(cell_text(&json!(12)), "12");
        assert_eq!(cell_text(&json!(true)), "true");
    }

    #[test]
    fn row_id_uses_configured_field() {
        let r = row(&[("id", json!(7)), ("name", json!("x"))]);
        assert_eq!(row_id(&r, "id"), Some("7".to_string()));
        assert_eq!(row_id(&r, "key"), None);

        let r = row(&[("id", Value::Null)]);
        assert_eq!(row_id(&r, "id"), None);
    }

    #[test]
    fn row_concat_joins_all_values() {
        let r = row(&[("a", json!("x")), ("b", json!(1))]);
        assert_eq!(row_concat(&r), "x 1");
    }
}
