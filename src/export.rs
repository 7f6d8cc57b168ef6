use tracing::debug;

use crate::fields::FieldCatalog;
use crate::format::FormatEngine;
use crate::rows::{Row, row_text};

/// CSV export settings.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub delimiter: char,
    pub file_name: String,
    /// Export the filtered view instead of the full set.
    pub filtered_only: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions { delimiter: ';', file_name: "export".to_string(), filtered_only: false }
    }
}

// Every body cell is quote-wrapped, inner quotes doubled.
fn quote_cell(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// Render rows as a delimiter-separated blob: header row with the visible
/// display names, one body line per row with the visible column values
/// (formatted when the field carries a format string), CRLF line endings.
pub fn export_csv(
    catalog: &FieldCatalog,
    rows: &[&Row],
    fmt: &dyn FormatEngine,
    delimiter: char,
) -> String {
    let columns: Vec<_> = catalog.visible().collect();
    let separator = delimiter.to_string();

    let header = columns
        .iter()
        .map(|field| field.display_text.clone())
        .collect::<Vec<_>>()
        .join(&separator);

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(header);
    for row in rows {
        let line = columns
            .iter()
            .map(|field| {
                let text = if field.format.is_some() {
                    match row.get(&field.name) {
                        Some(value) => fmt.format(value, field),
                        None => String::new(),
                    }
                } else {
                    row_text(row, &field.name)
                };
                quote_cell(&text)
            })
            .collect::<Vec<_>>()
            .join(&separator);
        lines.push(line);
    }

    debug!("Exported {} rows to csv", rows.len());
    lines.join("\r\n")
}

/// One row rendered the CSV way, used for clipboard copies.
pub fn row_as_csv(catalog: &FieldCatalog, row: &Row, delimiter: char) -> String {
    let separator = delimiter.to_string();
    catalog
        .visible()
        .map(|field| quote_cell(&row_text(row, &field.name)))
        .collect::<Vec<_>>()
        .join(&separator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FieldType;
    use crate::fields::Field;
    use crate::format::BasicFormat;
    use serde_json::json;

    fn row(pairs: &[(&str, serde_json::Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn header_uses_visible_display_names() {
        let catalog = FieldCatalog::from_fields(vec![
            Field::new("a").display_text("Alpha"),
            Field::new("b").display_text("Beta").hidden(),
            Field::new("c").display_text("Gamma"),
        ]);
        let r = row(&[("a", json!("1")), ("b", json!("2")), ("c", json!("3"))]);
        let csv = export_csv(&catalog, &[&r], &BasicFormat, ';');
        assert_eq!(csv, "Alpha;Gamma\r\n\"1\";\"3\"");
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let catalog = FieldCatalog::from_fields(vec![Field::new("a")]);
        let r = row(&[("a", json!("say \"hi\";ok"))]);
        let csv = export_csv(&catalog, &[&r], &BasicFormat, ';');
        assert!(csv.ends_with("\"say \"\"hi\"\";ok\""));
    }

    #[test]
    fn format_strings_apply_to_body_cells() {
        let catalog = FieldCatalog::from_fields(vec![
            Field::new("n").field_type(FieldType::Decimal).format("decimal:1"),
        ]);
        let r = row(&[("n", json!(2.55))]);
        let csv = export_csv(&catalog, &[&r], &BasicFormat, ',');
        assert!(csv.ends_with("\"2.5\"") || csv.ends_with("\"2.6\""));
    }

    #[test]
    fn row_as_csv_matches_visible_columns() {
        let catalog = FieldCatalog::from_fields(vec![Field::new("a"), Field::new("b").hidden()]);
        let r = row(&[("a", json!("x")), ("b", json!("y"))]);
        assert_eq!(row_as_csv(&catalog, &r, ','), "\"x\"");
    }
}
