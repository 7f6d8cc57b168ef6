use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::domain::FieldType;
use crate::fields::Field;
use crate::rows::cell_text;

/// Formatting capability for cell values. Cell rendering and CSV export
/// apply it whenever a field carries a format string; embedders swap in a
/// locale-aware engine when they need one.
pub trait FormatEngine {
    fn format(&self, value: &Value, field: &Field) -> String;
}

/// Default engine: `decimal:N` for numbers, `upper`/`lower`/`capitalize`
/// for text and `yyyy`/`MM`/`dd`/`HH`/`mm`/`ss` token substitution for
/// dates. Unknown formats fall back to the plain cell text.
#[derive(Debug, Default)]
pub struct BasicFormat;

impl FormatEngine for BasicFormat {
    fn format(&self, value: &Value, field: &Field) -> String {
        let text = cell_text(value);
        if text.is_empty() {
            return text;
        }
        let Some(format) = field.format.as_deref() else {
            return text;
        };

        match field.field_type {
            FieldType::Number | FieldType::Decimal => format_number(&text, format),
            FieldType::Date | FieldType::DateTime => format_date(&text, format),
            FieldType::Text | FieldType::Select => format_text(&text, format),
        }
    }
}

fn format_number(text: &str, format: &str) -> String {
    let Ok(number) = text.trim().parse::<f64>() else {
        return text.to_string();
    };
    match format.split_once(':') {
        Some(("decimal", digits)) => {
            let digits = digits.parse().unwrap_or(2);
            format!("{number:.digits$}")
        }
        None if format == "decimal" => format!("{number:.2}"),
        _ => text.to_string(),
    }
}

fn format_date(text: &str, format: &str) -> String {
    let parsed = NaiveDateTime::parse_from_str(text.trim(), "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(text.trim(), "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| {
            NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map(|d| d.and_hms_opt(0, 0, 0).unwrap())
        });
    let Ok(dt) = parsed else {
        return text.to_string();
    };

    format
        .replace("yyyy", &format!("{:04}", chrono::Datelike::year(&dt)))
        .replace("MM", &format!("{:02}", chrono::Datelike::month(&dt)))
        .replace("dd", &format!("{:02}", chrono::Datelike::day(&dt)))
        .replace("HH", &format!("{:02}", chrono::Timelike::hour(&dt)))
        .replace("mm", &format!("{:02}", chrono::Timelike::minute(&dt)))
        .replace("ss", &format!("{:02}", chrono::Timelike::second(&dt)))
}

fn format_text(text: &str, format: &str) -> String {
    match format {
        "upper" => text.to_uppercase(),
        "lower" => text.to_lowercase(),
        "capitalize" => {
            let mut chars = text.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => {
                    first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect()
                }
            }
        }
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decimal_format_rounds() {
        let field = Field::new("n").field_type(FieldType::Decimal).format("decimal:2");
        assert_eq!(BasicFormat.format(&json!(1.005), &field), "1.00");
        assert_eq!(BasicFormat.format(&json!("3.14159"), &field), "3.14");
    }

    #[test]
    fn date_tokens_are_substituted() {
        let field = Field::new("d").field_type(FieldType::Date).format("dd/MM/yyyy");
        assert_eq!(BasicFormat.format(&json!("2024-03-09"), &field), "09/03/2024");

        let field = Field::new("d").field_type(FieldType::DateTime).format("yyyy-MM-dd HH:mm");
        assert_eq!(BasicFormat.format(&json!("2024-03-09 17:30:05"), &field), "2024-03-09 17:30");
    }

    #[test]
    fn text_formats_change_case() {
        let field = Field::new("t").format("capitalize");
        assert_eq!(BasicFormat.format(&json!("heLLO"), &field), "Hello");
    }

    #[test]
    fn unknown_format_passes_through() {
        let field = Field::new("t").format("sparkle");
        assert_eq!(BasicFormat.format(&json!("x"), &field), "x");

        let plain = Field::new("t");
        assert_eq!(BasicFormat.format(&json!("y"), &plain), "y");
    }
}
