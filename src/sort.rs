use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::trace;

use crate::domain::{FieldType, SortDirection};
use crate::fields::Field;
use crate::filter::fold_text;
use crate::rows::{Row, cell_text};

/// Current sort column and direction. Clicking the active column flips the
/// direction, clicking a new column resets to ascending.
#[derive(Debug, Clone, Default)]
pub struct SortState {
    pub column: Option<String>,
    pub direction: SortDirection,
}

impl SortState {
    pub fn click(&mut self, column: &str) {
        if self.column.as_deref() == Some(column) {
            self.direction = self.direction.toggled();
        } else {
            self.column = Some(column.to_string());
            self.direction = SortDirection::Asc;
        }
    }
}

// Numeric interpretation of a cell. Anything non-numeric sorts to the low
// end instead of erroring.
fn numeric(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NEG_INFINITY),
        Value::String(s) => s.trim().parse().unwrap_or(f64::NEG_INFINITY),
        _ => f64::NEG_INFINITY,
    }
}

// Millisecond timestamp of a cell, if it parses as a date or date-time.
fn timestamp(value: &Value) -> Option<i64> {
    let text = cell_text(value);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
    }
    None
}

/// Ascending type-aware comparison of two cells. Descending order is the
/// negation of this result, never a separate comparator.
pub fn compare_cells(a: &Value, b: &Value, field_type: FieldType) -> Ordering {
    match field_type {
        FieldType::Number | FieldType::Decimal => {
            numeric(a).partial_cmp(&numeric(b)).unwrap_or(Ordering::Equal)
        }
        FieldType::Date | FieldType::DateTime => match (timestamp(a), timestamp(b)) {
            (Some(ta), Some(tb)) => ta.cmp(&tb),
            // Unparseable dates sort below valid ones and equal to each other.
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        FieldType::Text | FieldType::Select => {
            let (fa, fb) = (fold_text(&cell_text(a)), fold_text(&cell_text(b)));
            fa.cmp(&fb).then_with(|| cell_text(a).cmp(&cell_text(b)))
        }
    }
}

/// Stable-sort a row-index view by one column. `view` maps view positions to
/// indices into `rows`.
pub fn sort_view(rows: &[Row], view: &mut [usize], field: &Field, direction: SortDirection) {
    trace!("Sorting {} rows by {} {}", view.len(), field.name, direction.as_str());
    let null = Value::Null;
    view.sort_by(|&a, &b| {
        let va = rows[a].get(&field.name).unwrap_or(&null);
        let vb = rows[b].get(&field.name).unwrap_or(&null);
        let ord = compare_cells(va, vb, field.field_type);
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, serde_json::Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn sorted_ids(rows: &[Row], field: &Field, direction: SortDirection) -> Vec<i64> {
        let mut view: Vec<usize> = (0..rows.len()).collect();
        sort_view(rows, &mut view, field, direction);
        view.iter().map(|&i| rows[i]["id"].as_i64().unwrap()).collect()
    }

    #[test]
    fn click_toggles_and_resets() {
        let mut state = SortState::default();
        state.click("a");
        assert_eq!((state.column.as_deref(), state.direction), (Some("a"), SortDirection::Asc));
        state.click("a");
        assert_eq!(state.direction, SortDirection::Desc);
        state.click("b");
        assert_eq!((state.column.as_deref(), state.direction), (Some("b"), SortDirection::Asc));
    }

    #[test]
    fn text_sort_is_stable_over_equal_keys() {
        // Scenario A: "a" rows keep their relative order, "b" goes last.
        let rows = vec![
            row(&[("id", json!(1)), ("name", json!("b"))]),
            row(&[("id", json!(2)), ("name", json!("a"))]),
            row(&[("id", json!(3)), ("name", json!("a"))]),
        ];
        let field = Field::new("name");
        assert_eq!(sorted_ids(&rows, &field, SortDirection::Asc), [2, 3, 1]);

        let desc = sorted_ids(&rows, &field, SortDirection::Desc);
        assert_eq!(desc[0], 1);
    }

    #[test]
    fn direction_toggle_reverses_unique_keys() {
        let rows = vec![
            row(&[("id", json!(1)), ("v", json!("c"))]),
            row(&[("id", json!(2)), ("v", json!("a"))]),
            row(&[("id", json!(3)), ("v", json!("b"))]),
        ];
        let field = Field::new("v");
        let asc = sorted_ids(&rows, &field, SortDirection::Asc);
        let mut desc = sorted_ids(&rows, &field, SortDirection::Desc);
        desc.reverse();
        assert_eq!(asc, desc);
    }

    #[test]
    fn numeric_sort_sends_invalid_values_low() {
        let rows = vec![
            row(&[("id", json!(1)), ("n", json!("10"))]),
            row(&[("id", json!(2)), ("n", json!("oops"))]),
            row(&[("id", json!(3)), ("n", json!(2))]),
        ];
        let field = Field::new("n").field_type(FieldType::Number);
        assert_eq!(sorted_ids(&rows, &field, SortDirection::Asc), [2, 3, 1]);
    }

    #[test]
    fn date_sort_parses_common_formats() {
        let rows = vec![
            row(&[("id", json!(1)), ("d", json!("2024-03-01"))]),
            row(&[("id", json!(2)), ("d", json!("not a date"))]),
            row(&[("id", json!(3)), ("d", json!("2023-12-31 08:00:00"))]),
        ];
        let field = Field::new("d").field_type(FieldType::Date);
        assert_eq!(sorted_ids(&rows, &field, SortDirection::Asc), [2, 3, 1]);

        // The same invalid value compares equal to itself.
        let bad = json!("not a date");
        assert_eq!(compare_cells(&bad, &bad, FieldType::DateTime), Ordering::Equal);
    }

    #[test]
    fn text_sort_folds_case_and_accents() {
        let rows = vec![
            row(&[("id", json!(1)), ("v", json!("Ómega"))]),
            row(&[("id", json!(2)), ("v", json!("alpha"))]),
        ];
        let field = Field::new("v");
        assert_eq!(sorted_ids(&rows, &field, SortDirection::Asc), [2, 1]);
    }
}
