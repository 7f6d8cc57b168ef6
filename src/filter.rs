use tracing::trace;

use crate::domain::FilterKind;
use crate::fields::FieldCatalog;
use crate::rows::{Row, row_concat, row_text};

/// Synthetic term key used when a global query is delegated to the server.
pub const GLOBAL_FIELD: &str = "All";

// Strip the diacritic off a precomposed Latin character, keeping case.
// Equivalent to an NFD decomposition followed by dropping combining marks
// for the character ranges that show up in real data.
pub fn strip_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' | 'Ā' | 'Ă' | 'Ą' => 'A',
        'ç' | 'ć' | 'ĉ' | 'č' => 'c',
        'Ç' | 'Ć' | 'Ĉ' | 'Č' => 'C',
        'é' | 'è' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' | 'Ē' | 'Ĕ' | 'Ė' | 'Ę' | 'Ě' => 'E',
        'í' | 'ì' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' | 'Ĩ' | 'Ī' | 'Ĭ' | 'Į' => 'I',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'Ñ' | 'Ń' | 'Ņ' | 'Ň' => 'N',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'ō' | 'ŏ' | 'ő' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' | 'Ō' | 'Ŏ' | 'Ő' => 'O',
        'ú' | 'ù' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' | 'Ũ' | 'Ū' | 'Ŭ' | 'Ů' | 'Ű' | 'Ų' => 'U',
        'ý' | 'ÿ' => 'y',
        'Ý' | 'Ÿ' => 'Y',
        'ś' | 'ŝ' | 'ş' | 'š' => 's',
        'Ś' | 'Ŝ' | 'Ş' | 'Š' => 'S',
        'ź' | 'ż' | 'ž' => 'z',
        'Ź' | 'Ż' | 'Ž' => 'Z',
        other => other,
    }
}

/// Normalize text for comparison: diacritics stripped, lowercased.
pub fn fold_text(text: &str) -> String {
    text.chars().map(strip_diacritic).flat_map(|c| c.to_lowercase()).collect()
}

/// Ordered collection of `(field, text)` filter terms. Insertion order is
/// user interaction order; setting an empty text removes the term so no
/// empty term is ever stored.
#[derive(Debug, Clone, Default)]
pub struct FilterTerms {
    terms: Vec<(String, String)>,
}

impl FilterTerms {
    pub fn set(&mut self, field: &str, value: &str) {
        if value.is_empty() {
            self.remove(field);
            return;
        }
        match self.terms.iter_mut().find(|(f, _)| f == field) {
            Some(term) => term.1 = value.to_string(),
            None => self.terms.push((field.to_string(), value.to_string())),
        }
    }

    /// Register a participating field without a value (shared-field modes).
    pub fn add_field(&mut self, field: &str) {
        if !self.terms.iter().any(|(f, _)| f == field) {
            self.terms.push((field.to_string(), String::new()));
        }
    }

    pub fn remove(&mut self, field: &str) {
        self.terms.retain(|(f, _)| f != field);
    }

    pub fn clear(&mut self) {
        self.terms.clear();
    }

    pub fn fields(&self) -> Vec<String> {
        self.terms.iter().map(|(f, _)| f.clone()).collect()
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.terms.iter().any(|(f, _)| f == field)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.terms.iter().find(|(f, _)| f == field).map(|(_, v)| v.as_str())
    }

    /// Terms that carry a value, in insertion order.
    pub fn active(&self) -> impl Iterator<Item = (&str, &str)> {
        self.terms
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(f, v)| (f.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Filter state of a grid: the mode, the per-column term collection and the
/// single shared query used by the global and shared-field modes. In shared
/// modes the term collection only names the participating fields; the shared
/// query always wins over any per-field text.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    pub kind: FilterKind,
    pub terms: FilterTerms,
    pub query: String,
}

impl FilterState {
    pub fn new(kind: FilterKind) -> Self {
        FilterState { kind, terms: FilterTerms::default(), query: String::new() }
    }

    /// Order-aligned `(field, value)` pairs for server delegation.
    pub fn wire_terms(&self) -> Vec<(String, String)> {
        match self.kind {
            FilterKind::Global => {
                if self.query.is_empty() {
                    Vec::new()
                } else {
                    vec![(GLOBAL_FIELD.to_string(), self.query.clone())]
                }
            }
            FilterKind::PerColumn => self
                .terms
                .active()
                .map(|(f, v)| (f.to_string(), v.to_string()))
                .collect(),
            FilterKind::SharedField | FilterKind::SharedFields => self
                .terms
                .fields()
                .into_iter()
                .map(|f| (f, self.query.clone()))
                .collect(),
        }
    }
}

/// Apply the filter client-side, returning the indices of surviving rows.
/// Comparison is case- and diacritic-insensitive substring containment.
pub fn filter_rows(rows: &[Row], state: &FilterState, catalog: &FieldCatalog) -> Vec<usize> {
    let matches: Vec<usize> = match state.kind {
        FilterKind::Global => {
            let needle = fold_text(state.query.trim());
            if needle.is_empty() {
                (0..rows.len()).collect()
            } else {
                rows.iter()
                    .enumerate()
                    .filter(|(_, row)| fold_text(&row_concat(row)).contains(&needle))
                    .map(|(idx, _)| idx)
                    .collect()
            }
        }
        FilterKind::PerColumn => {
            let needles: Vec<(&str, String)> =
                state.terms.active().map(|(f, v)| (f, fold_text(v))).collect();
            rows.iter()
                .enumerate()
                .filter(|(_, row)| {
                    needles
                        .iter()
                        .all(|(field, needle)| fold_text(&row_text(row, field)).contains(needle))
                })
                .map(|(idx, _)| idx)
                .collect()
        }
        FilterKind::SharedField | FilterKind::SharedFields => {
            let needle = fold_text(state.query.trim());
            if needle.is_empty() {
                (0..rows.len()).collect()
            } else {
                let fields: Vec<String> = state
                    .terms
                    .fields()
                    .into_iter()
                    .filter(|f| catalog.get(f).is_some_and(|f| f.visible && f.filterable))
                    .collect();
                rows.iter()
                    .enumerate()
                    .filter(|(_, row)| {
                        fields.iter().any(|field| fold_text(&row_text(row, field)).contains(&needle))
                    })
                    .map(|(idx, _)| idx)
                    .collect()
            }
        }
    };

    trace!("Filter kept {}/{} rows", matches.len(), rows.len());
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Field;
    use serde_json::json;

    fn row(pairs: &[(&str, serde_json::Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn people() -> Vec<Row> {
        vec![
            row(&[("id", json!(1)), ("name", json!("José")), ("city", json!("Rosario"))]),
            row(&[("id", json!(2)), ("name", json!("Ana")), ("city", json!("Córdoba"))]),
            row(&[("id", json!(3)), ("name", json!("jose")), ("city", json!("Salta"))]),
        ]
    }

    fn catalog() -> FieldCatalog {
        FieldCatalog::from_fields(vec![Field::new("id"), Field::new("name"), Field::new("city")])
    }

    #[test]
    fn fold_is_case_and_diacritic_insensitive() {
        assert_eq!(fold_text("José"), "jose");
        assert_eq!(fold_text("CÓRDOBA"), "cordoba");
        assert_eq!(fold_text("plain"), "plain");
    }

    #[test]
    fn empty_terms_are_never_stored() {
        let mut terms = FilterTerms::default();
        terms.set("a", "x");
        terms.set("a", "");
        assert!(terms.is_empty());
    }

    #[test]
    fn terms_keep_insertion_order() {
        let mut terms = FilterTerms::default();
        terms.set("b", "1");
        terms.set("a", "2");
        terms.set("b", "3");
        assert_eq!(terms.fields(), ["b", "a"]);
        assert_eq!(terms.get("b"), Some("3"));
        assert_eq!(terms.get("x"), None);
    }

    #[test]
    fn global_filter_matches_any_column() {
        let rows = people();
        let mut state = FilterState::new(FilterKind::Global);
        state.query = "rosario".into();
        assert_eq!(filter_rows(&rows, &state, &catalog()), [0]);

        state.query.clear();
        assert_eq!(filter_rows(&rows, &state, &catalog()).len(), 3);
    }

    #[test]
    fn per_column_terms_are_anded() {
        let rows = people();
        let mut state = FilterState::new(FilterKind::PerColumn);
        state.terms.set("name", "jos");
        assert_eq!(filter_rows(&rows, &state, &catalog()), [0, 2]);

        state.terms.set("city", "sal");
        assert_eq!(filter_rows(&rows, &state, &catalog()), [2]);
    }

    #[test]
    fn filter_is_idempotent() {
        let rows = people();
        let mut state = FilterState::new(FilterKind::PerColumn);
        state.terms.set("name", "jos");
        let once = filter_rows(&rows, &state, &catalog());
        let twice = filter_rows(&rows, &state, &catalog());
        assert_eq!(once, twice);
    }

    #[test]
    fn diacritic_insensitive_match() {
        // Filter term "José" against value "jose" matches.
        let rows = vec![row(&[("name", json!("jose"))])];
        let mut state = FilterState::new(FilterKind::PerColumn);
        state.terms.set("name", "José");
        assert_eq!(filter_rows(&rows, &state, &catalog()), [0]);
    }

    #[test]
    fn shared_mode_uses_query_over_participating_fields() {
        let rows = people();
        let mut state = FilterState::new(FilterKind::SharedFields);
        state.terms.add_field("name");
        state.query = "ana".into();
        assert_eq!(filter_rows(&rows, &state, &catalog()), [1]);

        // A second participating field widens the match set.
        state.query = "sal".into();
        state.terms.add_field("city");
        assert_eq!(filter_rows(&rows, &state, &catalog()), [2]);

        state.query.clear();
        assert_eq!(filter_rows(&rows, &state, &catalog()).len(), 3);
    }

    #[test]
    fn wire_terms_align_fields_and_values() {
        let mut state = FilterState::new(FilterKind::SharedFields);
        state.terms.add_field("a");
        state.terms.add_field("b");
        state.query = "q".into();
        assert_eq!(
            state.wire_terms(),
            [("a".to_string(), "q".to_string()), ("b".to_string(), "q".to_string())]
        );

        let mut state = FilterState::new(FilterKind::Global);
        state.query = "x".into();
        assert_eq!(state.wire_terms(), [(GLOBAL_FIELD.to_string(), "x".to_string())]);
    }
}
