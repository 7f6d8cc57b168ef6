use std::collections::HashSet;

use crate::domain::{SelectAllState, SelectMode};
use crate::fields::FieldCatalog;

/// Selected row identities of a grid. Single mode replaces the selection on
/// every pick, multiple mode toggles per id.
#[derive(Debug, Clone)]
pub struct RowSelection {
    mode: SelectMode,
    selected: HashSet<String>,
}

impl RowSelection {
    pub fn new(mode: SelectMode) -> Self {
        RowSelection { mode, selected: HashSet::new() }
    }

    pub fn toggle(&mut self, id: &str) {
        match self.mode {
            SelectMode::Single => {
                self.selected.clear();
                self.selected.insert(id.to_string());
            }
            SelectMode::Multiple => {
                if !self.selected.remove(id) {
                    self.selected.insert(id.to_string());
                }
            }
        }
    }

    /// Check or clear every id of the given universe at once.
    pub fn set_all(&mut self, ids: &[String], checked: bool) {
        self.selected.clear();
        if checked {
            self.selected.extend(ids.iter().cloned());
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Tri-state of the select-all control over the currently visible ids.
    pub fn select_all_state(&self, visible_ids: &[String]) -> SelectAllState {
        if visible_ids.is_empty() {
            return SelectAllState::Unchecked;
        }
        let selected = visible_ids.iter().filter(|id| self.selected.contains(*id)).count();
        if selected == 0 {
            SelectAllState::Unchecked
        } else if selected == visible_ids.len() {
            SelectAllState::Checked
        } else {
            SelectAllState::Indeterminate
        }
    }
}

/// Ordered selection of field names with min/max bounds, used by the
/// filter-field widget. Selection order is user interaction order; it feeds
/// the label composition.
#[derive(Debug, Clone)]
pub struct FieldSelection {
    mode: SelectMode,
    selected: Vec<String>,
    min_selected: usize,
    max_selected: Option<usize>,
}

impl FieldSelection {
    pub fn new(mode: SelectMode, min_selected: usize, max_selected: Option<usize>) -> Self {
        FieldSelection { mode, selected: Vec::new(), min_selected, max_selected }
    }

    /// Initial selection: everything eligible in multiple mode (bounded by
    /// the maximum), the first eligible field in single mode.
    pub fn seed(&mut self, eligible: &[String]) {
        self.selected.clear();
        match self.mode {
            SelectMode::Single => self.selected.extend(eligible.first().cloned()),
            SelectMode::Multiple => {
                let take = self.max_selected.unwrap_or(eligible.len());
                self.selected.extend(eligible.iter().take(take).cloned());
            }
        }
    }

    /// Toggle one field. A toggle that would violate the min/max bounds is
    /// rejected silently: state stays untouched and `false` is returned so
    /// the UI skips the visual change.
    pub fn toggle(&mut self, name: &str) -> bool {
        if self.mode == SelectMode::Single {
            self.selected.clear();
            self.selected.push(name.to_string());
            return true;
        }
        let currently = self.selected.iter().position(|f| f == name);
        match currently {
            Some(pos) => {
                if self.selected.len() <= self.min_selected {
                    return false;
                }
                self.selected.remove(pos);
                true
            }
            None => {
                if let Some(max) = self.max_selected
                    && self.selected.len() >= max
                {
                    return false;
                }
                self.selected.push(name.to_string());
                true
            }
        }
    }

    /// Bounded select-all: with a maximum below the total this selects the
    /// first `max_selected` eligible fields in catalog order, not all of
    /// them.
    pub fn select_all(&mut self, eligible: &[String]) {
        let take = self.max_selected.unwrap_or(eligible.len());
        self.selected = eligible.iter().take(take).cloned().collect();
    }

    /// Bounded deselect-all keeps the first `min_selected` fields so the
    /// minimum bound is never violated.
    pub fn deselect_all(&mut self, eligible: &[String]) {
        self.selected = eligible.iter().take(self.min_selected).cloned().collect();
    }

    pub fn select_all_state(&self, eligible: &[String]) -> SelectAllState {
        if eligible.is_empty() {
            return SelectAllState::Unchecked;
        }
        let selected = eligible.iter().filter(|f| self.contains(f)).count();
        if selected == 0 {
            SelectAllState::Unchecked
        } else if selected == eligible.len() {
            SelectAllState::Checked
        } else {
            SelectAllState::Indeterminate
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.selected.iter().any(|f| f == name)
    }

    pub fn names(&self) -> &[String] {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Compose the widget label from the selected display texts, in user
    /// selection order, truncated to `max_label_count` with an
    /// "and N more" suffix.
    pub fn label(&self, catalog: &FieldCatalog, max_label_count: Option<usize>) -> String {
        if self.selected.is_empty() {
            return String::new();
        }
        let texts: Vec<String> = self
            .selected
            .iter()
            .map(|name| {
                catalog
                    .get(name)
                    .map(|f| f.display_text.clone())
                    .unwrap_or_else(|| name.clone())
            })
            .collect();

        if self.mode == SelectMode::Single {
            return texts[0].clone();
        }
        match max_label_count {
            Some(max) if texts.len() > max => {
                let head = texts[..max].join(", ");
                format!("{head} and {} more", texts.len() - max)
            }
            _ => texts.join(", "),
        }
    }
}
