use tracing::{debug, error};

use crate::domain::FieldType;
use crate::rows::Row;

/// Description of one data attribute: named, typed, orderable and
/// visibility-toggleable. Identity is `name`; hidden fields are flagged,
/// never removed from the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub display_text: String,
    pub title: String,
    pub field_type: FieldType,
    pub format: Option<String>,
    pub visible: bool,
    pub sortable: bool,
    pub filterable: bool,
    pub order: i64,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Field {
            display_text: name.clone(),
            name,
            title: String::new(),
            field_type: FieldType::Text,
            format: None,
            visible: true,
            sortable: true,
            filterable: true,
            order: 0,
        }
    }

    pub fn display_text(mut self, text: impl Into<String>) -> Self {
        self.display_text = text.into();
        self
    }

    pub fn field_type(mut self, field_type: FieldType) -> Self {
        self.field_type = field_type;
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

// First letter upper, rest lower. Display text for auto-generated fields.
fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
    }
}

/// The field catalog, shared read-only by the filter, sort and selection
/// engines. Built once per widget instance.
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    fields: Vec<Field>,
}

impl FieldCatalog {
    /// Merge explicitly configured fields with fields discovered from a
    /// sample row. Explicit entries win and are deduplicated by name (first
    /// occurrence wins, nameless entries are dropped). Discovered fields get
    /// `display_text` derived from the key and `order` equal to the key
    /// index. The result is stable-sorted by `order`.
    pub fn build(explicit: Vec<Field>, sample: Option<&Row>, auto_generate: bool) -> Self {
        let mut fields: Vec<Field> = Vec::with_capacity(explicit.len());
        for field in explicit {
            if field.name.is_empty() {
                continue;
            }
            if fields.iter().any(|f| f.name == field.name) {
                continue;
            }
            fields.push(field);
        }

        if auto_generate && let Some(row) = sample {
            for (idx, key) in row.keys().enumerate() {
                if fields.iter().any(|f| f.name == *key) {
                    continue;
                }
                let field = Field::new(key.clone())
                    .display_text(title_case(key))
                    .order(idx as i64);
                fields.push(field);
            }
        }

        // Vec::sort_by is stable, ties keep their relative order.
        fields.sort_by(|a, b| a.order.cmp(&b.order));
        debug!("Built field catalog with {} fields", fields.len());
        FieldCatalog { fields }
    }

    pub fn from_fields(fields: Vec<Field>) -> Self {
        Self::build(fields, None, false)
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        if name.is_empty() {
            error!("Field lookup needs a non-empty name");
            return None;
        }
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Field> {
        if name.is_empty() {
            error!("Field lookup needs a non-empty name");
            return None;
        }
        self.fields.iter_mut().find(|f| f.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn visible(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.visible)
    }

    pub fn visible_count(&self) -> usize {
        self.fields.iter().filter(|f| f.visible).count()
    }

    /// Fields the filter UI offers: visible and filterable, in catalog order.
    pub fn filter_candidates(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.visible && f.filterable)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Flip a field's visibility. Hiding the last visible field is rejected
    /// silently so the grid never renders without columns.
    pub fn set_visible(&mut self, name: &str, visible: bool) -> bool {
        if !visible && self.visible_count() <= 1 {
            return false;
        }
        match self.get_mut(name) {
            Some(field) => {
                field.visible = visible;
                true
            }
            None => false,
        }
    }
}
