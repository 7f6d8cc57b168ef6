use std::time::Instant;

use serde_json::json;
use tracing::{error, trace};

use crate::config::FilterFieldConfig;
use crate::debounce::Debouncer;
use crate::domain::{FilterFieldEvent, InputKind, SelectAllState, SelectMode};
use crate::fields::{Field, FieldCatalog};
use crate::postback::{PostbackPayload, PostbackSink, command_argument, sanitize_text, sanitize_value};
use crate::rows::Row;
use crate::selection::FieldSelection;

pub type FilterFieldHandler = Box<dyn FnMut(&FilterFieldEvent)>;

/// The filter-field widget: a debounced query input plus a dropdown
/// selecting which fields participate in the search. A smaller instance of
/// the grid's selection state machine, sharing the field catalog and the
/// bounded selection rules.
pub struct FilterField {
    config: FilterFieldConfig,
    catalog: FieldCatalog,
    selection: FieldSelection,
    query: String,
    is_open: bool,
    debounce: Debouncer<String>,
    handlers: Vec<FilterFieldHandler>,
    postback: Option<(String, Box<dyn PostbackSink>)>,
}

impl FilterField {
    /// Create the widget from its configuration and an optional sample row
    /// for field auto-discovery. The catalog is built exactly once.
    pub fn new(config: FilterFieldConfig, sample: Option<&Row>) -> Self {
        let catalog = FieldCatalog::build(
            config.fields.clone(),
            sample,
            config.auto_generate_fields,
        );
        let mut selection = FieldSelection::new(
            config.select_mode,
            config.min_selected,
            config.max_selected,
        );
        let eligible = Self::eligible_of(&catalog);
        selection.seed(&eligible);

        let debounce =
            Debouncer::new(std::time::Duration::from_millis(config.debounce_ms));
        let query = config.input_value.clone();
        let is_open = config.is_open;
        FilterField {
            config,
            catalog,
            selection,
            query,
            is_open,
            debounce,
            handlers: Vec::new(),
            postback: None,
        }
    }

    fn eligible_of(catalog: &FieldCatalog) -> Vec<String> {
        catalog.visible().map(|f| f.name.clone()).collect()
    }

    fn eligible(&self) -> Vec<String> {
        Self::eligible_of(&self.catalog)
    }

    pub fn on(&mut self, handler: FilterFieldHandler) {
        self.handlers.push(handler);
    }

    /// Attach the legacy postback channel: a sink plus the framework target
    /// name forwarded with every command.
    pub fn with_postback(mut self, target: impl Into<String>, sink: Box<dyn PostbackSink>) -> Self {
        self.postback = Some((target.into(), sink));
        self
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn selected_fields(&self) -> &[String] {
        self.selection.names()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn get_field_by_name(&self, name: &str) -> Option<&Field> {
        if name.is_empty() {
            error!("Field lookup needs a non-empty name");
            return None;
        }
        self.catalog.get(name)
    }

    /// The input control kind: single mode follows the selected field's
    /// type, multiple mode is always a plain search box.
    pub fn input_kind(&self) -> InputKind {
        match self.config.select_mode {
            SelectMode::Multiple => InputKind::Search,
            SelectMode::Single => self
                .selection
                .names()
                .first()
                .and_then(|name| self.catalog.get(name))
                .map(|field| InputKind::for_field(field.field_type))
                .unwrap_or(InputKind::Search),
        }
    }

    /// Debounced query keystroke.
    pub fn input(&mut self, value: &str, now: Instant) {
        self.debounce.input(value.trim().to_string(), now);
    }

    /// Event-loop tick: fire the filter change once the quiet window has
    /// elapsed.
    pub fn poll(&mut self, now: Instant) {
        if let Some(value) = self.debounce.poll(now) {
            self.set_query(&value);
        }
    }

    /// Apply a query value immediately.
    pub fn set_query(&mut self, value: &str) {
        self.query = value.to_string();
        self.rise_filter_change();
    }

    /// Toggle one field's participation. Bound violations are silent no-ops
    /// and report `false` so the UI leaves the checkbox alone.
    pub fn toggle_field(&mut self, name: &str) -> bool {
        if self.catalog.get(name).is_none() {
            return false;
        }
        let applied = self.selection.toggle(name);
        if applied {
            trace!("Filter fields now {:?}", self.selection.names());
            self.emit(FilterFieldEvent::SelectedChange {
                fields: self.selection.names().to_vec(),
            });
        }
        applied
    }

    /// Bounded select-all / deselect-all over the visible fields.
    pub fn select_all(&mut self, checked: bool) {
        let eligible = self.eligible();
        if checked {
            self.selection.select_all(&eligible);
        } else {
            self.selection.deselect_all(&eligible);
        }
        self.emit(FilterFieldEvent::SelectedChange { fields: self.selection.names().to_vec() });
    }

    pub fn select_all_state(&self) -> SelectAllState {
        self.selection.select_all_state(&self.eligible())
    }

    pub fn open(&mut self) {
        self.is_open = true;
    }

    /// Closing the dropdown commits the selection: the label updates and the
    /// filter change is announced, postback included.
    pub fn close(&mut self) {
        self.is_open = false;
        self.rise_filter_change();
    }

    /// The composed label: selected display texts in selection order,
    /// truncated with an "and N more" suffix past `max_label_count`.
    pub fn label(&self) -> String {
        self.selection.label(&self.catalog, self.config.max_label_count)
    }

    fn emit(&mut self, event: FilterFieldEvent) {
        for handler in &mut self.handlers {
            handler(&event);
        }
    }

    fn rise_filter_change(&mut self) {
        let fields = self.selection.names().to_vec();
        let value = self.query.clone();
        self.emit(FilterFieldEvent::FilterChange { fields: fields.clone(), value: value.clone() });

        if self.config.auto_post_back && self.postback.is_some() {
            let data = json!({ "fields": fields, "value": value });
            let payload = PostbackPayload {
                is_open: self.is_open,
                label: sanitize_text(&self.label()),
                input_type: self.input_kind().as_str().to_string(),
                data: sanitize_value(&data),
            };
            let argument = command_argument("filterChange", &payload);
            if let Some((target, sink)) = self.postback.as_mut() {
                sink.post_back(target, &argument);
            }
        }
    }
}
