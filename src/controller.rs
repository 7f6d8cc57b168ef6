use std::time::{Duration, Instant};

use tracing::{debug, error, info, trace};

use crate::config::GridConfig;
use crate::debounce::Debouncer;
use crate::domain::{FilterKind, GridError, GridEvent, SideAction};
use crate::export::export_csv;
use crate::model::{GridModel, GridStatus, GridView};
use crate::paginate::PageSize;
use crate::rows::Row;
use crate::source::{DataPage, DataSource, MutationKind, RowMutation, SourceQuery};

pub type EventHandler = Box<dyn FnMut(&GridEvent)>;

/// Sequence ticket of one in-flight refresh. Completions carrying a ticket
/// older than the latest issued one are discarded so a slow fetch can never
/// overwrite newer state with stale data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

// A pending debounced filter edit: per-column terms carry the field name,
// global/shared edits do not.
#[derive(Debug, Clone)]
struct FilterEdit {
    field: Option<String>,
    value: String,
}

/// Orchestrates the grid: owns the model and the data source, runs the
/// transition table, emits domain events synchronously with their trigger.
pub struct GridController {
    model: GridModel,
    source: Box<dyn DataSource>,
    handlers: Vec<EventHandler>,
    filter_debounce: Debouncer<FilterEdit>,
    issued: u64,
}

impl GridController {
    pub fn new(config: GridConfig, source: Box<dyn DataSource>) -> Self {
        let debounce = Debouncer::new(Duration::from_millis(config.debounce_ms));
        GridController {
            model: GridModel::new(config),
            source,
            handlers: Vec::new(),
            filter_debounce: debounce,
            issued: 0,
        }
    }

    pub fn on(&mut self, handler: EventHandler) {
        self.handlers.push(handler);
    }

    fn emit(&mut self, event: GridEvent) {
        trace!("Emitting {event:?}");
        for handler in &mut self.handlers {
            handler(&event);
        }
    }

    pub fn model(&self) -> &GridModel {
        &self.model
    }

    pub fn view(&self) -> GridView {
        self.model.view()
    }

    pub fn status(&self) -> GridStatus {
        self.model.status()
    }

    fn is_server_side(&self) -> bool {
        self.model.is_server_side()
    }

    /// Initial load: fetch (or accept) the data, build the catalog once,
    /// compute the colspan and leave the grid `Ready`.
    pub fn init(&mut self) {
        let (ticket, query) = self.begin_refresh();
        let result = self.source.fetch(&query);
        self.complete_refresh(ticket, result);
        self.emit(GridEvent::Init);
    }

    /// Start a data refresh: the grid goes `Loading` and the query snapshot
    /// for the current state is handed out together with a sequence ticket.
    pub fn begin_refresh(&mut self) -> (FetchTicket, SourceQuery) {
        self.issued += 1;
        self.model.set_loading();
        (FetchTicket(self.issued), self.build_query())
    }

    /// Deliver the outcome of a refresh. Stale tickets are dropped; a failed
    /// fetch keeps the previous data intact. Both paths clear the loading
    /// state.
    pub fn complete_refresh(&mut self, ticket: FetchTicket, result: Result<DataPage, GridError>) {
        if ticket.0 != self.issued {
            debug!("Discarding stale fetch completion {} (latest {})", ticket.0, self.issued);
            return;
        }
        match result {
            Ok(page) => {
                let total = self.is_server_side().then_some(page.total_rows);
                self.model.accept_rows(page.rows, total);
                self.model.run_pipeline();
            }
            Err(err) => {
                error!("Data refresh failed: {err:?}");
                // No previous Ready state to fall back to, render empty.
                if self.model.rows().is_empty() {
                    self.model.accept_empty();
                }
            }
        }
        self.model.set_ready();
    }

    // Refresh synchronously through the owned source. Server mode refetches;
    // client mode just re-runs the pipeline on the cached rows.
    fn refresh(&mut self) {
        if self.is_server_side() {
            let (ticket, query) = self.begin_refresh();
            let result = self.source.fetch(&query);
            self.complete_refresh(ticket, result);
        } else {
            self.model.run_pipeline();
        }
    }

    fn build_query(&self) -> SourceQuery {
        let pagination = &self.model.pagination;
        let mut query = SourceQuery {
            current_page: pagination.current_page,
            page_size: pagination.page_size.wire_value(pagination.total_rows),
            sort_column: self.model.sort.column.clone().unwrap_or_default(),
            sort_direction: self.model.sort.direction,
            extra: self.model.config.query_params.clone(),
            ..SourceQuery::default()
        };
        query.set_terms(&self.model.filter.wire_terms(), self.model.config.filter_delimiter);
        query
    }

    /// Debounced filter input. Call on every keystroke; nothing happens
    /// until the quiet window elapses in `poll`.
    pub fn filter_input(&mut self, field: Option<&str>, value: &str, now: Instant) {
        self.filter_debounce.input(
            FilterEdit { field: field.map(String::from), value: value.trim().to_string() },
            now,
        );
    }

    /// Event-loop tick: deliver any debounced edit whose quiet window has
    /// elapsed.
    pub fn poll(&mut self, now: Instant) {
        if let Some(edit) = self.filter_debounce.poll(now) {
            self.apply_filter(edit.field.as_deref(), &edit.value);
        }
    }

    /// Drop a pending debounced edit, e.g. when the prompt is cancelled.
    pub fn cancel_filter_input(&mut self) {
        self.filter_debounce.cancel();
    }

    /// Apply a filter edit immediately: update the term state, reset to the
    /// first page and refresh.
    pub fn apply_filter(&mut self, field: Option<&str>, value: &str) {
        if !self.model.config.filter {
            return;
        }
        match field {
            Some(field) if self.model.filter.kind == FilterKind::PerColumn => {
                self.model.filter.terms.set(field, value);
            }
            _ => self.model.filter.query = value.to_string(),
        }
        self.model.pagination.current_page = 1;
        self.refresh();
        let terms = self.model.filter.wire_terms();
        self.emit(GridEvent::FilterChange { terms });
    }

    /// Toggle a field in or out of the participating set of the shared
    /// filter modes.
    pub fn toggle_filter_field(&mut self, field: &str) {
        if !self.model.filter.kind.is_shared() {
            return;
        }
        let single = self.model.filter.kind == FilterKind::SharedField;
        if single {
            self.model.filter.terms.clear();
            self.model.filter.terms.add_field(field);
        } else if self.model.filter.terms.contains_field(field) {
            // The last participating field stays, as with selection bounds.
            if self.model.filter.terms.len() <= 1 {
                return;
            }
            self.model.filter.terms.remove(field);
        } else {
            self.model.filter.terms.add_field(field);
        }
        self.apply_filter(None, &self.model.filter.query.clone());
    }

    /// Sort-column click: toggle or reset direction, re-sort the current
    /// filtered set (client) or refetch (server).
    pub fn sort_by(&mut self, column: &str) {
        if !self.model.config.sortable {
            return;
        }
        let sortable = self.model.catalog().get(column).is_some_and(|f| f.sortable);
        if !sortable {
            return;
        }
        self.model.sort.click(column);
        if self.is_server_side() {
            self.refresh();
        } else {
            self.model.resort();
        }
        let direction = self.model.sort.direction;
        self.emit(GridEvent::SortChange { column: column.to_string(), direction });
    }

    /// Move to a page. Out-of-range targets are rejected before any refresh
    /// happens.
    pub fn go_to_page(&mut self, page: usize) {
        if !self.model.pagination.set_page(page) {
            return;
        }
        if self.is_server_side() {
            self.refresh();
        }
        self.emit(GridEvent::PageChange { page });
    }

    pub fn next_page(&mut self) {
        self.go_to_page(self.model.pagination.current_page + 1);
    }

    pub fn prev_page(&mut self) {
        let current = self.model.pagination.current_page;
        if current > 1 {
            self.go_to_page(current - 1);
        }
    }

    pub fn first_page(&mut self) {
        self.go_to_page(1);
    }

    pub fn last_page(&mut self) {
        self.go_to_page(self.model.pagination.last_page());
    }

    /// Change the page size, reset to the first page and refresh.
    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.model.pagination.set_page_size(page_size);
        self.refresh();
        self.emit(GridEvent::PageSizeChange { page_size });
    }

    /// Flip a column's visibility and recompute the colspan. The header and
    /// body need a full re-render afterwards.
    pub fn toggle_column(&mut self, name: &str) -> bool {
        let visible = self.model.catalog().get(name).map(|f| f.visible);
        let Some(visible) = visible else {
            return false;
        };
        if !self.model.catalog_mut().set_visible(name, !visible) {
            return false;
        }
        self.model.update_colspan();
        true
    }

    /// Toggle one row's selection. No pipeline re-run, the selection events
    /// are the only effect.
    pub fn toggle_row(&mut self, id: &str) {
        if !self.model.config.selectable {
            return;
        }
        self.model.selection.toggle(id);
        let rows = self.model.selected_rows();
        self.emit(GridEvent::SelectedChange { rows });
    }

    /// Check or clear every row surviving the current filter.
    pub fn select_all_rows(&mut self, checked: bool) {
        if !self.model.config.selectable {
            return;
        }
        let ids = self.model.visible_ids();
        self.model.selection.set_all(&ids, checked);
        let rows = self.model.selected_rows();
        self.emit(GridEvent::SelectedChange { rows: rows.clone() });
        self.emit(GridEvent::SelectedAllChange { checked, rows });
    }

    pub fn selected_rows(&self) -> Vec<Row> {
        self.model.selected_rows()
    }

    /// Render the export blob for the configured scope.
    pub fn export_csv(&self) -> String {
        let rows = if self.model.config.export.filtered_only {
            self.model.filtered_rows()
        } else {
            self.model.all_rows()
        };
        export_csv(
            self.model.catalog(),
            &rows,
            self.model.formatter(),
            self.model.config.export.delimiter,
        )
    }

    /// Run a row mutation against the remote endpoints and emit the
    /// before/after events around it. The mutation itself is the remote
    /// collaborator's business; a failure is logged and returned.
    pub fn mutate_row(
        &mut self,
        kind: MutationKind,
        before: Row,
        after: Row,
    ) -> Result<(), GridError> {
        match kind {
            MutationKind::Update | MutationKind::Insert => {
                self.emit(GridEvent::BeforeUpdate { row: before.clone() });
            }
            MutationKind::Delete => {
                self.emit(GridEvent::BeforeDelete { row: before.clone() });
            }
        }
        let mutation = RowMutation { before: before.clone(), after: after.clone() };
        let result = self.source.post_mutation(kind, &mutation);
        match result {
            Ok(_) => {
                info!("Row mutation {kind:?} applied");
                self.emit(GridEvent::AfterUpdate { before, after });
                if self.model.config.side == SideAction::Server {
                    self.refresh();
                }
                Ok(())
            }
            Err(err) => {
                error!("Row mutation {kind:?} failed: {err:?}");
                Err(err)
            }
        }
    }
}
