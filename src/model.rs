use std::time::Instant;

use tracing::{debug, info, trace};

use crate::config::GridConfig;
use crate::domain::{SelectAllState, SideAction, SortDirection};
use crate::fields::FieldCatalog;
use crate::filter::{FilterState, filter_rows};
use crate::format::{BasicFormat, FormatEngine};
use crate::paginate::{PageSize, PaginationState, slice_view};
use crate::rows::{Row, row_id, row_text};
use crate::selection::RowSelection;
use crate::sort::{SortState, sort_view};

/// Lifecycle of a grid instance. `Loading` is re-entered from `Ready` on
/// every operation that needs a data refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridStatus {
    Uninitialized,
    Loading,
    Ready,
}

/// One header cell of the rendered view.
#[derive(Debug, Clone)]
pub struct HeaderCell {
    pub name: String,
    pub text: String,
    pub sort_marker: Option<SortDirection>,
}

/// One body row of the rendered view.
#[derive(Debug, Clone)]
pub struct RowView {
    pub id: Option<String>,
    pub selected: bool,
    pub cells: Vec<String>,
}

/// Structural snapshot of the current grid state, everything the render
/// layer needs and nothing it has to compute.
#[derive(Debug, Clone)]
pub struct GridView {
    pub headers: Vec<HeaderCell>,
    pub rows: Vec<RowView>,
    pub colspan: usize,
    /// Placeholder text spanning all columns when the page is empty.
    pub placeholder: Option<String>,
    pub current_page: usize,
    pub last_page: usize,
    pub total_rows: usize,
    pub page_size: PageSize,
    pub select_all: SelectAllState,
    pub loading: bool,
    pub last_update: Instant,
}

/// Owner of all mutable grid state: catalog, raw rows, the filtered index
/// cache and the filter/sort/pagination/selection sub-states. The pipeline
/// is filter -> sort -> paginate; every mutation re-runs it from the
/// appropriate stage.
pub struct GridModel {
    pub config: GridConfig,
    catalog: FieldCatalog,
    rows: Vec<Row>,
    /// Indices into `rows`, output of the filter stage, input of sort.
    filtered: Vec<usize>,
    status: GridStatus,
    pub filter: FilterState,
    pub sort: SortState,
    pub pagination: PaginationState,
    pub selection: RowSelection,
    colspan: usize,
    catalog_built: bool,
    formatter: Box<dyn FormatEngine>,
}

impl GridModel {
    pub fn new(config: GridConfig) -> Self {
        let filter = FilterState::new(config.filter_kind);
        let pagination = PaginationState::new(config.page_size);
        let selection = RowSelection::new(config.select_mode);
        GridModel {
            filter,
            sort: SortState::default(),
            pagination,
            selection,
            catalog: FieldCatalog::default(),
            rows: Vec::new(),
            filtered: Vec::new(),
            status: GridStatus::Uninitialized,
            colspan: 1,
            catalog_built: false,
            config,
            formatter: Box::new(BasicFormat),
        }
    }

    pub fn with_formatter(mut self, formatter: Box<dyn FormatEngine>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn formatter(&self) -> &dyn FormatEngine {
        self.formatter.as_ref()
    }

    pub fn status(&self) -> GridStatus {
        self.status
    }

    pub fn set_loading(&mut self) {
        self.status = GridStatus::Loading;
    }

    pub fn set_ready(&mut self) {
        self.status = GridStatus::Ready;
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut FieldCatalog {
        &mut self.catalog
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn is_server_side(&self) -> bool {
        self.config.side == SideAction::Server
    }

    /// Accept a fresh row window from the data source. The catalog is built
    /// exactly once per instance, from the explicit fields plus the first
    /// row; replacing the data later keeps the existing catalog.
    pub fn accept_rows(&mut self, rows: Vec<Row>, server_total: Option<usize>) {
        self.rows = rows;
        if !self.catalog_built {
            self.catalog = FieldCatalog::build(
                self.config.fields.clone(),
                self.rows.first(),
                self.config.auto_generate_fields,
            );
            self.catalog_built = true;
            self.seed_shared_fields();
            info!("Grid initialized with {} fields", self.catalog.len());
        }
        if let Some(total) = server_total {
            self.filtered = (0..self.rows.len()).collect();
            self.pagination.set_total(total);
        }
        self.update_colspan();
        self.status = GridStatus::Ready;
    }

    // Shared-filter modes start with the first filterable field active.
    fn seed_shared_fields(&mut self) {
        if self.filter.kind.is_shared()
            && self.filter.terms.is_empty()
            && let Some(first) = self.catalog.filter_candidates().next()
        {
            let name = first.name.clone();
            self.filter.terms.add_field(&name);
        }
    }

    /// Re-run the client-side pipeline: filter, then sort, then clamp the
    /// pagination to the new total. Server mode only re-counts, the window
    /// arrived pre-transformed.
    pub fn run_pipeline(&mut self) {
        if self.is_server_side() {
            self.filtered = (0..self.rows.len()).collect();
            return;
        }
        self.filtered = filter_rows(&self.rows, &self.filter, &self.catalog);
        if self.config.sortable
            && let Some(column) = self.sort.column.clone()
            && let Some(field) = self.catalog.get(&column).cloned()
            && field.sortable
        {
            sort_view(&self.rows, &mut self.filtered, &field, self.sort.direction);
        }
        self.pagination.set_total(self.filtered.len());
        trace!(
            "Pipeline: {} rows -> {} filtered, page {}/{}",
            self.rows.len(),
            self.filtered.len(),
            self.pagination.current_page,
            self.pagination.last_page()
        );
    }

    /// Re-sort the current filtered set without re-filtering.
    pub fn resort(&mut self) {
        if self.is_server_side() || !self.config.sortable {
            return;
        }
        if let Some(column) = self.sort.column.clone()
            && let Some(field) = self.catalog.get(&column).cloned()
            && field.sortable
        {
            sort_view(&self.rows, &mut self.filtered, &field, self.sort.direction);
        }
    }

    /// Number of columns a placeholder row has to span: visible fields plus
    /// the selection column, overridable from the configuration.
    pub fn update_colspan(&mut self) {
        if let Some(colspan) = self.config.colspan {
            self.colspan = colspan;
            return;
        }
        self.colspan = if self.rows.is_empty() {
            1
        } else {
            self.catalog.visible_count() + usize::from(self.config.selectable)
        };
    }

    pub fn colspan(&self) -> usize {
        self.colspan
    }

    /// Row indices of the current page.
    pub fn page_indices(&self) -> &[usize] {
        if self.is_server_side() || !self.config.pagination {
            &self.filtered
        } else {
            slice_view(&self.filtered, &self.pagination)
        }
    }

    /// Identities of every row surviving the filter, the universe the
    /// select-all control ranges over.
    pub fn visible_ids(&self) -> Vec<String> {
        self.filtered
            .iter()
            .filter_map(|&idx| row_id(&self.rows[idx], &self.config.id_field))
            .collect()
    }

    /// The selected rows, in data order.
    pub fn selected_rows(&self) -> Vec<Row> {
        self.rows
            .iter()
            .filter(|row| {
                row_id(row, &self.config.id_field).is_some_and(|id| self.selection.contains(&id))
            })
            .cloned()
            .collect()
    }

    /// Rows of the filtered view, for exports.
    pub fn filtered_rows(&self) -> Vec<&Row> {
        self.filtered.iter().map(|&idx| &self.rows[idx]).collect()
    }

    pub fn all_rows(&self) -> Vec<&Row> {
        self.rows.iter().collect()
    }

    /// Build the render snapshot for the current state.
    pub fn view(&self) -> GridView {
        let headers: Vec<HeaderCell> = self
            .catalog
            .visible()
            .map(|field| HeaderCell {
                name: field.name.clone(),
                text: field.display_text.clone(),
                sort_marker: (self.sort.column.as_deref() == Some(field.name.as_str()))
                    .then_some(self.sort.direction),
            })
            .collect();

        let rows: Vec<RowView> = self
            .page_indices()
            .iter()
            .map(|&idx| {
                let row = &self.rows[idx];
                let id = row_id(row, &self.config.id_field);
                let selected = id.as_deref().is_some_and(|id| self.selection.contains(id));
                let cells = self
                    .catalog
                    .visible()
                    .map(|field| {
                        if field.format.is_some() {
                            match row.get(&field.name) {
                                Some(value) => self.formatter.format(value, field),
                                None => String::new(),
                            }
                        } else {
                            row_text(row, &field.name)
                        }
                    })
                    .collect();
                RowView { id, selected, cells }
            })
            .collect();

        let placeholder = rows.is_empty().then(|| "No records".to_string());
        let visible_ids = self.visible_ids();

        GridView {
            headers,
            rows,
            colspan: self.colspan,
            placeholder,
            current_page: self.pagination.current_page,
            last_page: self.pagination.last_page(),
            total_rows: self.pagination.total_rows,
            page_size: self.pagination.page_size,
            select_all: self.selection.select_all_state(&visible_ids),
            loading: self.status == GridStatus::Loading,
            last_update: Instant::now(),
        }
    }

    /// Downgrade to an empty dataset after an invalid source, still ending
    /// up `Ready` so an empty state renders instead of crashing.
    pub fn accept_empty(&mut self) {
        debug!("Accepting empty dataset");
        self.rows.clear();
        self.filtered.clear();
        if !self.catalog_built {
            self.catalog = FieldCatalog::build(self.config.fields.clone(), None, false);
            self.catalog_built = true;
        }
        self.pagination.set_total(0);
        self.update_colspan();
        self.status = GridStatus::Ready;
    }
}
