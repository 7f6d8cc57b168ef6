use derive_setters::Setters;
use tracing::warn;

use crate::domain::{FilterKind, SelectMode, SideAction, validate_enum};
use crate::export::CsvOptions;
use crate::fields::Field;
use crate::paginate::PageSize;
use crate::source::RemoteEndpoints;

pub const DEBOUNCE_MS: u64 = 800;

/// Raw grid options the embedder hands in. Enum-valued settings arrive as
/// strings and are validated into `GridConfig`; anything invalid is
/// corrected to its default with a warning instead of erroring.
#[derive(Debug, Clone, Setters)]
#[setters(into)]
pub struct GridOptions {
    pub pagination: bool,
    pub page_size: String,
    pub page_list: Vec<String>,
    pub filter: bool,
    #[setters(strip_option)]
    pub filter_type: Option<String>,
    pub sortable: bool,
    pub selectable: bool,
    pub multiple_select: bool,
    #[setters(strip_option)]
    pub side_actions: Option<String>,
    pub id_field: String,
    pub auto_generate_fields: bool,
    #[setters(strip_option)]
    pub colspan: Option<usize>,
    pub fields: Vec<Field>,
    pub filter_delimiter: char,
    pub debounce_ms: u64,
    pub export: CsvOptions,
    pub endpoints: RemoteEndpoints,
    pub query_params: Vec<(String, String)>,
}

impl Default for GridOptions {
    fn default() -> Self {
        GridOptions {
            pagination: true,
            page_size: "10".to_string(),
            page_list: ["10", "25", "50", "100", "All"].map(String::from).to_vec(),
            filter: true,
            filter_type: None,
            sortable: true,
            selectable: false,
            multiple_select: true,
            side_actions: None,
            id_field: "id".to_string(),
            auto_generate_fields: true,
            colspan: None,
            fields: Vec::new(),
            filter_delimiter: ';',
            debounce_ms: DEBOUNCE_MS,
            export: CsvOptions::default(),
            endpoints: RemoteEndpoints::default(),
            query_params: Vec::new(),
        }
    }
}

/// Validated grid configuration, owned by the controller.
#[derive(Debug, Clone)]
pub struct GridConfig {
    pub pagination: bool,
    pub page_size: PageSize,
    pub page_list: Vec<PageSize>,
    pub filter: bool,
    pub filter_kind: FilterKind,
    pub sortable: bool,
    pub selectable: bool,
    pub select_mode: SelectMode,
    pub side: SideAction,
    pub id_field: String,
    pub auto_generate_fields: bool,
    pub colspan: Option<usize>,
    pub fields: Vec<Field>,
    pub filter_delimiter: char,
    pub debounce_ms: u64,
    pub export: CsvOptions,
    pub endpoints: RemoteEndpoints,
    pub query_params: Vec<(String, String)>,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig::from_options(GridOptions::default())
    }
}

impl GridConfig {
    pub fn from_options(options: GridOptions) -> Self {
        let filter_kind = validate_enum(
            "filterType",
            options.filter_type.as_deref(),
            FilterKind::parse,
            FilterKind::Global,
        );
        let side = validate_enum(
            "sideActions",
            options.side_actions.as_deref(),
            SideAction::parse,
            SideAction::Client,
        );
        let page_size = match PageSize::parse(&options.page_size) {
            Some(size) => size,
            None => {
                warn!("Invalid pageSize \"{}\", falling back to default", options.page_size);
                PageSize::default()
            }
        };
        let page_list: Vec<PageSize> = options
            .page_list
            .iter()
            .filter_map(|entry| {
                let parsed = PageSize::parse(entry);
                if parsed.is_none() {
                    warn!("Dropping invalid pageList entry \"{entry}\"");
                }
                parsed
            })
            .collect();

        GridConfig {
            pagination: options.pagination,
            page_size,
            page_list,
            filter: options.filter,
            filter_kind,
            sortable: options.sortable,
            selectable: options.selectable,
            select_mode: if options.multiple_select { SelectMode::Multiple } else { SelectMode::Single },
            side,
            id_field: options.id_field,
            auto_generate_fields: options.auto_generate_fields,
            colspan: options.colspan,
            fields: options.fields,
            filter_delimiter: options.filter_delimiter,
            debounce_ms: options.debounce_ms,
            export: options.export,
            endpoints: options.endpoints,
            query_params: options.query_params,
        }
    }
}

/// Raw options of the filter-field widget.
#[derive(Debug, Clone, Setters)]
#[setters(into)]
pub struct FilterFieldOptions {
    #[setters(strip_option)]
    pub filter_type: Option<String>,
    pub auto_generate_fields: bool,
    pub min_selected: usize,
    #[setters(strip_option)]
    pub max_selected: Option<usize>,
    #[setters(strip_option)]
    pub max_label_count: Option<usize>,
    pub create_label: bool,
    pub fields: Vec<Field>,
    pub debounce_ms: u64,
    pub auto_post_back: bool,
    pub is_open: bool,
    pub input_value: String,
}

impl Default for FilterFieldOptions {
    fn default() -> Self {
        FilterFieldOptions {
            filter_type: None,
            auto_generate_fields: true,
            min_selected: 1,
            max_selected: None,
            max_label_count: None,
            create_label: false,
            fields: Vec::new(),
            debounce_ms: DEBOUNCE_MS,
            auto_post_back: false,
            is_open: false,
            input_value: String::new(),
        }
    }
}

/// Validated filter-field configuration.
#[derive(Debug, Clone)]
pub struct FilterFieldConfig {
    pub select_mode: SelectMode,
    pub auto_generate_fields: bool,
    pub min_selected: usize,
    pub max_selected: Option<usize>,
    pub max_label_count: Option<usize>,
    pub create_label: bool,
    pub fields: Vec<Field>,
    pub debounce_ms: u64,
    pub auto_post_back: bool,
    pub is_open: bool,
    pub input_value: String,
}

impl Default for FilterFieldConfig {
    fn default() -> Self {
        FilterFieldConfig::from_options(FilterFieldOptions::default())
    }
}

impl FilterFieldConfig {
    pub fn from_options(options: FilterFieldOptions) -> Self {
        let select_mode = validate_enum(
            "filterType",
            options.filter_type.as_deref(),
            SelectMode::parse,
            SelectMode::Multiple,
        );
        FilterFieldConfig {
            select_mode,
            auto_generate_fields: options.auto_generate_fields,
            min_selected: options.min_selected,
            max_selected: options.max_selected,
            max_label_count: options.max_label_count,
            create_label: options.create_label,
            fields: options.fields,
            debounce_ms: options.debounce_ms,
            auto_post_back: options.auto_post_back,
            is_open: options.is_open,
            input_value: options.input_value,
        }
    }
}
