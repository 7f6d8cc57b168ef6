use std::io::Error as IoError;

use polars::error::PolarsError;
use tracing::warn;

use crate::paginate::PageSize;
use crate::rows::Row;

#[derive(Debug)]
pub enum GridError {
    Io(IoError),
    Polars(PolarsError),
    Json(serde_json::Error),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
    Source(String),
    BadPayload(String),
}

impl From<IoError> for GridError {
    fn from(err: IoError) -> Self {
        GridError::Io(err)
    }
}

impl From<PolarsError> for GridError {
    fn from(err: PolarsError) -> Self {
        GridError::Polars(err)
    }
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        GridError::Json(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Decimal,
    Date,
    DateTime,
    Select,
}

impl FieldType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(FieldType::Text),
            "number" => Some(FieldType::Number),
            "decimal" => Some(FieldType::Decimal),
            "date" => Some(FieldType::Date),
            "dateTime" => Some(FieldType::DateTime),
            "select" => Some(FieldType::Select),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Decimal => "decimal",
            FieldType::Date => "date",
            FieldType::DateTime => "dateTime",
            FieldType::Select => "select",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Where filter/sort/page transformations run. Under `Server` the engine only
/// tracks state and asks the data source for a new window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SideAction {
    #[default]
    Client,
    Server,
}

impl SideAction {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "client" => Some(SideAction::Client),
            "server" => Some(SideAction::Server),
            _ => None,
        }
    }
}

/// Filter layout of the grid: one search box over everything (`Global`),
/// one input per column (`PerColumn`), or one shared input plus a picker
/// choosing the participating fields (single or multiple choice).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterKind {
    #[default]
    Global,
    PerColumn,
    SharedField,
    SharedFields,
}

impl FilterKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "single" => Some(FilterKind::Global),
            "column" => Some(FilterKind::PerColumn),
            "singleColumn" => Some(FilterKind::SharedField),
            "singleColumnMultiple" => Some(FilterKind::SharedFields),
            _ => None,
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, FilterKind::SharedField | FilterKind::SharedFields)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectMode {
    Single,
    #[default]
    Multiple,
}

impl SelectMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "single" => Some(SelectMode::Single),
            "multiple" => Some(SelectMode::Multiple),
            _ => None,
        }
    }
}

/// Tri-state of a "select all" control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectAllState {
    Unchecked,
    Indeterminate,
    Checked,
}

/// The kind of input control a field asks for, carried in postback payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Search,
    Number,
    Date,
    DateTimeLocal,
}

impl InputKind {
    pub fn for_field(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Number | FieldType::Decimal => InputKind::Number,
            FieldType::Date => InputKind::Date,
            FieldType::DateTime => InputKind::DateTimeLocal,
            FieldType::Text | FieldType::Select => InputKind::Search,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Search => "search",
            InputKind::Number => "number",
            InputKind::Date => "date",
            InputKind::DateTimeLocal => "datetime-local",
        }
    }
}

/// Parse an enum-valued configuration string, falling back to a default on
/// anything invalid. Invalid values never error, they are corrected and
/// logged.
pub fn validate_enum<T>(name: &str, raw: Option<&str>, parse: fn(&str) -> Option<T>, default: T) -> T {
    match raw {
        None => default,
        Some(value) => match parse(value) {
            Some(parsed) => parsed,
            None => {
                warn!("Invalid value \"{value}\" for {name}, falling back to default");
                default
            }
        },
    }
}

/// Domain events emitted by the grid controller, delivered synchronously
/// with the operation that triggered them.
#[derive(Debug, Clone)]
pub enum GridEvent {
    Init,
    FilterChange { terms: Vec<(String, String)> },
    SortChange { column: String, direction: SortDirection },
    PageChange { page: usize },
    PageSizeChange { page_size: PageSize },
    SelectedChange { rows: Vec<Row> },
    SelectedAllChange { checked: bool, rows: Vec<Row> },
    BeforeUpdate { row: Row },
    BeforeDelete { row: Row },
    AfterUpdate { before: Row, after: Row },
}

/// Events emitted by the filter-field widget.
#[derive(Debug, Clone)]
pub enum FilterFieldEvent {
    FilterChange { fields: Vec<String>, value: String },
    SelectedChange { fields: Vec<String> },
}

/// Messages the TUI controller maps key events onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    FirstPage,
    PrevPage,
    NextPage,
    LastPage,
    SortColumn,
    HideColumn,
    ToggleSelect,
    SelectAll,
    EnterFilter,
    ExportCsv,
    CopyRow,
    RawKey(ratatui::crossterm::event::KeyEvent),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_enum_corrects_invalid_values() {
        let kind = validate_enum("filterType", Some("bogus"), FilterKind::parse, FilterKind::Global);
        assert_eq!(kind, FilterKind::Global);

        let kind = validate_enum("filterType", Some("singleColumn"), FilterKind::parse, FilterKind::Global);
        assert_eq!(kind, FilterKind::SharedField);

        let kind = validate_enum("filterType", None, FilterKind::parse, FilterKind::PerColumn);
        assert_eq!(kind, FilterKind::PerColumn);
    }

    #[test]
    fn sort_direction_toggles() {
        assert_eq!(SortDirection::Asc.toggled(), SortDirection::Desc);
        assert_eq!(SortDirection::Desc.toggled(), SortDirection::Asc);
    }

    #[test]
    fn input_kind_follows_field_type() {
        assert_eq!(InputKind::for_field(FieldType::Decimal), InputKind::Number);
        assert_eq!(InputKind::for_field(FieldType::DateTime), InputKind::DateTimeLocal);
        assert_eq!(InputKind::for_field(FieldType::Select), InputKind::Search);
    }
}
