//! A data-grid engine with a terminal front end: an ordered
//! filter -> sort -> paginate pipeline over opaque rows, plus the selection,
//! column-visibility and pagination state machines that stay consistent
//! across re-renders. The companion filter-field widget runs the same
//! bounded-selection state machine over the field catalog.

pub mod config;
pub mod controller;
pub mod debounce;
pub mod domain;
pub mod export;
pub mod fields;
pub mod filter;
pub mod filter_field;
pub mod format;
pub mod inputter;
pub mod loader;
pub mod model;
pub mod paginate;
pub mod postback;
pub mod rows;
pub mod selection;
pub mod sort;
pub mod source;
pub mod ui;

pub use config::{FilterFieldConfig, FilterFieldOptions, GridConfig, GridOptions};
pub use controller::{FetchTicket, GridController};
pub use domain::{
    FieldType, FilterFieldEvent, FilterKind, GridError, GridEvent, SelectAllState, SelectMode,
    SideAction, SortDirection,
};
pub use fields::{Field, FieldCatalog};
pub use filter_field::FilterField;
pub use model::{GridModel, GridStatus, GridView};
pub use paginate::{PageSize, PaginationState};
pub use rows::Row;
pub use source::{DataPage, DataSource, MemorySource, RemoteEndpoints, RemoteSource, SourceQuery};
