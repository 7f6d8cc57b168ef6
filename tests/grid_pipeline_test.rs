//! End-to-end checks of the grid pipeline and its interaction state
//! machine, driving the controller the way the TUI does.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use tgrid::config::{FilterFieldConfig, FilterFieldOptions, GridConfig, GridOptions};
use tgrid::controller::GridController;
use tgrid::domain::{GridError, GridEvent, SelectAllState, SortDirection};
use tgrid::filter_field::FilterField;
use tgrid::paginate::PageSize;
use tgrid::rows::Row;
use tgrid::source::{DataPage, DataSource, MemorySource, RemoteEndpoints, RemoteSource, SourceQuery};

fn row(pairs: &[(&str, serde_json::Value)]) -> Row {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn dataset() -> Vec<Row> {
    vec![
        row(&[("id", json!(1)), ("name", json!("b")), ("age", json!(40))]),
        row(&[("id", json!(2)), ("name", json!("a")), ("age", json!(31))]),
        row(&[("id", json!(3)), ("name", json!("a")), ("age", json!(25))]),
        row(&[("id", json!(4)), ("name", json!("José")), ("age", json!(28))]),
        row(&[("id", json!(5)), ("name", json!("zoe")), ("age", json!(52))]),
    ]
}

fn controller_with(rows: Vec<Row>, options: GridOptions) -> GridController {
    let config = GridConfig::from_options(options);
    let mut controller = GridController::new(config, Box::new(MemorySource::new(rows)));
    controller.init();
    controller
}

fn first_column(controller: &GridController, column: usize) -> Vec<String> {
    controller.view().rows.iter().map(|r| r.cells[column].clone()).collect()
}

#[test]
fn sort_scenario_ties_stay_stable_and_toggle_reverses() {
    // Scenario A: sort by name ascending puts both "a" rows first, in their
    // original relative order; toggling puts "b" first.
    let rows = dataset().into_iter().take(3).collect();
    let mut controller = controller_with(rows, GridOptions::default().page_size("All"));

    controller.sort_by("name");
    assert_eq!(first_column(&controller, 0), ["2", "3", "1"]);

    controller.sort_by("name");
    assert_eq!(controller.model().sort.direction, SortDirection::Desc);
    assert_eq!(first_column(&controller, 0)[0], "1");
}

#[test]
fn pagination_scenario_partial_last_page() {
    // Scenario B: pageSize=2, totalRows=5 -> lastPage=3, page 3 holds one row.
    let mut controller = controller_with(dataset(), GridOptions::default().page_size("2"));
    assert_eq!(controller.view().last_page, 3);

    controller.go_to_page(3);
    assert_eq!(controller.view().rows.len(), 1);

    // The union of all pages covers the set exactly once.
    let mut seen = Vec::new();
    for page in 1..=3 {
        controller.go_to_page(page);
        seen.extend(first_column(&controller, 0));
    }
    seen.sort();
    assert_eq!(seen, ["1", "2", "3", "4", "5"]);
}

#[test]
fn filter_scenario_diacritics_fold() {
    // Scenario D: term "José" matches value "jose" and the other way round.
    let mut controller = controller_with(dataset(), GridOptions::default());
    controller.apply_filter(None, "jose");
    assert_eq!(first_column(&controller, 0), ["4"]);

    controller.apply_filter(None, "");
    assert_eq!(controller.view().total_rows, 5);
}

#[test]
fn empty_dataset_scenario_renders_placeholder() {
    // Scenario E: totalRows=0 -> lastPage=1, currentPage clamped, placeholder.
    let controller = controller_with(Vec::new(), GridOptions::default());
    let view = controller.view();
    assert_eq!(view.last_page, 1);
    assert_eq!(view.current_page, 1);
    assert!(view.placeholder.is_some());
    assert_eq!(view.colspan, 1);
}

#[test]
fn field_selection_scenario_bounded_select_all() {
    // Scenario C: min 1 / max 2 over [A, B, C] selects the first two.
    let options = FilterFieldOptions::default()
        .min_selected(1usize)
        .max_selected(2usize)
        .fields(vec![
            tgrid::fields::Field::new("A"),
            tgrid::fields::Field::new("B"),
            tgrid::fields::Field::new("C"),
        ])
        .auto_generate_fields(false);
    let mut widget = FilterField::new(FilterFieldConfig::from_options(options), None);

    widget.select_all(true);
    assert_eq!(widget.selected_fields(), ["A", "B"]);
    assert_eq!(widget.select_all_state(), SelectAllState::Indeterminate);

    widget.select_all(false);
    assert_eq!(widget.selected_fields(), ["A"]);
}

#[test]
fn row_selection_tristate_follows_filtered_universe() {
    let mut controller =
        controller_with(dataset(), GridOptions::default().selectable(true).page_size("2"));

    controller.toggle_row("1");
    assert_eq!(controller.view().select_all, SelectAllState::Indeterminate);

    controller.select_all_rows(true);
    assert_eq!(controller.view().select_all, SelectAllState::Checked);
    assert_eq!(controller.selected_rows().len(), 5);

    controller.select_all_rows(false);
    assert_eq!(controller.view().select_all, SelectAllState::Unchecked);
}

#[test]
fn events_follow_the_transition_table() {
    let events: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);

    let config = GridConfig::from_options(GridOptions::default().selectable(true).page_size("2"));
    let mut controller = GridController::new(config, Box::new(MemorySource::new(dataset())));
    controller.on(Box::new(move |event: &GridEvent| {
        let name = match event {
            GridEvent::Init => "init",
            GridEvent::FilterChange { .. } => "filter",
            GridEvent::SortChange { .. } => "sort",
            GridEvent::PageChange { .. } => "page",
            GridEvent::PageSizeChange { .. } => "pageSize",
            GridEvent::SelectedChange { .. } => "selected",
            GridEvent::SelectedAllChange { .. } => "selectedAll",
            GridEvent::BeforeUpdate { .. } => "beforeUpdate",
            GridEvent::BeforeDelete { .. } => "beforeDelete",
            GridEvent::AfterUpdate { .. } => "afterUpdate",
        };
        sink.borrow_mut().push(name.to_string());
    }));

    controller.init();
    controller.apply_filter(None, "a");
    controller.sort_by("name");
    controller.go_to_page(1);
    controller.set_page_size(PageSize::All);
    controller.toggle_row("2");
    controller.select_all_rows(true);

    let log = events.borrow();
    assert_eq!(
        log.as_slice(),
        ["init", "filter", "sort", "page", "pageSize", "selected", "selected", "selectedAll"]
    );
}

// A remote source with scripted responses, driven through the controller's
// ticketed refresh cycle.
struct ScriptedSource {
    pages: Vec<Result<DataPage, GridError>>,
    queries: Rc<RefCell<Vec<SourceQuery>>>,
}

impl DataSource for ScriptedSource {
    fn fetch(&mut self, query: &SourceQuery) -> Result<DataPage, GridError> {
        self.queries.borrow_mut().push(query.clone());
        if self.pages.is_empty() {
            return Err(GridError::Source("script exhausted".into()));
        }
        self.pages.remove(0)
    }

    fn is_remote(&self) -> bool {
        true
    }
}

#[test]
fn server_mode_delegates_and_builds_queries() {
    let queries = Rc::new(RefCell::new(Vec::new()));
    let source = ScriptedSource {
        pages: vec![
            Ok(DataPage { rows: dataset().into_iter().take(2).collect(), total_rows: 23 }),
            Ok(DataPage { rows: dataset().into_iter().skip(2).take(2).collect(), total_rows: 23 }),
        ],
        queries: Rc::clone(&queries),
    };

    let config = GridConfig::from_options(
        GridOptions::default().side_actions("server").page_size("2"),
    );
    let mut controller = GridController::new(config, Box::new(source));
    controller.init();

    assert_eq!(controller.view().total_rows, 23);
    assert_eq!(controller.view().last_page, 12);

    controller.go_to_page(2);
    let queries = queries.borrow();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[1].current_page, 2);
    assert_eq!(queries[1].page_size, 2);
}

#[test]
fn server_mode_failed_refetch_keeps_data() {
    let queries = Rc::new(RefCell::new(Vec::new()));
    let source = ScriptedSource {
        pages: vec![
            Ok(DataPage { rows: dataset(), total_rows: 5 }),
            Err(GridError::Source("network down".into())),
        ],
        queries: Rc::clone(&queries),
    };
    let config = GridConfig::from_options(
        GridOptions::default().side_actions("server").page_size("2"),
    );
    let mut controller = GridController::new(config, Box::new(source));
    controller.init();
    assert_eq!(controller.model().rows().len(), 5);

    controller.go_to_page(2);
    // The failed fetch left the previous window alone and cleared loading.
    assert_eq!(controller.model().rows().len(), 5);
    assert!(!controller.view().loading);
}

#[test]
fn remote_source_round_trips_the_wire_contract() {
    let seen = Rc::new(RefCell::new(String::new()));
    let sink = Rc::clone(&seen);
    let mut source = RemoteSource::new(
        RemoteEndpoints { url: "http://api/rows".into(), ..RemoteEndpoints::default() },
        Box::new(move |url| {
            *sink.borrow_mut() = url.to_string();
            Ok(r#"{"rows": [{"id": 1, "name": "x"}], "totalRows": 100}"#.to_string())
        }),
    );

    let mut query = SourceQuery {
        current_page: 3,
        page_size: 10,
        sort_column: "name".into(),
        sort_direction: SortDirection::Desc,
        ..SourceQuery::default()
    };
    query.set_terms(&[("name".into(), "jo".into()), ("city".into(), "ro".into())], ';');

    let page = source.fetch(&query).unwrap();
    assert_eq!(page.total_rows, 100);

    let url = seen.borrow();
    assert!(url.contains("currentPage=3"));
    assert!(url.contains("filterColumn=name;city"));
    assert!(url.contains("filterValue=jo;ro"));
    assert!(url.contains("sortDirection=desc"));
}
