use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arboard::Clipboard;
use clap::Parser;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent};
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use tgrid::config::{GridConfig, GridOptions};
use tgrid::controller::GridController;
use tgrid::domain::{GridError, Message, SelectAllState};
use tgrid::export::row_as_csv;
use tgrid::inputter::Inputter;
use tgrid::loader::load_rows;
use tgrid::paginate::PageSize;
use tgrid::source::MemorySource;
use tgrid::ui::{self, UiState};

#[derive(Debug, Parser)]
#[command(name = "tgrid", about = "A tui data grid with filtering, sorting and pagination")]
struct Cli {
    /// Data file to load (csv, parquet, arrow/ipc or json)
    path: String,

    /// Rows per page ("All" disables paging)
    #[arg(long, default_value = "10")]
    page_size: String,

    /// Filter layout: single, column, singleColumn or singleColumnMultiple
    #[arg(long)]
    filter_type: Option<String>,

    /// Field carrying the row identity
    #[arg(long, default_value = "id")]
    id_field: String,

    /// Allow only one selected row at a time
    #[arg(long)]
    single_select: bool,

    /// Base name of the CSV export file
    #[arg(long, default_value = "export")]
    export_name: String,

    /// CSV export delimiter
    #[arg(long, default_value = ";")]
    delimiter: char,

    /// Write logs to this file (honors RUST_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(cli: &Cli) -> Result<(), GridError> {
    let Some(path) = &cli.log_file else {
        return Ok(());
    };
    let file = std::fs::File::create(path)?;
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(Arc::new(file)).with_ansi(false))
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Err(e) => {
            ratatui::restore();
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
        Ok(_) => {
            ratatui::restore();
            ExitCode::SUCCESS
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    FilterPrompt,
    Quitting,
}

struct App {
    controller: GridController,
    ui: UiState,
    input: Inputter,
    mode: Mode,
    clipboard: Option<Clipboard>,
    page_list: Vec<PageSize>,
}

impl App {
    fn new(controller: GridController) -> Self {
        let page_list = controller.model().config.page_list.clone();
        App {
            controller,
            ui: UiState::default(),
            input: Inputter::default(),
            mode: Mode::Browse,
            clipboard: Clipboard::new().ok(),
            page_list,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Option<Message> {
        if self.mode == Mode::FilterPrompt {
            return Some(Message::RawKey(key));
        }
        match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Up | KeyCode::Char('k') => Some(Message::MoveUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Message::MoveDown),
            KeyCode::Left => Some(Message::MoveLeft),
            KeyCode::Right => Some(Message::MoveRight),
            KeyCode::Char('s') => Some(Message::SortColumn),
            KeyCode::Char('h') => Some(Message::HideColumn),
            KeyCode::Char(' ') => Some(Message::ToggleSelect),
            KeyCode::Char('a') => Some(Message::SelectAll),
            KeyCode::Char('n') => Some(Message::NextPage),
            KeyCode::Char('p') => Some(Message::PrevPage),
            KeyCode::Char('g') => Some(Message::FirstPage),
            KeyCode::Char('G') => Some(Message::LastPage),
            KeyCode::Char('/') => Some(Message::EnterFilter),
            KeyCode::Char('e') => Some(Message::ExportCsv),
            KeyCode::Char('y') => Some(Message::CopyRow),
            _ => None,
        }
    }

    fn update(&mut self, message: Message, now: Instant) {
        match message {
            Message::Quit => self.mode = Mode::Quitting,
            Message::MoveUp => self.ui.cursor_row = self.ui.cursor_row.saturating_sub(1),
            Message::MoveDown => {
                let rows = self.controller.view().rows.len();
                if rows > 0 && self.ui.cursor_row < rows - 1 {
                    self.ui.cursor_row += 1;
                }
            }
            Message::MoveLeft => self.ui.cursor_col = self.ui.cursor_col.saturating_sub(1),
            Message::MoveRight => {
                let columns = self.controller.view().headers.len();
                if columns > 0 && self.ui.cursor_col < columns - 1 {
                    self.ui.cursor_col += 1;
                }
            }
            Message::SortColumn => {
                if let Some(name) = self.cursor_column() {
                    self.controller.sort_by(&name);
                }
            }
            Message::HideColumn => {
                if let Some(name) = self.cursor_column() {
                    if self.controller.toggle_column(&name) {
                        let columns = self.controller.view().headers.len();
                        self.ui.cursor_col = self.ui.cursor_col.min(columns.saturating_sub(1));
                    } else {
                        self.ui.status_message = "The last visible column stays".to_string();
                    }
                }
            }
            Message::ToggleSelect => {
                let id = self
                    .controller
                    .view()
                    .rows
                    .get(self.ui.cursor_row)
                    .and_then(|r| r.id.clone());
                match id {
                    Some(id) => self.controller.toggle_row(&id),
                    None => self.ui.status_message = "Row has no identity to select".to_string(),
                }
            }
            Message::SelectAll => {
                let checked = self.controller.view().select_all != SelectAllState::Checked;
                self.controller.select_all_rows(checked);
            }
            Message::FirstPage => self.change_page(|c| c.first_page()),
            Message::PrevPage => self.change_page(|c| c.prev_page()),
            Message::NextPage => self.change_page(|c| c.next_page()),
            Message::LastPage => self.change_page(|c| c.last_page()),
            Message::EnterFilter => {
                self.mode = Mode::FilterPrompt;
                self.input.clear();
                // Pre-fill with the active term so editing continues it.
                let (label, current) = match self.cursor_filter_field() {
                    Some(field) => {
                        let term = self
                            .controller
                            .model()
                            .filter
                            .terms
                            .get(&field)
                            .unwrap_or_default()
                            .to_string();
                        (format!("filter {field}"), term)
                    }
                    None => ("filter".to_string(), self.controller.model().filter.query.clone()),
                };
                self.input.set_text(&current);
                self.ui.prompt_label = label;
                self.ui.prompt = Some(self.input.snapshot());
            }
            Message::ExportCsv => self.export_csv(),
            Message::CopyRow => self.copy_row(),
            Message::RawKey(key) => self.read_prompt(key, now),
        }
    }

    // The column the cursor is on, by field name.
    fn cursor_column(&self) -> Option<String> {
        self.controller
            .view()
            .headers
            .get(self.ui.cursor_col)
            .map(|h| h.name.clone())
    }

    // Per-column filter mode binds the prompt to the cursor column,
    // everything else feeds the shared/global query.
    fn cursor_filter_field(&self) -> Option<String> {
        use tgrid::domain::FilterKind;
        match self.controller.model().filter.kind {
            FilterKind::PerColumn => self.cursor_column(),
            _ => None,
        }
    }

    fn change_page(&mut self, go: impl FnOnce(&mut GridController)) {
        go(&mut self.controller);
        self.ui.cursor_row = 0;
    }

    fn read_prompt(&mut self, key: KeyEvent, now: Instant) {
        let result = self.input.read(key);
        if result.changed {
            let field = self.cursor_filter_field();
            self.controller.filter_input(field.as_deref(), &result.text, now);
        }
        if result.finished {
            if result.cancelled {
                self.controller.cancel_filter_input();
            } else {
                // Commit immediately instead of waiting out the quiet window.
                self.controller.cancel_filter_input();
                let field = self.cursor_filter_field();
                self.controller.apply_filter(field.as_deref(), &result.text);
            }
            self.mode = Mode::Browse;
            self.ui.prompt = None;
            self.ui.cursor_row = 0;
            self.input.clear();
        } else {
            self.ui.prompt = Some(result);
        }
    }

    fn export_csv(&mut self) {
        let csv = self.controller.export_csv();
        let file_name = format!("{}.csv", self.controller.model().config.export.file_name);
        match std::fs::write(&file_name, csv) {
            Ok(_) => self.ui.status_message = format!("Exported to {file_name}"),
            Err(e) => self.ui.status_message = format!("Export failed: {e}"),
        }
    }

    fn copy_row(&mut self) {
        let model = self.controller.model();
        let Some(&idx) = model.page_indices().get(self.ui.cursor_row) else {
            return;
        };
        let delimiter = model.config.export.delimiter;
        let line = row_as_csv(model.catalog(), &model.rows()[idx], delimiter);
        match self.clipboard.as_mut() {
            Some(clipboard) => match clipboard.set_text(line) {
                Ok(_) => self.ui.status_message = "Row copied".to_string(),
                Err(e) => self.ui.status_message = format!("Clipboard error: {e}"),
            },
            None => self.ui.status_message = "No clipboard available".to_string(),
        }
    }

    fn cycle_page_size(&mut self, step: i64) {
        if self.page_list.is_empty() {
            return;
        }
        let current = self.controller.model().pagination.page_size;
        let pos = self.page_list.iter().position(|s| *s == current).unwrap_or(0) as i64;
        let next = (pos + step).rem_euclid(self.page_list.len() as i64) as usize;
        self.controller.set_page_size(self.page_list[next]);
        self.ui.cursor_row = 0;
    }
}

fn run() -> Result<(), GridError> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let path = shellexpand::full(&cli.path)
        .map_err(|e| GridError::LoadingFailed(e.to_string()))?
        .to_string();
    let rows = load_rows(PathBuf::from(path))?;
    info!("Starting tgrid with {} rows", rows.len());

    let options = GridOptions::default()
        .page_size(cli.page_size.clone())
        .selectable(true)
        .multiple_select(!cli.single_select)
        .id_field(cli.id_field.clone());
    let options = match &cli.filter_type {
        Some(kind) => options.filter_type(kind.clone()),
        None => options,
    };
    let mut options = options;
    options.export.file_name = cli.export_name.clone();
    options.export.delimiter = cli.delimiter;

    let config = GridConfig::from_options(options);
    let mut controller = GridController::new(config, Box::new(MemorySource::new(rows)));
    controller.init();

    let mut app = App::new(controller);
    let mut terminal = ratatui::init();

    while app.mode != Mode::Quitting {
        let view = app.controller.view();
        terminal.draw(|frame| ui::draw(frame, &view, &app.ui))?;

        // Deliver debounced filter edits whose quiet window elapsed.
        app.controller.poll(Instant::now());

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == event::KeyEventKind::Press
        {
            match key.code {
                KeyCode::Char('+') if app.mode == Mode::Browse => app.cycle_page_size(1),
                KeyCode::Char('-') if app.mode == Mode::Browse => app.cycle_page_size(-1),
                _ => {
                    if let Some(message) = app.handle_key(key) {
                        app.update(message, Instant::now());
                    }
                }
            }
        }
    }

    Ok(())
}
