use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style, Stylize};
use ratatui::text::Line;
use ratatui::widgets::{Block, Cell, Paragraph, Row as TableRow, Table};

use crate::domain::{SelectAllState, SortDirection};
use crate::inputter::InputResult;
use crate::model::GridView;

pub const TOOLBAR_HEIGHT: u16 = 1;
pub const FOOTER_HEIGHT: u16 = 1;
pub const STATUS_HEIGHT: u16 = 1;

/// What the TUI needs beyond the grid snapshot: cursor position, the active
/// text prompt and the status line.
#[derive(Debug, Default)]
pub struct UiState {
    pub cursor_row: usize,
    pub cursor_col: usize,
    pub prompt: Option<InputResult>,
    pub prompt_label: String,
    pub status_message: String,
}

fn sort_marker(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Asc => " ^",
        SortDirection::Desc => " v",
    }
}

fn select_all_marker(state: SelectAllState) -> &'static str {
    match state {
        SelectAllState::Checked => "[x]",
        SelectAllState::Indeterminate => "[-]",
        SelectAllState::Unchecked => "[ ]",
    }
}

pub fn draw(frame: &mut Frame, view: &GridView, ui: &UiState) {
    let [toolbar_area, table_area, footer_area, status_area] = Layout::vertical([
        Constraint::Length(TOOLBAR_HEIGHT),
        Constraint::Min(3),
        Constraint::Length(FOOTER_HEIGHT),
        Constraint::Length(STATUS_HEIGHT),
    ])
    .areas(frame.area());

    draw_toolbar(frame, toolbar_area, view, ui);
    draw_table(frame, table_area, view, ui);
    draw_footer(frame, footer_area, view);
    draw_status(frame, status_area, view, ui);
}

fn draw_toolbar(frame: &mut Frame, area: Rect, view: &GridView, ui: &UiState) {
    let line = match &ui.prompt {
        Some(input) => Line::from(vec![
            format!("{}: ", ui.prompt_label).bold(),
            input.text.clone().into(),
            "_".rapid_blink(),
        ]),
        None => {
            let column = view
                .headers
                .get(ui.cursor_col)
                .map(|h| h.text.as_str())
                .unwrap_or("-");
            Line::from(vec![
                format!("{} ", select_all_marker(view.select_all)).into(),
                format!("column: {column}  ").into(),
                "/ filter  s sort  h hide  space select  a all  e export".dim(),
            ])
        }
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_table(frame: &mut Frame, area: Rect, view: &GridView, ui: &UiState) {
    if let Some(placeholder) = &view.placeholder {
        let text = if view.loading { "Loading..." } else { placeholder.as_str() };
        frame.render_widget(
            Paragraph::new(text).centered().block(Block::bordered()),
            area,
        );
        return;
    }

    let header = TableRow::new(
        std::iter::once(Cell::from("sel")).chain(view.headers.iter().enumerate().map(
            |(idx, h)| {
                let marker = h.sort_marker.map(sort_marker).unwrap_or("");
                let text = format!("{}{marker}", h.text);
                if idx == ui.cursor_col {
                    Cell::from(text).style(Style::new().add_modifier(Modifier::UNDERLINED))
                } else {
                    Cell::from(text)
                }
            },
        )),
    )
    .style(Style::new().bold());

    let rows = view.rows.iter().enumerate().map(|(idx, row)| {
        let marker = if row.selected { "[x]" } else { "[ ]" };
        let cells = std::iter::once(Cell::from(marker))
            .chain(row.cells.iter().map(|c| Cell::from(c.clone())));
        let mut table_row = TableRow::new(cells);
        if idx == ui.cursor_row {
            table_row = table_row.style(Style::new().reversed());
        }
        table_row
    });

    let mut widths = vec![Constraint::Length(3)];
    widths.extend(view.headers.iter().map(|_| Constraint::Fill(1)));

    let table = Table::new(rows, widths).header(header).block(Block::bordered());
    frame.render_widget(table, area);
}

fn draw_footer(frame: &mut Frame, area: Rect, view: &GridView) {
    let line = Line::from(vec![
        format!("page {}/{}  ", view.current_page, view.last_page).into(),
        format!("rows {}  ", view.total_rows).into(),
        format!("size {}  ", view.page_size.label()).into(),
        "n/p page  g/G first/last  +/- size".dim(),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_status(frame: &mut Frame, area: Rect, view: &GridView, ui: &UiState) {
    let text = if view.loading {
        "Loading...".to_string()
    } else {
        ui.status_message.clone()
    };
    frame.render_widget(Paragraph::new(text).dim(), area);
}
