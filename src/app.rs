use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use serde_json::Value;
use tracing::warn;

use vgrid::loader::{LoadRequest, LoadResponse};
use vgrid::measure::RenderedRows;
use vgrid::{Grid, GridEvent, Measurement, PageEvent, TerminalMeasure, row::value_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Normal,
    /// Typing into the filter box; every keystroke feeds the grid's debouncer
    Filter,
}

/// Geometry of the last frame, written by the UI layer for hit testing and measurement.
#[derive(Debug, Default)]
pub struct FrameLayout {
    /// Screen row of the header line
    pub header_y: u16,
    /// (x, width) of each painted header cell
    pub header_cells: Vec<(u16, u16)>,
    /// First screen row of the body and how many rows fit
    pub body_y: u16,
    pub body_rows: u16,
    pub body_width: u16,
    /// Full text of every painted cell, row by row
    pub rendered: RenderedRows,
    /// Displayed-slice position of the first painted row
    pub first_row: usize,
}

impl FrameLayout {
    pub fn header_cell_at(&self, x: u16) -> Option<(usize, u16, u16)> {
        self.header_cells
            .iter()
            .enumerate()
            .find(|(_, (cx, w))| x >= *cx && x < cx + w)
            .map(|(i, (cx, w))| (i, *cx, *w))
    }

    pub fn rendered_widths(&self) -> Vec<f32> {
        self.header_cells.iter().map(|(_, w)| f32::from(*w)).collect()
    }
}

pub struct App {
    pub should_quit: bool,

    // UI state
    pub mode: AppMode,
    pub status: String,
    pub source: Option<PathBuf>,

    pub grid: Grid,

    // Cell selection; row is a position in the displayed slice
    pub sel_row: usize,
    pub sel_col: usize,
    /// Id of the selected row, to follow it across re-sorts and filters
    pub selected_id: Option<Value>,

    pub filter_input: String,

    pub show_help: bool,
    pub show_cell_viewer: bool,

    pub layout: FrameLayout,
    /// Measurement waiting for the next paint; the flag forces overwrite
    pub measure_request: Option<bool>,
    /// Header column under the last left-button press
    pub pressed_header: Option<usize>,

    // Channels
    pub req_tx: Sender<LoadRequest>,
    pub resp_rx: Receiver<LoadResponse>,
}

impl App {
    pub fn new(grid: Grid, req_tx: Sender<LoadRequest>, resp_rx: Receiver<LoadResponse>) -> Self {
        Self {
            should_quit: false,
            mode: AppMode::Normal,
            status: "Press ? for help".into(),
            source: None,
            grid,
            sel_row: 0,
            sel_col: 0,
            selected_id: None,
            filter_input: String::new(),
            show_help: false,
            show_cell_viewer: false,
            layout: FrameLayout::default(),
            measure_request: None,
            pressed_header: None,
            req_tx,
            resp_rx,
        }
    }

    pub fn open(&mut self, path: PathBuf) {
        self.status = format!("Loading {}...", path.display());
        self.source = Some(path.clone());
        let _ = self.req_tx.send(LoadRequest::Open(path));
    }

    pub fn reload(&mut self) {
        if let Some(path) = self.source.clone() {
            self.open(path);
        }
    }

    pub fn handle_load_response(&mut self, resp: LoadResponse, now: Instant) {
        match resp {
            LoadResponse::Dataset {
                path,
                rows,
                columns,
            } => {
                if let Some(defs) = columns
                    && let Err(e) = self.grid.set_column_defs(&defs)
                {
                    warn!(error = %e, "column definitions rejected");
                    self.status = format!("Columns ignored: {e}");
                }
                let count = rows.len();
                self.grid.set_rows(Arc::new(rows), now);
                self.sel_row = 0;
                self.sel_col = self.sel_col.min(self.grid.columns().len().saturating_sub(1));
                self.grid.scroll_to_row(0, now);
                self.remember_selection();
                self.status = format!("Loaded {} rows from {}", count, path.display());
            }
            LoadResponse::Error(msg) => {
                self.status = format!("Error: {msg}");
            }
        }
    }

    pub fn handle_grid_events(&mut self, events: Vec<GridEvent>) {
        for event in events {
            match event {
                GridEvent::Pending => {}
                GridEvent::ActiveViewChanged { len } => {
                    self.follow_selection();
                    self.status = match self.grid.store().filter_text() {
                        "" => format!("{len} rows"),
                        f => format!("{len} rows match \"{f}\""),
                    };
                }
                GridEvent::DisplayedChanged { .. } => self.follow_selection(),
                GridEvent::MeasureDue { force } => {
                    let prev = self.measure_request.unwrap_or(false);
                    self.measure_request = Some(prev || force);
                }
            }
        }
    }

    /// Work that needs the frame just painted. Returns true when another
    /// paint is needed.
    pub fn after_draw(&mut self, now: Instant) -> bool {
        self.grid.on_viewport_resize(
            f32::from(self.layout.body_width),
            usize::from(self.layout.body_rows),
            now,
        );
        let Some(force) = self.measure_request.take() else {
            return false;
        };
        matches!(
            self.grid
                .measure_columns(&self.layout.rendered, &TerminalMeasure, force, now),
            Measurement::Measured(_)
        )
    }

    // ===== Filter input =====

    pub fn begin_filter_input(&mut self) {
        if !self.grid.store().filter_enabled() {
            self.status = "Filtering is disabled".into();
            return;
        }
        self.mode = AppMode::Filter;
    }

    pub fn filter_push(&mut self, c: char, now: Instant) {
        self.filter_input.push(c);
        self.grid.on_filter_input(&self.filter_input, now);
    }

    pub fn filter_backspace(&mut self, now: Instant) {
        self.filter_input.pop();
        self.grid.on_filter_input(&self.filter_input, now);
    }

    pub fn end_filter_input(&mut self) {
        self.mode = AppMode::Normal;
    }

    pub fn clear_filter(&mut self, now: Instant) {
        self.filter_input.clear();
        self.grid.on_filter_input("", now);
        self.mode = AppMode::Normal;
    }

    // ===== Sorting and widths =====

    pub fn sort_selected_column(&mut self, now: Instant) {
        if self.grid.cycle_sort(self.sel_col, now) {
            self.status = "Sorting...".into();
        }
    }

    pub fn widen_selected_column(&mut self, delta: f32) {
        if !self.grid.resize_pair(self.sel_col, delta) {
            self.status = "Column cannot be resized here".into();
        }
    }

    pub fn request_autosize(&mut self, now: Instant) {
        self.grid.request_autosize(now);
        self.status = "Autosizing columns...".into();
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn toggle_cell_viewer(&mut self) {
        self.show_cell_viewer = !self.show_cell_viewer;
    }

    // ===== Navigation =====

    pub fn move_cell_left(&mut self) {
        self.sel_col = self.sel_col.saturating_sub(1);
    }

    pub fn move_cell_right(&mut self) {
        let last = self.grid.columns().len().saturating_sub(1);
        self.sel_col = (self.sel_col + 1).min(last);
    }

    pub fn move_cell_up(&mut self, now: Instant) {
        self.select_row(self.sel_row.saturating_sub(1), now);
    }

    pub fn move_cell_down(&mut self, now: Instant) {
        self.select_row(self.sel_row + 1, now);
    }

    pub fn next_page(&mut self, now: Instant) {
        self.jump_to_page(self.grid.current_page() + 1, now);
    }

    pub fn prev_page(&mut self, now: Instant) {
        self.jump_to_page(self.grid.current_page().saturating_sub(1), now);
    }

    fn jump_to_page(&mut self, page_index: usize, now: Instant) {
        let page_size = self.grid.config().page_size.max(1);
        let page_index = page_index.min(self.grid.page_count().saturating_sub(1));
        self.grid.change_page(
            PageEvent {
                page_index,
                page_size,
            },
            now,
        );
        self.sel_row = (page_index * page_size).min(self.grid.displayed_len().saturating_sub(1));
        self.remember_selection();
    }

    pub fn scroll(&mut self, delta: isize, now: Instant) {
        self.grid.scroll_by_rows(delta, now);
    }

    /// Moves the cursor to `row`, scrolling it into view.
    pub fn select_row(&mut self, row: usize, now: Instant) {
        let len = self.grid.displayed_len();
        if len == 0 {
            return;
        }
        self.sel_row = row.min(len - 1);
        self.remember_selection();
        self.scroll_into_view(now);
    }

    fn scroll_into_view(&mut self, now: Instant) {
        let range = self.grid.rendered_range();
        let visible = self.grid.viewport().visible_rows().max(1);
        if self.sel_row < range.start {
            self.grid.scroll_to_row(self.sel_row, now);
        } else if self.sel_row >= range.start + visible {
            self.grid.scroll_to_row(self.sel_row + 1 - visible, now);
        }
    }

    fn remember_selection(&mut self) {
        self.selected_id = self
            .grid
            .displayed_row(self.sel_row)
            .and_then(|r| self.grid.row_id(r))
            .cloned();
    }

    fn follow_selection(&mut self) {
        let len = self.grid.displayed_len();
        if let Some(pos) = self.selected_id.as_ref().and_then(|id| self.grid.position_of(id)) {
            self.sel_row = pos;
        } else {
            self.sel_row = self.sel_row.min(len.saturating_sub(1));
            self.remember_selection();
        }
    }

    pub fn current_cell_text(&self) -> Option<String> {
        let row = self.grid.displayed_row(self.sel_row)?;
        let col = self.grid.columns().get(self.sel_col)?;
        Some(row.get(&col.field).map(value_text).unwrap_or_default())
    }

    // ===== Mouse =====

    pub fn on_mouse(&mut self, ev: MouseEvent, now: Instant) {
        let on_header = ev.row == self.layout.header_y;
        match ev.kind {
            MouseEventKind::ScrollDown => self.scroll(3, now),
            MouseEventKind::ScrollUp => self.scroll(-3, now),
            MouseEventKind::Moved if on_header => {
                if let Some((col, x, w)) = self.layout.header_cell_at(ev.column) {
                    self.grid
                        .header_hover(col, f32::from(ev.column - x) + 0.5, f32::from(w));
                }
            }
            MouseEventKind::Down(MouseButton::Left) if on_header => {
                self.pressed_header = None;
                if let Some((col, x, w)) = self.layout.header_cell_at(ev.column) {
                    self.grid
                        .header_hover(col, f32::from(ev.column - x) + 0.5, f32::from(w));
                    let widths = self.layout.rendered_widths();
                    if !self
                        .grid
                        .header_pointer_down(col, f32::from(ev.column), &widths)
                    {
                        self.pressed_header = Some(col);
                    }
                }
            }
            MouseEventKind::Down(MouseButton::Left) => {
                self.pressed_header = None;
                if ev.row >= self.layout.body_y
                    && ev.row < self.layout.body_y + self.layout.body_rows
                {
                    let row = self.layout.first_row + usize::from(ev.row - self.layout.body_y);
                    if let Some((col, _, _)) = self.layout.header_cell_at(ev.column) {
                        self.sel_col = col;
                    }
                    self.select_row(row, now);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                self.grid.pointer_move(f32::from(ev.column));
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let resized = self.grid.pointer_up(now);
                let pressed = self.pressed_header.take();
                let released_on = on_header
                    .then(|| self.layout.header_cell_at(ev.column))
                    .flatten()
                    .map(|(col, _, _)| col);
                // The release of a resize drag still counts as a click on the
                // header under it; the grid swallows that one.
                if let Some(col) = released_on
                    && (resized || pressed == Some(col))
                    && self.grid.on_header_click(col, now)
                {
                    self.status = "Sorting...".into();
                }
                self.grid.end_pointer_gesture();
            }
            _ => {}
        }
    }
}
