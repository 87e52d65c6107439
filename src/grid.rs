//! The grid component: inputs, event entry points and delayed work, wired
//! over the row store, the window data source and the column controllers.
//!
//! The host drives it with three kinds of calls: inputs (`set_rows`,
//! `set_column_defs`, `set_templates`), events (`on_filter_input`,
//! `on_header_click`, scrolling, pointer drags) and `tick(now)`, which runs
//! whatever delayed work is due and reports it as [`GridEvent`]s.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, info};

use crate::column::{ColumnDef, ColumnSet, TemplateSlot};
use crate::config::GridConfig;
use crate::error::GridResult;
use crate::measure::{RenderedCell, TextMeasure};
use crate::resize::{ColumnResizeController, Cursor};
use crate::row::Row;
use crate::schedule::{Debouncer, Timer, earliest};
use crate::store::{RowStore, SortDirection, SortState};
use crate::widths::{ColumnWidthEstimator, Measurement};
use crate::window::{PageEvent, Viewport, WindowDataSource};

/// Retry interval for a measurement that found nothing painted.
const MEASURE_RETRY: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    /// A recompute was scheduled; the busy indicator should show.
    Pending,
    ActiveViewChanged { len: usize },
    DisplayedChanged { len: usize },
    /// Widths should be measured once the current slice is painted.
    MeasureDue { force: bool },
}

#[derive(Debug)]
pub struct Grid {
    config: GridConfig,
    store: RowStore,
    window: WindowDataSource,
    viewport: Viewport,
    viewport_width: f32,
    estimator: ColumnWidthEstimator,
    resize: ColumnResizeController,
    templates: Vec<TemplateSlot>,
    filter_input: Debouncer<String>,
    filter_apply: Timer<String>,
    sort_apply: Timer<SortState>,
    measure: Timer<bool>,
}

impl Grid {
    pub fn new(config: GridConfig) -> GridResult<Self> {
        let timing = &config.timing;
        let mut store = RowStore::new(config.filterable, timing.min_boundary_matches);
        if let Some(defs) = &config.columns {
            store.set_column_defs(defs)?;
        }
        Ok(Self {
            window: WindowDataSource::new(
                config.windowing,
                config.page_size,
                timing.page_buffer,
                timing.page_load_delay(),
            ),
            viewport: Viewport::new(config.item_size, config.header_size),
            viewport_width: 0.0,
            estimator: ColumnWidthEstimator::new(config.width_margin),
            resize: ColumnResizeController::new(config.resizable, config.direction, config.resize_edge),
            templates: Vec::new(),
            filter_input: Debouncer::new(timing.filter_debounce()),
            filter_apply: Timer::new(),
            sort_apply: Timer::new(),
            measure: Timer::new(),
            store,
            config,
        })
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn store(&self) -> &RowStore {
        &self.store
    }

    pub fn columns(&self) -> &ColumnSet {
        self.store.columns()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn window(&self) -> &WindowDataSource {
        &self.window
    }

    pub fn resize_controller(&self) -> &ColumnResizeController {
        &self.resize
    }

    // -------------------------------------------------------------------------
    // Inputs
    // -------------------------------------------------------------------------

    /// Assigns the dataset. Columns are inferred when none were supplied,
    /// the filter index and active view are rebuilt, and a width measurement
    /// is queued for after the next paint.
    pub fn set_rows(&mut self, rows: Arc<Vec<Row>>, now: Instant) {
        self.store.set_rows(rows);
        self.splice_templates();
        self.window.on_active_view_changed(self.store.active().map(<[usize]>::len));
        if self.store.active_len() > 0
            && (self.config.auto_size_columns || self.columns().widths().iter().any(Option::is_none))
        {
            self.measure.schedule(false, now, Duration::ZERO);
        }
        info!(
            rows = self.store.rows().len(),
            columns = self.columns().len(),
            "grid rows set"
        );
    }

    pub fn set_column_defs(&mut self, defs: &[ColumnDef]) -> GridResult<()> {
        self.store.set_column_defs(defs)?;
        self.splice_templates();
        self.window.on_active_view_changed(self.store.active().map(<[usize]>::len));
        Ok(())
    }

    /// Registers per-column templates; they are attached to matching columns
    /// now and again whenever the columns change.
    pub fn set_templates(&mut self, slots: Vec<TemplateSlot>) {
        self.templates = slots;
        self.splice_templates();
    }

    fn splice_templates(&mut self) {
        if self.templates.is_empty() || self.store.columns().is_empty() {
            return;
        }
        let dropped = self.store.columns_mut().splice_templates(&self.templates);
        if dropped > 0 {
            debug!(dropped, "templates without a matching column dropped");
        }
    }

    // -------------------------------------------------------------------------
    // Filtering and sorting
    // -------------------------------------------------------------------------

    /// Feeds the filter box's current text. The recompute runs once input has
    /// been quiet for the debounce period plus the recompute delay; newer
    /// input supersedes anything still pending.
    pub fn on_filter_input(&mut self, text: &str, now: Instant) {
        if !self.store.filter_enabled() {
            return;
        }
        if self.filter_input.push(text.to_string(), now) {
            self.filter_apply.cancel();
        }
    }

    pub fn on_sort_change(&mut self, field: &str, direction: SortDirection, now: Instant) {
        self.store.mark_pending();
        self.sort_apply.schedule(
            SortState {
                field: field.to_string(),
                direction,
            },
            now,
            self.config.timing.recompute_delay(),
        );
    }

    /// Header click on column `col`. Returns false when the click was
    /// swallowed because its gesture ended a resize drag.
    pub fn on_header_click(&mut self, col: usize, now: Instant) -> bool {
        if !self.resize.take_click(now) {
            debug!(col, "header click after resize ignored");
            return false;
        }
        self.cycle_sort(col, now)
    }

    /// Cycles column `col`'s sort direction, or starts ascending on a new column.
    pub fn cycle_sort(&mut self, col: usize, now: Instant) -> bool {
        let Some(field) = self.columns().get(col).map(|d| d.field.clone()) else {
            return false;
        };
        let current = self
            .sort_apply
            .peek()
            .or(self.store.sort())
            .filter(|s| s.field == field)
            .map_or(SortDirection::None, |s| s.direction);
        self.on_sort_change(&field, current.cycle(), now);
        true
    }

    pub fn sort_state(&self) -> Option<&SortState> {
        self.store.sort()
    }

    /// True while a filter, sort or page load is scheduled but not yet applied.
    pub fn is_pending(&self) -> bool {
        self.store.pending()
            || self.filter_apply.is_armed()
            || self.sort_apply.is_armed()
            || self.window.is_loading()
    }

    // -------------------------------------------------------------------------
    // Windowing
    // -------------------------------------------------------------------------

    pub fn displayed_len(&self) -> usize {
        self.window.displayed_len().min(self.store.active_len())
    }

    /// Row at `pos` of the displayed slice.
    pub fn displayed_row(&self, pos: usize) -> Option<&Row> {
        if pos >= self.displayed_len() {
            return None;
        }
        self.store.active_row(pos)
    }

    pub fn row_id<'a>(&self, row: &'a Row) -> Option<&'a Value> {
        row.get(&self.config.id_field)
    }

    /// Displayed position of the row with the given id.
    pub fn position_of(&self, id: &Value) -> Option<usize> {
        self.store
            .row_position(&self.config.id_field, id)
            .filter(|&p| p < self.displayed_len())
    }

    /// Viewport geometry changed: `width` across, `visible_rows` tall.
    /// A change of an already known width re-measures columns, overriding
    /// earlier widths.
    pub fn on_viewport_resize(&mut self, width: f32, visible_rows: usize, now: Instant) {
        let resized = self.viewport_width > 0.0 && width != self.viewport_width;
        self.viewport_width = width;
        self.viewport.set_visible_rows(visible_rows);
        if resized && self.store.active_len() > 0 {
            self.measure.schedule(true, now, Duration::ZERO);
        }
        self.on_scrolled(now);
    }

    pub fn scroll_by_rows(&mut self, delta: isize, now: Instant) {
        self.viewport.scroll_by_rows(delta, self.displayed_len());
        self.on_scrolled(now);
    }

    pub fn scroll_to_row(&mut self, row: usize, now: Instant) {
        self.viewport.scroll_to_row(row);
        self.on_scrolled(now);
    }

    /// Scrolls the viewport to the start of the requested page and returns
    /// the offset scrolled to.
    pub fn change_page(&mut self, page: PageEvent, now: Instant) -> u64 {
        let offset = (page.page_index.saturating_mul(page.page_size) as u64)
            .saturating_mul(self.viewport.item_size())
            .saturating_add(self.viewport.header_size());
        self.viewport.scroll_to_offset(offset);
        self.on_scrolled(now);
        offset
    }

    /// Current page of the paginator, derived from the scroll position.
    pub fn current_page(&self) -> usize {
        self.viewport.first_visible_row() / self.config.page_size.max(1)
    }

    pub fn page_count(&self) -> usize {
        self.store.active_len().div_ceil(self.config.page_size.max(1)).max(1)
    }

    /// Visible-range notification: hands the new range to the data source.
    fn on_scrolled(&mut self, now: Instant) {
        let displayed = self.displayed_len();
        if let Some(range) = self.viewport.take_range_change(displayed) {
            self.window
                .on_range_change(range.end, self.store.active().map(<[usize]>::len), now);
        }
    }

    pub fn rendered_range(&self) -> std::ops::Range<usize> {
        self.viewport.rendered_range(self.displayed_len())
    }

    /// Message to show instead of rows, when configured and nothing matches.
    pub fn empty_message(&self) -> Option<&str> {
        let empty = self.store.active().is_some_and(<[usize]>::is_empty);
        (self.config.show_empty_message && empty).then_some(self.config.empty_message.as_str())
    }

    // -------------------------------------------------------------------------
    // Column widths
    // -------------------------------------------------------------------------

    pub fn request_autosize(&mut self, now: Instant) {
        if self.store.active_len() > 0 {
            self.measure.schedule(true, now, Duration::ZERO);
        }
    }

    /// Measures the painted cells and updates column widths. When nothing is
    /// painted yet the measurement is retried shortly; with no data it is
    /// dropped.
    pub fn measure_columns(
        &mut self,
        rendered: &[Vec<RenderedCell>],
        measure: &dyn TextMeasure,
        force: bool,
        now: Instant,
    ) -> Measurement {
        if self.store.active_len() == 0 {
            return Measurement::Deferred;
        }
        let result = self.estimator.apply(
            self.store.columns_mut(),
            rendered,
            self.viewport_width,
            measure,
            force,
        );
        if result == Measurement::Deferred {
            self.measure.schedule(force, now, MEASURE_RETRY);
        }
        result
    }

    /// Moves the boundary after column `col` by `delta`, as a drag would.
    pub fn resize_pair(&mut self, col: usize, delta: f32) -> bool {
        let widths = self.columns().widths();
        let (Some(Some(w)), Some(Some(next))) = (widths.get(col), widths.get(col + 1)) else {
            return false;
        };
        let (w, next) = (*w, *next);
        let columns = self.store.columns_mut();
        columns.set_width(col, w + delta);
        columns.set_width(col + 1, next - delta);
        true
    }

    pub fn header_hover(&mut self, col: usize, x: f32, cell_width: f32) -> Cursor {
        self.resize.hover(col, x, cell_width)
    }

    /// Pointer pressed on header cell `col` at absolute `x`; starts a resize
    /// drag when the handle is armed. `rendered_widths` are the widths the
    /// columns were actually painted with.
    pub fn header_pointer_down(&mut self, col: usize, x: f32, rendered_widths: &[f32]) -> bool {
        self.resize.pointer_down(col, x, rendered_widths)
    }

    /// Returns true when a drag updated column widths.
    pub fn pointer_move(&mut self, x: f32) -> bool {
        let Some(update) = self.resize.pointer_move(x) else {
            return false;
        };
        let columns = self.store.columns_mut();
        columns.set_width(update.column, update.width);
        columns.set_width(update.column + 1, update.next_width);
        true
    }

    /// Ends any drag at `now`. Returns true when one was active.
    pub fn pointer_up(&mut self, now: Instant) -> bool {
        self.resize.pointer_up(now).is_some()
    }

    /// The host is done with a pointer release and any click it produced.
    pub fn end_pointer_gesture(&mut self) {
        self.resize.end_gesture();
    }

    // -------------------------------------------------------------------------
    // Delayed work
    // -------------------------------------------------------------------------

    /// Runs everything due at `now`, in order: debounced filter input,
    /// filter and sort recomputes, page loads, then measurement requests.
    pub fn tick(&mut self, now: Instant) -> Vec<GridEvent> {
        let mut events = Vec::new();

        if let Some(text) = self.filter_input.poll(now) {
            self.store.mark_pending();
            self.filter_apply
                .schedule(text, now, self.config.timing.recompute_delay());
            events.push(GridEvent::Pending);
        }
        if let Some(text) = self.filter_apply.poll(now) {
            self.store.set_filter(text);
            info!(
                filter = %self.store.filter_text(),
                matched = self.store.active_len(),
                "filter applied"
            );
            self.after_view_change(&mut events);
        }
        if let Some(sort) = self.sort_apply.poll(now) {
            self.store.set_sort(sort.field, sort.direction);
            debug!(sort = ?self.store.sort(), "sort applied");
            self.after_view_change(&mut events);
        }
        if self.window.poll(now, self.store.active().map(<[usize]>::len)) {
            info!(page = self.window.page(), displayed = self.displayed_len(), "page loaded");
            events.push(GridEvent::DisplayedChanged {
                len: self.displayed_len(),
            });
        }
        if let Some(force) = self.measure.poll(now) {
            events.push(GridEvent::MeasureDue { force });
        }
        events
    }

    fn after_view_change(&mut self, events: &mut Vec<GridEvent>) {
        let len = self.store.active_len();
        events.push(GridEvent::ActiveViewChanged { len });
        if self.window.on_active_view_changed(Some(len)) {
            events.push(GridEvent::DisplayedChanged {
                len: self.displayed_len(),
            });
        }
        let first = self.viewport.first_visible_row();
        if first >= self.displayed_len() {
            self.viewport.scroll_to_row(0);
        }
    }

    /// When `tick` next has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        earliest([
            self.filter_input.deadline(),
            self.filter_apply.deadline(),
            self.sort_apply.deadline(),
            self.window.deadline(),
            self.measure.deadline(),
        ])
    }
}
