//! Scroll viewport and the data source deciding how much of the active view
//! is handed to the renderer.

use std::ops::Range;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::debug;

use crate::schedule::Timer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowPolicy {
    /// The viewport virtualizes rendering itself; the whole active view is exposed.
    #[default]
    Range,
    /// Rows are revealed a page at a time as the rendered range nears the end.
    Paged,
}

/// Paginator request: which page of what size to scroll to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageEvent {
    pub page_index: usize,
    pub page_size: usize,
}

/// Fixed-size-item scroll viewport. Offsets are in the same unit as
/// `item_size` and `header_size`.
#[derive(Debug, Clone)]
pub struct Viewport {
    item_size: u64,
    header_size: u64,
    offset: u64,
    visible_rows: usize,
    last_range: Option<Range<usize>>,
}

impl Viewport {
    pub fn new(item_size: u32, header_size: u32) -> Self {
        Self {
            item_size: u64::from(item_size.max(1)),
            header_size: u64::from(header_size),
            offset: 0,
            visible_rows: 0,
            last_range: None,
        }
    }

    pub fn item_size(&self) -> u64 {
        self.item_size
    }

    pub fn header_size(&self) -> u64 {
        self.header_size
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    pub fn set_visible_rows(&mut self, rows: usize) {
        self.visible_rows = rows;
    }

    pub fn scroll_to_offset(&mut self, offset: u64) {
        self.offset = offset;
    }

    pub fn scroll_to_row(&mut self, row: usize) {
        self.offset = row as u64 * self.item_size + self.header_size;
    }

    /// Scrolls by whole rows, keeping the window inside `len` rows.
    pub fn scroll_by_rows(&mut self, delta: isize, len: usize) {
        let first = self.first_visible_row() as isize + delta;
        let max_first = len.saturating_sub(self.visible_rows) as isize;
        let first = first.clamp(0, max_first.max(0));
        self.scroll_to_row(first as usize);
    }

    pub fn first_visible_row(&self) -> usize {
        (self.offset.saturating_sub(self.header_size) / self.item_size) as usize
    }

    /// Rows currently materialized for `len` rows of content.
    pub fn rendered_range(&self, len: usize) -> Range<usize> {
        let start = self
            .first_visible_row()
            .min(len.saturating_sub(self.visible_rows));
        let end = (start + self.visible_rows).min(len);
        start..end
    }

    /// Returns the rendered range when it differs from the last one reported.
    pub fn take_range_change(&mut self, len: usize) -> Option<Range<usize>> {
        let range = self.rendered_range(len);
        if self.last_range.as_ref() == Some(&range) {
            return None;
        }
        self.last_range = Some(range.clone());
        Some(range)
    }
}

#[derive(Debug, Clone)]
pub struct WindowDataSource {
    policy: WindowPolicy,
    page: usize,
    page_size: usize,
    buffer: usize,
    load_delay: Duration,
    displayed: usize,
    load: Timer<usize>,
}

impl WindowDataSource {
    pub fn new(policy: WindowPolicy, page_size: usize, buffer: usize, load_delay: Duration) -> Self {
        Self {
            policy,
            page: 1,
            page_size: page_size.max(1),
            buffer,
            load_delay,
            displayed: 0,
            load: Timer::new(),
        }
    }

    pub fn policy(&self) -> WindowPolicy {
        self.policy
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Length of the active-view prefix handed to the renderer.
    pub fn displayed_len(&self) -> usize {
        self.displayed
    }

    pub fn is_loading(&self) -> bool {
        self.load.is_armed()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.load.deadline()
    }

    /// Re-bounds the displayed slice after the active view was rebuilt.
    /// Returns true when the displayed length changed.
    pub fn on_active_view_changed(&mut self, active_len: Option<usize>) -> bool {
        let Some(len) = active_len else {
            return false;
        };
        let before = self.displayed;
        match self.policy {
            WindowPolicy::Range => self.displayed = len,
            WindowPolicy::Paged => {
                let natural = len.div_ceil(self.page_size).max(1);
                self.page = self.page.clamp(1, natural);
                self.displayed = (self.page * self.page_size).min(len);
            }
        }
        before != self.displayed
    }

    /// Reacts to a new rendered range. Range policy exposes everything at
    /// once; page policy may schedule the next batch.
    pub fn on_range_change(&mut self, rendered_end: usize, active_len: Option<usize>, now: Instant) -> bool {
        match self.policy {
            WindowPolicy::Range => self.on_active_view_changed(active_len),
            WindowPolicy::Paged => {
                self.load_next_batch_if_needed(rendered_end, active_len, now);
                false
            }
        }
    }

    /// Advances the page counter and schedules the reveal once the rendered
    /// range comes within `buffer` rows of the loaded end. Returns true when
    /// a load was scheduled.
    pub fn load_next_batch_if_needed(&mut self, rendered_end: usize, active_len: Option<usize>, now: Instant) -> bool {
        let Some(len) = active_len else {
            return false;
        };
        if len == 0 {
            return false;
        }
        let loaded = self.page * self.page_size;
        if rendered_end + self.buffer > loaded && loaded < len {
            self.page += 1;
            self.load.schedule(self.page, now, self.load_delay);
            debug!(page = self.page, rendered_end, "next batch scheduled");
            return true;
        }
        false
    }

    /// Applies a due batch load. Returns true when the displayed slice grew.
    pub fn poll(&mut self, now: Instant, active_len: Option<usize>) -> bool {
        let Some(page) = self.load.poll(now) else {
            return false;
        };
        let Some(len) = active_len else {
            return false;
        };
        let next = (page * self.page_size).min(len).max(self.displayed.min(len));
        let grew = next > self.displayed;
        self.displayed = next;
        grew
    }
}
