//! Column resize drag state machine.
//!
//! A drag moves the boundary between column `i` and `i + 1`: whatever one
//! gains the other loses, so the pair keeps its combined width.

use std::time::Instant;

use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

impl TextDirection {
    fn sign(self) -> f32 {
        match self {
            TextDirection::Ltr => 1.0,
            TextDirection::Rtl => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Default,
    ColResize,
}

/// A drag in progress. Exists only between pointer-down and pointer-up.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub column: usize,
    start_x: f32,
    start_width: f32,
    next_start_width: f32,
    moved: bool,
}

impl DragSession {
    pub fn moved(&self) -> bool {
        self.moved
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResizeState {
    Idle,
    Dragging(DragSession),
}

/// New widths for the dragged column and its right-hand neighbour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeUpdate {
    pub column: usize,
    pub width: f32,
    pub next_width: f32,
}

#[derive(Debug, Clone)]
pub struct ColumnResizeController {
    enabled: bool,
    direction: TextDirection,
    edge: f32,
    /// Column whose resize handle is under the pointer.
    armed: Option<usize>,
    state: ResizeState,
    /// When the last drag was released. A click stamped with the same
    /// instant belongs to that gesture and is swallowed.
    released_at: Option<Instant>,
}

impl ColumnResizeController {
    pub fn new(enabled: bool, direction: TextDirection, edge: f32) -> Self {
        Self {
            enabled,
            direction,
            edge,
            armed: None,
            state: ResizeState::Idle,
            released_at: None,
        }
    }

    pub fn direction(&self) -> TextDirection {
        self.direction
    }

    pub fn set_direction(&mut self, direction: TextDirection) {
        self.direction = direction;
    }

    pub fn state(&self) -> &ResizeState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, ResizeState::Dragging(_))
    }

    /// Pointer moved over header cell `column`; `x` is relative to the cell's
    /// left edge. Arms the handle when within `edge` of the trailing edge.
    pub fn hover(&mut self, column: usize, x: f32, cell_width: f32) -> Cursor {
        if !self.enabled {
            return Cursor::Default;
        }
        if self.is_dragging() {
            return Cursor::ColResize;
        }
        self.armed = None;
        let x = match self.direction {
            TextDirection::Ltr => x,
            TextDirection::Rtl => cell_width - x,
        };
        if cell_width - x < self.edge {
            self.armed = Some(column);
            return Cursor::ColResize;
        }
        Cursor::Default
    }

    /// Starts a drag on the armed column. `widths` are the current rendered
    /// widths of all columns. Does nothing while a drag is active, when the
    /// handle is not armed, or for the last column. Any press outside a drag
    /// starts a new gesture, so an earlier release no longer swallows clicks.
    pub fn pointer_down(&mut self, column: usize, x: f32, widths: &[f32]) -> bool {
        if self.is_dragging() {
            return false;
        }
        self.released_at = None;
        if !self.enabled || self.armed != Some(column) {
            return false;
        }
        let (Some(&start_width), Some(&next_start_width)) = (widths.get(column), widths.get(column + 1)) else {
            return false;
        };
        self.state = ResizeState::Dragging(DragSession {
            column,
            start_x: x,
            start_width,
            next_start_width,
            moved: false,
        });
        debug!(column, "column resize started");
        true
    }

    pub fn pointer_move(&mut self, x: f32) -> Option<ResizeUpdate> {
        let sign = self.direction.sign();
        let ResizeState::Dragging(session) = &mut self.state else {
            return None;
        };
        let delta = (x - session.start_x) * sign;
        if delta != 0.0 {
            session.moved = true;
        }
        Some(ResizeUpdate {
            column: session.column,
            width: session.start_width + delta,
            next_width: session.next_start_width - delta,
        })
    }

    /// Ends the gesture at `now`. Always leaves the controller idle.
    pub fn pointer_up(&mut self, now: Instant) -> Option<DragSession> {
        match std::mem::replace(&mut self.state, ResizeState::Idle) {
            ResizeState::Dragging(session) => {
                self.released_at = Some(now);
                debug!(column = session.column, moved = session.moved, "column resize ended");
                Some(session)
            }
            ResizeState::Idle => None,
        }
    }

    /// Whether a header click at `now` should go on to sort. Only the click
    /// synthesized by the release that ended a resize is swallowed.
    pub fn take_click(&mut self, now: Instant) -> bool {
        if self.is_dragging() {
            return false;
        }
        self.released_at.take() != Some(now)
    }

    /// The host finished dispatching a pointer release; nothing later can
    /// belong to that gesture.
    pub fn end_gesture(&mut self) {
        self.released_at = None;
    }
}
