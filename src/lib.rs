//! Virtualized data grid engine: a row store with filter/sort, a windowed
//! data source, column auto-sizing and drag resizing, all driven by explicit
//! events and an explicit clock so any host can embed it.

pub mod column;
pub mod config;
pub mod error;
pub mod filter;
pub mod grid;
pub mod loader;
pub mod measure;
pub mod resize;
pub mod row;
pub mod schedule;
pub mod store;
pub mod widths;
pub mod window;

pub use column::{CellTemplate, ColumnDef, ColumnSet, TemplateSlot};
pub use config::{GridConfig, TimingConfig};
pub use error::{GridError, GridResult};
pub use grid::{Grid, GridEvent};
pub use measure::{FontSpec, RenderedCell, TerminalMeasure, TextMeasure};
pub use resize::{Cursor, TextDirection};
pub use row::Row;
pub use store::{SortDirection, SortState};
pub use widths::Measurement;
pub use window::{PageEvent, WindowPolicy};
