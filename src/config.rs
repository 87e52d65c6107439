//! Grid configuration, with the defaults the grid ships with.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::column::ColumnDef;
use crate::error::GridResult;
use crate::filter::MIN_BOUNDARY_MATCHES;
use crate::resize::TextDirection;
use crate::window::WindowPolicy;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub filterable: bool,
    pub resizable: bool,
    pub filter_placeholder: String,
    /// Row height in the viewport's length unit.
    pub item_size: u32,
    pub header_size: u32,
    pub page_size: usize,
    /// Field holding each row's unique id.
    pub id_field: String,
    pub auto_size_columns: bool,
    pub paginator: bool,
    pub show_empty_message: bool,
    pub empty_message: String,
    pub windowing: WindowPolicy,
    pub direction: TextDirection,
    /// Space kept free when spreading leftover width across columns.
    pub width_margin: f32,
    /// Distance from a header cell's trailing edge that grabs the resize handle.
    pub resize_edge: f32,
    pub timing: TimingConfig,
    pub columns: Option<Vec<ColumnDef>>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            filterable: true,
            resizable: true,
            filter_placeholder: "Filter".into(),
            item_size: 47,
            header_size: 56,
            page_size: 50,
            id_field: "_id".into(),
            auto_size_columns: false,
            paginator: false,
            show_empty_message: false,
            empty_message: "No records found.".into(),
            windowing: WindowPolicy::Range,
            direction: TextDirection::Ltr,
            width_margin: 20.0,
            resize_edge: 5.0,
            timing: TimingConfig::default(),
            columns: None,
        }
    }
}

impl GridConfig {
    /// Preset for a character-cell surface: one-cell rows and header,
    /// and margins scaled down to cells.
    pub fn terminal() -> Self {
        Self {
            item_size: 1,
            header_size: 1,
            width_margin: 2.0,
            resize_edge: 1.0,
            show_empty_message: true,
            ..Self::default()
        }
    }

    pub fn from_toml_str(s: &str) -> GridResult<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> GridResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

/// Delays and thresholds, in milliseconds where timed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub filter_debounce_ms: u64,
    pub recompute_delay_ms: u64,
    pub page_load_delay_ms: u64,
    /// Rows before the loaded end at which the next page is requested.
    pub page_buffer: usize,
    pub min_boundary_matches: usize,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            filter_debounce_ms: 150,
            recompute_delay_ms: 200,
            page_load_delay_ms: 250,
            page_buffer: 20,
            min_boundary_matches: MIN_BOUNDARY_MATCHES,
        }
    }
}

impl TimingConfig {
    pub fn filter_debounce(&self) -> Duration {
        Duration::from_millis(self.filter_debounce_ms)
    }

    pub fn recompute_delay(&self) -> Duration {
        Duration::from_millis(self.recompute_delay_ms)
    }

    pub fn page_load_delay(&self) -> Duration {
        Duration::from_millis(self.page_load_delay_ms)
    }
}
