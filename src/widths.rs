//! Content-driven column widths.

use tracing::debug;

use crate::column::ColumnSet;
use crate::measure::{RenderedCell, TextMeasure};

#[derive(Debug, Clone, PartialEq)]
pub enum Measurement {
    /// Nothing is painted yet; measure again after the next paint.
    Deferred,
    /// Final width per column, in column order.
    Measured(Vec<f32>),
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnWidthEstimator {
    margin: f32,
}

impl ColumnWidthEstimator {
    pub fn new(margin: f32) -> Self {
        Self { margin }
    }

    /// Measures the longest rendered text of every column and spreads any
    /// space left in the viewport evenly across columns.
    pub fn estimate(
        &self,
        column_count: usize,
        rendered: &[Vec<RenderedCell>],
        viewport_width: f32,
        measure: &dyn TextMeasure,
    ) -> Measurement {
        if column_count == 0 || rendered.is_empty() {
            return Measurement::Deferred;
        }
        let mut widths: Vec<f32> = (0..column_count)
            .map(|col| {
                let mut longest: Option<&RenderedCell> = None;
                for cell in rendered.iter().filter_map(|r| r.get(col)) {
                    if longest.is_none_or(|l| cell.text.chars().count() > l.text.chars().count()) {
                        longest = Some(cell);
                    }
                }
                longest.map_or(0.0, |c| measure.text_width(&c.text, &c.font))
            })
            .collect();

        let extra = viewport_width - widths.iter().sum::<f32>() - self.margin;
        if extra > 0.0 {
            let add = extra / column_count as f32;
            widths.iter_mut().for_each(|w| *w += add);
        }
        Measurement::Measured(widths)
    }

    /// Estimates and writes the result into `columns`. Widths already set are
    /// kept unless `force` is true.
    pub fn apply(
        &self,
        columns: &mut ColumnSet,
        rendered: &[Vec<RenderedCell>],
        viewport_width: f32,
        measure: &dyn TextMeasure,
        force: bool,
    ) -> Measurement {
        let result = self.estimate(columns.len(), rendered, viewport_width, measure);
        if let Measurement::Measured(widths) = &result {
            let current = columns.widths();
            for (idx, w) in widths.iter().enumerate() {
                if force || current[idx].is_none() {
                    columns.set_width(idx, *w);
                }
            }
            debug!(?widths, force, "column widths measured");
        }
        result
    }
}
