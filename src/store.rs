//! Dataset ownership and the derived active view (filter, then stable sort).

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::column::{ColumnDef, ColumnSet};
use crate::error::GridResult;
use crate::filter::FilterIndex;
use crate::row::{Row, compare_values};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    Descending,
    #[default]
    None,
}

impl SortDirection {
    /// None -> Ascending -> Descending -> None
    pub fn cycle(self) -> Self {
        match self {
            SortDirection::None => SortDirection::Ascending,
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Debug, Default)]
pub struct RowStore {
    rows: Arc<Vec<Row>>,
    columns: ColumnSet,
    explicit_columns: bool,
    filterable: bool,
    min_boundary_matches: usize,
    index: Option<FilterIndex>,
    filter: String,
    sort: Option<SortState>,
    /// None until a dataset has been assigned.
    active: Option<Vec<usize>>,
    pending: bool,
}

impl RowStore {
    pub fn new(filterable: bool, min_boundary_matches: usize) -> Self {
        Self {
            filterable,
            min_boundary_matches,
            ..Self::default()
        }
    }

    /// Replaces the column definitions with a private copy of `defs`.
    pub fn set_column_defs(&mut self, defs: &[ColumnDef]) -> GridResult<()> {
        self.columns = ColumnSet::from_defs(defs)?;
        self.explicit_columns = true;
        if self.active.is_some() {
            self.rebuild_index();
            self.recompute();
        }
        Ok(())
    }

    /// Replaces the dataset, inferring columns from the first row when none
    /// were supplied, and rebuilds the index and the active view.
    pub fn set_rows(&mut self, rows: Arc<Vec<Row>>) {
        self.rows = rows;
        if !self.explicit_columns {
            self.columns = self.rows.first().map(ColumnSet::infer).unwrap_or_default();
        }
        self.rebuild_index();
        self.recompute();
        debug!(rows = self.rows.len(), columns = self.columns.len(), "dataset assigned");
    }

    pub fn set_sort(&mut self, field: impl Into<String>, direction: SortDirection) {
        self.sort = Some(SortState {
            field: field.into(),
            direction,
        });
        self.recompute();
    }

    pub fn set_filter(&mut self, text: impl Into<String>) {
        self.filter = text.into();
        self.recompute();
    }

    /// Marks a recompute as scheduled; cleared when the active view is rebuilt.
    pub fn mark_pending(&mut self) {
        self.pending = true;
    }

    pub fn pending(&self) -> bool {
        self.pending
    }

    pub fn filter_enabled(&self) -> bool {
        self.filterable || self.columns.any_filterable()
    }

    pub fn filter_text(&self) -> &str {
        &self.filter
    }

    pub fn sort(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut ColumnSet {
        &mut self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn index(&self) -> Option<&FilterIndex> {
        self.index.as_ref()
    }

    pub fn active(&self) -> Option<&[usize]> {
        self.active.as_deref()
    }

    pub fn active_len(&self) -> usize {
        self.active.as_ref().map_or(0, Vec::len)
    }

    /// Row at `pos` in the active view.
    pub fn active_row(&self, pos: usize) -> Option<&Row> {
        let idx = *self.active.as_ref()?.get(pos)?;
        self.rows.get(idx)
    }

    /// Active-view position of the row whose `id_field` equals `id`.
    pub fn row_position(&self, id_field: &str, id: &Value) -> Option<usize> {
        self.active
            .as_ref()?
            .iter()
            .position(|&idx| self.rows[idx].get(id_field) == Some(id))
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .filter_enabled()
            .then(|| FilterIndex::build(&self.rows, &self.columns, self.min_boundary_matches));
    }

    fn recompute(&mut self) {
        let mut view: Vec<usize> = match &self.index {
            Some(index) if !self.filter.is_empty() => index.matches(&self.filter),
            _ => (0..self.rows.len()).collect(),
        };
        if let Some(sort) = &self.sort {
            let rows = &self.rows;
            let field = sort.field.as_str();
            match sort.direction {
                SortDirection::Ascending => {
                    view.sort_by(|&a, &b| compare_values(rows[a].get(field), rows[b].get(field)))
                }
                SortDirection::Descending => {
                    view.sort_by(|&a, &b| compare_values(rows[b].get(field), rows[a].get(field)))
                }
                SortDirection::None => {}
            }
        }
        debug!(
            total = self.rows.len(),
            active = view.len(),
            filter = %self.filter,
            "active view recomputed"
        );
        self.active = Some(view);
        self.pending = false;
    }
}
