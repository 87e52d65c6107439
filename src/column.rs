//! Column definitions and the column set derived from them.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{GridError, GridResult};
use crate::row::{Row, value_text};

/// Externally supplied cell renderer for one column.
#[derive(Clone)]
pub struct CellTemplate(Arc<dyn Fn(&Value) -> String + Send + Sync>);

impl CellTemplate {
    pub fn new(render: impl Fn(&Value) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(render))
    }

    pub fn render(&self, value: &Value) -> String {
        (self.0)(value)
    }
}

impl fmt::Debug for CellTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CellTemplate(..)")
    }
}

/// A template slot keyed by the field of the column it renders.
#[derive(Debug, Clone)]
pub struct TemplateSlot {
    pub column: String,
    pub template: CellTemplate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDef {
    pub field: String,
    #[serde(default)]
    pub title: String,
    /// Width in the host's length unit; `"120px"` and `120` are both accepted.
    #[serde(default, deserialize_with = "de_width")]
    pub width: Option<f32>,
    #[serde(default)]
    pub filterable: Option<bool>,
    #[serde(skip)]
    pub template: Option<CellTemplate>,
}

impl ColumnDef {
    pub fn new(field: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            title: title.into(),
            width: None,
            filterable: None,
            template: None,
        }
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn filterable(mut self, on: bool) -> Self {
        self.filterable = Some(on);
        self
    }

    pub fn is_filterable(&self) -> bool {
        self.filterable.unwrap_or(false)
    }

    /// Cell text for `row`, through the template when one is attached.
    pub fn render_cell(&self, row: &Row) -> String {
        match (&self.template, row.get(&self.field)) {
            (Some(t), Some(v)) => t.render(v),
            (Some(t), None) => t.render(&Value::Null),
            (None, Some(v)) => value_text(v),
            (None, None) => String::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawWidth {
    Number(f32),
    Text(String),
}

fn de_width<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f32>, D::Error> {
    let raw = Option::<RawWidth>::deserialize(d)?;
    match raw {
        None => Ok(None),
        Some(RawWidth::Number(n)) => Ok(Some(n)),
        Some(RawWidth::Text(s)) => parse_width(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid width: {s}"))),
    }
}

/// Parses `"120"`, `"120px"` or `"120.5 px"`.
pub fn parse_width(s: &str) -> Option<f32> {
    let s = s.trim();
    let s = s.strip_suffix("px").unwrap_or(s).trim_end();
    s.parse::<f32>().ok().filter(|w| w.is_finite() && *w >= 0.0)
}

/// Ordered, field-unique set of column definitions.
#[derive(Debug, Clone, Default)]
pub struct ColumnSet {
    defs: Vec<ColumnDef>,
}

impl ColumnSet {
    /// Builds a set from caller-owned definitions (cloned), rejecting duplicate fields.
    pub fn from_defs(defs: &[ColumnDef]) -> GridResult<Self> {
        let mut seen = HashSet::new();
        for d in defs {
            if !seen.insert(d.field.as_str()) {
                return Err(GridError::DuplicateColumn(d.field.clone()));
            }
        }
        let defs = defs
            .iter()
            .cloned()
            .map(|mut d| {
                if d.title.is_empty() {
                    d.title = d.field.clone();
                }
                d
            })
            .collect();
        Ok(Self { defs })
    }

    /// One column per key of `row`, titled by the key, in key order.
    pub fn infer(row: &Row) -> Self {
        Self {
            defs: row.keys().map(|k| ColumnDef::new(k.as_str(), k.as_str())).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn defs(&self) -> &[ColumnDef] {
        &self.defs
    }

    pub fn get(&self, idx: usize) -> Option<&ColumnDef> {
        self.defs.get(idx)
    }

    pub fn by_field(&self, field: &str) -> Option<&ColumnDef> {
        self.defs.iter().find(|d| d.field == field)
    }

    pub fn index_of(&self, field: &str) -> Option<usize> {
        self.defs.iter().position(|d| d.field == field)
    }

    /// Render order.
    pub fn columns(&self) -> Vec<&str> {
        self.defs.iter().map(|d| d.field.as_str()).collect()
    }

    pub fn any_filterable(&self) -> bool {
        self.defs.iter().any(ColumnDef::is_filterable)
    }

    pub fn widths(&self) -> Vec<Option<f32>> {
        self.defs.iter().map(|d| d.width).collect()
    }

    pub fn set_width(&mut self, idx: usize, width: f32) {
        if let Some(d) = self.defs.get_mut(idx) {
            d.width = Some(width);
        }
    }

    /// Attaches templates to their columns. Returns how many were dropped
    /// because no column has the slot's field.
    pub fn splice_templates(&mut self, slots: &[TemplateSlot]) -> usize {
        let mut dropped = 0;
        for slot in slots {
            match self.defs.iter_mut().find(|d| d.field == slot.column) {
                Some(d) => d.template = Some(slot.template.clone()),
                None => dropped += 1,
            }
        }
        dropped
    }
}
