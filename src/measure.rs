//! Text measurement capability used by column auto-sizing.

use unicode_width::UnicodeWidthStr;

/// Font a cell was rendered with, as reported by the render surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
    pub bold: bool,
}

impl FontSpec {
    pub fn monospace() -> Self {
        Self {
            family: "monospace".into(),
            size: 1.0,
            bold: false,
        }
    }
}

/// Measures the rendered width of `text` in a given font.
pub trait TextMeasure {
    fn text_width(&self, text: &str, font: &FontSpec) -> f32;
}

impl<F> TextMeasure for F
where
    F: Fn(&str, &FontSpec) -> f32,
{
    fn text_width(&self, text: &str, font: &FontSpec) -> f32 {
        self(text, font)
    }
}

/// Terminal cells: one column per narrow char, two per wide char. Font is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalMeasure;

impl TextMeasure for TerminalMeasure {
    fn text_width(&self, text: &str, _font: &FontSpec) -> f32 {
        UnicodeWidthStr::width(text) as f32
    }
}

/// One rendered cell as read back from the render surface.
#[derive(Debug, Clone)]
pub struct RenderedCell {
    pub text: String,
    pub font: FontSpec,
}

impl RenderedCell {
    pub fn new(text: impl Into<String>, font: FontSpec) -> Self {
        Self {
            text: text.into(),
            font,
        }
    }
}

/// Rendered rows, each holding its cells in column order.
pub type RenderedRows = Vec<Vec<RenderedCell>>;
