//! Pens, brushes, and the carrier types for text layout.

use crate::color::Color;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineCap {
    #[default]
    Flat,
    Round,
    Square,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Stroke attributes. Width and dash lengths are in page units.
#[derive(Clone, Debug, PartialEq)]
pub struct Pen {
    pub color: Color,
    pub width: f64,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f64,
    pub dash_pattern: Vec<f64>,
    pub dash_offset: f64,
}

impl Pen {
    pub fn new(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            cap: LineCap::default(),
            join: LineJoin::default(),
            miter_limit: 10.0,
            dash_pattern: Vec::new(),
            dash_offset: 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Brush {
    Solid(Color),
}

impl Brush {
    pub fn solid(color: Color) -> Self {
        Brush::Solid(color)
    }

    pub fn color(&self) -> Color {
        match self {
            Brush::Solid(color) => *color,
        }
    }
}

/// Rendering quality hint, captured in graphics state frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SmoothingMode {
    #[default]
    Default,
    None,
    HighSpeed,
    HighQuality,
    AntiAlias,
}

/// Typeface request. Metrics and shaping are the backend's problem.
#[derive(Clone, Debug, PartialEq)]
pub struct Font {
    pub family: String,
    /// Em size in points.
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
}

impl Font {
    pub fn new(family: impl Into<String>, size: f64) -> Self {
        Self {
            family: family.into(),
            size,
            bold: false,
            italic: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    Near,
    Center,
    Far,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineAlignment {
    #[default]
    Near,
    Center,
    Far,
    /// Position text on its baseline; requires a zero-height layout rect.
    BaseLine,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StringFormat {
    pub alignment: Alignment,
    pub line_alignment: LineAlignment,
}
