use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

use crate::error::Error;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// One recorded drawing call.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum DrawOp {
    Text { x: i32, y: i32, text: String },
    Rect { x: i32, y: i32, width: i32, height: i32 },
    Line { x1: i32, y1: i32, x2: i32, y2: i32 },
}

impl DrawOp {
    pub fn text(x: i32, y: i32, t: impl Into<String>) -> Self {
        DrawOp::Text { x, y, text: t.into() }
    }
}

impl fmt::Display for DrawOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawOp::Text { x, y, text } => write!(f, "Text({x}, {y}, {text:?})"),
            DrawOp::Rect {
                x,
                y,
                width,
                height,
            } => write!(f, "Rect({x}, {y}, {width}, {height})"),
            DrawOp::Line { x1, y1, x2, y2 } => write!(f, "Line({x1}, {y1}, {x2}, {y2})"),
        }
    }
}

/// A painted diagram: the area it covers and every call made to draw it.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Drawing {
    pub width: i32,
    pub height: i32,
    pub ops: Vec<DrawOp>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FormatOptions {
    /// Inserted once per nesting level.
    pub indent: String,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            indent: "\t".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LayoutOptions {
    pub origin_x: i32,
    pub origin_y: i32,
    /// Pixels between the title text and the diagram border.
    pub title_gap: i32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            origin_x: 0,
            origin_y: 0,
            title_gap: 5,
        }
    }
}

/// Fixed-pitch text metrics for the recording painter.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Metrics {
    pub char_width: i32,
    pub line_height: i32,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            char_width: 8,
            line_height: 16,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RenderOptions {
    pub layout: LayoutOptions,
    pub metrics: Metrics,
}

/// Bounds that keep every coordinate of a document of a few megabytes
/// inside `i32`.
pub const CHAR_WIDTH_RANGE: RangeInclusive<i32> = 0..=256;
pub const LINE_HEIGHT_RANGE: RangeInclusive<i32> = 1..=256;
pub const ORIGIN_RANGE: RangeInclusive<i32> = -1_000_000..=1_000_000;
pub const TITLE_GAP_RANGE: RangeInclusive<i32> = 0..=1_000;

fn check(name: &'static str, value: i32, range: RangeInclusive<i32>) -> Result<(), Error> {
    if range.contains(&value) {
        return Ok(());
    }
    Err(Error::InvalidOption {
        name,
        value,
        min: *range.start(),
        max: *range.end(),
    })
}

impl RenderOptions {
    /// Rejects options that caller-supplied JSON can set out of range.
    pub fn validate(&self) -> Result<(), Error> {
        check("char_width", self.metrics.char_width, CHAR_WIDTH_RANGE)?;
        check("line_height", self.metrics.line_height, LINE_HEIGHT_RANGE)?;
        check("origin_x", self.layout.origin_x, ORIGIN_RANGE)?;
        check("origin_y", self.layout.origin_y, ORIGIN_RANGE)?;
        check("title_gap", self.layout.title_gap, TITLE_GAP_RANGE)
    }
}
