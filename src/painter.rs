use crate::types::{DrawOp, Metrics, Size};

/// The drawing surface the layout engine targets. Coordinates are pixels,
/// y grows downwards.
pub trait Painter {
    /// Paints `s` with its top-left corner at (x, y).
    fn text(&mut self, x: i32, y: i32, s: &str);
    /// Size of `s` without any margins.
    fn text_size(&self, s: &str) -> Size;
    /// One pixel wide border; width and height include the border pixels.
    fn rect(&mut self, x: i32, y: i32, width: i32, height: i32);
    /// One pixel wide line including both end points.
    fn line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32);
    /// Height of one line of text, the base unit of every layout margin.
    fn line_height(&self) -> i32;
}

/// Shifts every drawing call by (dx, dy).
pub struct Offset<'a> {
    inner: &'a mut dyn Painter,
    dx: i32,
    dy: i32,
}

impl<'a> Offset<'a> {
    pub fn new(inner: &'a mut dyn Painter, dx: i32, dy: i32) -> Self {
        Self { inner, dx, dy }
    }
}

impl Painter for Offset<'_> {
    fn text(&mut self, x: i32, y: i32, s: &str) {
        self.inner.text(x + self.dx, y + self.dy, s);
    }

    fn text_size(&self, s: &str) -> Size {
        self.inner.text_size(s)
    }

    fn rect(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.inner.rect(x + self.dx, y + self.dy, width, height);
    }

    fn line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        self.inner
            .line(x1 + self.dx, y1 + self.dy, x2 + self.dx, y2 + self.dy);
    }

    fn line_height(&self) -> i32 {
        self.inner.line_height()
    }
}

/// Measures text with fixed-pitch metrics and keeps every call it receives.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    metrics: Metrics,
    ops: Vec<DrawOp>,
}

impl Recorder {
    pub fn new(metrics: Metrics) -> Self {
        Self {
            metrics,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<DrawOp> {
        self.ops
    }
}

impl Painter for Recorder {
    fn text(&mut self, x: i32, y: i32, s: &str) {
        self.ops.push(DrawOp::text(x, y, s));
    }

    fn text_size(&self, s: &str) -> Size {
        let mut lines = 0;
        let mut widest = 0;
        for line in s.split('\n') {
            lines += 1;
            widest = widest.max(line.chars().count());
        }
        Size::new(
            to_px(widest).saturating_mul(self.metrics.char_width),
            to_px(lines).saturating_mul(self.metrics.line_height),
        )
    }

    fn rect(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.ops.push(DrawOp::Rect {
            x,
            y,
            width,
            height,
        });
    }

    fn line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        self.ops.push(DrawOp::Line { x1, y1, x2, y2 });
    }

    fn line_height(&self) -> i32 {
        self.metrics.line_height
    }
}

fn to_px(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_measures_the_widest_line() {
        let r = Recorder::new(Metrics {
            char_width: 7,
            line_height: 12,
        });
        assert_eq!(r.text_size("ab\nabcd\n"), Size::new(28, 36));
        assert_eq!(r.text_size(""), Size::new(0, 12));
        assert_eq!(r.line_height(), 12);
    }

    #[test]
    fn offsets_stack() {
        let mut r = Recorder::default();
        {
            let mut outer = Offset::new(&mut r, 10, 20);
            let mut inner = Offset::new(&mut outer, 1, 2);
            inner.line(0, 0, 5, 5);
            inner.rect(-1, -1, 3, 3);
            inner.text(0, 0, "x");
        }
        assert_eq!(
            r.ops(),
            &[
                DrawOp::Line {
                    x1: 11,
                    y1: 22,
                    x2: 16,
                    y2: 27
                },
                DrawOp::Rect {
                    x: 10,
                    y: 21,
                    width: 3,
                    height: 3
                },
                DrawOp::text(11, 22, "x"),
            ]
        );
    }
}
