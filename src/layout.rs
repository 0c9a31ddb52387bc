//! Two-pass layout. Every node first reports the smallest box it can be
//! painted into (`min_size`); its parent then hands it a box at least that
//! large (`paint`). Both passes measure text through the same [`Painter`], so
//! a node must be sized and painted with the same painter.

use tracing::debug;

use crate::ast::*;
use crate::error::Error;
use crate::painter::{Offset, Painter, Recorder};
use crate::parser::parse_string;
use crate::types::{Drawing, LayoutOptions, Rect, RenderOptions, Size};

/// Label painted above the default case of a switch.
pub const DEFAULT_CASE_LABEL: &str = "default";

/// Size and paint rules of one node kind, kept side by side so the two
/// passes cannot disagree.
pub trait Layout {
    /// Smallest box the node needs, excluding any border its parent draws.
    fn min_size(&self, p: &dyn Painter) -> Size;
    /// Paints into a `size` box at the painter's origin. `size` must be at
    /// least `min_size` for the same painter.
    fn paint(&self, p: &mut dyn Painter, size: Size);
}

pub fn min_size(p: &dyn Painter, node: &dyn Layout) -> Size {
    node.min_size(p)
}

pub fn paint_in(p: &mut dyn Painter, node: &dyn Layout, width: i32, height: i32) {
    node.paint(p, Size::new(width, height));
}

fn paint_child(p: &mut dyn Painter, node: &dyn Layout, area: Rect) {
    node.paint(&mut Offset::new(p, area.x, area.y), area.size());
}

fn count(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// `(v + 0.5)` truncated, the rounding every proportional split uses.
fn round(v: f64) -> i32 {
    (v + 0.5) as i32
}

pub fn min_size_block(margin: i32, sizes: &[Size]) -> Size {
    let width = sizes.iter().map(|s| s.width).max().unwrap_or(0);
    let height: i32 = sizes.iter().map(|s| s.height).sum::<i32>() + count(sizes.len()) - 1;
    Size::new(margin.max(width), margin.max(height))
}

pub fn min_size_parallel(margin: i32, sizes: &[Size]) -> Size {
    let width: i32 = sizes.iter().map(|s| s.width).sum::<i32>() + count(sizes.len()) - 1;
    let height = sizes.iter().map(|s| s.height).max().unwrap_or(0) + 2 * margin + 2;
    Size::new(width.max(3 * margin), height.max(3 * margin + 2))
}

pub fn min_size_infinite_loop(margin: i32, block: Size) -> Size {
    Size::new(
        margin + 1 + margin.max(block.width),
        2 * margin + 2 + margin.max(block.height),
    )
}

/// Shared by `while` and `do ... while`; only the side of the condition
/// band differs.
pub fn min_size_while(margin: i32, condition: Size, block: Size) -> Size {
    Size::new(
        condition.width.max(margin + 1 + margin.max(block.width)),
        margin + condition.height + 1 + margin.max(block.height),
    )
}

/// The condition sits in a triangle whose diagonals meet at the branch
/// split. Its slope decides how tall the header must be for the text to fit
/// left of the diagonal.
pub fn min_size_if_else(margin: i32, condition: Size, then: Size, otherwise: Size) -> Size {
    let text_w = condition.width + margin / 2;
    let text_h = condition.height.max(margin);
    let bottom = (then.width + 1 + otherwise.width).max(text_w + text_w / 2);
    let header = round(f64::from(bottom * text_h) / f64::from(bottom - text_w));
    Size::new(bottom, header + 1 + then.height.max(otherwise.height))
}

/// `cases` pairs each case label's text size with its block's min size.
pub fn min_size_switch(margin: i32, subject: Size, cases: &[(Size, Size)]) -> Size {
    let header = subject.height + margin;
    let subject_w = subject.width + margin;
    if cases.is_empty() {
        return Size::new(subject_w.max(margin), header + 1 + margin);
    }

    let label_row = cases.iter().map(|(l, _)| l.height).max().unwrap_or(0) + margin;
    let columns: i32 = cases
        .iter()
        .map(|(l, b)| (l.width + margin).max(b.width))
        .sum::<i32>()
        + count(cases.len())
        - 1;
    let blocks_h = cases.iter().map(|(_, b)| b.height).max().unwrap_or(0);
    Size::new(
        subject_w.max(columns),
        header + 1 + label_row + 1 + blocks_h.max(margin),
    )
}

/// Stacks `sizes` top to bottom with one pixel between them. Every child
/// gets the full width and its own height, except the last which takes
/// whatever is left.
pub fn block_paint_areas(width: i32, height: i32, sizes: &[Size]) -> Vec<Rect> {
    let mut areas = Vec::with_capacity(sizes.len());
    let mut y = 0;
    for (i, s) in sizes.iter().enumerate() {
        let h = if i + 1 == sizes.len() {
            height - y
        } else {
            s.height
        };
        areas.push(Rect::new(0, y, width, h));
        y += h + 1;
    }
    areas
}

/// Frame of an endless loop: a bar on the left plus a band above and below
/// the body. Returns the body rectangle.
pub fn paint_infinite_loop_lines(p: &mut dyn Painter, width: i32, height: i32) -> Rect {
    let m = p.line_height();
    let bottom = height - 1 - m;
    p.line(m, m, width - 1, m);
    p.line(m, m, m, bottom);
    p.line(m, bottom, width - 1, bottom);
    Rect::new(m + 1, m + 1, width - m - 1, height - 2 - 2 * m)
}

pub fn paint_while_loop(p: &mut dyn Painter, condition: &str, width: i32, height: i32) -> Rect {
    let m = p.line_height();
    let top = m + p.text_size(condition).height;
    p.text(m / 2, m / 2, condition);
    p.line(m, top, width - 1, top);
    p.line(m, top, m, height - 1);
    Rect::new(m + 1, top + 1, width - m - 1, height - (top + 1))
}

pub fn paint_do_while_loop(p: &mut dyn Painter, condition: &str, width: i32, height: i32) -> Rect {
    let m = p.line_height();
    let bottom = height - 1 - m - p.text_size(condition).height;
    p.line(m, 0, m, bottom);
    p.line(m, bottom, width - 1, bottom);
    p.text(m / 2, bottom + 1 + m / 2, condition);
    Rect::new(m + 1, 0, width - m - 1, bottom)
}

/// Splits `total` between `wants` in proportion; every separator costs one
/// pixel. Falls back to an equal split when nothing was asked for.
fn split_widths(total: i32, wants: &[i32]) -> Vec<i32> {
    let n = count(wants.len());
    let avail = total - (n - 1);
    let asked: i32 = wants.iter().sum();
    if asked <= 0 {
        return vec![avail / n.max(1); wants.len()];
    }
    let scale = f64::from(avail) / f64::from(asked);
    wants.iter().map(|&w| round(f64::from(w) * scale)).collect()
}

/// Chamfered frame with the blocks side by side. Returns one rectangle per
/// block.
pub fn paint_parallel(p: &mut dyn Painter, sizes: &[Size], width: i32, height: i32) -> Vec<Rect> {
    let m = p.line_height();
    p.line(0, m, width - 1, m);
    p.line(0, height - 1 - m, width - 1, height - 1 - m);
    p.line(0, m - 1, m - 1, 0);
    p.line(width - m, 0, width - 1, m - 1);
    p.line(0, height - m, m - 1, height - 1);
    p.line(width - m, height - 1, width - 1, height - m);

    let wants: Vec<i32> = sizes.iter().map(|s| s.width).collect();
    let mut areas = Vec::with_capacity(sizes.len());
    let mut x = 0;
    for (i, w) in split_widths(width, &wants).into_iter().enumerate() {
        if i > 0 {
            p.line(x - 1, m + 1, x - 1, height - m - 1);
        }
        areas.push(Rect::new(x, m + 1, w, height - 2 * m - 2));
        x += w + 1;
    }
    areas
}

/// Subject band, a row of case labels and one column per case. `cases`
/// pairs each label with the min size of its block; the last column takes
/// the rounding remainder.
pub fn paint_switch(
    p: &mut dyn Painter,
    subject: &str,
    cases: &[(&str, Size)],
    width: i32,
    height: i32,
) -> Vec<Rect> {
    let m = p.line_height();
    let header = p.text_size(subject).height + m;
    p.text(m / 2, m / 2, subject);
    p.line(0, header, width - 1, header);
    if cases.is_empty() {
        return Vec::new();
    }

    let label_top = header + 1;
    let label_sizes: Vec<Size> = cases.iter().map(|(l, _)| p.text_size(l)).collect();
    let label_row = label_sizes.iter().map(|s| s.height).max().unwrap_or(0) + m;
    let body_top = label_top + label_row;
    p.line(0, body_top, width - 1, body_top);

    let wants: Vec<i32> = cases
        .iter()
        .zip(&label_sizes)
        .map(|((_, block), label)| (label.width + m).max(block.width))
        .collect();
    let mut widths = split_widths(width, &wants);
    let used: i32 = widths.iter().sum::<i32>() + count(widths.len()) - 1;
    if let Some(last) = widths.last_mut() {
        *last += width - used;
    }

    let mut areas = Vec::with_capacity(cases.len());
    let mut x = 0;
    for (i, ((label, _), w)) in cases.iter().zip(widths).enumerate() {
        if i > 0 {
            p.line(x - 1, label_top, x - 1, height - 1);
        }
        p.text(x + m / 2, label_top + m / 2, label);
        areas.push(Rect::new(x, body_top + 1, w, height - body_top - 1));
        x += w + 1;
    }
    areas
}

fn statement_sizes(p: &dyn Painter, list: &[Statement]) -> Vec<Size> {
    list.iter().map(|s| s.min_size(p)).collect()
}

impl Layout for Instruction {
    fn min_size(&self, p: &dyn Painter) -> Size {
        let m = p.line_height();
        let t = p.text_size(&self.text.text);
        Size::new(t.width + m, t.height + m)
    }

    fn paint(&self, p: &mut dyn Painter, _size: Size) {
        let m = p.line_height();
        p.text(m / 2, m / 2, &self.text.text);
    }
}

impl Layout for Call {
    fn min_size(&self, p: &dyn Painter) -> Size {
        let m = p.line_height();
        let t = p.text_size(&self.text.text);
        Size::new(t.width + 2 * m + 2, t.height + m)
    }

    fn paint(&self, p: &mut dyn Painter, size: Size) {
        let m = p.line_height();
        let left = m / 2;
        let right = size.width - 1 - left;
        p.line(left, 0, left, size.height - 1);
        p.line(right, 0, right, size.height - 1);
        p.text(left + 1 + m / 2, m / 2, &self.text.text);
    }
}

impl Layout for Break {
    fn min_size(&self, p: &dyn Painter) -> Size {
        let m = p.line_height();
        let t = p.text_size(&self.text.text);
        let h = m + t.height;
        Size::new(h / 4 + 1 + t.width + m, h)
    }

    /// Arrow pointing left over the full height, text to its right.
    fn paint(&self, p: &mut dyn Painter, size: Size) {
        let m = p.line_height();
        let h = size.height;
        p.line(0, (h - 1) / 2, h / 4, 0);
        p.line(0, h / 2, h / 4, h - 1);
        p.text(h / 4 + 1 + m / 2, m / 2, &self.text.text);
    }
}

fn min_size_statements(p: &dyn Painter, list: &[Statement]) -> Size {
    min_size_block(p.line_height(), &statement_sizes(p, list))
}

fn paint_statements(p: &mut dyn Painter, list: &[Statement], size: Size) {
    let sizes = statement_sizes(&*p, list);
    let areas = block_paint_areas(size.width, size.height, &sizes);
    for (i, (s, area)) in list.iter().zip(areas).enumerate() {
        if i > 0 {
            p.line(0, area.y - 1, size.width - 1, area.y - 1);
        }
        paint_child(p, s, area);
    }
}

impl Layout for Block {
    fn min_size(&self, p: &dyn Painter) -> Size {
        min_size_statements(p, &self.statements)
    }

    fn paint(&self, p: &mut dyn Painter, size: Size) {
        paint_statements(p, &self.statements, size);
    }
}

/// Painting shared by `If` and `IfElse`.
struct Branches<'a> {
    condition: &'a Literal,
    true_label: Option<&'a Literal>,
    then: &'a Block,
    false_label: Option<&'a Literal>,
    otherwise: &'a Block,
}

impl Layout for Branches<'_> {
    fn min_size(&self, p: &dyn Painter) -> Size {
        min_size_if_else(
            p.line_height(),
            p.text_size(&self.condition.text),
            self.then.min_size(p),
            self.otherwise.min_size(p),
        )
    }

    fn paint(&self, p: &mut dyn Painter, size: Size) {
        let m = p.line_height();
        let then_size = self.then.min_size(&*p);
        let else_size = self.otherwise.min_size(&*p);
        let block_h = then_size.height.max(else_size.height);
        let bottom = size.height - block_h - 1;
        let then_w = round(
            f64::from(then_size.width) / f64::from(then_size.width + else_size.width)
                * f64::from(size.width - 1),
        );
        let else_w = size.width - 1 - then_w;

        p.line(0, bottom, size.width - 1, bottom);
        p.line(then_w, bottom, then_w, size.height - 1);
        p.line(0, 0, then_w, bottom - 1);
        p.line(then_w, bottom - 1, size.width - 1, 0);

        let text_h = p.text_size(&self.condition.text).height.max(m);
        let text_x = (then_w * text_h).checked_div(bottom).unwrap_or(0);
        p.text(text_x + m / 4, 0, &self.condition.text);

        if let Some(label) = self.true_label.filter(|l| !l.text.is_empty()) {
            let s = p.text_size(&label.text);
            p.text(m / 4, bottom - s.height, &label.text);
        }
        if let Some(label) = self.false_label.filter(|l| !l.text.is_empty()) {
            let s = p.text_size(&label.text);
            p.text(
                size.width - 1 - m / 4 - s.width,
                bottom - s.height,
                &label.text,
            );
        }

        paint_child(p, self.then, Rect::new(0, bottom + 1, then_w, block_h));
        paint_child(
            p,
            self.otherwise,
            Rect::new(then_w + 1, bottom + 1, else_w, block_h),
        );
    }
}

impl If {
    fn branches<'a>(&'a self, empty: &'a Block) -> Branches<'a> {
        Branches {
            condition: &self.condition,
            true_label: self.true_label.as_ref(),
            then: &self.then,
            false_label: None,
            otherwise: empty,
        }
    }
}

impl Layout for If {
    fn min_size(&self, p: &dyn Painter) -> Size {
        self.branches(&Block::default()).min_size(p)
    }

    fn paint(&self, p: &mut dyn Painter, size: Size) {
        self.branches(&Block::default()).paint(p, size);
    }
}

impl IfElse {
    fn branches(&self) -> Branches<'_> {
        Branches {
            condition: &self.condition,
            true_label: self.true_label.as_ref(),
            then: &self.then,
            false_label: self.false_label.as_ref(),
            otherwise: &self.otherwise,
        }
    }
}

impl Layout for IfElse {
    fn min_size(&self, p: &dyn Painter) -> Size {
        self.branches().min_size(p)
    }

    fn paint(&self, p: &mut dyn Painter, size: Size) {
        self.branches().paint(p, size);
    }
}

fn case_label(case: &SwitchCase) -> &str {
    match &case.label {
        CaseLabel::Default => DEFAULT_CASE_LABEL,
        CaseLabel::Condition(c) => &c.text,
    }
}

impl Layout for Switch {
    fn min_size(&self, p: &dyn Painter) -> Size {
        let cases: Vec<(Size, Size)> = self
            .cases
            .iter()
            .map(|c| (p.text_size(case_label(c)), c.block.min_size(p)))
            .collect();
        min_size_switch(p.line_height(), p.text_size(&self.subject.text), &cases)
    }

    fn paint(&self, p: &mut dyn Painter, size: Size) {
        let cases: Vec<(&str, Size)> = self
            .cases
            .iter()
            .map(|c| (case_label(c), c.block.min_size(&*p)))
            .collect();
        let areas = paint_switch(p, &self.subject.text, &cases, size.width, size.height);
        for (case, area) in self.cases.iter().zip(areas) {
            paint_child(p, &case.block, area);
        }
    }
}

impl Layout for Parallel {
    fn min_size(&self, p: &dyn Painter) -> Size {
        let sizes: Vec<Size> = self.blocks.iter().map(|b| b.min_size(p)).collect();
        min_size_parallel(p.line_height(), &sizes)
    }

    fn paint(&self, p: &mut dyn Painter, size: Size) {
        let sizes: Vec<Size> = self.blocks.iter().map(|b| b.min_size(&*p)).collect();
        let areas = paint_parallel(p, &sizes, size.width, size.height);
        for (block, area) in self.blocks.iter().zip(areas) {
            paint_child(p, block, area);
        }
    }
}

impl Layout for InfiniteLoop {
    fn min_size(&self, p: &dyn Painter) -> Size {
        min_size_infinite_loop(p.line_height(), self.block.min_size(p))
    }

    fn paint(&self, p: &mut dyn Painter, size: Size) {
        let area = paint_infinite_loop_lines(p, size.width, size.height);
        paint_child(p, &self.block, area);
    }
}

impl Layout for While {
    fn min_size(&self, p: &dyn Painter) -> Size {
        min_size_while(
            p.line_height(),
            p.text_size(&self.condition.text),
            self.block.min_size(p),
        )
    }

    fn paint(&self, p: &mut dyn Painter, size: Size) {
        let area = paint_while_loop(p, &self.condition.text, size.width, size.height);
        paint_child(p, &self.block, area);
    }
}

impl Layout for DoWhile {
    fn min_size(&self, p: &dyn Painter) -> Size {
        min_size_while(
            p.line_height(),
            p.text_size(&self.condition.text),
            self.block.min_size(p),
        )
    }

    fn paint(&self, p: &mut dyn Painter, size: Size) {
        let area = paint_do_while_loop(p, &self.condition.text, size.width, size.height);
        paint_child(p, &self.block, area);
    }
}

impl Statement {
    fn layout(&self) -> &dyn Layout {
        match self {
            Statement::Instruction(x) => x,
            Statement::Call(x) => x,
            Statement::Break(x) => x,
            Statement::If(x) => x,
            Statement::IfElse(x) => x,
            Statement::Switch(x) => x,
            Statement::Parallel(x) => x,
            Statement::InfiniteLoop(x) => x,
            Statement::While(x) => x,
            Statement::DoWhile(x) => x,
        }
    }
}

impl Layout for Statement {
    fn min_size(&self, p: &dyn Painter) -> Size {
        self.layout().min_size(p)
    }

    fn paint(&self, p: &mut dyn Painter, size: Size) {
        self.layout().paint(p, size);
    }
}

/// Paints `s` with the default [`LayoutOptions`].
pub fn paint_structogram(p: &mut dyn Painter, s: &Structogram) -> Rect {
    paint_structogram_with(p, s, &LayoutOptions::default())
}

/// Paints the title, a one pixel border around the statements and the
/// statements themselves. Returns the border rectangle in painter
/// coordinates.
pub fn paint_structogram_with(
    p: &mut dyn Painter,
    s: &Structogram,
    options: &LayoutOptions,
) -> Rect {
    let mut origin = Offset::new(p, options.origin_x, options.origin_y);
    let mut top = 0;
    if let Some(title) = s.title.as_ref().filter(|t| !t.text.is_empty()) {
        origin.text(0, 0, &title.text);
        top = origin.text_size(&title.text).height + options.title_gap;
    }

    let mut body = Offset::new(&mut origin, 0, top);
    let size = min_size_statements(&body, &s.statements);
    body.rect(-1, -1, size.width + 2, size.height + 2);
    paint_statements(&mut body, &s.statements, size);

    debug!(
        width = size.width,
        height = size.height,
        statements = s.statements.len(),
        "painted structogram"
    );
    Rect::new(
        options.origin_x - 1,
        options.origin_y + top - 1,
        size.width + 2,
        size.height + 2,
    )
}

/// Parses `text` and paints it into a [`Recorder`]. The drawing size covers
/// the title and the border, measured from one pixel above and left of the
/// origin.
pub fn render_text(text: &str, options: &RenderOptions) -> Result<Drawing, Error> {
    options.validate()?;
    let s = parse_string(text)?;
    let mut recorder = Recorder::new(options.metrics);
    let border = paint_structogram_with(&mut recorder, &s, &options.layout);
    let title_w = s
        .title
        .as_ref()
        .map_or(0, |t| recorder.text_size(&t.text).width);
    debug!(ops = recorder.ops().len(), "rendered text");
    Ok(Drawing {
        width: border.width.max(title_w + 1),
        height: border.y + border.height - (options.layout.origin_y - 1),
        ops: recorder.into_ops(),
    })
}
