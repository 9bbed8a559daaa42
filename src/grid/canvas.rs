//! # Grid Canvas
//!
//! The character-grid rendering of the shared layout. Everything is
//! measured in characters of the 1×1 font and lines:
//!
//! - vertical spacing: `round(px / 20)` blank lines
//! - borders: a full-width line of `-`, `=` or `.`
//! - rows: exactly one physical line of `paperWidth` characters
//!
//! ## Row Layout
//!
//! ```text
//! space-between, 2 columns, no widths:
//! │Total                 $9.99│   gap = max(1, W - len(A) - len(B))
//!
//! everything else, each column fitted to its allotted width:
//! │Item        │ Qty│    Price│  pad/truncate per column alignment
//! ```
//!
//! Horizontal insets are ignored: a row always spans the whole paper.

use image::DynamicImage;
use tracing::debug;

use super::generator::GridGenerator;
use crate::document::{
    Alignment, Border, BorderStyle, CharSize, map_font_size_to_grid, parse_width,
};
use crate::error::{ComandaError, Result};
use crate::layout::{
    BarcodePlacement, Canvas, Column, ImagePlacement, QrPlacement, Row, RowMode, TextBlock,
};
use crate::printer::{CutOption, DOTS_PER_CHAR, GridOptions};
use crate::protocol::CodePage;
use crate::render::raster;

/// Style px per blank line.
const PX_PER_LINE: f32 = 20.0;

/// Grid rendering target.
pub struct GridCanvas {
    generator: GridGenerator,
    cut: CutOption,
    feed_before_cut: u32,
    width_dots: usize,
}

impl GridCanvas {
    pub fn new(generator: GridGenerator, options: &GridOptions) -> Self {
        Self {
            generator,
            cut: options.cut,
            feed_before_cut: options.feed_before_cut,
            width_dots: options.width_dots(),
        }
    }

    pub fn generator(&self) -> &GridGenerator {
        &self.generator
    }

    pub fn finish(self) -> Vec<u8> {
        self.generator.finish()
    }

    fn render_pair(&self, first: &Column, second: &Column) -> String {
        let width = self.generator.paper_width();
        let encoding = self.generator.encoding();
        let left = single_line(&first.text);
        let right = single_line(&second.text);
        let used = encoding.encoded_len(&left) + encoding.encoded_len(&right);
        let gap = width.saturating_sub(used).max(1);
        format!("{}{}{}", left, " ".repeat(gap), right)
    }

    fn render_fitted(&self, columns: &[Column]) -> String {
        let encoding = self.generator.encoding();
        let widths = allot_widths(columns, self.generator.paper_width());
        columns
            .iter()
            .zip(widths)
            .map(|(column, width)| fit_column(&single_line(&column.text), width, column.align, encoding))
            .collect()
    }
}

impl Canvas for GridCanvas {
    fn begin_document(&mut self) -> Result<()> {
        self.generator.init();
        Ok(())
    }

    fn end_document(&mut self) -> Result<()> {
        self.generator.reset_formatting();
        match self.cut.kind() {
            Some(kind) => self.generator.cut(kind, Some(self.feed_before_cut)),
            None => {
                let lines = self.feed_before_cut.min(u8::MAX as u32) as u8;
                self.generator.line_feeds(lines);
            }
        }
        Ok(())
    }

    fn space(&mut self, amount: f32) {
        let lines = spacing_lines(amount);
        if lines > 0 {
            self.generator.line_feeds(lines);
        }
    }

    fn divider(&mut self, border: &Border) {
        self.generator.divider(divider_char(border.style));
    }

    fn push_inset(&mut self, _left: f32, _right: f32) {}

    fn pop_inset(&mut self) {}

    fn text(&mut self, block: &TextBlock) -> Result<()> {
        let size = block
            .style
            .font_size
            .map(map_font_size_to_grid)
            .unwrap_or(CharSize::NORMAL);

        self.generator.align(block.explicit_align().unwrap_or_default());
        self.generator.style(size, block.style.is_bold());
        self.generator.text(&block.content);
        self.generator.reset_formatting();
        self.generator.newline();
        Ok(())
    }

    fn row(&mut self, row: &Row) -> Result<()> {
        let line = match (row.mode, row.columns.as_slice()) {
            (RowMode::SpaceBetween, [first, second]) => self.render_pair(first, second),
            _ => self.render_fitted(&row.columns),
        };
        debug!(mode = ?row.mode, line = %line, "grid row");

        let bold = row.columns.first().is_some_and(|c| c.style.is_bold());
        self.generator.align(Alignment::Left);
        self.generator.style(CharSize::NORMAL, bold);
        self.generator.text(&line);
        self.generator.reset_formatting();
        self.generator.newline();
        Ok(())
    }

    fn image(&mut self, image: &DynamicImage, placement: &ImagePlacement) -> Result<()> {
        let max_dots = (self.width_dots as f32 * placement.max_fraction()).floor() as usize;
        let raster = raster::prepare(image, max_dots.max(DOTS_PER_CHAR))?;
        let width = u16::try_from(raster.width)
            .map_err(|_| ComandaError::Image(format!("{} dots is too wide", raster.width)))?;
        let height = u16::try_from(raster.height)
            .map_err(|_| ComandaError::Image(format!("{} rows is too tall", raster.height)))?;

        self.generator.style(CharSize::NORMAL, false);
        self.generator.align(placement.align);
        self.generator.image(&raster, width, height);
        self.generator.newline();
        Ok(())
    }

    fn qr_code(&mut self, qr: &QrPlacement) -> Result<()> {
        self.generator.align(qr.align);
        self.generator.qr_code(qr.data.as_bytes(), qr.module_size)?;
        self.generator.newline();
        Ok(())
    }

    fn barcode(&mut self, placement: &BarcodePlacement) -> Result<()> {
        self.generator.style(CharSize::NORMAL, false);
        self.generator.align(placement.align);
        self.generator.barcode(&placement.barcode, placement.height);
        self.generator.newline();
        Ok(())
    }
}

/// Blank lines for a vertical gap in px.
pub fn spacing_lines(px: f32) -> u8 {
    if !px.is_finite() || px <= 0.0 {
        return 0;
    }
    (px / PX_PER_LINE).round().min(u8::MAX as f32) as u8
}

pub fn divider_char(style: BorderStyle) -> char {
    match style {
        BorderStyle::Solid | BorderStyle::Dashed => '-',
        BorderStyle::Double => '=',
        BorderStyle::Dotted => '.',
    }
}

/// Row cells are single-line.
fn single_line(text: &str) -> String {
    text.replace(['\n', '\r', '\t'], " ")
}

/// Character widths for each column.
///
/// Explicit widths resolve against the paper width and are clamped so the
/// running total never passes it. Columns without a width share what is
/// left equally, the last one taking the remainder.
pub fn allot_widths(columns: &[Column], paper_width: usize) -> Vec<usize> {
    let mut widths = vec![0usize; columns.len()];
    let mut used = 0usize;
    for (i, column) in columns.iter().enumerate() {
        if let Some(width) = &column.width {
            let w = parse_width(Some(width), paper_width).min(paper_width - used);
            widths[i] = w;
            used += w;
        }
    }

    let flexible: Vec<usize> = (0..columns.len())
        .filter(|&i| columns[i].width.is_none())
        .collect();
    if let Some((&last, rest)) = flexible.split_last() {
        let remaining = paper_width - used;
        let share = remaining / flexible.len();
        for &i in rest {
            widths[i] = share;
        }
        widths[last] = remaining - share * rest.len();
    }
    widths
}

/// Pad or truncate `text` to exactly `width` encoded bytes.
///
/// Truncation drops one character at a time from the end and re-measures,
/// so the result is exact whatever the encoding. Right alignment pads on
/// the left, center splits the padding floor/ceil, left pads on the right.
pub fn fit_column(text: &str, width: usize, align: Alignment, encoding: CodePage) -> String {
    let mut fitted = text.to_string();
    while encoding.encoded_len(&fitted) > width {
        fitted.pop();
    }

    let pad = width - encoding.encoded_len(&fitted);
    match align {
        Alignment::Left => format!("{}{}", fitted, " ".repeat(pad)),
        Alignment::Right => format!("{}{}", " ".repeat(pad), fitted),
        Alignment::Center => {
            let before = pad / 2;
            format!("{}{}{}", " ".repeat(before), fitted, " ".repeat(pad - before))
        }
    }
}
