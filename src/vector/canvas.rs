//! # Vector Canvas
//!
//! Continuous rendering of the shared layout onto point coordinates.
//! Style lengths are read as points. Text is measured with the Helvetica
//! metrics, so rows can anchor columns exactly:
//!
//! ```text
//! explicit widths   │Item·········│Qty··│Price···│   cumulative x
//! center            │      A  B  C       │          group centered
//! space-between     │A        B         C│          first left, last right
//! fallback          │A      │B      │C     │        equal slots
//! ```

use image::DynamicImage;
use qrcode::QrCode;
use tracing::debug;

use super::generator::{PdfDocument, VectorGenerator};
use super::metrics;
use crate::document::{Border, PrintNode, TextStyle, Width};
use crate::error::{ComandaError, Result};
use crate::layout::{
    BarcodePlacement, Canvas, Column, ImagePlacement, QrPlacement, Row, RowMode, TextBlock,
};
use crate::printer::PaperHeight;
use crate::render::flatten_on_white;

/// Points per CSS pixel.
const PT_PER_PX: f32 = 0.75;
/// Points per printer dot at 203 dpi.
const PT_PER_DOT: f32 = 72.0 / 203.0;
/// Horizontal gap between centered row columns.
const COLUMN_GAP: f32 = 8.0;
/// Widest barcode module.
const MAX_BAR_WIDTH: f32 = 1.0;
const CAPTION_SIZE: f32 = 8.0;

/// Horizontal anchor of one row column.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Anchor {
    /// Text starts at x.
    Left(f32),
    /// Text ends at x.
    Right(f32),
}

/// PDF rendering target.
pub struct VectorCanvas {
    generator: VectorGenerator,
    fixed_height: bool,
    pages_started: usize,
}

impl VectorCanvas {
    pub fn new(generator: VectorGenerator, paper_height: PaperHeight) -> Self {
        Self {
            generator,
            fixed_height: matches!(paper_height, PaperHeight::Fixed(_)),
            pages_started: 0,
        }
    }

    pub fn generator(&self) -> &VectorGenerator {
        &self.generator
    }

    pub fn finish(self) -> Result<PdfDocument> {
        self.generator.finish()
    }

    fn set_text_font(&mut self, style: &TextStyle) {
        let size = style.font_size.unwrap_or(VectorGenerator::DEFAULT_FONT_SIZE);
        self.generator.set_font(size, style.is_bold());
    }

    /// Draw each column in the shared line box. Every draw sets its own font.
    fn draw_columns(&mut self, columns: &[Column], anchors: &[Anchor], line_height: f32) {
        for (column, anchor) in columns.iter().zip(anchors) {
            self.set_text_font(&column.style);
            let text = single_line(&column.text);
            match *anchor {
                Anchor::Left(x) => self.generator.text_in_box(x, &text, line_height),
                Anchor::Right(x) => self.generator.text_right(x, &text, line_height),
            }
        }
    }

    fn measure(&self, column: &Column) -> f32 {
        let size = column
            .style
            .font_size
            .unwrap_or(VectorGenerator::DEFAULT_FONT_SIZE);
        metrics::text_width(&single_line(&column.text), size, column.style.is_bold())
    }

    fn explicit_offsets(&self, columns: &[Column]) -> Vec<Anchor> {
        let total = self.generator.content_width();
        let fixed: f32 = columns
            .iter()
            .filter_map(|c| c.width.as_ref())
            .map(|w| w.resolve(total).max(0.0))
            .sum();
        let flexible = columns.iter().filter(|c| c.width.is_none()).count();
        let share = if flexible > 0 {
            (total - fixed).max(0.0) / flexible as f32
        } else {
            0.0
        };

        let mut x = self.generator.left();
        columns
            .iter()
            .map(|column| {
                let at = x;
                x += column.width.map_or(share, |w| w.resolve(total).max(0.0));
                Anchor::Left(at)
            })
            .collect()
    }

    fn centered_offsets(&self, columns: &[Column]) -> Vec<Anchor> {
        let widths: Vec<f32> = columns.iter().map(|c| self.measure(c)).collect();
        let group = widths.iter().sum::<f32>() + COLUMN_GAP * (widths.len().saturating_sub(1)) as f32;
        let free = (self.generator.content_width() - group).max(0.0);
        let mut x = self.generator.left() + free / 2.0;
        widths
            .iter()
            .map(|w| {
                let at = x;
                x += w + COLUMN_GAP;
                Anchor::Left(at)
            })
            .collect()
    }

    fn spread_offsets(&self, columns: &[Column]) -> Vec<Anchor> {
        let left = self.generator.left();
        let right = self.generator.right();
        let span = right - left;
        let last = columns.len().saturating_sub(1);
        columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                if i == 0 {
                    Anchor::Left(left)
                } else if i == last {
                    Anchor::Right(right)
                } else {
                    let center = left + span * i as f32 / last as f32;
                    Anchor::Left((center - self.measure(column) / 2.0).max(left))
                }
            })
            .collect()
    }

    fn even_offsets(&self, columns: &[Column]) -> Vec<Anchor> {
        let slot = self.generator.content_width() / columns.len().max(1) as f32;
        let left = self.generator.left();
        (0..columns.len())
            .map(|i| Anchor::Left(left + slot * i as f32))
            .collect()
    }
}

impl Canvas for VectorCanvas {
    fn begin_document(&mut self) -> Result<()> {
        Ok(())
    }

    fn end_document(&mut self) -> Result<()> {
        debug!(pages = self.generator.pages().len(), "vector layout done");
        Ok(())
    }

    fn begin_page(&mut self, page: &PrintNode) -> Result<()> {
        if self.pages_started == 0 {
            if let Some((width, height)) = page.page_size() {
                self.generator.set_page_size(width, height)?;
                self.fixed_height = height.is_some();
            }
        } else if self.fixed_height && !self.generator.is_blank() {
            self.generator.new_page();
        }
        self.generator.set_wrap(page.page_wraps());
        self.pages_started += 1;
        Ok(())
    }

    fn space(&mut self, amount: f32) {
        self.generator.advance(amount);
    }

    fn divider(&mut self, border: &Border) {
        self.generator.rule(border.width, border.style);
    }

    fn push_inset(&mut self, left: f32, right: f32) {
        self.generator.push_margin(left, right);
    }

    fn pop_inset(&mut self) {
        self.generator.pop_margin();
    }

    fn text(&mut self, block: &TextBlock) -> Result<()> {
        self.set_text_font(&block.style);
        self.generator.set_align(block.resolved_align());

        let size = self.generator.font_size();
        let lines = metrics::wrap(
            &block.content,
            size,
            block.style.is_bold(),
            self.generator.content_width(),
        );
        for line in lines {
            if line.is_empty() {
                self.generator.advance(self.generator.line_height());
            } else {
                self.generator.text_line(&line);
            }
        }
        Ok(())
    }

    fn row(&mut self, row: &Row) -> Result<()> {
        let Some(first) = row.columns.first() else {
            return Ok(());
        };
        let size = first
            .style
            .font_size
            .unwrap_or(VectorGenerator::DEFAULT_FONT_SIZE);
        let line_height = size * VectorGenerator::LINE_HEIGHT;

        // Every column shares the first column's line box.
        self.generator.set_font(size, first.style.is_bold());
        self.generator.ensure_space(line_height);

        let anchors = match row.mode {
            RowMode::Explicit => self.explicit_offsets(&row.columns),
            RowMode::Center => self.centered_offsets(&row.columns),
            RowMode::SpaceBetween => self.spread_offsets(&row.columns),
            RowMode::Even => self.even_offsets(&row.columns),
        };
        debug!(mode = ?row.mode, ?anchors, "vector row");
        self.draw_columns(&row.columns, &anchors, line_height);

        self.generator.advance(line_height);
        Ok(())
    }

    fn image(&mut self, image: &DynamicImage, placement: &ImagePlacement) -> Result<()> {
        let (px_w, px_h) = (image.width(), image.height());
        if px_w == 0 || px_h == 0 {
            return Err(ComandaError::Image("image has no pixels".into()));
        }

        let mut width = (px_w as f32 * PT_PER_PX)
            .min(self.generator.content_width() * placement.max_fraction());
        if let Some(Width::Absolute(points)) = placement.width {
            width = width.min(points);
        }
        if width <= 0.0 {
            return Err(ComandaError::Image("no room for image".into()));
        }
        let height = width * px_h as f32 / px_w as f32;

        self.generator.ensure_space(height);
        let x = self.generator.aligned_x(width, placement.align);
        self.generator.image(flatten_on_white(image), x, width, height);
        self.generator.advance(height);
        Ok(())
    }

    fn qr_code(&mut self, qr: &QrPlacement) -> Result<()> {
        let code = QrCode::new(qr.data.as_bytes())
            .map_err(|e| ComandaError::QrCode(format!("QR code generation failed: {}", e)))?;
        let modules = code.width();
        let colors = code.to_colors();

        let fit = self.generator.content_width() / modules as f32;
        let module = (qr.module_size.max(1) as f32 * PT_PER_PX).min(fit);
        let side = module * modules as f32;

        self.generator.ensure_space(side);
        let x = self.generator.aligned_x(side, qr.align);
        for (row, cells) in colors.chunks(modules).enumerate() {
            let dark: Vec<bool> = cells.iter().map(|c| *c == qrcode::Color::Dark).collect();
            for (start, len) in dark_runs(&dark) {
                self.generator.rect(
                    x + start as f32 * module,
                    row as f32 * module,
                    len as f32 * module,
                    module,
                );
            }
        }
        self.generator.advance(side);
        Ok(())
    }

    fn barcode(&mut self, placement: &BarcodePlacement) -> Result<()> {
        let bars = placement.barcode.modules()?;
        if bars.is_empty() {
            return Ok(());
        }
        let bar = (self.generator.content_width() / bars.len() as f32).min(MAX_BAR_WIDTH);
        let width = bar * bars.len() as f32;
        let height = placement.height.max(1) as f32 * PT_PER_DOT;
        let caption_height = CAPTION_SIZE * VectorGenerator::LINE_HEIGHT;

        self.generator.ensure_space(height + caption_height);
        let x = self.generator.aligned_x(width, placement.align);
        let dark: Vec<bool> = bars.iter().map(|m| *m == 1).collect();
        for (start, len) in dark_runs(&dark) {
            self.generator
                .rect(x + start as f32 * bar, 0.0, len as f32 * bar, height);
        }
        self.generator.advance(height);

        let caption = placement.barcode.data();
        self.generator.set_font(CAPTION_SIZE, false);
        let caption_width = self.generator.measure(caption);
        self.generator
            .text_at(x + ((width - caption_width) / 2.0).max(0.0), caption);
        self.generator.advance(caption_height);
        Ok(())
    }
}

/// Row cells are single-line.
fn single_line(text: &str) -> String {
    text.replace(['\n', '\r', '\t'], " ")
}

/// `(start, length)` of each run of `true`.
fn dark_runs(cells: &[bool]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, dark) in cells.iter().enumerate() {
        match (dark, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push((s, i - s));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push((s, cells.len() - s));
    }
    runs
}
