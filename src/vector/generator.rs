//! # Vector Generator
//!
//! Stateful point-coordinate emitter. Drawing calls append to a display
//! list in top-down coordinates (y grows down the page, like the layout);
//! [`VectorGenerator::finish`] converts to PDF space and serializes.
//!
//! ## Page Height
//!
//! - **Auto**: one page, cropped to the content height plus the bottom
//!   margin once layout is done.
//! - **Fixed**: content flows onto new pages when the cursor reaches the
//!   bottom margin, unless wrapping was turned off for the page.

use image::GrayImage;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use tracing::debug;

use super::metrics;
use crate::document::{Alignment, BorderStyle};
use crate::error::{ComandaError, Result};
use crate::printer::{PaperHeight, VectorOptions};
use crate::protocol::CodePage;

/// Baseline position within a line box, as a fraction of line height.
const BASELINE: f32 = 0.8;
/// Helvetica descender depth as a fraction of font size.
const DESCENT: f32 = 0.21;

/// One drawing primitive in top-down page coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        /// Baseline.
        y: f32,
        size: f32,
        bold: bool,
        text: String,
    },
    Rule {
        x: f32,
        y: f32,
        width: f32,
        thickness: f32,
        style: BorderStyle,
    },
    /// Filled black rectangle; `y` is the top edge.
    Rect { x: f32, y: f32, w: f32, h: f32 },
    /// Index into the generator's image list; `y` is the top edge.
    Image {
        index: usize,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
    },
}

/// Serialized output of a vector conversion.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    bytes: Vec<u8>,
    width: f32,
    height: f32,
    page_count: usize,
}

impl PdfDocument {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Page width in points.
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Page height in points (all pages share it).
    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }
}

/// Display-list builder for one vector conversion.
pub struct VectorGenerator {
    width: f32,
    height: PaperHeight,
    margin: f32,
    wrap: bool,
    pages: Vec<Vec<DrawOp>>,
    images: Vec<GrayImage>,
    cursor: f32,
    /// Lowest point drawn on the current page.
    extent: f32,
    /// Cumulative (left, right) insets; the last entry is current.
    insets: Vec<(f32, f32)>,
    font_size: f32,
    bold: bool,
    align: Alignment,
}

impl VectorGenerator {
    pub const DEFAULT_FONT_SIZE: f32 = 10.0;
    pub const LINE_HEIGHT: f32 = 1.2;

    pub fn new(options: &VectorOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            width: options.paper_width,
            height: options.paper_height,
            margin: options.margin,
            wrap: true,
            pages: vec![Vec::new()],
            images: Vec::new(),
            cursor: options.margin,
            extent: options.margin,
            insets: Vec::new(),
            font_size: Self::DEFAULT_FONT_SIZE,
            bold: false,
            align: Alignment::Left,
        })
    }

    /// Nothing has been drawn yet.
    pub fn is_blank(&self) -> bool {
        self.pages.len() == 1 && self.pages[0].is_empty() && self.cursor <= self.margin
    }

    /// Replace the page size. Only honored before anything is drawn.
    pub fn set_page_size(&mut self, width: f32, height: Option<f32>) -> Result<()> {
        if !self.is_blank() {
            debug!("ignoring page size after content");
            return Ok(());
        }
        let options = VectorOptions {
            paper_width: width,
            paper_height: height.map_or(PaperHeight::Auto, PaperHeight::Fixed),
            margin: self.margin,
        };
        options.validate()?;
        self.width = width;
        self.height = options.paper_height;
        Ok(())
    }

    pub fn set_wrap(&mut self, wrap: bool) {
        self.wrap = wrap;
    }

    pub fn set_font(&mut self, size: f32, bold: bool) {
        self.font_size = if size.is_finite() && size > 0.0 {
            size
        } else {
            Self::DEFAULT_FONT_SIZE
        };
        self.bold = bold;
    }

    pub fn set_align(&mut self, align: Alignment) {
        self.align = align;
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn line_height(&self) -> f32 {
        self.font_size * Self::LINE_HEIGHT
    }

    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    pub fn page_width(&self) -> f32 {
        self.width
    }

    // ===== Horizontal geometry =====

    pub fn push_margin(&mut self, left: f32, right: f32) {
        let (l, r) = self.insets.last().copied().unwrap_or((0.0, 0.0));
        self.insets.push((l + left.max(0.0), r + right.max(0.0)));
    }

    pub fn pop_margin(&mut self) {
        self.insets.pop();
    }

    /// Left edge of the content area.
    pub fn left(&self) -> f32 {
        self.margin + self.insets.last().map_or(0.0, |(l, _)| *l)
    }

    /// Right edge of the content area.
    pub fn right(&self) -> f32 {
        let right = self.width - self.margin - self.insets.last().map_or(0.0, |(_, r)| *r);
        right.max(self.left())
    }

    pub fn content_width(&self) -> f32 {
        self.right() - self.left()
    }

    /// X position for an item `width` wide under the current alignment.
    pub fn aligned_x(&self, width: f32, align: Alignment) -> f32 {
        let free = (self.content_width() - width).max(0.0);
        match align {
            Alignment::Left => self.left(),
            Alignment::Center => self.left() + free / 2.0,
            Alignment::Right => self.left() + free,
        }
    }

    // ===== Vertical flow =====

    fn bottom_limit(&self) -> Option<f32> {
        match self.height {
            PaperHeight::Fixed(h) if self.wrap => Some(h - self.margin),
            _ => None,
        }
    }

    /// Move down by `dy`, never past the page bottom.
    pub fn advance(&mut self, dy: f32) {
        if !dy.is_finite() || dy <= 0.0 {
            return;
        }
        self.cursor += dy;
        if let Some(limit) = self.bottom_limit()
            && self.cursor > limit
        {
            self.new_page();
        }
    }

    /// Start a new page when a block `height` tall would cross the bottom.
    pub fn ensure_space(&mut self, height: f32) {
        if let Some(limit) = self.bottom_limit()
            && self.cursor + height > limit
            && self.cursor > self.margin
        {
            self.new_page();
        }
    }

    pub fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.cursor = self.margin;
        self.extent = self.margin;
    }

    fn push(&mut self, op: DrawOp, bottom: f32) {
        self.extent = self.extent.max(bottom);
        if let Some(page) = self.pages.last_mut() {
            page.push(op);
        }
    }

    // ===== Drawing =====

    /// Draw one line of text at the current line with the current font.
    pub fn text_at(&mut self, x: f32, text: &str) {
        self.text_in_box(x, text, self.line_height());
    }

    /// Draw text on the baseline of a line box `line_height` tall, which
    /// may belong to a different font size than the current one.
    pub fn text_in_box(&mut self, x: f32, text: &str, line_height: f32) {
        let y = self.cursor + line_height * BASELINE;
        // Descenders of a font larger than the box still count toward the extent.
        let bottom = (self.cursor + line_height).max(y + self.font_size * DESCENT);
        self.push(
            DrawOp::Text {
                x,
                y,
                size: self.font_size,
                bold: self.bold,
                text: text.to_string(),
            },
            bottom,
        );
    }

    /// Draw text in a line box so it ends at `right`.
    pub fn text_right(&mut self, right: f32, text: &str, line_height: f32) {
        let width = metrics::text_width(text, self.font_size, self.bold);
        self.text_in_box(right - width, text, line_height);
    }

    /// Draw a line of text placed by the current alignment, then advance.
    pub fn text_line(&mut self, text: &str) {
        let line_height = self.line_height();
        self.ensure_space(line_height);
        let width = metrics::text_width(text, self.font_size, self.bold);
        let x = self.aligned_x(width, self.align);
        self.text_at(x, text);
        self.advance(line_height);
    }

    pub fn measure(&self, text: &str) -> f32 {
        metrics::text_width(text, self.font_size, self.bold)
    }

    /// Horizontal rule across the content area at the cursor. Does not advance.
    pub fn rule(&mut self, thickness: f32, style: BorderStyle) {
        let op = DrawOp::Rule {
            x: self.left(),
            y: self.cursor,
            width: self.content_width(),
            thickness: thickness.max(0.1),
            style,
        };
        self.push(op, self.cursor + thickness);
    }

    /// Filled rectangle relative to the cursor.
    pub fn rect(&mut self, x: f32, dy: f32, w: f32, h: f32) {
        let y = self.cursor + dy;
        self.push(DrawOp::Rect { x, y, w, h }, y + h);
    }

    /// Place a grayscale image with its top edge at the cursor.
    pub fn image(&mut self, image: GrayImage, x: f32, w: f32, h: f32) {
        let index = self.images.len();
        self.images.push(image);
        let y = self.cursor;
        self.push(DrawOp::Image { index, x, y, w, h }, y + h);
    }

    pub fn pages(&self) -> &[Vec<DrawOp>] {
        &self.pages
    }

    /// Final page height for the current settings.
    pub fn measured_height(&self) -> f32 {
        match self.height {
            PaperHeight::Fixed(h) => h,
            PaperHeight::Auto => (self.extent.max(self.cursor) + self.margin).max(2.0 * self.margin + 1.0),
        }
    }

    // ===== Serialization =====

    /// Serialize the display list to PDF.
    pub fn finish(self) -> Result<PdfDocument> {
        let width = self.width;
        let height = self.measured_height();
        if !height.is_finite() || height <= 0.0 {
            return Err(ComandaError::InvalidPaper(format!("page height {}", height)));
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });

        let image_ids: Vec<ObjectId> = self
            .images
            .into_iter()
            .map(|img| {
                let stream = Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => img.width() as i64,
                        "Height" => img.height() as i64,
                        "ColorSpace" => "DeviceGray",
                        "BitsPerComponent" => 8,
                    },
                    img.into_raw(),
                );
                doc.add_object(stream)
            })
            .collect();

        let mut xobjects = Dictionary::new();
        for (i, id) in image_ids.iter().enumerate() {
            xobjects.set(format!("Im{}", i), *id);
        }
        let resources = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular,
                "F2" => bold,
            },
            "XObject" => xobjects,
        });

        let page_count = self.pages.len();
        let mut kids = Vec::with_capacity(page_count);
        for ops in &self.pages {
            let content = Content {
                operations: page_operations(ops, height),
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources,
            });
            kids.push(Object::from(page_id));
        }

        doc.set_object(
            pages_id,
            dictionary! {
                "Type" => "Pages",
                "Count" => page_count as i64,
                "Kids" => kids,
                "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            },
        );

        let catalog = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog);

        let date = chrono::Utc::now().format("D:%Y%m%d%H%M%SZ").to_string();
        let info = doc.add_object(dictionary! {
            "Producer" => Object::string_literal(concat!("comanda ", env!("CARGO_PKG_VERSION"))),
            "CreationDate" => Object::string_literal(date),
        });
        doc.trailer.set("Info", info);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        debug!(pages = page_count, width, height, bytes = bytes.len(), "pdf written");

        Ok(PdfDocument {
            bytes,
            width,
            height,
            page_count,
        })
    }
}

/// Content stream operators for one page, flipping y into PDF space.
fn page_operations(ops: &[DrawOp], page_height: f32) -> Vec<Operation> {
    let flip = |y: f32| page_height - y;
    let mut out = vec![
        Operation::new("g", vec![0.into()]),
        Operation::new("G", vec![0.into()]),
    ];

    for op in ops {
        match op {
            DrawOp::Text {
                x,
                y,
                size,
                bold,
                text,
            } => {
                let font = if *bold { "F2" } else { "F1" };
                out.push(Operation::new("BT", vec![]));
                out.push(Operation::new("Tf", vec![font.into(), (*size).into()]));
                out.push(Operation::new("Td", vec![(*x).into(), flip(*y).into()]));
                out.push(Operation::new(
                    "Tj",
                    vec![Object::String(
                        CodePage::Cp1252.encode(text),
                        StringFormat::Literal,
                    )],
                ));
                out.push(Operation::new("ET", vec![]));
            }
            DrawOp::Rule {
                x,
                y,
                width,
                thickness,
                style,
            } => rule_operations(&mut out, *x, flip(*y), *width, *thickness, *style),
            DrawOp::Rect { x, y, w, h } => {
                out.push(Operation::new(
                    "re",
                    vec![(*x).into(), flip(y + h).into(), (*w).into(), (*h).into()],
                ));
                out.push(Operation::new("f", vec![]));
            }
            DrawOp::Image { index, x, y, w, h } => {
                out.push(Operation::new("q", vec![]));
                out.push(Operation::new(
                    "cm",
                    vec![
                        (*w).into(),
                        0.into(),
                        0.into(),
                        (*h).into(),
                        (*x).into(),
                        flip(y + h).into(),
                    ],
                ));
                out.push(Operation::new("Do", vec![Object::Name(format!("Im{}", index).into_bytes())]));
                out.push(Operation::new("Q", vec![]));
            }
        }
    }
    out
}

fn rule_operations(
    out: &mut Vec<Operation>,
    x: f32,
    y: f32,
    width: f32,
    thickness: f32,
    style: BorderStyle,
) {
    let dash: Vec<Object> = match style {
        BorderStyle::Dashed => vec![(thickness * 3.0).into(), (thickness * 2.0).into()],
        BorderStyle::Dotted => vec![thickness.into(), thickness.into()],
        BorderStyle::Solid | BorderStyle::Double => vec![],
    };
    let strokes: Vec<f32> = match style {
        // Two hairlines with a gap of one thickness between them.
        BorderStyle::Double => vec![y, y - thickness * 2.0],
        _ => vec![y],
    };

    out.push(Operation::new("q", vec![]));
    out.push(Operation::new("w", vec![thickness.into()]));
    out.push(Operation::new("d", vec![Object::Array(dash), 0.into()]));
    for sy in strokes {
        out.push(Operation::new("m", vec![x.into(), sy.into()]));
        out.push(Operation::new("l", vec![(x + width).into(), sy.into()]));
        out.push(Operation::new("S", vec![]));
    }
    out.push(Operation::new("Q", vec![]));
}
