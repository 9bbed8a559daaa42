//! # Grid Generator
//!
//! A growable byte buffer plus the formatting state the printer is in.
//! Style setters compare against that state and emit nothing when the
//! requested value is already active, so callers can state the formatting
//! they want before every write without bloating the output.
//!
//! ```
//! use comanda::document::{Alignment, CharSize};
//! use comanda::grid::GridGenerator;
//! use comanda::printer::GridOptions;
//!
//! let mut generator = GridGenerator::new(&GridOptions::default());
//! generator.init();
//! let before = generator.len();
//! generator.align(Alignment::Left); // already left
//! generator.size(CharSize::NORMAL); // already 1×1
//! assert_eq!(generator.len(), before);
//! ```

use tracing::debug;

use crate::document::{Alignment, CharSize};
use crate::error::Result;
use crate::printer::GridOptions;
use crate::protocol::commands::LF;
use crate::protocol::{Barcode, CodePage, CommandAdapter, CutKind};
use crate::render::Raster;

/// Formatting the printer currently has active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StyleState {
    pub align: Alignment,
    pub bold: bool,
    pub size: CharSize,
}

/// Stateful byte emitter for one grid conversion.
pub struct GridGenerator {
    adapter: Box<dyn CommandAdapter>,
    encoding: CodePage,
    paper_width: usize,
    buf: Vec<u8>,
    state: StyleState,
}

impl GridGenerator {
    pub fn new(options: &GridOptions) -> Self {
        Self::with_adapter(
            options.command_adapter.build(),
            options.encoding,
            options.paper_width,
        )
    }

    pub fn with_adapter(
        adapter: Box<dyn CommandAdapter>,
        encoding: CodePage,
        paper_width: usize,
    ) -> Self {
        Self {
            adapter,
            encoding,
            paper_width,
            buf: Vec::with_capacity(4096),
            state: StyleState::default(),
        }
    }

    #[inline]
    pub fn paper_width(&self) -> usize {
        self.paper_width
    }

    #[inline]
    pub fn encoding(&self) -> CodePage {
        self.encoding
    }

    pub fn state(&self) -> StyleState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Reset the printer and select the code page. Formatting state returns
    /// to defaults.
    pub fn init(&mut self) {
        debug!(adapter = self.adapter.name(), encoding = ?self.encoding, "init");
        self.buf.extend(self.adapter.init(self.encoding));
        self.state = StyleState::default();
    }

    pub fn align(&mut self, align: Alignment) {
        if self.state.align != align {
            self.buf.extend(self.adapter.align(align));
            self.state.align = align;
        }
    }

    pub fn bold(&mut self, bold: bool) {
        self.style(self.state.size, bold);
    }

    pub fn size(&mut self, size: CharSize) {
        self.style(size, self.state.bold);
    }

    /// Size and emphasis travel in one command; emitted only on change.
    pub fn style(&mut self, size: CharSize, bold: bool) {
        let size = CharSize::new(size.width, size.height);
        if self.state.size != size || self.state.bold != bold {
            self.buf.extend(self.adapter.character_size(size, bold));
            self.state.size = size;
            self.state.bold = bold;
        }
    }

    /// Back to left-aligned, regular weight, 1×1.
    pub fn reset_formatting(&mut self) {
        self.style(CharSize::NORMAL, false);
        self.align(Alignment::Left);
    }

    /// Encode and append text. No line feed.
    pub fn text(&mut self, text: &str) {
        self.buf.extend(self.encoding.encode(text));
    }

    pub fn newline(&mut self) {
        self.buf.push(LF);
    }

    pub fn line_feeds(&mut self, n: u8) {
        self.buf.extend(self.adapter.line_feed(n));
    }

    /// A full-width line of `ch`, left aligned at normal size.
    pub fn divider(&mut self, ch: char) {
        self.reset_formatting();
        let line: String = std::iter::repeat_n(ch, self.paper_width).collect();
        self.text(&line);
        self.newline();
    }

    /// Native QR symbol. Nothing is written when the payload is rejected.
    pub fn qr_code(&mut self, data: &[u8], module_size: u8) -> Result<()> {
        let cmd = self.adapter.qr_code(data, module_size)?;
        self.buf.extend(cmd);
        Ok(())
    }

    pub fn barcode(&mut self, barcode: &Barcode, height: u8) {
        self.buf.extend(self.adapter.barcode(barcode, height));
    }

    /// Raster image. Dimensions are checked by the caller.
    pub fn image(&mut self, raster: &Raster, width: u16, height: u16) {
        self.buf
            .extend(self.adapter.raster_image(&raster.data, width, height));
    }

    pub fn line_spacing(&mut self, dots: Option<u32>) {
        self.buf.extend(self.adapter.line_spacing(dots));
    }

    /// Escape hatch: append bytes untouched. Formatting state is not updated.
    pub fn raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn cut(&mut self, kind: CutKind, feed_lines: Option<u32>) {
        self.buf.extend(self.adapter.cut(kind, feed_lines));
    }

    /// Extract the buffer, dropping any line feeds before the first command
    /// or character.
    pub fn finish(self) -> Vec<u8> {
        let start = self
            .buf
            .iter()
            .position(|&b| b != LF)
            .unwrap_or(self.buf.len());
        let mut buf = self.buf;
        buf.drain(..start);
        buf
    }
}
