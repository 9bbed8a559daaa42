//! # StarPRNT Adapter
//!
//! Command set of Star Micronics receipt printers (TSP650II, TSP700II,
//! mC-Print). Based on "StarPRNT Command Specifications Rev. 4.10".
//!
//! | Operation | Bytes |
//! |-----------|-------|
//! | init | `ESC @`, `ESC GS t n` |
//! | align | `ESC GS a n` |
//! | size + bold | `ESC i h w`, `ESC E` / `ESC F` |
//! | line spacing | `ESC 3 n` / `ESC z 1` |
//! | cut | `ESC a n` feed, then `ESC d 2/3`; `ESC d 0/1` in place |
//! | QR | `ESC GS y S 0/1/2`, `ESC GS y D 1`, `ESC GS y P` |
//! | raster | `ESC GS S 1 xL xH yL yH 0` |
//! | barcode | `ESC b n1 n2 n3 n4 data RS` |
//!
//! Unlike ESC/POS, size multipliers are zero-based: `ESC i 0 0` is 1×1.

use super::adapter::{CommandAdapter, CutKind};
use super::barcode::{Barcode, Symbology};
use super::codepage::CodePage;
use super::commands::{self, ESC, GS, QR_MAX_PAYLOAD, RS, clamp_u8, u16_le};
use crate::document::{Alignment, CharSize};
use crate::error::{ComandaError, Result};

/// StarPRNT command strategy.
#[derive(Debug, Default, Clone, Copy)]
pub struct StarPrnt;

/// `ESC GS t n` table numbers.
fn code_page_number(page: CodePage) -> u8 {
    match page {
        CodePage::Cp437 => 1,
        CodePage::Cp860 => 5,
        CodePage::Cp1252 => 32,
    }
}

/// `ESC b` barcode type (n1).
fn symbology_number(symbology: Symbology) -> u8 {
    match symbology {
        Symbology::UpcA => 49,
        Symbology::Ean8 => 50,
        Symbology::Ean13 => 51,
        Symbology::Code39 => 52,
        Symbology::Itf => 53,
        Symbology::Code128 => 54,
    }
}

impl CommandAdapter for StarPrnt {
    fn name(&self) -> &'static str {
        "StarPRNT"
    }

    fn init(&self, page: CodePage) -> Vec<u8> {
        let mut cmd = commands::reset();
        cmd.extend(self.code_page(page));
        cmd
    }

    fn code_page(&self, page: CodePage) -> Vec<u8> {
        vec![ESC, GS, b't', code_page_number(page)]
    }

    fn align(&self, alignment: Alignment) -> Vec<u8> {
        let n = match alignment {
            Alignment::Left => 0,
            Alignment::Center => 1,
            Alignment::Right => 2,
        };
        vec![ESC, GS, b'a', n]
    }

    fn character_size(&self, size: CharSize, bold: bool) -> Vec<u8> {
        let h = size.height.clamp(1, 2) - 1;
        let w = size.width.clamp(1, 2) - 1;
        let mut cmd = vec![ESC, b'i', h, w];
        cmd.extend_from_slice(&[ESC, if bold { b'E' } else { b'F' }]);
        cmd
    }

    fn line_spacing(&self, dots: Option<u32>) -> Vec<u8> {
        match dots {
            Some(dots) => vec![ESC, b'3', clamp_u8(dots)],
            // 4 mm pitch, the power-on default
            None => vec![ESC, b'z', 1],
        }
    }

    fn cut(&self, kind: CutKind, feed_lines: Option<u32>) -> Vec<u8> {
        match feed_lines {
            Some(n) => {
                let mut cmd = vec![ESC, b'a', clamp_u8(n)];
                cmd.extend_from_slice(&[ESC, b'd', if kind == CutKind::Full { 2 } else { 3 }]);
                cmd
            }
            None => vec![ESC, b'd', if kind == CutKind::Full { 0 } else { 1 }],
        }
    }

    fn qr_code(&self, data: &[u8], module_size: u8) -> Result<Vec<u8>> {
        if data.is_empty() || data.len() > QR_MAX_PAYLOAD {
            return Err(ComandaError::QrCode(format!(
                "payload of {} bytes does not fit a QR symbol",
                data.len()
            )));
        }

        let [nl, nh] = u16_le(data.len() as u16);
        let mut cmd = Vec::with_capacity(data.len() + 30);
        cmd.extend_from_slice(&[ESC, GS, b'y', b'S', b'0', 2]); // model 2
        cmd.extend_from_slice(&[ESC, GS, b'y', b'S', b'1', 1]); // error correction M
        cmd.extend_from_slice(&[ESC, GS, b'y', b'S', b'2', module_size.clamp(1, 8)]);
        // m = 0: let the printer pick numeric/alphanumeric/binary
        cmd.extend_from_slice(&[ESC, GS, b'y', b'D', b'1', 0, nl, nh]);
        cmd.extend_from_slice(data);
        cmd.extend_from_slice(&[ESC, GS, b'y', b'P']);
        Ok(cmd)
    }

    fn raster_image(&self, bitmap: &[u8], width_dots: u16, height: u16) -> Vec<u8> {
        let width_bytes = width_dots.div_ceil(8) as usize;
        debug_assert_eq!(bitmap.len(), width_bytes * height as usize);

        let mut cmd = Vec::with_capacity(bitmap.len() + 16);
        for (rows, chunk) in commands::raster_chunks(bitmap, width_bytes) {
            let [xl, xh] = u16_le(width_bytes as u16);
            let [yl, yh] = u16_le(rows);
            // m = 1 monochrome, n = 0 black
            cmd.extend_from_slice(&[ESC, GS, b'S', 1, xl, xh, yl, yh, 0]);
            cmd.extend_from_slice(chunk);
        }
        cmd
    }

    fn barcode(&self, barcode: &Barcode, height: u8) -> Vec<u8> {
        let n1 = symbology_number(barcode.symbology());
        let n2 = b'4'; // HRI under the bars, no line feed
        let n3 = b'1'; // 2-dot module
        let n4 = height.max(1);

        let data = barcode.as_bytes();
        let mut cmd = Vec::with_capacity(6 + data.len() + 1);
        cmd.extend_from_slice(&[ESC, b'b', n1, n2, n3, n4]);
        cmd.extend_from_slice(data);
        cmd.push(RS);
        cmd
    }
}
