//! # ESC/POS Adapter
//!
//! The de-facto standard command set for receipt printers.
//!
//! | Operation | Bytes |
//! |-----------|-------|
//! | init | `ESC @`, `ESC t n` |
//! | align | `ESC a n` |
//! | size + bold | `ESC ! n` (0x08 emphasis, 0x10 double height, 0x20 double width) |
//! | line spacing | `ESC 3 n` / `ESC 2` |
//! | cut | `GS V 65/66 n` with feed, `GS V 0/1` without |
//! | QR | `GS ( k` function 165/167/169/180/181 |
//! | raster | `GS v 0` |
//! | barcode | `GS h`, `GS w`, `GS H`, `GS k m n data` |

use super::adapter::{CommandAdapter, CutKind};
use super::barcode::{Barcode, Symbology, code128_escaped};
use super::codepage::CodePage;
use super::commands::{self, ESC, GS, QR_MAX_PAYLOAD, clamp_u8, u16_le};
use crate::document::{Alignment, CharSize};
use crate::error::{ComandaError, Result};

/// ESC/POS command strategy.
#[derive(Debug, Default, Clone, Copy)]
pub struct EscPos;

/// `ESC t n` table numbers.
fn code_page_number(page: CodePage) -> u8 {
    match page {
        CodePage::Cp437 => 0,
        CodePage::Cp860 => 3,
        CodePage::Cp1252 => 16,
    }
}

/// `GS k` function B symbology numbers.
fn symbology_number(symbology: Symbology) -> u8 {
    match symbology {
        Symbology::UpcA => 65,
        Symbology::Ean13 => 67,
        Symbology::Ean8 => 68,
        Symbology::Code39 => 69,
        Symbology::Itf => 70,
        Symbology::Code128 => 73,
    }
}

/// One `GS ( k` block: `pL pH cn fn` followed by parameters.
fn qr_function(function: u8, params: &[u8]) -> Vec<u8> {
    let [pl, ph] = u16_le((params.len() + 2) as u16);
    let mut cmd = vec![GS, b'(', b'k', pl, ph, 0x31, function];
    cmd.extend_from_slice(params);
    cmd
}

impl CommandAdapter for EscPos {
    fn name(&self) -> &'static str {
        "ESC/POS"
    }

    fn init(&self, page: CodePage) -> Vec<u8> {
        let mut cmd = commands::reset();
        cmd.extend(self.code_page(page));
        cmd
    }

    fn code_page(&self, page: CodePage) -> Vec<u8> {
        vec![ESC, b't', code_page_number(page)]
    }

    fn align(&self, alignment: Alignment) -> Vec<u8> {
        let n = match alignment {
            Alignment::Left => 0,
            Alignment::Center => 1,
            Alignment::Right => 2,
        };
        vec![ESC, b'a', n]
    }

    fn character_size(&self, size: CharSize, bold: bool) -> Vec<u8> {
        let mut n = 0u8;
        if bold {
            n |= 0x08;
        }
        if size.height >= 2 {
            n |= 0x10;
        }
        if size.width >= 2 {
            n |= 0x20;
        }
        vec![ESC, b'!', n]
    }

    fn line_spacing(&self, dots: Option<u32>) -> Vec<u8> {
        match dots {
            Some(dots) => vec![ESC, b'3', clamp_u8(dots)],
            None => vec![ESC, b'2'],
        }
    }

    fn cut(&self, kind: CutKind, feed_lines: Option<u32>) -> Vec<u8> {
        match (kind, feed_lines) {
            (CutKind::Full, Some(n)) => vec![GS, b'V', 65, clamp_u8(n)],
            (CutKind::Partial, Some(n)) => vec![GS, b'V', 66, clamp_u8(n)],
            (CutKind::Full, None) => vec![GS, b'V', 0],
            (CutKind::Partial, None) => vec![GS, b'V', 1],
        }
    }

    fn qr_code(&self, data: &[u8], module_size: u8) -> Result<Vec<u8>> {
        if data.is_empty() || data.len() > QR_MAX_PAYLOAD {
            return Err(ComandaError::QrCode(format!(
                "payload of {} bytes does not fit a QR symbol",
                data.len()
            )));
        }

        let mut cmd = Vec::with_capacity(data.len() + 40);
        cmd.extend(qr_function(0x41, &[0x32, 0x00])); // model 2
        cmd.extend(qr_function(0x43, &[module_size.clamp(1, 16)]));
        cmd.extend(qr_function(0x45, &[0x31])); // error correction M
        let mut store = vec![0x30];
        store.extend_from_slice(data);
        cmd.extend(qr_function(0x50, &store));
        cmd.extend(qr_function(0x51, &[0x30])); // print
        Ok(cmd)
    }

    fn raster_image(&self, bitmap: &[u8], width_dots: u16, height: u16) -> Vec<u8> {
        let width_bytes = width_dots.div_ceil(8) as usize;
        debug_assert_eq!(bitmap.len(), width_bytes * height as usize);

        let mut cmd = Vec::with_capacity(bitmap.len() + 16);
        for (rows, chunk) in commands::raster_chunks(bitmap, width_bytes) {
            let [xl, xh] = u16_le(width_bytes as u16);
            let [yl, yh] = u16_le(rows);
            cmd.extend_from_slice(&[GS, b'v', b'0', 0, xl, xh, yl, yh]);
            cmd.extend_from_slice(chunk);
        }
        cmd
    }

    fn barcode(&self, barcode: &Barcode, height: u8) -> Vec<u8> {
        // Code 128 needs an explicit code set; B covers printable ASCII.
        // A literal `{` is the code set escape and goes out as `{{`.
        let payload = if barcode.symbology() == Symbology::Code128 {
            let mut payload = b"{B".to_vec();
            payload.extend(code128_escaped(barcode.data()));
            payload
        } else {
            barcode.as_bytes().to_vec()
        };

        let mut cmd = vec![
            GS, b'h', height.max(1), // bar height
            GS, b'w', 2, // module width
            GS, b'H', 2, // HRI below
            GS, b'k', symbology_number(barcode.symbology()), clamp_u8(payload.len() as u32),
        ];
        cmd.extend(payload);
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_selects_code_page() {
        assert_eq!(EscPos.init(CodePage::Cp860), vec![0x1B, 0x40, 0x1B, 0x74, 3]);
        assert_eq!(EscPos.init(CodePage::Cp437), vec![0x1B, 0x40, 0x1B, 0x74, 0]);
        assert_eq!(EscPos.code_page(CodePage::Cp1252), vec![0x1B, 0x74, 16]);
    }

    #[test]
    fn test_align() {
        assert_eq!(EscPos.align(Alignment::Left), vec![0x1B, 0x61, 0]);
        assert_eq!(EscPos.align(Alignment::Center), vec![0x1B, 0x61, 1]);
        assert_eq!(EscPos.align(Alignment::Right), vec![0x1B, 0x61, 2]);
    }

    #[test]
    fn test_character_size_combines_emphasis() {
        assert_eq!(EscPos.character_size(CharSize::NORMAL, false), vec![0x1B, 0x21, 0x00]);
        assert_eq!(EscPos.character_size(CharSize::NORMAL, true), vec![0x1B, 0x21, 0x08]);
        assert_eq!(EscPos.character_size(CharSize::new(1, 2), false), vec![0x1B, 0x21, 0x10]);
        assert_eq!(EscPos.character_size(CharSize::new(2, 1), true), vec![0x1B, 0x21, 0x28]);
        assert_eq!(EscPos.character_size(CharSize::new(2, 2), true), vec![0x1B, 0x21, 0x38]);
    }

    #[test]
    fn test_line_spacing_clamps() {
        assert_eq!(EscPos.line_spacing(Some(30)), vec![0x1B, 0x33, 30]);
        assert_eq!(EscPos.line_spacing(Some(9999)), vec![0x1B, 0x33, 255]);
        assert_eq!(EscPos.line_spacing(None), vec![0x1B, 0x32]);
    }

    #[test]
    fn test_cut() {
        assert_eq!(EscPos.cut(CutKind::Full, Some(3)), vec![0x1D, 0x56, 65, 3]);
        assert_eq!(EscPos.cut(CutKind::Partial, Some(300)), vec![0x1D, 0x56, 66, 255]);
        assert_eq!(EscPos.cut(CutKind::Full, None), vec![0x1D, 0x56, 0]);
        assert_eq!(EscPos.cut(CutKind::Partial, None), vec![0x1D, 0x56, 1]);
    }

    #[test]
    fn test_qr_code_sequence() {
        let cmd = EscPos.qr_code(b"hi", 20).unwrap();
        // model 2
        assert_eq!(&cmd[..9], &[0x1D, 0x28, 0x6B, 4, 0, 0x31, 0x41, 0x32, 0x00]);
        // module size clamped to 16
        assert_eq!(&cmd[9..17], &[0x1D, 0x28, 0x6B, 3, 0, 0x31, 0x43, 16]);
        // store: pL = 2 + 3
        assert_eq!(&cmd[25..35], &[0x1D, 0x28, 0x6B, 5, 0, 0x31, 0x50, 0x30, b'h', b'i']);
        assert_eq!(&cmd[cmd.len() - 8..], &[0x1D, 0x28, 0x6B, 3, 0, 0x31, 0x51, 0x30]);
    }

    #[test]
    fn test_raster_header() {
        let bitmap = vec![0xFF; 2 * 3];
        let cmd = EscPos.raster_image(&bitmap, 16, 3);
        assert_eq!(&cmd[..8], &[0x1D, 0x76, 0x30, 0, 2, 0, 3, 0]);
        assert_eq!(cmd.len(), 8 + 6);
    }

    #[test]
    fn test_raster_is_chunked() {
        let bitmap = vec![0x00; 300];
        let cmd = EscPos.raster_image(&bitmap, 8, 300);
        // two headers: 256 + 44 rows
        assert_eq!(cmd.len(), 2 * 8 + 300);
        assert_eq!(&cmd[6..8], &[0, 1]);
        assert_eq!(&cmd[8 + 256 + 6..8 + 256 + 8], &[44, 0]);
    }

    #[test]
    fn test_code128_gets_code_set_prefix() {
        let barcode = Barcode::new(Symbology::Code128, "AB1").unwrap();
        let cmd = EscPos.barcode(&barcode, 60);
        assert_eq!(&cmd[..9], &[0x1D, 0x68, 60, 0x1D, 0x77, 2, 0x1D, 0x48, 2]);
        assert_eq!(&cmd[9..], &[0x1D, 0x6B, 73, 5, b'{', b'B', b'A', b'B', b'1']);
    }

    #[test]
    fn test_code128_escapes_brace() {
        let barcode = Barcode::new(Symbology::Code128, "A{C1").unwrap();
        let cmd = EscPos.barcode(&barcode, 60);
        assert_eq!(
            &cmd[9..],
            &[0x1D, 0x6B, 73, 7, b'{', b'B', b'A', b'{', b'{', b'C', b'1']
        );
    }

    #[test]
    fn test_code128_length_byte_matches_payload_at_limit() {
        let barcode = Barcode::new(Symbology::Code128, &"A".repeat(253)).unwrap();
        let cmd = EscPos.barcode(&barcode, 60);
        assert_eq!(cmd[12], 255);
        assert_eq!(cmd.len() - 13, 255);

        let braces = Barcode::new(Symbology::Code128, &"{".repeat(126)).unwrap();
        let cmd = EscPos.barcode(&braces, 60);
        assert_eq!(cmd[12] as usize, cmd.len() - 13);
    }

    #[test]
    fn test_ean13_barcode() {
        let barcode = Barcode::new(Symbology::Ean13, "590123412345").unwrap();
        let cmd = EscPos.barcode(&barcode, 80);
        assert_eq!(&cmd[9..13], &[0x1D, 0x6B, 67, 12]);
    }
}
