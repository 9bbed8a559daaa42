//! # Legacy Code Page Encoding
//!
//! Thermal printers do not speak Unicode. Every outgoing string is mapped
//! onto a single-byte code page the printer has been told to use (see the
//! adapters' init sequences). ASCII (U+0020–U+007E) passes through unchanged;
//! the upper half comes from a fixed 128-entry table per code page.
//! Characters with no representation become the placeholder `?`.
//!
//! | Page | Region | Upper half |
//! |------|--------|------------|
//! | CP437 | US English | accents, box drawing, Greek, math |
//! | CP860 | Portuguese (default) | CP437 with `ã õ Á Ê Í Ó Ú À È Ì Ò Ù Â Ô Ã Õ` in 0x80–0xAF |
//! | CP1252 | Windows Latin-1 | via `encoding_rs` |

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Byte written for characters the code page cannot represent.
pub const PLACEHOLDER: u8 = b'?';

/// Supported code pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodePage {
    /// Code Page 437 (US English)
    #[serde(alias = "pc437")]
    Cp437,
    /// Code Page 860 (Portuguese)
    #[default]
    #[serde(alias = "pc860")]
    Cp860,
    /// Windows-1252 (Latin-1)
    #[serde(alias = "wpc1252", alias = "windows-1252")]
    Cp1252,
}

/// CP437 upper half, bytes 0x80–0xFF.
const CP437_HIGH: [char; 128] = [
    // 0x80
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å',
    // 0x90
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ',
    // 0xA0
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»',
    // 0xB0
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐',
    // 0xC0
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧',
    // 0xD0
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀',
    // 0xE0
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩',
    // 0xF0
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{00A0}',
];

/// CP860 bytes 0x80–0xAF. 0xB0–0xFF are shared with CP437.
const CP860_HIGH: [char; 48] = [
    // 0x80
    'Ç', 'ü', 'é', 'â', 'ã', 'à', 'Á', 'ç', 'ê', 'Ê', 'è', 'Í', 'Ô', 'ì', 'Ã', 'Â',
    // 0x90
    'É', 'À', 'È', 'ô', 'õ', 'ò', 'Ú', 'ù', 'Ì', 'Õ', 'Ü', '¢', '£', 'Ù', '₧', 'Ó',
    // 0xA0
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', 'Ò', '¬', '½', '¼', '¡', '«', '»',
];

fn position_in(table: &[char], ch: char, base: u8) -> Option<u8> {
    table.iter().position(|&c| c == ch).map(|i| base + i as u8)
}

impl CodePage {
    /// Map one character to its byte, or `None` when unrepresentable.
    pub fn encode_char(self, ch: char) -> Option<u8> {
        match ch {
            '\n' | '\t' => return Some(ch as u8),
            ' '..='~' => return Some(ch as u8),
            _ if (ch as u32) < 0x80 => return None,
            _ => {}
        }

        match self {
            CodePage::Cp437 => position_in(&CP437_HIGH, ch, 0x80),
            CodePage::Cp860 => position_in(&CP860_HIGH, ch, 0x80)
                .or_else(|| position_in(&CP437_HIGH[48..], ch, 0xB0)),
            CodePage::Cp1252 => {
                let mut buf = [0u8; 4];
                let (bytes, _, had_errors) =
                    encoding_rs::WINDOWS_1252.encode(ch.encode_utf8(&mut buf));
                (!had_errors && bytes.len() == 1).then(|| bytes[0])
            }
        }
    }

    /// Encode a string, substituting [`PLACEHOLDER`] for unmapped characters.
    pub fn encode(self, text: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(text.len());
        for ch in text.chars() {
            match self.encode_char(ch) {
                Some(byte) => out.push(byte),
                None => {
                    warn!(
                        "{:?}: unmapped character '{}' (U+{:04X}), replacing with '?'",
                        self, ch, ch as u32
                    );
                    out.push(PLACEHOLDER);
                }
            }
        }
        out
    }

    /// Length of `text` once encoded, without allocating the output.
    pub fn encoded_len(self, text: &str) -> usize {
        // Every supported page is single-byte: mapped or not, one char is one byte.
        text.chars().count()
    }
}
