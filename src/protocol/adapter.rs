//! # Command Adapters
//!
//! A [`CommandAdapter`] turns abstract printer operations into one
//! protocol's bytes. It holds no state: formatting state and deduplication
//! belong to the grid generator, which owns exactly one adapter for the
//! whole conversion.
//!
//! | Kind | Protocol | Printers |
//! |------|----------|----------|
//! | [`AdapterKind::Standard`] | ESC/POS | Epson and most generic 58/80 mm printers |
//! | [`AdapterKind::Vendor`] | StarPRNT | Star Micronics TSP/mC-Print series |

use serde::{Deserialize, Serialize};

use super::barcode::Barcode;
use super::codepage::CodePage;
use super::escpos::EscPos;
use super::starprnt::StarPrnt;
use crate::document::{Alignment, CharSize};
use crate::error::Result;

/// How the paper is cut at the end of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutKind {
    #[default]
    Full,
    Partial,
}

/// Which protocol a grid conversion speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    /// ESC/POS
    #[default]
    #[serde(alias = "escpos")]
    Standard,
    /// StarPRNT
    #[serde(alias = "star", alias = "starprnt")]
    Vendor,
}

impl AdapterKind {
    pub fn build(self) -> Box<dyn CommandAdapter> {
        match self {
            AdapterKind::Standard => Box::new(EscPos),
            AdapterKind::Vendor => Box::new(StarPrnt),
        }
    }
}

/// Byte-level strategy for one printer protocol.
///
/// Every method returns a complete command sequence; callers concatenate
/// them in order. Out-of-range parameters are clamped, never rejected.
pub trait CommandAdapter: Send + Sync {
    /// Human-readable protocol name, for logs.
    fn name(&self) -> &'static str;

    /// Reset the printer and select `page` for all following text.
    fn init(&self, page: CodePage) -> Vec<u8>;

    /// Select the character code page.
    fn code_page(&self, page: CodePage) -> Vec<u8>;

    fn align(&self, alignment: Alignment) -> Vec<u8>;

    /// Character size and emphasis as one sequence. Multipliers above 2 are
    /// treated as 2.
    fn character_size(&self, size: CharSize, bold: bool) -> Vec<u8>;

    /// Line pitch in dots, or `None` for the printer default.
    fn line_spacing(&self, dots: Option<u32>) -> Vec<u8>;

    /// Cut the paper, first feeding `feed_lines` lines when given.
    fn cut(&self, kind: CutKind, feed_lines: Option<u32>) -> Vec<u8>;

    /// Native QR symbol. Fails when the payload cannot fit any QR version.
    fn qr_code(&self, data: &[u8], module_size: u8) -> Result<Vec<u8>>;

    /// Monochrome raster, rows packed MSB-first and byte-aligned.
    fn raster_image(&self, bitmap: &[u8], width_dots: u16, height: u16) -> Vec<u8>;

    /// Native 1D barcode, `height` in dots.
    fn barcode(&self, barcode: &Barcode, height: u8) -> Vec<u8>;

    fn line_feed(&self, n: u8) -> Vec<u8> {
        super::commands::line_feeds(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_kind_from_json() {
        let kind: AdapterKind = serde_json::from_str("\"vendor\"").unwrap();
        assert_eq!(kind, AdapterKind::Vendor);
        let kind: AdapterKind = serde_json::from_str("\"standard\"").unwrap();
        assert_eq!(kind, AdapterKind::Standard);
        assert_eq!(AdapterKind::default(), AdapterKind::Standard);
    }

    #[test]
    fn test_build_selects_protocol() {
        assert_eq!(AdapterKind::Standard.build().name(), "ESC/POS");
        assert_eq!(AdapterKind::Vendor.build().name(), "StarPRNT");
    }

    #[test]
    fn test_adapters_share_init_prefix_and_line_feed() {
        for kind in [AdapterKind::Standard, AdapterKind::Vendor] {
            let adapter = kind.build();
            assert_eq!(&adapter.init(CodePage::Cp860)[..2], &[0x1B, 0x40]);
            assert_eq!(adapter.line_feed(2), vec![0x0A, 0x0A]);
        }
    }

    #[test]
    fn test_oversized_qr_fails_on_both() {
        let payload = vec![b'9'; 8000];
        for kind in [AdapterKind::Standard, AdapterKind::Vendor] {
            assert!(kind.build().qr_code(&payload, 4).is_err());
        }
    }
}
