//! # Barcode Payloads
//!
//! A [`Barcode`] is a symbology plus a payload that has already been checked
//! against that symbology's rules. Construction is the only place a barcode
//! can fail: once a value exists, every adapter and the vector canvas can
//! render it without further checks.
//!
//! | Symbology | Payload |
//! |-----------|---------|
//! | EAN-13 | 12 digits, or 13 with a valid check digit |
//! | EAN-8 | 7 digits, or 8 with a valid check digit |
//! | UPC-A | 11 digits, or 12 with a valid check digit |
//! | Code 39 | 1-255 of `0-9 A-Z space - . $ / + %` |
//! | Code 128 | 1-255 printable ASCII characters |
//! | ITF | an even number of digits (2-254) |

use barcoders::sym::code39::Code39;
use barcoders::sym::code128::Code128;
use barcoders::sym::ean8::EAN8;
use barcoders::sym::ean13::EAN13;
use barcoders::sym::tf::TF;
use serde::{Deserialize, Serialize};

use crate::error::{ComandaError, Result};

/// Supported 1D symbologies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbology {
    Ean13,
    Ean8,
    UpcA,
    Code39,
    #[default]
    Code128,
    Itf,
}

impl Symbology {
    /// Parse a symbology name, ignoring case, spaces, dashes and underscores.
    pub fn parse(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "ean13" | "jan13" => Some(Symbology::Ean13),
            "ean8" | "jan8" => Some(Symbology::Ean8),
            "upca" | "upc" => Some(Symbology::UpcA),
            "code39" => Some(Symbology::Code39),
            "code128" => Some(Symbology::Code128),
            "itf" | "itf14" | "interleaved2of5" => Some(Symbology::Itf),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Symbology::Ean13 => "EAN-13",
            Symbology::Ean8 => "EAN-8",
            Symbology::UpcA => "UPC-A",
            Symbology::Code39 => "Code 39",
            Symbology::Code128 => "Code 128",
            Symbology::Itf => "ITF",
        }
    }
}

/// A validated barcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Barcode {
    symbology: Symbology,
    data: String,
}

impl Barcode {
    /// Validate `data` for `symbology`.
    ///
    /// ```
    /// use comanda::protocol::barcode::{Barcode, Symbology};
    ///
    /// assert!(Barcode::new(Symbology::Ean13, "590123412345").is_ok());
    /// assert!(Barcode::new(Symbology::Ean13, "5901234123458").is_err()); // bad check digit
    /// assert!(Barcode::new(Symbology::Itf, "123").is_err()); // odd length
    /// ```
    pub fn new(symbology: Symbology, data: &str) -> Result<Self> {
        let fail = |reason: &str| ComandaError::InvalidBarcode {
            symbology: symbology.name(),
            data: data.to_string(),
            reason: reason.to_string(),
        };

        match symbology {
            Symbology::Ean13 => check_gtin(data, 12).map_err(fail)?,
            Symbology::Ean8 => check_gtin(data, 7).map_err(fail)?,
            Symbology::UpcA => check_gtin(data, 11).map_err(fail)?,
            Symbology::Code39 => {
                check_length(data, 255).map_err(fail)?;
                if let Some(c) = data.chars().find(|c| !is_code39_char(*c)) {
                    return Err(fail(&format!("character {:?} is not in the Code 39 set", c)));
                }
            }
            Symbology::Code128 => {
                check_length(data, CODE128_MAX_ESCAPED).map_err(fail)?;
                if let Some(c) = data.chars().find(|c| !(' '..='~').contains(c)) {
                    return Err(fail(&format!("character {:?} is not printable ASCII", c)));
                }
                // Each `{` is doubled on the wire; the code set prefix takes two more bytes.
                if code128_escaped(data).len() > CODE128_MAX_ESCAPED {
                    return Err(fail("payload is too long once escaped"));
                }
            }
            Symbology::Itf => {
                check_length(data, 254).map_err(fail)?;
                if !data.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(fail("only digits are allowed"));
                }
                if data.len() % 2 != 0 {
                    return Err(fail("digit count must be even"));
                }
            }
        }

        Ok(Self {
            symbology,
            data: data.to_string(),
        })
    }

    /// Validate with a symbology given by name.
    pub fn parse(symbology: &str, data: &str) -> Result<Self> {
        let kind = Symbology::parse(symbology).ok_or_else(|| ComandaError::InvalidBarcode {
            symbology: "unknown",
            data: data.to_string(),
            reason: format!("unsupported symbology {:?}", symbology),
        })?;
        Self::new(kind, data)
    }

    pub fn symbology(&self) -> Symbology {
        self.symbology
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    /// Payload bytes for a printer's native barcode command.
    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_bytes()
    }

    /// Module pattern (1 = bar, 0 = space) for drawing the symbol ourselves.
    pub fn modules(&self) -> Result<Vec<u8>> {
        let fail = |e: barcoders::error::Error| ComandaError::InvalidBarcode {
            symbology: self.symbology.name(),
            data: self.data.clone(),
            reason: format!("{:?}", e),
        };

        let modules = match self.symbology {
            // Encoders compute the check digit themselves.
            Symbology::Ean13 => EAN13::new(&self.data[..12]).map_err(fail)?.encode(),
            Symbology::Ean8 => EAN8::new(&self.data[..7]).map_err(fail)?.encode(),
            Symbology::UpcA => {
                let as_ean = format!("0{}", &self.data[..11]);
                EAN13::new(&as_ean).map_err(fail)?.encode()
            }
            Symbology::Code39 => Code39::new(&self.data).map_err(fail)?.encode(),
            // Character set B covers all printable ASCII.
            Symbology::Code128 => Code128::new(&format!("\u{0181}{}", self.data))
                .map_err(fail)?
                .encode(),
            Symbology::Itf => TF::interleaved(&self.data).map_err(fail)?.encode(),
        };
        Ok(modules)
    }
}

/// Code 128 data bytes that fit a one-byte length after the `{B` prefix.
pub const CODE128_MAX_ESCAPED: usize = 253;

/// Code 128 data with the code-set escape `{` doubled.
pub fn code128_escaped(data: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    for b in data.bytes() {
        out.push(b);
        if b == b'{' {
            out.push(b'{');
        }
    }
    out
}

fn check_length(data: &str, max: usize) -> std::result::Result<(), &'static str> {
    if data.is_empty() {
        Err("payload is empty")
    } else if data.len() > max {
        Err("payload is too long")
    } else {
        Ok(())
    }
}

/// GTIN family: `body` digits, optionally followed by a correct check digit.
fn check_gtin(data: &str, body: usize) -> std::result::Result<(), &'static str> {
    if !data.bytes().all(|b| b.is_ascii_digit()) {
        return Err("only digits are allowed");
    }
    if data.len() == body {
        return Ok(());
    }
    if data.len() != body + 1 {
        return Err("wrong number of digits");
    }
    let digits: Vec<u32> = data.bytes().map(|b| (b - b'0') as u32).collect();
    if gtin_check_digit(&digits[..body]) == digits[body] {
        Ok(())
    } else {
        Err("check digit does not match")
    }
}

/// Weights alternate 3,1,3,... starting from the digit next to the check digit.
fn gtin_check_digit(body: &[u32]) -> u32 {
    let sum: u32 = body
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { d * 3 } else { *d })
        .sum();
    (10 - sum % 10) % 10
}

fn is_code39_char(c: char) -> bool {
    c.is_ascii_digit() || c.is_ascii_uppercase() || matches!(c, ' ' | '-' | '.' | '$' | '/' | '+' | '%')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbology_names() {
        assert_eq!(Symbology::parse("EAN-13"), Some(Symbology::Ean13));
        assert_eq!(Symbology::parse("upc_a"), Some(Symbology::UpcA));
        assert_eq!(Symbology::parse("Code 128"), Some(Symbology::Code128));
        assert_eq!(Symbology::parse("pdf417"), None);
    }

    #[test]
    fn test_gtin_check_digits() {
        assert!(Barcode::new(Symbology::Ean13, "5901234123457").is_ok());
        assert!(Barcode::new(Symbology::Ean8, "96385074").is_ok());
        assert!(Barcode::new(Symbology::UpcA, "036000291452").is_ok());
        assert!(Barcode::new(Symbology::UpcA, "036000291453").is_err());
    }

    #[test]
    fn test_ean13_rejects_letters_and_lengths() {
        assert!(Barcode::new(Symbology::Ean13, "59012341234A").is_err());
        assert!(Barcode::new(Symbology::Ean13, "12345").is_err());
    }

    #[test]
    fn test_code39_charset() {
        assert!(Barcode::new(Symbology::Code39, "HELLO-123").is_ok());
        assert!(Barcode::new(Symbology::Code39, "hello").is_err());
    }

    #[test]
    fn test_code128_rejects_non_ascii() {
        assert!(Barcode::new(Symbology::Code128, "Pedido 42").is_ok());
        assert!(Barcode::new(Symbology::Code128, "Pão").is_err());
        assert!(Barcode::new(Symbology::Code128, "").is_err());
    }

    #[test]
    fn test_code128_length_counts_escaped_braces() {
        assert!(Barcode::new(Symbology::Code128, &"A".repeat(253)).is_ok());
        assert!(Barcode::new(Symbology::Code128, &"A".repeat(254)).is_err());
        assert!(Barcode::new(Symbology::Code128, &"{".repeat(126)).is_ok());
        assert!(Barcode::new(Symbology::Code128, &"{".repeat(127)).is_err());
    }

    #[test]
    fn test_unknown_symbology_is_an_error() {
        let err = Barcode::parse("maxicode", "123").unwrap_err();
        assert!(matches!(err, ComandaError::InvalidBarcode { .. }));
    }

    #[test]
    fn test_modules_have_bars() {
        for barcode in [
            Barcode::new(Symbology::Code128, "Hello").unwrap(),
            Barcode::new(Symbology::Code39, "ABC").unwrap(),
            Barcode::new(Symbology::Ean13, "590123412345").unwrap(),
        ] {
            let modules = barcode.modules().unwrap();
            assert!(!modules.is_empty());
            assert!(modules.contains(&1));
        }
    }
}
