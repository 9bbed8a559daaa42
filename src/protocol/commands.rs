//! # Shared Control Bytes
//!
//! Both supported protocols are ESC-prefixed command languages descended
//! from the same Epson ancestor. The bytes and helpers they have in common
//! live here; everything protocol-specific sits in [`escpos`](super::escpos)
//! and [`starprnt`](super::starprnt).
//!
//! ## Byte Order
//!
//! Multi-byte integers use **little-endian** encoding in both protocols:
//! `u16` value 0x1234 is sent as bytes `[0x34, 0x12]`.

/// ESC (Escape) - Command prefix byte
pub const ESC: u8 = 0x1B;

/// GS (Group Separator) - Extended command prefix
///
/// ESC/POS uses it on its own (`GS V`, `GS k`); StarPRNT pairs it with ESC
/// (`ESC GS a`, `ESC GS S`).
pub const GS: u8 = 0x1D;

/// RS (Record Separator) - Terminates StarPRNT barcode data
pub const RS: u8 = 0x1E;

/// LF (Line Feed) - Print the line buffer and advance one line
pub const LF: u8 = 0x0A;

/// Largest raster slice sent in one command. Taller images are split.
pub const RASTER_CHUNK_ROWS: usize = 256;

/// Largest byte payload a version 40 QR symbol holds.
pub const QR_MAX_PAYLOAD: usize = 7089;

/// # Initialize Printer (ESC @)
///
/// Identical in both protocols. Clears the print buffer and resets text
/// formatting, character size, alignment and line spacing to power-on
/// defaults. Stored logos and configuration survive.
///
/// ```
/// use comanda::protocol::commands;
///
/// assert_eq!(commands::reset(), vec![0x1B, 0x40]);
/// ```
#[inline]
pub fn reset() -> Vec<u8> {
    vec![ESC, b'@']
}

/// `n` line feeds.
#[inline]
pub fn line_feeds(n: u8) -> Vec<u8> {
    vec![LF; n as usize]
}

/// Encode a u16 value as little-endian bytes [low, high]
///
/// ```
/// use comanda::protocol::commands::u16_le;
///
/// assert_eq!(u16_le(0x1234), [0x34, 0x12]);
/// assert_eq!(u16_le(576), [0x40, 0x02]); // 576 = 0x0240
/// ```
#[inline]
pub const fn u16_le(value: u16) -> [u8; 2] {
    [value as u8, (value >> 8) as u8]
}

/// Clamp a wide count into a single parameter byte.
#[inline]
pub fn clamp_u8(value: u32) -> u8 {
    value.min(u8::MAX as u32) as u8
}

/// Split a packed 1-bit raster into slices of at most [`RASTER_CHUNK_ROWS`]
/// rows, yielding `(rows, bytes)` pairs.
pub fn raster_chunks(
    bitmap: &[u8],
    width_bytes: usize,
) -> impl Iterator<Item = (u16, &[u8])> + '_ {
    let chunk_len = (width_bytes * RASTER_CHUNK_ROWS).max(1);
    bitmap.chunks(chunk_len).map(move |chunk| {
        let rows = chunk.len() / width_bytes.max(1);
        (rows as u16, chunk)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset() {
        assert_eq!(reset(), vec![0x1B, 0x40]);
    }

    #[test]
    fn test_line_feeds() {
        assert_eq!(line_feeds(0), Vec::<u8>::new());
        assert_eq!(line_feeds(3), vec![LF, LF, LF]);
    }

    #[test]
    fn test_u16_le() {
        assert_eq!(u16_le(0x0000), [0x00, 0x00]);
        assert_eq!(u16_le(0x00FF), [0xFF, 0x00]);
        assert_eq!(u16_le(0xFF00), [0x00, 0xFF]);
        assert_eq!(u16_le(576), [0x40, 0x02]);
    }

    #[test]
    fn test_clamp_u8() {
        assert_eq!(clamp_u8(3), 3);
        assert_eq!(clamp_u8(1000), 255);
    }

    #[test]
    fn test_raster_chunks_split_tall_images() {
        // 2 bytes wide, 600 rows
        let bitmap = vec![0xAA; 2 * 600];
        let rows: Vec<u16> = raster_chunks(&bitmap, 2).map(|(rows, _)| rows).collect();
        assert_eq!(rows, vec![256, 256, 88]);
    }
}
