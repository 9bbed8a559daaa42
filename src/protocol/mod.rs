//! # Printer Protocols
//!
//! Byte-level building blocks for the grid backend.
//!
//! ## Module Structure
//!
//! - [`adapter`]: the [`CommandAdapter`] strategy and its selector
//! - [`escpos`]: ESC/POS (the Standard adapter)
//! - [`starprnt`]: StarPRNT (the Vendor adapter)
//! - [`codepage`]: Unicode → single-byte code page encoding
//! - [`barcode`]: validated 1D barcode payloads
//! - [`commands`]: control bytes shared by both protocols
//!
//! ## Usage Example
//!
//! ```
//! use comanda::document::{Alignment, CharSize};
//! use comanda::protocol::{AdapterKind, CodePage, CutKind};
//!
//! let adapter = AdapterKind::Standard.build();
//! let mut data = adapter.init(CodePage::Cp860);
//! data.extend(adapter.align(Alignment::Center));
//! data.extend(adapter.character_size(CharSize::new(2, 2), true));
//! data.extend(CodePage::Cp860.encode("PEDIDO Nº 42"));
//! data.extend(adapter.line_feed(1));
//! data.extend(adapter.cut(CutKind::Partial, Some(3)));
//! ```

pub mod adapter;
pub mod barcode;
pub mod codepage;
pub mod commands;
pub mod escpos;
pub mod starprnt;

pub use adapter::{AdapterKind, CommandAdapter, CutKind};
pub use barcode::{Barcode, Symbology};
pub use codepage::CodePage;
pub use escpos::EscPos;
pub use starprnt::StarPrnt;
