//! # Comanda - Receipt Documents for Printers and PDF
//!
//! Comanda turns a declarative receipt description, a tree of
//! [`PrintNode`]s, into one of two outputs:
//!
//! - **Printer bytes** for thermal receipt printers, laid out on a fixed
//!   character grid and encoded by a command adapter (ESC/POS or StarPRNT)
//! - **A vector PDF**, laid out on a continuous point canvas
//!
//! Both outputs share one layout algorithm ([`layout::Layout`]) driven over
//! a backend-specific [`layout::Canvas`].
//!
//! ## Quick Start
//!
//! ```
//! use comanda::{GridOptions, PrintNode, print_bytes_with_images};
//! use comanda::document::ResolvedImages;
//! use serde_json::json;
//!
//! let receipt = PrintNode::document(vec![PrintNode::page(vec![
//!     PrintNode::text("CAFÉ CENTRAL").with_style(json!({"textAlign": "center", "fontSize": 20})),
//!     PrintNode::view(vec![PrintNode::text("Total"), PrintNode::text("$9.99")])
//!         .with_style(json!({"flexDirection": "row", "justifyContent": "space-between"})),
//! ])]);
//!
//! let options = GridOptions::default().with_paper_width(32);
//! let bytes = print_bytes_with_images(&receipt, &options, &ResolvedImages::new())?;
//! assert!(!bytes.is_empty());
//! # Ok::<(), comanda::ComandaError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`document`] | PrintNode tree, style extraction, image resolution |
//! | [`layout`] | Shared traversal and the `Canvas` capability |
//! | [`grid`] | Character-grid canvas and byte generator |
//! | [`vector`] | Point canvas and PDF generator |
//! | [`protocol`] | Command adapters, code pages, barcodes |
//! | [`render`] | Image rasterization for the grid |
//! | [`printer`] | Per-call options |
//! | [`error`] | Error types |

pub mod convert;
pub mod document;
pub mod error;
pub mod grid;
pub mod layout;
pub mod printer;
pub mod protocol;
pub mod render;
pub mod vector;

// Re-exports for convenience
pub use convert::{print_bytes, print_bytes_with_images, render_pdf, render_pdf_with_images};
pub use document::{NodeKind, PrintNode};
pub use error::{ComandaError, Result};
pub use printer::{CutOption, GridOptions, PaperHeight, VectorOptions};
pub use protocol::{AdapterKind, CodePage};
pub use vector::PdfDocument;
