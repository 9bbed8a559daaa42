//! # Vector Backend
//!
//! Lays the PrintNode tree out on a continuous point canvas and writes a PDF.
//!
//! - [`metrics`]: Helvetica advance widths, measurement and word wrap
//! - [`generator`]: display list, pagination and `lopdf` serialization
//! - [`canvas`]: the [`Canvas`](crate::layout::Canvas) implementation

pub mod canvas;
pub mod generator;
pub mod metrics;

pub use canvas::VectorCanvas;
pub use generator::{DrawOp, PdfDocument, VectorGenerator};
