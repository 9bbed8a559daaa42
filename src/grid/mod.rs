//! # Grid Backend
//!
//! Renders a PrintNode tree onto a fixed character grid and emits printer
//! control bytes through a [`CommandAdapter`](crate::protocol::CommandAdapter).
//!
//! - [`generator`]: byte buffer with deduplicated formatting state
//! - [`canvas`]: the grid [`Canvas`](crate::layout::Canvas) implementation

pub mod canvas;
pub mod generator;

pub use canvas::{GridCanvas, allot_widths, fit_column};
pub use generator::{GridGenerator, StyleState};
