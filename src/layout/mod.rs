//! # Layout
//!
//! One layout algorithm, two targets. [`Layout`] walks the PrintNode tree
//! and drives any [`Canvas`]:
//!
//! | Canvas | Units | Output |
//! |--------|-------|--------|
//! | [`GridCanvas`](crate::grid::GridCanvas) | characters and lines | printer bytes |
//! | [`VectorCanvas`](crate::vector::VectorCanvas) | points | PDF |

pub mod canvas;
pub mod traverse;

pub use canvas::{
    BarcodePlacement, Canvas, Column, ImagePlacement, QrPlacement, Row, RowMode, TextBlock,
};
pub use traverse::Layout;
