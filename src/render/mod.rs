//! # Rendering Module
//!
//! Pixel work for the grid backend.
//!
//! ## Modules
//!
//! - [`raster`]: image → 1-bit packed bitmap for printer raster commands

pub mod raster;

pub use raster::{Raster, flatten_on_white, pack_row};
