//! # Printer Module
//!
//! Per-call options for the grid and vector backends.
//!
//! ## Modules
//!
//! - [`config`]: [`GridOptions`] and [`VectorOptions`]

pub mod config;

pub use config::{CutOption, DOTS_PER_CHAR, GridOptions, PaperHeight, VectorOptions};
