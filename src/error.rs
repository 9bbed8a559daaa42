//! # Error Types
//!
//! This module defines error types used throughout the comanda library.
//!
//! Only structural problems surface as errors. Content problems inside a
//! well-formed tree (an undecodable image, an oversized QR payload) are
//! logged and the affected node is left out of the output.

use thiserror::Error;

/// Main error type for comanda operations
#[derive(Debug, Error)]
pub enum ComandaError {
    /// The root PrintNode is missing or malformed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Barcode payload does not fit its symbology
    #[error("Invalid {symbology} barcode payload {data:?}: {reason}")]
    InvalidBarcode {
        symbology: &'static str,
        data: String,
        reason: String,
    },

    /// QR code could not be encoded
    #[error("QR code error: {0}")]
    QrCode(String),

    /// Image loading or processing error
    #[error("Image error: {0}")]
    Image(String),

    /// Paper or render target dimensions are unusable
    #[error("Invalid paper dimensions: {0}")]
    InvalidPaper(String),

    /// PDF serialization error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for ComandaError {
    fn from(err: image::ImageError) -> Self {
        ComandaError::Image(err.to_string())
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ComandaError>;
