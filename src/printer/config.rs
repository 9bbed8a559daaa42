//! # Conversion Options
//!
//! Per-call configuration for both backends. Everything deserializes from
//! the camelCase JSON used by the rest of the pipeline, with every key
//! optional.
//!
//! ## Grid
//!
//! | Key | Type | Default |
//! |-----|------|---------|
//! | `paperWidth` | characters | 48 |
//! | `encoding` | `"cp437"` / `"cp860"` / `"cp1252"` | `"cp860"` |
//! | `cut` | `false` / `true` / `"full"` / `"partial"` | `"full"` |
//! | `feedBeforeCut` | lines | 3 |
//! | `commandAdapter` | `"standard"` / `"vendor"` | `"standard"` |
//!
//! ## Vector
//!
//! | Key | Type | Default |
//! |-----|------|---------|
//! | `paperWidth` | points | 205 (≈ 72 mm) |
//! | `paperHeight` | points or `"auto"` | `"auto"` |
//! | `margin` | points | 8 |
//!
//! ```
//! use comanda::printer::{CutOption, GridOptions};
//! use comanda::protocol::AdapterKind;
//!
//! let options = GridOptions::from_json(r#"{"paperWidth": 32, "cut": "partial", "commandAdapter": "vendor"}"#).unwrap();
//! assert_eq!(options.paper_width, 32);
//! assert_eq!(options.cut, CutOption::Partial);
//! assert_eq!(options.command_adapter, AdapterKind::Vendor);
//! assert_eq!(options.feed_before_cut, 3);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ComandaError, Result};
use crate::protocol::{AdapterKind, CodePage, CutKind};

/// Raster dots per grid character column.
pub const DOTS_PER_CHAR: usize = 8;

// ============================================================================
// GRID
// ============================================================================

/// End-of-document cut behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "CutValue", into = "CutValue")]
pub enum CutOption {
    /// No cut; blank lines are fed instead.
    None,
    #[default]
    Full,
    Partial,
}

impl CutOption {
    pub fn kind(self) -> Option<CutKind> {
        match self {
            CutOption::None => None,
            CutOption::Full => Some(CutKind::Full),
            CutOption::Partial => Some(CutKind::Partial),
        }
    }
}

/// Wire shape of `cut`: a flag or a cut kind.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum CutValue {
    Flag(bool),
    Kind(CutKind),
}

impl From<CutValue> for CutOption {
    fn from(value: CutValue) -> Self {
        match value {
            CutValue::Flag(false) => CutOption::None,
            CutValue::Flag(true) | CutValue::Kind(CutKind::Full) => CutOption::Full,
            CutValue::Kind(CutKind::Partial) => CutOption::Partial,
        }
    }
}

impl From<CutOption> for CutValue {
    fn from(value: CutOption) -> Self {
        match value {
            CutOption::None => CutValue::Flag(false),
            CutOption::Full => CutValue::Kind(CutKind::Full),
            CutOption::Partial => CutValue::Kind(CutKind::Partial),
        }
    }
}

/// Options for the character-grid (printer bytes) backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridOptions {
    /// Line width in characters.
    pub paper_width: usize,
    pub encoding: CodePage,
    pub cut: CutOption,
    /// Blank lines between the last content line and the cutter.
    pub feed_before_cut: u32,
    pub command_adapter: AdapterKind,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            paper_width: 48,
            encoding: CodePage::Cp860,
            cut: CutOption::Full,
            feed_before_cut: 3,
            command_adapter: AdapterKind::Standard,
        }
    }
}

impl GridOptions {
    /// Receipt preset: partial cut so the slip stays on the roll until torn.
    pub fn tear_off() -> Self {
        Self {
            cut: CutOption::Partial,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_paper_width(mut self, chars: usize) -> Self {
        self.paper_width = chars;
        self
    }

    pub fn with_adapter(mut self, kind: AdapterKind) -> Self {
        self.command_adapter = kind;
        self
    }

    pub fn with_cut(mut self, cut: CutOption) -> Self {
        self.cut = cut;
        self
    }

    pub fn with_encoding(mut self, encoding: CodePage) -> Self {
        self.encoding = encoding;
        self
    }

    /// Printable width in raster dots.
    #[inline]
    pub fn width_dots(&self) -> usize {
        self.paper_width * DOTS_PER_CHAR
    }

    pub fn validate(&self) -> Result<()> {
        if self.paper_width == 0 {
            return Err(ComandaError::InvalidPaper(
                "paperWidth must be at least one character".into(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// VECTOR
// ============================================================================

/// Page height: grown to fit the content, or fixed with pagination.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "HeightValue", into = "HeightValue")]
pub enum PaperHeight {
    #[default]
    Auto,
    Fixed(f32),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum HeightValue {
    Points(f32),
    Keyword(String),
}

impl From<HeightValue> for PaperHeight {
    fn from(value: HeightValue) -> Self {
        match value {
            HeightValue::Points(points) => PaperHeight::Fixed(points),
            // Any keyword means auto; "auto" is the only documented one.
            HeightValue::Keyword(_) => PaperHeight::Auto,
        }
    }
}

impl From<PaperHeight> for HeightValue {
    fn from(value: PaperHeight) -> Self {
        match value {
            PaperHeight::Auto => HeightValue::Keyword("auto".into()),
            PaperHeight::Fixed(points) => HeightValue::Points(points),
        }
    }
}

/// Options for the vector (PDF) backend. All lengths are in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VectorOptions {
    pub paper_width: f32,
    pub paper_height: PaperHeight,
    /// Page margin on all four sides.
    pub margin: f32,
}

impl Default for VectorOptions {
    fn default() -> Self {
        Self {
            paper_width: 205.0,
            paper_height: PaperHeight::Auto,
            margin: 8.0,
        }
    }
}

impl VectorOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_size(mut self, width: f32, height: PaperHeight) -> Self {
        self.paper_width = width;
        self.paper_height = height;
        self
    }

    /// Width available to content between the side margins.
    pub fn content_width(&self) -> f32 {
        self.paper_width - 2.0 * self.margin
    }

    pub fn validate(&self) -> Result<()> {
        if !self.paper_width.is_finite() || self.paper_width <= 0.0 {
            return Err(ComandaError::InvalidPaper(format!(
                "paper width {} is not a positive length",
                self.paper_width
            )));
        }
        if let PaperHeight::Fixed(height) = self.paper_height
            && (!height.is_finite() || height <= 2.0 * self.margin)
        {
            return Err(ComandaError::InvalidPaper(format!(
                "paper height {} leaves no room inside the margins",
                height
            )));
        }
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(ComandaError::InvalidPaper(format!(
                "margin {} is not a valid length",
                self.margin
            )));
        }
        if self.content_width() <= 0.0 {
            return Err(ComandaError::InvalidPaper(format!(
                "paper width {} leaves no room inside the margins",
                self.paper_width
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_defaults() {
        let options = GridOptions::default();
        assert_eq!(options.paper_width, 48);
        assert_eq!(options.encoding, CodePage::Cp860);
        assert_eq!(options.cut, CutOption::Full);
        assert_eq!(options.feed_before_cut, 3);
        assert_eq!(options.command_adapter, AdapterKind::Standard);
        assert_eq!(options.width_dots(), 384);
    }

    #[test]
    fn test_tear_off_uses_partial_cut() {
        assert_eq!(GridOptions::tear_off().cut.kind(), Some(CutKind::Partial));
    }

    #[test]
    fn test_cut_accepts_bool_or_kind() {
        let parse = |json: &str| GridOptions::from_json(json).unwrap().cut;
        assert_eq!(parse(r#"{"cut": false}"#), CutOption::None);
        assert_eq!(parse(r#"{"cut": true}"#), CutOption::Full);
        assert_eq!(parse(r#"{"cut": "full"}"#), CutOption::Full);
        assert_eq!(parse(r#"{"cut": "partial"}"#), CutOption::Partial);
        assert!(GridOptions::from_json(r#"{"cut": "sideways"}"#).is_err());
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(GridOptions::from_json("{}").unwrap(), GridOptions::default());
        assert_eq!(VectorOptions::from_json("{}").unwrap(), VectorOptions::default());
    }

    #[test]
    fn test_encoding_names() {
        let options = GridOptions::from_json(r#"{"encoding": "cp437"}"#).unwrap();
        assert_eq!(options.encoding, CodePage::Cp437);
    }

    #[test]
    fn test_zero_width_grid_is_invalid() {
        assert!(GridOptions::default().with_paper_width(0).validate().is_err());
        assert!(GridOptions::default().validate().is_ok());
    }

    #[test]
    fn test_paper_height() {
        let options = VectorOptions::from_json(r#"{"paperHeight": "auto"}"#).unwrap();
        assert_eq!(options.paper_height, PaperHeight::Auto);
        let options = VectorOptions::from_json(r#"{"paperWidth": 300, "paperHeight": 400}"#).unwrap();
        assert_eq!(options.paper_height, PaperHeight::Fixed(400.0));
        assert_eq!(options.paper_width, 300.0);
    }

    #[test]
    fn test_vector_validation() {
        assert!(VectorOptions::default().validate().is_ok());
        assert!(VectorOptions::default().with_size(0.0, PaperHeight::Auto).validate().is_err());
        assert!(VectorOptions::default().with_size(16.0, PaperHeight::Auto).validate().is_err());
        assert!(
            VectorOptions::default()
                .with_size(200.0, PaperHeight::Fixed(-1.0))
                .validate()
                .is_err()
        );
    }
}
