//! The rendering capability the traverser drives.
//!
//! Each backend implements [`Canvas`] once. The traverser has already done
//! everything the two backends share (box model, column extraction,
//! alignment inheritance) by the time a canvas method is called, so the
//! values passed in are fully resolved for the backend to place.

use image::DynamicImage;

use crate::document::{Alignment, Border, FlexAlign, PrintNode, TextStyle, Width};
use crate::error::Result;
use crate::protocol::Barcode;

/// One Text element, content already concatenated.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub content: String,
    pub style: TextStyle,
    /// Alignment context inherited from an enclosing View's `alignItems`.
    pub inherited_align: Option<Alignment>,
}

impl TextBlock {
    /// The Text's own `textAlign`, ignoring inheritance.
    pub fn explicit_align(&self) -> Option<Alignment> {
        self.style.text_align
    }

    /// Own alignment, else the inherited context, else left.
    pub fn resolved_align(&self) -> Alignment {
        self.style
            .text_align
            .or(self.inherited_align)
            .unwrap_or_default()
    }
}

/// One cell of a row.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Depth-first concatenation of the cell's text.
    pub text: String,
    /// Style of the first Text element in the cell.
    pub style: TextStyle,
    pub width: Option<Width>,
    pub align: Alignment,
}

/// How the columns of a row share the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowMode {
    /// At least one column declares a width.
    Explicit,
    /// `justifyContent: space-between`.
    SpaceBetween,
    /// `justifyContent: center`.
    Center,
    /// Everything else: equal shares.
    Even,
}

impl RowMode {
    pub fn classify(columns: &[Column], justify: Option<FlexAlign>) -> Self {
        if columns.iter().any(|c| c.width.is_some()) {
            RowMode::Explicit
        } else {
            match justify {
                Some(FlexAlign::SpaceBetween) => RowMode::SpaceBetween,
                Some(FlexAlign::Center) => RowMode::Center,
                _ => RowMode::Even,
            }
        }
    }
}

/// A horizontal View with two or more children.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub columns: Vec<Column>,
    pub mode: RowMode,
}

/// Where and how large to draw an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    pub align: Alignment,
    /// The image's own `width` style.
    pub width: Option<Width>,
    /// Product of the percentage widths of enclosing Views.
    pub constraint: Option<f32>,
}

impl ImagePlacement {
    /// Fraction of the available width the image may occupy.
    pub fn max_fraction(&self) -> f32 {
        let own = self.width.and_then(|w| w.fraction()).unwrap_or(1.0);
        (own * self.constraint.unwrap_or(1.0)).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QrPlacement {
    pub data: String,
    /// Module size hint, 1-16.
    pub module_size: u8,
    pub align: Alignment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarcodePlacement {
    pub barcode: Barcode,
    /// Bar height in dots.
    pub height: u8,
    pub align: Alignment,
}

/// A layout target.
///
/// Vertical lengths arrive in style units (px for the grid, points for the
/// vector canvas); each canvas converts them to its own grid.
pub trait Canvas {
    fn begin_document(&mut self) -> Result<()>;

    fn end_document(&mut self) -> Result<()>;

    /// A Page node starts. Only the vector canvas cares about page props.
    fn begin_page(&mut self, _page: &PrintNode) -> Result<()> {
        Ok(())
    }

    /// Vertical gap.
    fn space(&mut self, amount: f32);

    /// Horizontal rule from a `borderTop`/`borderBottom` style.
    fn divider(&mut self, border: &Border);

    /// Narrow the content area for a View's horizontal padding and margin.
    fn push_inset(&mut self, left: f32, right: f32);

    fn pop_inset(&mut self);

    fn text(&mut self, block: &TextBlock) -> Result<()>;

    fn row(&mut self, row: &Row) -> Result<()>;

    /// Failures are reported back and the traverser skips the image.
    fn image(&mut self, image: &DynamicImage, placement: &ImagePlacement) -> Result<()>;

    /// Failures are reported back and the traverser skips the symbol.
    fn qr_code(&mut self, qr: &QrPlacement) -> Result<()>;

    fn barcode(&mut self, barcode: &BarcodePlacement) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(width: Option<Width>) -> Column {
        Column {
            text: "x".into(),
            style: TextStyle::default(),
            width,
            align: Alignment::Left,
        }
    }

    #[test]
    fn test_explicit_width_wins_over_justify() {
        let columns = vec![column(Some(Width::Percent(50.0))), column(None)];
        assert_eq!(
            RowMode::classify(&columns, Some(FlexAlign::SpaceBetween)),
            RowMode::Explicit
        );
    }

    #[test]
    fn test_row_mode_from_justify() {
        let columns = vec![column(None), column(None)];
        assert_eq!(RowMode::classify(&columns, Some(FlexAlign::SpaceBetween)), RowMode::SpaceBetween);
        assert_eq!(RowMode::classify(&columns, Some(FlexAlign::Center)), RowMode::Center);
        assert_eq!(RowMode::classify(&columns, Some(FlexAlign::FlexEnd)), RowMode::Even);
        assert_eq!(RowMode::classify(&columns, None), RowMode::Even);
    }

    #[test]
    fn test_text_block_alignment_resolution() {
        let mut block = TextBlock {
            content: "x".into(),
            style: TextStyle::default(),
            inherited_align: Some(Alignment::Center),
        };
        assert_eq!(block.explicit_align(), None);
        assert_eq!(block.resolved_align(), Alignment::Center);
        block.style.text_align = Some(Alignment::Right);
        assert_eq!(block.resolved_align(), Alignment::Right);
        block.style.text_align = None;
        block.inherited_align = None;
        assert_eq!(block.resolved_align(), Alignment::Left);
    }

    #[test]
    fn test_image_fraction_combines_constraints() {
        let placement = ImagePlacement {
            align: Alignment::Left,
            width: Some(Width::Percent(50.0)),
            constraint: Some(0.5),
        };
        assert!((placement.max_fraction() - 0.25).abs() < 1e-6);
        let absolute = ImagePlacement {
            width: Some(Width::Absolute(100.0)),
            constraint: None,
            ..placement
        };
        assert_eq!(absolute.max_fraction(), 1.0);
    }
}
