//! # Style Extraction
//!
//! Reads the untyped style map of a [`PrintNode`](super::PrintNode) into the
//! two canonical shapes the layout understands:
//!
//! | Shape | Keys |
//! |-------|------|
//! | [`TextStyle`] | `fontSize`, `fontWeight`, `fontFamily`, `textAlign` |
//! | [`ViewStyle`] | `flexDirection`, `justifyContent`, `alignItems`, padding/margin, `borderTop`/`borderBottom`, `width` |
//!
//! Unknown values never fail: they fall back to the documented default
//! (alignment → left, layout → column).
//!
//! ## Grid Size Buckets
//!
//! ```text
//! fontSize (px)   width × height
//! ─────────────   ──────────────
//!    < 13             1 × 1
//!   13 – 18           1 × 2
//!   19 – 24           2 × 1
//!    ≥ 25             2 × 2
//! ```
//!
//! The 2×2 ceiling matches the combined size+emphasis command that the
//! command adapters use.

use serde_json::Value;

use super::node::StyleMap;

// ============================================================================
// VALUE TYPES
// ============================================================================

/// Horizontal alignment of a line or column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    /// Parse a `textAlign` value. Unknown values resolve to left.
    pub fn from_text_align(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "center" => Alignment::Center,
            "right" | "end" => Alignment::Right,
            _ => Alignment::Left,
        }
    }
}

/// Main-axis direction of a View.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlexDirection {
    Row,
    #[default]
    Column,
}

/// `justifyContent` / `alignItems` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexAlign {
    FlexStart,
    Center,
    FlexEnd,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
    Stretch,
}

impl FlexAlign {
    /// Parse a flex keyword. Returns `None` for values the layout does not model.
    pub fn parse(value: &str) -> Option<Self> {
        let v = value.trim().to_ascii_lowercase();
        Some(match v.as_str() {
            "flex-start" | "start" => FlexAlign::FlexStart,
            "center" => FlexAlign::Center,
            "flex-end" | "end" => FlexAlign::FlexEnd,
            "space-between" => FlexAlign::SpaceBetween,
            "space-around" => FlexAlign::SpaceAround,
            "space-evenly" => FlexAlign::SpaceEvenly,
            "stretch" => FlexAlign::Stretch,
            _ => return None,
        })
    }

    /// Text alignment implied by this keyword: flex-end → right, center → center.
    pub fn as_alignment(self) -> Alignment {
        match self {
            FlexAlign::FlexEnd => Alignment::Right,
            FlexAlign::Center => Alignment::Center,
            _ => Alignment::Left,
        }
    }
}

/// Four-sided spacing in style units (px on the grid, points on the vector canvas).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub const ZERO: Edges = Edges {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };

    fn uniform(v: f32) -> Self {
        Edges {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    /// CSS shorthand: 1 to 4 values (`top right bottom left`).
    fn from_shorthand(value: &Value) -> Option<Self> {
        if let Some(v) = parse_length(value) {
            return Some(Self::uniform(v));
        }
        let s = value.as_str()?;
        let parts: Vec<f32> = s
            .split_whitespace()
            .map(parse_length_str)
            .collect::<Option<Vec<_>>>()?;
        let edges = match parts.as_slice() {
            [a] => Self::uniform(*a),
            [v, h] => Edges {
                top: *v,
                right: *h,
                bottom: *v,
                left: *h,
            },
            [t, h, b] => Edges {
                top: *t,
                right: *h,
                bottom: *b,
                left: *h,
            },
            [t, r, b, l] => Edges {
                top: *t,
                right: *r,
                bottom: *b,
                left: *l,
            },
            _ => return None,
        };
        Some(edges)
    }

    /// Read `{prefix}`, `{prefix}Vertical`/`Horizontal`, then per-side keys.
    /// Later keys override earlier ones.
    fn extract(style: &StyleMap, prefix: &str) -> Self {
        let mut edges = style
            .get(prefix)
            .and_then(Self::from_shorthand)
            .unwrap_or(Self::ZERO);

        let get = |suffix: &str| style.get(&format!("{prefix}{suffix}")).and_then(parse_length);

        if let Some(v) = get("Vertical") {
            edges.top = v;
            edges.bottom = v;
        }
        if let Some(h) = get("Horizontal") {
            edges.left = h;
            edges.right = h;
        }
        if let Some(v) = get("Top") {
            edges.top = v;
        }
        if let Some(v) = get("Right") {
            edges.right = v;
        }
        if let Some(v) = get("Bottom") {
            edges.bottom = v;
        }
        if let Some(v) = get("Left") {
            edges.left = v;
        }
        edges
    }
}

/// Line style of a border divider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorderStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    Double,
}

/// A horizontal border parsed from `"width style color"`.
#[derive(Debug, Clone, PartialEq)]
pub struct Border {
    pub width: f32,
    pub style: BorderStyle,
    pub color: Option<String>,
}

impl Border {
    /// Parse the shorthand. Returns `None` for `none`, zero width, or garbage.
    pub fn parse(value: &Value) -> Option<Self> {
        if let Some(width) = parse_length(value) {
            return (width > 0.0).then_some(Border {
                width,
                style: BorderStyle::Solid,
                color: None,
            });
        }

        let s = value.as_str()?;
        let mut border = Border {
            width: 1.0,
            style: BorderStyle::Solid,
            color: None,
        };
        for token in s.split_whitespace() {
            if let Some(width) = parse_length_str(token) {
                border.width = width;
                continue;
            }
            match token.to_ascii_lowercase().as_str() {
                "none" | "hidden" => return None,
                "solid" => border.style = BorderStyle::Solid,
                "dashed" => border.style = BorderStyle::Dashed,
                "dotted" => border.style = BorderStyle::Dotted,
                "double" => border.style = BorderStyle::Double,
                _ => border.color = Some(token.to_string()),
            }
        }
        (border.width > 0.0).then_some(border)
    }
}

/// A `width` style: a percentage of the available space or an absolute size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Width {
    Percent(f32),
    Absolute(f32),
}

impl Width {
    pub fn parse(value: &Value) -> Option<Self> {
        if let Some(abs) = parse_length(value) {
            return Some(Width::Absolute(abs));
        }
        let s = value.as_str()?.trim();
        let pct = s.strip_suffix('%')?.trim().parse::<f32>().ok()?;
        pct.is_finite().then_some(Width::Percent(pct))
    }

    /// Fraction of the parent, when this is a percentage.
    pub fn fraction(&self) -> Option<f32> {
        match self {
            Width::Percent(p) => Some((p / 100.0).clamp(0.0, 1.0)),
            Width::Absolute(_) => None,
        }
    }

    /// Resolve against a continuous total (points).
    pub fn resolve(&self, total: f32) -> f32 {
        match self {
            Width::Percent(p) => total * p / 100.0,
            Width::Absolute(v) => *v,
        }
    }
}

/// Grid character size multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharSize {
    pub width: u8,
    pub height: u8,
}

impl CharSize {
    pub const NORMAL: CharSize = CharSize {
        width: 1,
        height: 1,
    };

    /// Build a size with both multipliers clamped to 1..=2.
    pub fn new(width: u8, height: u8) -> Self {
        CharSize {
            width: width.clamp(1, 2),
            height: height.clamp(1, 2),
        }
    }
}

impl Default for CharSize {
    fn default() -> Self {
        Self::NORMAL
    }
}

// ============================================================================
// CANONICAL SHAPES
// ============================================================================

/// Text-related style keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextStyle {
    pub font_size: Option<f32>,
    pub font_weight: Option<String>,
    pub font_family: Option<String>,
    pub text_align: Option<Alignment>,
}

impl TextStyle {
    /// See [`is_bold`].
    pub fn is_bold(&self) -> bool {
        is_bold(self)
    }
}

/// Container-related style keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewStyle {
    pub flex_direction: FlexDirection,
    pub justify_content: Option<FlexAlign>,
    pub align_items: Option<FlexAlign>,
    pub padding: Edges,
    pub margin: Edges,
    pub border_top: Option<Border>,
    pub border_bottom: Option<Border>,
    pub width: Option<Width>,
}

impl ViewStyle {
    pub fn is_row(&self) -> bool {
        self.flex_direction == FlexDirection::Row
    }
}

/// Read the text keys present in `style`.
pub fn extract_text_style(style: &StyleMap) -> TextStyle {
    TextStyle {
        font_size: style.get("fontSize").and_then(parse_length),
        font_weight: style.get("fontWeight").and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }),
        font_family: style
            .get("fontFamily")
            .and_then(Value::as_str)
            .map(str::to_string),
        text_align: style
            .get("textAlign")
            .and_then(Value::as_str)
            .map(Alignment::from_text_align),
    }
}

/// Read the container keys present in `style`.
pub fn extract_view_style(style: &StyleMap) -> ViewStyle {
    let flex_direction = match style.get("flexDirection").and_then(Value::as_str) {
        Some(v) if v.trim().eq_ignore_ascii_case("row") => FlexDirection::Row,
        _ => FlexDirection::Column,
    };

    ViewStyle {
        flex_direction,
        justify_content: style
            .get("justifyContent")
            .and_then(Value::as_str)
            .and_then(FlexAlign::parse),
        align_items: style
            .get("alignItems")
            .and_then(Value::as_str)
            .and_then(FlexAlign::parse),
        padding: Edges::extract(style, "padding"),
        margin: Edges::extract(style, "margin"),
        border_top: style.get("borderTop").and_then(Border::parse),
        border_bottom: style.get("borderBottom").and_then(Border::parse),
        width: style.get("width").and_then(Width::parse),
    }
}

/// Bold when `fontWeight` is "bold", numeric ≥ 700, or either `fontWeight`
/// or `fontFamily` mentions "bold" (e.g. `"Helvetica-Bold"`).
pub fn is_bold(style: &TextStyle) -> bool {
    if let Some(weight) = style.font_weight.as_deref() {
        let weight = weight.trim();
        if weight.eq_ignore_ascii_case("bold") {
            return true;
        }
        if let Ok(n) = weight.parse::<f32>()
            && n >= 700.0
        {
            return true;
        }
        if weight.to_ascii_lowercase().contains("bold") {
            return true;
        }
    }
    style
        .font_family
        .as_deref()
        .is_some_and(|family| family.to_ascii_lowercase().contains("bold"))
}

/// Quantize a font size in px into one of four grid size buckets.
pub fn map_font_size_to_grid(px: f32) -> CharSize {
    if px < 13.0 {
        CharSize::new(1, 1)
    } else if px < 19.0 {
        CharSize::new(1, 2)
    } else if px < 25.0 {
        CharSize::new(2, 1)
    } else {
        CharSize::new(2, 2)
    }
}

/// Resolve a width against `total` characters.
///
/// Percentages are rounded, not floored, so sibling columns accumulate
/// as little error as possible. A missing width takes the whole total.
pub fn parse_width(value: Option<&Width>, total: usize) -> usize {
    match value {
        None => total,
        Some(Width::Percent(p)) => ((total as f32) * p / 100.0).round().max(0.0) as usize,
        Some(Width::Absolute(v)) => v.round().max(0.0) as usize,
    }
}

/// Parse a length: a number, or a string with an optional `px`/`pt` suffix.
pub fn parse_length(value: &Value) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|v| v as f32).filter(|v| v.is_finite()),
        Value::String(s) => parse_length_str(s),
        _ => None,
    }
}

fn parse_length_str(s: &str) -> Option<f32> {
    let s = s.trim();
    let digits = s
        .strip_suffix("px")
        .or_else(|| s.strip_suffix("pt"))
        .unwrap_or(s)
        .trim();
    digits.parse::<f32>().ok().filter(|v| v.is_finite())
}
