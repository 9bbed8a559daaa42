//! # Document Model
//!
//! The PrintNode tree and everything needed to read it:
//!
//! - [`node`]: the `{type, props, children, style}` contract
//! - [`style`]: style extraction into [`TextStyle`] / [`ViewStyle`]
//! - [`resolve`]: asynchronous image loading ahead of layout
//!
//! ```
//! use comanda::document::PrintNode;
//! use serde_json::json;
//!
//! let tree = PrintNode::document(vec![PrintNode::page(vec![
//!     PrintNode::view(vec![PrintNode::text("Total"), PrintNode::text("$9.99")])
//!         .with_style(json!({"flexDirection": "row", "justifyContent": "space-between"})),
//! ])]);
//! assert_eq!(tree.text_content(), "Total$9.99");
//! ```

pub mod node;
pub mod resolve;
pub mod style;

pub use node::{NodeKind, PrintNode, StyleMap};
pub use resolve::{DataUriLoader, HttpLoader, ImageLoader, ImageResolver, ResolvedImages};
pub use style::{
    Alignment, Border, BorderStyle, CharSize, Edges, FlexAlign, FlexDirection, TextStyle,
    ViewStyle, Width, extract_text_style, extract_view_style, is_bold, map_font_size_to_grid,
    parse_width,
};
