//! The shared tree walk.
//!
//! [`Layout`] dispatches on node kind and applies the box model once for
//! both backends:
//!
//! ```text
//! margin-top → border-top → padding-top
//!     ├─ push inset (horizontal padding + margin), alignment, width
//!     │     body: row (≥ 2 children) or children in order
//!     └─ pop
//! padding-bottom → border-bottom → margin-bottom
//! ```

use tracing::{debug, trace, warn};

use super::canvas::{
    BarcodePlacement, Canvas, Column, ImagePlacement, QrPlacement, Row, RowMode, TextBlock,
};
use crate::document::{
    Alignment, FlexAlign, NodeKind, PrintNode, ResolvedImages, TextStyle, extract_text_style,
    extract_view_style,
};
use crate::error::Result;
use crate::protocol::Barcode;

/// Default QR module size hint.
const DEFAULT_QR_SIZE: u8 = 4;

/// Default barcode height in dots.
const DEFAULT_BARCODE_HEIGHT: u8 = 80;

/// Walks a PrintNode tree over a [`Canvas`].
pub struct Layout<'a, C: Canvas> {
    canvas: &'a mut C,
    images: &'a ResolvedImages,
    /// Alignment contexts from enclosing Views' `alignItems`.
    align_stack: Vec<Alignment>,
    /// Percentage widths of enclosing Views, as fractions.
    width_stack: Vec<f32>,
}

impl<'a, C: Canvas> Layout<'a, C> {
    pub fn new(canvas: &'a mut C, images: &'a ResolvedImages) -> Self {
        Self {
            canvas,
            images,
            align_stack: Vec::new(),
            width_stack: Vec::new(),
        }
    }

    /// Lay out a whole tree, bracketed by document start and end.
    ///
    /// A root that is not a Document is treated as the only content of an
    /// implicit one.
    pub fn run(mut self, root: &PrintNode) -> Result<()> {
        root.validate_root()?;
        self.canvas.begin_document()?;
        if root.kind == NodeKind::Document {
            self.visit_children(root)?;
        } else {
            self.visit(root)?;
        }
        self.canvas.end_document()
    }

    fn visit(&mut self, node: &PrintNode) -> Result<()> {
        match &node.kind {
            NodeKind::Document => self.visit_children(node),
            NodeKind::Page => {
                self.canvas.begin_page(node)?;
                self.visit_children(node)
            }
            NodeKind::View => self.visit_view(node),
            NodeKind::Text | NodeKind::TextNode => self.visit_text(node),
            NodeKind::Image => {
                self.visit_image(node);
                Ok(())
            }
            NodeKind::QrCode => {
                self.visit_qr_code(node);
                Ok(())
            }
            NodeKind::Barcode => self.visit_barcode(node),
            NodeKind::Other(name) => {
                trace!(kind = %name, "passing through unknown node");
                self.visit_children(node)
            }
        }
    }

    fn visit_children(&mut self, node: &PrintNode) -> Result<()> {
        for child in &node.children {
            self.visit(child)?;
        }
        Ok(())
    }

    fn visit_view(&mut self, node: &PrintNode) -> Result<()> {
        let style = extract_view_style(&node.style_map());

        self.canvas.space(style.margin.top);
        if let Some(border) = &style.border_top {
            self.canvas.divider(border);
        }
        self.canvas.space(style.padding.top);

        self.canvas.push_inset(
            style.margin.left + style.padding.left,
            style.margin.right + style.padding.right,
        );
        let pushed_align = style.align_items.map(|a| a.as_alignment());
        if let Some(align) = pushed_align {
            self.align_stack.push(align);
        }
        let pushed_width = style.width.and_then(|w| w.fraction());
        if let Some(fraction) = pushed_width {
            self.width_stack.push(fraction);
        }

        let body = if style.is_row() && node.children.len() >= 2 {
            let row = self.build_row(node, style.justify_content);
            self.canvas.row(&row)
        } else {
            self.visit_children(node)
        };

        if pushed_width.is_some() {
            self.width_stack.pop();
        }
        if pushed_align.is_some() {
            self.align_stack.pop();
        }
        self.canvas.pop_inset();
        body?;

        self.canvas.space(style.padding.bottom);
        if let Some(border) = &style.border_bottom {
            self.canvas.divider(border);
        }
        self.canvas.space(style.margin.bottom);
        Ok(())
    }

    fn build_row(
        &self,
        node: &PrintNode,
        justify: Option<FlexAlign>,
    ) -> Row {
        let columns: Vec<Column> = node.children.iter().map(extract_column).collect();
        let mode = RowMode::classify(&columns, justify);
        debug!(columns = columns.len(), ?mode, "row");
        Row { columns, mode }
    }

    fn visit_text(&mut self, node: &PrintNode) -> Result<()> {
        let block = TextBlock {
            content: node.text_content(),
            style: extract_text_style(&node.style_map()),
            inherited_align: self.inherited_align(),
        };
        self.canvas.text(&block)
    }

    fn visit_image(&mut self, node: &PrintNode) {
        let Some(source) = node.image_source() else {
            warn!("skipping image without a source");
            return;
        };
        let Some(image) = self.images.get(source) else {
            warn!("skipping image that was not resolved");
            return;
        };

        let style = node.style_map();
        let placement = ImagePlacement {
            align: self.own_or_inherited_align(&extract_text_style(&style)),
            width: extract_view_style(&style).width,
            constraint: self.width_constraint(),
        };
        if let Err(err) = self.canvas.image(image, &placement) {
            warn!(error = %err, "skipping image");
        }
    }

    fn visit_qr_code(&mut self, node: &PrintNode) {
        let Some(data) = node.payload().filter(|d| !d.is_empty()) else {
            warn!("skipping QR code without a payload");
            return;
        };
        let qr = QrPlacement {
            data,
            module_size: node
                .number_prop("size")
                .map(|s| s.round().clamp(1.0, 16.0) as u8)
                .unwrap_or(DEFAULT_QR_SIZE),
            align: self.own_or_inherited_align(&extract_text_style(&node.style_map())),
        };
        if let Err(err) = self.canvas.qr_code(&qr) {
            warn!(error = %err, "skipping QR code");
        }
    }

    fn visit_barcode(&mut self, node: &PrintNode) -> Result<()> {
        let symbology = node
            .str_prop("symbology")
            .or_else(|| node.str_prop("format"))
            .unwrap_or("code128");
        let data = node.payload().unwrap_or_default();
        let barcode = Barcode::parse(symbology, &data)?;

        let placement = BarcodePlacement {
            barcode,
            height: node
                .number_prop("height")
                .map(|h| h.round().clamp(1.0, 255.0) as u8)
                .unwrap_or(DEFAULT_BARCODE_HEIGHT),
            align: self.own_or_inherited_align(&extract_text_style(&node.style_map())),
        };
        self.canvas.barcode(&placement)
    }

    fn inherited_align(&self) -> Option<Alignment> {
        self.align_stack.last().copied()
    }

    fn own_or_inherited_align(&self, style: &TextStyle) -> Alignment {
        style
            .text_align
            .or_else(|| self.inherited_align())
            .unwrap_or_default()
    }

    fn width_constraint(&self) -> Option<f32> {
        if self.width_stack.is_empty() {
            None
        } else {
            Some(self.width_stack.iter().product())
        }
    }
}

/// Read one row cell: its text, first text style, width and alignment.
fn extract_column(node: &PrintNode) -> Column {
    let text_style = first_text_style(node)
        .unwrap_or_else(|| extract_text_style(&node.style_map()));
    let view_style = extract_view_style(&node.style_map());

    let align = text_style.text_align.unwrap_or_else(|| {
        view_style
            .align_items
            .or(view_style.justify_content)
            .map(|a| a.as_alignment())
            .unwrap_or_default()
    });

    Column {
        text: node.text_content(),
        style: text_style,
        width: view_style.width,
        align,
    }
}

/// Style of the first Text element in depth-first order.
fn first_text_style(node: &PrintNode) -> Option<TextStyle> {
    if node.kind == NodeKind::Text {
        return Some(extract_text_style(&node.style_map()));
    }
    node.children.iter().find_map(first_text_style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Border, Width};
    use image::DynamicImage;
    use serde_json::json;

    /// Records canvas calls as readable strings.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        fail_images: bool,
    }

    impl Canvas for Recorder {
        fn begin_document(&mut self) -> Result<()> {
            self.calls.push("begin".into());
            Ok(())
        }
        fn end_document(&mut self) -> Result<()> {
            self.calls.push("end".into());
            Ok(())
        }
        fn space(&mut self, amount: f32) {
            if amount > 0.0 {
                self.calls.push(format!("space {}", amount));
            }
        }
        fn divider(&mut self, border: &Border) {
            self.calls.push(format!("divider {:?}", border.style));
        }
        fn push_inset(&mut self, left: f32, right: f32) {
            self.calls.push(format!("push {} {}", left, right));
        }
        fn pop_inset(&mut self) {
            self.calls.push("pop".into());
        }
        fn text(&mut self, block: &TextBlock) -> Result<()> {
            self.calls.push(format!("text {} {:?}", block.content, block.resolved_align()));
            Ok(())
        }
        fn row(&mut self, row: &Row) -> Result<()> {
            let cells: Vec<String> = row
                .columns
                .iter()
                .map(|c| format!("{}:{:?}", c.text, c.align))
                .collect();
            self.calls.push(format!("row {:?} {}", row.mode, cells.join("|")));
            Ok(())
        }
        fn image(&mut self, _image: &DynamicImage, placement: &ImagePlacement) -> Result<()> {
            if self.fail_images {
                return Err(crate::error::ComandaError::Image("broken".into()));
            }
            self.calls.push(format!("image {:.2}", placement.max_fraction()));
            Ok(())
        }
        fn qr_code(&mut self, qr: &QrPlacement) -> Result<()> {
            self.calls.push(format!("qr {} {}", qr.data, qr.module_size));
            Ok(())
        }
        fn barcode(&mut self, barcode: &BarcodePlacement) -> Result<()> {
            self.calls.push(format!("barcode {}", barcode.barcode.data()));
            Ok(())
        }
    }

    fn run(tree: &PrintNode) -> Vec<String> {
        let mut canvas = Recorder::default();
        Layout::new(&mut canvas, &ResolvedImages::new()).run(tree).unwrap();
        canvas.calls
    }

    #[test]
    fn test_box_model_order() {
        let tree = PrintNode::document(vec![
            PrintNode::view(vec![PrintNode::text("Hi")]).with_style(json!({
                "marginTop": 20, "marginBottom": 40,
                "paddingTop": 10, "paddingBottom": 5,
                "paddingHorizontal": 4,
                "borderTop": "1px dashed #000",
                "borderBottom": "2px double black",
            })),
        ]);
        assert_eq!(
            run(&tree),
            vec![
                "begin",
                "space 20",
                "divider Dashed",
                "space 10",
                "push 4 4",
                "text Hi Left",
                "pop",
                "space 5",
                "divider Double",
                "space 40",
                "end",
            ]
        );
    }

    #[test]
    fn test_row_with_single_child_is_column_content() {
        let tree = PrintNode::view(vec![PrintNode::text("Alone")])
            .with_style(json!({"flexDirection": "row"}));
        assert!(run(&tree).contains(&"text Alone Left".to_string()));
    }

    #[test]
    fn test_row_columns_and_alignment() {
        let tree = PrintNode::view(vec![
            PrintNode::text("Total"),
            PrintNode::view(vec![PrintNode::text("$9.99")]).with_style(json!({"alignItems": "flex-end"})),
            PrintNode::text("x").with_style(json!({"textAlign": "center"})),
        ])
        .with_style(json!({"flexDirection": "row", "justifyContent": "space-between"}));
        assert!(run(&tree).contains(&"row SpaceBetween Total:Left|$9.99:Right|x:Center".to_string()));
    }

    #[test]
    fn test_alignment_context_is_scoped() {
        let tree = PrintNode::document(vec![
            PrintNode::view(vec![
                PrintNode::text("A"),
                PrintNode::text("B").with_style(json!({"textAlign": "right"})),
            ])
            .with_style(json!({"alignItems": "center"})),
            PrintNode::text("C"),
        ]);
        let calls = run(&tree);
        assert!(calls.contains(&"text A Center".to_string()));
        assert!(calls.contains(&"text B Right".to_string()));
        assert!(calls.contains(&"text C Left".to_string()));
    }

    #[test]
    fn test_unknown_nodes_pass_through() {
        let tree = PrintNode::document(vec![
            PrintNode::new(NodeKind::Other("Fragment".into())).with_child(PrintNode::text("inner")),
        ]);
        assert_eq!(run(&tree), vec!["begin", "text inner Left", "end"]);
    }

    #[test]
    fn test_non_document_root_is_wrapped() {
        assert_eq!(run(&PrintNode::text("solo")), vec!["begin", "text solo Left", "end"]);
    }

    #[test]
    fn test_unresolved_image_is_skipped() {
        let tree = PrintNode::document(vec![PrintNode::image("data:missing"), PrintNode::text("after")]);
        assert_eq!(run(&tree), vec!["begin", "text after Left", "end"]);
    }

    #[test]
    fn test_image_width_constraint_is_inherited() {
        let mut images = ResolvedImages::new();
        images.insert("logo", DynamicImage::new_luma8(4, 4));
        let tree = PrintNode::view(vec![
            PrintNode::view(vec![PrintNode::image("logo")]).with_style(json!({"width": "50%"})),
        ])
        .with_style(json!({"width": "50%"}));

        let mut canvas = Recorder::default();
        Layout::new(&mut canvas, &images).run(&tree).unwrap();
        assert!(canvas.calls.contains(&"image 0.25".to_string()));
    }

    #[test]
    fn test_failed_image_does_not_abort() {
        let mut images = ResolvedImages::new();
        images.insert("logo", DynamicImage::new_luma8(4, 4));
        let tree = PrintNode::document(vec![PrintNode::image("logo"), PrintNode::text("ok")]);

        let mut canvas = Recorder {
            fail_images: true,
            ..Default::default()
        };
        Layout::new(&mut canvas, &images).run(&tree).unwrap();
        assert_eq!(canvas.calls, vec!["begin", "text ok Left", "end"]);
    }

    #[test]
    fn test_invalid_barcode_aborts() {
        let tree = PrintNode::document(vec![PrintNode::barcode("ean13", "not-digits")]);
        let mut canvas = Recorder::default();
        assert!(Layout::new(&mut canvas, &ResolvedImages::new()).run(&tree).is_err());
    }

    #[test]
    fn test_qr_defaults() {
        let tree = PrintNode::document(vec![
            PrintNode::qr_code("https://example.com"),
            PrintNode::qr_code("big").with_prop("size", json!(40)),
            PrintNode::qr_code(""),
        ]);
        assert_eq!(
            run(&tree),
            vec!["begin", "qr https://example.com 4", "qr big 16", "end"]
        );
    }

    #[test]
    fn test_column_width_and_first_text_style() {
        let cell = PrintNode::view(vec![
            PrintNode::text("Qty").with_style(json!({"fontWeight": "bold"})),
            PrintNode::text("2"),
        ])
        .with_style(json!({"width": "25%"}));
        let column = extract_column(&cell);
        assert_eq!(column.text, "Qty2");
        assert!(column.style.is_bold());
        assert_eq!(column.width, Some(Width::Percent(25.0)));
        assert_eq!(
            RowMode::classify(&[column], Some(FlexAlign::Center)),
            RowMode::Explicit
        );
    }
}
