//! # Conversion Tests
//!
//! End-to-end checks through the public entry points: a tree goes in,
//! printer bytes or a PDF come out.

use comanda::document::{DataUriLoader, ResolvedImages};
use comanda::protocol::commands::{ESC, GS, LF};
use comanda::{
    AdapterKind, CodePage, ComandaError, CutOption, GridOptions, PaperHeight, PrintNode,
    VectorOptions, print_bytes, print_bytes_with_images, render_pdf, render_pdf_with_images,
};
use pretty_assertions::assert_eq;
use serde_json::json;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn total_row() -> PrintNode {
    PrintNode::document(vec![PrintNode::page(vec![
        PrintNode::view(vec![PrintNode::text("Total"), PrintNode::text("$9.99")])
            .with_style(json!({"flexDirection": "row", "justifyContent": "space-between"})),
    ])])
}

fn grid(tree: &PrintNode, options: &GridOptions) -> Vec<u8> {
    print_bytes_with_images(tree, options, &ResolvedImages::new()).unwrap()
}

fn png_data_uri(width: u32, height: u32) -> String {
    use base64::Engine;
    use std::io::Cursor;

    let img = image::GrayImage::from_fn(width, height, |x, _| {
        image::Luma([if x % 2 == 0 { 0u8 } else { 255u8 }])
    });
    let mut bytes = Vec::new();
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&bytes)
    )
}

// ============================================================================
// GRID OUTPUT
// ============================================================================

#[test]
fn test_total_row_standard() {
    let options = GridOptions::default().with_paper_width(20);
    let mut expected = vec![ESC, b'@', ESC, b't', 3];
    expected.extend_from_slice(b"Total          $9.99");
    expected.push(LF);
    expected.extend_from_slice(&[GS, b'V', 65, 3]);
    assert_eq!(grid(&total_row(), &options), expected);
}

#[test]
fn test_total_row_vendor() {
    let options = GridOptions::default()
        .with_paper_width(20)
        .with_adapter(AdapterKind::Vendor);
    let mut expected = vec![ESC, b'@', ESC, GS, b't', 5];
    expected.extend_from_slice(b"Total          $9.99");
    expected.push(LF);
    expected.extend_from_slice(&[ESC, b'a', 3, ESC, b'd', 2]);
    assert_eq!(grid(&total_row(), &options), expected);
}

#[test]
fn test_no_cut_feeds_paper() {
    let options = GridOptions::default()
        .with_paper_width(20)
        .with_cut(CutOption::None);
    let bytes = grid(&total_row(), &options);
    assert!(bytes.ends_with(&[b'9', LF, LF, LF, LF]));
    assert!(!bytes.windows(2).any(|w| w == [GS, b'V']));
}

#[test]
fn test_tear_off_uses_partial_cut() {
    let options = GridOptions::tear_off().with_paper_width(20);
    let bytes = grid(&total_row(), &options);
    assert!(bytes.ends_with(&[GS, b'V', 66, 3]));
}

#[test]
fn test_styled_header_and_reset() {
    let tree = PrintNode::document(vec![
        PrintNode::text("MENU").with_style(json!({
            "textAlign": "center",
            "fontWeight": "bold",
            "fontSize": 20
        })),
        PrintNode::text("item"),
    ]);
    let bytes = grid(&tree, &GridOptions::default());

    let header = [ESC, b'a', 1, ESC, b'!', 0x08 | 0x20];
    let start = bytes
        .windows(header.len())
        .position(|w| w == header)
        .expect("centered bold double-width header");
    let after = &bytes[start + header.len()..];
    assert!(after.starts_with(b"MENU"));
    // back to normal before the next line
    assert!(after[4..].starts_with(&[ESC, b'!', 0, ESC, b'a', 0, LF]));
    assert!(after.windows(4).any(|w| w == b"item"));
}

#[test]
fn test_unmapped_characters_become_placeholders() {
    let tree = PrintNode::document(vec![PrintNode::text("Olá 日本")]);
    let bytes = grid(&tree, &GridOptions::default().with_encoding(CodePage::Cp860));
    // á is 0xA0 in CP860
    assert!(bytes.windows(6).any(|w| w == [b'O', b'l', 0xA0, b' ', b'?', b'?']));
}

#[test]
fn test_divider_spans_paper() {
    let tree = PrintNode::document(vec![
        PrintNode::view(vec![]).with_style(json!({"borderBottom": "1px double #000"})),
    ]);
    let bytes = grid(&tree, &GridOptions::default().with_paper_width(10));
    assert!(bytes.windows(11).any(|w| w == b"==========\n"));
}

#[test]
fn test_invalid_barcode_aborts() {
    let tree = PrintNode::document(vec![PrintNode::barcode("ean13", "12345")]);
    let result = print_bytes_with_images(&tree, &GridOptions::default(), &ResolvedImages::new());
    assert!(matches!(result, Err(ComandaError::InvalidBarcode { .. })));
}

#[test]
fn test_oversized_qr_is_skipped() {
    let tree = PrintNode::document(vec![
        PrintNode::qr_code("x".repeat(8000)),
        PrintNode::text("after"),
    ]);
    let bytes = grid(&tree, &GridOptions::default());
    assert!(!bytes.windows(3).any(|w| w == [GS, b'(', b'k']));
    assert!(bytes.windows(5).any(|w| w == b"after"));
}

#[test]
fn test_json_input() {
    let json = r#"{
        "type": "document",
        "children": [{
            "type": "page",
            "children": [{
                "type": "view",
                "style": {"flexDirection": "row", "justifyContent": "space-between"},
                "children": [
                    {"type": "text", "props": {"children": "Total"}},
                    {"type": "text", "props": {"children": "$9.99"}}
                ]
            }]
        }]
    }"#;
    let tree = PrintNode::from_json(json).unwrap();
    let options = GridOptions::from_json(r#"{"paperWidth": 20, "cut": "full"}"#).unwrap();
    assert_eq!(grid(&tree, &options), grid(&total_row(), &options));
}

#[test]
fn test_malformed_json_is_rejected() {
    assert!(PrintNode::from_json("null").is_err());
    assert!(PrintNode::from_json(r#"{"children": []}"#).is_err());
    assert!(PrintNode::from_json(r#"{"type": ""}"#).is_err());
}

#[tokio::test]
async fn test_image_through_data_uri_loader() {
    let tree = PrintNode::document(vec![PrintNode::image(png_data_uri(64, 8))]);
    let options = GridOptions::default();
    let bytes = print_bytes(&tree, &options, &DataUriLoader).await.unwrap();

    // 64 px wide → 8 bytes per row, 8 rows
    let header = [GS, b'v', b'0', 0, 8, 0, 8, 0];
    let start = bytes
        .windows(header.len())
        .position(|w| w == header)
        .expect("raster header");
    assert_eq!(bytes[start + header.len()], 0b1010_1010);
}

#[tokio::test]
async fn test_broken_image_is_skipped() {
    let tree = PrintNode::document(vec![
        PrintNode::image("data:image/png;base64,AAAA"),
        PrintNode::text("still here"),
    ]);
    let bytes = print_bytes(&tree, &GridOptions::default(), &DataUriLoader)
        .await
        .unwrap();
    assert!(bytes.windows(10).any(|w| w == b"still here"));
}

// ============================================================================
// VECTOR OUTPUT
// ============================================================================

#[test]
fn test_pdf_output() {
    let pdf = render_pdf_with_images(&total_row(), &VectorOptions::default(), &ResolvedImages::new())
        .unwrap();
    assert!(pdf.as_bytes().starts_with(b"%PDF"));
    assert_eq!(pdf.page_count(), 1);
    assert_eq!(pdf.width(), 205.0);
    // auto height: one 12pt line plus both margins
    assert!((pdf.height() - 28.0).abs() < 0.01);
}

#[test]
fn test_pdf_fixed_height_paginates() {
    let lines: Vec<PrintNode> = (0..40).map(|i| PrintNode::text(format!("line {}", i))).collect();
    let tree = PrintNode::document(vec![PrintNode::page(lines)]);
    let options = VectorOptions::default().with_size(205.0, PaperHeight::Fixed(120.0));
    let pdf = render_pdf_with_images(&tree, &options, &ResolvedImages::new()).unwrap();
    assert!(pdf.page_count() > 1);
    assert_eq!(pdf.height(), 120.0);
}

#[test]
fn test_pdf_invalid_paper() {
    let options = VectorOptions::default().with_size(10.0, PaperHeight::Auto);
    let result = render_pdf_with_images(&total_row(), &options, &ResolvedImages::new());
    assert!(matches!(result, Err(ComandaError::InvalidPaper(_))));
}

#[tokio::test]
async fn test_pdf_with_image_qr_and_barcode() {
    let tree = PrintNode::document(vec![PrintNode::page(vec![
        PrintNode::image(png_data_uri(32, 32)),
        PrintNode::qr_code("https://example.com/order/42"),
        PrintNode::barcode("ean13", "5901234123457"),
    ])]);
    let pdf = render_pdf(&tree, &VectorOptions::default(), &DataUriLoader)
        .await
        .unwrap();
    assert!(pdf.as_bytes().starts_with(b"%PDF"));
    assert!(pdf.height() > 100.0);
}
