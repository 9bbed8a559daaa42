//! # Conversion Entry Points
//!
//! A conversion runs in two phases:
//!
//! 1. **Resolve** (async): every image the tree references is loaded and
//!    decoded, one at a time in traversal order.
//! 2. **Layout** (sync): the tree is walked once over a fresh canvas and
//!    the output is finalized.
//!
//! Each call owns its generator and canvas, so calls can run concurrently.
//!
//! ```
//! use comanda::{GridOptions, PrintNode, print_bytes_with_images};
//! use comanda::document::ResolvedImages;
//!
//! let tree = PrintNode::document(vec![PrintNode::text("Hello")]);
//! let bytes = print_bytes_with_images(&tree, &GridOptions::default(), &ResolvedImages::new())?;
//! assert!(bytes.windows(5).any(|w| w == b"Hello"));
//! # Ok::<(), comanda::ComandaError>(())
//! ```

use tracing::{debug, instrument};

use crate::document::{ImageLoader, ImageResolver, PrintNode, ResolvedImages};
use crate::error::Result;
use crate::grid::{GridCanvas, GridGenerator};
use crate::layout::Layout;
use crate::printer::{GridOptions, VectorOptions};
use crate::vector::{PdfDocument, VectorCanvas, VectorGenerator};

/// Convert a tree to printer bytes, loading images through `loader`.
#[instrument(skip_all, fields(paper_width = options.paper_width))]
pub async fn print_bytes(
    root: &PrintNode,
    options: &GridOptions,
    loader: &dyn ImageLoader,
) -> Result<Vec<u8>> {
    options.validate()?;
    root.validate_root()?;
    let images = ImageResolver::new(loader).resolve(root).await;
    print_bytes_with_images(root, options, &images)
}

/// Convert a tree to printer bytes with images that are already decoded.
///
/// Image nodes whose source is missing from `images` are skipped.
#[instrument(skip_all, fields(paper_width = options.paper_width))]
pub fn print_bytes_with_images(
    root: &PrintNode,
    options: &GridOptions,
    images: &ResolvedImages,
) -> Result<Vec<u8>> {
    options.validate()?;
    let mut canvas = GridCanvas::new(GridGenerator::new(options), options);
    Layout::new(&mut canvas, images).run(root)?;
    let bytes = canvas.finish();
    debug!(bytes = bytes.len(), adapter = ?options.command_adapter, "grid conversion done");
    Ok(bytes)
}

/// Convert a tree to a PDF, loading images through `loader`.
#[instrument(skip_all, fields(paper_width = options.paper_width))]
pub async fn render_pdf(
    root: &PrintNode,
    options: &VectorOptions,
    loader: &dyn ImageLoader,
) -> Result<PdfDocument> {
    options.validate()?;
    root.validate_root()?;
    let images = ImageResolver::new(loader).resolve(root).await;
    render_pdf_with_images(root, options, &images)
}

/// Convert a tree to a PDF with images that are already decoded.
#[instrument(skip_all, fields(paper_width = options.paper_width))]
pub fn render_pdf_with_images(
    root: &PrintNode,
    options: &VectorOptions,
    images: &ResolvedImages,
) -> Result<PdfDocument> {
    let generator = VectorGenerator::new(options)?;
    let mut canvas = VectorCanvas::new(generator, options.paper_height);
    Layout::new(&mut canvas, images).run(root)?;
    let pdf = canvas.finish()?;
    debug!(pages = pdf.page_count(), bytes = pdf.as_bytes().len(), "vector conversion done");
    Ok(pdf)
}
