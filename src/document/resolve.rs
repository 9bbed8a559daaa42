//! Image resolution: loads and decodes every image a tree references.
//!
//! Decoding is the only asynchronous step of a conversion. `ImageResolver`
//! walks the tree in traversal order and awaits one load at a time, so the
//! layout pass that follows is fully synchronous and never touches I/O.

use std::collections::HashMap;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;
use tracing::{debug, warn};

use super::node::{NodeKind, PrintNode};
use crate::error::{ComandaError, Result};

/// Decoded images keyed by their source string.
#[derive(Debug, Default, Clone)]
pub struct ResolvedImages {
    images: HashMap<String, DynamicImage>,
}

impl ResolvedImages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: impl Into<String>, image: DynamicImage) {
        self.images.insert(source.into(), image);
    }

    pub fn get(&self, source: &str) -> Option<&DynamicImage> {
        self.images.get(source)
    }

    pub fn contains(&self, source: &str) -> bool {
        self.images.contains_key(source)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Something that can turn an image source string into pixels.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn load(&self, source: &str) -> Result<DynamicImage>;
}

/// Loads `data:` URIs and bare base64 payloads. Performs no I/O.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataUriLoader;

#[async_trait]
impl ImageLoader for DataUriLoader {
    async fn load(&self, source: &str) -> Result<DynamicImage> {
        decode_data_uri(source)
    }
}

/// Loads `http(s)://` sources with reqwest; everything else is treated as a data URI.
pub struct HttpLoader {
    client: reqwest::Client,
}

impl HttpLoader {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("comanda/0.1")
            .build()
            .map_err(|e| ComandaError::Image(format!("HTTP client error: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageLoader for HttpLoader {
    async fn load(&self, source: &str) -> Result<DynamicImage> {
        if !(source.starts_with("http://") || source.starts_with("https://")) {
            return decode_data_uri(source);
        }

        let response = self
            .client
            .get(source)
            .send()
            .await
            .map_err(|e| ComandaError::Image(format!("Failed to download {}: {}", source, e)))?;
        if !response.status().is_success() {
            return Err(ComandaError::Image(format!(
                "Failed to download {}: HTTP {}",
                source,
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ComandaError::Image(format!("Failed to read image data: {}", e)))?;

        Ok(image::load_from_memory(&bytes)?)
    }
}

/// Decode `data:image/png;base64,...` or a bare base64 string.
pub fn decode_data_uri(source: &str) -> Result<DynamicImage> {
    let payload = match source.strip_prefix("data:") {
        Some(rest) => {
            let (meta, data) = rest
                .split_once(',')
                .ok_or_else(|| ComandaError::Image("data URI has no payload".into()))?;
            if !meta.ends_with(";base64") {
                return Err(ComandaError::Image(format!(
                    "unsupported data URI encoding: {}",
                    meta
                )));
            }
            data
        }
        None => source,
    };

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| ComandaError::Image(format!("invalid base64 image data: {}", e)))?;
    Ok(image::load_from_memory(&bytes)?)
}

/// Resolves the images referenced by a tree.
pub struct ImageResolver<'a> {
    loader: &'a dyn ImageLoader,
}

impl<'a> ImageResolver<'a> {
    pub fn new(loader: &'a dyn ImageLoader) -> Self {
        Self { loader }
    }

    /// Load every image source in depth-first order.
    ///
    /// A source that fails to load is logged and left out; the layout pass
    /// then omits that node.
    pub async fn resolve(&self, root: &PrintNode) -> ResolvedImages {
        let mut sources = Vec::new();
        collect_sources(root, &mut sources);

        let mut resolved = ResolvedImages::new();
        for source in sources {
            if resolved.contains(source) {
                continue;
            }
            match self.loader.load(source).await {
                Ok(image) => {
                    debug!(width = image.width(), height = image.height(), "image resolved");
                    resolved.insert(source, image);
                }
                Err(err) => warn!(error = %err, "skipping image that failed to load"),
            }
        }
        resolved
    }
}

fn collect_sources<'n>(node: &'n PrintNode, out: &mut Vec<&'n str>) {
    if node.kind == NodeKind::Image
        && let Some(source) = node.image_source()
    {
        out.push(source);
    }
    for child in &node.children {
        collect_sources(child, out);
    }
}
