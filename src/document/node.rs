//! The PrintNode tree: the data contract every front end produces.
//!
//! A node is `{type, props, children, style}`. The `type` string is decoded
//! once, at deserialization time, into the closed [`NodeKind`] enum so the
//! traversal never re-matches strings.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ComandaError, Result};

/// Untyped style map as produced by the front end.
pub type StyleMap = Map<String, Value>;

/// Node discriminator.
///
/// Matching is case-insensitive. Anything unrecognized is kept as
/// [`NodeKind::Other`] and passes through to its children transparently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Document,
    Page,
    View,
    Text,
    /// Raw text fragment, usually nested inside a `Text`.
    TextNode,
    Image,
    QrCode,
    Barcode,
    Other(String),
}

impl From<&str> for NodeKind {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "document" => NodeKind::Document,
            "page" => NodeKind::Page,
            "view" => NodeKind::View,
            "text" => NodeKind::Text,
            "textnode" | "#text" => NodeKind::TextNode,
            "image" | "img" => NodeKind::Image,
            "qrcode" | "qr" => NodeKind::QrCode,
            "barcode" => NodeKind::Barcode,
            _ => NodeKind::Other(value.to_string()),
        }
    }
}

impl From<String> for NodeKind {
    fn from(value: String) -> Self {
        NodeKind::from(value.as_str())
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.as_str().to_string()
    }
}

impl NodeKind {
    /// Canonical lowercase name.
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Page => "page",
            NodeKind::View => "view",
            NodeKind::Text => "text",
            NodeKind::TextNode => "textnode",
            NodeKind::Image => "image",
            NodeKind::QrCode => "qrcode",
            NodeKind::Barcode => "barcode",
            NodeKind::Other(name) => name,
        }
    }
}

/// A node in the print tree.
///
/// ```
/// use comanda::document::PrintNode;
///
/// let json = r#"{"type": "Text", "props": {"children": "Hello"}, "children": []}"#;
/// let node = PrintNode::from_json(json).unwrap();
/// assert_eq!(node.text_content(), "Hello");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintNode {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub props: Map<String, Value>,
    #[serde(default)]
    pub children: Vec<PrintNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleMap>,
}

impl PrintNode {
    /// Create an empty node of the given kind.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            props: Map::new(),
            children: Vec::new(),
            style: None,
        }
    }

    /// Parse and validate a tree from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Decode and validate a tree from an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Err(ComandaError::InvalidInput("root node is null".into()));
        }
        let node: PrintNode = serde_json::from_value(value)
            .map_err(|e| ComandaError::InvalidInput(format!("malformed root node: {}", e)))?;
        node.validate_root()?;
        Ok(node)
    }

    /// Reject roots that cannot be converted at all.
    pub fn validate_root(&self) -> Result<()> {
        if let NodeKind::Other(name) = &self.kind
            && name.trim().is_empty()
        {
            return Err(ComandaError::InvalidInput("root node has an empty type".into()));
        }
        Ok(())
    }

    // ===== Builders =====

    pub fn document(children: Vec<PrintNode>) -> Self {
        Self::new(NodeKind::Document).with_children(children)
    }

    pub fn page(children: Vec<PrintNode>) -> Self {
        Self::new(NodeKind::Page).with_children(children)
    }

    pub fn view(children: Vec<PrintNode>) -> Self {
        Self::new(NodeKind::View).with_children(children)
    }

    /// A `Text` node whose literal content lives in `props.children`.
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(NodeKind::Text).with_prop("children", Value::String(content.into()))
    }

    /// A raw text fragment.
    pub fn text_node(content: impl Into<String>) -> Self {
        Self::new(NodeKind::TextNode).with_prop("children", Value::String(content.into()))
    }

    pub fn image(source: impl Into<String>) -> Self {
        Self::new(NodeKind::Image).with_prop("source", Value::String(source.into()))
    }

    pub fn qr_code(data: impl Into<String>) -> Self {
        Self::new(NodeKind::QrCode).with_prop("value", Value::String(data.into()))
    }

    pub fn barcode(symbology: &str, data: impl Into<String>) -> Self {
        Self::new(NodeKind::Barcode)
            .with_prop("symbology", Value::String(symbology.into()))
            .with_prop("value", Value::String(data.into()))
    }

    pub fn with_children(mut self, children: Vec<PrintNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_child(mut self, child: PrintNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_prop(mut self, key: &str, value: Value) -> Self {
        self.props.insert(key.to_string(), value);
        self
    }

    /// Attach a style. Non-object values are ignored.
    pub fn with_style(mut self, style: Value) -> Self {
        if let Value::Object(map) = style {
            self.style = Some(map);
        }
        self
    }

    // ===== Accessors =====

    /// Style map, empty when the node has none.
    pub fn style_map(&self) -> Cow<'_, StyleMap> {
        match &self.style {
            Some(map) => Cow::Borrowed(map),
            None => Cow::Owned(Map::new()),
        }
    }

    /// Literal text carried in `props.children` (string, number, or array of those).
    pub fn literal_text(&self) -> Option<String> {
        fn flatten(value: &Value, out: &mut String) {
            match value {
                Value::String(s) => out.push_str(s),
                Value::Number(n) => out.push_str(&n.to_string()),
                Value::Array(items) => items.iter().for_each(|v| flatten(v, out)),
                _ => {}
            }
        }

        let value = self.props.get("children")?;
        let mut out = String::new();
        flatten(value, &mut out);
        if out.is_empty() && !matches!(value, Value::String(_)) {
            None
        } else {
            Some(out)
        }
    }

    /// Depth-first concatenation of all literal text in this subtree.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = self.literal_text() {
            out.push_str(&text);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    /// Image source from `props.source` or `props.src`.
    ///
    /// Accepts a plain string or an object with a `uri` field.
    pub fn image_source(&self) -> Option<&str> {
        let value = self.props.get("source").or_else(|| self.props.get("src"))?;
        match value {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Object(map) => map.get("uri").and_then(Value::as_str),
            _ => None,
        }
    }

    /// QR/barcode payload from `props.value`, `props.data` or `props.content`.
    pub fn payload(&self) -> Option<String> {
        ["value", "data", "content"]
            .iter()
            .find_map(|key| match self.props.get(*key)? {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }

    /// Numeric prop, accepting numbers and numeric strings.
    pub fn number_prop(&self, key: &str) -> Option<f64> {
        match self.props.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// String prop.
    pub fn str_prop(&self, key: &str) -> Option<&str> {
        self.props.get(key).and_then(Value::as_str)
    }

    /// Page dimensions from `props.size`: a width, `[width, height]`, or
    /// `{width, height}`.
    pub fn page_size(&self) -> Option<(f32, Option<f32>)> {
        match self.props.get("size")? {
            Value::Number(n) => n.as_f64().map(|w| (w as f32, None)),
            Value::Array(items) => {
                let width = items.first()?.as_f64()? as f32;
                let height = items.get(1).and_then(Value::as_f64).map(|h| h as f32);
                Some((width, height))
            }
            Value::Object(map) => {
                let width = map.get("width")?.as_f64()? as f32;
                let height = map.get("height").and_then(Value::as_f64).map(|h| h as f32);
                Some((width, height))
            }
            _ => None,
        }
    }

    /// Page `wrap` flag. Defaults to `true`.
    pub fn page_wraps(&self) -> bool {
        self.props.get("wrap").and_then(Value::as_bool).unwrap_or(true)
    }
}
