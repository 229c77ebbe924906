//! Canvas document data model.
//!
//! A canvas file is JSON shaped like `{ "nodes": [...], "edges": [...] }`.
//! Nodes are cards: inline markdown (`type: "text"`), a reference to a
//! vault file (`type: "file"`), or anything else the host invents later.
//! Edges are carried through untouched.
//!
//! Parsing is lenient: a node that cannot be understood is skipped, and
//! the footprint is read from whichever of the two known shapes is present:
//!
//! - flat: `x`, `y`, `width`, `height`
//! - nested: `pos` as `{x, y}` or `[x, y]`, `size` as `{w, h}`,
//!   `{width, height}` or `[w, h]`

use crate::id::NodeId;
use kurbo::{Point, Rect, Size};
use serde::Deserialize;
use serde_json::Value;
use smallvec::{SmallVec, smallvec};
use thiserror::Error;

/// File extension of documents the side editor can open.
pub const MARKDOWN_EXTENSION: &str = ".md";

// ─── Errors ──────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("malformed canvas JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("canvas JSON has no `nodes` array")]
    MissingNodes,

    #[error("node {0} not found in canvas document")]
    NodeNotFound(NodeId),
}

// ─── Node kind ───────────────────────────────────────────────────────────

/// What supplies a node's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Inline markdown stored in the node's `text` field.
    Text,
    /// A vault document referenced by the node's `file` field.
    File,
    /// `link`, `group`, or a type this crate does not know about.
    Other(String),
}

impl NodeKind {
    pub fn from_type(ty: &str) -> Self {
        match ty {
            "text" => Self::Text,
            "file" => Self::File,
            other => Self::Other(other.to_string()),
        }
    }
}

// ─── Footprint ───────────────────────────────────────────────────────────

/// A node's rectangular extent in document space.
///
/// Canvas versions disagree on whether the stored position is the top-left
/// corner or the center, so the anchor is kept raw and both readings are
/// offered to the hit-tester.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub anchor: Point,
    pub size: Size,
}

impl Footprint {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            anchor: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// The anchor read as the top-left corner.
    pub fn top_left_rect(&self) -> Rect {
        Rect::from_origin_size(self.anchor, self.size)
    }

    /// The anchor read as the center.
    pub fn centered_rect(&self) -> Rect {
        Rect::from_center_size(self.anchor, self.size)
    }

    /// Both readings, top-left first.
    pub fn candidates(&self) -> SmallVec<[Rect; 2]> {
        smallvec![self.top_left_rect(), self.centered_rect()]
    }

    /// Edge-inclusive containment under either reading.
    pub fn contains(&self, p: Point) -> bool {
        self.candidates().iter().any(|r| contains_inclusive(r, p))
    }
}

fn contains_inclusive(r: &Rect, p: Point) -> bool {
    p.x >= r.x0 && p.x <= r.x1 && p.y >= r.y0 && p.y <= r.y1
}

// ─── Node ────────────────────────────────────────────────────────────────

/// One card on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasNode {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Inline markdown (kind = text).
    pub text: Option<String>,
    /// Vault path of the referenced document (kind = file).
    pub file: Option<String>,
    pub footprint: Option<Footprint>,
}

impl CanvasNode {
    /// An inline markdown card without geometry.
    pub fn text(id: &str, text: &str) -> Self {
        Self {
            id: NodeId::intern(id),
            kind: NodeKind::Text,
            text: Some(text.to_string()),
            file: None,
            footprint: None,
        }
    }

    /// A card referencing a vault file, without geometry.
    pub fn file(id: &str, path: &str) -> Self {
        Self {
            id: NodeId::intern(id),
            kind: NodeKind::File,
            text: None,
            file: Some(path.to_string()),
            footprint: None,
        }
    }

    pub fn with_footprint(mut self, footprint: Footprint) -> Self {
        self.footprint = Some(footprint);
        self
    }

    /// The referenced vault path, only for file nodes.
    pub fn file_path(&self) -> Option<&str> {
        match self.kind {
            NodeKind::File => self.file.as_deref(),
            _ => None,
        }
    }

    /// Whether the side editor can open this node: inline text, or a
    /// file node pointing at a markdown document.
    pub fn is_text_bearing(&self) -> bool {
        match self.kind {
            NodeKind::Text => true,
            NodeKind::File => self
                .file_path()
                .is_some_and(|p| p.to_ascii_lowercase().ends_with(MARKDOWN_EXTENSION)),
            NodeKind::Other(_) => false,
        }
    }

    /// Parse one entry of the `nodes` array. `None` when the entry has no
    /// usable id.
    pub fn from_value(value: &Value) -> Option<Self> {
        let raw = RawNode::deserialize(value).ok()?;
        let id = NodeId::non_empty(&raw.id)?;
        let footprint = raw.footprint();
        Some(Self {
            id,
            kind: NodeKind::from_type(&raw.kind),
            text: raw.text,
            file: raw.file,
            footprint,
        })
    }
}

/// Serde view of a node entry. Nested geometry stays raw so a shape this
/// crate does not recognize drops the footprint, not the whole node.
#[derive(Deserialize)]
struct RawNode {
    id: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default, deserialize_with = "lenient_string")]
    text: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    file: Option<String>,
    x: Option<Value>,
    y: Option<Value>,
    width: Option<Value>,
    height: Option<Value>,
    pos: Option<Value>,
    size: Option<Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PosRepr {
    Xy { x: f64, y: f64 },
    Pair([f64; 2]),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SizeRepr {
    Wh { w: f64, h: f64 },
    WidthHeight { width: f64, height: f64 },
    Pair([f64; 2]),
}

impl RawNode {
    fn footprint(&self) -> Option<Footprint> {
        let num = |v: &Option<Value>| v.as_ref().and_then(Value::as_f64);
        if let (Some(x), Some(y), Some(w), Some(h)) = (
            num(&self.x),
            num(&self.y),
            num(&self.width),
            num(&self.height),
        ) {
            return Some(Footprint::new(x, y, w, h));
        }

        let pos = PosRepr::deserialize(self.pos.as_ref()?).ok()?;
        let size = SizeRepr::deserialize(self.size.as_ref()?).ok()?;
        let (x, y) = match pos {
            PosRepr::Xy { x, y } => (x, y),
            PosRepr::Pair([x, y]) => (x, y),
        };
        let (w, h) = match size {
            SizeRepr::Wh { w, h } => (w, h),
            SizeRepr::WidthHeight { width, height } => (width, height),
            SizeRepr::Pair([w, h]) => (w, h),
        };
        Some(Footprint::new(x, y, w, h))
    }
}

fn lenient_string<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

// ─── Document ────────────────────────────────────────────────────────────

/// A canvas: ordered nodes (later = drawn on top) plus opaque edges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanvasDocument {
    pub nodes: Vec<CanvasNode>,
    pub edges: Vec<Value>,
}

#[derive(Deserialize)]
struct RawDocument {
    nodes: Vec<Value>,
    #[serde(default)]
    edges: Vec<Value>,
}

impl CanvasDocument {
    /// Parse canvas file text.
    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// Build from an already-parsed JSON value (e.g. a live host snapshot).
    pub fn from_value(value: &Value) -> Result<Self, DocumentError> {
        if !value.get("nodes").is_some_and(Value::is_array) {
            return Err(DocumentError::MissingNodes);
        }
        let raw = RawDocument::deserialize(value)?;
        let mut nodes = Vec::with_capacity(raw.nodes.len());
        for entry in &raw.nodes {
            match CanvasNode::from_value(entry) {
                Some(node) => nodes.push(node),
                None => log::debug!("skipping canvas node without a usable id: {entry}"),
            }
        }
        Ok(Self {
            nodes,
            edges: raw.edges,
        })
    }

    /// First node with the given id. Ids are unique within a document.
    pub fn node(&self, id: NodeId) -> Option<&CanvasNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Nodes from topmost (last in document order) to bottommost.
    pub fn topmost_first(&self) -> impl Iterator<Item = &CanvasNode> {
        self.nodes.iter().rev()
    }
}

/// Overwrite the inline `text` of node `id` inside raw canvas JSON and
/// return the re-serialized document (2-space indent).
///
/// Works on the untyped JSON so every other node, every edge, and every
/// field this crate does not model survive unchanged and in order.
pub fn patch_node_text(raw: &str, id: NodeId, text: &str) -> Result<String, DocumentError> {
    let mut doc: Value = serde_json::from_str(raw)?;
    let nodes = doc
        .get_mut("nodes")
        .and_then(Value::as_array_mut)
        .ok_or(DocumentError::MissingNodes)?;
    let entry = nodes
        .iter_mut()
        .find(|n| n.get("id").and_then(Value::as_str) == Some(id.as_str()))
        .and_then(Value::as_object_mut)
        .ok_or(DocumentError::NodeNotFound(id))?;
    entry.insert("text".to_string(), Value::String(text.to_string()));
    Ok(serde_json::to_string_pretty(&doc)?)
}
