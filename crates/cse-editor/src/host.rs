//! Collaborator interfaces.
//!
//! Everything the side editor touches but does not own sits behind these
//! traits: the canvas view and its DOM, the host's live canvas object, the
//! vault, the text-editing widget, the markdown renderer, the panel, and
//! the plugin's settings storage. A JavaScript bridge implements them for
//! the real host; tests implement them in memory.
//!
//! The live canvas object is not a stable API. It is modeled as a runtime
//! capability map (`has_method` / `call` / `property`) so every feature can
//! be probed before use and absent ones degrade instead of failing.

use async_trait::async_trait;
use cse_core::{ElementFrame, Point};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

// ─── Errors ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    #[error("host method `{0}` is not available")]
    Unsupported(String),

    #[error("host method `{method}` failed: {message}")]
    Failed { method: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("no such file: {0}")]
    NotFound(String),

    #[error("{0} is a folder")]
    NotAFile(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("storage I/O failed for {path}: {message}")]
    Io { path: String, message: String },
}

// ─── Live canvas ─────────────────────────────────────────────────────────

/// Method and property names probed on the live canvas object.
pub mod names {
    pub const GET_DATA: &str = "getData";
    pub const UPDATE_NODE: &str = "updateNode";
    pub const SET_NODE_TEXT: &str = "setNodeText";
    pub const REQUEST_SAVE: &str = "requestSave";
    pub const GET_SELECTION: &str = "getSelection";
    pub const SELECTION: &str = "selection";

    /// "Node at point" spellings seen across host versions, tried in order.
    pub const HIT_TEST_METHODS: [&str; 9] = [
        "getNodeAtPos",
        "getNodeAtPoint",
        "nodeAt",
        "hitTest",
        "pickNode",
        "getNodeFromScreenPoint",
        "getNodeFromPoint",
        "getNodeAtScreenPos",
        "getNodeAtScreenPoint",
    ];
}

/// The host's in-memory canvas object, probed by name.
pub trait LiveCanvas: Send + Sync {
    fn has_method(&self, name: &str) -> bool;

    /// Invoke a method. Sets are reported as arrays.
    fn call(&self, name: &str, args: &[Value]) -> Result<Value, HostError>;

    fn property(&self, name: &str) -> Option<Value>;

    /// Register (or with `None`, remove) the hook run around the host's
    /// zoom-to-selection. Returns `false` when the host offers no such seam.
    fn set_zoom_observer(&self, observer: Option<Arc<dyn ZoomObserver>>) -> bool {
        let _ = observer;
        false
    }
}

impl dyn LiveCanvas + '_ {
    /// Call `name` only if the host has it. `None` means absent.
    pub fn call_if_present(&self, name: &str, args: &[Value]) -> Option<Result<Value, HostError>> {
        self.has_method(name).then(|| self.call(name, args))
    }

    /// Ask the host to persist its canvas state. Best-effort.
    pub fn request_save(&self) {
        if let Some(Err(e)) = self.call_if_present(names::REQUEST_SAVE, &[]) {
            log::debug!("requestSave failed: {e}");
        }
    }
}

/// Hook around the host's own zoom-to-selection action.
///
/// The host awaits `before_zoom` before zooming and calls `after_zoom`
/// once the zoom call returns.
#[async_trait]
pub trait ZoomObserver: Send + Sync {
    async fn before_zoom(&self);
    async fn after_zoom(&self);
}

// ─── Canvas view (DOM side) ──────────────────────────────────────────────

/// What the DOM probe needs to know about one element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementInfo {
    /// `data-node-id` attribute.
    pub node_id_attr: Option<String>,
    /// `data-id` attribute.
    pub data_id_attr: Option<String>,
    pub classes: Vec<String>,
}

/// Classes the host puts on card elements.
pub const CARD_CLASSES: [&str; 2] = ["canvas-node", "canvas-card"];

impl ElementInfo {
    pub fn with_node_id(id: &str) -> Self {
        Self {
            node_id_attr: Some(id.to_string()),
            ..Self::default()
        }
    }

    pub fn with_class(class: &str) -> Self {
        Self {
            classes: vec![class.to_string()],
            ..Self::default()
        }
    }

    /// Matches `[data-node-id], [data-id], .canvas-node, .canvas-card`.
    pub fn is_card_host(&self) -> bool {
        self.node_id_attr.is_some()
            || self.data_id_attr.is_some()
            || self
                .classes
                .iter()
                .any(|c| CARD_CLASSES.contains(&c.as_str()))
    }

    /// The id this element carries, `data-node-id` first.
    pub fn carried_id(&self) -> Option<&str> {
        [&self.node_id_attr, &self.data_id_attr]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.is_empty())
    }
}

/// An element under the pointer followed by its ancestors.
pub type ElementPath = Vec<ElementInfo>;

/// One open canvas view in the host workspace.
pub trait CanvasView: Send + Sync {
    /// Whether the view is (still) a canvas view.
    fn is_canvas(&self) -> bool {
        true
    }

    /// Vault path of the canvas file backing the view.
    fn file_path(&self) -> Option<String>;

    fn live_canvas(&self) -> Option<Arc<dyn LiveCanvas>>;

    /// Elements stacked under a screen point, topmost first.
    fn elements_at(&self, screen: Point) -> Vec<ElementPath>;

    /// Elements that may carry the canvas transform, nearest first.
    fn transform_frames(&self) -> Vec<ElementFrame>;

    /// The canvas viewport element.
    fn viewport_frame(&self) -> Option<ElementFrame>;
}

// ─── Vault ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Folder,
}

/// Vault settings that affect where pasted attachments go.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VaultPreferences {
    /// `attachmentFolderPath`: `./rel` relative to the note, else vault-absolute.
    pub attachment_folder: Option<String>,
    /// `useMarkdownLinks`: `![](path)` instead of `![[name]]`.
    pub use_markdown_links: bool,
}

/// Persistent document store (the vault). No locking is assumed; other
/// writers may change files at any time.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn read(&self, path: &str) -> Result<String, StoreError>;

    async fn write(&self, path: &str, text: &str) -> Result<(), StoreError>;

    /// What lives at `path`, if anything.
    fn resolve(&self, path: &str) -> Option<EntryKind>;

    async fn create_binary(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError>;

    async fn create_folder(&self, path: &str) -> Result<(), StoreError>;

    fn preferences(&self) -> VaultPreferences {
        VaultPreferences::default()
    }
}

// ─── Panel widgets ───────────────────────────────────────────────────────

/// The text-editing widget inside the panel.
///
/// Change notifications and paste interception flow the other way: the
/// bridge forwards them to `EditSessionController::buffer_changed` and
/// `EditSessionController::paste_images`.
pub trait TextEditor: Send {
    fn text(&self) -> String;

    /// Replace the whole buffer.
    fn replace_all(&mut self, text: &str);

    /// Replace the selection (or insert at the caret).
    fn insert_at_cursor(&mut self, text: &str);

    fn focus(&mut self);
}

/// Markdown → DOM renderer targeting the panel's preview pane.
#[async_trait]
pub trait MarkdownRenderer: Send + Sync {
    async fn render(&self, text: &str, source_path: &str) -> Result<(), HostError>;
}

/// Visibility and layout of the side panel.
pub trait Panel: Send {
    fn show(&mut self);
    fn hide(&mut self);
    fn set_preview_collapsed(&mut self, collapsed: bool);
}

/// Persistent plugin data (settings).
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> Result<Option<Value>, StoreError>;
    async fn save(&self, data: Value) -> Result<(), StoreError>;
}
