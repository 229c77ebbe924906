//! Reading and writing node content.
//!
//! Reads come from the node itself (inline text) or the vault file it
//! references. Writes go through a cascade, first applicable route wins:
//!
//! 1. file node → write the referenced vault file, then `requestSave`
//! 2. live canvas exposes `updateNode` / `setNodeText` → mutate in memory,
//!    then `requestSave`
//! 3. otherwise → patch the node's `text` in the canvas JSON and rewrite
//!    the whole file
//!
//! Nothing here returns an error to the caller: failures are logged and
//! reported in the returned `WriteOutcome`.

use crate::host::{CanvasView, DocumentStore, EntryKind, LiveCanvas, StoreError, names};
use cse_core::id::NodeId;
use cse_core::model::{CanvasDocument, CanvasNode, DocumentError, NodeKind, patch_node_text};
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("canvas view has no backing file")]
    NoCanvasFile,
}

/// Which route of the write cascade persisted the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteRoute {
    ExternalFile,
    LiveUpdateNode,
    LiveSetNodeText,
    CanvasJson,
}

#[derive(Debug)]
pub enum WriteOutcome {
    Written(WriteRoute),
    Failed(ContentError),
}

impl WriteOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written(_))
    }
}

/// Node content reader/writer bound to one canvas view.
#[derive(Clone)]
pub struct NodeContentIO {
    view: Arc<dyn CanvasView>,
    store: Arc<dyn DocumentStore>,
}

impl NodeContentIO {
    pub fn new(view: Arc<dyn CanvasView>, store: Arc<dyn DocumentStore>) -> Self {
        Self { view, store }
    }

    pub fn view(&self) -> &Arc<dyn CanvasView> {
        &self.view
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    // ─── Canvas data ─────────────────────────────────────────────────────

    /// Current canvas document: the live snapshot when the host offers a
    /// complete one, else the canvas file. `None` when neither parses.
    pub async fn read_canvas_data(&self) -> Option<CanvasDocument> {
        if let Some(doc) = self.live_snapshot() {
            return Some(doc);
        }
        let path = self.view.file_path()?;
        let raw = match self.store.read(&path).await {
            Ok(raw) => raw,
            Err(e) => {
                log::debug!("canvas file {path} unreadable: {e}");
                return None;
            }
        };
        match CanvasDocument::from_json(&raw) {
            Ok(doc) => Some(doc),
            Err(e) => {
                log::debug!("canvas file {path} unparseable: {e}");
                None
            }
        }
    }

    fn live_snapshot(&self) -> Option<CanvasDocument> {
        let live = self.view.live_canvas()?;
        let data = match live.call_if_present(names::GET_DATA, &[])? {
            Ok(data) => data,
            Err(e) => {
                log::debug!("live getData failed: {e}");
                return None;
            }
        };
        if data.get("nodes").is_none() || data.get("edges").is_none() {
            return None;
        }
        CanvasDocument::from_value(&data).ok()
    }

    pub async fn node_by_id(&self, id: NodeId) -> Option<CanvasNode> {
        self.read_canvas_data().await?.node(id).cloned()
    }

    // ─── Read ────────────────────────────────────────────────────────────

    /// The node's editable text. Missing or unreadable sources read as
    /// empty.
    pub async fn read_content(&self, node: &CanvasNode) -> String {
        match node.kind {
            NodeKind::Text => node.text.clone().unwrap_or_default(),
            NodeKind::File => {
                let Some(path) = node.file_path() else {
                    return String::new();
                };
                match self.read_file(path).await {
                    Ok(text) => text,
                    Err(e) => {
                        log::warn!("could not read {path} for node {}: {e}", node.id);
                        String::new()
                    }
                }
            }
            NodeKind::Other(_) => String::new(),
        }
    }

    async fn read_file(&self, path: &str) -> Result<String, StoreError> {
        self.expect_file(path)?;
        self.store.read(path).await
    }

    fn expect_file(&self, path: &str) -> Result<(), StoreError> {
        match self.store.resolve(path) {
            Some(EntryKind::File) => Ok(()),
            Some(EntryKind::Folder) => Err(StoreError::NotAFile(path.to_string())),
            None => Err(StoreError::NotFound(path.to_string())),
        }
    }

    // ─── Write ───────────────────────────────────────────────────────────

    /// Persist `text` as the content of `node` (addressed by `id`).
    pub async fn write_content(&self, node: &CanvasNode, id: NodeId, text: &str) -> WriteOutcome {
        let live = self.view.live_canvas();

        if let Some(path) = node.file_path() {
            let result = match self.expect_file(path) {
                Ok(()) => self.store.write(path, text).await,
                Err(e) => Err(e),
            };
            if let Some(live) = &live {
                live.request_save();
            }
            return match result {
                Ok(()) => WriteOutcome::Written(WriteRoute::ExternalFile),
                Err(e) => {
                    log::error!("failed to write file node {id} content to {path}: {e}");
                    WriteOutcome::Failed(e.into())
                }
            };
        }

        if let Some(live) = &live
            && let Some(route) = write_live(live.as_ref(), id, text)
        {
            live.request_save();
            return WriteOutcome::Written(route);
        }

        match self.patch_canvas_file(id, text).await {
            Ok(()) => {
                if let Some(live) = &live {
                    live.request_save();
                }
                WriteOutcome::Written(WriteRoute::CanvasJson)
            }
            Err(e) => {
                log::error!("failed to write canvas text for node {id}: {e}");
                WriteOutcome::Failed(e)
            }
        }
    }

    async fn patch_canvas_file(&self, id: NodeId, text: &str) -> Result<(), ContentError> {
        let path = self.view.file_path().ok_or(ContentError::NoCanvasFile)?;
        let raw = self.store.read(&path).await?;
        let patched = patch_node_text(&raw, id, text)?;
        self.store.write(&path, &patched).await?;
        Ok(())
    }
}

/// Mutate the node through the host's in-memory API. `None` when the host
/// has no mutation method or the call failed.
fn write_live(live: &dyn LiveCanvas, id: NodeId, text: &str) -> Option<WriteRoute> {
    let id_arg = Value::String(id.as_str().to_string());
    let (route, result) = if live.has_method(names::UPDATE_NODE) {
        (
            WriteRoute::LiveUpdateNode,
            live.call(names::UPDATE_NODE, &[id_arg, json!({ "text": text })]),
        )
    } else if live.has_method(names::SET_NODE_TEXT) {
        (
            WriteRoute::LiveSetNodeText,
            live.call(names::SET_NODE_TEXT, &[id_arg, Value::String(text.to_string())]),
        )
    } else {
        return None;
    };
    match result {
        Ok(_) => Some(route),
        Err(e) => {
            log::debug!("live mutation for node {id} failed, falling back to canvas JSON: {e}");
            None
        }
    }
}
