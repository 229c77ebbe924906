//! Node resolution: which card is under the pointer.
//!
//! The host offers no stable "node at point" API, so resolution is a
//! cascade of strategies, cheapest and most specific first:
//!
//! 1. DOM probe: nearest card element under the point carrying an id
//! 2. geometric hit-test of the canvas document
//! 3. host "node at point" methods, under every known spelling
//! 4. host selection state
//! 5. after a short settle delay, host selection state once more
//!
//! Pointerdown only runs the cheap prefix (1–2). Pointerup always runs
//! the full cascade and never reuses the pointerdown guess.
//!
//! A miss is `None`, never an error.

use crate::content::NodeContentIO;
use crate::host::{CanvasView, LiveCanvas, names};
use cse_core::Point;
use cse_core::geometry::screen_to_document_point;
use cse_core::hit_test;
use cse_core::id::NodeId;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

/// Wait before re-reading the host selection (step 5).
pub const SELECTION_SETTLE_DELAY: Duration = Duration::from_millis(120);

/// Which strategy produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Dom,
    Geometry,
    HostApi,
    Selection,
    SettledSelection,
}

#[derive(Clone)]
pub struct NodeLocator {
    view: Arc<dyn CanvasView>,
    io: NodeContentIO,
    settle_delay: Duration,
}

impl NodeLocator {
    pub fn new(io: NodeContentIO) -> Self {
        Self {
            view: io.view().clone(),
            io,
            settle_delay: SELECTION_SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    // ─── Cascades ────────────────────────────────────────────────────────

    /// Best-effort guess at pointerdown: DOM probe, then geometry.
    pub async fn resolve_early(&self, screen: Point) -> Option<NodeId> {
        if let Some(id) = self.probe_dom(screen) {
            return Some(id);
        }
        self.hit_test_document(screen).await
    }

    /// Authoritative resolution at pointerup.
    pub async fn resolve_node_at(&self, screen: Point) -> Option<NodeId> {
        self.resolve_with_strategy(screen).await.map(|(id, _)| id)
    }

    /// Like `resolve_node_at`, also reporting the winning strategy.
    pub async fn resolve_with_strategy(&self, screen: Point) -> Option<(NodeId, Strategy)> {
        if let Some(id) = self.probe_dom(screen) {
            return Some((id, Strategy::Dom));
        }
        if let Some(id) = self.hit_test_document(screen).await {
            return Some((id, Strategy::Geometry));
        }
        if let Some(id) = self.probe_host_api(screen) {
            return Some((id, Strategy::HostApi));
        }
        if let Some(id) = self.resolve_selected_node() {
            return Some((id, Strategy::Selection));
        }
        tokio::time::sleep(self.settle_delay).await;
        let id = self.resolve_selected_node()?;
        Some((id, Strategy::SettledSelection))
    }

    // ─── Strategies ──────────────────────────────────────────────────────

    /// Step 1: walk elements under the point, topmost first; for each take
    /// the nearest card ancestor and return its id if it carries one.
    pub fn probe_dom(&self, screen: Point) -> Option<NodeId> {
        self.view.elements_at(screen).iter().find_map(|path| {
            let host = path.iter().find(|el| el.is_card_host())?;
            NodeId::non_empty(host.carried_id()?)
        })
    }

    /// Step 2: hit-test the document at the transformed point.
    pub async fn hit_test_document(&self, screen: Point) -> Option<NodeId> {
        let doc = self.io.read_canvas_data().await?;
        let frames = self.view.transform_frames();
        let viewport = self.view.viewport_frame();
        let p = screen_to_document_point(&frames, viewport.as_ref(), screen);
        hit_test(&doc, p)
    }

    /// Step 3: ask the host directly, trying every known method name.
    pub fn probe_host_api(&self, screen: Point) -> Option<NodeId> {
        let live = self.view.live_canvas()?;
        let args = [json!(screen.x), json!(screen.y)];
        names::HIT_TEST_METHODS.iter().find_map(|name| {
            match live.call_if_present(name, &args)? {
                Ok(value) => node_id_from_value(&value),
                Err(e) => {
                    log::debug!("host {name} failed: {e}");
                    None
                }
            }
        })
    }

    /// Step 4: the first selected node, if any.
    pub fn resolve_selected_node(&self) -> Option<NodeId> {
        let live = self.view.live_canvas()?;
        selected_node(live.as_ref())
    }
}

fn selected_node(live: &dyn LiveCanvas) -> Option<NodeId> {
    let from_accessor = match live.call_if_present(names::GET_SELECTION, &[]) {
        Some(Ok(value)) if !is_empty_value(&value) => Some(value),
        Some(Err(e)) => {
            log::debug!("host getSelection failed: {e}");
            None
        }
        _ => None,
    };
    let selection = from_accessor.or_else(|| live.property(names::SELECTION))?;
    node_id_from_value(&selection)
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Normalize the shapes hosts return for "a node": a bare id string, an
/// object with an `id`, or a list/set whose first entry is either.
pub fn node_id_from_value(value: &Value) -> Option<NodeId> {
    match value {
        Value::String(s) => NodeId::non_empty(s),
        Value::Object(map) => NodeId::non_empty(map.get("id")?.as_str()?),
        Value::Array(items) => match items.first()? {
            Value::String(s) => NodeId::non_empty(s),
            Value::Object(map) => NodeId::non_empty(map.get("id")?.as_str()?),
            _ => None,
        },
        _ => None,
    }
}
