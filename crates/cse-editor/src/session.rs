//! Edit session state machine.
//!
//! The controller is the single writer of "which node is open". Pointer
//! handling and node resolution only hand it data; every transition that
//! leaves a node saves that node first.
//!
//! | From | Trigger | To | Effect |
//! |------|---------|----|--------|
//! | Closed | click on editable node `n` | Open(n) | read `n`, fill editor |
//! | Open(a) | click on editable node `b` | Open(b) | save `a`, then read `b` |
//! | Open(a) | click on `a` | Open(a) | nothing |
//! | Open(a) | background pointerdown | Open(a) | save `a` |
//! | Open(a) | background click | Closed | save `a` unless its pointerdown already did |
//! | Open(a) | panel close | Closed | save `a` |
//! | Open(a) | host zoom-to-selection | Closed | save `a`, suppress opens until cool-down |

use crate::attachments::{PastedImage, save_pasted_images};
use crate::content::{NodeContentIO, WriteOutcome};
use crate::host::{MarkdownRenderer, Panel, SettingsStore, TextEditor};
use crate::preview::PreviewPane;
use crate::settings::Settings;
use chrono::NaiveDateTime;
use cse_core::id::NodeId;
use cse_core::model::CanvasNode;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// How long after a host zoom finishes new sessions stay suppressed.
pub const ZOOM_COOLDOWN: Duration = Duration::from_millis(200);

/// Externally observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Open(NodeId),
}

/// What a controller call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Opened(NodeId),
    Switched { from: NodeId, to: NodeId },
    Closed(NodeId),
    Unchanged,
    /// A host zoom is running or just finished; the click was ignored.
    Suppressed,
}

/// The widgets making up one side panel.
pub struct PanelParts {
    pub editor: Box<dyn TextEditor>,
    pub panel: Box<dyn Panel>,
    pub renderer: Arc<dyn MarkdownRenderer>,
}

#[derive(Debug, Clone)]
struct EditSession {
    node_id: NodeId,
    node: CanvasNode,
    /// Path markdown links and pasted attachments resolve against.
    source_path: String,
}

#[derive(Debug, Default)]
struct ZoomGate {
    in_progress: bool,
    cooldown_until: Option<Instant>,
}

impl ZoomGate {
    fn is_active(&self, now: Instant) -> bool {
        self.in_progress || self.cooldown_until.is_some_and(|t| now < t)
    }
}

pub struct EditSessionController {
    io: NodeContentIO,
    editor: Box<dyn TextEditor>,
    panel: Box<dyn Panel>,
    preview: PreviewPane,
    session: Option<EditSession>,
    panel_shown: bool,
    preview_collapsed: bool,
    zoom: ZoomGate,
    /// Bumped on every open and on teardown.
    epoch: u64,
    /// Buffer text the current gesture's pointerdown already wrote.
    presaved: Option<String>,
    settings: Settings,
    settings_store: Arc<dyn SettingsStore>,
}

impl EditSessionController {
    pub fn new(
        io: NodeContentIO,
        parts: PanelParts,
        settings: Settings,
        settings_store: Arc<dyn SettingsStore>,
    ) -> Self {
        let preview = PreviewPane::new(parts.renderer, settings.preview_debounce());
        Self {
            io,
            editor: parts.editor,
            panel: parts.panel,
            preview,
            session: None,
            panel_shown: false,
            preview_collapsed: settings.initial_preview_collapsed(),
            zoom: ZoomGate::default(),
            epoch: 0,
            presaved: None,
            settings,
            settings_store,
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        match &self.session {
            Some(s) => SessionState::Open(s.node_id),
            None => SessionState::Closed,
        }
    }

    pub fn current_node(&self) -> Option<NodeId> {
        self.session.as_ref().map(|s| s.node_id)
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Source path of the open session.
    pub fn source_path(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.source_path.as_str())
    }

    pub fn buffer_text(&self) -> String {
        self.editor.text()
    }

    pub fn editor_mut(&mut self) -> &mut dyn TextEditor {
        self.editor.as_mut()
    }

    pub fn preview(&self) -> &PreviewPane {
        &self.preview
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_preview_collapsed(&self) -> bool {
        self.preview_collapsed
    }

    pub fn is_zoom_suppressed(&self) -> bool {
        self.zoom.is_active(Instant::now())
    }

    /// Changes whenever a session opens or the controller is torn down.
    /// A click resolved against an older epoch is stale.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    // ─── Pointer-driven transitions ──────────────────────────────────────

    /// Pointerdown with its early (best-effort) resolution. A background
    /// press while a session is open saves right away, so a pan that never
    /// becomes a click cannot leave edits pending. Returns whether a save
    /// was issued.
    pub async fn prepare_for_pointer_down(&mut self, early: Option<NodeId>) -> bool {
        self.presaved = None;
        if early.is_some() || self.session.is_none() {
            return false;
        }
        log::debug!("background pointerdown, saving open node");
        let text = self.editor.text();
        if let Some(WriteOutcome::Written(_)) = self.save_current().await {
            self.presaved = Some(text);
        }
        true
    }

    /// A qualifying single click resolved to `target` (authoritatively, at
    /// pointerup).
    pub async fn handle_click(&mut self, target: Option<NodeId>) -> Transition {
        let presaved = self.presaved.take();
        if self.is_zoom_suppressed() {
            return Transition::Suppressed;
        }
        if let Some(id) = target {
            if self.current_node() == Some(id) {
                return Transition::Unchanged;
            }
            match self.io.node_by_id(id).await {
                Some(node) if node.is_text_bearing() => {
                    return self.switch_to(node, presaved).await;
                }
                Some(_) => log::debug!("node {id} is not editable, treating click as background"),
                None => log::debug!("node {id} not in canvas data, treating click as background"),
            }
        }
        self.leave(presaved).await
    }

    /// Open `node`, saving whatever was open before.
    pub async fn open_or_switch(&mut self, node: CanvasNode) -> Transition {
        self.switch_to(node, None).await
    }

    async fn switch_to(&mut self, node: CanvasNode, presaved: Option<String>) -> Transition {
        let previous = self.current_node();
        if previous == Some(node.id) {
            return Transition::Unchanged;
        }
        if previous.is_some() {
            self.save_unless_presaved(presaved).await;
        }
        let to = node.id;
        self.open(node).await;
        match previous {
            Some(from) => Transition::Switched { from, to },
            None => Transition::Opened(to),
        }
    }

    async fn open(&mut self, node: CanvasNode) {
        self.preview.cancel_all();
        self.epoch = self.epoch.wrapping_add(1);
        self.presaved = None;

        let source_path = node
            .file_path()
            .map(str::to_string)
            .or_else(|| self.io.view().file_path())
            .unwrap_or_default();
        let initial = self.io.read_content(&node).await;

        log::debug!("opening node {} from {source_path:?}", node.id);
        self.session = Some(EditSession {
            node_id: node.id,
            node,
            source_path: source_path.clone(),
        });

        self.editor.replace_all(&initial);
        self.preview.set_source_path(&source_path);
        self.preview.render_now(&initial).await;

        if !self.panel_shown {
            self.panel.set_preview_collapsed(self.preview_collapsed);
            self.panel_shown = true;
        }
        self.panel.show();
        self.preview.schedule_settle(self.editor.text());
        self.editor.focus();
    }

    // ─── Save / close ────────────────────────────────────────────────────

    /// Write the editor buffer to the open node. `None` when closed.
    pub async fn save_current(&mut self) -> Option<WriteOutcome> {
        let session = self.session.as_ref()?;
        let text = self.editor.text();
        let outcome = self
            .io
            .write_content(&session.node, session.node_id, &text)
            .await;
        if let WriteOutcome::Failed(e) = &outcome {
            log::error!("edits to node {} were not saved: {e}", session.node_id);
        }
        Some(outcome)
    }

    /// Skip the write when this gesture's pointerdown already stored the
    /// same text.
    async fn save_unless_presaved(&mut self, presaved: Option<String>) {
        if presaved.is_some_and(|text| text == self.editor.text()) {
            log::debug!("open node already saved on pointerdown");
            return;
        }
        self.save_current().await;
    }

    /// Save, then close. Closing proceeds even if the save failed.
    pub async fn save_and_close(&mut self) -> Transition {
        self.leave(None).await
    }

    async fn leave(&mut self, presaved: Option<String>) -> Transition {
        let Some(id) = self.current_node() else {
            return Transition::Unchanged;
        };
        self.save_unless_presaved(presaved).await;
        self.close();
        Transition::Closed(id)
    }

    /// The panel's close button.
    pub async fn close_requested(&mut self) -> Transition {
        self.save_and_close().await
    }

    /// Hide the panel and forget the session, without saving.
    pub fn close(&mut self) {
        self.preview.cancel_all();
        self.panel.hide();
        self.session = None;
        self.presaved = None;
    }

    /// Drop all session state and timers.
    pub fn teardown(&mut self) {
        self.close();
        self.zoom = ZoomGate::default();
        self.epoch = self.epoch.wrapping_add(1);
    }

    // ─── Host zoom ───────────────────────────────────────────────────────

    /// The host is about to zoom to its selection.
    pub async fn begin_host_zoom(&mut self) {
        self.zoom.in_progress = true;
        if self.is_open() {
            log::debug!("host zoom-to-selection, saving and closing");
            self.save_and_close().await;
        }
    }

    /// The host zoom call returned; keep suppressing for the cool-down.
    pub fn end_host_zoom(&mut self) {
        self.zoom.in_progress = false;
        self.zoom.cooldown_until = Some(Instant::now() + ZOOM_COOLDOWN);
    }

    // ─── Editor events ───────────────────────────────────────────────────

    /// The editor buffer changed: re-render the preview, debounced.
    pub fn buffer_changed(&mut self) {
        if self.session.is_some() {
            self.preview.schedule(self.editor.text());
        }
    }

    /// Images pasted into the editor.
    pub async fn paste_images(&mut self, images: &[PastedImage]) {
        self.paste_images_at(images, chrono::Local::now().naive_local())
            .await;
    }

    pub async fn paste_images_at(&mut self, images: &[PastedImage], now: NaiveDateTime) {
        let Some(source_path) = self.source_path().map(str::to_string) else {
            return;
        };
        let links = save_pasted_images(self.io.store().as_ref(), &source_path, images, now).await;
        if links.is_empty() {
            return;
        }
        self.editor.insert_at_cursor(&links);
        self.buffer_changed();
    }

    // ─── Commands ────────────────────────────────────────────────────────

    /// Show or hide the preview pane and remember the choice. `None` when
    /// the panel has never been shown.
    pub async fn toggle_preview(&mut self) -> Option<bool> {
        if !self.panel_shown {
            return None;
        }
        self.preview_collapsed = !self.preview_collapsed;
        self.panel.set_preview_collapsed(self.preview_collapsed);
        self.settings.last_preview_collapsed = Some(self.preview_collapsed);
        self.settings.save(self.settings_store.as_ref()).await;
        Some(self.preview_collapsed)
    }
}
