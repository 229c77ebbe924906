//! Per-canvas event wiring.
//!
//! A `CanvasAttachment` owns everything bound to one canvas view: the
//! gesture classifier, the node locator, the session controller and the
//! zoom interception. Pointer handlers run in the host's event order; the
//! controller sits behind an async mutex so a save started on pointerdown
//! always completes before the pointerup that follows acts on it.
//!
//! Resolving a click can wait on the host's selection to settle. A click
//! whose resolution finishes after a newer pointerdown, a newer session
//! open, or teardown is dropped.

use crate::content::NodeContentIO;
use crate::gesture::GestureClassifier;
use crate::host::{CanvasView, DocumentStore, LiveCanvas, SettingsStore, ZoomObserver};
use crate::input::{PointerButton, PointerEvent};
use crate::locator::NodeLocator;
use crate::session::{EditSessionController, PanelParts, SessionState, Transition};
use crate::settings::Settings;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, MutexGuard, PoisonError, Weak};
use tokio::sync::Mutex;

pub type SharedController = Arc<Mutex<EditSessionController>>;

pub struct CanvasAttachment {
    view: Arc<dyn CanvasView>,
    locator: NodeLocator,
    gesture: std::sync::Mutex<GestureClassifier>,
    /// Bumped on every handled pointerdown.
    gesture_epoch: AtomicU64,
    controller: SharedController,
    zoom_hook: Option<ZoomInterception>,
}

impl CanvasAttachment {
    pub fn attach(
        view: Arc<dyn CanvasView>,
        store: Arc<dyn DocumentStore>,
        parts: PanelParts,
        settings: Settings,
        settings_store: Arc<dyn SettingsStore>,
    ) -> Self {
        let io = NodeContentIO::new(view.clone(), store);
        let locator = NodeLocator::new(io.clone());
        let controller = Arc::new(Mutex::new(EditSessionController::new(
            io,
            parts,
            settings,
            settings_store,
        )));
        let zoom_hook = ZoomInterception::install(view.as_ref(), &controller);
        if zoom_hook.is_none() {
            log::debug!("host zoom-to-selection not interceptable on this canvas");
        }
        Self {
            view,
            locator,
            gesture: std::sync::Mutex::new(GestureClassifier::new()),
            gesture_epoch: AtomicU64::new(0),
            controller,
            zoom_hook,
        }
    }

    pub fn view(&self) -> &Arc<dyn CanvasView> {
        &self.view
    }

    pub fn locator(&self) -> &NodeLocator {
        &self.locator
    }

    pub fn controller(&self) -> &SharedController {
        &self.controller
    }

    pub fn intercepts_zoom(&self) -> bool {
        self.zoom_hook.is_some()
    }

    pub async fn state(&self) -> SessionState {
        self.controller.lock().await.state()
    }

    fn gesture(&self) -> MutexGuard<'_, GestureClassifier> {
        self.gesture.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ignores(&self, event: &PointerEvent) -> bool {
        event.in_panel || !self.view.is_canvas()
    }

    // ─── Pointer events ──────────────────────────────────────────────────

    pub async fn pointer_down(&self, event: &PointerEvent) {
        if self.ignores(event) {
            return;
        }
        self.gesture().pointer_down(event);
        self.gesture_epoch.fetch_add(1, Ordering::SeqCst);
        let early = self.locator.resolve_early(event.position).await;
        log::debug!("pointerdown at {:?} resolves early to {early:?}", event.position);
        self.controller
            .lock()
            .await
            .prepare_for_pointer_down(early)
            .await;
    }

    pub fn pointer_move(&self, event: &PointerEvent) {
        if self.ignores(event) {
            return;
        }
        self.gesture().pointer_move(event);
    }

    pub async fn pointer_up(&self, event: &PointerEvent) -> Transition {
        if self.ignores(event) {
            return Transition::Unchanged;
        }
        let Some(classification) = self.gesture().pointer_up(event) else {
            return Transition::Unchanged;
        };
        let gesture = self.gesture_epoch.load(Ordering::SeqCst);
        let session = {
            let controller = self.controller.lock().await;
            if controller.is_zoom_suppressed() {
                log::debug!("pointerup during host zoom ignored");
                return Transition::Suppressed;
            }
            controller.epoch()
        };
        if !classification.is_single_click() {
            return Transition::Unchanged;
        }
        let target = self.locator.resolve_node_at(event.position).await;
        log::debug!("click at {:?} resolves to {target:?}", event.position);

        let mut controller = self.controller.lock().await;
        if controller.epoch() != session || self.gesture_epoch.load(Ordering::SeqCst) != gesture {
            log::debug!("click at {:?} overtaken while resolving, dropped", event.position);
            return Transition::Unchanged;
        }
        controller.handle_click(target).await
    }

    /// Whether the host's double-click (create card / zoom) should be
    /// swallowed. While a session is open a primary double-click outside
    /// the panel would otherwise steal the canvas focus.
    pub async fn double_click(&self, button: PointerButton, in_panel: bool) -> bool {
        if in_panel || button != PointerButton::Primary || !self.view.is_canvas() {
            return false;
        }
        self.controller.lock().await.is_open()
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Save and close the open session, then release the canvas.
    pub async fn detach(mut self) {
        {
            let mut controller = self.controller.lock().await;
            controller.save_and_close().await;
            controller.teardown();
        }
        self.zoom_hook = None;
    }
}

/// The installed zoom observer. Dropping it restores the host's own
/// zoom-to-selection.
struct ZoomInterception {
    live: Arc<dyn LiveCanvas>,
}

impl ZoomInterception {
    fn install(view: &dyn CanvasView, controller: &SharedController) -> Option<Self> {
        let live = view.live_canvas()?;
        let observer: Arc<dyn ZoomObserver> = Arc::new(SessionZoomObserver {
            controller: Arc::downgrade(controller),
        });
        if !live.set_zoom_observer(Some(observer)) {
            return None;
        }
        Some(Self { live })
    }
}

impl Drop for ZoomInterception {
    fn drop(&mut self) {
        self.live.set_zoom_observer(None);
    }
}

struct SessionZoomObserver {
    controller: Weak<Mutex<EditSessionController>>,
}

#[async_trait]
impl ZoomObserver for SessionZoomObserver {
    async fn before_zoom(&self) {
        if let Some(controller) = self.controller.upgrade() {
            controller.lock().await.begin_host_zoom().await;
        }
    }

    async fn after_zoom(&self) {
        if let Some(controller) = self.controller.upgrade() {
            controller.lock().await.end_host_zoom();
        }
    }
}
