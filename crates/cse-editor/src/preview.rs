//! Live preview scheduling.
//!
//! Two cancellable timers feed the markdown renderer:
//!
//! - the debounced render: every buffer change cancels the pending render
//!   and schedules a new one (last write wins, never a queue)
//! - the settle render: one re-render shortly after a session opens, once
//!   the panel has finished its layout transition
//!
//! Opening another session or tearing the panel down cancels both, so a
//! render for a previous node can never land on top of the current one.

use crate::host::MarkdownRenderer;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Lower bound on the debounce delay.
pub const MIN_DEBOUNCE: Duration = Duration::from_millis(16);

/// Delay of the re-render after a session opens.
pub const SETTLE_RENDER_DELAY: Duration = Duration::from_millis(80);

pub struct PreviewPane {
    renderer: Arc<dyn MarkdownRenderer>,
    source_path: String,
    debounce: Duration,
    pending: Option<JoinHandle<()>>,
    settle: Option<JoinHandle<()>>,
}

impl PreviewPane {
    pub fn new(renderer: Arc<dyn MarkdownRenderer>, debounce: Duration) -> Self {
        Self {
            renderer,
            source_path: String::new(),
            debounce: debounce.max(MIN_DEBOUNCE),
            pending: None,
            settle: None,
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Path links in the rendered markdown resolve against.
    pub fn set_source_path(&mut self, path: &str) {
        self.source_path = path.to_string();
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    /// Render immediately.
    pub async fn render_now(&self, text: &str) {
        render(self.renderer.as_ref(), text, &self.source_path).await;
    }

    /// Debounced render of `text`, replacing any pending one.
    pub fn schedule(&mut self, text: String) {
        cancel(&mut self.pending);
        self.pending = Some(self.spawn_render(self.debounce, text));
    }

    /// One-shot re-render after the panel settles.
    pub fn schedule_settle(&mut self, text: String) {
        cancel(&mut self.settle);
        self.settle = Some(self.spawn_render(SETTLE_RENDER_DELAY, text));
    }

    pub fn has_pending(&self) -> bool {
        [&self.pending, &self.settle]
            .into_iter()
            .flatten()
            .any(|h| !h.is_finished())
    }

    /// Cancel both timers.
    pub fn cancel_all(&mut self) {
        cancel(&mut self.pending);
        cancel(&mut self.settle);
    }

    fn spawn_render(&self, delay: Duration, text: String) -> JoinHandle<()> {
        let renderer = self.renderer.clone();
        let source_path = self.source_path.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            render(renderer.as_ref(), &text, &source_path).await;
        })
    }
}

impl Drop for PreviewPane {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

fn cancel(handle: &mut Option<JoinHandle<()>>) {
    if let Some(h) = handle.take() {
        h.abort();
    }
}

async fn render(renderer: &dyn MarkdownRenderer, text: &str, source_path: &str) {
    if let Err(e) = renderer.render(text, source_path).await {
        log::error!("preview render failed: {e}");
    }
}
