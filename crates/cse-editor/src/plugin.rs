//! Plugin lifecycle.
//!
//! `SideEditorPlugin` is what the host loads. It keeps at most one
//! `CanvasAttachment`, following the active view, and routes palette
//! commands to it.

use crate::attach::CanvasAttachment;
use crate::commands::{CommandRegistry, PluginCommand, register_commands};
use crate::host::{CanvasView, DocumentStore, SettingsStore};
use crate::session::PanelParts;
use crate::settings::Settings;
use std::sync::Arc;

/// Builds the side panel widgets for a canvas view.
pub trait PanelFactory: Send + Sync {
    fn create_panel(&self, view: &dyn CanvasView, settings: &Settings) -> PanelParts;
}

pub struct SideEditorPlugin {
    store: Arc<dyn DocumentStore>,
    settings_store: Arc<dyn SettingsStore>,
    panels: Box<dyn PanelFactory>,
    settings: Settings,
    attachment: Option<CanvasAttachment>,
}

impl SideEditorPlugin {
    pub async fn load(
        store: Arc<dyn DocumentStore>,
        settings_store: Arc<dyn SettingsStore>,
        panels: Box<dyn PanelFactory>,
        commands: &mut dyn CommandRegistry,
    ) -> Self {
        let settings = Settings::load(settings_store.as_ref()).await;
        register_commands(commands);
        log::info!("canvas side editor loaded");
        Self {
            store,
            settings_store,
            panels,
            settings,
            attachment: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn attachment(&self) -> Option<&CanvasAttachment> {
        self.attachment.as_ref()
    }

    /// The active view or the layout changed. Re-announcing the attached
    /// canvas is a no-op; any other view detaches first.
    pub async fn set_active_view(&mut self, view: Option<Arc<dyn CanvasView>>) {
        let view = view.filter(|v| v.is_canvas());
        if let (Some(current), Some(next)) = (&self.attachment, &view)
            && Arc::ptr_eq(current.view(), next)
        {
            return;
        }
        self.detach().await;
        let Some(view) = view else {
            return;
        };
        log::debug!("attaching to canvas {:?}", view.file_path());
        let parts = self.panels.create_panel(view.as_ref(), &self.settings);
        self.attachment = Some(CanvasAttachment::attach(
            view,
            self.store.clone(),
            parts,
            self.settings.clone(),
            self.settings_store.clone(),
        ));
    }

    async fn detach(&mut self) {
        let Some(attachment) = self.attachment.take() else {
            return;
        };
        self.settings = attachment.controller().lock().await.settings().clone();
        attachment.detach().await;
    }

    /// Run a palette command by id. Returns whether it did anything.
    pub async fn run_command(&mut self, id: &str) -> bool {
        let Some(command) = PluginCommand::from_id(id) else {
            log::warn!("unknown command {id}");
            return false;
        };
        let Some(attachment) = &self.attachment else {
            return false;
        };
        match command {
            PluginCommand::TogglePreview => {
                let collapsed = attachment.controller().lock().await.toggle_preview().await;
                if collapsed.is_some() {
                    self.settings.last_preview_collapsed = collapsed;
                }
                collapsed.is_some()
            }
        }
    }

    /// Save any open session and release the canvas.
    pub async fn unload(&mut self) {
        self.detach().await;
        log::info!("canvas side editor unloaded");
    }
}
