//! Plugin settings.
//!
//! Stored by the host as a JSON object. Missing keys take their defaults,
//! and data that cannot be read at all yields `Settings::default()`.

use crate::host::SettingsStore;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Initial side panel width in px.
    pub default_panel_width: u32,

    /// Delay between the last keystroke and the preview re-render.
    pub preview_debounce_ms: u64,

    /// Start with the preview pane hidden.
    pub default_preview_collapsed: bool,

    /// Last state chosen with the toggle, overrides the default when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_preview_collapsed: Option<bool>,

    /// Editor font size in px. `None` follows the theme.
    pub editor_font_size: Option<f32>,

    /// Preview font size in px. `None` follows the theme.
    pub preview_font_size: Option<f32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_panel_width: 480,
            preview_debounce_ms: 80,
            default_preview_collapsed: false,
            last_preview_collapsed: None,
            editor_font_size: None,
            preview_font_size: None,
        }
    }
}

impl Settings {
    /// Load from the host's plugin data, falling back to defaults.
    pub async fn load(store: &dyn SettingsStore) -> Self {
        match store.load().await {
            Ok(Some(data)) => serde_json::from_value(data).unwrap_or_else(|e| {
                log::warn!("ignoring malformed settings: {e}");
                Self::default()
            }),
            Ok(None) => Self::default(),
            Err(e) => {
                log::warn!("could not load settings: {e}");
                Self::default()
            }
        }
    }

    /// Persist. Failures are logged.
    pub async fn save(&self, store: &dyn SettingsStore) {
        let data = match serde_json::to_value(self) {
            Ok(data) => data,
            Err(e) => {
                log::error!("could not serialize settings: {e}");
                return;
            }
        };
        if let Err(e) = store.save(data).await {
            log::error!("could not save settings: {e}");
        }
    }

    pub fn preview_debounce(&self) -> Duration {
        Duration::from_millis(self.preview_debounce_ms)
    }

    /// Whether the preview starts collapsed.
    pub fn initial_preview_collapsed(&self) -> bool {
        self.last_preview_collapsed
            .unwrap_or(self.default_preview_collapsed)
    }
}
