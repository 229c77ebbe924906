//! Plugin commands.
//!
//! Maps host command ids to semantic `PluginCommand`s. The host's command
//! palette only ever sees the id and display name.

/// Commands the plugin registers with the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginCommand {
    /// Show or hide the preview pane of the side panel.
    TogglePreview,
}

impl PluginCommand {
    pub const ALL: [PluginCommand; 1] = [PluginCommand::TogglePreview];

    /// Stable id passed to the host.
    pub fn id(self) -> &'static str {
        match self {
            Self::TogglePreview => "cmside-toggle-preview",
        }
    }

    /// Name shown in the command palette.
    pub fn name(self) -> &'static str {
        match self {
            Self::TogglePreview => "Canvas Side Editor: Toggle Preview",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }
}

/// Host command palette.
pub trait CommandRegistry {
    fn add_command(&mut self, id: &str, name: &str);
}

/// Register every plugin command with the host.
pub fn register_commands(registry: &mut dyn CommandRegistry) {
    for command in PluginCommand::ALL {
        registry.add_command(command.id(), command.name());
    }
}
