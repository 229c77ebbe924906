pub mod attach;
pub mod attachments;
pub mod buffer;
pub mod commands;
pub mod content;
pub mod gesture;
pub mod host;
pub mod input;
pub mod locator;
pub mod plugin;
pub mod preview;
pub mod session;
pub mod settings;

pub use attach::CanvasAttachment;
pub use content::{NodeContentIO, WriteOutcome, WriteRoute};
pub use gesture::GestureClassifier;
pub use input::{PointerButton, PointerEvent};
pub use locator::NodeLocator;
pub use plugin::{PanelFactory, SideEditorPlugin};
pub use session::{EditSessionController, PanelParts, SessionState, Transition};
pub use settings::Settings;
