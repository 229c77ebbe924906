pub mod geometry;
pub mod hit;
pub mod id;
pub mod model;

pub use geometry::{ElementFrame, ViewTransform, screen_to_document_point};
pub use hit::hit_test;
pub use id::NodeId;
pub use model::*;

// Re-export kurbo geometry types so downstream crates agree on versions
pub use kurbo::{Point, Rect, Size, Vec2};
