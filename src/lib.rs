pub mod app;
pub mod core;
pub mod debug;
pub mod gameplay;
pub mod interaction;
pub mod physics;
pub mod rendering;

// Curated re-exports
pub use crate::core::components::{Marble, MarbleRadius, Species};
pub use crate::core::config::config::{GameConfig, WindowConfig};
pub use crate::core::course::generator::generate_course;
pub use crate::core::course::layout::CourseSpec;
pub use app::game::GamePlugin;
