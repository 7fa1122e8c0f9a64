pub mod generator;
pub mod layout;
pub mod obstacles;
pub mod spawn;

pub use layout::{Course, CourseSpec};
pub use spawn::CoursePlugin;
