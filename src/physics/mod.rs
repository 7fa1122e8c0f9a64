pub mod grid;
pub mod rapier;
