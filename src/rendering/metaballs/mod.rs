pub mod material;
pub mod systems;

pub use material::{GpuMarble, MetaballsMaterial, MAX_MARBLES};
pub use systems::MetaballsPlugin;
