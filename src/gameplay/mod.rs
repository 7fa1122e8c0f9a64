pub mod culling;
pub mod forces;
pub mod governor;
pub mod spawner;
pub mod state;
pub mod stuck;
pub mod trails;
