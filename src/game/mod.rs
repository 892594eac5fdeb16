//! Game simulation modules

pub mod arena;
pub mod collision;
pub mod input;
pub mod lifecycle;
pub mod physics;
pub mod player;
pub mod snapshot;
pub mod spawn;
pub mod ticker;
pub mod world;

pub use player::{Player, PlayerId};
pub use world::World;
