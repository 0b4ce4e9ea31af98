//! 2D cellular worlds for the ALife demo.

pub mod grid_world;

pub use grid_world::{GridWorld, WorldMoe, WorldType};
