pub mod arena;
pub mod resources;
pub mod world;

pub use arena::{ArenaError, ArenaStats, SceneArena, StateSlabId, INITIAL_ARENA_CAPACITY};
pub use resources::{NoResources, ResourceError, ResourceHandle, ResourceLoader};
pub use world::{SceneError, SceneWorld};
