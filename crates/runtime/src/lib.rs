//! Scene-scoped behavior runtime: a lifetime-bound arena that releases all
//! per-scene allocations and heavy resources exactly once at scene close,
//! and a statically generated descriptor table that dispatches lifecycle
//! events over behavior kinds with one indexed lookup per call.

pub mod behavior;
pub mod entity;
pub mod scene;

pub use behavior::{
    noop_hook, BehaviorInstance, BehaviorKind, DescriptorTable, DispatchError, Dispatcher, HookFn,
    HookSet, InvokeError, KindId, LifecycleEvent, MAX_STATE_ALIGN,
};
pub use entity::{EntityId, EntityIdAllocator};
pub use scene::{
    ArenaError, ArenaStats, NoResources, ResourceError, ResourceHandle, ResourceLoader, SceneArena,
    SceneError, SceneWorld, StateSlabId, INITIAL_ARENA_CAPACITY,
};
