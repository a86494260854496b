use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

use crate::behavior::descriptor::{DescriptorTable, KindId};
use crate::behavior::dispatch::{BehaviorInstance, Dispatcher, InvokeError, LifecycleEvent};
use crate::entity::{EntityId, EntityIdAllocator};

use super::arena::{ArenaError, ArenaStats, SceneArena};
use super::resources::{ResourceHandle, ResourceLoader};

#[derive(Debug, Error)]
pub enum SceneError {
    #[error(transparent)]
    Arena(#[from] ArenaError),
    #[error(transparent)]
    Invoke(#[from] InvokeError),
}

#[derive(Debug, Clone, Copy)]
struct Attachment {
    entity: EntityId,
    instance: BehaviorInstance,
    retired: bool,
}

/// Update runs for every active instance before any AfterUpdate runs; the
/// draw phases follow and have no cross-instance ordering of their own.
const FRAME_PHASE_ORDER: [LifecycleEvent; 4] = [
    LifecycleEvent::Update,
    LifecycleEvent::AfterUpdate,
    LifecycleEvent::Draw,
    LifecycleEvent::Draw2d,
];

/// Scene-management context: one arena, one dispatcher, and the per-instance
/// lifecycle bookkeeping (Init exactly once at attach, Destroy exactly once
/// at detach or close, nothing before Init or after Destroy).
pub struct SceneWorld {
    arena: SceneArena,
    dispatcher: Dispatcher,
    entities: EntityIdAllocator,
    attachments: Vec<Attachment>,
    frame_index: u64,
}

impl SceneWorld {
    pub fn new(table: &'static DescriptorTable, loader: Box<dyn ResourceLoader>) -> Self {
        Self {
            arena: SceneArena::new(loader),
            dispatcher: Dispatcher::new(table),
            entities: EntityIdAllocator::default(),
            attachments: Vec::new(),
            frame_index: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.arena.is_open()
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn table(&self) -> &'static DescriptorTable {
        self.dispatcher.table()
    }

    pub fn arena_stats(&self) -> ArenaStats {
        self.arena.stats()
    }

    pub fn live_instance_count(&self) -> usize {
        self.attachments
            .iter()
            .filter(|attachment| !attachment.retired)
            .count()
    }

    pub fn open(&mut self) -> Result<(), SceneError> {
        self.arena.init()?;
        self.frame_index = 0;
        info!(kinds = self.dispatcher.table().len(), "scene_opened");
        Ok(())
    }

    pub fn spawn_entity(&mut self) -> EntityId {
        self.entities.allocate()
    }

    /// Allocates the kind's state from the arena, fires Init exactly once,
    /// and returns the active instance handle.
    pub fn attach(
        &mut self,
        entity: EntityId,
        kind: KindId,
    ) -> Result<BehaviorInstance, SceneError> {
        let instance = self.dispatcher.spawn(&mut self.arena, kind)?;
        self.attachments.push(Attachment {
            entity,
            instance,
            retired: false,
        });
        self.dispatcher.init(&mut self.arena, entity, instance)?;
        debug!(entity = entity.0, kind = instance.kind.0, "behavior_attached");
        Ok(instance)
    }

    /// Fires Destroy and retires the instance. Returns false when the
    /// instance is unknown or already retired; Destroy never fires twice.
    /// The backing state is reclaimed only when the scene closes.
    pub fn detach(&mut self, instance: BehaviorInstance) -> Result<bool, SceneError> {
        let Some(index) = self
            .attachments
            .iter()
            .position(|attachment| attachment.instance == instance)
        else {
            return Ok(false);
        };
        if self.attachments[index].retired {
            return Ok(false);
        }

        let entity = self.attachments[index].entity;
        self.dispatcher.destroy(&mut self.arena, entity, instance)?;
        self.attachments[index].retired = true;
        debug!(entity = entity.0, kind = instance.kind.0, "behavior_detached");
        Ok(true)
    }

    /// Fans one frame across all active instances: every Update, then every
    /// AfterUpdate, then the draw phases.
    pub fn run_frame(&mut self) -> Result<(), SceneError> {
        for event in FRAME_PHASE_ORDER {
            for index in 0..self.attachments.len() {
                let attachment = self.attachments[index];
                if attachment.retired {
                    continue;
                }
                self.dispatcher.invoke(
                    &mut self.arena,
                    event,
                    attachment.entity,
                    attachment.instance,
                )?;
            }
        }
        self.frame_index = self.frame_index.saturating_add(1);
        Ok(())
    }

    pub fn load_resource(&mut self, path: &Path) -> Result<ResourceHandle, SceneError> {
        Ok(self.arena.load_resource(path)?)
    }

    /// Typed view of an instance's state. `T` must be the kind's registered
    /// state type; a size mismatch is an invariant violation and panics.
    pub fn state_mut<T: bytemuck::Pod>(
        &mut self,
        instance: BehaviorInstance,
    ) -> Result<&mut T, SceneError> {
        let bytes = self.arena.state_bytes_mut(instance.state)?;
        Ok(bytemuck::from_bytes_mut(bytes))
    }

    /// Fires Destroy for every still-active instance, then releases the
    /// arena. A closed world can be opened again for a fresh scene.
    pub fn close(&mut self) -> Result<(), SceneError> {
        for index in 0..self.attachments.len() {
            let attachment = self.attachments[index];
            if attachment.retired {
                continue;
            }
            self.dispatcher
                .destroy(&mut self.arena, attachment.entity, attachment.instance)?;
            self.attachments[index].retired = true;
        }
        self.arena.close()?;
        self.attachments.clear();
        info!(frames = self.frame_index, "scene_closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::path::Path;

    use bytemuck::{Pod, Zeroable};

    use crate::scene::arena::INITIAL_ARENA_CAPACITY;
    use crate::scene::resources::NoResources;
    use crate::{behavior_kind, descriptor_table, ResourceError};

    use super::*;

    thread_local! {
        static EVENTS: RefCell<Vec<(&'static str, u64)>> = const { RefCell::new(Vec::new()) };
    }

    fn record(phase: &'static str, entity: EntityId) {
        EVENTS.with(|events| events.borrow_mut().push((phase, entity.0)));
    }

    fn take_events() -> Vec<(&'static str, u64)> {
        EVENTS.with(|events| events.borrow_mut().drain(..).collect())
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct CounterState {
        ticks: u32,
    }

    fn counter_init(_entity: EntityId, state: &mut CounterState) {
        state.ticks = 0;
    }

    fn counter_update(_entity: EntityId, state: &mut CounterState) {
        state.ticks += 1;
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct ProbeState {
        updates: u32,
    }

    fn probe_init(entity: EntityId, _state: &mut ProbeState) {
        record("init", entity);
    }

    fn probe_update(entity: EntityId, state: &mut ProbeState) {
        state.updates += 1;
        record("update", entity);
    }

    fn probe_after_update(entity: EntityId, _state: &mut ProbeState) {
        record("after_update", entity);
    }

    fn probe_destroy(entity: EntityId, _state: &mut ProbeState) {
        record("destroy", entity);
    }

    descriptor_table! {
        static WORLD_TABLE;
        const COUNTER = behavior_kind!("counter", CounterState,
            init: counter_init, update: counter_update);
        const NOOP = behavior_kind!("noop");
        const PROBE = behavior_kind!("probe", ProbeState,
            init: probe_init, update: probe_update,
            after_update: probe_after_update, destroy: probe_destroy);
    }

    fn open_world() -> SceneWorld {
        let mut world = SceneWorld::new(&WORLD_TABLE, Box::new(NoResources));
        world.open().expect("open");
        world
    }

    #[test]
    fn counter_and_noop_run_five_frames_end_to_end() {
        let mut world = open_world();
        let counter_entity = world.spawn_entity();
        let noop_entity = world.spawn_entity();
        let counter = world.attach(counter_entity, COUNTER).expect("counter");
        let _noop = world.attach(noop_entity, NOOP).expect("noop");

        for _ in 0..5 {
            world.run_frame().expect("frame");
        }

        let state = world.state_mut::<CounterState>(counter).expect("state");
        assert_eq!(state.ticks, 5);
        assert_eq!(world.frame_index(), 5);
        world.close().expect("close");
    }

    #[test]
    fn every_update_precedes_every_after_update_within_a_frame() {
        let mut world = open_world();
        let first = world.spawn_entity();
        let second = world.spawn_entity();
        world.attach(first, PROBE).expect("attach");
        world.attach(second, PROBE).expect("attach");
        take_events();

        world.run_frame().expect("frame");
        world.run_frame().expect("frame");

        let events = take_events();
        assert_eq!(events.len(), 8);
        for frame in events.chunks(4) {
            assert!(frame[..2].iter().all(|(phase, _)| *phase == "update"));
            assert!(frame[2..].iter().all(|(phase, _)| *phase == "after_update"));
            for half in [&frame[..2], &frame[2..]] {
                let mut entities: Vec<u64> = half.iter().map(|(_, entity)| *entity).collect();
                entities.sort_unstable();
                assert_eq!(entities, vec![first.0, second.0]);
            }
        }
    }

    #[test]
    fn init_fires_once_at_attach_and_nothing_before_it() {
        let mut world = open_world();
        let entity = world.spawn_entity();
        world.attach(entity, PROBE).expect("attach");

        assert_eq!(take_events(), vec![("init", entity.0)]);
    }

    #[test]
    fn detach_fires_destroy_exactly_once() {
        let mut world = open_world();
        let entity = world.spawn_entity();
        let instance = world.attach(entity, PROBE).expect("attach");
        take_events();

        assert!(world.detach(instance).expect("detach"));
        assert!(!world.detach(instance).expect("second detach"));

        assert_eq!(take_events(), vec![("destroy", entity.0)]);
    }

    #[test]
    fn retired_instances_receive_no_further_events() {
        let mut world = open_world();
        let retired_entity = world.spawn_entity();
        let live_entity = world.spawn_entity();
        let retired = world.attach(retired_entity, PROBE).expect("attach");
        world.attach(live_entity, PROBE).expect("attach");
        world.detach(retired).expect("detach");
        take_events();

        world.run_frame().expect("frame");

        let events = take_events();
        assert!(events.iter().all(|(_, entity)| *entity == live_entity.0));
        assert_eq!(
            events,
            vec![
                ("update", live_entity.0),
                ("after_update", live_entity.0)
            ]
        );
    }

    #[test]
    fn close_destroys_live_instances_but_not_retired_ones() {
        let mut world = open_world();
        let detached_entity = world.spawn_entity();
        let live_entity = world.spawn_entity();
        let detached = world.attach(detached_entity, PROBE).expect("attach");
        world.attach(live_entity, PROBE).expect("attach");
        world.detach(detached).expect("detach");
        take_events();

        world.close().expect("close");

        assert_eq!(take_events(), vec![("destroy", live_entity.0)]);
    }

    #[test]
    fn detached_state_stays_readable_until_scene_close() {
        let mut world = open_world();
        let entity = world.spawn_entity();
        let counter = world.attach(entity, COUNTER).expect("attach");
        world.run_frame().expect("frame");
        world.detach(counter).expect("detach");

        let state = world.state_mut::<CounterState>(counter).expect("state");
        assert_eq!(state.ticks, 1);
    }

    #[test]
    fn open_twice_is_double_init() {
        let mut world = open_world();
        let err = world.open().expect_err("second open must fail");
        assert!(matches!(err, SceneError::Arena(ArenaError::DoubleInit)));
    }

    #[test]
    fn close_without_open_is_not_init() {
        let mut world = SceneWorld::new(&WORLD_TABLE, Box::new(NoResources));
        let err = world.close().expect_err("close must fail");
        assert!(matches!(
            err,
            SceneError::Arena(ArenaError::NotInit { operation: "close" })
        ));
    }

    #[test]
    fn world_supports_repeated_scene_lifecycles() {
        let mut world = open_world();
        let entity = world.spawn_entity();
        world.attach(entity, COUNTER).expect("attach");
        world.run_frame().expect("frame");
        world.close().expect("close");

        world.open().expect("reopen");
        assert_eq!(world.frame_index(), 0);
        assert_eq!(world.live_instance_count(), 0);
        let entity = world.spawn_entity();
        let counter = world.attach(entity, COUNTER).expect("attach");
        world.run_frame().expect("frame");
        let state = world.state_mut::<CounterState>(counter).expect("state");
        assert_eq!(state.ticks, 1);
        world.close().expect("close");
    }

    #[test]
    fn scene_overflowing_initial_capacity_releases_everything() {
        let mut world = open_world();
        for _ in 0..INITIAL_ARENA_CAPACITY + 5 {
            let entity = world.spawn_entity();
            world.attach(entity, COUNTER).expect("attach");
        }
        world.close().expect("close");

        assert_eq!(
            world.arena_stats().released_slab_total,
            (INITIAL_ARENA_CAPACITY + 5) as u64
        );
        world.open().expect("reopen");
    }

    #[test]
    fn load_resource_surfaces_loader_rejection() {
        let mut world = open_world();
        let err = world
            .load_resource(Path::new("models/ship.obj"))
            .expect_err("no loader configured");
        assert!(matches!(
            err,
            SceneError::Arena(ArenaError::Resource(ResourceError::Rejected { .. }))
        ));
    }
}
