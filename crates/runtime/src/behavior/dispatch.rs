use thiserror::Error;

use crate::entity::EntityId;
use crate::scene::arena::{ArenaError, SceneArena, StateSlabId};

use super::descriptor::{DescriptorTable, DispatchError, HookFn, HookSet, KindId};

/// The six lifecycle transitions a behavior instance can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Init,
    Update,
    AfterUpdate,
    Destroy,
    Draw,
    Draw2d,
}

impl LifecycleEvent {
    pub(crate) fn select(self, hooks: &HookSet) -> HookFn {
        match self {
            Self::Init => hooks.init,
            Self::Update => hooks.update,
            Self::AfterUpdate => hooks.after_update,
            Self::Destroy => hooks.destroy,
            Self::Draw => hooks.draw,
            Self::Draw2d => hooks.draw2d,
        }
    }
}

/// Non-owning handle pairing a kind tag with the arena slab holding that
/// instance's state. Valid only while the owning arena is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BehaviorInstance {
    pub kind: KindId,
    pub state: StateSlabId,
}

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error(transparent)]
    Arena(#[from] ArenaError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Routes lifecycle events to kind implementations through one direct
/// table-indexed lookup per call; no scan, no `dyn` indirection chain.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    table: &'static DescriptorTable,
}

impl Dispatcher {
    pub const fn new(table: &'static DescriptorTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &'static DescriptorTable {
        self.table
    }

    /// Allocates exactly the kind's state size from the arena and returns
    /// the tagged instance handle.
    pub fn spawn(
        &self,
        arena: &mut SceneArena,
        kind: KindId,
    ) -> Result<BehaviorInstance, InvokeError> {
        let state_size = self.table.kind(kind)?.state_size;
        let state = arena.alloc(state_size)?;
        Ok(BehaviorInstance { kind, state })
    }

    pub fn invoke(
        &self,
        arena: &mut SceneArena,
        event: LifecycleEvent,
        entity: EntityId,
        instance: BehaviorInstance,
    ) -> Result<(), InvokeError> {
        let kind = self.table.kind(instance.kind)?;
        let hook = event.select(&kind.hooks);
        let state = arena.state_bytes_mut(instance.state)?;
        hook(entity, state);
        Ok(())
    }

    pub fn init(
        &self,
        arena: &mut SceneArena,
        entity: EntityId,
        instance: BehaviorInstance,
    ) -> Result<(), InvokeError> {
        self.invoke(arena, LifecycleEvent::Init, entity, instance)
    }

    pub fn update(
        &self,
        arena: &mut SceneArena,
        entity: EntityId,
        instance: BehaviorInstance,
    ) -> Result<(), InvokeError> {
        self.invoke(arena, LifecycleEvent::Update, entity, instance)
    }

    pub fn after_update(
        &self,
        arena: &mut SceneArena,
        entity: EntityId,
        instance: BehaviorInstance,
    ) -> Result<(), InvokeError> {
        self.invoke(arena, LifecycleEvent::AfterUpdate, entity, instance)
    }

    pub fn destroy(
        &self,
        arena: &mut SceneArena,
        entity: EntityId,
        instance: BehaviorInstance,
    ) -> Result<(), InvokeError> {
        self.invoke(arena, LifecycleEvent::Destroy, entity, instance)
    }

    pub fn draw(
        &self,
        arena: &mut SceneArena,
        entity: EntityId,
        instance: BehaviorInstance,
    ) -> Result<(), InvokeError> {
        self.invoke(arena, LifecycleEvent::Draw, entity, instance)
    }

    pub fn draw2d(
        &self,
        arena: &mut SceneArena,
        entity: EntityId,
        instance: BehaviorInstance,
    ) -> Result<(), InvokeError> {
        self.invoke(arena, LifecycleEvent::Draw2d, entity, instance)
    }
}

#[cfg(test)]
mod tests {
    use super::super::descriptor::BehaviorKind;
    use super::*;
    use crate::scene::resources::NoResources;

    fn bump_first_byte(_entity: EntityId, state: &mut [u8]) {
        state[0] = state[0].wrapping_add(1);
    }

    static KINDS: [BehaviorKind; 1] = [BehaviorKind {
        name: "init_only",
        state_size: 8,
        hooks: HookSet {
            init: bump_first_byte,
            ..HookSet::NOOP
        },
    }];
    static TABLE: DescriptorTable = DescriptorTable::new(&KINDS);

    fn open_arena() -> SceneArena {
        let mut arena = SceneArena::new(Box::new(NoResources));
        arena.init().expect("init");
        arena
    }

    #[test]
    fn spawn_allocates_exactly_the_kind_state_size() {
        let dispatcher = Dispatcher::new(&TABLE);
        let mut arena = open_arena();

        let instance = dispatcher.spawn(&mut arena, KindId(0)).expect("spawn");
        assert_eq!(instance.kind, KindId(0));
        let bytes = arena.state_bytes_mut(instance.state).expect("bytes");
        assert_eq!(bytes.len(), 8);
    }

    #[test]
    fn init_only_kind_ignores_every_other_event() {
        let dispatcher = Dispatcher::new(&TABLE);
        let mut arena = open_arena();
        let entity = EntityId(0);
        let instance = dispatcher.spawn(&mut arena, KindId(0)).expect("spawn");

        dispatcher.init(&mut arena, entity, instance).expect("init");
        for event in [
            LifecycleEvent::Update,
            LifecycleEvent::AfterUpdate,
            LifecycleEvent::Destroy,
            LifecycleEvent::Draw,
            LifecycleEvent::Draw2d,
        ] {
            dispatcher
                .invoke(&mut arena, event, entity, instance)
                .expect("event");
        }

        let bytes = arena.state_bytes_mut(instance.state).expect("bytes");
        assert_eq!(bytes[0], 1, "only init may touch the state");
    }

    #[test]
    fn unknown_kind_tag_is_fatal_dispatch_error() {
        let dispatcher = Dispatcher::new(&TABLE);
        let mut arena = open_arena();
        let state = arena.alloc(8).expect("alloc");
        let bogus = BehaviorInstance {
            kind: KindId(99),
            state,
        };

        let err = dispatcher
            .update(&mut arena, EntityId(0), bogus)
            .expect_err("unknown kind must fail");
        assert!(matches!(
            err,
            InvokeError::Dispatch(DispatchError::UnknownKind { tag: 99, known: 1 })
        ));
    }

    #[test]
    fn spawn_of_unknown_kind_fails_before_allocating() {
        let dispatcher = Dispatcher::new(&TABLE);
        let mut arena = open_arena();

        let err = dispatcher
            .spawn(&mut arena, KindId(3))
            .expect_err("unknown kind must fail");
        assert!(matches!(err, InvokeError::Dispatch(_)));
        assert_eq!(arena.stats().slab_count, 0);
    }

    #[test]
    fn invoke_on_closed_arena_is_not_init() {
        let dispatcher = Dispatcher::new(&TABLE);
        let mut arena = open_arena();
        let instance = dispatcher.spawn(&mut arena, KindId(0)).expect("spawn");
        arena.close().expect("close");

        let err = dispatcher
            .update(&mut arena, EntityId(0), instance)
            .expect_err("stale instance must fail");
        assert!(matches!(err, InvokeError::Arena(ArenaError::NotInit { .. })));
    }
}
