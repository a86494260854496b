use thiserror::Error;

use crate::entity::EntityId;

/// Largest state alignment the arena's slab storage can honor.
pub const MAX_STATE_ALIGN: usize = 8;

/// Contiguous behavior-kind tag; index into the descriptor table. Assigned
/// in declaration order by `descriptor_table!`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KindId(pub u16);

/// Uniform lifecycle-hook signature shared by all kinds and all events.
pub type HookFn = fn(EntityId, &mut [u8]);

pub fn noop_hook(_entity: EntityId, _state: &mut [u8]) {}

/// One function pointer per lifecycle event. Unimplemented hooks hold
/// [`noop_hook`], so every slot is always callable.
#[derive(Debug, Clone, Copy)]
pub struct HookSet {
    pub init: HookFn,
    pub update: HookFn,
    pub after_update: HookFn,
    pub destroy: HookFn,
    pub draw: HookFn,
    pub draw2d: HookFn,
}

impl HookSet {
    pub const NOOP: Self = Self {
        init: noop_hook,
        update: noop_hook,
        after_update: noop_hook,
        destroy: noop_hook,
        draw: noop_hook,
        draw2d: noop_hook,
    };
}

/// Build-time-fixed descriptor of one behavior kind.
#[derive(Debug, Clone, Copy)]
pub struct BehaviorKind {
    pub name: &'static str,
    pub state_size: usize,
    pub hooks: HookSet,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(
        "behavior kind tag {tag} is outside the descriptor table ({known} kinds); \
         the instance handle is corrupt or from a different build"
    )]
    UnknownKind { tag: u16, known: usize },
}

/// Exhaustive, immutable mapping from [`KindId`] to [`BehaviorKind`].
/// Built once by `descriptor_table!`, never mutated at runtime.
#[derive(Debug)]
pub struct DescriptorTable {
    kinds: &'static [BehaviorKind],
}

impl DescriptorTable {
    pub const fn new(kinds: &'static [BehaviorKind]) -> Self {
        Self { kinds }
    }

    pub fn kind(&self, id: KindId) -> Result<&BehaviorKind, DispatchError> {
        self.kinds
            .get(id.0 as usize)
            .ok_or(DispatchError::UnknownKind {
                tag: id.0,
                known: self.kinds.len(),
            })
    }

    pub fn kind_id_by_name(&self, name: &str) -> Option<KindId> {
        self.kinds
            .iter()
            .position(|kind| kind.name == name)
            .map(|index| KindId(index as u16))
    }

    pub fn kinds(&self) -> &[BehaviorKind] {
        self.kinds
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Upper bound over all kinds' state sizes, for consumers that want
    /// uniform storage slots.
    pub fn max_state_size(&self) -> usize {
        self.kinds
            .iter()
            .map(|kind| kind.state_size)
            .max()
            .unwrap_or(0)
    }
}
