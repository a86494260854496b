use bytemuck::{Pod, Zeroable};
use runtime::EntityId;

/// Counts completed update ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct CounterState {
    pub ticks: u32,
}

pub fn counter_init(_entity: EntityId, state: &mut CounterState) {
    state.ticks = 0;
}

pub fn counter_update(_entity: EntityId, state: &mut CounterState) {
    state.ticks = state.ticks.saturating_add(1);
}
