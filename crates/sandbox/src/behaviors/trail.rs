use bytemuck::{Pod, Zeroable};
use runtime::EntityId;

/// Records its own retirement so teardown order stays observable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct TrailState {
    pub frames_alive: u32,
    pub retired: u32,
}

pub fn trail_init(_entity: EntityId, state: &mut TrailState) {
    state.frames_alive = 0;
    state.retired = 0;
}

pub fn trail_update(_entity: EntityId, state: &mut TrailState) {
    state.frames_alive = state.frames_alive.saturating_add(1);
}

pub fn trail_destroy(_entity: EntityId, state: &mut TrailState) {
    state.retired = 1;
}
