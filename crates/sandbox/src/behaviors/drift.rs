use bytemuck::{Pod, Zeroable};
use runtime::EntityId;

pub const DRIFT_BOUNDS: f32 = 32.0;
const DRIFT_SPEED_STEP: f32 = 0.25;

/// Wandering point kept inside a square play area. Draw records how many
/// frames the instance was presented.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct DriftState {
    pub x: f32,
    pub y: f32,
    pub velocity_x: f32,
    pub velocity_y: f32,
    pub presented_frames: u32,
}

pub fn drift_init(entity: EntityId, state: &mut DriftState) {
    // Deterministic per-entity heading so replays stay reproducible.
    let lane = (entity.0 % 5) as f32 - 2.0;
    state.x = 0.0;
    state.y = 0.0;
    state.velocity_x = DRIFT_SPEED_STEP * lane;
    state.velocity_y = DRIFT_SPEED_STEP * (2.0 - lane);
    state.presented_frames = 0;
}

pub fn drift_update(_entity: EntityId, state: &mut DriftState) {
    state.x += state.velocity_x;
    state.y += state.velocity_y;
}

pub fn drift_after_update(_entity: EntityId, state: &mut DriftState) {
    state.x = state.x.clamp(-DRIFT_BOUNDS, DRIFT_BOUNDS);
    state.y = state.y.clamp(-DRIFT_BOUNDS, DRIFT_BOUNDS);
}

pub fn drift_draw(_entity: EntityId, state: &mut DriftState) {
    state.presented_frames = state.presented_frames.saturating_add(1);
}
