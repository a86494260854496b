mod counter;
mod drift;
mod trail;

pub use counter::{counter_init, counter_update, CounterState};
pub use drift::{
    drift_after_update, drift_draw, drift_init, drift_update, DriftState, DRIFT_BOUNDS,
};
pub use trail::{trail_destroy, trail_init, trail_update, TrailState};

use runtime::{behavior_kind, descriptor_table};

descriptor_table! {
    pub static SANDBOX_TABLE;
    pub const COUNTER = behavior_kind!("counter", CounterState,
        init: counter_init, update: counter_update);
    pub const NOOP = behavior_kind!("noop");
    pub const DRIFT = behavior_kind!("drift", DriftState,
        init: drift_init, update: drift_update,
        after_update: drift_after_update, draw: drift_draw);
    pub const TRAIL = behavior_kind!("trail", TrailState,
        init: trail_init, update: trail_update, destroy: trail_destroy);
}
