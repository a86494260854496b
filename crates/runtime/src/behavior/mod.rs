pub mod descriptor;
pub mod dispatch;
mod registry;

pub use descriptor::{
    noop_hook, BehaviorKind, DescriptorTable, DispatchError, HookFn, HookSet, KindId,
    MAX_STATE_ALIGN,
};
pub use dispatch::{BehaviorInstance, Dispatcher, InvokeError, LifecycleEvent};
