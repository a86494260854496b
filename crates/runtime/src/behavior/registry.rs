//! Compile-time behavior registration.
//!
//! `behavior_kind!` builds one [`BehaviorKind`](crate::BehaviorKind)
//! descriptor from a kind name, a Pod state type, and the hooks the kind
//! actually implements; every unlisted hook becomes the shared no-op, so
//! the dispatcher can treat all kinds uniformly. `descriptor_table!` lays
//! the descriptors out as a static table and assigns each kind a contiguous
//! [`KindId`](crate::KindId) in declaration order.
//!
//! State types must be `#[repr(C)]` and derive `bytemuck::Pod` +
//! `bytemuck::Zeroable`; alignment above 8 or zero size is rejected at
//! compile time. Hook functions take `(EntityId, &mut State)`.
//!
//! ```ignore
//! descriptor_table! {
//!     pub static TABLE;
//!     pub const COUNTER = behavior_kind!("counter", CounterState,
//!         init: counter_init, update: counter_update);
//!     pub const NOOP = behavior_kind!("noop");
//! }
//! ```

#[macro_export]
macro_rules! behavior_kind {
    ($name:literal $(,)?) => {
        $crate::BehaviorKind {
            name: $name,
            state_size: 0,
            hooks: $crate::HookSet::NOOP,
        }
    };
    ($name:literal, $state:ty $(, $hook:ident: $func:expr)* $(,)?) => {{
        const _: () = {
            assert!(
                ::core::mem::size_of::<$state>() > 0,
                "behavior state must not be zero-sized; use the stateless form instead"
            );
            assert!(
                ::core::mem::align_of::<$state>() <= $crate::MAX_STATE_ALIGN,
                "behavior state alignment exceeds arena slab alignment"
            );
        };
        $crate::BehaviorKind {
            name: $name,
            state_size: ::core::mem::size_of::<$state>(),
            hooks: $crate::HookSet {
                $($hook: {
                    fn adapter(entity: $crate::EntityId, state: &mut [u8]) {
                        let typed: &mut $state = ::bytemuck::from_bytes_mut(state);
                        let hook: fn($crate::EntityId, &mut $state) = $func;
                        hook(entity, typed);
                    }
                    adapter
                },)*
                ..$crate::HookSet::NOOP
            },
        }
    }};
}

#[macro_export]
macro_rules! descriptor_table {
    (
        $vis:vis static $table:ident;
        $($kvis:vis const $id:ident = $kind:expr;)+
    ) => {
        $crate::__descriptor_table_ids!(0; $($kvis const $id;)+);
        $vis static $table: $crate::DescriptorTable = {
            static KINDS: &[$crate::BehaviorKind] = &[$($kind),+];
            $crate::DescriptorTable::new(KINDS)
        };
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __descriptor_table_ids {
    ($index:expr;) => {};
    ($index:expr; $kvis:vis const $id:ident; $($rest:tt)*) => {
        $kvis const $id: $crate::KindId = $crate::KindId($index);
        $crate::__descriptor_table_ids!($index + 1; $($rest)*);
    };
}
