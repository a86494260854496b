use std::mem;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

use super::resources::{ResourceError, ResourceHandle, ResourceLoader};

pub const INITIAL_ARENA_CAPACITY: usize = 10;

const SLAB_WORD_BYTES: usize = mem::size_of::<u64>();

/// Index-stable handle into the arena's state slab list. Valid only while
/// the arena that issued it is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateSlabId(pub u32);

#[derive(Debug, Error)]
pub enum ArenaError {
    #[error("arena is already open; close() must run before another init()")]
    DoubleInit,
    #[error("arena is not open; init() must run before {operation}")]
    NotInit { operation: &'static str },
    #[error("arena out of memory during {operation} ({requested} bytes requested)")]
    OutOfMemory {
        operation: &'static str,
        requested: usize,
    },
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStats {
    pub is_open: bool,
    pub slab_count: usize,
    pub slab_capacity: usize,
    pub resource_count: usize,
    pub resource_capacity: usize,
    pub released_slab_total: u64,
    pub released_resource_total: u64,
}

/// One zero-initialized per-instance state allocation. Backed by u64 words
/// so the byte view is 8-aligned regardless of requested length.
#[derive(Debug)]
struct StateSlab {
    words: Box<[u64]>,
    byte_len: usize,
}

impl StateSlab {
    fn bytes_mut(&mut self) -> &mut [u8] {
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut self.words);
        &mut bytes[..self.byte_len]
    }
}

#[derive(Debug)]
struct OpenArena {
    slabs: Vec<StateSlab>,
    resources: Vec<ResourceHandle>,
}

/// Scene-scoped allocator and tracker. Everything allocated or loaded while
/// the arena is open is released exactly once by `close()`; nothing is
/// released individually. One scene owns one arena at a time.
pub struct SceneArena {
    loader: Box<dyn ResourceLoader>,
    open: Option<OpenArena>,
    released_slab_total: u64,
    released_resource_total: u64,
}

impl SceneArena {
    pub fn new(loader: Box<dyn ResourceLoader>) -> Self {
        Self {
            loader,
            open: None,
            released_slab_total: 0,
            released_resource_total: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn init(&mut self) -> Result<(), ArenaError> {
        if self.open.is_some() {
            return Err(ArenaError::DoubleInit);
        }

        let mut slabs = Vec::new();
        try_reserve(&mut slabs, INITIAL_ARENA_CAPACITY, "init")?;
        let mut resources = Vec::new();
        try_reserve(&mut resources, INITIAL_ARENA_CAPACITY, "init")?;

        self.open = Some(OpenArena { slabs, resources });
        info!(initial_capacity = INITIAL_ARENA_CAPACITY, "arena_opened");
        Ok(())
    }

    /// Appends a zero-initialized slab of `size` bytes and returns its
    /// handle. The slab lives until `close()`; there is no individual free.
    pub fn alloc(&mut self, size: usize) -> Result<StateSlabId, ArenaError> {
        let open = self
            .open
            .as_mut()
            .ok_or(ArenaError::NotInit { operation: "alloc" })?;
        ensure_slot(&mut open.slabs, "alloc")?;

        let words = size.div_ceil(SLAB_WORD_BYTES);
        let mut storage: Vec<u64> = Vec::new();
        storage
            .try_reserve_exact(words)
            .map_err(|_| ArenaError::OutOfMemory {
                operation: "alloc",
                requested: size,
            })?;
        storage.resize(words, 0);

        let id = StateSlabId(open.slabs.len() as u32);
        open.slabs.push(StateSlab {
            words: storage.into_boxed_slice(),
            byte_len: size,
        });
        debug!(slab = id.0, size, "arena_alloc");
        Ok(id)
    }

    /// Materializes a heavy resource through the loader and tracks its
    /// handle for release at `close()`. Callers must never release the
    /// returned handle themselves.
    pub fn load_resource(&mut self, path: &Path) -> Result<ResourceHandle, ArenaError> {
        let Some(open) = self.open.as_mut() else {
            return Err(ArenaError::NotInit {
                operation: "load_resource",
            });
        };

        let handle = self.loader.load(path)?;
        if let Err(error) = ensure_slot(&mut open.resources, "load_resource") {
            self.loader.release(handle);
            return Err(error);
        }
        open.resources.push(handle);
        debug!(handle = handle.0, path = %path.display(), "resource_tracked");
        Ok(handle)
    }

    /// Releases every tracked resource and slab, frees both collections,
    /// and resets the arena to uninitialized. Release order is unspecified.
    pub fn close(&mut self) -> Result<(), ArenaError> {
        let open = self
            .open
            .take()
            .ok_or(ArenaError::NotInit { operation: "close" })?;

        let slab_count = open.slabs.len();
        let resource_count = open.resources.len();
        for handle in open.resources {
            self.loader.release(handle);
            self.released_resource_total = self.released_resource_total.saturating_add(1);
        }
        for slab in open.slabs {
            drop(slab);
            self.released_slab_total = self.released_slab_total.saturating_add(1);
        }

        info!(slab_count, resource_count, "arena_closed");
        Ok(())
    }

    /// Byte view of one slab, exactly as long as the requested size.
    pub fn state_bytes_mut(&mut self, id: StateSlabId) -> Result<&mut [u8], ArenaError> {
        let open = self.open.as_mut().ok_or(ArenaError::NotInit {
            operation: "state access",
        })?;
        let slab_count = open.slabs.len();
        let slab = open.slabs.get_mut(id.0 as usize).unwrap_or_else(|| {
            panic!(
                "state slab handle {} outside live range {slab_count}; \
                 handle predates this scene or is corrupt",
                id.0
            )
        });
        Ok(slab.bytes_mut())
    }

    pub fn stats(&self) -> ArenaStats {
        let (slab_count, slab_capacity, resource_count, resource_capacity) = match &self.open {
            Some(open) => (
                open.slabs.len(),
                open.slabs.capacity(),
                open.resources.len(),
                open.resources.capacity(),
            ),
            None => (0, 0, 0, 0),
        };
        ArenaStats {
            is_open: self.open.is_some(),
            slab_count,
            slab_capacity,
            resource_count,
            resource_capacity,
            released_slab_total: self.released_slab_total,
            released_resource_total: self.released_resource_total,
        }
    }
}

/// Doubles a full collection's capacity, preserving entries and indices.
fn ensure_slot<T>(list: &mut Vec<T>, operation: &'static str) -> Result<(), ArenaError> {
    if list.len() < list.capacity() {
        return Ok(());
    }
    let target = list.capacity().max(INITIAL_ARENA_CAPACITY / 2) * 2;
    try_reserve(list, target - list.len(), operation)
}

fn try_reserve<T>(
    list: &mut Vec<T>,
    additional: usize,
    operation: &'static str,
) -> Result<(), ArenaError> {
    list.try_reserve_exact(additional)
        .map_err(|_| ArenaError::OutOfMemory {
            operation,
            requested: additional.saturating_mul(mem::size_of::<T>()),
        })
}
