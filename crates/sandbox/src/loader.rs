use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use runtime::{ResourceError, ResourceHandle, ResourceLoader};
use tracing::{debug, info};

/// Filesystem-backed resource manager. Materializes asset bytes under a
/// fixed root and keeps them resident until the owning scene releases the
/// handle at close.
#[derive(Debug, Default)]
pub struct DirLoader {
    root: PathBuf,
    slots: Vec<Option<LoadedAsset>>,
    resident_bytes: usize,
}

#[derive(Debug)]
struct LoadedAsset {
    path: PathBuf,
    bytes: Box<[u8]>,
}

impl DirLoader {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            slots: Vec::new(),
            resident_bytes: 0,
        }
    }

    pub fn bytes(&self, handle: ResourceHandle) -> Option<&[u8]> {
        self.slots
            .get(handle.0 as usize)?
            .as_ref()
            .map(|asset| asset.bytes.as_ref())
    }

    pub fn resident_bytes(&self) -> usize {
        self.resident_bytes
    }
}

impl ResourceLoader for DirLoader {
    fn load(&mut self, path: &Path) -> Result<ResourceHandle, ResourceError> {
        let full = self.root.join(path);
        let bytes = fs::read(&full).map_err(|source| ResourceError::Io {
            path: full.clone(),
            source,
        })?;

        let handle = ResourceHandle(self.slots.len() as u64);
        self.resident_bytes += bytes.len();
        info!(path = %full.display(), bytes = bytes.len(), "resource_loaded");
        self.slots.push(Some(LoadedAsset {
            path: full,
            bytes: bytes.into_boxed_slice(),
        }));
        Ok(handle)
    }

    fn release(&mut self, handle: ResourceHandle) {
        let Some(slot) = self.slots.get_mut(handle.0 as usize) else {
            return;
        };
        if let Some(asset) = slot.take() {
            self.resident_bytes = self.resident_bytes.saturating_sub(asset.bytes.len());
            debug!(path = %asset.path.display(), "resource_released");
        }
    }
}

/// Clonable handle over one [`DirLoader`], so the scene can own the release
/// path while the app keeps read access to what was loaded.
#[derive(Debug, Clone)]
pub struct SharedDirLoader {
    inner: Rc<RefCell<DirLoader>>,
}

impl SharedDirLoader {
    pub fn new(root: PathBuf) -> Self {
        Self {
            inner: Rc::new(RefCell::new(DirLoader::new(root))),
        }
    }

    pub fn resident_bytes(&self) -> usize {
        self.inner.borrow().resident_bytes()
    }

    pub fn byte_len(&self, handle: ResourceHandle) -> Option<usize> {
        self.inner.borrow().bytes(handle).map(<[u8]>::len)
    }
}

impl ResourceLoader for SharedDirLoader {
    fn load(&mut self, path: &Path) -> Result<ResourceHandle, ResourceError> {
        self.inner.borrow_mut().load(path)
    }

    fn release(&mut self, handle: ResourceHandle) {
        self.inner.borrow_mut().release(handle);
    }
}
