use std::path::{Path, PathBuf};

use thiserror::Error;

/// Opaque handle minted by a [`ResourceLoader`] for one materialized heavy
/// resource. Only meaningful to the loader that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle(pub u64);

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("failed to read resource {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("resource loader cannot materialize {path}: {reason}")]
    Rejected { path: PathBuf, reason: &'static str },
}

/// External resource manager seam. The arena delegates materialization to
/// `load` and hands every tracked handle back through `release` exactly once
/// when the scene closes; nothing else may release a handle.
pub trait ResourceLoader {
    fn load(&mut self, path: &Path) -> Result<ResourceHandle, ResourceError>;
    fn release(&mut self, handle: ResourceHandle);
}

/// Loader for scenes that never materialize heavy resources.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoResources;

impl ResourceLoader for NoResources {
    fn load(&mut self, path: &Path) -> Result<ResourceHandle, ResourceError> {
        Err(ResourceError::Rejected {
            path: path.to_path_buf(),
            reason: "scene was opened without a resource loader",
        })
    }

    fn release(&mut self, _handle: ResourceHandle) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_resources_rejects_every_path() {
        let mut loader = NoResources;
        let err = loader
            .load(Path::new("models/ship.obj"))
            .expect_err("load should be rejected");
        assert!(matches!(err, ResourceError::Rejected { .. }));
    }
}
