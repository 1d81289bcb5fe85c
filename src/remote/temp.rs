//! Scoped temp files for downloaded datasets
//!
//! A [`TempArtifact`] owns a file on disk for as long as it is alive; the
//! file is removed when the artifact is dropped, whichever way the owning
//! scope is left.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};
use tracing::{debug, warn};

use crate::error::{BoundaryError, Result};

/// Prefix for downloaded municipality datasets
const TEMP_PREFIX: &str = "DPTO_CCDGO_";
const TEMP_SUFFIX: &str = ".gpkg";

#[derive(Debug)]
pub struct TempArtifact {
    file: NamedTempFile,
}

impl TempArtifact {
    /// Creates a temp file in `dir` (or the OS temp dir) holding `bytes`.
    pub fn write(dir: Option<&Path>, bytes: &[u8]) -> Result<Self> {
        let mut builder = Builder::new();
        builder.prefix(TEMP_PREFIX).suffix(TEMP_SUFFIX);

        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| BoundaryError::Internal(format!("failed to create temp file: {e}")))?;

        file.write_all(bytes)
            .and_then(|()| file.flush())
            .map_err(|e| BoundaryError::Internal(format!("failed to write temp file: {e}")))?;

        debug!(path = %file.path().display(), size = bytes.len(), "temp artifact written");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Deletes the file now, reporting failures instead of ignoring them.
    pub fn release(self) -> Result<()> {
        let path: PathBuf = self.file.path().to_path_buf();
        self.file.close().map_err(|e| {
            warn!(path = %path.display(), error = %e, "failed to remove temp artifact");
            BoundaryError::Internal(format!("failed to remove temp file: {e}"))
        })?;
        debug!(path = %path.display(), "temp artifact removed");
        Ok(())
    }
}
