//! Feature Materializer
//!
//! Turns a dataset source, either a local path or downloaded bytes, into a
//! [`FeatureCollection`]. Reading happens on the blocking pool and, once
//! started, runs to completion even if the awaiting request goes away.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, instrument};

use super::gpkg::{DatasetReader, GeoPackageReader};
use super::model::FeatureCollection;
use crate::error::{BoundaryError, Result};
use crate::remote::TempArtifact;

// == Source Handle ==
/// Where a dataset comes from.
#[derive(Debug, Clone)]
pub enum SourceHandle {
    Path(PathBuf),
    Bytes(Bytes),
}

// == Materializer ==
#[derive(Clone)]
pub struct Materializer {
    reader: Arc<dyn DatasetReader>,
    /// Directory for temp artifacts; `None` uses the OS temp dir
    temp_dir: Option<PathBuf>,
}

impl Materializer {
    pub fn new(reader: Arc<dyn DatasetReader>, temp_dir: Option<PathBuf>) -> Self {
        Self { reader, temp_dir }
    }

    /// Materializer backed by the GeoPackage reader.
    pub fn geopackage(temp_dir: Option<PathBuf>) -> Self {
        Self::new(Arc::new(GeoPackageReader), temp_dir)
    }

    #[instrument(skip(self, source), fields(source = %source_label(&source)))]
    pub async fn materialize(&self, source: SourceHandle) -> Result<FeatureCollection> {
        let reader = Arc::clone(&self.reader);
        let temp_dir = self.temp_dir.clone();

        let task = tokio::task::spawn_blocking(move || match source {
            SourceHandle::Path(path) => reader.read_first_layer(&path),
            SourceHandle::Bytes(bytes) => {
                let artifact = TempArtifact::write(temp_dir.as_deref(), &bytes)?;
                let outcome = reader.read_first_layer(artifact.path());
                if let Err(e) = artifact.release() {
                    debug!(error = %e, "keeping read outcome despite temp removal failure");
                }
                outcome
            }
        });

        let collection = task
            .await
            .map_err(|e| BoundaryError::Internal(format!("materialization task failed: {e}")))??;

        debug!(features = collection.len(), "dataset materialized");
        Ok(collection)
    }
}

impl std::fmt::Debug for Materializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Materializer")
            .field("temp_dir", &self.temp_dir)
            .finish_non_exhaustive()
    }
}

fn source_label(source: &SourceHandle) -> String {
    match source {
        SourceHandle::Path(path) => path.display().to_string(),
        SourceHandle::Bytes(bytes) => format!("<{} downloaded bytes>", bytes.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::model::{Feature, Properties};
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Barrier, Mutex};
    use std::time::Duration;

    /// Records the paths it was asked to read and whether they existed.
    #[derive(Default)]
    struct RecordingReader {
        seen: Mutex<Vec<(PathBuf, bool)>>,
        fail: bool,
    }

    impl DatasetReader for RecordingReader {
        fn read_first_layer(&self, path: &Path) -> Result<FeatureCollection> {
            self.seen
                .lock()
                .unwrap()
                .push((path.to_path_buf(), path.exists()));
            if self.fail {
                return Err(BoundaryError::LayerRead("corrupt row".to_string()));
            }
            Ok(FeatureCollection::new(vec![Feature {
                id: Some(1),
                properties: Properties::new(),
                geometry: None,
            }]))
        }
    }

    #[tokio::test]
    async fn test_materialize_path_reads_in_place() {
        let reader = Arc::new(RecordingReader::default());
        let materializer = Materializer::new(reader.clone(), None);

        let collection = materializer
            .materialize(SourceHandle::Path(PathBuf::from("/data/departments.gpkg")))
            .await
            .unwrap();

        assert_eq!(collection.len(), 1);
        let seen = reader.seen.lock().unwrap();
        assert_eq!(seen[0].0, PathBuf::from("/data/departments.gpkg"));
    }

    #[tokio::test]
    async fn test_materialize_bytes_uses_and_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let reader = Arc::new(RecordingReader::default());
        let materializer = Materializer::new(reader.clone(), Some(dir.path().to_path_buf()));

        materializer
            .materialize(SourceHandle::Bytes(Bytes::from_static(b"gpkg bytes")))
            .await
            .unwrap();

        let seen = reader.seen.lock().unwrap();
        let (path, existed) = &seen[0];
        assert!(*existed, "temp file must exist while being read");
        assert!(path.starts_with(dir.path()));
        assert!(!path.exists(), "temp file must be removed afterwards");
    }

    #[tokio::test]
    async fn test_materialize_bytes_removes_temp_file_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let reader = Arc::new(RecordingReader {
            fail: true,
            ..Default::default()
        });
        let materializer = Materializer::new(reader.clone(), Some(dir.path().to_path_buf()));

        let result = materializer
            .materialize(SourceHandle::Bytes(Bytes::from_static(b"gpkg bytes")))
            .await;

        assert!(matches!(result, Err(BoundaryError::LayerRead(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    /// Blocks inside the read until the test lets it continue.
    struct GatedReader {
        started: Barrier,
        release: Barrier,
        finished: AtomicBool,
    }

    impl DatasetReader for GatedReader {
        fn read_first_layer(&self, path: &Path) -> Result<FeatureCollection> {
            assert!(path.exists());
            self.started.wait();
            self.release.wait();
            self.finished.store(true, Ordering::SeqCst);
            Ok(FeatureCollection::default())
        }
    }

    #[tokio::test]
    async fn test_cancelled_materialization_completes_and_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let reader = Arc::new(GatedReader {
            started: Barrier::new(2),
            release: Barrier::new(2),
            finished: AtomicBool::new(false),
        });
        let materializer = Materializer::new(reader.clone(), Some(dir.path().to_path_buf()));

        let request = tokio::spawn(async move {
            materializer
                .materialize(SourceHandle::Bytes(Bytes::from_static(b"gpkg bytes")))
                .await
        });

        let gate = reader.clone();
        tokio::task::spawn_blocking(move || gate.started.wait())
            .await
            .unwrap();

        // Drop the awaiting request while the read is in progress.
        request.abort();
        assert!(request.await.unwrap_err().is_cancelled());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

        let gate = reader.clone();
        tokio::task::spawn_blocking(move || gate.release.wait())
            .await
            .unwrap();

        for _ in 0..100 {
            if reader.finished.load(Ordering::SeqCst)
                && std::fs::read_dir(dir.path()).unwrap().count() == 0
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(reader.finished.load(Ordering::SeqCst));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_materialize_missing_path_with_geopackage_reader() {
        let materializer = Materializer::geopackage(None);
        let result = materializer
            .materialize(SourceHandle::Path(PathBuf::from("/nonexistent.gpkg")))
            .await;
        assert!(matches!(result, Err(BoundaryError::DatasetOpen { .. })));
    }
}
