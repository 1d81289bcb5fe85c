//! Boundary Service
//!
//! Wires the two cache families (the departments singleton and the
//! per-department municipality map) to their producers.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument};

use crate::cache::{CacheOrchestrator, CacheStats};
use crate::config::Config;
use crate::error::{BoundaryError, Resource, Result};
use crate::features::{DatasetReader, FeatureCollection, GeoPackageReader, Materializer, SourceHandle};
use crate::models::DepartmentCode;
use crate::remote::RemoteFetcher;

/// Shared, immutable feature collection as stored in the cache.
pub type SharedCollection = Arc<FeatureCollection>;

/// Cache facade over the boundary datasets.
#[derive(Debug)]
pub struct BoundaryService {
    config: Config,
    materializer: Materializer,
    fetcher: Option<RemoteFetcher>,
    departments: CacheOrchestrator<(), SharedCollection>,
    municipalities: CacheOrchestrator<String, SharedCollection>,
}

impl BoundaryService {
    /// Builds a service reading GeoPackage files.
    pub fn from_config(config: Config) -> Result<Self> {
        Self::with_reader(config, Arc::new(GeoPackageReader))
    }

    /// Builds a service with a custom dataset reader.
    pub fn with_reader(config: Config, reader: Arc<dyn DatasetReader>) -> Result<Self> {
        let fetcher = config
            .remote_url_template
            .as_deref()
            .map(|template| RemoteFetcher::new(template, config.remote_timeout()))
            .transpose()?;

        Ok(Self {
            materializer: Materializer::new(reader, config.temp_dir.clone()),
            fetcher,
            departments: CacheOrchestrator::new("departments"),
            municipalities: CacheOrchestrator::new("municipalities"),
            config,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.config.ttl()
    }

    // == Departments ==
    /// All departments as one collection.
    pub async fn departments(&self) -> Result<SharedCollection> {
        self.departments
            .get_or_produce((), self.ttl(), || async {
                self.load_local_departments().await.map(Arc::new)
            })
            .await
    }

    // == Municipalities ==
    /// Municipalities of one department.
    pub async fn municipalities(&self, code: &DepartmentCode) -> Result<SharedCollection> {
        self.municipalities
            .get_or_produce(code.as_str().to_string(), self.ttl(), || async {
                self.load_local_or_remote_municipality(code.as_str())
                    .await
                    .map(Arc::new)
            })
            .await
    }

    // == Invalidate ==
    /// Clears both families, returning the number of dropped entries.
    pub async fn invalidate_all(&self) -> usize {
        let cleared = self.departments.clear().await + self.municipalities.clear().await;
        info!(cleared, "all cached collections invalidated");
        cleared
    }

    /// Counters for (departments, municipalities).
    pub async fn stats(&self) -> (CacheStats, CacheStats) {
        (
            self.departments.stats().await,
            self.municipalities.stats().await,
        )
    }

    async fn load_local_departments(&self) -> Result<FeatureCollection> {
        let path = self.config.departments_path();
        if !is_file(&path).await {
            return Err(BoundaryError::NotFound {
                resource: Resource::Departments,
                key: self.config.departments_file.clone(),
            });
        }
        self.materializer.materialize(SourceHandle::Path(path)).await
    }

    #[instrument(skip(self))]
    async fn load_local_or_remote_municipality(&self, code: &str) -> Result<FeatureCollection> {
        let path = self.config.municipality_path(code);
        if is_file(&path).await {
            debug!(path = %path.display(), "loading local municipality dataset");
            return self.materializer.materialize(SourceHandle::Path(path)).await;
        }

        match &self.fetcher {
            Some(fetcher) => {
                debug!("no local dataset, falling back to remote storage");
                self.fetch_remote(fetcher, code).await
            }
            None => Err(BoundaryError::NotFound {
                resource: Resource::Municipality,
                key: code.to_string(),
            }),
        }
    }

    /// Downloads the dataset and materializes it through a temp artifact.
    async fn fetch_remote(&self, fetcher: &RemoteFetcher, code: &str) -> Result<FeatureCollection> {
        let bytes = fetcher.fetch_required(code).await?;
        self.materializer.materialize(SourceHandle::Bytes(bytes)).await
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{Feature, Properties};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts reads and returns one feature named after the file.
    #[derive(Default)]
    struct CountingReader {
        reads: AtomicUsize,
    }

    impl DatasetReader for CountingReader {
        fn read_first_layer(&self, path: &Path) -> Result<FeatureCollection> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            let mut properties = Properties::new();
            properties.insert(
                "source".to_string(),
                path.file_name().unwrap().to_string_lossy().into(),
            );
            Ok(FeatureCollection::new(vec![Feature {
                id: None,
                properties,
                geometry: None,
            }]))
        }
    }

    fn service_with_files(files: &[&str]) -> (tempfile::TempDir, Arc<CountingReader>, BoundaryService) {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            std::fs::write(dir.path().join(file), b"stub").unwrap();
        }
        let config = Config {
            data_dir: PathBuf::from(dir.path()),
            ..Config::default()
        };
        let reader = Arc::new(CountingReader::default());
        let service = BoundaryService::with_reader(config, reader.clone()).unwrap();
        (dir, reader, service)
    }

    #[tokio::test]
    async fn test_departments_cached_within_ttl() {
        let (_dir, reader, service) = service_with_files(&["departments.gpkg"]);

        let first = service.departments().await.unwrap();
        let second = service.departments().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(reader.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_departments_file_is_not_found() {
        let (_dir, _reader, service) = service_with_files(&[]);

        let err = service.departments().await.unwrap_err();
        assert_eq!(err.to_string(), "Departments data not found");
        // The key must not leak the server's data directory.
        match err {
            BoundaryError::NotFound { key, .. } => assert_eq!(key, "departments.gpkg"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_local_municipality_file() {
        let (_dir, reader, service) = service_with_files(&["DPTO_CCDGO_05.gpkg"]);
        let code = DepartmentCode::parse("05").unwrap();

        let collection = service.municipalities(&code).await.unwrap();

        assert_eq!(
            collection.features[0].properties["source"],
            "DPTO_CCDGO_05.gpkg"
        );
        assert_eq!(reader.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_municipality_without_remote_is_not_found() {
        let (_dir, reader, service) = service_with_files(&[]);
        let code = DepartmentCode::parse("99").unwrap();

        let err = service.municipalities(&code).await.unwrap_err();

        assert!(matches!(
            err,
            BoundaryError::NotFound {
                resource: Resource::Municipality,
                ..
            }
        ));
        assert_eq!(reader.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalidate_all_clears_both_families() {
        let (_dir, reader, service) =
            service_with_files(&["departments.gpkg", "DPTO_CCDGO_05.gpkg", "DPTO_CCDGO_08.gpkg"]);

        service.departments().await.unwrap();
        for raw in ["05", "08"] {
            service
                .municipalities(&DepartmentCode::parse(raw).unwrap())
                .await
                .unwrap();
        }

        assert_eq!(service.invalidate_all().await, 3);

        service.departments().await.unwrap();
        assert_eq!(reader.reads.load(Ordering::SeqCst), 4);

        let (departments, municipalities) = service.stats().await;
        assert_eq!(departments.productions, 2);
        assert_eq!(departments.entries, 1);
        assert_eq!(municipalities.entries, 0);
    }

    #[test]
    fn test_invalid_remote_template_fails_construction() {
        let config = Config {
            remote_url_template: Some("https://example.com/no-placeholder".to_string()),
            ..Config::default()
        };
        assert!(BoundaryService::from_config(config).is_err());
    }
}
