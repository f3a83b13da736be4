//! Local CSV file backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use perfprof_core::{DataSourceError, MeasurementPoint, RequestType, WorkerConfiguration};

use crate::csv_table::filter_measurements;
use crate::source::DataSource;

/// Reads benchmarks from a CSV file on every fetch.
#[derive(Debug, Clone)]
pub struct FileDataSource {
    path: PathBuf,
}

impl FileDataSource {
    /// Fails if the path is empty or does not exist.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DataSourceError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(DataSourceError::Config(
                "local CSV file path must be provided".to_string(),
            ));
        }
        if !path.exists() {
            return Err(DataSourceError::Config(format!(
                "file does not exist: {}",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DataSource for FileDataSource {
    async fn fetch(
        &self,
        worker: &WorkerConfiguration,
        request: &RequestType,
    ) -> Result<Vec<MeasurementPoint>, DataSourceError> {
        let location = self.describe();
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| DataSourceError::Io {
                location: location.clone(),
                source,
            })?;
        filter_measurements(bytes.as_slice(), &location, worker, request)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
