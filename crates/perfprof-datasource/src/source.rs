//! The fetch contract and startup selection of a backend.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use perfprof_core::{DataSourceConfig, DataSourceError, MeasurementPoint, RequestType, WorkerConfiguration};

use crate::{FileDataSource, MemoryDataSource};

/// A read-only supplier of benchmarking measurements.
///
/// Implementations return an empty vector when nothing matches the pair and
/// an error only when retrieval itself fails. Each call returns freshly owned
/// points; order is unspecified.
#[async_trait]
pub trait DataSource: Send + Sync + std::fmt::Debug {
    /// Fetch measurements matching the worker's accelerator type and the
    /// request type's input/output buckets.
    async fn fetch(
        &self,
        worker: &WorkerConfiguration,
        request: &RequestType,
    ) -> Result<Vec<MeasurementPoint>, DataSourceError>;

    /// Human-readable location, used in logs.
    fn describe(&self) -> String;
}

/// Build the backend selected by configuration.
pub async fn from_config(config: &DataSourceConfig) -> Result<Arc<dyn DataSource>, DataSourceError> {
    let source: Arc<dyn DataSource> = match config {
        DataSourceConfig::Mock => Arc::new(MemoryDataSource::demo()),
        DataSourceConfig::File { path } => Arc::new(FileDataSource::new(path)?),
        #[cfg(feature = "s3")]
        DataSourceConfig::S3 {
            bucket,
            key,
            region,
            endpoint,
        } => Arc::new(
            crate::S3DataSource::new(bucket, key, region.clone(), endpoint.clone()).await?,
        ),
        #[cfg(not(feature = "s3"))]
        DataSourceConfig::S3 { .. } => {
            return Err(DataSourceError::Config(
                "object storage source requires the `s3` feature".to_string(),
            ));
        }
    };
    info!(source = %source.describe(), "data source ready");
    Ok(source)
}
