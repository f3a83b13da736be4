//! S3-compatible object storage backend.
//!
//! Downloads the CSV object on every fetch and filters it with the shared
//! CSV table logic. Retries follow the AWS SDK's own retry policy.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;

use perfprof_core::{DataSourceError, MeasurementPoint, RequestType, WorkerConfiguration};

use crate::csv_table::filter_measurements;
use crate::source::DataSource;

pub struct S3DataSource {
    client: Client,
    bucket: String,
    key: String,
}

impl std::fmt::Debug for S3DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3DataSource")
            .field("bucket", &self.bucket)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl S3DataSource {
    /// Build a client from the default AWS credential chain.
    ///
    /// A custom `endpoint` (MinIO, GCS interop) switches to path-style
    /// addressing.
    pub async fn new(
        bucket: &str,
        key: &str,
        region: Option<String>,
        endpoint: Option<String>,
    ) -> Result<Self, DataSourceError> {
        if bucket.is_empty() || key.is_empty() {
            return Err(DataSourceError::Config(
                "object storage bucket name and object key must be provided".to_string(),
            ));
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let path_style = endpoint.is_some();
        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared_config = loader.load().await;

        let mut s3_builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if path_style {
            s3_builder = s3_builder.force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(s3_builder.build()),
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }
}

#[async_trait]
impl DataSource for S3DataSource {
    async fn fetch(
        &self,
        worker: &WorkerConfiguration,
        request: &RequestType,
    ) -> Result<Vec<MeasurementPoint>, DataSourceError> {
        let location = self.describe();
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .send()
            .await
            .map_err(|e| {
                DataSourceError::Storage(format!(
                    "failed to open object reader for {location}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let body = output.body.collect().await.map_err(|e| {
            DataSourceError::Storage(format!("failed to read {location}: {e}"))
        })?;

        filter_measurements(body.into_bytes().as_ref(), &location, worker, request)
    }

    fn describe(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}
