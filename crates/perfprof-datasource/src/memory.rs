//! In-memory fixture backend.
//!
//! Measurements and failures are keyed by `worker_id:request_id`. Lookup
//! order for a pair: per-pair error, default error, per-pair points,
//! default points, otherwise an empty result.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use perfprof_core::{DataSourceError, MeasurementPoint, RequestType, WorkerConfiguration};

use crate::source::DataSource;

/// Complete contents of a [`MemoryDataSource`].
#[derive(Debug, Clone, Default)]
pub struct Fixture {
    pub points: HashMap<String, Vec<MeasurementPoint>>,
    pub errors: HashMap<String, String>,
    pub default_points: Option<Vec<MeasurementPoint>>,
    pub default_error: Option<String>,
}

fn pair_key(worker_id: &str, request_id: &str) -> String {
    format!("{worker_id}:{request_id}")
}

/// Serves measurements from memory. Every fetch returns a copy.
#[derive(Debug, Default)]
pub struct MemoryDataSource {
    fixture: RwLock<Fixture>,
    /// Simulated retrieval latency applied before each fetch.
    latency: Option<Duration>,
    fetches: AtomicUsize,
}

impl MemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: Fixture) -> Self {
        Self {
            fixture: RwLock::new(fixture),
            ..Self::default()
        }
    }

    /// Delay every fetch by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn set_points(&self, worker_id: &str, request_id: &str, points: Vec<MeasurementPoint>) {
        self.write().points.insert(pair_key(worker_id, request_id), points);
    }

    pub fn set_error(&self, worker_id: &str, request_id: &str, message: impl Into<String>) {
        self.write().errors.insert(pair_key(worker_id, request_id), message.into());
    }

    pub fn set_default_points(&self, points: Vec<MeasurementPoint>) {
        self.write().default_points = Some(points);
    }

    pub fn set_default_error(&self, message: impl Into<String>) {
        self.write().default_error = Some(message.into());
    }

    /// Swap in a whole new fixture.
    pub fn replace(&self, fixture: Fixture) {
        *self.write() = fixture;
    }

    /// Copy of the current fixture.
    pub fn snapshot(&self) -> Fixture {
        self.read().clone()
    }

    /// Number of fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Demonstration fixture served by `kind = "mock"`.
    ///
    /// Worker `worker_mock_01` with three request types whose data lands in
    /// OK, SLO_UNATTAINABLE and OK_USING_HIGHEST_RATE for sensible SLOs.
    pub fn demo() -> Self {
        let worker = WorkerConfiguration {
            id: "worker_mock_01".to_string(),
            accelerator_type: "mock_accel_l4".to_string(),
            accelerator_count: 1,
            model_name: "mock_model_gemma".to_string(),
            model_server_type: "TGI".to_string(),
            model_server_image: "tgi_image_v1".to_string(),
        };
        let request = |id: &str, bucket: &str| RequestType {
            id: id.to_string(),
            input_size_bucket: bucket.to_string(),
            output_size_bucket: bucket.to_string(),
            latency_slo_tpot_ms: 0.0,
        };

        let source = Self::new();
        let interpolated = request("request_mock_01", "S");
        source.set_points(
            &worker.id,
            &interpolated.id,
            vec![
                MeasurementPoint::for_pair(10.0, 100.0, &worker, &interpolated),
                MeasurementPoint::for_pair(20.0, 200.0, &worker, &interpolated),
                MeasurementPoint::for_pair(30.0, 350.0, &worker, &interpolated),
            ],
        );

        let unattainable = request("request_mock_02_slo_unattainable", "M");
        source.set_points(
            &worker.id,
            &unattainable.id,
            vec![MeasurementPoint::for_pair(5.0, 150.0, &worker, &unattainable)],
        );

        let highest = request("request_mock_03_ok_highest_rate", "L");
        source.set_points(
            &worker.id,
            &highest.id,
            vec![
                MeasurementPoint::for_pair(15.0, 80.0, &worker, &highest),
                MeasurementPoint::for_pair(25.0, 120.0, &worker, &highest),
            ],
        );
        source
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Fixture> {
        self.fixture.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Fixture> {
        self.fixture.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl DataSource for MemoryDataSource {
    async fn fetch(
        &self,
        worker: &WorkerConfiguration,
        request: &RequestType,
    ) -> Result<Vec<MeasurementPoint>, DataSourceError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.fetches.fetch_add(1, Ordering::Relaxed);

        let key = pair_key(&worker.id, &request.id);
        let fixture = self.read();

        if let Some(message) = fixture.errors.get(&key).or(fixture.default_error.as_ref()) {
            return Err(DataSourceError::Injected(message.clone()));
        }

        let points = fixture
            .points
            .get(&key)
            .or(fixture.default_points.as_ref())
            .cloned()
            .unwrap_or_default();
        debug!(%key, count = points.len(), "served fixture points");
        Ok(points)
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
