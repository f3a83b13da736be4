//! Profile engine: fans a workload out over the data source.
//!
//! Each pair is fetched and classified independently. Results are
//! reassembled in workload order (workers outer, request types inner).

use std::sync::Arc;
use std::time::Duration;

use futures::{StreamExt, TryStreamExt, stream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use perfprof_core::config::DEFAULT_CONCURRENCY;
use perfprof_core::{
    EngineConfig, PerformanceProfile, ProfileEntry, ProfileError, ProfileResult, ProfileStatus,
    RequestType, WorkerConfiguration, WorkloadDefinition,
};
use perfprof_datasource::DataSource;

use crate::classify::classify;

/// Generates performance profiles from a [`DataSource`].
#[derive(Debug, Clone)]
pub struct ProfileEngine {
    source: Arc<dyn DataSource>,
    /// Maximum number of pairs in flight at once.
    concurrency: usize,
    /// Upper bound on a whole `generate_profile` call.
    deadline: Option<Duration>,
}

impl ProfileEngine {
    /// Create an engine with default concurrency and no deadline.
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            concurrency: DEFAULT_CONCURRENCY,
            deadline: None,
        }
    }

    /// Create an engine from `[engine]` configuration.
    pub fn with_config(source: Arc<dyn DataSource>, config: &EngineConfig) -> anyhow::Result<Self> {
        Ok(Self {
            source,
            concurrency: config.concurrency(),
            deadline: config.deadline()?,
        })
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Compute one profile entry per (worker, request type) pair.
    ///
    /// Returns either the complete profile or a single error: invalid input
    /// (before any fetch), the fetch failure of the lowest-index failing
    /// pair, cancellation, or deadline expiry. Never a partial profile.
    pub async fn generate_profile(
        &self,
        workload: &WorkloadDefinition,
        cancel: &CancellationToken,
    ) -> ProfileResult<PerformanceProfile> {
        validate(workload)?;

        info!(
            workers = workload.worker_types.len(),
            request_types = workload.request_types.len(),
            pairs = workload.pair_count(),
            concurrency = self.concurrency,
            "generating performance profile"
        );

        let run = async {
            match self.deadline {
                Some(deadline) => tokio::time::timeout(deadline, self.evaluate_all(workload))
                    .await
                    .map_err(|_| ProfileError::DeadlineExceeded(deadline))?,
                None => self.evaluate_all(workload).await,
            }
        };

        let profile = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProfileError::Cancelled),
            result = run => result,
        }?;

        info!(
            entries = profile.entries.len(),
            ok = profile.count_status(ProfileStatus::Ok),
            highest_rate = profile.count_status(ProfileStatus::OkUsingHighestRate),
            unattainable = profile.count_status(ProfileStatus::SloUnattainable),
            no_data = profile.count_status(ProfileStatus::NoDataFound),
            internal_error = profile.count_status(ProfileStatus::InternalError),
            "performance profile generated"
        );
        Ok(profile)
    }

    async fn evaluate_all(&self, workload: &WorkloadDefinition) -> ProfileResult<PerformanceProfile> {
        // `buffered` yields in input order, so the first error collected is
        // the one for the lowest-index failing pair.
        let pending: Vec<_> = workload
            .pairs()
            .map(|(worker, request)| self.evaluate_pair(worker, request))
            .collect();
        let entries: Vec<ProfileEntry> = stream::iter(pending)
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        Ok(PerformanceProfile { entries })
    }

    async fn evaluate_pair(
        &self,
        worker: &WorkerConfiguration,
        request: &RequestType,
    ) -> ProfileResult<ProfileEntry> {
        let mut points = self.source.fetch(worker, request).await.map_err(|source| {
            error!(
                worker = %worker.id,
                request = %request.id,
                error = %source,
                "failed to fetch benchmark data"
            );
            ProfileError::Fetch {
                worker_id: worker.id.clone(),
                request_type_id: request.id.clone(),
                source,
            }
        })?;

        let slo = request.latency_slo_tpot_ms;
        let outcome = classify(&mut points, slo);

        if outcome.status == ProfileStatus::InternalError {
            error!(
                worker = %worker.id,
                request = %request.id,
                slo_ms = slo,
                points = ?points,
                "could not interpolate throughput; measurements are inconsistent"
            );
        } else {
            debug!(
                worker = %worker.id,
                request = %request.id,
                slo_ms = slo,
                points = points.len(),
                status = %outcome.status,
                max_throughput_rps = outcome.max_throughput_rps,
                "classified pair"
            );
        }

        Ok(ProfileEntry {
            worker_type_id: worker.id.clone(),
            request_type_id: request.id.clone(),
            max_throughput_rps: outcome.max_throughput_rps,
            status: outcome.status,
        })
    }
}

fn validate(workload: &WorkloadDefinition) -> ProfileResult<()> {
    if workload.worker_types.is_empty() || workload.request_types.is_empty() {
        return Err(ProfileError::InvalidInput(
            "workload definition with worker_types and request_types must be provided".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    use async_trait::async_trait;
    use perfprof_core::{DataSourceError, MeasurementPoint};
    use perfprof_datasource::MemoryDataSource;

    fn dp(rate: f32, latency: f32) -> MeasurementPoint {
        MeasurementPoint::new(rate, latency)
    }

    fn worker(id: &str) -> WorkerConfiguration {
        WorkerConfiguration {
            id: id.to_string(),
            ..Default::default()
        }
    }

    fn request(id: &str, slo: f32) -> RequestType {
        RequestType {
            id: id.to_string(),
            latency_slo_tpot_ms: slo,
            ..Default::default()
        }
    }

    fn engine(source: Arc<MemoryDataSource>) -> ProfileEngine {
        ProfileEngine::new(source)
    }

    #[tokio::test]
    async fn interpolation_scenario() {
        let source = Arc::new(MemoryDataSource::new());
        source.set_points("w1", "r1", vec![dp(50.0, 100.0), dp(60.0, 500.0)]);

        let workload = WorkloadDefinition {
            worker_types: vec![worker("w1")],
            request_types: vec![request("r1", 300.0)],
        };
        let profile = engine(source)
            .generate_profile(&workload, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            profile.entries,
            vec![ProfileEntry {
                worker_type_id: "w1".into(),
                request_type_id: "r1".into(),
                max_throughput_rps: 55.0,
                status: ProfileStatus::Ok,
            }]
        );
    }

    #[tokio::test]
    async fn edge_case_statuses() {
        let source = Arc::new(MemoryDataSource::new());
        source.set_points("w1", "r_unattainable", vec![dp(50.0, 100.0), dp(60.0, 500.0)]);
        source.set_points("w1", "r_highest", vec![dp(50.0, 100.0), dp(60.0, 500.0)]);
        source.set_points("w1", "r_insufficient", vec![dp(50.0, 100.0)]);
        source.set_points("w1", "r_exact", vec![dp(50.0, 100.0), dp(60.0, 500.0)]);

        let workload = WorkloadDefinition {
            worker_types: vec![worker("w1")],
            request_types: vec![
                request("r_no_data", 200.0),
                request("r_unattainable", 50.0),
                request("r_highest", 600.0),
                request("r_insufficient", 150.0),
                request("r_exact", 500.0),
            ],
        };
        let profile = engine(source)
            .generate_profile(&workload, &CancellationToken::new())
            .await
            .unwrap();

        let check = |id: &str, status: ProfileStatus, rps: f32| {
            let entry = profile.entry("w1", id).unwrap();
            assert_eq!(entry.status, status, "{id}");
            assert_eq!(entry.max_throughput_rps, rps, "{id}");
        };
        check("r_no_data", ProfileStatus::NoDataFound, 0.0);
        check("r_unattainable", ProfileStatus::SloUnattainable, 0.0);
        check("r_highest", ProfileStatus::OkUsingHighestRate, 60.0);
        check("r_insufficient", ProfileStatus::OkUsingHighestRate, 50.0);
        check("r_exact", ProfileStatus::OkUsingHighestRate, 60.0);
    }

    #[tokio::test]
    async fn profile_has_one_entry_per_pair() {
        let source = Arc::new(MemoryDataSource::new());
        source.set_default_points(vec![dp(10.0, 100.0), dp(20.0, 200.0)]);
        source.set_points("w2", "r3", vec![]);

        let workload = WorkloadDefinition {
            worker_types: vec![worker("w1"), worker("w2"), worker("w3")],
            request_types: vec![
                request("r1", 50.0),
                request("r2", 150.0),
                request("r3", 250.0),
                request("r4", 175.0),
            ],
        };
        let profile = engine(source.clone())
            .with_concurrency(3)
            .generate_profile(&workload, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(profile.entries.len(), 12);
        let pairs: HashSet<(String, String)> = profile
            .entries
            .iter()
            .map(|e| (e.worker_type_id.clone(), e.request_type_id.clone()))
            .collect();
        assert_eq!(pairs.len(), 12);
        assert_eq!(source.fetch_count(), 12);
        assert_eq!(profile.count_status(ProfileStatus::StatusUnspecified), 0);
        assert_eq!(profile.entry("w2", "r3").unwrap().status, ProfileStatus::NoDataFound);
        assert_eq!(profile.entry("w1", "r2").unwrap().max_throughput_rps, 15.0);

        // Workload order: workers outer, request types inner.
        assert_eq!(profile.entries[0].request_type_id, "r1");
        assert_eq!(profile.entries[4].worker_type_id, "w2");
    }

    #[tokio::test]
    async fn repeated_runs_are_identical() {
        let source = Arc::new(MemoryDataSource::demo());
        let workload = WorkloadDefinition {
            worker_types: vec![worker("worker_mock_01")],
            request_types: vec![
                request("request_mock_01", 275.0),
                request("request_mock_02_slo_unattainable", 100.0),
                request("request_mock_03_ok_highest_rate", 150.0),
            ],
        };
        let engine = engine(source);
        let cancel = CancellationToken::new();

        let first = engine.generate_profile(&workload, &cancel).await.unwrap();
        let second = engine.generate_profile(&workload, &cancel).await.unwrap();
        assert_eq!(first, second);

        assert_eq!(first.entries[0].status, ProfileStatus::Ok);
        assert_eq!(first.entries[0].max_throughput_rps, 25.0);
        assert_eq!(first.entries[1].status, ProfileStatus::SloUnattainable);
        assert_eq!(first.entries[2].status, ProfileStatus::OkUsingHighestRate);
        assert_eq!(first.entries[2].max_throughput_rps, 25.0);
    }

    #[tokio::test]
    async fn fetch_error_aborts_whole_profile() {
        let source = Arc::new(MemoryDataSource::new());
        source.set_default_points(vec![dp(10.0, 100.0)]);
        source.set_error("w2", "r_ds_error_case", "mock data source specific error");

        let workload = WorkloadDefinition {
            worker_types: vec![worker("w1"), worker("w2")],
            request_types: vec![request("r1", 200.0), request("r_ds_error_case", 200.0)],
        };
        let err = engine(source)
            .generate_profile(&workload, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(!err.is_client_error());
        assert_eq!(
            err.to_string(),
            "failed to fetch data for worker w2, request r_ds_error_case: mock data source specific error"
        );
    }

    #[tokio::test]
    async fn invalid_workload_is_rejected_before_fetching() {
        let source = Arc::new(MemoryDataSource::new());
        let engine = engine(source.clone());
        let cancel = CancellationToken::new();

        let cases = [
            WorkloadDefinition::default(),
            WorkloadDefinition {
                worker_types: vec![],
                request_types: vec![request("r1", 100.0)],
            },
            WorkloadDefinition {
                worker_types: vec![worker("w1")],
                request_types: vec![],
            },
        ];
        for workload in &cases {
            let err = engine.generate_profile(workload, &cancel).await.unwrap_err();
            assert!(matches!(err, ProfileError::InvalidInput(_)));
            assert!(err.is_client_error());
        }
        assert_eq!(source.fetch_count(), 0);
    }

    /// Fails the configured request ids after a per-request delay.
    #[derive(Debug)]
    struct ScriptedSource {
        failures: Vec<(&'static str, Duration)>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(failures: Vec<(&'static str, Duration)>) -> Self {
            Self {
                failures,
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DataSource for ScriptedSource {
        async fn fetch(
            &self,
            _worker: &WorkerConfiguration,
            request: &RequestType,
        ) -> Result<Vec<MeasurementPoint>, DataSourceError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let failure = self.failures.iter().find(|(id, _)| *id == request.id);
            let delay = failure.map(|(_, d)| *d).unwrap_or(Duration::from_millis(5));
            tokio::time::sleep(delay).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            match failure {
                Some(_) => Err(DataSourceError::Injected(format!("{} failed", request.id))),
                None => Ok(vec![dp(10.0, 100.0)]),
            }
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    #[tokio::test]
    async fn lowest_index_error_wins_under_concurrency() {
        // r2 fails slowly, r3 fails immediately; r2 comes first in the workload.
        let source = Arc::new(ScriptedSource::new(vec![
            ("r2", Duration::from_millis(100)),
            ("r3", Duration::from_millis(1)),
        ]));
        let workload = WorkloadDefinition {
            worker_types: vec![worker("w1")],
            request_types: vec![request("r1", 200.0), request("r2", 200.0), request("r3", 200.0)],
        };

        let err = ProfileEngine::new(source)
            .with_concurrency(4)
            .generate_profile(&workload, &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            ProfileError::Fetch { request_type_id, .. } => assert_eq!(request_type_id, "r2"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let source = Arc::new(ScriptedSource::new(vec![]));
        let workload = WorkloadDefinition {
            worker_types: vec![worker("w1"), worker("w2")],
            request_types: (0..6).map(|i| request(&format!("r{i}"), 200.0)).collect(),
        };

        let profile = ProfileEngine::new(source.clone())
            .with_concurrency(3)
            .generate_profile(&workload, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(profile.entries.len(), 12);
        let peak = source.max_in_flight.load(Ordering::SeqCst);
        assert!((1..=3).contains(&peak), "peak in-flight fetches: {peak}");
    }

    #[tokio::test]
    async fn cancellation_aborts_in_flight_fetches() {
        let source = Arc::new(MemoryDataSource::new().with_latency(Duration::from_secs(5)));
        let workload = WorkloadDefinition {
            worker_types: vec![worker("w1")],
            request_types: vec![request("r1", 100.0), request("r2", 100.0)],
        };
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let err = engine(source).generate_profile(&workload, &cancel).await.unwrap_err();

        assert!(matches!(err, ProfileError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn deadline_bounds_the_whole_run() {
        let source = Arc::new(MemoryDataSource::new().with_latency(Duration::from_secs(5)));
        let workload = WorkloadDefinition {
            worker_types: vec![worker("w1")],
            request_types: vec![request("r1", 100.0)],
        };

        let err = engine(source)
            .with_deadline(Duration::from_millis(50))
            .generate_profile(&workload, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ProfileError::DeadlineExceeded(d) if d == Duration::from_millis(50)));
    }

    #[test]
    fn with_config_reads_engine_section() {
        let source: Arc<dyn DataSource> = Arc::new(MemoryDataSource::new());
        let config = EngineConfig {
            concurrency: Some(2),
            deadline: Some("1m".into()),
        };
        let engine = ProfileEngine::with_config(source.clone(), &config).unwrap();
        assert_eq!(engine.concurrency(), 2);
        assert_eq!(engine.deadline, Some(Duration::from_secs(60)));

        let bad = EngineConfig {
            concurrency: None,
            deadline: Some("whenever".into()),
        };
        assert!(ProfileEngine::with_config(source, &bad).is_err());
    }
}
