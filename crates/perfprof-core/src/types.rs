//! Domain types for workloads, measurements, and performance profiles.
//!
//! All types serialize to/from JSON for the API and to/from TOML for
//! workload files handed to the CLI.

use serde::{Deserialize, Serialize};

/// Unique identifier for a worker configuration.
pub type WorkerId = String;

/// Unique identifier for a request type.
pub type RequestTypeId = String;

// ── Workload ──────────────────────────────────────────────────────

/// One deployable serving configuration.
///
/// Only `id` identifies the worker; the remaining attributes are used to
/// match benchmarking measurements.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkerConfiguration {
    pub id: WorkerId,
    /// Accelerator type, e.g. "nvidia-l4".
    pub accelerator_type: String,
    pub accelerator_count: u32,
    pub model_name: String,
    /// Serving stack, e.g. "vllm" or "tgi".
    pub model_server_type: String,
    pub model_server_image: String,
}

/// One class of inference request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RequestType {
    pub id: RequestTypeId,
    /// Input-size bucket label, e.g. "128-255".
    pub input_size_bucket: String,
    /// Output-size bucket label.
    pub output_size_bucket: String,
    /// Ceiling on mean time-per-output-token, in milliseconds.
    pub latency_slo_tpot_ms: f32,
}

/// Cross product of worker configurations and request types to profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkloadDefinition {
    pub worker_types: Vec<WorkerConfiguration>,
    pub request_types: Vec<RequestType>,
}

impl WorkloadDefinition {
    /// Number of (worker, request-type) pairs in the workload.
    pub fn pair_count(&self) -> usize {
        self.worker_types.len() * self.request_types.len()
    }

    /// Iterate all pairs, workers outer and request types inner.
    pub fn pairs(&self) -> impl Iterator<Item = (&WorkerConfiguration, &RequestType)> {
        self.worker_types.iter().flat_map(move |worker| {
            self.request_types.iter().map(move |request| (worker, request))
        })
    }
}

// ── Measurements ──────────────────────────────────────────────────

/// A single benchmarking observation for one pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MeasurementPoint {
    /// Measured request rate, in requests per second.
    pub throughput_rps: f32,
    /// Measured mean time-per-output-token at that rate, in milliseconds.
    pub latency_tpot_ms: f32,
    pub accelerator_type: String,
    pub accelerator_count: u32,
    pub model_name: String,
    pub model_server_type: String,
    pub model_server_image: String,
    pub input_size_bucket: String,
    pub output_size_bucket: String,
}

impl MeasurementPoint {
    /// A bare (throughput, latency) point with no dimensional attributes.
    pub fn new(throughput_rps: f32, latency_tpot_ms: f32) -> Self {
        Self {
            throughput_rps,
            latency_tpot_ms,
            ..Self::default()
        }
    }

    /// A point stamped with the attributes of the pair it was matched for.
    pub fn for_pair(
        throughput_rps: f32,
        latency_tpot_ms: f32,
        worker: &WorkerConfiguration,
        request: &RequestType,
    ) -> Self {
        Self {
            throughput_rps,
            latency_tpot_ms,
            accelerator_type: worker.accelerator_type.clone(),
            accelerator_count: worker.accelerator_count,
            model_name: worker.model_name.clone(),
            model_server_type: worker.model_server_type.clone(),
            model_server_image: worker.model_server_image.clone(),
            input_size_bucket: request.input_size_bucket.clone(),
            output_size_bucket: request.output_size_bucket.clone(),
        }
    }
}

// ── Profile ───────────────────────────────────────────────────────

/// Classification of a profile entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfileStatus {
    /// Never set on an entry returned by the engine.
    #[default]
    StatusUnspecified,
    /// Throughput interpolated between two measurements.
    Ok,
    /// SLO holds even at the highest measured rate.
    OkUsingHighestRate,
    /// SLO is stricter than the latency at the lowest measured rate.
    SloUnattainable,
    NoDataFound,
    /// Measurements could not be classified (non-monotonic or NaN data).
    InternalError,
}

impl ProfileStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ProfileStatus::StatusUnspecified => "STATUS_UNSPECIFIED",
            ProfileStatus::Ok => "OK",
            ProfileStatus::OkUsingHighestRate => "OK_USING_HIGHEST_RATE",
            ProfileStatus::SloUnattainable => "SLO_UNATTAINABLE",
            ProfileStatus::NoDataFound => "NO_DATA_FOUND",
            ProfileStatus::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ProfileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The computed result for one (worker, request-type) pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileEntry {
    pub worker_type_id: WorkerId,
    pub request_type_id: RequestTypeId,
    /// Highest sustainable rate under the SLO; 0 when unattainable or unknown.
    pub max_throughput_rps: f32,
    pub status: ProfileStatus,
}

/// One entry per pair of the workload it was generated for.
///
/// Entry order is not part of the contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PerformanceProfile {
    pub entries: Vec<ProfileEntry>,
}

impl PerformanceProfile {
    /// Look up the entry for a pair.
    pub fn entry(&self, worker_id: &str, request_type_id: &str) -> Option<&ProfileEntry> {
        self.entries
            .iter()
            .find(|e| e.worker_type_id == worker_id && e.request_type_id == request_type_id)
    }

    /// Count entries carrying the given status.
    pub fn count_status(&self, status: ProfileStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }
}
