//! perfprof-core — shared types for the SLO-bound throughput profiler.
//!
//! Holds the workload and profile data model, the status and error
//! taxonomy used by the engine, and the `perfprof.toml` configuration
//! parser shared by the daemon and CLI.

pub mod config;
pub mod error;
pub mod types;

pub use config::{DataSourceConfig, EngineConfig, ProfilerConfig, ServerConfig};
pub use error::{DataSourceError, ProfileError, ProfileResult};
pub use types::*;
