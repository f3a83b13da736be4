//! perfprof-datasource — benchmarking measurement sources.
//!
//! Every backend implements [`DataSource`]: given a worker configuration and
//! a request type, return the measurements whose accelerator type and
//! input/output buckets match exactly. Sources never interpolate and never
//! sort; that is the engine's job.
//!
//! # Backends
//!
//! - **`file`**: CSV file on the local filesystem
//! - **`s3`**: CSV object in S3-compatible storage (feature `s3`)
//! - **`memory`**: in-process fixture keyed by `worker_id:request_id`
//!
//! The file and object-storage backends share the CSV filtering logic in
//! [`csv_table`].

pub mod csv_table;
pub mod file;
pub mod memory;
#[cfg(feature = "s3")]
pub mod s3;
pub mod source;

pub use file::FileDataSource;
pub use memory::MemoryDataSource;
#[cfg(feature = "s3")]
pub use s3::S3DataSource;
pub use source::{DataSource, from_config};
