//! Shared command-line options and their merge with perfprof.toml.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;

use perfprof_core::{DataSourceConfig, ProfilerConfig};

/// Data source selection. Any flag given here replaces `[datasource]`.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Use the built-in demonstration fixture.
    #[arg(long, conflicts_with_all = ["csv_file", "s3_bucket"])]
    pub mock: bool,

    /// Read measurements from a local CSV file.
    #[arg(long, value_name = "PATH", conflicts_with = "s3_bucket")]
    pub csv_file: Option<PathBuf>,

    /// Read measurements from this S3 bucket.
    #[arg(long, requires = "s3_key")]
    pub s3_bucket: Option<String>,

    /// Object key of the CSV inside --s3-bucket.
    #[arg(long, requires = "s3_bucket")]
    pub s3_key: Option<String>,

    /// AWS region for the S3 client.
    #[arg(long, requires = "s3_bucket")]
    pub s3_region: Option<String>,

    /// Custom S3-compatible endpoint, e.g. a local MinIO.
    #[arg(long, requires = "s3_bucket")]
    pub s3_endpoint: Option<String>,
}

impl SourceArgs {
    /// The data source named on the command line, if any.
    pub fn datasource(&self) -> Option<DataSourceConfig> {
        if self.mock {
            return Some(DataSourceConfig::Mock);
        }
        if let Some(path) = &self.csv_file {
            return Some(DataSourceConfig::File { path: path.clone() });
        }
        match (&self.s3_bucket, &self.s3_key) {
            (Some(bucket), Some(key)) => Some(DataSourceConfig::S3 {
                bucket: bucket.clone(),
                key: key.clone(),
                region: self.s3_region.clone(),
                endpoint: self.s3_endpoint.clone(),
            }),
            _ => None,
        }
    }
}

/// Load perfprof.toml if given, otherwise start from defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ProfilerConfig> {
    match path {
        Some(path) => ProfilerConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(ProfilerConfig::default()),
    }
}

/// Apply command-line overrides on top of the file configuration.
///
/// Fails when neither source names a data source.
pub fn resolve(mut config: ProfilerConfig, source: &SourceArgs) -> anyhow::Result<ProfilerConfig> {
    if let Some(datasource) = source.datasource() {
        config.datasource = Some(datasource);
    }
    if config.datasource.is_none() {
        anyhow::bail!(
            "no data source configured: pass --mock, --csv-file or --s3-bucket with --s3-key, \
             or set [datasource] in perfprof.toml"
        );
    }
    config.validate()?;
    Ok(config)
}
