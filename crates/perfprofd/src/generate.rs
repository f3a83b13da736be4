//! One-shot mode: profiles a workload file and prints the result.

use std::path::Path;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::info;

use perfprof_core::WorkloadDefinition;

use crate::cli::{self, SourceArgs};
use crate::report;
use crate::serve::build_engine;

/// Read a workload definition from JSON, or TOML when the file ends in `.toml`.
pub fn load_workload(path: &Path) -> anyhow::Result<WorkloadDefinition> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read workload {}", path.display()))?;

    let workload = if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&content)
            .with_context(|| format!("invalid workload {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("invalid workload {}", path.display()))?
    };
    Ok(workload)
}

pub async fn run_generate(
    workload_path: &Path,
    config_path: Option<&Path>,
    format: &str,
    source: &SourceArgs,
) -> anyhow::Result<()> {
    if !matches!(format, "json" | "text") {
        anyhow::bail!("unknown output format '{format}', expected json or text");
    }

    let workload = load_workload(workload_path)?;
    let config = cli::resolve(cli::load_config(config_path)?, source)?;
    let engine = build_engine(&config).await?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, cancelling profile");
            ctrl_c.cancel();
        }
    });

    let profile = engine.generate_profile(&workload, &cancel).await?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&profile)?),
        _ => print!("{}", report::format_profile(&profile)),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORKLOAD_JSON: &str = r#"{
  "worker_types": [
    { "id": "worker_mock_01", "accelerator_type": "mock_accel_l4", "accelerator_count": 1 }
  ],
  "request_types": [
    { "id": "request_mock_01", "input_size_bucket": "S", "output_size_bucket": "S", "latency_slo_tpot_ms": 275.0 }
  ]
}"#;

    const WORKLOAD_TOML: &str = r#"
[[worker_types]]
id = "worker_mock_01"
accelerator_type = "mock_accel_l4"

[[request_types]]
id = "request_mock_01"
latency_slo_tpot_ms = 275.0

[[request_types]]
id = "request_mock_03_ok_highest_rate"
latency_slo_tpot_ms = 150.0
"#;

    #[test]
    fn loads_json_workload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workload.json");
        std::fs::write(&path, WORKLOAD_JSON).unwrap();

        let workload = load_workload(&path).unwrap();
        assert_eq!(workload.pair_count(), 1);
        assert_eq!(workload.request_types[0].latency_slo_tpot_ms, 275.0);
        assert_eq!(workload.worker_types[0].accelerator_type, "mock_accel_l4");
    }

    #[test]
    fn loads_toml_workload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workload.toml");
        std::fs::write(&path, WORKLOAD_TOML).unwrap();

        let workload = load_workload(&path).unwrap();
        assert_eq!(workload.pair_count(), 2);
        assert_eq!(workload.request_types[1].id, "request_mock_03_ok_highest_rate");
    }

    #[test]
    fn malformed_workload_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_workload(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[tokio::test]
    async fn generate_rejects_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workload.json");
        std::fs::write(&path, WORKLOAD_JSON).unwrap();
        let source = SourceArgs {
            mock: true,
            ..Default::default()
        };

        let err = run_generate(&path, None, "yaml", &source).await.unwrap_err();
        assert!(err.to_string().contains("unknown output format"));
    }

    #[tokio::test]
    async fn generate_requires_data_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workload.json");
        std::fs::write(&path, WORKLOAD_JSON).unwrap();

        let err = run_generate(&path, None, "json", &SourceArgs::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no data source configured"));
    }
}
