use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs::{self, File};
use std::path::Path;

use crate::valuation::snapshot::SNAPSHOT_VERSION;
use crate::valuation::{ValuationRequest, ValuationSnapshot};

/// Load a valuation request. `.json` files are read as JSON, anything else
/// as YAML.
pub fn load_request(path: &Path) -> Result<ValuationRequest> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file at {}", path.display()))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let request: ValuationRequest = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse request JSON in {}", path.display()))?
    } else {
        serde_saphyr::from_str(&content)
            .with_context(|| format!("Failed to parse request YAML in {}", path.display()))?
    };

    Ok(request)
}

/// File name a snapshot is saved under: `{company}_{round}.json`, with
/// anything but ASCII alphanumerics, `-` and `_` replaced.
pub fn snapshot_file_name(snapshot: &ValuationSnapshot) -> String {
    let clean = |s: &str| -> String {
        s.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '-'
                }
            })
            .collect()
    };
    format!("{}_{}.json", clean(&snapshot.company_id), clean(&snapshot.round_id))
}

/// Load a snapshot from a JSON file
///
/// Fails if the file is missing or was written with an unsupported version.
pub fn load_snapshot(path: &Path) -> Result<ValuationSnapshot> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open snapshot file at {}", path.display()))?;

    let snapshot: ValuationSnapshot = serde_json::from_reader(file)
        .with_context(|| format!("Failed to load snapshot from {}", path.display()))?;

    if snapshot.version != SNAPSHOT_VERSION {
        anyhow::bail!("Unsupported snapshot version: {}", snapshot.version);
    }

    Ok(snapshot)
}

/// Save a snapshot to a JSON file atomically
///
/// Creates the parent directory if it doesn't exist.
pub fn save_snapshot(path: &Path, snapshot: &ValuationSnapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, snapshot).context("Failed to serialize snapshot")?;

    file.commit().context("Failed to save snapshot")?;

    tracing::debug!(path = %path.display(), id = %snapshot.id, "saved snapshot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::EngineConfig;
    use crate::valuation::{compute_snapshot, IndustryMultipleRange};
    use std::env;

    const REQUEST_YAML: &str = r#"
company_id: acme/west
round_id: r1
as_of: "2026-03-01T00:00:00Z"
industry: hvac_services
industry_range: { low: 3.0, high: 6.0 }
ebitda:
  reported_ebitda: 250000
"#;

    fn sample_snapshot() -> ValuationSnapshot {
        let request: ValuationRequest = serde_saphyr::from_str(REQUEST_YAML).unwrap();
        compute_snapshot(&request, &EngineConfig::default(), None).unwrap()
    }

    #[test]
    fn test_load_request_yaml_and_json() {
        let yaml_path = env::temp_dir().join("exit_value_test_request.yaml");
        fs::write(&yaml_path, REQUEST_YAML).unwrap();
        let from_yaml = load_request(&yaml_path).unwrap();
        assert_eq!(from_yaml.company_id, "acme/west");
        assert_eq!(
            from_yaml.industry_range,
            Some(IndustryMultipleRange::new(3.0, 6.0))
        );

        let json_path = env::temp_dir().join("exit_value_test_request.json");
        fs::write(&json_path, serde_json::to_string(&from_yaml).unwrap()).unwrap();
        let from_json = load_request(&json_path).unwrap();
        assert_eq!(from_yaml, from_json);

        let _ = fs::remove_file(&yaml_path);
        let _ = fs::remove_file(&json_path);
    }

    #[test]
    fn test_load_request_missing_file() {
        let path = env::temp_dir().join("exit_value_test_no_request.yaml");
        let _ = fs::remove_file(&path);
        assert!(load_request(&path).is_err());
    }

    #[test]
    fn test_snapshot_file_name_is_sanitized() {
        assert_eq!(snapshot_file_name(&sample_snapshot()), "acme-west_r1.json");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = env::temp_dir()
            .join("exit_value_test_snapshots")
            .join("roundtrip.json");
        let _ = fs::remove_file(&path);

        let snapshot = sample_snapshot();
        save_snapshot(&path, &snapshot).unwrap();
        let loaded = load_snapshot(&path).unwrap();
        assert_eq!(loaded.id, snapshot.id);
        assert_eq!(loaded.category_scores.len(), snapshot.category_scores.len());
        assert!((loaded.multiple.final_multiple - snapshot.multiple.final_multiple).abs() < 1e-9);
        assert!((loaded.gap.total_gap - snapshot.gap.total_gap).abs() < 1e-6);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let path = env::temp_dir().join("exit_value_test_snapshot_v2.json");
        let mut snapshot = sample_snapshot();
        snapshot.version = 2;
        save_snapshot(&path, &snapshot).unwrap();

        let err = load_snapshot(&path).unwrap_err();
        assert!(err.to_string().contains("Unsupported snapshot version"));

        let _ = fs::remove_file(&path);
    }
}
