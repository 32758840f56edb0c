//! Version extraction from a source tree's `package.json`.

use std::path::Path;

use grafana_build_shared::{GrafanaBuildError, Result};

/// Read `<dir>/package.json` and return its `version` field.
///
/// Any read or parse failure, and a missing or empty `version` field, is a
/// version-resolution error for the invocation.
pub(crate) async fn package_json_version(dir: &Path) -> Result<String> {
    let path = dir.join("package.json");

    let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
        GrafanaBuildError::version(format!("failed to read {}: {e}", path.display()))
    })?;

    let manifest: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        GrafanaBuildError::version(format!("failed to parse {}: {e}", path.display()))
    })?;

    manifest
        .get("version")
        .and_then(serde_json::Value::as_str)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            GrafanaBuildError::version(format!(
                "no version field in {}",
                path.display()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_version_field() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"name": "grafana", "version": "10.4.2"}"#,
        )
        .expect("write manifest");

        let version = package_json_version(dir.path()).await.expect("version");
        assert_eq!(version, "10.4.2");
    }

    #[tokio::test]
    async fn missing_manifest_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = package_json_version(dir.path())
            .await
            .expect_err("should fail");
        assert!(matches!(err, GrafanaBuildError::VersionResolution { .. }));
    }

    #[tokio::test]
    async fn missing_version_field_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("package.json"), r#"{"name": "grafana"}"#)
            .expect("write manifest");

        let err = package_json_version(dir.path())
            .await
            .expect_err("should fail");
        assert!(err.to_string().contains("no version field"));
    }

    #[tokio::test]
    async fn malformed_manifest_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("package.json"), "{not json").expect("write manifest");

        let err = package_json_version(dir.path())
            .await
            .expect_err("should fail");
        assert!(err.to_string().contains("failed to parse"));
    }
}
