//! Version resolution: explicit flag value or source-tree inspection.

use tracing::info;

use grafana_build_engine::{Directory, Engine};
use grafana_build_shared::Result;

/// Engine operation needed to inspect a source tree's version descriptor.
#[allow(async_fn_in_trait)]
pub trait VersionSource {
    /// Read the `version` field of the tree's `package.json`.
    async fn manifest_version(&self, dir: &Directory) -> Result<String>;
}

impl VersionSource for Engine {
    async fn manifest_version(&self, dir: &Directory) -> Result<String> {
        Engine::manifest_version(self, dir).await
    }
}

/// Resolve the version string for this invocation.
///
/// A non-empty explicit version is returned unchanged with no inspection.
/// Otherwise the resolved source tree is inspected exactly once; this is the
/// one designed fallback in the system and deliberately runs after source
/// resolution.
pub async fn resolve_version<E: VersionSource>(
    engine: &E,
    explicit: Option<&str>,
    source: &Directory,
) -> Result<String> {
    if let Some(version) = explicit.filter(|v| !v.is_empty()) {
        return Ok(version.to_string());
    }

    info!("version not provided; reading it from package.json");
    let version = engine.manifest_version(source).await?;
    info!(version, "resolved version from source tree");

    Ok(version)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use grafana_build_shared::GrafanaBuildError;

    use super::*;

    struct FakeManifest {
        /// `None` simulates a missing or unreadable manifest.
        version: Option<&'static str>,
        inspections: AtomicUsize,
    }

    impl FakeManifest {
        fn returning(version: &'static str) -> Self {
            Self {
                version: Some(version),
                inspections: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                version: None,
                inspections: AtomicUsize::new(0),
            }
        }
    }

    impl VersionSource for FakeManifest {
        async fn manifest_version(&self, _dir: &Directory) -> Result<String> {
            self.inspections.fetch_add(1, Ordering::SeqCst);
            self.version
                .map(str::to_string)
                .ok_or_else(|| GrafanaBuildError::version("no package.json"))
        }
    }

    #[tokio::test]
    async fn explicit_version_skips_inspection() {
        let engine = FakeManifest::returning("9.9.9");
        let source = Directory::new("/src");

        let version = resolve_version(&engine, Some("1.2.3"), &source)
            .await
            .expect("resolve");

        assert_eq!(version, "1.2.3");
        assert_eq!(engine.inspections.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_version_inspects_exactly_once() {
        let engine = FakeManifest::returning("10.4.2");
        let source = Directory::new("/src");

        let version = resolve_version(&engine, None, &source)
            .await
            .expect("resolve");

        assert_eq!(version, "10.4.2");
        assert_eq!(engine.inspections.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_version_counts_as_unset() {
        let engine = FakeManifest::returning("10.4.2");
        let source = Directory::new("/src");

        let version = resolve_version(&engine, Some(""), &source)
            .await
            .expect("resolve");

        assert_eq!(version, "10.4.2");
        assert_eq!(engine.inspections.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn inspection_failure_propagates() {
        let engine = FakeManifest::failing();
        let source = Directory::new("/src");

        let err = resolve_version(&engine, None, &source)
            .await
            .expect_err("should fail");

        assert!(matches!(err, GrafanaBuildError::VersionResolution { .. }));
    }
}
