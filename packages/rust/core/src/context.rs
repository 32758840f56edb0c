//! Build context assembly.
//!
//! One [`BuildContext`] is assembled per CLI invocation, consumed read-only
//! by exactly one pipeline function, and discarded when that call returns.

use std::path::PathBuf;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use grafana_build_engine::Directory;
use grafana_build_shared::Result;

use crate::build_id::resolve_build_id;
use crate::source::{SourceEngine, resolve_source};
use crate::version::{VersionSource, resolve_version};

// ---------------------------------------------------------------------------
// InvocationOptions
// ---------------------------------------------------------------------------

/// Fully-resolved options for one invocation.
///
/// The CLI merges flags over config-file values over defaults and constructs
/// this once; no mutable flag state survives past that point. The GitHub
/// token has already been resolved — a missing credential aborts before this
/// struct exists.
#[derive(Debug, Clone)]
pub struct InvocationOptions {
    /// Enable transport-level logging for the engine connection.
    pub verbose: bool,
    /// Clone and initialize the enterprise overlay when cloning.
    pub enterprise: bool,
    /// Ref to clone for the base repository.
    pub grafana_ref: String,
    /// Ref to clone for the enterprise repository.
    pub enterprise_ref: String,
    /// Base repository clone URL.
    pub grafana_repo: String,
    /// Enterprise repository clone URL.
    pub enterprise_repo: String,
    /// Local source path checked before cloning.
    pub source_path: PathBuf,
    /// Resolved GitHub access token.
    pub github_token: String,
    /// Caller-supplied build identity, if any.
    pub build_id: Option<String>,
    /// Caller-supplied version, if any (build subcommand only).
    pub version: Option<String>,
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for long-running assembly phases.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
}

// ---------------------------------------------------------------------------
// BuildContext
// ---------------------------------------------------------------------------

/// The immutable context handed to exactly one pipeline function.
///
/// The invocation's cancellation token is deliberately not part of this
/// struct; it travels alongside it as the first pipeline-function parameter.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Build identity, caller-supplied or generated. Never empty.
    pub build_id: String,
    /// Whether transport-level logging is enabled.
    pub verbose: bool,
    /// Version string, explicit or read from the source tree. Never empty.
    pub version: String,
    /// Whether the enterprise overlay was requested.
    pub enterprise: bool,
    /// Handle to the resolved source tree, owned by the engine connection.
    pub source: Directory,
}

/// Assemble the build context for one invocation.
///
/// Runs source resolution, version resolution, and build-identity
/// generation in that fixed order, short-circuiting on the first error.
/// Version resolution deliberately follows source resolution because it may
/// inspect the resolved tree.
#[instrument(skip_all, fields(path = %opts.source_path.display(), enterprise = opts.enterprise))]
pub async fn assemble<E>(
    engine: &E,
    cancel: &CancellationToken,
    opts: &InvocationOptions,
    rng: &mut impl Rng,
    progress: &dyn ProgressReporter,
) -> Result<BuildContext>
where
    E: SourceEngine + VersionSource,
{
    progress.phase("Resolving source tree");
    let source = resolve_source(engine, cancel, opts, progress).await?;

    progress.phase("Resolving version");
    let version = resolve_version(engine, opts.version.as_deref(), &source).await?;

    let build_id = resolve_build_id(opts.build_id.as_deref(), rng);

    info!(%build_id, version, "build context assembled");

    Ok(BuildContext {
        build_id,
        verbose: opts.verbose,
        version,
        enterprise: opts.enterprise,
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use grafana_build_engine::CloneRequest;
    use grafana_build_shared::GrafanaBuildError;

    use crate::build_id::BUILD_ID_LEN;

    use super::*;

    /// Fake engine covering both the source and version seams.
    #[derive(Default)]
    struct FakeEngine {
        clones: Mutex<Vec<CloneRequest>>,
        inspections: AtomicUsize,
    }

    impl SourceEngine for FakeEngine {
        fn host_directory(&self, path: &Path) -> Directory {
            Directory::new(path)
        }

        async fn clone_repo(
            &self,
            _cancel: &CancellationToken,
            request: &CloneRequest,
        ) -> Result<Directory> {
            self.clones.lock().expect("lock").push(request.clone());
            Ok(Directory::new("/engine/grafana"))
        }

        async fn initialize_enterprise(
            &self,
            _cancel: &CancellationToken,
            base: &Directory,
            _enterprise: &Directory,
        ) -> Result<Directory> {
            Ok(base.clone())
        }
    }

    impl VersionSource for FakeEngine {
        async fn manifest_version(&self, _dir: &Directory) -> Result<String> {
            self.inspections.fetch_add(1, Ordering::SeqCst);
            Ok("10.4.2".to_string())
        }
    }

    fn options(path: impl Into<PathBuf>) -> InvocationOptions {
        InvocationOptions {
            verbose: false,
            enterprise: false,
            grafana_ref: "main".into(),
            enterprise_ref: "main".into(),
            grafana_repo: "https://github.com/grafana/grafana.git".into(),
            enterprise_repo: "https://github.com/grafana/grafana-enterprise.git".into(),
            source_path: path.into(),
            github_token: "test-token".into(),
            build_id: None,
            version: None,
        }
    }

    #[tokio::test]
    async fn fresh_clone_with_inspected_version_and_generated_id() {
        let engine = FakeEngine::default();
        let cancel = CancellationToken::new();
        let dir = tempfile::tempdir().expect("tempdir");
        let opts = options(dir.path().join(".grafana"));
        let mut rng = StdRng::seed_from_u64(7);

        let context = assemble(&engine, &cancel, &opts, &mut rng, &SilentProgress)
            .await
            .expect("assemble");

        let clones = engine.clones.lock().expect("lock");
        assert_eq!(clones.len(), 1);
        assert_eq!(clones[0].reference, "main");
        assert_eq!(engine.inspections.load(Ordering::SeqCst), 1);
        assert_eq!(context.version, "10.4.2");
        assert_eq!(context.build_id.len(), BUILD_ID_LEN);
        assert!(context.build_id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(!context.enterprise);
    }

    #[tokio::test]
    async fn local_tree_with_explicit_version_touches_nothing() {
        let engine = FakeEngine::default();
        let cancel = CancellationToken::new();
        let dir = tempfile::tempdir().expect("tempdir");
        let mut opts = options(dir.path());
        opts.version = Some("1.2.3".into());
        opts.build_id = Some("ci-42".into());
        let mut rng = StdRng::seed_from_u64(7);

        let context = assemble(&engine, &cancel, &opts, &mut rng, &SilentProgress)
            .await
            .expect("assemble");

        assert!(engine.clones.lock().expect("lock").is_empty());
        assert_eq!(engine.inspections.load(Ordering::SeqCst), 0);
        assert_eq!(context.version, "1.2.3");
        assert_eq!(context.build_id, "ci-42");
        assert_eq!(context.source.path(), dir.path());
    }

    #[tokio::test]
    async fn file_path_fails_before_any_version_work() {
        let engine = FakeEngine::default();
        let cancel = CancellationToken::new();
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("grafana");
        std::fs::write(&file, "x").expect("write file");
        let opts = options(&file);
        let mut rng = StdRng::seed_from_u64(7);

        let err = assemble(&engine, &cancel, &opts, &mut rng, &SilentProgress)
            .await
            .expect_err("should fail");

        assert!(matches!(err, GrafanaBuildError::NotADirectory { .. }));
        assert!(engine.clones.lock().expect("lock").is_empty());
        assert_eq!(engine.inspections.load(Ordering::SeqCst), 0);
    }
}
