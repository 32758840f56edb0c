//! Source tree resolution: local reuse, fresh clone, or clone plus overlay.

use std::io::ErrorKind;
use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use grafana_build_engine::{CloneRequest, Directory, Engine};
use grafana_build_shared::{GrafanaBuildError, Result};

use crate::context::{InvocationOptions, ProgressReporter};

/// Engine operations needed to resolve a source tree.
///
/// Implemented by the real [`Engine`]; tests substitute recording fakes to
/// assert on exactly which calls happen.
#[allow(async_fn_in_trait)]
pub trait SourceEngine {
    /// Wrap an existing host directory as a source tree handle.
    fn host_directory(&self, path: &Path) -> Directory;

    /// Clone the requested ref into engine-owned storage.
    async fn clone_repo(
        &self,
        cancel: &CancellationToken,
        request: &CloneRequest,
    ) -> Result<Directory>;

    /// Overlay an enterprise checkout onto a base tree.
    async fn initialize_enterprise(
        &self,
        cancel: &CancellationToken,
        base: &Directory,
        enterprise: &Directory,
    ) -> Result<Directory>;
}

impl SourceEngine for Engine {
    fn host_directory(&self, path: &Path) -> Directory {
        Engine::host_directory(self, path)
    }

    async fn clone_repo(
        &self,
        cancel: &CancellationToken,
        request: &CloneRequest,
    ) -> Result<Directory> {
        Engine::clone_repo(self, cancel, request).await
    }

    async fn initialize_enterprise(
        &self,
        cancel: &CancellationToken,
        base: &Directory,
        enterprise: &Directory,
    ) -> Result<Directory> {
        Engine::initialize_enterprise(self, cancel, base, enterprise).await
    }
}

/// Resolve the source tree for this invocation.
///
/// Exactly one of three outcomes happens: the local directory is reused, the
/// base repository is cloned, or the base and enterprise repositories are
/// both cloned and overlaid. A missing local path is the only condition that
/// triggers cloning; every other stat failure is terminal.
pub async fn resolve_source<E: SourceEngine>(
    engine: &E,
    cancel: &CancellationToken,
    opts: &InvocationOptions,
    progress: &dyn ProgressReporter,
) -> Result<Directory> {
    let path = &opts.source_path;

    match tokio::fs::metadata(path).await {
        Err(e) if e.kind() == ErrorKind::NotFound => {
            clone_source(engine, cancel, opts, progress).await
        }
        Err(e) => Err(GrafanaBuildError::SourceStat {
            path: path.clone(),
            source: e,
        }),
        Ok(meta) if !meta.is_dir() => Err(GrafanaBuildError::NotADirectory { path: path.clone() }),
        Ok(_) => {
            // A local tree is used as-is, with no network access; it is
            // assumed to be enterprise-initialized already if that was wanted.
            debug!(path = %path.display(), "using local source tree");
            Ok(engine.host_directory(path))
        }
    }
}

/// Clone the base repository, and the enterprise overlay when requested.
async fn clone_source<E: SourceEngine>(
    engine: &E,
    cancel: &CancellationToken,
    opts: &InvocationOptions,
    progress: &dyn ProgressReporter,
) -> Result<Directory> {
    info!(
        reference = %opts.grafana_ref,
        "source path does not exist, cloning grafana"
    );
    progress.phase(&format!("Cloning grafana at {}", opts.grafana_ref));

    let base = engine
        .clone_repo(
            cancel,
            &CloneRequest::new(&opts.grafana_repo, &opts.grafana_ref),
        )
        .await?;

    if !opts.enterprise {
        return Ok(base);
    }

    progress.phase(&format!(
        "Cloning grafana-enterprise at {}",
        opts.enterprise_ref
    ));
    let request = CloneRequest::new(&opts.enterprise_repo, &opts.enterprise_ref)
        .with_token(&opts.github_token);
    let enterprise = engine.clone_repo(cancel, &request).await?;

    progress.phase("Initializing enterprise overlay");
    engine.initialize_enterprise(cancel, &base, &enterprise).await
}
