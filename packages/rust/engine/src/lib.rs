//! Execution-engine client for grafana-build.
//!
//! This crate is the boundary to the container execution backend. A
//! connection probes the local container runtime, owns a scratch workspace
//! that backs every checkout made through it, and exposes the operations the
//! front end and the pipelines need: host directory handles, clones,
//! enterprise overlay initialization, manifest inspection, and single
//! containerized steps.

mod directory;
mod exec;
mod git;
mod manifest;

use std::path::Path;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use grafana_build_shared::{GrafanaBuildError, Result};

pub use directory::Directory;
pub use git::CloneRequest;

/// Container runtime binary used to execute pipeline steps.
const CONTAINER_RUNTIME: &str = "docker";

/// Script run from the enterprise checkout to overlay it onto the base tree.
/// The overlay policy itself lives in that script, not here.
const ENTERPRISE_INIT_SCRIPT: &str = "build.sh";

/// Options for establishing an engine connection.
#[derive(Debug, Clone, Default)]
pub struct EngineOpts {
    /// Stream transport-level output (git, container runtime) to stderr.
    pub verbose: bool,
}

/// A live session with the container execution backend.
///
/// The connection is exclusively owned by the invocation that created it.
/// Dropping it removes the scratch workspace and every checkout inside it.
pub struct Engine {
    workspace: TempDir,
    verbose: bool,
}

impl Engine {
    /// Establish a connection to the execution engine.
    ///
    /// Probes the container runtime and allocates the scratch workspace.
    /// Failure here is terminal for the invocation and never retried.
    pub async fn connect(cancel: &CancellationToken, opts: &EngineOpts) -> Result<Self> {
        let probe = exec::run_command(
            cancel,
            CONTAINER_RUNTIME,
            ["version", "--format", "{{.Server.Version}}"],
            None,
            false,
        )
        .await;

        match probe {
            Ok(out) => {
                debug!(
                    runtime = CONTAINER_RUNTIME,
                    version = out.stdout.trim(),
                    "execution engine available"
                );
            }
            Err(exec::RunError::Cancelled) => return Err(GrafanaBuildError::Cancelled),
            Err(e) => return Err(GrafanaBuildError::EngineConnection(e.message())),
        }

        let workspace = tempfile::Builder::new()
            .prefix("grafana-build-")
            .tempdir()
            .map_err(|e| {
                GrafanaBuildError::EngineConnection(format!(
                    "failed to create engine workspace: {e}"
                ))
            })?;

        info!(
            workspace = %workspace.path().display(),
            verbose = opts.verbose,
            "connected to execution engine"
        );

        Ok(Self {
            workspace,
            verbose: opts.verbose,
        })
    }

    /// Wrap an existing host directory as a source tree handle.
    pub fn host_directory(&self, path: &Path) -> Directory {
        Directory::new(path)
    }

    /// Clone the requested ref into the engine workspace.
    pub async fn clone_repo(
        &self,
        cancel: &CancellationToken,
        request: &CloneRequest,
    ) -> Result<Directory> {
        git::clone_into(cancel, self.workspace.path(), request, self.verbose).await
    }

    /// Overlay an enterprise checkout onto a base tree.
    ///
    /// Runs the enterprise tree's init script with the base tree path as its
    /// argument and returns the (now initialized) base tree. The merge policy
    /// is entirely the script's concern.
    pub async fn initialize_enterprise(
        &self,
        cancel: &CancellationToken,
        base: &Directory,
        enterprise: &Directory,
    ) -> Result<Directory> {
        let base_path = std::fs::canonicalize(base.path())
            .map_err(|e| GrafanaBuildError::EnterpriseInit(format!("base tree: {e}")))?;

        info!(
            base = %base_path.display(),
            enterprise = %enterprise,
            "initializing enterprise overlay"
        );

        let base_arg = base_path.to_string_lossy().into_owned();
        let result = exec::run_command(
            cancel,
            "sh",
            [ENTERPRISE_INIT_SCRIPT, base_arg.as_str()],
            Some(enterprise.path()),
            self.verbose,
        )
        .await;

        match result {
            Ok(_) => Ok(base.clone()),
            Err(exec::RunError::Cancelled) => Err(GrafanaBuildError::Cancelled),
            Err(e) => Err(GrafanaBuildError::EnterpriseInit(e.message())),
        }
    }

    /// Read the `version` field of the tree's `package.json`.
    pub async fn manifest_version(&self, dir: &Directory) -> Result<String> {
        manifest::package_json_version(dir.path()).await
    }

    /// Run one containerized step with `dir` mounted as the working tree.
    pub async fn run_step(
        &self,
        cancel: &CancellationToken,
        dir: &Directory,
        image: &str,
        script: &str,
    ) -> Result<()> {
        let mount = std::fs::canonicalize(dir.path())
            .map_err(|e| GrafanaBuildError::io(dir.path(), e))?;
        let mount_arg = format!("{}:/src", mount.display());

        debug!(image, script, tree = %dir, "running containerized step");

        let result = exec::run_command(
            cancel,
            CONTAINER_RUNTIME,
            [
                "run",
                "--rm",
                "-v",
                mount_arg.as_str(),
                "-w",
                "/src",
                image,
                "sh",
                "-c",
                script,
            ],
            None,
            self.verbose,
        )
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(exec::RunError::Cancelled) => Err(GrafanaBuildError::Cancelled),
            Err(e) => Err(GrafanaBuildError::Pipeline(e.message())),
        }
    }
}
