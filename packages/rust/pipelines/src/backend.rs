//! Backend (Go) build and test pipelines.

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use grafana_build_core::BuildContext;
use grafana_build_engine::Engine;
use grafana_build_shared::Result;

/// Image used for backend build and test steps.
const GO_IMAGE: &str = "golang:1.24-alpine";

/// Run the backend unit tests against the resolved source tree.
#[instrument(skip_all, fields(build_id = %ctx.build_id, version = %ctx.version))]
pub async fn backend_test(
    cancel: &CancellationToken,
    engine: &Engine,
    ctx: &BuildContext,
) -> Result<()> {
    info!("running backend unit tests");
    engine
        .run_step(cancel, &ctx.source, GO_IMAGE, "go test -short ./pkg/...")
        .await
}

/// Run the backend integration tests against the resolved source tree.
#[instrument(skip_all, fields(build_id = %ctx.build_id, version = %ctx.version))]
pub async fn backend_test_integration(
    cancel: &CancellationToken,
    engine: &Engine,
    ctx: &BuildContext,
) -> Result<()> {
    info!("running backend integration tests");
    engine
        .run_step(
            cancel,
            &ctx.source,
            GO_IMAGE,
            "go test -run Integration ./pkg/...",
        )
        .await
}

/// Build the backend server binary, stamping the resolved version into it.
#[instrument(skip_all, fields(build_id = %ctx.build_id, version = %ctx.version))]
pub async fn backend_build(
    cancel: &CancellationToken,
    engine: &Engine,
    ctx: &BuildContext,
) -> Result<()> {
    info!("building backend");
    let script = format!(
        "go build -ldflags \"-X main.version={}\" -o bin/grafana-server ./pkg/cmd/grafana-server",
        ctx.version
    );
    engine.run_step(cancel, &ctx.source, GO_IMAGE, &script).await?;

    info!("backend binary written to bin/grafana-server");
    Ok(())
}
