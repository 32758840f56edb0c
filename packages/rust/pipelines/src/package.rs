//! Packaging pipeline.

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use grafana_build_core::BuildContext;
use grafana_build_engine::Engine;
use grafana_build_shared::Result;

/// Image used for the archive step.
const PACKAGE_IMAGE: &str = "alpine:3.20";

/// Package the resolved source tree into a versioned tarball under `dist/`.
#[instrument(skip_all, fields(build_id = %ctx.build_id, version = %ctx.version))]
pub async fn package(
    cancel: &CancellationToken,
    engine: &Engine,
    ctx: &BuildContext,
) -> Result<()> {
    let product = if ctx.enterprise {
        "grafana-enterprise"
    } else {
        "grafana"
    };
    let artifact = format!("{product}-{}-{}.tar.gz", ctx.version, ctx.build_id);

    info!(artifact, "packaging source tree");

    let script = format!("mkdir -p dist && tar --exclude ./dist -czf dist/{artifact} .");
    engine
        .run_step(cancel, &ctx.source, PACKAGE_IMAGE, &script)
        .await?;

    info!(artifact, "package written to dist/");
    Ok(())
}
