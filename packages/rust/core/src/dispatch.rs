//! Pipeline dispatch: engine connection lifecycle plus context assembly.

use futures::future::BoxFuture;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use grafana_build_engine::{Engine, EngineOpts};
use grafana_build_shared::Result;

use crate::context::{BuildContext, InvocationOptions, ProgressReporter, assemble};

/// A pipeline function: one build/test/package workflow, invoked with the
/// invocation's cancellation token, the engine connection, and the assembled
/// context.
///
/// Pipelines are explicit function values with this fixed signature so they
/// are unit-testable without going through a CLI parser; the CLI wraps plain
/// `async fn`s into this shape.
pub type PipelineFn =
    for<'a> fn(&'a CancellationToken, &'a Engine, &'a BuildContext) -> BoxFuture<'a, Result<()>>;

/// Run one pipeline function against a fresh engine connection.
///
/// This is the only place that owns the connection's lifetime: connect,
/// assemble the context, invoke the pipeline, and tear the connection down
/// when the call returns. Connection failure is terminal and never retried.
pub async fn dispatch(
    cancel: &CancellationToken,
    opts: &InvocationOptions,
    pipeline: PipelineFn,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    progress.phase("Connecting to execution engine");
    let engine = Engine::connect(
        cancel,
        &EngineOpts {
            verbose: opts.verbose,
        },
    )
    .await?;

    let mut rng = StdRng::from_entropy();
    let context = assemble(&engine, cancel, opts, &mut rng, progress).await?;

    debug!(build_id = %context.build_id, "dispatching pipeline");
    pipeline(cancel, &engine, &context).await
}
