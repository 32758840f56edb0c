//! Build-context assembly and pipeline dispatch for grafana-build.
//!
//! This crate ties together source resolution, version resolution, and
//! build-identity generation into one immutable [`BuildContext`] per
//! invocation, and dispatches it to a selected pipeline function.

pub mod build_id;
pub mod context;
pub mod dispatch;
pub mod source;
pub mod version;

// Re-export public API at crate root for ergonomic imports.
pub use build_id::{BUILD_ID_LEN, generate_build_id, resolve_build_id};
pub use context::{BuildContext, InvocationOptions, ProgressReporter, SilentProgress, assemble};
pub use dispatch::{PipelineFn, dispatch};
pub use source::{SourceEngine, resolve_source};
pub use version::{VersionSource, resolve_version};
