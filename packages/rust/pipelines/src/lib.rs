//! Pipeline functions for grafana-build.
//!
//! Each function is one containerized workflow with the fixed
//! `(cancellation token, engine connection, build context)` signature the
//! dispatcher expects. The build context arrives fully resolved; nothing
//! here re-derives sources, versions, or identities.

mod backend;
mod package;

pub use backend::{backend_build, backend_test, backend_test_integration};
pub use package::package;
