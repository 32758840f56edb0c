//! Shared error model and configuration for grafana-build.
//!
//! This crate is the foundation depended on by all other grafana-build
//! crates. It provides:
//! - [`GrafanaBuildError`] — the unified error type
//! - Configuration ([`AppConfig`], config loading)
//! - GitHub token resolution ([`resolve_token`])

pub mod config;
pub mod error;
pub mod token;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, GitHubConfig, ReposConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{GrafanaBuildError, Result};
pub use token::resolve_token;
