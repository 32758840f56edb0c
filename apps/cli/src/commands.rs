//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use futures::future::BoxFuture;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use grafana_build_core::{BuildContext, InvocationOptions, PipelineFn, ProgressReporter};
use grafana_build_engine::Engine;
use grafana_build_shared::{AppConfig, init_config, load_config, resolve_token};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// grafana-build — build, test, and package Grafana from a reproducible context.
#[derive(Parser)]
#[command(
    name = "grafana-build",
    version,
    about = "Resolve a Grafana source tree and run containerized build, test, and package pipelines.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Enable transport-level logging for the engine connection.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// If set, attempt to clone and initialize Grafana Enterprise.
    #[arg(long, global = true)]
    pub enterprise: bool,

    /// Ref to clone for the base repository (default: main).
    #[arg(long, global = true)]
    pub grafana_ref: Option<String>,

    /// Ref to clone for the enterprise repository (default: main).
    #[arg(long, global = true)]
    pub enterprise_ref: Option<String>,

    /// GitHub access token; falls back to the environment and the config file.
    #[arg(long, global = true)]
    pub github_token: Option<String>,

    /// Build identity override; a random one is generated when unset.
    #[arg(long, global = true)]
    pub build_id: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Grafana backend (Golang) operations.
    Backend {
        #[command(subcommand)]
        action: BackendAction,
    },

    /// Package the resolved source tree into a versioned tarball.
    Package {
        /// Local source path (defaults to .grafana).
        path: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Backend subcommands.
#[derive(Subcommand)]
pub(crate) enum BackendAction {
    /// Run the backend unit tests.
    Test {
        /// Local source path (defaults to .grafana).
        path: Option<PathBuf>,
    },

    /// Run the backend integration tests.
    TestIntegration {
        /// Local source path (defaults to .grafana).
        path: Option<PathBuf>,
    },

    /// Build the backend server binary.
    Build {
        /// Version to stamp into the build; read from package.json when unset.
        #[arg(long)]
        version: Option<String>,

        /// Local source path (defaults to .grafana).
        path: Option<PathBuf>,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = if cli.verbose { "debug" } else { "info" };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline bindings
// ---------------------------------------------------------------------------

// Named adapters give each pipeline the dispatcher's fixed fn signature.

fn backend_test_pipeline<'a>(
    cancel: &'a CancellationToken,
    engine: &'a Engine,
    ctx: &'a BuildContext,
) -> BoxFuture<'a, grafana_build_shared::Result<()>> {
    Box::pin(grafana_build_pipelines::backend_test(cancel, engine, ctx))
}

fn backend_test_integration_pipeline<'a>(
    cancel: &'a CancellationToken,
    engine: &'a Engine,
    ctx: &'a BuildContext,
) -> BoxFuture<'a, grafana_build_shared::Result<()>> {
    Box::pin(grafana_build_pipelines::backend_test_integration(
        cancel, engine, ctx,
    ))
}

fn backend_build_pipeline<'a>(
    cancel: &'a CancellationToken,
    engine: &'a Engine,
    ctx: &'a BuildContext,
) -> BoxFuture<'a, grafana_build_shared::Result<()>> {
    Box::pin(grafana_build_pipelines::backend_build(cancel, engine, ctx))
}

fn package_pipeline<'a>(
    cancel: &'a CancellationToken,
    engine: &'a Engine,
    ctx: &'a BuildContext,
) -> BoxFuture<'a, grafana_build_shared::Result<()>> {
    Box::pin(grafana_build_pipelines::package(cancel, engine, ctx))
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::Backend { action } => match action {
            BackendAction::Test { path } => {
                run_pipeline(&cli, path.clone(), None, backend_test_pipeline).await
            }
            BackendAction::TestIntegration { path } => {
                run_pipeline(&cli, path.clone(), None, backend_test_integration_pipeline).await
            }
            BackendAction::Build { version, path } => {
                run_pipeline(&cli, path.clone(), version.clone(), backend_build_pipeline).await
            }
        },
        Command::Package { path } => {
            run_pipeline(&cli, path.clone(), None, package_pipeline).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

/// Gate on the token, assemble options, and dispatch one pipeline.
async fn run_pipeline(
    cli: &Cli,
    path: Option<PathBuf>,
    version: Option<String>,
    pipeline: PipelineFn,
) -> Result<()> {
    let config = load_config()?;

    // The token gate runs before any other work; a missing credential
    // aborts the invocation here, before the engine connection is opened.
    let token = resolve_token(cli.github_token.as_deref(), &config)?;

    let opts = invocation_options(cli, &config, path, version, token);

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling invocation");
            signal_cancel.cancel();
        }
    });

    let progress = CliProgress::new();
    let result = grafana_build_core::dispatch(&cancel, &opts, pipeline, &progress).await;
    progress.finish();

    Ok(result?)
}

/// Merge CLI flags over config-file values over defaults.
fn invocation_options(
    cli: &Cli,
    config: &AppConfig,
    path: Option<PathBuf>,
    version: Option<String>,
    token: String,
) -> InvocationOptions {
    InvocationOptions {
        verbose: cli.verbose,
        enterprise: cli.enterprise,
        grafana_ref: cli
            .grafana_ref
            .clone()
            .unwrap_or_else(|| config.defaults.grafana_ref.clone()),
        enterprise_ref: cli
            .enterprise_ref
            .clone()
            .unwrap_or_else(|| config.defaults.enterprise_ref.clone()),
        grafana_repo: config.repos.grafana.clone(),
        enterprise_repo: config.repos.enterprise.clone(),
        source_path: path.unwrap_or_else(|| PathBuf::from(&config.defaults.source_path)),
        github_token: token,
        build_id: cli.build_id.clone(),
        version,
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }
}

// ---------------------------------------------------------------------------
// Config command handlers
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
