//! Serves a single asset-pack request from the command line.
//!
//! Request properties are passed as flags; service settings are read from
//! `ASSET_PACK_*` environment variables parsed by
//! [`OrthoConfig`](https://github.com/leynos/ortho-config). The response
//! document is written to stdout as JSON and the process exits with its
//! status code. Diagnostics go to stderr, filtered by `RUST_LOG`.

use std::io::{self, Write};
use std::process::ExitCode;

use asset_pack_cache::RequestContext;
use clap::Parser;
use color_eyre::eyre::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Filter applied when `RUST_LOG` is unset or invalid.
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Parser)]
#[command(
    name = "asset_pack",
    version,
    about = "Resolve versioned asset packs to cached zip archives"
)]
struct Cli {
    /// Application identifier, naming a directory under the packs root.
    #[arg(long)]
    app_id: Option<String>,
    /// Release the client runs.
    #[arg(long)]
    app_version: Option<String>,
    /// JSON array of pack identifiers, e.g. `["world-sand"]`.
    #[arg(long)]
    asset_pack_ids: Option<String>,
    /// JSON object selecting subdirectories, e.g. `{"tiles":["dxt"]}`.
    #[arg(long)]
    select_subdirs: Option<String>,
}

impl From<Cli> for RequestContext {
    fn from(cli: Cli) -> Self {
        Self {
            app_id: cli.app_id,
            app_version: cli.app_version,
            asset_pack_ids: cli.asset_pack_ids,
            select_subdirs: cli.select_subdirs,
        }
    }
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();
    let response = asset_pack_cache::run(&RequestContext::from(cli))
        .wrap_err("failed to load configuration via OrthoConfig")?;

    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, &response).wrap_err("failed to write response")?;
    writeln!(stdout).wrap_err("failed to write response")?;
    Ok(ExitCode::from(response.status_code.code()))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
