mod commands;
mod config;
mod secrets;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use doclib_ntlm::{NtlmClientConfig, NtlmRemote};
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, Overrides};

#[derive(Parser)]
#[command(name = "doclib-fetcher")]
#[command(about = "Download filtered documents from an NTLM-protected document library")]
struct Cli {
    /// Config file (defaults to ~/.config/doclib-fetcher/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct FilterArgs {
    /// Only documents in this category (exact match)
    #[arg(long)]
    category: Option<String>,
    /// Only documents with this file extension (e.g. xlsx)
    #[arg(long)]
    extension: Option<String>,
    /// Process at most this many matching documents
    #[arg(long)]
    max_files: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// List documents matching the filters
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Download documents matching the filters, skipping existing files
    Download {
        #[command(flatten)]
        filter: FilterArgs,
        /// Destination directory
        #[arg(long)]
        dest: Option<PathBuf>,
        /// Re-download files that already exist locally
        #[arg(long, overrides_with = "no_overwrite")]
        overwrite: bool,
        /// Skip files that already exist, even if the config enables overwrite
        #[arg(long, overrides_with = "overwrite")]
        no_overwrite: bool,
        /// Exit with an error if any file fails to download
        #[arg(long)]
        strict: bool,
    },
    /// Print the default config file location
    ConfigPath,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_remote(config: &AppConfig) -> Result<NtlmRemote> {
    let mut client_config = NtlmClientConfig {
        timeout: config.timeout(),
        ..Default::default()
    };
    if let Some(workstation) = &config.workstation {
        client_config.workstation = workstation.clone();
    }

    NtlmRemote::new(client_config).context("failed to build HTTP client")
}

/// `--overwrite` / `--no-overwrite`, or neither to keep the config value.
fn overwrite_flag(overwrite: bool, no_overwrite: bool) -> Option<bool> {
    match (overwrite, no_overwrite) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn load(path: Option<&std::path::Path>, overrides: Overrides) -> Result<AppConfig> {
    let mut config = config::load_config(path)?;
    config.apply(overrides);
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::ConfigPath => {
            let path = config::config_path().context("could not determine config directory")?;
            println!("{}", path.display());
            Ok(())
        }
        Command::List { filter } => {
            let config = load(
                cli.config.as_deref(),
                Overrides {
                    category: filter.category,
                    extension: filter.extension,
                    max_files: filter.max_files,
                    ..Default::default()
                },
            )?;
            let remote = build_remote(&config)?;
            let credential = secrets::resolve(&config.credential, "listing").await?;
            commands::list::run(&remote, &config, &credential).await
        }
        Command::Download {
            filter,
            dest,
            overwrite,
            no_overwrite,
            strict,
        } => {
            let config = load(
                cli.config.as_deref(),
                Overrides {
                    destination_dir: dest,
                    overwrite: overwrite_flag(overwrite, no_overwrite),
                    category: filter.category,
                    extension: filter.extension,
                    max_files: filter.max_files,
                },
            )?;
            let remote = build_remote(&config)?;
            let (listing_credential, download_credential) =
                secrets::resolve_credentials(&config).await?;

            let summary = commands::download::run(
                &remote,
                &config,
                &listing_credential,
                &download_credential,
            )
            .await?;

            let failed = summary.failed();
            if strict && failed > 0 {
                anyhow::bail!("{failed} file(s) failed to download");
            }
            Ok(())
        }
    }
}
