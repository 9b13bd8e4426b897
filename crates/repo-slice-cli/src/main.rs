mod commands;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use repo_slice::{FetchError, Provider, RepoReference, parse_url};
use repo_slice_forge::{HttpContentClient, provider_for};
use tracing_subscriber::EnvFilter;

use crate::commands::export::ExportRequest;
use crate::config::{AppConfig, OutputFormat};

const DEFAULT_CONCURRENCY: usize = 1;

#[derive(Parser)]
#[command(name = "repo-slice")]
#[command(about = "Browse a GitHub or GitLab repository and export selected files")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every file and directory below a repository URL
    Tree {
        /// Repository URL, optionally with /tree/<ref>/<path>
        url: String,
        /// Access token (overrides GITHUB_TOKEN / GITLAB_TOKEN)
        #[arg(long)]
        token: Option<String>,
        /// Print entries as JSON instead of an outline
        #[arg(long)]
        json: bool,
    },
    /// Fetch selected files and write them as text or an archive
    Export {
        /// Repository URL, optionally with /tree/<ref>/<path>
        url: String,
        /// File or directory to include (repeatable; default: everything)
        #[arg(long = "path")]
        paths: Vec<String>,
        /// Output format
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        /// Output file or directory (text defaults to stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Access token (overrides GITHUB_TOKEN / GITLAB_TOKEN)
        #[arg(long)]
        token: Option<String>,
        /// Maximum downloads in flight
        #[arg(long)]
        concurrency: Option<usize>,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("repo_slice={level},repo_slice_forge={level}")));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Parse `url` and build its provider with the effective token.
fn connect(
    url: &str,
    token_flag: Option<String>,
    config: &AppConfig,
) -> Result<(RepoReference, Box<dyn Provider>, Option<String>)> {
    let reference = parse_url(url)?;
    let token = config::resolve_token(token_flag, reference.provider, config, |name| {
        std::env::var(name).ok()
    });
    tracing::debug!(
        provider = %reference.provider,
        host = %reference.host,
        authenticated = token.is_some(),
        "connecting"
    );

    let provider = provider_for(&reference, &config.forge_options(token.clone()));
    Ok((reference, provider, token))
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::load_config();

    match cli.command {
        Command::Tree { url, token, json } => {
            let (reference, provider, _) = connect(&url, token, &config)?;
            commands::tree::run(provider.as_ref(), &reference.raw_suffix, json).await
        }
        Command::Export {
            url,
            paths,
            format,
            output,
            token,
            concurrency,
        } => {
            let (reference, provider, token) = connect(&url, token, &config)?;
            let request = ExportRequest {
                raw_suffix: &reference.raw_suffix,
                paths: &paths,
                format: format.or(config.export.format).unwrap_or_default(),
                output: output.as_deref(),
                token: token.as_deref(),
                concurrency: concurrency
                    .or(config.export.concurrency)
                    .unwrap_or(DEFAULT_CONCURRENCY),
            };
            let content = HttpContentClient::new();
            commands::export::run(provider.as_ref(), &content, &request)
                .await
                .with_context(|| format!("export from {url} failed"))
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            if let Some(hint) = e.downcast_ref::<FetchError>().and_then(FetchError::hint) {
                eprintln!("hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}
