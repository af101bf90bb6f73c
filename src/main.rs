use anyhow::Context;
use clap::{arg, value_parser, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prometheus_query::{FetchReport, Fetcher, ModuleResponse, Settings, SettingsError};

const APP_NAME: &str = env!("CARGO_PKG_NAME");
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

fn cli() -> clap::Command {
    Command::new(APP_NAME)
        .version(APP_VERSION)
        .author("Greg Hewett <glh@strand3.com>")
        .about("Fetches the latest metric values from Prometheus")
        .arg(
            arg!(args: [ARGS_FILE])
                .value_parser(value_parser!(PathBuf))
                .help("JSON arguments file from the host runtime, or a .toml settings file"),
        )
        .arg(arg!(--"prometheus-url" <URL>).help("Base URL of the Prometheus server"))
        .arg(
            arg!(-q --query <QUERY>)
                .action(ArgAction::Append)
                .help("PromQL expression to evaluate, may be repeated"),
        )
        .arg(
            arg!(--timeout <SECONDS>)
                .value_parser(value_parser!(u64))
                .help("Request timeout in seconds"),
        )
}

/// Merges the arguments file with command-line flags. Flags win.
fn resolve_settings(matches: &ArgMatches) -> anyhow::Result<Settings> {
    let url = matches.get_one::<String>("prometheus-url");
    let queries: Option<Vec<String>> = matches
        .get_many::<String>("query")
        .map(|queries| queries.cloned().collect());

    let mut settings = match matches.get_one::<PathBuf>("args") {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load module arguments from {}", path.display()))?,
        None => {
            let mut missing = Vec::new();
            if url.is_none() {
                missing.push("prometheus_url");
            }
            if queries.is_none() {
                missing.push("queries");
            }
            if !missing.is_empty() {
                return Err(SettingsError::Missing(missing).into());
            }
            Settings::default()
        }
    };

    if let Some(url) = url {
        settings.prometheus_url = url.clone();
    }
    if let Some(queries) = queries {
        settings.queries = queries;
    }
    if let Some(timeout) = matches.get_one::<u64>("timeout") {
        settings.timeout = Some(*timeout);
    }

    settings.validate()?;
    Ok(settings)
}

async fn run(matches: &ArgMatches) -> anyhow::Result<FetchReport> {
    let settings = resolve_settings(matches)?;
    let fetcher = Fetcher::from_settings(&settings)?;
    Ok(fetcher.fetch_all().await?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // stdout is reserved for the response document.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let matches = cli().get_matches();

    let response = match run(&matches).await {
        Ok(report) => {
            info!("Fetched {} metrics", report.metrics_data.len());
            ModuleResponse::success(report)
        }
        Err(e) => {
            error!("{e:#}");
            ModuleResponse::failure(format!("{e:#}"))
        }
    };

    if let Err(e) = response.write_to(std::io::stdout().lock()) {
        error!("failed to write module response: {e}");
        return ExitCode::FAILURE;
    }

    if response.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
