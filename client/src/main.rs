//! jobdeck - Entry Point
//!
//! Terminal dashboard for the job-processing service. Without a command it
//! watches the job list; commands submit work, cancel a job or tail its log.

use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::process::ExitCode;

use jobdeck::app::commands;
use jobdeck::app::options::AppOptions;
use jobdeck::app::run::{tail_job, watch_jobs};
use jobdeck::app::settings::Settings;
use jobdeck::errors::ClientError;
use jobdeck::logs::{init_logging, LogOptions};
use jobdeck::utils::version_info;
use job_api::ArtistDownloadRequest;

use anyhow::Context;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(version) => println!("{}", version),
            Err(e) => eprintln!("Failed to render version info: {e}"),
        }
        return ExitCode::SUCCESS;
    }

    // Retrieve the settings file
    let mut settings = match cli_args.get("config") {
        Some(path) => match Settings::load(Path::new(path)).await {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Unable to read settings file {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };
    if let Some(api) = cli_args.get("api") {
        settings.backend.base_url = api.clone();
    }

    // Initialize logging
    let _log_guard = match init_logging(LogOptions::from(&settings)) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    let options = AppOptions::from(&settings);
    info!("Running jobdeck with options: {:?}", options);

    match dispatch(&cli_args, options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn parse_limit(cli_args: &HashMap<String, String>, key: &str) -> Result<Option<u32>, ClientError> {
    cli_args
        .get(key)
        .map(|value| {
            value
                .parse::<u32>()
                .map_err(|_| ClientError::ConfigError(format!("--{} expects a number", key)))
        })
        .transpose()
}

async fn dispatch(cli_args: &HashMap<String, String>, options: AppOptions) -> anyhow::Result<()> {
    if let Some(query) = cli_args.get("search") {
        let song_limit = parse_limit(cli_args, "song-limit")?;
        commands::search(&options, query, song_limit)
            .await
            .context("Search download was not queued")?;
        return Ok(());
    }

    if cli_args.contains_key("artist-url") || cli_args.contains_key("artist-name") {
        let request = ArtistDownloadRequest {
            artist_url: cli_args.get("artist-url").cloned(),
            artist_name: cli_args.get("artist-name").cloned(),
            limit: parse_limit(cli_args, "limit")?,
            song_limit: parse_limit(cli_args, "song-limit")?,
            max_album_length: parse_limit(cli_args, "max-album-length")?,
        };
        commands::artist(&options, &request)
            .await
            .context("Artist download was not queued")?;
        return Ok(());
    }

    if cli_args.contains_key("scan") {
        commands::scan(&options)
            .await
            .context("Library scan was not queued")?;
        return Ok(());
    }

    if let Some(path) = cli_args.get("files") {
        // A bare `--files` lists the library root
        let path = if path == "true" { "" } else { path.as_str() };
        return commands::files(&options, path)
            .await
            .with_context(|| format!("Failed to list library path '{}'", path));
    }

    if let Some(job_id) = cli_args.get("cancel") {
        return commands::cancel(options, job_id)
            .await
            .with_context(|| format!("Failed to cancel job {}", job_id));
    }

    if let Some(job_id) = cli_args.get("tail") {
        let indicator = tail_job(options, job_id, await_shutdown_signal())
            .await
            .with_context(|| format!("Failed to tail job {}", job_id))?;
        info!("Log view closed ({})", indicator);
        return Ok(());
    }

    watch_jobs(options, await_shutdown_signal())
        .await
        .context("Job watch stopped")
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {
                        info!("SIGTERM received, shutting down...");
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("Ctrl+C received, shutting down...");
                    }
                }
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Ctrl+C received, shutting down...");
    }
}
