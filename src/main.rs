use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{error, info};

use media_spec_enricher_lib::application::run_enrich;
use media_spec_enricher_lib::infrastructure::{
    AppConfig, ConfigManager, HttpClient, TmdbClient, init_logging, init_logging_with_config,
};

#[derive(Parser)]
#[command(name = "media-spec-enricher")]
#[command(about = "Fill in technical specs for pending records of a media catalog")]
struct Cli {
    /// Catalog file (overrides CATALOG_PATH and the config file)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Enrich every pending record (default)
    Enrich,
    /// List the physical releases TMDB knows for a title, as JSON
    Releases {
        /// Title to search for
        title: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match ConfigManager::new(cli.config).load_with_env().await {
        Ok(config) => config,
        Err(e) => {
            if let Err(log_err) = init_logging() {
                eprintln!("Failed to initialize logging: {log_err:#}");
            }
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(catalog) = cli.catalog {
        config.catalog_path = Some(catalog);
    }

    if let Err(e) = init_logging_with_config(&config.logging) {
        eprintln!("Failed to initialize logging: {e:#}");
    }

    match cli.command.unwrap_or(Command::Enrich) {
        Command::Enrich => run_enrich(&config).await,
        Command::Releases { title } => match releases(&config, &title).await {
            Ok(code) => code,
            Err(e) => {
                error!("{:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn releases(config: &AppConfig, title: &str) -> Result<ExitCode> {
    let api_key = match config.require_api_key() {
        Ok(key) => key,
        Err(e) => {
            error!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let http = HttpClient::new(&config.http)?;
    let tmdb = TmdbClient::new(&http, config.sources.tmdb_api_base.clone(), api_key);

    let Some(movie) = tmdb.search_movie(title).await? else {
        info!("No TMDB match for '{}'", title);
        println!("{}", json!({ "query": title, "physical_releases": [] }));
        return Ok(ExitCode::SUCCESS);
    };

    let physical = tmdb.physical_releases(movie.id).await?;
    let output = json!({
        "query": title,
        "tmdb_id": movie.id,
        "title": movie.title,
        "release_date": movie.release_date,
        "physical_releases": physical,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(ExitCode::SUCCESS)
}
