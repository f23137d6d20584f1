//! Reel-Harvest main entry point
//!
//! This is the command-line interface for the Reel-Harvest movie harvester.

use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::{theme::ColorfulTheme, Input};
use reel_harvest::config::{load_config, validate, Config};
use reel_harvest::harvest::{build_http_client, harvest, HarvestOutcome};
use reel_harvest::logging::init_logging;
use reel_harvest::search::{fetch_genres, SearchFilter};
use reel_harvest::storage::{SqliteStorage, Storage};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use url::Url;

/// Reel-Harvest: a bounded movie catalog harvester
///
/// Reel-Harvest renders a catalog search listing, fetches the movie pages it
/// links to and stores name, year, rating, summary, directors and cast in a
/// SQLite database. A movie already stored under the same name is kept.
#[derive(Parser, Debug)]
#[command(name = "reel-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A bounded movie catalog harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Genre to restrict the search to (must be a catalog genre)
    #[arg(short, long, default_value = "")]
    genre: String,

    /// Keyword to search for
    #[arg(short, long, default_value = "")]
    keyword: String,

    /// Maximum number of movies to harvest
    #[arg(long)]
    max_results: Option<usize>,

    /// Maximum number of concurrent page fetches
    #[arg(long)]
    concurrency: Option<usize>,

    /// Never prompt for genre and keyword, even on a terminal
    #[arg(long)]
    no_prompt: bool,

    /// Print the catalog's genres and exit
    #[arg(long, conflicts_with = "stats")]
    list_genres: bool,

    /// Show what is stored in the database and exit
    #[arg(long, conflicts_with = "list_genres")]
    stats: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = resolve_config(&cli)?;

    let run_dir = init_logging(cli.verbose, cli.quiet, Path::new(&config.output.log_dir))
        .context("failed to set up logging")?;
    tracing::info!("Logging to {}", run_dir.display());

    // Handle different modes
    if cli.stats {
        handle_stats(&config)
    } else if cli.list_genres {
        handle_list_genres(&config).await
    } else {
        let interactive = !cli.no_prompt
            && cli.genre.trim().is_empty()
            && cli.keyword.trim().is_empty()
            && std::io::stdin().is_terminal();
        handle_harvest(&config, &cli.genre, &cli.keyword, interactive).await
    }
}

/// Loads the configuration file (if any) and applies command-line overrides
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(max_results) = cli.max_results {
        config.harvest.max_results = max_results;
    }
    if let Some(concurrency) = cli.concurrency {
        config.fetch.concurrency = concurrency;
    }

    validate(&config).context("invalid configuration")?;
    Ok(config)
}

/// Handles the --stats mode: shows what the database holds
fn handle_stats(config: &Config) -> Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let records = storage.list_records()?;

    println!("Stored movies: {}", storage.count_records()?);
    for stored in &records {
        let year = if stored.record.released_year.is_empty() {
            "?"
        } else {
            stored.record.released_year.as_str()
        };
        println!("  - {} ({})", stored.record.name, year);
    }

    Ok(())
}

/// Handles the --list-genres mode: prints the catalog's genres
async fn handle_list_genres(config: &Config) -> Result<()> {
    let base_url = Url::parse(&config.catalog.base_url)?;
    let client = build_http_client(&config.fetch)?;
    let genres = fetch_genres(&client, &base_url).await?;

    println!("Genres ({}):", genres.len());
    for genre in &genres {
        println!("  - {}", genre);
    }

    Ok(())
}

/// Asks for a genre (checked against `genres`) and a keyword
fn prompt_filter(genres: &[String]) -> Result<SearchFilter> {
    let theme = ColorfulTheme::default();

    println!("Available genres (case sensitive):\n\n{}\n", genres.join(", "));
    let genre: String = Input::with_theme(&theme)
        .with_prompt("Genre (leave empty for all genres)")
        .allow_empty(true)
        .validate_with(|input: &String| check_genre(input, genres))
        .interact_text()?;

    let keyword: String = Input::with_theme(&theme)
        .with_prompt("Keyword (leave empty for none)")
        .allow_empty(true)
        .interact_text()?;

    Ok(SearchFilter::new(genre, keyword, genres)?)
}

/// Accepts an empty answer or one of the catalog's genres
fn check_genre(input: &str, genres: &[String]) -> Result<(), String> {
    SearchFilter::new(input, "", genres)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

/// Handles the main harvest operation
async fn handle_harvest(
    config: &Config,
    genre: &str,
    keyword: &str,
    interactive: bool,
) -> Result<()> {
    let filter = if interactive || !genre.trim().is_empty() {
        let base_url = Url::parse(&config.catalog.base_url)?;
        let client = build_http_client(&config.fetch)?;
        let genres = fetch_genres(&client, &base_url)
            .await
            .context("failed to fetch the genre list")?;
        if interactive {
            prompt_filter(&genres)?
        } else {
            SearchFilter::new(genre, keyword, &genres)?
        }
    } else {
        SearchFilter::keyword_only(keyword)
    };

    tracing::info!(
        "Harvesting up to {} movies (genre: '{}', keyword: '{}') into {}",
        config.harvest.max_results,
        filter.category(),
        filter.keyword(),
        config.output.database_path
    );

    match harvest(config, &filter).await {
        Ok(HarvestOutcome::NoMatches) => {
            println!("No movies match the search.");
            Ok(())
        }
        Ok(HarvestOutcome::Completed(stats)) => {
            println!("Harvest complete:");
            println!("  Discovered:      {}", stats.dispatched);
            println!("  Stored:          {}", stats.stored);
            println!("  Already present: {}", stats.duplicates);
            println!("  Fetch failures:  {}", stats.fetch_failures);
            println!("  Without a name:  {}", stats.unnamed);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
