//! pacegrade CLI
//!
//! Local entry point: look up an athlete on a results platform, run the
//! cache/analyze pipeline and print the comparison.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use pacegrade::{
    cache::CacheOrchestrator,
    config::AppConfig,
    convert::{seconds_to_time_string, validate_identifier},
    error::Result,
    fetch::Fetcher,
    models::Platform,
    storage::LocalProfileStore,
};

/// pacegrade - race result analyzer
#[derive(Parser, Debug)]
#[command(
    name = "pacegrade",
    version,
    about = "Fetches race histories and derives age-graded comparisons"
)]
struct Cli {
    /// Path to cache directory containing config.toml
    #[arg(short, long, default_value = "cache")]
    cache_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze an athlete's results
    Analyze {
        /// Results platform: parkrun, powerof10 or athlinks
        #[arg(value_parser = parse_platform)]
        platform: Platform,

        /// Athlete identifier on that platform
        athlete_id: String,

        /// Refresh even if a fresh cached record exists
        #[arg(long)]
        force: bool,

        /// Print the raw analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration file
    Validate,
}

fn parse_platform(s: &str) -> std::result::Result<Platform, String> {
    match s.to_ascii_lowercase().as_str() {
        "parkrun" => Ok(Platform::Parkrun),
        "powerof10" | "po10" => Ok(Platform::PowerOf10),
        "athlinks" => Ok(Platform::Athlinks),
        other => Err(format!(
            "unknown platform '{other}' (expected parkrun, powerof10 or athlinks)"
        )),
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.cache_dir.join("config.toml");
    let config = AppConfig::load_or_default(&config_path);
    config.validate()?;

    match cli.command {
        Command::Analyze {
            platform,
            athlete_id,
            force,
            json,
        } => {
            let athlete = validate_identifier(&athlete_id, platform)?;
            let store = Arc::new(LocalProfileStore::new(&cli.cache_dir));
            let fetcher = Fetcher::new(&config.fetcher)?;
            let orchestrator = CacheOrchestrator::new(store, fetcher, &config.cache);

            let analysis = orchestrator.analyze(&athlete, force).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&analysis.profile)?);
                println!("{}", serde_json::to_string_pretty(&analysis.bundle)?);
                return Ok(());
            }

            let name = analysis.profile.name.as_deref().unwrap_or("(unknown)");
            println!("Athlete:  {name} ({athlete})");
            if let Some(club) = &analysis.profile.club {
                println!("Club:     {club}");
            }
            println!("Results:  {}", analysis.profile.results.len());
            if analysis.profile.dropped_rows > 0 {
                println!("Skipped:  {} unparsable rows", analysis.profile.dropped_rows);
            }
            if let Some(latest) = analysis.profile.results.first() {
                println!(
                    "Latest:   {} {} on {} in {}",
                    latest.event,
                    latest.distance,
                    latest.date,
                    latest.time_string()
                );
            }

            if let Some(stats) = &analysis.bundle.stats {
                println!("Best:     {}", seconds_to_time_string(stats.best_seconds.into())?);
                println!(
                    "Typical:  {}",
                    seconds_to_time_string(stats.typical_mean_seconds.into())?
                );
            }
            if let Some(pct) = analysis.bundle.percentile {
                println!("Faster than {pct:.1}% of runners over this distance");
            }
            match (analysis.bundle.age_grade, analysis.bundle.grade_category) {
                (Some(grade), Some(category)) => {
                    println!("Age grade: {grade:.1}% ({})", category.description());
                }
                (Some(grade), None) => println!("Age grade: {grade:.1}%"),
                _ => println!("Age grade: ungraded"),
            }
            println!("Trend:    {}", analysis.bundle.trend);

            if let Some(warning) = &analysis.warning {
                println!("Warning:  {warning}");
            }
        }
        Command::Validate => {
            println!("Configuration at {} is valid", config_path.display());
        }
    }

    Ok(())
}
