mod nearby;

use clap::{Args, Parser, Subcommand};
use fastfoodz_core::{AppConfig, ConfigError};
use tracing_subscriber::EnvFilter;

const USAGE_HINT: &str = "fastfoodz: try `fastfoodz nearby --lat <LAT> --lon <LON>`";

#[derive(Debug, Parser)]
#[command(name = "fastfoodz")]
#[command(about = "Find fast food near a coordinate")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search for places around a coordinate and print map and list views
    Nearby(NearbyArgs),
    /// Print the resolved configuration (secrets redacted)
    Config,
}

#[derive(Debug, Args)]
struct NearbyArgs {
    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,

    /// Comma-separated categories (defaults to `FASTFOODZ_SEARCH_CATEGORIES`)
    #[arg(long)]
    categories: Option<String>,

    /// Print places as JSON instead of text rows
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(config) = config_for(cli.command.as_ref(), fastfoodz_core::load_app_config)? else {
        println!("{USAGE_HINT}");
        return Ok(());
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Nearby(args)) => print!("{}", nearby::run(&config, args).await?),
        Some(Commands::Config) => println!("{config:#?}"),
        None => println!("{USAGE_HINT}"),
    }

    Ok(())
}

/// Loads configuration only when a subcommand needs it; the bare usage hint
/// works without `YELP_API_KEY`.
fn config_for<F>(command: Option<&Commands>, load: F) -> Result<Option<AppConfig>, ConfigError>
where
    F: FnOnce() -> Result<AppConfig, ConfigError>,
{
    match command {
        None => Ok(None),
        Some(_) => load().map(Some),
    }
}
