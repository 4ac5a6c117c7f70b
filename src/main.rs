use clap::{Parser, Subcommand};
use pathmatch_core::{Error, QueryVector};
use pathmatch_discovery::CancellationFlag;
use pathmatch_service::{MatchingService, ServiceConfig};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Success-path discovery and applicant matching
#[derive(Parser, Debug)]
#[command(name = "pathmatch")]
#[command(about = "Discover success paths and match applicants against them", long_about = None)]
struct Args {
    /// Service configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the profile document path
    #[arg(long)]
    profiles: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run discovery over the dataset and replace the profile document
    Build {
        /// Historical dataset (JSON with `feature_names` and `records`)
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
    /// Score an applicant against one category
    Match {
        category: String,
        /// Applicant features as a JSON object of name -> value
        #[arg(short, long)]
        query: PathBuf,
    },
    /// Score an applicant against many categories and rank them
    Rank {
        #[arg(short, long)]
        query: PathBuf,
        /// Restrict to these categories (defaults to all)
        #[arg(long, value_delimiter = ',')]
        categories: Option<Vec<String>>,
    },
    /// Show a category's summary and paths
    Describe { category: String },
    /// Show what is loaded
    Status,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting pathmatch v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => ServiceConfig::from_file(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(profiles) = args.profiles {
        config.profiles_path = profiles;
    }

    if let Err(e) = run(args.command, config) {
        if let Some(Error::CategoryNotFound { suggestions, .. }) = e.downcast_ref::<Error>() {
            if !suggestions.is_empty() {
                eprintln!("Known categories: {}", suggestions.join(", "));
            }
        }
        return Err(e);
    }
    Ok(())
}

fn run(command: Command, mut config: ServiceConfig) -> anyhow::Result<()> {
    match command {
        Command::Build { data } => {
            if let Some(data) = data {
                config.data_path = Some(data);
            }
            let service = MatchingService::new(config)?;
            let report = service.rebuild_from_data(&CancellationFlag::new())?;
            print_json(&report)
        }
        Command::Match { category, query } => {
            let service = MatchingService::open(config)?;
            let query = read_query(&query, service.schema(&category)?)?;
            print_json(&service.match_query(&category, &query)?)
        }
        Command::Rank { query, categories } => {
            let service = MatchingService::open(config)?;
            let query = read_query(&query, service.default_schema()?)?;
            print_json(&service.rank(&query, categories.as_deref())?)
        }
        Command::Describe { category } => {
            let service = MatchingService::open(config)?;
            print_json(&service.describe(&category)?)
        }
        Command::Status => {
            let service = MatchingService::open(config)?;
            print_json(&service.status())
        }
    }
}

fn read_query(
    path: &Path,
    schema: std::sync::Arc<pathmatch_core::FeatureSchema>,
) -> anyhow::Result<QueryVector> {
    let file = std::fs::File::open(path)?;
    let values: BTreeMap<String, f64> = serde_json::from_reader(std::io::BufReader::new(file))?;
    Ok(QueryVector::from_named(schema, values)?)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
