//! Pueo - Main entrypoint.
//!
//! Loads configuration, initializes logging, builds an index from a
//! tab-separated input file and runs a fuzzy or prefix search against it.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};
use pueo_lib::config::{ConfigLoader, LogConfig, PueoConfig, ENV_PREFIX};
use pueo_lib::data_structures::pueo_index::{PueoIndex, SearchHit};
use pueo_lib::error::{
    report_error, set_error_reporter, ErrorContext, PueoError, PueoResult, TracingErrorReporter,
};
use pueo_lib::ingest;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command line arguments for Pueo.
#[derive(Parser, Debug)]
#[clap(name = "pueo", version, author, about)]
struct Args {
    /// Path to configuration file
    #[clap(short, long, value_parser)]
    config: Option<PathBuf>,

    /// Command to execute
    #[clap(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Find keys within an edit distance of a query
    Search {
        /// Tab-separated key/value file to index
        #[clap(short, long, value_parser)]
        input: PathBuf,

        /// Query; whitespace separates phrase terms
        query: String,

        /// Maximum edit distance (defaults to index.default_max_distance)
        #[clap(short, long)]
        distance: Option<usize>,

        /// Maximum number of results (defaults to index.default_max_results)
        #[clap(short, long)]
        limit: Option<usize>,

        /// Derive per-term budgets from term length (defaults to index.use_heuristic_fuzziness)
        #[clap(long)]
        heuristic: Option<bool>,

        /// Print results as JSON
        #[clap(long)]
        json: bool,
    },

    /// Find keys starting with something close to a prefix
    Prefix {
        /// Tab-separated key/value file to index
        #[clap(short, long, value_parser)]
        input: PathBuf,

        /// Prefix to match
        prefix: String,

        /// Maximum edit distance
        #[clap(short, long, default_value_t = 0)]
        distance: usize,

        /// Maximum number of results (defaults to index.default_max_results)
        #[clap(short, long)]
        limit: Option<usize>,

        /// Print results as JSON
        #[clap(long)]
        json: bool,
    },

    /// Validate the configuration file
    Validate,

    /// Generate a default configuration file
    GenConfig {
        /// Path to output configuration file
        #[clap(short, long, value_parser)]
        output: PathBuf,
    },
}

/// Initialize the logging system.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(log: &LogConfig) -> PueoResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&log.level))
        .map_err(|e| PueoError::Custom(format!("Invalid log filter: {e}")))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(log.source_location)
        .with_line_number(log.source_location)
        .with_thread_names(true)
        .with_writer(io::stderr);

    let result = match &log.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let writer = Mutex::new(file);
            if log.json {
                builder.json().with_writer(writer).try_init()
            } else {
                builder.with_ansi(false).with_writer(writer).try_init()
            }
        }
        None if log.json => builder.json().try_init(),
        None => builder.try_init(),
    };

    result.map_err(|e| PueoError::Custom(format!("Failed to set global tracing subscriber: {e}")))
}

/// Builds an index from `input`.
fn load_index(config: &PueoConfig, input: &Path) -> PueoResult<PueoIndex<String>> {
    let index = PueoIndex::with_config(config.index.clone());
    let report = ingest::load_file(&index, input, &config.loader)?;
    info!(
        "Indexed {} keys from {} records in {:?}",
        index.len(),
        report.records,
        input
    );
    Ok(index)
}

fn print_hits(hits: &[SearchHit<String>], json: bool) -> PueoResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if json {
        serde_json::to_writer_pretty(&mut out, hits)?;
        writeln!(out)?;
    } else {
        for hit in hits {
            writeln!(out, "{}\t{}", hit.key, hit.values.join(","))?;
        }
    }
    Ok(())
}

fn gen_config(output: &Path) -> PueoResult<()> {
    let default_config = PueoConfig::default();

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let toml = toml::to_string_pretty(&default_config)
        .map_err(|e| PueoError::Custom(format!("Failed to serialize config: {e}")))?;
    std::fs::write(output, toml)?;

    info!("Default configuration written to {:?}", output);
    Ok(())
}

fn run(args: Args) -> PueoResult<()> {
    if let Command::GenConfig { output } = &args.command {
        return gen_config(output);
    }

    let config = ConfigLoader::new(args.config.as_deref(), ENV_PREFIX).load()?;
    init_logging(&config.log)?;
    set_error_reporter(Arc::new(TracingErrorReporter::new()));

    match args.command {
        Command::Search {
            input,
            query,
            distance,
            limit,
            heuristic,
            json,
        } => {
            let index = load_index(&config, &input)?;
            let hits = index.search(
                &query,
                distance.unwrap_or(config.index.default_max_distance()),
                limit.unwrap_or(config.index.default_max_results()),
                heuristic.unwrap_or(config.index.use_heuristic_fuzziness()),
            )?;
            print_hits(&hits, json)
        }
        Command::Prefix {
            input,
            prefix,
            distance,
            limit,
            json,
        } => {
            let index = load_index(&config, &input)?;
            let hits = index.match_prefix(
                &prefix,
                distance,
                limit.unwrap_or(config.index.default_max_results()),
            )?;
            print_hits(&hits, json)
        }
        Command::Validate => {
            info!("Configuration validated successfully");
            println!("configuration ok");
            Ok(())
        }
        Command::GenConfig { output } => gen_config(&output),
    }
}

/// Main entry point for the application.
fn main() {
    let args = Args::parse();
    if let Err(error) = run(args) {
        report_error(ErrorContext::new(error, "pueo"));
        process::exit(1);
    }
}
