use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use catalog_search::config::dependencies::resolve_uri;
use catalog_search::monitor::{LoggingMonitor, DEFAULT_LOG_EVERY};
use catalog_search::sources::CsvSource;
use catalog_search::{CatalogError, Dependencies};
use catalog_search_repository::ConnectionConfig;
use catalog_search_shared::{Cancellation, PageRequest, Source};

#[derive(Parser)]
#[command(name = "catalog-search")]
#[command(about = "Index catalog sources into a search backend and query them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Connection descriptor (default: $CATALOG_SEARCH_URI)
    #[arg(long, global = true)]
    uri: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Log at debug level
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Index one or more CSV files with `id` and `label` columns
    Index {
        /// CSV files to index
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Source label for every file (default: each file's stem)
        #[arg(long)]
        label: Option<String>,

        /// Log progress every N documents
        #[arg(long, default_value_t = DEFAULT_LOG_EVERY)]
        progress_every: u64,
    },
    /// Query the index and print one page of results as JSON
    Query {
        /// Query terms, joined with spaces
        #[arg(required = true)]
        terms: Vec<String>,

        #[arg(long, default_value_t = 1)]
        page: u64,

        #[arg(long, default_value_t = 10)]
        per_page: u64,
    },
}

fn init_tracing(debug: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // A descriptor asking for debug output raises the log level too.
    let descriptor_debug = ConnectionConfig::from_uri(&resolve_uri(cli.uri.as_deref()))
        .map(|config| config.debug)
        .unwrap_or(false);
    init_tracing(cli.debug || descriptor_debug, cli.json_logs);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CatalogError> {
    let deps = Dependencies::new(cli.uri.as_deref()).await?;

    match cli.command {
        Commands::Index {
            files,
            label,
            progress_every,
        } => {
            let sources: Vec<CsvSource> = files
                .into_iter()
                .map(|path| match &label {
                    Some(label) => CsvSource::new(path).with_label(label.clone()),
                    None => CsvSource::new(path),
                })
                .collect();
            let sources: Vec<&dyn Source> = sources.iter().map(|s| s as &dyn Source).collect();

            let cancel = Cancellation::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Received interrupt, cancelling indexing");
                    on_interrupt.cancel();
                }
            });

            let monitor = Arc::new(LoggingMonitor::new(progress_every));
            let stats = deps.database.index(&sources, monitor, &cancel).await?;

            info!(
                index = %deps.database.index_name(),
                indexed = stats.num_indexed,
                failed = stats.failures(),
                "Indexing complete"
            );
        }
        Commands::Query {
            terms,
            page,
            per_page,
        } => {
            let request = PageRequest::new(page, per_page)?;
            let result = deps.database.query(&terms.join(" "), &request).await?;

            let output = serde_json::to_string_pretty(&result).map_err(std::io::Error::from)?;
            println!("{}", output);
        }
    }

    Ok(())
}
