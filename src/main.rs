//! rockout-search - Entry Point
//!
//! Runs one headless search session over a JSONL catalog and prints the
//! resulting list.

use clap::{Parser, ValueEnum};
use rockout_search::config::{self, CliOverrides};
use rockout_search::model::{AppError, Identified, TrendingHashtag, UserSummary};
use rockout_search::source::{load_catalog, MemoryDirectory, PageFetcher};
use rockout_search::state::{ControllerSettings, ListState};
use rockout_search::SearchSession;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Upper bound on how long one page may take to settle.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Record type stored in the catalog file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CatalogKind {
    /// `UserSummary` records, matched on username and display name.
    Users,
    /// `TrendingHashtag` records, matched by tag prefix.
    Hashtags,
}

/// Search a Rockout user or hashtag catalog the way the app's search screens do
#[derive(Parser, Debug)]
#[command(name = "rockout-search")]
#[command(version)]
#[command(about = "Debounced, paginated search over a JSONL catalog")]
pub struct Args {
    /// Path to JSONL catalog file
    pub catalog: PathBuf,

    /// What the catalog contains
    #[arg(short, long, value_enum, default_value_t = CatalogKind::Users)]
    pub kind: CatalogKind,

    /// Search text, fed one keystroke at a time through the debouncer
    #[arg(short, long)]
    pub query: String,

    /// Number of pages to load (must be positive)
    #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,

    /// Items per page
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Quiet period before the query is committed
    #[arg(long)]
    pub debounce_ms: Option<u64>,

    /// Simulated fetch latency
    #[arg(long, default_value = "0")]
    pub latency_ms: u64,

    /// Path to log file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            debounce_ms: self.debounce_ms,
            page_size: self.page_size,
            prefetch_distance: None,
            log_file_path: self.log_file.clone(),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        let config_file = config::load_config_with_precedence(args.config.clone())
            .map_err(AppError::from)?;
        let merged = config::merge_config(config_file);
        let with_env = config::apply_env_overrides(merged).map_err(AppError::from)?;
        config::apply_cli_overrides(with_env, args.overrides())
    };
    let settings = config.validate().map_err(AppError::from)?;

    rockout_search::logging::init(&config.log_file_path).map_err(AppError::from)?;
    info!(config = ?config, "Configuration loaded and resolved");

    let latency = Duration::from_millis(args.latency_ms);
    match args.kind {
        CatalogKind::Users => {
            let records: Vec<UserSummary> =
                load_catalog(&args.catalog).map_err(AppError::from)?;
            let fetcher: Arc<dyn PageFetcher<UserSummary>> =
                Arc::new(MemoryDirectory::users(records).with_latency(latency));
            run(settings, fetcher, &args)?;
        }
        CatalogKind::Hashtags => {
            let records: Vec<TrendingHashtag> =
                load_catalog(&args.catalog).map_err(AppError::from)?;
            let fetcher: Arc<dyn PageFetcher<TrendingHashtag>> =
                Arc::new(MemoryDirectory::hashtags(records).with_latency(latency));
            run(settings, fetcher, &args)?;
        }
    }

    Ok(())
}

/// Type the query, wait for the first page, then page forward.
fn run<T>(
    settings: ControllerSettings,
    fetcher: Arc<dyn PageFetcher<T>>,
    args: &Args,
) -> Result<(), AppError>
where
    T: Identified + Serialize + Send + 'static,
{
    let mut session = SearchSession::new(settings, fetcher).map_err(AppError::Worker)?;

    for prefix in keystrokes(&args.query) {
        session.on_query_changed(prefix);
    }
    settle(&mut session)?;

    for _ in 1..args.pages {
        if !session.load_more() {
            break;
        }
        settle(&mut session)?;
    }

    let outcome = print_results(session.state());
    session.teardown();
    outcome
}

fn settle<T>(session: &mut SearchSession<T>) -> Result<(), AppError>
where
    T: Identified + Send + 'static,
{
    if !session.wait_idle(SETTLE_TIMEOUT) {
        return Err(AppError::Timeout(SETTLE_TIMEOUT));
    }
    match session.state().last_error() {
        Some(last) => Err(AppError::Fetch(last.error.clone())),
        None => Ok(()),
    }
}

/// Every prefix of `query`, as a text field sees it while the user types.
fn keystrokes(query: &str) -> impl Iterator<Item = &str> {
    query
        .char_indices()
        .map(|(index, c)| index + c.len_utf8())
        .map(move |end| &query[..end])
}

fn print_results<T: Serialize>(state: &ListState<T>) -> Result<(), AppError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for item in state.items() {
        let line = serde_json::to_string(item).map_err(|e| AppError::Output(e.into()))?;
        writeln!(out, "{}", line).map_err(AppError::Output)?;
    }

    eprintln!(
        "{} result(s) for {:?}, has_more={}",
        state.items().len(),
        state.current_query().map(|q| q.as_str()).unwrap_or(""),
        state.has_more()
    );
    Ok(())
}
