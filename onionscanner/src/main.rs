use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use crawler::{CrawlError, Crawler, ReportArchive, RunSummary};
use probe::{OnionScan, ProbeOptions};
use results_sqlite::{Db, ExportFormat, Store};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tor_control::TorControl;
use tracing_subscriber::EnvFilter;

mod config;

const DEFAULT_FRONTIER_DB: &str = "onion_list.db";
const DEFAULT_RESULTS_DB: &str = "OnionScanner.db";
const DEFAULT_ONION_LIST: &str = "onion_dir_list.txt";

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ExportArg { Csv, Jsonl }

#[derive(Debug, Subcommand)]
enum FrontierCmd {
    /// Print every known onion, one per line
    List,
    /// Print the number of known onions
    Count,
}

#[derive(Debug, Subcommand)]
enum ResultsCmd {
    /// Print the stored scan record for one onion (JSON)
    Show { onion: String },
    /// Print the run ledger, oldest first (one JSON object per line)
    Runs,
    /// Write all scan records to a file
    Export {
        #[arg(long)]
        out: PathBuf,
        #[arg(long, value_enum, default_value_t = ExportArg::Jsonl)]
        format: ExportArg,
    },
}

#[derive(Debug, Parser)]
#[command(name = "onionscanner", version, about = "Recursive onion service scanner")]
struct Cli {
    /// Optional config file (YAML). If omitted, loads ./onionscanner.yaml if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Frontier database (known onions)
    #[arg(long, global = true)]
    frontier_db: Option<PathBuf>,
    /// Results database (one row per scanned onion)
    #[arg(long, global = true)]
    results_db: Option<PathBuf>,
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print version information
    Version,
    /// Scan every onion in the frontier once, growing it from what each scan links to
    Crawl {
        /// Probe executable (default: onionscan on PATH)
        #[arg(long)]
        probe: Option<PathBuf>,
        /// Hard deadline per onion in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Directory for raw JSON reports
        #[arg(long)]
        results_dir: Option<PathBuf>,
        /// Tor control port address
        #[arg(long)]
        control: Option<String>,
        /// Tor control password
        #[arg(long, env = "TOR_CONTROL_PASSWORD", hide_env_values = true)]
        control_password: Option<String>,
    },
    /// Add onions to the frontier
    Seed {
        #[arg(required = true)]
        onions: Vec<String>,
    },
    /// Import a newline-delimited onion list into the frontier
    Migrate {
        #[arg(default_value = DEFAULT_ONION_LIST)]
        file: PathBuf,
    },
    /// Inspect the frontier
    Frontier {
        #[command(subcommand)]
        cmd: FrontierCmd,
    },
    /// Inspect or export scan results
    Results {
        #[command(subcommand)]
        cmd: ResultsCmd,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

/// Insert each address as given minus surrounding whitespace; one JSON line per address.
fn seed(db: &Db, onions: &[String]) -> Result<Vec<serde_json::Value>> {
    let mut out = Vec::with_capacity(onions.len());
    for onion in onions {
        let onion = onion.trim();
        let outcome = db.insert_onion(onion)?;
        out.push(serde_json::json!({ "onion": onion, "outcome": outcome }));
    }
    Ok(out)
}

/// Summary line for a finished crawl. An empty frontier is not an error: it
/// yields `None` so the caller can print a hint and exit cleanly.
fn crawl_report(outcome: Result<RunSummary, CrawlError>, elapsed: Duration) -> Result<Option<serde_json::Value>> {
    match outcome {
        Ok(s) => Ok(Some(serde_json::json!({
            "total": s.total,
            "completed": s.completed,
            "skipped": s.skipped,
            "timeouts": s.timeouts,
            "empty_outputs": s.empty_outputs,
            "unparsable": s.unparsable,
            "discovered": s.discovered,
            "duration_ms": elapsed.as_millis() as u64,
        }))),
        Err(CrawlError::EmptyFrontier) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let cfg = config::load_config(cli.config.as_deref())?;
    let storage = cfg.storage();
    let frontier_path = cli.frontier_db.clone()
        .or(storage.frontier_db.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FRONTIER_DB));
    let results_path = cli.results_db.clone()
        .or(storage.results_db.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_DB));

    match cli.command {
        Commands::Version => {
            println!("onionscanner {} (core {})", env!("CARGO_PKG_VERSION"), crawler_core::version());
        }
        Commands::Seed { onions } => {
            let db = Db::open_or_create(&frontier_path, Store::Frontier)?;
            for line in seed(&db, &onions)? {
                println!("{}", line);
            }
        }
        Commands::Migrate { file } => {
            let fh = std::fs::File::open(&file).map_err(|e| anyhow!("failed to open {}: {}", file.display(), e))?;
            let mut db = Db::open_or_create(&frontier_path, Store::Frontier)?;
            let summary = db.import_onions(std::io::BufReader::new(fh))?;
            tracing::info!(stored = summary.stored, duplicates = summary.duplicates, rejected = summary.rejected, "migration completed");
            println!("{}", serde_json::to_string(&summary)?);
        }
        Commands::Frontier { cmd } => {
            let db = Db::open_or_create(&frontier_path, Store::Frontier)?;
            match cmd {
                FrontierCmd::List => {
                    for onion in db.all_onions()? { println!("{}", onion); }
                }
                FrontierCmd::Count => println!("{}", db.onion_count()?),
            }
        }
        Commands::Results { cmd } => {
            let db = Db::open_or_create(&results_path, Store::Results)?;
            match cmd {
                ResultsCmd::Show { onion } => match db.get_result(&onion)? {
                    Some(rec) => println!("{}", serde_json::to_string_pretty(&rec)?),
                    None => return Err(anyhow!("no scan result for {}", onion)),
                },
                ResultsCmd::Runs => {
                    for run in db.runs()? { println!("{}", serde_json::to_string(&run)?); }
                }
                ResultsCmd::Export { out, format } => {
                    let format = match format { ExportArg::Csv => ExportFormat::Csv, ExportArg::Jsonl => ExportFormat::Jsonl };
                    let n = db.export_results(std::fs::File::create(&out)?, format)?;
                    tracing::info!(rows = n, out = %out.display(), "exported scan results");
                }
            }
        }
        Commands::Crawl { probe, timeout_secs, results_dir, control, control_password } => {
            let crawl = cfg.crawl();
            let tor = cfg.tor();
            let mut opts = ProbeOptions::default();
            if let Some(p) = probe.or(crawl.probe.map(PathBuf::from)) { opts.program = p; }
            if let Some(args) = crawl.probe_args { opts.args = args; }
            if let Some(secs) = timeout_secs.or(crawl.timeout_secs) { opts.deadline = Duration::from_secs(secs.max(1)); }
            let archive = match results_dir.or(crawl.results_dir.map(PathBuf::from)) {
                Some(dir) => ReportArchive::new(dir),
                None => ReportArchive::default(),
            };
            let control_addr = control.or(tor.control).unwrap_or_else(|| tor_control::DEFAULT_CONTROL_ADDR.to_string());
            let password = control_password.or(tor.control_password).unwrap_or_default();
            let mut tor_control = TorControl::new(control_addr.clone(), password);
            if let Some(secs) = tor.timeout_secs { tor_control = tor_control.with_io_timeout(Duration::from_secs(secs.max(1))); }
            tracing::info!(dir = %archive.dir().display(), control = %control_addr, "starting crawl");

            let crawler = Crawler::new(
                Db::open_or_create(&frontier_path, Store::Frontier)?,
                Db::open_or_create(&results_path, Store::Results)?,
                archive,
                OnionScan::new(opts),
                Arc::new(tor_control),
            );
            let rt = tokio::runtime::Runtime::new()?;
            let started = Instant::now();
            let outcome = rt.block_on(crawler.run());
            let result: Result<()> = match crawl_report(outcome, started.elapsed()) {
                Ok(Some(obj)) => {
                    println!("{}", obj);
                    Ok(())
                }
                Ok(None) => {
                    eprintln!("no onions to scan: run `onionscanner migrate` or `onionscanner seed` first");
                    Ok(())
                }
                Err(e) => Err(e),
            };
            crawler.close()?;
            result?;
        }
    }
    Ok(())
}
