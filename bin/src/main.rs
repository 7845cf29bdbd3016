//! mirrorpull CLI - resumable Hedera mirror node downloader.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand};
use mirrorpull_lib::{
    DEFAULT_ACCOUNT, DEFAULT_BASE_URL, DEFAULT_LIMIT, FetchTarget, Step, WindowRange,
    default_data_dir,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;

#[derive(Parser)]
#[command(name = "mirrorpull")]
#[command(about = "Resumable downloader for the Hedera mirror node REST API", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level (-v, -vv, -vvv). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress progress output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a paginated resource, one file per time window
    Transactions {
        #[command(flatten)]
        api: ApiArgs,

        #[command(flatten)]
        range: RangeArgs,

        /// Resource path under the API prefix
        #[arg(long, default_value = "transactions")]
        resource: String,

        /// Extra query filter, repeatable (e.g. transactiontype=CRYPTOTRANSFER)
        #[arg(long = "filter")]
        filters: Vec<String>,

        /// Print the planned jobs as JSON lines and exit
        #[arg(long)]
        dry_run: bool,
    },

    /// Download point-in-time snapshots into one shared file
    Balances {
        #[command(flatten)]
        api: ApiArgs,

        #[command(flatten)]
        range: RangeArgs,

        /// Resource path under the API prefix
        #[arg(long, default_value = "balances")]
        resource: String,

        /// Add snapshots to an output file that already holds some.
        /// Snapshot runs do not resume, so rerunning a range duplicates it.
        #[arg(long)]
        append: bool,

        /// Print the planned jobs as JSON lines and exit
        #[arg(long)]
        dry_run: bool,
    },

    /// Flatten the records of a downloaded file to NDJSON
    Export {
        /// Downloaded .jsonl.gz file
        input: PathBuf,

        /// Output file. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Data key holding the records. Defaults to the file name prefix.
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Show page and record counts and the resume position of a file
    Inspect {
        /// Downloaded .jsonl.gz file
        input: PathBuf,

        /// Data key holding the records. Defaults to the file name prefix.
        #[arg(short, long)]
        key: Option<String>,
    },
}

/// Connection and scheduling options shared by the download commands.
#[derive(Args, Debug)]
pub(crate) struct ApiArgs {
    /// Mirror node base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub(crate) base_url: String,

    /// Account id to query
    #[arg(short, long, default_value = DEFAULT_ACCOUNT)]
    pub(crate) account: String,

    /// Page size
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    pub(crate) limit: u32,

    /// Attempts per request before the job gives up
    #[arg(long, default_value_t = 13)]
    pub(crate) max_retries: u32,

    /// Maximum concurrent jobs
    #[arg(long, default_value_t = 10)]
    pub(crate) concurrency: usize,

    /// Output directory. Defaults to the platform data directory.
    #[arg(short, long)]
    pub(crate) output_dir: Option<PathBuf>,
}

impl ApiArgs {
    pub(crate) fn template(&self, resource: &str) -> FetchTarget {
        FetchTarget::new(&self.base_url, resource)
            .with_account(&self.account)
            .with_limit(self.limit)
    }

    pub(crate) fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(default_data_dir)
    }
}

/// Time range options shared by the download commands.
#[derive(Args, Debug)]
pub(crate) struct RangeArgs {
    /// Start date (YYYY-MM-DD, UTC)
    #[arg(short, long)]
    pub(crate) start: String,

    /// End date (YYYY-MM-DD, UTC, exclusive). Defaults to today.
    #[arg(short, long)]
    pub(crate) end: Option<String>,

    /// Window size (m15, h1, h6, d1, w1)
    #[arg(long, default_value = "d1")]
    pub(crate) step: Step,
}

impl RangeArgs {
    pub(crate) fn window_range(&self) -> Result<WindowRange> {
        let start = parse_date(&self.start).context("Invalid start date")?;
        let end = match &self.end {
            Some(s) => parse_date(s).context("Invalid end date")?,
            None => chrono::Utc::now().date_naive(),
        };
        Ok(WindowRange::from_dates(start, end, self.step)?)
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("expected YYYY-MM-DD, got {s}"))
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    // Show help if no command provided
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Transactions {
            api,
            range,
            resource,
            filters,
            dry_run,
        } => {
            commands::fetch::transactions(&api, &range, &resource, filters, dry_run, cli.quiet)
                .await
        }
        Commands::Balances {
            api,
            range,
            resource,
            append,
            dry_run,
        } => commands::fetch::balances(&api, &range, &resource, append, dry_run, cli.quiet).await,
        Commands::Export { input, output, key } => {
            commands::export::export(&input, output.as_deref(), key.as_deref()).await
        }
        Commands::Inspect { input, key } => {
            commands::inspect::inspect(&input, key.as_deref()).await
        }
    }
}
