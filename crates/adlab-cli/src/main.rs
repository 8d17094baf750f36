//! Research harness entry point.
//!
//! Modes: `generate` runs a batch of campaigns against the service,
//! `analyze` writes the summary-statistics report, `status` prints where a
//! run stands, `all` generates then analyzes.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::info;

use adlab_dify::{DifyClient, DifyConfig};
use adlab_runner::BatchRunner;
use adlab_store::CampaignStore;

mod analyze;
mod settings;
mod status;

use settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Run a batch of campaigns.
    Generate,
    /// Write the analysis report from stored campaigns.
    Analyze,
    /// Print the current run status.
    Status,
    /// Generate, then analyze.
    All,
}

#[derive(Debug, Parser)]
#[command(name = "adlab", about = "Campaign generation and evaluation harness")]
struct Args {
    /// Operation mode.
    #[arg(long, value_enum, default_value_t = Mode::All)]
    mode: Mode,

    /// Number of campaigns to generate (default: `TOTAL_CAMPAIGNS`).
    #[arg(long)]
    campaigns: Option<u32>,

    /// Initialize the database schema and exit.
    #[arg(long, default_value_t = false)]
    init_db: bool,

    /// Database path (default: `ADLAB_DATABASE`).
    #[arg(long)]
    database: Option<PathBuf>,

    /// Where the analysis report is written.
    #[arg(long, default_value = "analysis_results/research_report.json")]
    report: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let args = Args::parse();
    let settings = Settings::from_env()?;

    // Fail fast on missing credentials before touching the database.
    if matches!(args.mode, Mode::Generate | Mode::All) && !args.init_db {
        let _ = settings.require_credentials()?;
    }

    let database = args.database.unwrap_or_else(|| settings.database.clone());
    // Opening applies migrations.
    let store = CampaignStore::open(&database)?;

    if args.init_db {
        info!(database = %database.display(), "database initialized");
        return Ok(());
    }

    if matches!(args.mode, Mode::Generate | Mode::All) {
        let credentials = settings.require_credentials()?;
        let client = DifyClient::new(DifyConfig {
            base_url: credentials.base_url,
            api_key: credentials.api_key,
            user: settings.user.clone(),
        });
        let total = args.campaigns.unwrap_or(settings.total_campaigns);
        let runner = BatchRunner::new(
            &client,
            &store,
            settings.pipeline_config(),
            settings.pacing,
        );
        let summary = runner.run(total).await?;
        println!(
            "Generated {} campaigns: {} completed, {} failed ({:.1}% success)",
            summary.total,
            summary.succeeded,
            summary.failed,
            summary.success_rate()
        );
    }

    if matches!(args.mode, Mode::Analyze | Mode::All) {
        let rows = store.extract()?;
        match analyze::build_report(&rows) {
            Some(report) => {
                analyze::write_report(&report, &args.report)?;
                analyze::print_summary(&report);
                println!("Report written to {}", args.report.display());
            }
            None => println!("No completed campaigns to analyze - generate campaigns first"),
        }
    }

    if args.mode == Mode::Status {
        status::print_status(&store)?;
    }

    Ok(())
}
