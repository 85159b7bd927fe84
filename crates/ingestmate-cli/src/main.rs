mod cmd_config;
mod cmd_diff;
mod cmd_init;
mod cmd_list;
mod cmd_metrics;
mod cmd_review;
mod cmd_rules;
mod cmd_scan;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ingestmate_core::{AgentMode, RemediationStatus};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ingestmate",
    version,
    about = "Detect and remediate data pipeline issues"
)]
struct Cli {
    /// Log level used when INGESTMATE_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize a new .ingestmate/ workspace
    Init,
    /// Run all agents over a telemetry snapshot and record new interventions
    Scan {
        /// Telemetry snapshot (JSON)
        #[arg(long)]
        telemetry: PathBuf,
        /// Agent mode (supervised or autonomous); defaults to the configured mode
        #[arg(long)]
        mode: Option<AgentMode>,
        /// Only evaluate this pipeline
        #[arg(long)]
        pipeline: Option<String>,
        /// Show what would be recorded without writing the ledger
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List recorded interventions
    List {
        /// Filter by pipeline
        #[arg(long)]
        pipeline: Option<String>,
        /// Filter by status (pending, approved, rejected, applied, failed)
        #[arg(long)]
        status: Option<RemediationStatus>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Approve a pending intervention and execute it
    Approve {
        /// Intervention ID (int_*)
        id: String,
        /// Approver; defaults to the configured principal
        #[arg(long)]
        by: Option<String>,
    },
    /// Reject a pending intervention
    Reject {
        /// Intervention ID (int_*)
        id: String,
        /// Reviewer; defaults to the configured principal
        #[arg(long)]
        by: Option<String>,
    },
    /// Record that an intervention's issue was fixed by hand
    Fix {
        /// Intervention ID (int_*)
        id: String,
        /// Operator; defaults to the configured principal
        #[arg(long)]
        by: Option<String>,
    },
    /// Show system metrics
    Metrics {
        /// Telemetry snapshot supplying pipeline and latency data
        #[arg(long)]
        telemetry: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Derive schema changes between two schema versions
    Diff {
        /// Older schema version (JSON)
        #[arg(long)]
        from: PathBuf,
        /// Newer schema version (JSON)
        #[arg(long)]
        to: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Agent rule operations (list, enable, disable)
    Rules {
        #[command(subcommand)]
        cmd: Option<cmd_rules::RulesCmd>,
    },
    /// Config operations (set, get, list)
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("INGESTMATE_LOG").unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    let repo_root = std::env::current_dir()?;

    match cli.cmd {
        Command::Init => cmd_init::execute(&repo_root),
        Command::Scan {
            telemetry,
            mode,
            pipeline,
            dry_run,
            json,
        } => cmd_scan::execute(&cmd_scan::ScanParams {
            repo_root: &repo_root,
            telemetry: &telemetry,
            mode,
            pipeline: pipeline.as_deref(),
            dry_run,
            json,
        }),
        Command::List {
            pipeline,
            status,
            json,
        } => cmd_list::execute(&repo_root, pipeline.as_deref(), status, json),
        Command::Approve { id, by } => cmd_review::approve(&repo_root, &id, by.as_deref()),
        Command::Reject { id, by } => cmd_review::reject(&repo_root, &id, by.as_deref()),
        Command::Fix { id, by } => cmd_review::fix(&repo_root, &id, by.as_deref()),
        Command::Metrics { telemetry, json } => {
            cmd_metrics::execute(&repo_root, telemetry.as_deref(), json)
        }
        Command::Diff { from, to, json } => cmd_diff::execute(&from, &to, json),
        Command::Rules { cmd } => cmd_rules::run(cmd.unwrap_or_default(), &repo_root),
        Command::Config { cmd } => cmd_config::run(cmd, &repo_root),
    }
}
