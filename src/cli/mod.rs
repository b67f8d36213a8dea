mod render;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use tracemeter::config::{AppConfig, OutputFormat};
use tracemeter::services::{daily_metrics, normalize_generation, DataLoaderService};
use tracemeter::types::{DailyMetricsPage, MetricsQuery, RecordSet, DEFAULT_PAGE};

/// Daily token usage & cost report over exported traces
#[derive(Parser)]
#[command(name = "tracemeter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.tracemeter/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show daily usage per model, most recent day first
    Daily(DailyArgs),

    /// Validate export files and summarize their contents
    Check {
        /// Export file or glob pattern
        #[arg(long, short)]
        input: String,
    },
}

#[derive(Args, Debug)]
struct DailyArgs {
    /// Export file or glob pattern
    #[arg(long, short)]
    input: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Page number, starting at 1
    #[arg(long)]
    page: Option<u32>,

    /// Days per page
    #[arg(long)]
    limit: Option<u32>,

    /// Only generations starting at or after this RFC 3339 time
    #[arg(long)]
    from: Option<DateTime<Utc>>,

    /// Only generations starting before this RFC 3339 time
    #[arg(long)]
    to: Option<DateTime<Utc>>,

    #[arg(long)]
    trace_name: Option<String>,

    #[arg(long)]
    user_id: Option<String>,

    /// Require a trace tag (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,

    #[arg(long)]
    project: Option<String>,
}

impl DailyArgs {
    /// Flags win over config values
    fn to_query(&self, config: &AppConfig) -> MetricsQuery {
        MetricsQuery {
            page: self.page.unwrap_or(DEFAULT_PAGE),
            limit: self.limit.unwrap_or(config.query.limit),
            trace_name: self.trace_name.clone(),
            user_id: self.user_id.clone(),
            tags: self.tags.clone(),
            project_id: self
                .project
                .clone()
                .or_else(|| config.query.project_id.clone()),
            from_timestamp: self.from,
            to_timestamp: self.to,
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // stdout carries the report, logs go to stderr
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_records(input: &str) -> anyhow::Result<RecordSet> {
    DataLoaderService::new(input)
        .load()
        .with_context(|| format!("failed to load records from {}", input))
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let (config, warning) = AppConfig::load(self.config.as_deref())?;
        init_logging(&config.log_level);
        if let Some(warning) = warning {
            tracing::warn!("{}", warning);
        }

        match self.command {
            Commands::Daily(args) => run_daily(&args, &config),
            Commands::Check { input } => run_check(&input),
        }
    }
}

fn run_daily(args: &DailyArgs, config: &AppConfig) -> anyhow::Result<()> {
    let records = load_records(&args.input)?;
    let query = args.to_query(config);
    let page = daily_metrics(&records, &query)?;

    print!("{}", render_page(&page, output_format(args, config))?);
    Ok(())
}

/// `--json` wins over the configured format
fn output_format(args: &DailyArgs, config: &AppConfig) -> OutputFormat {
    if args.json {
        OutputFormat::Json
    } else {
        config.output.format
    }
}

fn render_page(page: &DailyMetricsPage, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(page)?)),
        OutputFormat::Table => Ok(render::render_table(page)),
    }
}

fn run_check(input: &str) -> anyhow::Result<()> {
    let records = load_records(input)?;
    println!("{}", check_summary(&records)?);
    Ok(())
}

/// Validate a record set and describe what the report can bucket
fn check_summary(records: &RecordSet) -> tracemeter::types::Result<String> {
    records.validate()?;

    let undated = records
        .generations
        .iter()
        .filter(|g| normalize_generation(g).is_none())
        .count();
    Ok(format!(
        "{} traces, {} generations ({} without start time)",
        records.traces.len(),
        records.generations.len(),
        undated
    ))
}
