use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use interval_report_builder::{ReportKind, ReportRunner, RunConfig};

#[derive(Parser)]
#[command(name = "weekly_review")]
#[command(about = "Build weekly review reports from service-business exports", long_about = None)]
struct Cli {
    /// Directory containing the exported CSVs (default: weekly_review_data)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory to write report CSVs into (default: weekly_outputs)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Run date in YYYY-MM-DD form; defaults to today
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// JSON run configuration (rosters, replacements, exclusions)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all four interval reports
    Run,
    /// Close-rate report only
    CloseRate,
    /// Sales report only
    Sales,
    /// Call-volume report only
    Calls,
    /// Retention (cancels and starts) report only
    Retention,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RunConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => RunConfig::new("weekly_review_data", "weekly_outputs"),
    };
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(out_dir) = cli.out_dir {
        config.out_dir = out_dir;
    }

    let as_of = cli.as_of.unwrap_or_else(|| Local::now().date_naive());
    let kinds: Vec<ReportKind> = match cli.command {
        Commands::Run => ReportKind::ALL.to_vec(),
        Commands::CloseRate => vec![ReportKind::CloseRate],
        Commands::Sales => vec![ReportKind::Sales],
        Commands::Calls => vec![ReportKind::Calls],
        Commands::Retention => vec![ReportKind::Retention],
    };

    let summary = ReportRunner::new(config)
        .run_reports(&kinds, as_of)
        .context("report run failed")?;

    println!("Reports as of {as_of}:");
    for path in &summary.files_written {
        println!("- {}", path.display());
    }
    if summary.undated_rows > 0 {
        println!(
            "Note: {} of {} rows had unparseable dates and were excluded from all windows.",
            summary.undated_rows, summary.rows_read
        );
    }

    Ok(())
}
