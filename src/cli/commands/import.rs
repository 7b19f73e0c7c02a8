use anyhow::Context;
use clap::{Args, Subcommand};
use serde_json::json;
use uuid::Uuid;

use crate::cli::utils::{connect, output_success, output_value};
use crate::cli::OutputFormat;
use crate::import::{self, ImportFormat, ImportKind, ImportOptions, Parsed, ValidationReport};

#[derive(Args)]
pub struct ImportArgs {
    #[arg(help = "What the file holds: donors, donations or pledges")]
    pub kind: ImportKind,
    #[arg(help = "CSV or XLSX file")]
    pub file: String,
    #[arg(long, help = "Organization that receives the records")]
    pub org: Uuid,
    #[arg(long, help = "csv or xlsx (guessed from the file name when omitted)")]
    pub format: Option<String>,
}

#[derive(Subcommand)]
pub enum ImportCommands {
    #[command(about = "Classify every row without writing anything")]
    Validate(ImportArgs),

    #[command(about = "Show what a commit would do as a row,action,detail preview")]
    Simulate(ImportArgs),

    #[command(about = "Write the valid rows; failing rows are reported and skipped")]
    Commit(ImportArgs),
}

pub async fn handle(cmd: ImportCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ImportCommands::Validate(args) => {
            let (parsed, report) = prepare(&args).await?;
            output_value(&output_format, &report, |r| print_report(&parsed, r))
        }
        ImportCommands::Simulate(args) => {
            let (_, report) = prepare(&args).await?;
            let simulation = import::simulate(&report)?;
            output_value(&output_format, &simulation, |s| {
                println!("{} to add, {} to merge, {} to skip", s.add, s.merge, s.skip);
                print!("{}", s.preview_csv);
            })
        }
        ImportCommands::Commit(args) => {
            let (_, report) = prepare(&args).await?;
            let store = connect().await?;
            let outcome = import::commit(&store, report, |done, total| {
                if done == total || done % 100 == 0 {
                    tracing::info!("Imported {}/{} rows", done, total);
                }
            })
            .await?;
            if matches!(output_format, OutputFormat::Text) {
                print!("{}", outcome.result_csv);
            }
            output_success(
                &output_format,
                &format!(
                    "{} added, {} merged, {} skipped, {} failed",
                    outcome.added, outcome.merged, outcome.skipped, outcome.failed
                ),
                Some(json!({ "outcome": outcome })),
            )
        }
    }
}

async fn prepare(args: &ImportArgs) -> anyhow::Result<(Parsed, ValidationReport)> {
    let format = match args.format.as_deref() {
        Some(raw) => ImportFormat::parse(raw)?,
        None => ImportFormat::from_path(&args.file),
    };
    let bytes = tokio::fs::read(&args.file).await.with_context(|| format!("reading {}", args.file))?;
    let parsed = import::parse(&bytes, format)?;

    let store = connect().await?;
    let report = import::validate(&store, args.kind, &parsed.rows, &ImportOptions::new(args.org)).await?;
    Ok((parsed, report))
}

fn print_report(parsed: &Parsed, report: &ValidationReport) {
    println!(
        "{} rows: {} valid, {} to merge, {} errors, {} link failures",
        report.total_rows,
        report.valid.len(),
        report.to_merge.len(),
        report.errors.len(),
        report.link_failed.len()
    );
    for warning in &parsed.warnings {
        println!("  row {}: warning: {}", warning.row, warning.message);
    }
    for issue in &report.warnings {
        println!("  row {}: warning: {}", issue.row, issue.message);
    }
    for issue in &report.errors {
        println!("  row {}: error: {}", issue.row, issue.message);
    }
    for issue in &report.link_failed {
        println!("  row {}: link failed: {}", issue.row, issue.message);
    }
}
