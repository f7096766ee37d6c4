mod clean;
mod config;
mod error;
mod extract;
mod loader;
mod models;
mod pipeline;
mod report;
mod score;
mod storage;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::AppConfig;
use crate::extract::Extractor;
use crate::pipeline::Pipeline;
use crate::report::BatchReport;
use crate::storage::SupabaseStore;

#[derive(Parser)]
#[command(name = "fxbroker-etl", about = "Forex broker review data ETL", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Extract, clean and score saved review pages; write report artifacts
    Validate {
        /// Directory containing saved review HTML files
        #[arg(short, long, default_value = "data/reviews")]
        dir: PathBuf,
    },

    /// Validate, then upsert records into the destination datastore
    Load {
        /// Directory containing saved review HTML files
        #[arg(short, long, default_value = "data/reviews")]
        dir: PathBuf,
    },

    /// Extract and score a single page, printing the result as JSON
    Score {
        /// Path to one review HTML file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "fxbroker_etl=info,warn",
        1 => "fxbroker_etl=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;

    match cli.command {
        Command::Validate { dir } => {
            let _t = utils::Timer::start("Validation run");
            let pipeline = Pipeline::new(config)?;
            let outcome = pipeline.validate(&dir)?;

            if outcome.read_errors > 0 {
                info!("{} unreadable files skipped", outcome.read_errors);
            }
            print_summary(&outcome.report);
            Ok(exit_for(&outcome.report))
        }

        Command::Load { dir } => {
            let _t = utils::Timer::start("Load run");

            // Fails fast on missing credentials before touching any input.
            let store = SupabaseStore::new(&config.supabase, config.loader.upsert_key)?;

            let pipeline = Pipeline::new(config)?;
            let (outcome, stats) = pipeline.load(&dir, &store).await?;

            info!(
                "Done: {} upserted, {} failed, {} unreadable",
                stats.upserted, stats.failed, outcome.read_errors
            );
            print_summary(&outcome.report);
            Ok(exit_for(&outcome.report))
        }

        Command::Score { file } => {
            let extractor = Extractor::new()?;
            let html = loader::read_page(&file)?;
            let raw = extractor.extract(&html, &loader::source_name(&file));
            let cleaned = clean::clean(&raw);
            let result = score::score(&cleaned);

            let out = serde_json::json!({
                "record": cleaned,
                "validation": result,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_for(report: &BatchReport) -> ExitCode {
    if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_summary(report: &BatchReport) {
    let s = &report.summary;
    println!("─────────────────────────────────────");
    println!("  fxbroker-etl — Validation Summary");
    println!("─────────────────────────────────────");
    println!("  Records     : {}", s.total);
    println!("  Valid       : {}", s.valid);
    println!("  Invalid     : {}", s.invalid);
    println!("  Avg quality : {:.1}", s.average_quality);
    println!("  Avg complete: {:.1}", s.average_completeness);
    println!(
        "  Tiers       : {} excellent / {} good / {} acceptable / {} poor / {} very poor",
        s.tiers.excellent, s.tiers.good, s.tiers.acceptable, s.tiers.poor, s.tiers.very_poor
    );
    println!(
        "  Pass rate   : {}",
        utils::fmt_rate(report.validation_rate())
    );
    for rec in &s.recommendations {
        println!("  ! {}", rec);
    }
    println!("─────────────────────────────────────");
}
