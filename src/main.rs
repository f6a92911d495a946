// src/main.rs
mod config;
mod extraction;
mod pdf;
mod schedule;
mod storage;
mod utils;

use clap::{Parser, Subcommand};
use config::RunConfig;
use extraction::client::OpenAiExtractor;
use schedule::{assembler, segmenter, DocumentResult};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use utils::AppError;

/// Extracts Schedule of Investments tables from mutual-fund PDF reports
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract every schedule in the configured document
    Run {
        /// Config file with DOC, DOC_HEADER, DOC_FOOTER, DOC_COLCOUNT, ...
        config: PathBuf,

        /// Write JSON here instead of printing it
        output: Option<PathBuf>,

        /// Maximum extraction requests in flight
        #[arg(long, default_value_t = extraction::DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },

    /// Show the header, column and footer regions of one page
    Inspect {
        /// Config file with DOC, DOC_HEADER, DOC_FOOTER, DOC_COLCOUNT, ...
        config: PathBuf,

        /// 0-based page index
        #[arg(short, long, default_value_t = 0)]
        page: usize,

        /// Also save the region dump to this file
        #[arg(long)]
        dump: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::debug!("Starting with args: {:?}", args);

    let outcome = match args.command {
        Command::Run { config, output, concurrency } => run(config, output, concurrency).await,
        Command::Inspect { config, page, dump } => inspect(config, page, dump),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::Config(e)) => {
            eprintln!("Error: {}\n{}\nSee `--help` for usage.", e, e.hint());
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config_path: PathBuf, output: Option<PathBuf>, concurrency: usize) -> Result<(), AppError> {
    let config = RunConfig::load(&config_path)?;
    let api_key = config::api_key_from_env()?;

    let pages = pdf::loader::load_document(&config.document)?;
    let relevant = segmenter::segment(&pages, &config.segmentation)?;
    if relevant.is_empty() {
        tracing::warn!(
            "No pages matched '{}'; check DOC_HEADER and INVESTMENT_PAGE_TARGET",
            config.segmentation.schedule_marker
        );
    }

    let extractor = OpenAiExtractor::new(api_key, config.model.clone(), config.api_base_url.clone())?;
    let assembly = assembler::assemble(relevant, Arc::new(extractor), concurrency).await?;

    let result = DocumentResult { funds: assembly.funds };
    match output {
        Some(path) => {
            let written = storage::save_result(&path, &result)?;
            println!("Saved {} funds to {}", result.funds.len(), written.display());
        }
        None => println!("{}", storage::to_json(&result)?),
    }

    tracing::info!("Processing finished for {}", config.document.display());
    Ok(())
}

fn inspect(config_path: PathBuf, page_index: usize, dump: Option<PathBuf>) -> Result<(), AppError> {
    let config = RunConfig::load(&config_path)?;
    let pages = pdf::loader::load_document(&config.document)?;

    let page = pages.get(page_index).ok_or(utils::error::DocumentReadError::Page {
        page: page_index,
        message: format!("document has {} pages", pages.len()),
    })?;
    let description = utils::region_debug::describe_page(page, page_index, &config.segmentation)?;
    println!("{}", description);

    if let Some(path) = dump {
        utils::region_debug::save_region_dump(&description, &path)?;
    }
    Ok(())
}
