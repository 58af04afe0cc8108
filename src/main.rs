//! Entry point for the chapter summarizer.
//!
//! Responsibilities here are intentionally minimal:
//! - Parse command-line arguments.
//! - Load user configuration from `conf/config.toml`.
//! - Build the summarization gateway from that configuration.
//! - Run the extraction → summarization → assembly pipeline once.

mod book;
mod config;
mod document;
mod export;
mod extract;
mod nav;
mod pipeline;
mod summarize;
mod text_utils;

use crate::config::load_config;
use crate::pipeline::Pipeline;
use crate::summarize::OpenAiSummarizer;
use anyhow::{Result, anyhow};
use std::env;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

const DEFAULT_CONFIG_PATH: &str = "conf/config.toml";

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let args = parse_args()?;
    let config = load_config(&args.config_path);
    set_log_level(reload_handle, config.log_level.as_filter_str());

    info!(
        path = %args.book_path.display(),
        test_mode = args.test_mode,
        model = %config.model,
        output_format = %config.output_format,
        "Starting chapter summarization"
    );

    let summarizer = OpenAiSummarizer::from_config(&config)?;
    let pipeline = Pipeline::new(&config, summarizer);
    let report = pipeline.run(&args.book_path, args.test_mode)?;

    match &report.output {
        Some(path) => info!(
            path = %path.display(),
            chapters = report.chapters.len(),
            "Summarized chapters saved"
        ),
        None => info!("No chapters found or extracted; nothing was written"),
    }
    Ok(())
}

struct CliArgs {
    book_path: PathBuf,
    test_mode: bool,
    config_path: PathBuf,
}

fn parse_args() -> Result<CliArgs> {
    let mut book_path: Option<PathBuf> = None;
    let mut test_mode = false;
    let mut config_path = PathBuf::from(DEFAULT_CONFIG_PATH);

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--test" => test_mode = true,
            "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a path argument"))?;
                config_path = PathBuf::from(value);
            }
            other if other.starts_with('-') => {
                return Err(anyhow!(
                    "Unknown flag '{other}'. Usage: epub-digest <path-to-book> [--test] [--config <path>]"
                ));
            }
            other => {
                if book_path.is_some() {
                    return Err(anyhow!(
                        "Unexpected extra argument '{other}'. Usage: epub-digest <path-to-book> [--test] [--config <path>]"
                    ));
                }
                book_path = Some(PathBuf::from(other));
            }
        }
    }

    let book_path = book_path
        .ok_or_else(|| anyhow!("Usage: epub-digest <path-to-book> [--test] [--config <path>]"))?;
    if !book_path.exists() {
        return Err(anyhow!("File not found: {}", book_path.display()));
    }

    Ok(CliArgs {
        book_path,
        test_mode,
        config_path,
    })
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_filter(filter_layer))
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
