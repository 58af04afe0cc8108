//! The extract → summarize → assemble pipeline.
//!
//! One run processes one book: extraction completes before any gateway call
//! is made, summaries are requested strictly in navigation order, and the
//! output document mirrors that order. The pipeline is parameterized by the
//! loaded configuration (prompt, truncation limit, output settings,
//! gateway-failure policy) so every variant of a run is the same code path.

use crate::book::{BookSource, EpubBook};
use crate::config::{AppConfig, GatewayErrorPolicy};
use crate::document::SummaryDocument;
use crate::export;
use crate::extract;
use crate::summarize::Summarizer;
use crate::text_utils::count_words;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub struct Pipeline<S: Summarizer> {
    cfg: AppConfig,
    summarizer: S,
}

/// What one run did, chapter by chapter.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub chapters: Vec<ChapterReport>,
    /// Path of the written document; `None` when nothing was extracted or
    /// every chapter was skipped.
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct ChapterReport {
    pub title: String,
    pub chapter_words: usize,
    pub summary_words: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

impl<S: Summarizer> Pipeline<S> {
    pub fn new(cfg: &AppConfig, summarizer: S) -> Self {
        Pipeline {
            cfg: cfg.clone(),
            summarizer,
        }
    }

    /// Open the EPUB at `input` and run the full pipeline over it.
    pub fn run(&self, input: &Path, test_mode: bool) -> Result<RunReport> {
        let mut book = EpubBook::open(input)?;
        self.run_book(&mut book, input, test_mode)
    }

    /// Run the pipeline over an already-opened book. `input` only informs
    /// output naming and log messages.
    pub fn run_book<B: BookSource>(
        &self,
        book: &mut B,
        input: &Path,
        test_mode: bool,
    ) -> Result<RunReport> {
        let limit = test_mode.then_some(self.cfg.test_chapter_limit);
        let chapters = extract::extract_chapters(book, limit)
            .with_context(|| format!("Failed to extract chapters from {}", input.display()))?;

        if chapters.is_empty() {
            info!("No chapters found or extracted");
            return Ok(RunReport {
                chapters: Vec::new(),
                output: None,
            });
        }
        info!(chapters = chapters.len(), "Extracted chapters");

        let mut doc = SummaryDocument::new();
        let mut reports = Vec::new();
        for (title, text) in chapters.iter() {
            let chapter_words = count_words(text);
            info!(%title, words = chapter_words, "Summarizing chapter");

            let summary = match self.summarizer.summarize(text) {
                Ok(summary) => summary,
                Err(err) => match self.cfg.on_gateway_error {
                    GatewayErrorPolicy::Abort => {
                        return Err(err)
                            .with_context(|| format!("Summarization failed for chapter '{title}'"));
                    }
                    GatewayErrorPolicy::Skip => {
                        warn!(%title, "Summarization failed, skipping chapter: {err:#}");
                        reports.push(ChapterReport {
                            title: title.to_string(),
                            chapter_words,
                            summary_words: 0,
                            skipped: Some(format!("{err:#}")),
                        });
                        continue;
                    }
                },
            };

            doc.push_chapter(title, &summary);
            reports.push(ChapterReport {
                title: title.to_string(),
                chapter_words,
                summary_words: count_words(&summary),
                skipped: None,
            });
        }

        let output = if doc.is_empty() {
            info!("Every chapter was skipped; not writing an output document");
            None
        } else {
            Some(export::write_summary(&doc, &self.cfg, input)?)
        };

        let report = RunReport {
            chapters: reports,
            output,
        };
        if self.cfg.write_report_json {
            self.write_report(&report, input)?;
        }
        Ok(report)
    }

    fn write_report(&self, report: &RunReport, input: &Path) -> Result<()> {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("book");
        let out_dir = PathBuf::from(&self.cfg.output_dir);
        std::fs::create_dir_all(&out_dir)
            .with_context(|| format!("Failed to create output dir {}", out_dir.display()))?;
        let path = out_dir.join(format!("{stem}_report.json"));
        std::fs::write(&path, serde_json::to_string_pretty(report)?)
            .with_context(|| format!("Failed to write report at {}", path.display()))?;
        info!(path = %path.display(), "Wrote run report");
        Ok(())
    }
}
