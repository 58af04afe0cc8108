//! Output document writing.
//!
//! The summary document is always rendered to Markdown; DOCX output is
//! produced by handing that Markdown to pandoc. If pandoc is unavailable or
//! fails, the Markdown file is kept and the run still succeeds with a
//! warning.

use crate::config::{AppConfig, OutputFormat};
use crate::document::{PageBreakStyle, SummaryDocument};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

/// Write the assembled document next to the configured output directory,
/// named after the input file's stem. Returns the path of the file the
/// caller should point the user at.
pub fn write_summary(doc: &SummaryDocument, cfg: &AppConfig, input: &Path) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("book");
    let out_dir = PathBuf::from(&cfg.output_dir);
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output dir {}", out_dir.display()))?;
    let md_path = out_dir.join(format!("{stem}_summary.md"));

    match cfg.output_format {
        OutputFormat::Markdown => {
            fs::write(&md_path, doc.to_markdown(PageBreakStyle::Latex))
                .with_context(|| format!("Failed to write {}", md_path.display()))?;
            info!(path = %md_path.display(), "Wrote summary document");
            Ok(md_path)
        }
        OutputFormat::Docx => {
            fs::write(&md_path, doc.to_markdown(PageBreakStyle::OpenXml))
                .with_context(|| format!("Failed to write {}", md_path.display()))?;
            let docx_path = out_dir.join(format!("{stem}_summary.docx"));
            match convert_with_pandoc(&md_path, &docx_path) {
                Ok(()) => {
                    info!(path = %docx_path.display(), "Wrote summary document");
                    Ok(docx_path)
                }
                Err(err) => {
                    warn!(
                        path = %md_path.display(),
                        "Pandoc conversion failed, keeping markdown output: {err}"
                    );
                    Ok(md_path)
                }
            }
        }
    }
}

fn convert_with_pandoc(md_path: &Path, docx_path: &Path) -> Result<()> {
    let output = Command::new("pandoc")
        .arg(md_path)
        .arg("--from")
        .arg("markdown")
        .arg("-o")
        .arg(docx_path)
        .output()
        .with_context(|| format!("Failed to start pandoc for {}", md_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "pandoc conversion failed for {}: {}",
            md_path.display(),
            stderr.trim()
        );
    }
    Ok(())
}
