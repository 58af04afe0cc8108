//! EPUB archive access.
//!
//! This module is intentionally small: it knows how to open an EPUB and hand
//! out raw markup for the navigation document and for individual chapters.
//! Everything downstream works against the `BookSource` trait so the
//! extraction pipeline can be exercised without a real archive.

use anyhow::{Context, Result};
use epub::doc::EpubDoc;
use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Media type of the NCX navigation document.
pub const NAV_MIME: &str = "application/x-dtbncx+xml";

/// Read-only view of a parsed book archive.
pub trait BookSource {
    /// Markup of the archive's navigation document, if one exists.
    fn nav_document(&mut self) -> Option<String>;

    /// Markup of the chapter addressed by `href`, or `None` when the
    /// reference does not resolve to an archive item. Never an error: the
    /// orchestrator decides what a missing chapter means.
    fn chapter_markup(&mut self, href: &str) -> Option<String>;
}

/// A book backed by an EPUB file on disk.
pub struct EpubBook {
    doc: EpubDoc<BufReader<File>>,
    nav_path: Option<PathBuf>,
}

impl EpubBook {
    /// Open an EPUB from disk. The archive is read once and held immutably
    /// for the duration of the run.
    pub fn open(path: &Path) -> Result<Self> {
        let doc = EpubDoc::new(path)
            .with_context(|| format!("Failed to open EPUB at {}", path.display()))?;

        for (id, item) in &doc.resources {
            debug!(id = %id, path = %item.path.display(), mime = %item.mime, "Archive item");
        }

        let nav_path = doc
            .resources
            .values()
            .find(|item| item.mime.as_str() == NAV_MIME)
            .map(|item| item.path.clone());

        Ok(EpubBook { doc, nav_path })
    }
}

impl BookSource for EpubBook {
    fn nav_document(&mut self) -> Option<String> {
        let path = self.nav_path.clone()?;
        self.doc.get_resource_str_by_path(path)
    }

    fn chapter_markup(&mut self, href: &str) -> Option<String> {
        // Navigation references are relative to the navigation document's
        // directory; fall back to the verbatim path for flat archives.
        let mut candidates = Vec::new();
        if let Some(dir) = self.nav_path.as_ref().and_then(|p| p.parent()) {
            candidates.push(normalize(&dir.join(href)));
        }
        let verbatim = PathBuf::from(href);
        if !candidates.contains(&verbatim) {
            candidates.push(verbatim);
        }

        for candidate in candidates {
            if let Some(markup) = self.doc.get_resource_str_by_path(&candidate) {
                return Some(markup);
            }
        }
        None
    }
}

/// Collapse `.` and `..` components so joined references match the archive's
/// item paths exactly.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out
}
