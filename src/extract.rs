//! Chapter text extraction.
//!
//! Reduces chapter markup to plain text (paragraph elements only) and drives
//! the navigation-ordered walk over the whole book. Per-chapter problems
//! degrade to a warning plus an omission; only a missing navigation document
//! aborts the run.

use crate::book::BookSource;
use crate::nav::{self, NavError, local_name, resolve_entity};
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, warn};

/// Ordered mapping from chapter title to extracted plain text.
///
/// Titles are nominally unique per book. When two navigation entries share a
/// title, the later text replaces the earlier one at its original position —
/// the caller is warned, nothing is dropped silently.
#[derive(Debug, Default)]
pub struct ChapterMap {
    entries: Vec<(String, String)>,
}

impl ChapterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a chapter, replacing any earlier chapter with the same title
    /// in place. Returns `true` when an earlier entry was replaced.
    pub fn insert(&mut self, title: String, text: String) -> bool {
        if let Some(existing) = self.entries.iter_mut().find(|(t, _)| *t == title) {
            existing.1 = text;
            return true;
        }
        self.entries.push((title, text));
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, c)| (t.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Walk the book's navigation entries in order and build the title → text
/// mapping. `limit` truncates the entry list first (test mode); missing and
/// empty chapters are warned about and skipped without aborting.
pub fn extract_chapters<B: BookSource>(
    book: &mut B,
    limit: Option<usize>,
) -> Result<ChapterMap, NavError> {
    let mut entries = nav::nav_entries(book)?;
    if let Some(limit) = limit
        && entries.len() > limit
    {
        debug!(
            limit,
            total = entries.len(),
            "Truncating navigation entries for test mode"
        );
        entries.truncate(limit);
    }

    let mut chapters = ChapterMap::new();
    for entry in entries {
        let Some(markup) = book.chapter_markup(&entry.href) else {
            warn!(title = %entry.title, href = %entry.href, "Chapter not found in archive, skipping");
            continue;
        };
        let text = chapter_to_str(&markup);
        if text.trim().is_empty() {
            warn!(title = %entry.title, "Chapter has no paragraph text, skipping");
            continue;
        }
        debug!(title = %entry.title, chars = text.len(), "Extracted chapter");
        if chapters.insert(entry.title.clone(), text) {
            warn!(title = %entry.title, "Duplicate chapter title, replacing earlier text");
        }
    }
    Ok(chapters)
}

/// Reduce chapter markup to the visible text of its paragraph elements,
/// joined with single spaces. Headings, lists, tables and images are
/// intentionally dropped. Markup that is not well-formed XML falls back to a
/// whole-body html2text pass so a sloppy chapter degrades instead of
/// vanishing.
pub fn chapter_to_str(markup: &str) -> String {
    match paragraph_texts(markup) {
        Ok(paragraphs) => paragraphs.join(" "),
        Err(err) => {
            warn!("Chapter markup is not well-formed XML, using html2text: {err}");
            match html2text::from_read(markup.as_bytes(), 10_000) {
                Ok(text) => text.trim().to_string(),
                Err(err) => {
                    warn!("html2text failed: {err}");
                    String::new()
                }
            }
        }
    }
}

/// Collect the text content of every `<p>` element in document order.
/// Text is kept raw (no per-event trimming) so inline markup does not glue
/// words together; each finished paragraph is trimmed and blank ones are
/// dropped.
fn paragraph_texts(markup: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(markup);

    let mut paragraphs = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if local_name(e.name().as_ref()) == b"p" {
                    depth += 1;
                }
            }
            Ok(Event::End(e)) => {
                if local_name(e.name().as_ref()) == b"p" && depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        let paragraph = current.trim().to_string();
                        if !paragraph.is_empty() {
                            paragraphs.push(paragraph);
                        }
                        current.clear();
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if depth > 0 {
                    current.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if depth > 0 {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        current.push_str(&resolved);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e),
            _ => {}
        }
    }

    Ok(paragraphs)
}
