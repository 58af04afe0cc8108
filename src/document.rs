//! Summary document assembly.
//!
//! Turns (title, summary) pairs into a headed, paragraph-structured,
//! page-separated document model. This is a formatting pass: summary text is
//! untrusted free-form output and the only interpretation applied is
//! detecting the labeled takeaway/recap lines. A marker-free summary falls
//! through entirely to plain paragraphs.

/// Label that opens the key-takeaway section of a summary.
pub const TAKEAWAY_LABEL: &str = "Key Takeaway(s):";
/// Label that opens the recap section of a summary.
pub const RECAP_LABEL: &str = "Recap:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading(String),
    Paragraph(String),
    PageBreak,
}

/// How a page break is rendered in the Markdown output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageBreakStyle {
    /// `\newpage` — honored by LaTeX/PDF toolchains and harmless elsewhere.
    Latex,
    /// Raw OpenXML block, for conversion to DOCX.
    OpenXml,
}

impl PageBreakStyle {
    fn as_markdown(self) -> &'static str {
        match self {
            PageBreakStyle::Latex => "\\newpage",
            PageBreakStyle::OpenXml => {
                "```{=openxml}\n<w:p><w:r><w:br w:type=\"page\"/></w:r></w:p>\n```"
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineClass {
    TakeawayMarker,
    RecapMarker,
    Body,
}

/// Line classifier for summary text. Four states, tracked by the two flags:
/// before any marker, after the takeaway marker, after the recap marker, and
/// after both. Only the first occurrence of each marker counts; repeated
/// marker lines are ordinary body text so the document never grows duplicate
/// section openers.
struct LineClassifier {
    seen_takeaway: bool,
    seen_recap: bool,
}

impl LineClassifier {
    fn new() -> Self {
        LineClassifier {
            seen_takeaway: false,
            seen_recap: false,
        }
    }

    fn classify(&mut self, line: &str) -> LineClass {
        if line.starts_with(TAKEAWAY_LABEL) && !self.seen_takeaway {
            self.seen_takeaway = true;
            return LineClass::TakeawayMarker;
        }
        if line.starts_with(RECAP_LABEL) && !self.seen_recap {
            self.seen_recap = true;
            return LineClass::RecapMarker;
        }
        LineClass::Body
    }
}

/// Append-only document model: one heading per chapter, paragraphs below it,
/// a hard page break between chapters and none after the last.
#[derive(Debug, Default)]
pub struct SummaryDocument {
    blocks: Vec<Block>,
}

impl SummaryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Append one chapter: page break (unless this is the first chapter),
    /// heading, then the summary's lines in original order. Marker lines get
    /// their label emphasized; everything else is a plain paragraph. Blank
    /// lines carry no content in any paginated output and are dropped.
    pub fn push_chapter(&mut self, title: &str, summary: &str) {
        if !self.blocks.is_empty() {
            self.blocks.push(Block::PageBreak);
        }
        self.blocks.push(Block::Heading(title.to_string()));

        let mut classifier = LineClassifier::new();
        for line in summary.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let text = match classifier.classify(line) {
                LineClass::TakeawayMarker => emphasize_label(line, TAKEAWAY_LABEL),
                LineClass::RecapMarker => emphasize_label(line, RECAP_LABEL),
                LineClass::Body => line.to_string(),
            };
            self.blocks.push(Block::Paragraph(text));
        }
    }

    /// Render the document as Markdown with the requested page-break style.
    pub fn to_markdown(&self, breaks: PageBreakStyle) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            match block {
                Block::Heading(title) => {
                    out.push_str("# ");
                    out.push_str(title);
                }
                Block::Paragraph(text) => out.push_str(text),
                Block::PageBreak => out.push_str(breaks.as_markdown()),
            }
            out.push_str("\n\n");
        }
        let mut out = out.trim_end().to_string();
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

fn emphasize_label(line: &str, label: &str) -> String {
    match line.strip_prefix(label) {
        Some(rest) => format!("**{label}**{rest}"),
        None => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapter_emits_heading_then_paragraphs() {
        let mut doc = SummaryDocument::new();
        doc.push_chapter(
            "Chapter 1",
            "Key Takeaway(s): stay curious.\n\nRecap: a recap line.\nMore recap.",
        );

        assert_eq!(
            doc.blocks(),
            &[
                Block::Heading("Chapter 1".to_string()),
                Block::Paragraph("**Key Takeaway(s):** stay curious.".to_string()),
                Block::Paragraph("**Recap:** a recap line.".to_string()),
                Block::Paragraph("More recap.".to_string()),
            ]
        );
    }

    #[test]
    fn page_break_between_chapters_but_not_after_last() {
        let mut doc = SummaryDocument::new();
        doc.push_chapter("One", "First.");
        doc.push_chapter("Two", "Second.");

        let blocks = doc.blocks();
        assert_eq!(blocks[0], Block::Heading("One".to_string()));
        assert_eq!(blocks[2], Block::PageBreak);
        assert_eq!(blocks[3], Block::Heading("Two".to_string()));
        assert_ne!(blocks.last().unwrap(), &Block::PageBreak);

        let md = doc.to_markdown(PageBreakStyle::Latex);
        assert_eq!(md.matches("\\newpage").count(), 1);
        assert!(!md.trim_end().ends_with("\\newpage"));
    }

    #[test]
    fn repeated_markers_fall_through_to_plain_paragraphs() {
        let mut doc = SummaryDocument::new();
        doc.push_chapter(
            "Chapter",
            "Key Takeaway(s): first.\nKey Takeaway(s): again.\nRecap: once.\nRecap: twice.",
        );

        assert_eq!(
            doc.blocks(),
            &[
                Block::Heading("Chapter".to_string()),
                Block::Paragraph("**Key Takeaway(s):** first.".to_string()),
                Block::Paragraph("Key Takeaway(s): again.".to_string()),
                Block::Paragraph("**Recap:** once.".to_string()),
                Block::Paragraph("Recap: twice.".to_string()),
            ]
        );
    }

    #[test]
    fn marker_free_summary_becomes_plain_paragraphs() {
        let mut doc = SummaryDocument::new();
        doc.push_chapter("Chapter", "Just a line.\nAnother line.");

        assert_eq!(
            doc.blocks(),
            &[
                Block::Heading("Chapter".to_string()),
                Block::Paragraph("Just a line.".to_string()),
                Block::Paragraph("Another line.".to_string()),
            ]
        );
    }

    #[test]
    fn empty_document_renders_empty() {
        let doc = SummaryDocument::new();
        assert!(doc.is_empty());
        assert_eq!(doc.to_markdown(PageBreakStyle::Latex), "");
    }

    #[test]
    fn markdown_rendering_shapes_headings_and_breaks() {
        let mut doc = SummaryDocument::new();
        doc.push_chapter("One", "Alpha.");
        doc.push_chapter("Two", "Beta.");

        let md = doc.to_markdown(PageBreakStyle::Latex);
        assert_eq!(md, "# One\n\nAlpha.\n\n\\newpage\n\n# Two\n\nBeta.\n");

        let docx_md = doc.to_markdown(PageBreakStyle::OpenXml);
        assert!(docx_md.contains("```{=openxml}"));
        assert!(docx_md.contains("<w:br w:type=\"page\"/>"));
    }
}
