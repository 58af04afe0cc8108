//! Navigation document parsing.
//!
//! The navigation document (NCX) is the ordered table of contents embedded
//! in the archive. Parsing preserves the document order of `<navPoint>`
//! elements exactly, since that order drives the rest of the pipeline.

use crate::book::BookSource;
use quick_xml::Reader;
use quick_xml::events::Event;
use thiserror::Error;
use tracing::warn;

/// One table-of-contents entry: a human-readable title and the reference of
/// the chapter it points at, with any `#fragment` anchor already stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub title: String,
    pub href: String,
}

/// Failures that make the whole run meaningless: without a parseable
/// navigation document there is no chapter list to work from.
#[derive(Debug, Error)]
pub enum NavError {
    #[error("no navigation document found in the archive")]
    NavigationMissing,
    #[error("navigation document is not valid XML: {0}")]
    NavigationInvalid(#[from] quick_xml::Error),
}

/// Read and parse the book's navigation document into an ordered entry list.
pub fn nav_entries<B: BookSource>(book: &mut B) -> Result<Vec<NavEntry>, NavError> {
    let markup = book.nav_document().ok_or(NavError::NavigationMissing)?;
    parse_navpoints(&markup)
}

/// Parse NCX markup into a flat list of entries in document order. Nested
/// navigation points are flattened in place: a parent's entry precedes its
/// children, exactly as they appear in the source.
pub fn parse_navpoints(content: &str) -> Result<Vec<NavEntry>, NavError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut stack: Vec<PendingNav> = Vec::new();
    let mut in_label_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"navPoint" => stack.push(PendingNav {
                    label: String::new(),
                    emitted: false,
                }),
                b"text" => in_label_text = !stack.is_empty(),
                b"content" => emit_content(&e, &mut stack, &mut entries),
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if local_name(e.name().as_ref()) == b"content" {
                    emit_content(&e, &mut stack, &mut entries);
                }
            }
            Ok(Event::Text(e)) => {
                if in_label_text && let Some(point) = stack.last_mut() {
                    point.label.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_label_text && let Some(point) = stack.last_mut() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        point.label.push_str(&resolved);
                    }
                }
            }
            Ok(Event::End(e)) => match local_name(e.name().as_ref()) {
                b"text" => in_label_text = false,
                b"navPoint" => {
                    if let Some(point) = stack.pop()
                        && !point.emitted
                    {
                        warn!(
                            label = %point.label.trim(),
                            "Navigation point has no content source, skipping"
                        );
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(NavError::NavigationInvalid(e)),
            _ => {}
        }
    }

    Ok(entries)
}

struct PendingNav {
    label: String,
    emitted: bool,
}

/// Emit an entry for the innermost open navigation point once its `content`
/// element is seen. The first content source wins per point.
fn emit_content(
    e: &quick_xml::events::BytesStart<'_>,
    stack: &mut [PendingNav],
    entries: &mut Vec<NavEntry>,
) {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"src"
            && let Some(point) = stack.last_mut()
            && !point.emitted
        {
            let src = String::from_utf8_lossy(&attr.value).into_owned();
            entries.push(NavEntry {
                title: point.label.trim().to_string(),
                href: strip_fragment(&src).to_string(),
            });
            point.emitted = true;
        }
    }
}

/// Content references address archive items by path; an in-page anchor after
/// `#` is meaningless for item lookup and is dropped.
fn strip_fragment(src: &str) -> &str {
    match src.split_once('#') {
        Some((path, _)) => path,
        None => src,
    }
}

/// Extract local name from a namespaced XML name (e.g., "ncx:text" -> "text").
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

/// Resolve XML entity references.
pub(crate) fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        _ => {}
    }

    if let Some(hex) = entity.strip_prefix("#x") {
        if let Ok(code) = u32::from_str_radix(hex, 16)
            && let Some(c) = char::from_u32(code)
        {
            return Some(c.to_string());
        }
    } else if let Some(dec) = entity.strip_prefix('#')
        && let Ok(code) = dec.parse::<u32>()
        && let Some(c) = char::from_u32(code)
    {
        return Some(c.to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_flat_navmap_preserves_order() {
        let ncx = r#"<?xml version="1.0"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <navMap>
    <navPoint id="np1" playOrder="1">
      <navLabel><text>Chapter 1</text></navLabel>
      <content src="chapter1.xhtml"/>
    </navPoint>
    <navPoint id="np2" playOrder="2">
      <navLabel><text>Chapter 2</text></navLabel>
      <content src="chapter2.xhtml"/>
    </navPoint>
  </navMap>
</ncx>"#;

        let entries = parse_navpoints(ncx).unwrap();
        assert_eq!(
            entries,
            vec![
                NavEntry {
                    title: "Chapter 1".to_string(),
                    href: "chapter1.xhtml".to_string()
                },
                NavEntry {
                    title: "Chapter 2".to_string(),
                    href: "chapter2.xhtml".to_string()
                },
            ]
        );
    }

    #[test]
    fn fragment_suffix_is_stripped() {
        let ncx = r#"<ncx><navMap>
            <navPoint><navLabel><text>Intro</text></navLabel>
            <content src="intro.xhtml#section-2"/></navPoint>
        </navMap></ncx>"#;

        let entries = parse_navpoints(ncx).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].href, "intro.xhtml");
    }

    #[test]
    fn labels_are_trimmed_and_entities_resolved() {
        let ncx = r#"<ncx><navMap>
            <navPoint><navLabel><text>  Tom &amp; Jerry </text></navLabel>
            <content src="ch1.xhtml"/></navPoint>
        </navMap></ncx>"#;

        let entries = parse_navpoints(ncx).unwrap();
        assert_eq!(entries[0].title, "Tom & Jerry");
    }

    #[test]
    fn nested_navpoints_flatten_in_document_order() {
        let ncx = r#"<ncx><navMap>
            <navPoint>
              <navLabel><text>Part I</text></navLabel>
              <content src="part1.xhtml"/>
              <navPoint>
                <navLabel><text>Chapter 1</text></navLabel>
                <content src="ch1.xhtml"/>
              </navPoint>
              <navPoint>
                <navLabel><text>Chapter 2</text></navLabel>
                <content src="ch2.xhtml"/>
              </navPoint>
            </navPoint>
        </navMap></ncx>"#;

        let entries = parse_navpoints(ncx).unwrap();
        let titles: Vec<&str> = entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Part I", "Chapter 1", "Chapter 2"]);
    }

    #[test]
    fn navpoint_without_content_is_skipped() {
        let ncx = r#"<ncx><navMap>
            <navPoint><navLabel><text>Ghost</text></navLabel></navPoint>
            <navPoint><navLabel><text>Real</text></navLabel>
            <content src="real.xhtml"/></navPoint>
        </navMap></ncx>"#;

        let entries = parse_navpoints(ncx).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Real");
    }

    #[test]
    fn missing_nav_document_is_a_hard_error() {
        struct NavlessBook;
        impl crate::book::BookSource for NavlessBook {
            fn nav_document(&mut self) -> Option<String> {
                None
            }
            fn chapter_markup(&mut self, _href: &str) -> Option<String> {
                None
            }
        }

        let err = nav_entries(&mut NavlessBook).unwrap_err();
        assert!(matches!(err, NavError::NavigationMissing));
    }
}
