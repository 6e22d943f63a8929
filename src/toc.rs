//! Table-of-contents synthesis
//!
//! Entries accumulate across all pages of a batch in document order; the
//! builder then renders one linked outline and splices it into the
//! assembled document. Only the enhanced (`human_readable_markdown`)
//! output mode uses this module.

/// One table-of-contents entry
///
/// `level` is the rendered heading level (2..=6); `slug` is the anchor the
/// outline links to. Slugs are not guaranteed unique across a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub level: usize,
    pub text: String,
    pub slug: String,
}

/// Anchor id of the outline itself, target of "Back to Top" links
pub const TOC_ANCHOR: &str = "table-of-contents";

/// Render the outline: a fixed title line, then one list item per entry,
/// indented two spaces per level below 2
pub fn render_toc(entries: &[TocEntry]) -> String {
    let mut toc = format!("## Table of Contents {{#{}}}\n\n", TOC_ANCHOR);
    for entry in entries {
        let indent = "  ".repeat(entry.level.saturating_sub(2));
        toc.push_str(&format!(
            "{}- [{}](#{})\n",
            indent, entry.text, entry.slug
        ));
    }
    toc.push('\n');
    toc
}

/// Splice the rendered outline into a document
///
/// Insertion point is immediately after the first blank-line-terminated
/// block (the document's top header). Without such a boundary the outline
/// is prepended.
pub fn insert_toc(document: String, toc: &str) -> String {
    match document.find("\n\n") {
        Some(idx) => {
            let split = idx + 2;
            let mut out = String::with_capacity(document.len() + toc.len());
            out.push_str(&document[..split]);
            out.push_str(toc);
            out.push_str(&document[split..]);
            out
        }
        None => format!("{}{}", toc, document),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(level: usize, text: &str, slug: &str) -> TocEntry {
        TocEntry {
            level,
            text: text.to_string(),
            slug: slug.to_string(),
        }
    }

    #[test]
    fn test_render_toc_title_and_indentation() {
        let toc = render_toc(&[
            entry(2, "Intro", "intro"),
            entry(3, "Details", "details"),
            entry(4, "Fine print", "fine-print"),
        ]);

        assert!(toc.starts_with("## Table of Contents {#table-of-contents}\n\n"));
        assert!(toc.contains("- [Intro](#intro)\n"));
        assert!(toc.contains("  - [Details](#details)\n"));
        assert!(toc.contains("    - [Fine print](#fine-print)\n"));
        assert!(toc.ends_with("\n\n"));
    }

    #[test]
    fn test_render_toc_empty_is_just_the_title() {
        let toc = render_toc(&[]);
        assert_eq!(toc, "## Table of Contents {#table-of-contents}\n\n\n");
    }

    #[test]
    fn test_insert_after_first_block() {
        let doc = "# example.com\n\n## First Page\n\nBody\n".to_string();
        let out = insert_toc(doc, "TOC\n\n");
        assert!(out.starts_with("# example.com\n\nTOC\n\n## First Page"));
    }

    #[test]
    fn test_insert_without_boundary_prepends() {
        let doc = "no blank line here".to_string();
        let out = insert_toc(doc, "TOC\n\n");
        assert!(out.starts_with("TOC\n\n"));
        assert!(out.ends_with("no blank line here"));
    }
}
