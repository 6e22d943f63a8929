//! Markdown post-processing helpers
//!
//! Building blocks for the `on_process_markdown` hook: a code-fence
//! tokenizer feeding default-language tagging, HTML-comment removal and
//! heading spacing normalization. Each helper takes the whole assembled
//! document and returns a new one; the writer applies the configured hook
//! once per artifact, after ToC insertion.
//!
//! Fence handling is an explicit tokenizer pass: every line is classified
//! as fence-open, fence-body, fence-close or other, and rendering is a
//! single deterministic pass over that classification. No regex state
//! machine, no ambiguity about malformed fences.

use once_cell::sync::Lazy;
use regex::Regex;

static HTML_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid pattern"));
static HEADING_SPACING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(#{1,6})([^ #])").expect("valid pattern"));

/// One classified line of a Markdown document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenceEvent<'a> {
    /// Opening fence line; `info` is the text after the backticks
    FenceOpen { line: &'a str, info: &'a str },
    /// Closing fence line
    FenceClose { line: &'a str },
    /// A line inside an open fence
    FenceBody { line: &'a str },
    /// Any line outside fences
    Other { line: &'a str },
}

impl<'a> FenceEvent<'a> {
    fn line(&self) -> &'a str {
        match *self {
            FenceEvent::FenceOpen { line, .. }
            | FenceEvent::FenceClose { line }
            | FenceEvent::FenceBody { line }
            | FenceEvent::Other { line } => line,
        }
    }
}

/// Classify every line of a document into fence events
///
/// A fence line is one whose trimmed form starts with three backticks.
/// Fence lines alternate open/close; an unclosed final fence simply ends
/// the document in body state, which renders through unchanged.
pub fn classify_fences(markdown: &str) -> Vec<FenceEvent<'_>> {
    let mut events = Vec::new();
    let mut in_fence = false;

    for line in markdown.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("```") {
            if in_fence {
                events.push(FenceEvent::FenceClose { line });
            } else {
                events.push(FenceEvent::FenceOpen {
                    line,
                    info: rest.trim(),
                });
            }
            in_fence = !in_fence;
        } else if in_fence {
            events.push(FenceEvent::FenceBody { line });
        } else {
            events.push(FenceEvent::Other { line });
        }
    }
    events
}

/// Tag untagged opening fences with a language
///
/// Only opening fences with an empty info string are rewritten; tagged
/// fences, fence bodies and closing fences pass through verbatim.
pub fn add_language_to_code_blocks(markdown: &str, language: &str) -> String {
    let mut out = String::with_capacity(markdown.len() + 16);

    for event in classify_fences(markdown) {
        match event {
            FenceEvent::FenceOpen { line, info } if info.is_empty() => {
                // Keep the line's own indentation in front of the fence
                let indent = &line[..line.len() - line.trim_start().len()];
                out.push_str(indent);
                out.push_str("```");
                out.push_str(language);
            }
            other => out.push_str(other.line()),
        }
        out.push('\n');
    }

    if !markdown.ends_with('\n') {
        out.pop();
    }
    out
}

/// Remove HTML comments, including multi-line ones
pub fn remove_html_comments(markdown: &str) -> String {
    HTML_COMMENT.replace_all(markdown, "").into_owned()
}

/// Ensure a space between ATX heading markers and the heading text
pub fn normalize_headings(markdown: &str) -> String {
    HEADING_SPACING
        .replace_all(markdown, "${1} ${2}")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_simple_fence() {
        let events = classify_fences("before\n```rust\nlet x = 1;\n```\nafter");
        assert_eq!(events[0], FenceEvent::Other { line: "before" });
        assert_eq!(
            events[1],
            FenceEvent::FenceOpen {
                line: "```rust",
                info: "rust"
            }
        );
        assert_eq!(events[2], FenceEvent::FenceBody { line: "let x = 1;" });
        assert_eq!(events[3], FenceEvent::FenceClose { line: "```" });
        assert_eq!(events[4], FenceEvent::Other { line: "after" });
    }

    #[test]
    fn test_classify_unclosed_fence_stays_in_body() {
        let events = classify_fences("```\ndangling");
        assert!(matches!(events[0], FenceEvent::FenceOpen { .. }));
        assert!(matches!(events[1], FenceEvent::FenceBody { .. }));
    }

    #[test]
    fn test_add_language_tags_untagged_fences_only() {
        let input = "```\nplain\n```\n\n```rust\nlet x = 1;\n```\n";
        let output = add_language_to_code_blocks(input, "bash");
        assert!(output.contains("```bash\nplain\n```"));
        assert!(output.contains("```rust\nlet x = 1;\n```"));
    }

    #[test]
    fn test_add_language_never_touches_closing_fences() {
        let input = "```\nbody\n```\n";
        let output = add_language_to_code_blocks(input, "sh");
        assert_eq!(output, "```sh\nbody\n```\n");
    }

    #[test]
    fn test_add_language_ignores_fence_looking_body_lines() {
        // The inner ``` line is a close, the next open gets tagged
        let input = "```\na\n```\n```\nb\n```\n";
        let output = add_language_to_code_blocks(input, "txt");
        assert_eq!(output, "```txt\na\n```\n```txt\nb\n```\n");
    }

    #[test]
    fn test_add_language_preserves_indentation() {
        let input = "  ```\n  code\n  ```\n";
        let output = add_language_to_code_blocks(input, "js");
        assert!(output.starts_with("  ```js\n"));
    }

    #[test]
    fn test_add_language_without_trailing_newline() {
        let input = "text";
        assert_eq!(add_language_to_code_blocks(input, "x"), "text");
    }

    #[test]
    fn test_remove_html_comments() {
        let input = "keep <!-- drop\nacross lines --> this";
        assert_eq!(remove_html_comments(input), "keep  this");
    }

    #[test]
    fn test_normalize_headings_adds_missing_space() {
        let input = "##Tight\n## Fine\n######Deep";
        let output = normalize_headings(input);
        assert_eq!(output, "## Tight\n## Fine\n###### Deep");
    }
}
