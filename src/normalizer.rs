//! HTML normalizer - converts one page record to Markdown
//!
//! The normalizer turns a single [`PageRecord`]'s HTML into Markdown plus
//! the record's table-of-contents entries. Conversion is a pure transform:
//! a depth-first traversal of an immutable DOM tree that builds a new
//! output string, never a mutation of the source tree, so there are no
//! iterate-while-replacing hazards.
//!
//! # Conversion rules
//!
//! In precedence order:
//!
//! - **Headings** `h1`-`h6` become ATX headings. In enhanced mode levels
//!   2-6 are annotated with `{#slug}`, followed by a "Back to Top" link,
//!   and recorded as ToC entries in document order.
//! - **Tables** become pipe tables. Header source precedence: `<thead>`
//!   row, then a first row with `<th>` cells, then a first `<td>` row when
//!   at least one body row follows, else a synthesized blank header
//!   matching the body column count. Cell content is recursively converted
//!   and literal `|` characters are escaped.
//! - **Code blocks**: fenced, with language resolved from the record's
//!   preserved `codeLanguages` map (via `data-language-id` markers), then
//!   `language-*` classes on the `<code>` or `<pre>`, then the configured
//!   default. Leading/trailing blank lines and the common indentation
//!   artifact are stripped; interior indentation is verbatim.
//! - **Internal links**: an href resolving (against the record's own URL)
//!   to another record in the batch is rewritten to a local `#slug` anchor
//!   derived from the target's URL path. Everything else passes through.
//! - **List items**: single `* ` marker, continuation lines indented four
//!   spaces, every item starting on its own line.
//!
//! Malformed HTML never raises. html5ever already tolerates broken markup,
//! and every rule that cannot find its expected children degrades to plain
//! converted text.

use markup5ever_rcdom::{Handle, NodeData};
use url::Url;

use crate::parser::parse_html;
use crate::record::PageRecord;
use crate::slug::{path_slug, slugify};
use crate::toc::{TocEntry, TOC_ANCHOR};

/// Batch-wide context a page is rendered against
///
/// Internal-link resolution needs the full set of URLs present in the
/// current batch: a link can only be rewritten to a local anchor when its
/// target is also part of the same artifact.
#[derive(Debug, Clone, Copy)]
pub struct BatchContext<'a> {
    /// Crawl root URL: source of the domain heading and the path prefix
    /// stripped from inter-page slugs
    pub base_url: &'a str,
    /// URLs of every record in the batch, document order
    pub batch_urls: &'a [String],
    /// First page of the batch (gets the domain heading in enhanced mode)
    pub is_first_page: bool,
    /// Enhanced mode: ToC entries, `{#slug}` annotations, back-to-top links
    pub enhanced: bool,
    /// Fallback language for fenced code blocks with no resolvable language
    pub default_code_language: Option<&'a str>,
}

/// Result of normalizing one record
#[derive(Debug)]
pub struct PageMarkdown {
    pub markdown: String,
    pub toc_entries: Vec<TocEntry>,
}

/// Convert one record's HTML to Markdown with batch context
pub fn normalize(record: &PageRecord, ctx: &BatchContext<'_>) -> PageMarkdown {
    PageRenderer::new(record, ctx).render()
}

struct PageRenderer<'a> {
    record: &'a PageRecord,
    ctx: &'a BatchContext<'a>,
    crawl_root: Option<Url>,
    page_url: Option<Url>,
    toc: Vec<TocEntry>,
}

impl<'a> PageRenderer<'a> {
    fn new(record: &'a PageRecord, ctx: &'a BatchContext<'a>) -> Self {
        Self {
            record,
            ctx,
            crawl_root: Url::parse(ctx.base_url).ok(),
            page_url: Url::parse(&record.url).ok(),
            toc: Vec::new(),
        }
    }

    fn render(mut self) -> PageMarkdown {
        let mut out = String::with_capacity(self.record.content.len() / 2);

        if self.ctx.is_first_page && self.ctx.enhanced {
            if let Some(domain) = self.crawl_root.as_ref().and_then(Url::host_str) {
                out.push_str(&format!("# {}\n\n", domain));
            }
        }

        let title = normalize_text(&self.record.title);
        if self.ctx.enhanced {
            let slug = slugify(&title);
            out.push_str(&format!("## {} {{#{}}}\n\n", title, slug));
            out.push_str(&format!("[Back to Top](#{})\n\n", TOC_ANCHOR));
            self.toc.push(TocEntry {
                level: 2,
                text: title,
                slug,
            });
        } else {
            out.push_str(&format!("## {}\n\n", title));
        }

        out.push_str(&format!("URL: {}\n\n", self.record.url));
        if let Some(byline) = self.record.byline.as_deref() {
            if !byline.is_empty() {
                out.push_str(&format!("Author: {}\n\n", byline));
            }
        }

        let dom = parse_html(&self.record.content);
        self.traverse(&dom.document, &mut out);

        let mut markdown = normalize_page(&out);
        markdown.push_str("\n---\n\n");

        PageMarkdown {
            markdown,
            toc_entries: self.toc,
        }
    }

    /// Depth-first traversal building Markdown into `out`
    fn traverse(&mut self, node: &Handle, out: &mut String) {
        match node.data {
            NodeData::Document => {
                for child in node.children.borrow().iter() {
                    self.traverse(child, out);
                }
            }
            NodeData::Element { ref name, .. } => {
                let tag = name.local.as_ref().to_string();
                self.handle_element(node, &tag, out);
            }
            NodeData::Text { ref contents } => {
                let text = contents.borrow();
                let normalized = normalize_text(&text);
                if !normalized.is_empty() {
                    // Re-insert one separating space when the source text had
                    // boundary whitespace that normalization collapsed away
                    if text.starts_with(|c: char| c.is_whitespace())
                        && !out.is_empty()
                        && !out.ends_with(char::is_whitespace)
                    {
                        out.push(' ');
                    }
                    out.push_str(&normalized);
                    if text.ends_with(|c: char| c.is_whitespace()) {
                        out.push(' ');
                    }
                }
            }
            // Comments, doctypes and processing instructions have no
            // Markdown representation
            _ => {}
        }
    }

    fn handle_element(&mut self, node: &Handle, tag: &str, out: &mut String) {
        match tag {
            "h1" => self.handle_heading(node, 1, out),
            "h2" => self.handle_heading(node, 2, out),
            "h3" => self.handle_heading(node, 3, out),
            "h4" => self.handle_heading(node, 4, out),
            "h5" => self.handle_heading(node, 5, out),
            "h6" => self.handle_heading(node, 6, out),

            "p" => self.handle_paragraph(node, out),
            "a" => self.handle_link(node, out),
            "img" => self.handle_image(node, out),

            "ul" | "ol" => self.handle_list(node, out),
            "li" => self.handle_list_item(node, out),

            "pre" => self.handle_code_block(node, out),
            "code" => self.handle_inline_code(node, out),

            "strong" | "b" => self.handle_wrapped(node, "**", out),
            "em" | "i" => self.handle_wrapped(node, "*", out),

            "table" => self.handle_table(node, out),

            "br" => out.push('\n'),

            // Non-content elements and their children are dropped
            "script" | "style" | "noscript" | "template" | "head" => {}

            // Everything else is a container: traverse children
            _ => {
                for child in node.children.borrow().iter() {
                    self.traverse(child, out);
                }
            }
        }
    }

    fn handle_heading(&mut self, node: &Handle, level: usize, out: &mut String) {
        ensure_block_separation(out);

        let mut text = String::new();
        for child in node.children.borrow().iter() {
            self.traverse(child, &mut text);
        }
        let text = normalize_text(&text);

        let marker = "#".repeat(level);
        if self.ctx.enhanced && level >= 2 {
            let slug = slugify(&text);
            out.push_str(&format!("{} {} {{#{}}}\n\n", marker, text, slug));
            out.push_str(&format!("[Back to Top](#{})\n\n", TOC_ANCHOR));
            self.toc.push(TocEntry { level, text, slug });
        } else {
            out.push_str(&format!("{} {}\n\n", marker, text));
        }
    }

    fn handle_paragraph(&mut self, node: &Handle, out: &mut String) {
        ensure_block_separation(out);

        let start_len = out.len();
        for child in node.children.borrow().iter() {
            self.traverse(child, out);
        }
        if out.len() > start_len {
            out.push_str("\n\n");
        }
    }

    fn handle_link(&mut self, node: &Handle, out: &mut String) {
        let href = attr_value(node, "href");

        let mut text = String::new();
        for child in node.children.borrow().iter() {
            self.traverse(child, &mut text);
        }
        let text = clean_link_text(&text);
        if text.is_empty() {
            return;
        }

        let href = match href {
            Some(href) => href,
            None => {
                out.push_str(&text);
                return;
            }
        };
        if !is_safe_url(&href) {
            // Dangerous scheme: render as plain text, no link
            out.push_str(&text);
            return;
        }

        if let Some(target) = self.internal_target(&href) {
            let slug = path_slug(&target, self.crawl_root.as_ref());
            out.push_str(&format!("[{}](#{})", text, slug));
        } else {
            out.push_str(&format!("[{}]({})", text, href));
        }
    }

    /// Resolve an href against the record's own URL; return the absolute
    /// target when it matches another batch URL modulo one trailing slash
    fn internal_target(&self, href: &str) -> Option<Url> {
        let page = self.page_url.as_ref()?;
        let resolved = page.join(href).ok()?;
        let resolved_str = resolved.to_string();
        let resolved_trim = resolved_str.strip_suffix('/').unwrap_or(&resolved_str);

        let matches = self.ctx.batch_urls.iter().any(|url| {
            let url_trim = url.strip_suffix('/').unwrap_or(url);
            url_trim == resolved_trim
        });
        if matches {
            Some(resolved)
        } else {
            None
        }
    }

    fn handle_image(&mut self, node: &Handle, out: &mut String) {
        let src = match attr_value(node, "src") {
            Some(src) => src,
            None => return,
        };
        if !is_safe_url(&src) {
            return;
        }
        let alt = attr_value(node, "alt").unwrap_or_default();
        out.push_str(&format!("![{}]({})", alt, src));
    }

    fn handle_list(&mut self, node: &Handle, out: &mut String) {
        ensure_block_separation(out);

        for child in node.children.borrow().iter() {
            if is_element(child, "li") {
                self.handle_list_item(child, out);
            }
        }

        if !out.ends_with("\n\n") {
            out.push('\n');
        }
    }

    /// One list item: body trimmed of edge newlines, continuation lines
    /// indented four spaces, the whole item on its own line
    fn handle_list_item(&mut self, node: &Handle, out: &mut String) {
        let mut body = String::new();
        for child in node.children.borrow().iter() {
            self.traverse(child, &mut body);
        }
        let body = body.trim().replace('\n', "\n    ");
        out.push_str(&format!("\n* {}\n", body));
    }

    fn handle_code_block(&mut self, node: &Handle, out: &mut String) {
        ensure_block_separation(out);

        let language = self.code_block_language(node);

        // Code content is taken verbatim - no text normalization
        let mut code = String::new();
        extract_code_content(node, &mut code);
        let code = tidy_code_block(&code);

        out.push_str("```");
        if let Some(lang) = language {
            out.push_str(&lang);
        }
        out.push('\n');
        out.push_str(&code);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("```\n\n");
    }

    /// Language resolution precedence for a `<pre>` block:
    /// preserved marker lookup, `<code>` class, `<pre>` class, configured
    /// default, else none
    fn code_block_language(&self, pre: &Handle) -> Option<String> {
        let code_child = find_child_element(pre, "code");

        for carrier in [Some(pre), code_child.as_ref()].into_iter().flatten() {
            if let Some(id) = attr_value(carrier, "data-language-id") {
                if let Some(lang) = self.record.code_languages.get(&id) {
                    return Some(lang.clone());
                }
            }
        }

        if let Some(code) = code_child.as_ref() {
            if let Some(lang) = language_from_class(code) {
                return Some(lang);
            }
        }
        if let Some(lang) = language_from_class(pre) {
            return Some(lang);
        }

        self.ctx.default_code_language.map(str::to_string)
    }

    fn handle_inline_code(&mut self, node: &Handle, out: &mut String) {
        let mut code = String::new();
        extract_code_content(node, &mut code);
        out.push('`');
        out.push_str(&code);
        out.push('`');
    }

    fn handle_wrapped(&mut self, node: &Handle, delimiter: &str, out: &mut String) {
        out.push_str(delimiter);
        for child in node.children.borrow().iter() {
            self.traverse(child, out);
        }
        out.push_str(delimiter);
    }

    fn handle_table(&mut self, node: &Handle, out: &mut String) {
        let mut thead_rows: Vec<Vec<String>> = Vec::new();
        let mut rows: Vec<(bool, Vec<String>)> = Vec::new();

        for child in node.children.borrow().iter() {
            if let NodeData::Element { ref name, .. } = child.data {
                match name.local.as_ref() {
                    "thead" => {
                        for tr in child.children.borrow().iter() {
                            if is_element(tr, "tr") {
                                thead_rows.push(self.extract_row_cells(tr));
                            }
                        }
                    }
                    "tbody" | "tfoot" => {
                        for tr in child.children.borrow().iter() {
                            if is_element(tr, "tr") {
                                rows.push((row_has_th(tr), self.extract_row_cells(tr)));
                            }
                        }
                    }
                    "tr" => {
                        rows.push((row_has_th(child), self.extract_row_cells(child)));
                    }
                    _ => {}
                }
            }
        }

        // Header source precedence: thead row, first row with th cells,
        // first td row when body rows follow, else a synthesized blank
        // header matching the body column count
        let mut blank_header = false;
        let (header, body): (Vec<String>, Vec<Vec<String>>) = if let Some(first) =
            thead_rows.into_iter().next()
        {
            (first, rows.into_iter().map(|(_, cells)| cells).collect())
        } else if !rows.is_empty() && (rows[0].0 || rows.len() >= 2) {
            let mut iter = rows.into_iter();
            let header = iter.next().map(|(_, cells)| cells).unwrap_or_default();
            (header, iter.map(|(_, cells)| cells).collect())
        } else if !rows.is_empty() {
            blank_header = true;
            let cols = rows.iter().map(|(_, cells)| cells.len()).max().unwrap_or(0);
            (
                vec![String::new(); cols],
                rows.into_iter().map(|(_, cells)| cells).collect(),
            )
        } else {
            // No rows at all: nothing to render
            return;
        };

        if header.is_empty() && body.is_empty() {
            return;
        }

        ensure_block_separation(out);

        if blank_header {
            out.push('|');
            for _ in 0..header.len() {
                out.push_str(" |");
            }
            out.push('\n');
        } else {
            out.push_str(&format!("| {} |\n", header.join(" | ")));
        }

        let separator: Vec<&str> = header.iter().map(|_| "---").collect();
        out.push_str(&format!("| {} |\n", separator.join(" | ")));

        for mut cells in body {
            if cells.is_empty() {
                continue;
            }
            // Pad short rows to the header width
            while cells.len() < header.len() {
                cells.push(String::new());
            }
            out.push_str(&format!("| {} |\n", cells.join(" | ")));
        }

        if !out.ends_with("\n\n") {
            out.push('\n');
        }
    }

    /// Cells of one row, each recursively converted, newline-collapsed and
    /// pipe-escaped
    fn extract_row_cells(&mut self, tr: &Handle) -> Vec<String> {
        let mut cells = Vec::new();
        for child in tr.children.borrow().iter() {
            if let NodeData::Element { ref name, .. } = child.data {
                let tag = name.local.as_ref();
                if tag == "td" || tag == "th" {
                    let mut cell = String::new();
                    for cell_child in child.children.borrow().iter() {
                        self.traverse(cell_child, &mut cell);
                    }
                    let flattened = cell
                        .split('\n')
                        .map(str::trim)
                        .filter(|part| !part.is_empty())
                        .collect::<Vec<_>>()
                        .join(" ");
                    cells.push(flattened.replace('|', "\\|"));
                }
            }
        }
        cells
    }
}

/// Ensure a blank-line boundary before starting a new block
fn ensure_block_separation(out: &mut String) {
    if !out.is_empty() && !out.ends_with("\n\n") {
        if out.ends_with('\n') {
            out.push('\n');
        } else {
            out.push_str("\n\n");
        }
    }
}

/// Collapse all whitespace runs to single spaces and trim
fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Link text: collapse whitespace and strip a leading heading artifact
fn clean_link_text(text: &str) -> String {
    normalize_text(text)
        .trim_start_matches('#')
        .trim_start()
        .to_string()
}

/// Reject URL schemes that must never survive into output
fn is_safe_url(url: &str) -> bool {
    let lowered = url.trim().to_lowercase();
    !(lowered.starts_with("javascript:")
        || lowered.starts_with("data:")
        || lowered.starts_with("vbscript:"))
}

/// Extract text verbatim - code must keep whitespace, line breaks and
/// indentation exactly as parsed
fn extract_code_content(node: &Handle, out: &mut String) {
    match node.data {
        NodeData::Text { ref contents } => {
            out.push_str(&contents.borrow());
        }
        NodeData::Element { .. } => {
            for child in node.children.borrow().iter() {
                extract_code_content(child, out);
            }
        }
        _ => {}
    }
}

/// Strip leading/trailing blank lines and the shared leading-space indent
/// (one level of HTML pretty-printing artifact); interior relative
/// indentation survives untouched
fn tidy_code_block(code: &str) -> String {
    let lines: Vec<&str> = code.lines().collect();
    let start = match lines.iter().position(|l| !l.trim().is_empty()) {
        Some(start) => start,
        None => return String::new(),
    };
    let end = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .unwrap_or(start);
    let lines = &lines[start..=end];

    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|l| {
            if l.len() >= indent {
                &l[indent..]
            } else {
                l.trim_start_matches(' ')
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Page-level output normalization: LF line endings, trailing whitespace
/// stripped, consecutive blank lines collapsed outside code fences, single
/// trailing newline
fn normalize_page(raw: &str) -> String {
    let raw = raw.replace("\r\n", "\n");
    let mut result = String::with_capacity(raw.len());
    let mut prev_blank = false;
    let mut in_code_block = false;

    for line in raw.lines() {
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
        }
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            if in_code_block {
                result.push('\n');
            } else if !prev_blank {
                result.push('\n');
                prev_blank = true;
            }
        } else {
            result.push_str(trimmed);
            result.push('\n');
            prev_blank = false;
        }
    }

    while result.ends_with("\n\n") {
        result.pop();
    }
    if !result.ends_with('\n') {
        result.push('\n');
    }
    result
}

/// Does this row carry `<th>` cells (a header row written as markup)?
fn row_has_th(tr: &Handle) -> bool {
    tr.children
        .borrow()
        .iter()
        .any(|child| is_element(child, "th"))
}

fn is_element(node: &Handle, tag: &str) -> bool {
    match node.data {
        NodeData::Element { ref name, .. } => name.local.as_ref() == tag,
        _ => false,
    }
}

fn attr_value(node: &Handle, attr_name: &str) -> Option<String> {
    if let NodeData::Element { ref attrs, .. } = node.data {
        attrs
            .borrow()
            .iter()
            .find(|attr| attr.name.local.as_ref() == attr_name)
            .map(|attr| attr.value.to_string())
    } else {
        None
    }
}

fn find_child_element(node: &Handle, tag: &str) -> Option<Handle> {
    node.children
        .borrow()
        .iter()
        .find(|child| is_element(child, tag))
        .cloned()
}

/// First `language-*` or `lang-*` class on an element
fn language_from_class(node: &Handle) -> Option<String> {
    let class_value = attr_value(node, "class")?;
    for class in class_value.split_whitespace() {
        if let Some(lang) = class.strip_prefix("language-") {
            return Some(lang.to_string());
        }
        if let Some(lang) = class.strip_prefix("lang-") {
            return Some(lang.to_string());
        }
    }
    None
}
