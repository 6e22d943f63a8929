//! HTML5 parsing using html5ever
//!
//! Record content arrives as a UTF-8 `String` straight out of serde_json,
//! so parsing needs no charset handling: the string goes directly into
//! html5ever, which implements the WHATWG parsing algorithm and absorbs
//! malformed markup the same way a browser does. Unclosed tags, misnested
//! inline elements and fragments without `<html>`/`<body>` all produce a
//! usable tree, which is why conversion downstream never has a parse
//! failure to report.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::RcDom;

/// Parse an HTML fragment or document into a DOM tree
///
/// Never fails: html5ever recovers from any malformed input, and an empty
/// string parses to an empty document.
pub fn parse_html(html: &str) -> RcDom {
    parse_document(RcDom::default(), Default::default()).one(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use markup5ever_rcdom::NodeData;

    fn text_of(dom: &RcDom) -> String {
        fn walk(node: &markup5ever_rcdom::Handle, out: &mut String) {
            if let NodeData::Text { ref contents } = node.data {
                out.push_str(&contents.borrow());
            }
            for child in node.children.borrow().iter() {
                walk(child, out);
            }
        }
        let mut out = String::new();
        walk(&dom.document, &mut out);
        out
    }

    #[test]
    fn test_parse_simple_fragment() {
        let dom = parse_html("<div><p>Content</p></div>");
        assert!(text_of(&dom).contains("Content"));
    }

    #[test]
    fn test_parse_malformed_html() {
        // Missing closing tags must not panic or lose the text
        let dom = parse_html("<html><body><h1>Hello");
        assert!(text_of(&dom).contains("Hello"));
    }

    #[test]
    fn test_parse_misnested_tags() {
        let dom = parse_html("<b><i>text</b></i>");
        assert!(text_of(&dom).contains("text"));
    }

    #[test]
    fn test_parse_empty_input() {
        let dom = parse_html("");
        assert_eq!(text_of(&dom), "");
    }

    #[test]
    fn test_parse_entities_decode() {
        let dom = parse_html("<p>&lt;tag&gt; &amp; &quot;quotes&quot;</p>");
        assert!(text_of(&dom).contains("<tag> & \"quotes\""));
    }
}
