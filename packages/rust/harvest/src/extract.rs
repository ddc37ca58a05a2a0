//! HTML text extraction for harvested pages.
//!
//! Drops boilerplate elements (script, style, nav, footer, header), collapses
//! whitespace, and caps the extracted text so downstream scoring sees a
//! bounded, mostly-content excerpt of the page.

use std::sync::OnceLock;

use regex::Regex;
use ego_tree::NodeRef;
use scraper::{Html, Node, Selector};

use prospector_shared::TEXT_CAP;

/// Elements whose subtrees carry no scoreable content.
const SKIPPED_ELEMENTS: [&str; 6] = ["script", "style", "nav", "footer", "header", "noscript"];

/// Title and body text extracted from one HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    /// `<title>` text, when present and non-empty.
    pub title: Option<String>,
    /// Whitespace-collapsed body text, capped at [`TEXT_CAP`] chars.
    pub text: String,
}

/// Extract the title and capped body text from an HTML document.
pub fn extract_page(html: &str) -> ExtractedPage {
    let doc = Html::parse_document(html);

    let title_sel = Selector::parse("title").expect("static selector");
    let title = doc
        .select(&title_sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let mut raw = String::new();
    collect_text(doc.tree.root(), &mut raw);

    ExtractedPage {
        title,
        text: truncate_chars(&collapse_whitespace(&raw), TEXT_CAP),
    }
}

/// Collect text nodes depth-first, skipping boilerplate subtrees.
fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Element(el) => {
                if SKIPPED_ELEMENTS.contains(&el.name()) {
                    continue;
                }
                collect_text(child, out);
            }
            Node::Text(text) => {
                out.push_str(&text);
                out.push(' ');
            }
            _ => {}
        }
    }
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    static WS: OnceLock<Regex> = OnceLock::new();
    let ws = WS.get_or_init(|| Regex::new(r"\s+").expect("static regex"));
    ws.replace_all(text, " ").trim().to_string()
}

/// Truncate to at most `max` characters, respecting char boundaries.
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_title_and_body_text() {
        let html = r#"<html>
            <head><title>  Acme — Document Intelligence  </title></head>
            <body><main><h1>Acme</h1><p>We digitize paper archives.</p></main></body>
        </html>"#;

        let page = extract_page(html);
        assert_eq!(page.title.as_deref(), Some("Acme — Document Intelligence"));
        assert!(page.text.contains("We digitize paper archives."));
    }

    #[test]
    fn strips_boilerplate_elements() {
        let html = r#"<html><body>
            <header>Site header</header>
            <nav>Home | About</nav>
            <script>var tracking = "beacon";</script>
            <style>.hero { color: red; }</style>
            <main><p>Actual page content.</p></main>
            <footer>© 2025 Acme</footer>
        </body></html>"#;

        let page = extract_page(html);
        assert!(page.text.contains("Actual page content."));
        assert!(!page.text.contains("Site header"));
        assert!(!page.text.contains("Home | About"));
        assert!(!page.text.contains("beacon"));
        assert!(!page.text.contains("color: red"));
        assert!(!page.text.contains("© 2025"));
    }

    #[test]
    fn missing_title_is_none() {
        let page = extract_page("<html><body><p>No title here.</p></body></html>");
        assert!(page.title.is_none());
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(
            collapse_whitespace("  OCR \n\n scanning\t\t  capture  "),
            "OCR scanning capture"
        );
    }

    #[test]
    fn caps_extracted_text_length() {
        let long_paragraph = "word ".repeat(2000);
        let html = format!("<html><body><p>{long_paragraph}</p></body></html>");

        let page = extract_page(&html);
        assert_eq!(page.text.chars().count(), TEXT_CAP);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "é".repeat(10);
        assert_eq!(truncate_chars(&text, 4), "éééé");
        assert_eq!(truncate_chars("short", 100), "short");
    }
}
