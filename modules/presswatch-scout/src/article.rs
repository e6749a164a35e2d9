//! Deep-fetching a candidate's destination page: best-effort body text and
//! publication timestamp.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};

use crate::dates;
use crate::renderer::PageRenderer;
use crate::strategies::Candidate;

/// Paragraphs shorter than this are boilerplate (bylines, captions, nav).
const MIN_PARAGRAPH_CHARS: usize = 50;
/// Below this total the paragraph policy failed; fall back to page text.
const MIN_BODY_CHARS: usize = 100;
/// Stored bodies are bounded for storage and downstream model input.
const MAX_BODY_CHARS: usize = 4000;

#[derive(Debug, Clone)]
pub struct ArticleContent {
    /// May be empty when the page had no usable text at all; the caller
    /// falls back to the candidate title.
    pub body: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Fetches one article page per call through the rendering capability.
/// Each fetch is scoped: the renderer's per-page resources are released on
/// every exit path before the next candidate starts.
pub struct ArticleFetcher {
    renderer: Arc<dyn PageRenderer>,
    timeout: Duration,
}

impl ArticleFetcher {
    pub fn new(renderer: Arc<dyn PageRenderer>, timeout: Duration) -> Self {
        Self { renderer, timeout }
    }

    pub async fn fetch(&self, candidate: &Candidate, now: DateTime<Utc>) -> Result<ArticleContent> {
        let html = self
            .renderer
            .render(&candidate.url, self.timeout)
            .await
            .with_context(|| format!("Failed to fetch article {}", candidate.url))?;

        let doc = Html::parse_document(&html);
        let body = extract_body(&doc);
        let published_at = extract_published_at(&doc, candidate.snippet_time.as_deref(), now);

        Ok(ArticleContent { body, published_at })
    }
}

/// Body extraction policy: substantial paragraphs concatenated, whole-page
/// text when that comes up short, truncated to the storage bound.
pub fn extract_body(doc: &Html) -> String {
    let paragraph = Selector::parse("p").expect("valid selector");

    let mut body = String::new();
    for p in doc.select(&paragraph) {
        let text: String = p.text().collect();
        let text = text.trim();
        if text.chars().count() > MIN_PARAGRAPH_CHARS {
            body.push_str(text);
            body.push_str("\n\n");
        }
    }

    if body.chars().count() < MIN_BODY_CHARS {
        body = visible_text(doc);
    }

    truncate_chars(body, MAX_BODY_CHARS)
}

/// Publication-date extraction in strict priority order; first success
/// wins, total failure is a normal outcome.
pub fn extract_published_at(
    doc: &Html,
    snippet_time: Option<&str>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    // 1. Structured meta tags.
    const META_SELECTORS: &[&str] = &[
        r#"meta[property="article:published_time"]"#,
        r#"meta[itemprop="datePublished"]"#,
        r#"meta[name="publish-date"]"#,
        r#"meta[name="date"]"#,
    ];
    for selector in META_SELECTORS {
        let selector = Selector::parse(selector).expect("valid selector");
        if let Some(date) = doc
            .select(&selector)
            .next()
            .and_then(|el| el.value().attr("content"))
            .and_then(dates::parse_machine_date)
        {
            return Some(date);
        }
    }

    // 2. A <time> element's machine-readable attribute.
    let time = Selector::parse("time[datetime]").expect("valid selector");
    if let Some(date) = doc
        .select(&time)
        .next()
        .and_then(|el| el.value().attr("datetime"))
        .and_then(dates::parse_machine_date)
    {
        return Some(date);
    }

    // 3. Embedded linked-data blocks.
    let ld = Selector::parse(r#"script[type="application/ld+json"]"#).expect("valid selector");
    for block in doc.select(&ld) {
        let raw: String = block.text().collect();
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&raw) else {
            continue;
        };
        if let Some(date) = linked_data_published(&value) {
            return Some(date);
        }
    }

    // 4. The snippet-relative date captured during extraction.
    snippet_time.and_then(|s| dates::snippet_timestamp(s, now))
}

/// Pull `datePublished` out of a linked-data value: a single object, an
/// array of objects, or a `@graph` of objects.
fn linked_data_published(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::Object(map) => {
            if let Some(date) = map
                .get("datePublished")
                .and_then(|d| d.as_str())
                .and_then(dates::parse_machine_date)
            {
                return Some(date);
            }
            map.get("@graph").and_then(linked_data_published)
        }
        serde_json::Value::Array(items) => items.iter().find_map(linked_data_published),
        _ => None,
    }
}

/// Whole-page text with script/style subtrees excluded, whitespace
/// collapsed.
fn visible_text(doc: &Html) -> String {
    let body = Selector::parse("body").expect("valid selector");
    let Some(root) = doc.select(&body).next() else {
        return String::new();
    };

    let mut out = String::new();
    let mut stack = vec![*root];
    while let Some(node) = stack.pop() {
        if let Some(text) = node.value().as_text() {
            out.push_str(text);
            out.push(' ');
            continue;
        }
        if let Some(el) = node.value().as_element() {
            if matches!(el.name(), "script" | "style" | "noscript" | "template") {
                continue;
            }
        }
        let children: Vec<_> = node.children().collect();
        for child in children.into_iter().rev() {
            stack.push(child);
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(mut s: String, max: usize) -> String {
    if let Some((index, _)) = s.char_indices().nth(max) {
        s.truncate(index);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    const LONG_PARAGRAPH: &str = "This paragraph carries the actual reporting and runs well past \
         the fifty character threshold, with enough detail to clear the body minimum too.";

    #[test]
    fn keeps_only_substantial_paragraphs() {
        let html = format!(
            r#"<html><body>
                <p>Short byline.</p>
                <p>Menu</p>
                <p>Cookie note.</p>
                <p>{LONG_PARAGRAPH}</p>
            </body></html>"#
        );
        let doc = Html::parse_document(&html);
        assert_eq!(extract_body(&doc), format!("{LONG_PARAGRAPH}\n\n"));
    }

    #[test]
    fn falls_back_to_page_text_when_paragraphs_come_up_short() {
        let html = r#"<html><body>
            <script>var tracking = true;</script>
            <h1>Headline</h1>
            <p>Tiny.</p>
            <div>Some context outside paragraphs.</div>
        </body></html>"#;
        let doc = Html::parse_document(html);
        let body = extract_body(&doc);
        assert!(body.contains("Headline"));
        assert!(body.contains("Some context outside paragraphs."));
        assert!(!body.contains("tracking"));
    }

    #[test]
    fn body_is_bounded() {
        let filler = "x".repeat(300);
        let mut html = String::from("<html><body>");
        for _ in 0..20 {
            html.push_str(&format!("<p>{filler}</p>"));
        }
        html.push_str("</body></html>");
        let doc = Html::parse_document(&html);
        assert_eq!(extract_body(&doc).chars().count(), 4000);
    }

    #[test]
    fn meta_tag_beats_time_element_and_linked_data() {
        let html = r#"<html><head>
            <meta property="article:published_time" content="2025-06-10T09:00:00Z">
            <script type="application/ld+json">{"datePublished":"2025-01-01T00:00:00Z"}</script>
        </head><body>
            <time datetime="2025-02-02T00:00:00Z">February</time>
        </body></html>"#;
        let doc = Html::parse_document(html);
        assert_eq!(
            extract_published_at(&doc, None, reference()),
            Some(Utc.with_ymd_and_hms(2025, 6, 10, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn time_element_is_second_priority() {
        let html = r#"<html><body><time datetime="2025-06-11T10:30:00Z">Yesterday</time></body></html>"#;
        let doc = Html::parse_document(html);
        assert_eq!(
            extract_published_at(&doc, Some("3 hours ago"), reference()),
            Some(Utc.with_ymd_and_hms(2025, 6, 11, 10, 30, 0).unwrap())
        );
    }

    #[test]
    fn linked_data_single_object_and_graph_shapes() {
        let single = r#"<html><head><script type="application/ld+json">
            {"@type":"NewsArticle","datePublished":"2025-06-12T07:00:00Z"}
        </script></head><body></body></html>"#;
        let doc = Html::parse_document(single);
        assert_eq!(
            extract_published_at(&doc, None, reference()),
            Some(Utc.with_ymd_and_hms(2025, 6, 12, 7, 0, 0).unwrap())
        );

        let graph = r#"<html><head><script type="application/ld+json">
            {"@graph":[{"@type":"WebPage"},{"@type":"NewsArticle","datePublished":"2025-06-13T07:00:00Z"}]}
        </script></head><body></body></html>"#;
        let doc = Html::parse_document(graph);
        assert_eq!(
            extract_published_at(&doc, None, reference()),
            Some(Utc.with_ymd_and_hms(2025, 6, 13, 7, 0, 0).unwrap())
        );
    }

    #[test]
    fn snippet_relative_date_is_last_resort() {
        let html = "<html><body><p>No dates anywhere.</p></body></html>";
        let doc = Html::parse_document(html);
        let now = reference();
        assert_eq!(
            extract_published_at(&doc, Some("2 days ago"), now),
            Some(now - chrono::Duration::days(2))
        );
        assert_eq!(extract_published_at(&doc, None, now), None);
        assert_eq!(extract_published_at(&doc, Some("recently"), now), None);
    }

    #[test]
    fn malformed_linked_data_is_swallowed() {
        let html = r#"<html><head>
            <script type="application/ld+json">{not json at all</script>
        </head><body></body></html>"#;
        let doc = Html::parse_document(html);
        assert_eq!(extract_published_at(&doc, None, reference()), None);
    }
}
