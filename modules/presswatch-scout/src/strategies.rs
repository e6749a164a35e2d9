//! Locating result entries in search-page markup that changes shape over
//! time. Each strategy names one observed markup vocabulary; the chain
//! commits to the first strategy whose container matches anything.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::urls;

pub const UNKNOWN_TITLE: &str = "unknown title";
pub const UNKNOWN_SOURCE: &str = "unknown source";

/// One markup shape: a container selector plus sub-selectors for the
/// fields inside each container.
#[derive(Debug, Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    pub container: &'static str,
    pub title: &'static str,
    pub link: &'static str,
    pub source: &'static str,
    pub time: Option<&'static str>,
}

/// The observed result-page shapes, most specific first.
pub fn default_strategies() -> &'static [Strategy] {
    &[
        Strategy {
            name: "card",
            container: "div.Gx5Zad.xpd",
            title: "div.UFvD1, h3",
            link: "a",
            source: "div.BamJPe, div.XR4uSe",
            time: Some("span.r0bn4c, span.WG9SHc"),
        },
        Strategy {
            name: "story",
            container: "div.SoaBEf, div.NiLAwe, article",
            title: "h3, div[role='heading']",
            link: "a",
            source: ".NUnG9d, .MgUUmf, span",
            time: Some("time, span.WG9SHc"),
        },
        Strategy {
            name: "generic",
            container: "div.g",
            title: "h3",
            link: "a",
            source: "span",
            time: None,
        },
    ]
}

/// A not-yet-validated extraction result, alive only within one keyword
/// pass.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub title: String,
    /// Canonical (de-indirected) destination URL.
    pub url: String,
    pub source: String,
    pub snippet_time: Option<String>,
}

/// Run the strategy chain over a rendered document.
///
/// Strategies are tried in order and the first whose container selector
/// matches at least one element wins outright; results are never merged
/// across strategies. Candidates are deduplicated by canonical URL in
/// first-sighting order and capped at `max`. No strategy matching is an
/// empty result, not an error.
pub fn run_chain(doc: &Html, strategies: &[Strategy], max: usize) -> Vec<Candidate> {
    for strategy in strategies {
        let container = Selector::parse(strategy.container).expect("valid container selector");
        let containers: Vec<ElementRef> = doc.select(&container).collect();
        if containers.is_empty() {
            continue;
        }

        debug!(
            strategy = strategy.name,
            containers = containers.len(),
            "Strategy matched"
        );
        return extract_with(strategy, &containers, max);
    }

    warn!("No extraction strategy matched the document");
    Vec::new()
}

fn extract_with(strategy: &Strategy, containers: &[ElementRef], max: usize) -> Vec<Candidate> {
    let link = Selector::parse(strategy.link).expect("valid link selector");
    let title = Selector::parse(strategy.title).expect("valid title selector");
    let source = Selector::parse(strategy.source).expect("valid source selector");
    let time = strategy
        .time
        .map(|t| Selector::parse(t).expect("valid time selector"));

    let mut seen: HashSet<String> = HashSet::new();
    let mut candidates = Vec::new();

    for container in containers {
        let Some(href) = container
            .select(&link)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            continue;
        };

        let Some(url) = urls::canonicalize(href) else {
            continue;
        };
        if urls::is_search_engine_noise(&url) {
            continue;
        }
        if !seen.insert(url.clone()) {
            continue;
        }

        // A missing sub-field yields a documented placeholder rather than
        // dropping the candidate.
        let title = element_text(container, &title).unwrap_or_else(|| UNKNOWN_TITLE.to_string());
        let source = element_text(container, &source).unwrap_or_else(|| UNKNOWN_SOURCE.to_string());
        let snippet_time = time.as_ref().and_then(|t| element_text(container, t));

        candidates.push(Candidate {
            title,
            url,
            source,
            snippet_time,
        });

        if candidates.len() >= max {
            break;
        }
    }

    candidates
}

fn element_text(container: &ElementRef, selector: &Selector) -> Option<String> {
    let text: String = container.select(selector).next()?.text().collect();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(html: &str, max: usize) -> Vec<Candidate> {
        let doc = Html::parse_document(html);
        run_chain(&doc, default_strategies(), max)
    }

    #[test]
    fn commits_to_first_matching_strategy() {
        let html = r#"
            <html><body>
                <div class="Gx5Zad xpd">
                    <a href="https://first.example/a"></a>
                    <h3>From the card shape</h3>
                    <div class="BamJPe">Card Source</div>
                </div>
                <div class="g">
                    <a href="https://generic.example/b"></a>
                    <h3>From the generic shape</h3>
                </div>
            </body></html>
        "#;
        let candidates = chain(html, 10);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url, "https://first.example/a");
        assert_eq!(candidates[0].title, "From the card shape");
        assert_eq!(candidates[0].source, "Card Source");
    }

    #[test]
    fn falls_through_to_least_specific_strategy() {
        let html = r#"
            <html><body>
                <div class="g">
                    <a href="https://example.com/one"></a>
                    <h3>Only the generic shape matches</h3>
                    <span>Generic Source</span>
                </div>
            </body></html>
        "#;
        let candidates = chain(html, 10);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Only the generic shape matches");
        assert_eq!(candidates[0].source, "Generic Source");
    }

    #[test]
    fn deduplicates_by_canonical_url_preserving_first_sighting() {
        let html = r#"
            <html><body>
                <div class="g"><a href="/url?q=https%3A%2F%2Fexample.com%2Fa"></a><h3>First</h3></div>
                <div class="g"><a href="https://example.com/a"></a><h3>Wrapped duplicate</h3></div>
                <div class="g"><a href="https://example.com/b"></a><h3>Second</h3></div>
            </body></html>
        "#;
        let candidates = chain(html, 10);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].title, "First");
        assert_eq!(candidates[1].title, "Second");
    }

    #[test]
    fn caps_candidates_after_dedup() {
        let mut html = String::from("<html><body>");
        for i in 0..15 {
            html.push_str(&format!(
                r#"<div class="g"><a href="https://example.com/{i}"></a><h3>Story {i}</h3></div>"#
            ));
        }
        html.push_str("</body></html>");

        let candidates = chain(&html, 10);
        assert_eq!(candidates.len(), 10);
        assert_eq!(candidates[0].title, "Story 0");
    }

    #[test]
    fn missing_subfields_use_placeholders() {
        let html = r#"
            <html><body>
                <div class="g"><a href="https://example.com/bare"></a></div>
            </body></html>
        "#;
        let candidates = chain(html, 10);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, UNKNOWN_TITLE);
        assert_eq!(candidates[0].source, UNKNOWN_SOURCE);
        assert!(candidates[0].snippet_time.is_none());
    }

    #[test]
    fn unusable_and_engine_links_are_discarded() {
        let html = r#"
            <html><body>
                <div class="g"><a href="/search?q=page2"></a><h3>Pagination</h3></div>
                <div class="g"><a href="https://maps.google.com/x"></a><h3>Chrome</h3></div>
                <div class="g"><a href="https://example.com/real"></a><h3>Real</h3></div>
            </body></html>
        "#;
        let candidates = chain(html, 10);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Real");
    }

    #[test]
    fn no_strategy_match_yields_empty_result() {
        let html = "<html><body><p>nothing recognizable</p></body></html>";
        assert!(chain(html, 10).is_empty());
    }

    #[test]
    fn snippet_time_is_captured_when_present() {
        let html = r#"
            <html><body>
                <div class="Gx5Zad xpd">
                    <a href="https://example.com/a"></a>
                    <h3>Timed story</h3>
                    <div class="XR4uSe">Source</div>
                    <span class="r0bn4c">3 hours ago</span>
                </div>
            </body></html>
        "#;
        let candidates = chain(html, 10);
        assert_eq!(candidates[0].snippet_time.as_deref(), Some("3 hours ago"));
    }
}
