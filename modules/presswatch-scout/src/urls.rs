//! Canonicalization of links as they appear in search-result markup.

use url::Url;

/// Strip a search-engine indirection wrapper from a raw link.
///
/// Wrapped links carry the real destination in a `url` or `q` query
/// parameter; `url` wins when both are present. A wrapper with neither
/// parameter, or with an unparseable query string, passes through
/// unchanged. Links that are neither wrappers nor absolute http(s) URLs
/// are unusable and yield `None`.
pub fn canonicalize(raw: &str) -> Option<String> {
    if raw.contains("/url?") {
        return Some(unwrap_indirection(raw));
    }
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return Some(raw.to_string());
    }
    None
}

/// Wrapped destinations on the search engine's own domain are navigation
/// chrome, not results.
pub fn is_search_engine_noise(url: &str) -> bool {
    url.contains("google.com")
}

fn unwrap_indirection(raw: &str) -> String {
    // Wrapper links are usually root-relative ("/url?q=..."); resolve
    // against the search origin so the query string parses either way.
    let parsed = Url::parse(raw).or_else(|_| {
        Url::parse("https://www.google.com")
            .expect("valid base URL")
            .join(raw)
    });

    let parsed = match parsed {
        Ok(u) => u,
        Err(_) => return raw.to_string(),
    };

    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    for wanted in ["url", "q"] {
        if let Some((_, destination)) = pairs.iter().find(|(k, _)| k == wanted) {
            return destination.clone();
        }
    }

    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_q_parameter() {
        let raw = "/url?q=https%3A%2F%2Fexample.com%2Fa&sa=U&ved=abc";
        assert_eq!(canonicalize(raw).as_deref(), Some("https://example.com/a"));
    }

    #[test]
    fn prefers_url_parameter_over_q() {
        let raw = "/url?q=https%3A%2F%2Fwrong.example%2F&url=https%3A%2F%2Fright.example%2Fstory";
        assert_eq!(canonicalize(raw).as_deref(), Some("https://right.example/story"));
    }

    #[test]
    fn wrapper_without_known_parameter_passes_through() {
        let raw = "/url?sa=U&ved=abc";
        assert_eq!(canonicalize(raw).as_deref(), Some(raw));
    }

    #[test]
    fn absolute_urls_pass_through_unchanged() {
        let raw = "https://example.com/story?id=7";
        assert_eq!(canonicalize(raw).as_deref(), Some(raw));
    }

    #[test]
    fn relative_and_non_http_links_are_unusable() {
        assert_eq!(canonicalize("/search?q=next+page"), None);
        assert_eq!(canonicalize("mailto:tips@example.com"), None);
        assert_eq!(canonicalize("#fragment"), None);
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let raw = "/url?q=https%3A%2F%2Fexample.com%2Fa&sa=U";
        let once = canonicalize(raw).unwrap();
        let twice = canonicalize(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn engine_domain_destinations_are_noise() {
        assert!(is_search_engine_noise("https://maps.google.com/place/x"));
        assert!(!is_search_engine_noise("https://example.com/a"));
    }
}
