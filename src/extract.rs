use scraper::{Html, Selector};
use url::Url;

/// Pulls outbound links from a fetched page for the crawler to recurse into.
/// Malformed documents degrade to an empty or partial link list; extraction
/// never fails a crawl.
pub struct LinkExtractor {
    anchor: Selector,
}

impl LinkExtractor {
    pub fn new() -> Self {
        Self {
            // Static selector, cannot fail to parse.
            anchor: Selector::parse("a[href]").expect("valid selector"),
        }
    }

    /// Absolute URLs of every `<a href>` in `html`, resolved against
    /// `base_url`. Fragment-only and unparseable hrefs are dropped.
    pub fn extract_links(&self, html: &str, base_url: &str) -> Vec<String> {
        let Ok(base) = Url::parse(base_url) else {
            return Vec::new();
        };

        let document = Html::parse_document(html);
        let mut links = Vec::new();

        for element in document.select(&self.anchor) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if href.is_empty() || href.starts_with('#') {
                continue;
            }
            if let Ok(absolute) = base.join(href) {
                let mut url = absolute;
                url.set_fragment(None);
                links.push(url.to_string());
            }
        }

        links
    }

    pub fn page_title(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let selector = Selector::parse("title").expect("valid selector");
        document
            .select(&selector)
            .next()
            .map(|t| t.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_links_resolved() {
        let html = r#"<html><body><a href="/about">About</a><a href="contact">C</a></body></html>"#;
        let links = LinkExtractor::new().extract_links(html, "http://example.com/home/");
        assert_eq!(
            links,
            vec![
                "http://example.com/about".to_string(),
                "http://example.com/home/contact".to_string(),
            ]
        );
    }

    #[test]
    fn test_fragments_dropped() {
        let html = r##"<a href="#section">jump</a><a href="/page#top">page</a>"##;
        let links = LinkExtractor::new().extract_links(html, "http://example.com");
        assert_eq!(links, vec!["http://example.com/page".to_string()]);
    }

    #[test]
    fn test_malformed_base_yields_empty() {
        let links = LinkExtractor::new().extract_links("<a href=\"/x\">x</a>", "not a url");
        assert!(links.is_empty());
    }

    #[test]
    fn test_title() {
        let html = "<html><head><title> Home </title></head></html>";
        assert_eq!(
            LinkExtractor::new().page_title(html),
            Some("Home".to_string())
        );
    }
}
