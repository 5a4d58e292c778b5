use std::collections::HashMap;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Settings shared by both traversal modes. Immutable once a scan starts;
/// owned exclusively by the orchestrator that runs it.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub target_url: String,
    pub headers: HashMap<String, String>,
    pub delay: Duration,
    pub proxy: Option<String>,
}

impl ScanConfig {
    pub fn new(target_url: impl Into<String>) -> Result<Self> {
        let target_url = target_url.into();
        if target_url.trim().is_empty() {
            return Err(Error::configuration("target url must not be empty"));
        }
        Ok(Self {
            target_url: target_url.trim_end_matches('/').to_string(),
            headers: HashMap::new(),
            delay: Duration::from_millis(0),
            proxy: None,
        })
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }
}

/// Crawl-specific bounds on top of [`ScanConfig`].
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub scan: ScanConfig,
    pub max_depth: usize,
    /// Cap on the total number of visited pages.
    pub page_limit: usize,
    pub excluded: Vec<Regex>,
    pub filter: FilterConfig,
}

impl CrawlConfig {
    pub fn new(scan: ScanConfig, max_depth: usize, page_limit: usize) -> Self {
        Self {
            scan,
            max_depth,
            page_limit,
            excluded: Vec::new(),
            filter: FilterConfig::default(),
        }
    }

    pub fn with_filter(mut self, filter: FilterConfig) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_exclusions(mut self, patterns: &[String]) -> Result<Self> {
        let mut excluded = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let re = Regex::new(pattern)
                .map_err(|e| Error::configuration(format!("bad exclusion '{}': {}", pattern, e)))?;
            excluded.push(re);
        }
        self.excluded = excluded;
        Ok(self)
    }

    pub fn is_excluded(&self, url: &str) -> bool {
        self.excluded.iter().any(|re| re.is_match(url))
    }
}

/// Brute-force-specific inputs: the candidate wordlist, an optional path
/// prefix and the result filters.
#[derive(Debug, Clone)]
pub struct BruteConfig {
    pub scan: ScanConfig,
    pub wordlist: Vec<String>,
    pub top_prefix: String,
    pub filter: FilterConfig,
}

impl BruteConfig {
    pub fn new(scan: ScanConfig, wordlist: Vec<String>) -> Result<Self> {
        if wordlist.is_empty() {
            return Err(Error::configuration("wordlist must not be empty"));
        }
        Ok(Self {
            scan,
            wordlist,
            top_prefix: String::new(),
            filter: FilterConfig::default(),
        })
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.top_prefix = prefix.into().trim_matches('/').to_string();
        self
    }

    pub fn with_filter(mut self, filter: FilterConfig) -> Self {
        self.filter = filter;
        self
    }
}

/// Status allow/deny lists plus an optional minimum body length.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    pub allow_status: Vec<u16>,
    pub deny_status: Vec<u16>,
    pub min_length: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_target_rejected() {
        assert!(ScanConfig::new("  ").is_err());
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let cfg = ScanConfig::new("http://example.com/").unwrap();
        assert_eq!(cfg.target_url, "http://example.com");
    }

    #[test]
    fn test_proxy_recorded() {
        let cfg = ScanConfig::new("http://example.com")
            .unwrap()
            .with_proxy("http://127.0.0.1:8080");
        assert_eq!(cfg.proxy.as_deref(), Some("http://127.0.0.1:8080"));
    }

    #[test]
    fn test_empty_wordlist_rejected() {
        let scan = ScanConfig::new("http://example.com").unwrap();
        assert!(BruteConfig::new(scan, vec![]).is_err());
    }

    #[test]
    fn test_exclusion_match() {
        let scan = ScanConfig::new("http://example.com").unwrap();
        let cfg = CrawlConfig::new(scan, 2, 100)
            .with_exclusions(&["/logout".to_string()])
            .unwrap();
        assert!(cfg.is_excluded("http://example.com/logout?next=/"));
        assert!(!cfg.is_excluded("http://example.com/home"));
    }
}
