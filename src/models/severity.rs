use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Unknown,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

impl Severity {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "unknown" => Some(Severity::Unknown),
            _ => None,
        }
    }

    /// Keyword match against a path. Sensitive admin surfaces rank high,
    /// operator dashboards medium. `None` when no keyword matches.
    pub fn from_path_keywords(path: &str) -> Option<Self> {
        let lower = path.to_lowercase();
        const HIGH: [&str; 4] = ["admin", "login", "reset", "root"];
        const MEDIUM: [&str; 3] = ["dashboard", "settings", "config"];

        if HIGH.iter().any(|kw| lower.contains(kw)) {
            Some(Severity::High)
        } else if MEDIUM.iter().any(|kw| lower.contains(kw)) {
            Some(Severity::Medium)
        } else {
            None
        }
    }

    /// Derive a severity from an HTTP status code alone.
    pub fn from_status(status: u16) -> Self {
        match status {
            200 => Severity::High,
            401 | 403 | 405 | 500 | 301 | 302 => Severity::Medium,
            400 | 503 => Severity::Low,
            _ => Severity::Unknown,
        }
    }

    /// Resolution contract: explicit value, then path keywords, then the
    /// status-code map. A plain path with no keyword and no status is low;
    /// with nothing to go on the result is unknown.
    pub fn resolve(explicit: Option<Severity>, path: Option<&str>, status: Option<u16>) -> Self {
        if let Some(sev) = explicit {
            return sev;
        }
        if let Some(sev) = path.and_then(Severity::from_path_keywords) {
            return sev;
        }
        if let Some(code) = status {
            return Severity::from_status(code);
        }
        if path.is_some() {
            Severity::Low
        } else {
            Severity::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_beats_status() {
        let sev = Severity::resolve(None, Some("/admin/users"), Some(404));
        assert_eq!(sev, Severity::High);
    }

    #[test]
    fn test_explicit_wins() {
        let sev = Severity::resolve(Some(Severity::Low), Some("/admin"), Some(200));
        assert_eq!(sev, Severity::Low);
    }

    #[test]
    fn test_status_503_is_low() {
        let sev = Severity::resolve(None, Some("/maintenance"), Some(503));
        assert_eq!(sev, Severity::Low);
    }

    #[test]
    fn test_unmapped_status_is_unknown() {
        assert_eq!(Severity::resolve(None, None, Some(418)), Severity::Unknown);
    }

    #[test]
    fn test_plain_path_defaults_low() {
        assert_eq!(Severity::resolve(None, Some("/about"), None), Severity::Low);
    }

    #[test]
    fn test_dashboard_is_medium() {
        let sev = Severity::resolve(None, Some("/user/dashboard"), None);
        assert_eq!(sev, Severity::Medium);
    }
}
