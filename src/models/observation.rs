use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

use super::Severity;

/// One path sighting fed into the site tree. Either `path` or `url` must be
/// present; everything else is optional and filled in by inference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Observation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

impl Observation {
    pub fn for_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// The tree key for this observation: the explicit path when given,
    /// otherwise the path component of the URL, `/` when empty.
    pub fn node_path(&self) -> Result<String> {
        if let Some(path) = &self.path {
            if !path.is_empty() {
                return Ok(normalize_path(path));
            }
        }
        if let Some(raw) = &self.url {
            let url = Url::parse(raw)
                .map_err(|e| Error::parse(format!("invalid observation url '{}': {}", raw, e)))?;
            let path = url.path();
            return Ok(if path.is_empty() {
                "/".to_string()
            } else {
                path.to_string()
            });
        }
        Err(Error::validation(
            "observation requires either a path or a url",
        ))
    }

    pub fn resolved_severity(&self, node_path: &str) -> Severity {
        Severity::resolve(self.severity, Some(node_path), self.status)
    }

    /// Observation carrying a probe outcome into the tree pipeline.
    pub fn from_probe(result: &super::ProbeResult, ip: Option<&str>) -> Self {
        Self {
            path: None,
            url: Some(result.url.clone()),
            status: (!result.error).then_some(result.status),
            severity: None,
            hidden: false,
            ip: ip.map(str::to_string),
        }
    }
}

/// A bare path may arrive as a full URL; strip it down to its path component
/// and guarantee a leading slash.
fn normalize_path(raw: &str) -> String {
    if let Ok(url) = Url::parse(raw) {
        if url.has_host() {
            let path = url.path();
            return if path.is_empty() {
                "/".to_string()
            } else {
                path.to_string()
            };
        }
    }
    if raw.starts_with('/') {
        raw.to_string()
    } else {
        format!("/{}", raw)
    }
}

/// Parent of a node path: root has none, a single segment hangs off root,
/// deeper paths drop their last segment.
pub fn parent_path(path: &str) -> Option<String> {
    if path == "/" {
        return None;
    }
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) | None => Some("/".to_string()),
        Some(idx) => Some(trimmed[..idx].to_string()),
    }
}
