use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::models::{Observation, Severity, parent_path};

pub const PLACEHOLDER_IP: &str = "0.0.0.0";

/// Authoritative record for one discovered path. Mutable attributes are
/// overwritten by later observations; the path key and children links are
/// not. Nodes are never deleted by the discovery engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub path: String,
    pub name: String,
    pub ip: String,
    pub severity: Severity,
    pub hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl NodeRecord {
    fn placeholder(path: &str) -> Self {
        Self {
            path: path.to_string(),
            name: display_name(path),
            ip: PLACEHOLDER_IP.to_string(),
            severity: Severity::Unknown,
            hidden: false,
            status: None,
            url: None,
            parent: parent_path(path),
        }
    }
}

fn display_name(path: &str) -> String {
    if path == "/" {
        return "/".to_string();
    }
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
        .to_string()
}

/// What one observation did to the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeOp {
    Added,
    Updated,
    Unchanged,
}

/// Flat, path-keyed node store. The hierarchy is derived from the path keys;
/// `BTreeMap` keeps iteration deterministic and parents ahead of their
/// descendants.
#[derive(Debug, Default)]
pub struct SiteTree {
    nodes: BTreeMap<String, NodeRecord>,
}

impl SiteTree {
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&NodeRecord> {
        self.nodes.get(path)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeRecord> {
        self.nodes.values()
    }

    /// Merges one observation. Add when the path is new (creating missing
    /// ancestors with placeholder attributes), update when severity, status
    /// or the hidden flag changed, no-op otherwise.
    pub fn process_observation(&mut self, obs: &Observation) -> Result<TreeOp> {
        let path = obs.node_path()?;
        let severity = obs.resolved_severity(&path);

        if let Some(node) = self.nodes.get_mut(&path) {
            let changed = node.severity != severity
                || (obs.status.is_some() && node.status != obs.status)
                || node.hidden != obs.hidden;
            if !changed {
                return Ok(TreeOp::Unchanged);
            }

            node.severity = severity;
            node.hidden = obs.hidden;
            if obs.status.is_some() {
                node.status = obs.status;
            }
            if let Some(ip) = &obs.ip {
                node.ip = ip.clone();
            }
            if let Some(url) = &obs.url {
                node.url = Some(url.clone());
            }
            debug!(%path, %severity, "updated node");
            return Ok(TreeOp::Updated);
        }

        self.ensure_ancestors(&path);
        let record = NodeRecord {
            path: path.clone(),
            name: display_name(&path),
            ip: obs.ip.clone().unwrap_or_else(|| PLACEHOLDER_IP.to_string()),
            severity,
            hidden: obs.hidden,
            status: obs.status,
            url: obs.url.clone(),
            parent: parent_path(&path),
        };
        debug!(%path, %severity, "added node");
        self.nodes.insert(path, record);
        Ok(TreeOp::Added)
    }

    /// Creates every missing ancestor of `path`, root included, with
    /// placeholder attributes.
    fn ensure_ancestors(&mut self, path: &str) {
        let mut current = parent_path(path);
        while let Some(ancestor) = current {
            let next = parent_path(&ancestor);
            self.nodes
                .entry(ancestor.clone())
                .or_insert_with(|| NodeRecord::placeholder(&ancestor));
            current = next;
        }
    }

    /// Fills in canonical URLs for nodes that were observed without one, by
    /// extending the nearest ancestor's URL with the remaining path suffix.
    /// Run after each batch: ancestors may gain their URL after their
    /// descendants were added.
    pub fn backfill_urls(&mut self) {
        let paths: Vec<String> = self.nodes.keys().cloned().collect();
        for path in paths {
            if self.nodes[&path].url.is_some() {
                continue;
            }
            if let Some(url) = self.infer_url(&path) {
                if let Some(node) = self.nodes.get_mut(&path) {
                    node.url = Some(url);
                }
            }
        }
    }

    fn infer_url(&self, path: &str) -> Option<String> {
        let mut current = parent_path(path);
        while let Some(ancestor) = current {
            if let Some(node) = self.nodes.get(&ancestor) {
                if let Some(base) = &node.url {
                    let suffix = if ancestor == "/" {
                        path
                    } else {
                        &path[ancestor.len()..]
                    };
                    return Some(format!("{}{}", base.trim_end_matches('/'), suffix));
                }
            }
            current = parent_path(&ancestor);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(path: &str, severity: Severity) -> Observation {
        Observation::for_path(path).with_severity(severity)
    }

    #[test]
    fn test_incremental_chain() {
        let mut tree = SiteTree::new();
        assert_eq!(
            tree.process_observation(&obs("/", Severity::High)).unwrap(),
            TreeOp::Added
        );
        assert_eq!(
            tree.process_observation(&obs("/home", Severity::Low))
                .unwrap(),
            TreeOp::Added
        );
        assert_eq!(
            tree.process_observation(&obs("/home/dash", Severity::Medium))
                .unwrap(),
            TreeOp::Added
        );

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.get("/home").unwrap().parent.as_deref(), Some("/"));
        assert_eq!(
            tree.get("/home/dash").unwrap().parent.as_deref(),
            Some("/home")
        );
    }

    #[test]
    fn test_identical_resubmission_is_noop() {
        let mut tree = SiteTree::new();
        tree.process_observation(&obs("/home", Severity::Low))
            .unwrap();
        assert_eq!(
            tree.process_observation(&obs("/home", Severity::Low))
                .unwrap(),
            TreeOp::Unchanged
        );
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_severity_change_updates_in_place() {
        let mut tree = SiteTree::new();
        tree.process_observation(&obs("/home", Severity::Low))
            .unwrap();
        assert_eq!(
            tree.process_observation(&obs("/home", Severity::High))
                .unwrap(),
            TreeOp::Updated
        );
        assert_eq!(tree.get("/home").unwrap().severity, Severity::High);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_missing_ancestors_created_as_placeholders() {
        let mut tree = SiteTree::new();
        tree.process_observation(&obs("/a/b/c", Severity::Low))
            .unwrap();

        assert_eq!(tree.len(), 4);
        let b = tree.get("/a/b").unwrap();
        assert_eq!(b.severity, Severity::Unknown);
        assert_eq!(b.ip, PLACEHOLDER_IP);
        assert!(tree.get("/").is_some());
    }

    #[test]
    fn test_status_only_observation_severity() {
        let mut tree = SiteTree::new();
        let o = Observation::for_path("/maintenance").with_status(503);
        tree.process_observation(&o).unwrap();
        assert_eq!(tree.get("/maintenance").unwrap().severity, Severity::Low);
    }

    #[test]
    fn test_hidden_flag_change_is_update() {
        let mut tree = SiteTree::new();
        tree.process_observation(&Observation::for_path("/x")).unwrap();
        assert_eq!(
            tree.process_observation(&Observation::for_path("/x").hidden())
                .unwrap(),
            TreeOp::Updated
        );
        assert!(tree.get("/x").unwrap().hidden);
    }

    #[test]
    fn test_url_backfill_from_ancestor() {
        let mut tree = SiteTree::new();
        let root = Observation::for_url("http://example.com/");
        tree.process_observation(&root).unwrap();
        tree.process_observation(&Observation::for_path("/a/b"))
            .unwrap();
        tree.backfill_urls();

        assert_eq!(
            tree.get("/a/b").unwrap().url.as_deref(),
            Some("http://example.com/a/b")
        );
        // Placeholder ancestor picked it up too.
        assert_eq!(
            tree.get("/a").unwrap().url.as_deref(),
            Some("http://example.com/a")
        );
    }

    #[test]
    fn test_backfill_without_any_known_url() {
        let mut tree = SiteTree::new();
        tree.process_observation(&Observation::for_path("/a/b"))
            .unwrap();
        tree.backfill_urls();
        assert!(tree.get("/a/b").unwrap().url.is_none());
    }

    #[test]
    fn test_observation_without_path_or_url_rejected() {
        let mut tree = SiteTree::new();
        assert!(tree.process_observation(&Observation::default()).is_err());
        assert!(tree.is_empty());
    }
}
