use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Severity, parent_path};

use super::builder::{NodeRecord, PLACEHOLDER_IP, SiteTree};

pub const HIDDEN_ROOT_PATH: &str = "Hidden";

/// One node of the exported tree, children nested in path order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub path: String,
    pub name: String,
    pub ip: String,
    pub severity: Severity,
    pub hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub children: Vec<SnapshotNode>,
}

impl SnapshotNode {
    fn from_record(record: &NodeRecord) -> Self {
        Self {
            path: record.path.clone(),
            name: record.name.clone(),
            ip: record.ip.clone(),
            severity: record.severity,
            hidden: record.hidden,
            status: record.status,
            url: record.url.clone(),
            children: Vec::new(),
        }
    }

    fn synthetic_hidden_root() -> Self {
        Self {
            path: HIDDEN_ROOT_PATH.to_string(),
            name: HIDDEN_ROOT_PATH.to_string(),
            ip: PLACEHOLDER_IP.to_string(),
            severity: Severity::Unknown,
            hidden: true,
            status: None,
            url: None,
            children: Vec::new(),
        }
    }

    /// Nodes in this subtree, the synthetic root excluded.
    pub fn node_count(&self) -> usize {
        let own = usize::from(self.path != HIDDEN_ROOT_PATH);
        own + self.children.iter().map(SnapshotNode::node_count).sum::<usize>()
    }
}

/// The exported pair: a visible forest and a hidden forest. Every node of
/// the source tree appears in exactly one of the two.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeSnapshot {
    pub visible: Vec<SnapshotNode>,
    pub hidden: Vec<SnapshotNode>,
}

impl TreeSnapshot {
    pub fn node_count(&self) -> usize {
        self.visible
            .iter()
            .chain(self.hidden.iter())
            .map(SnapshotNode::node_count)
            .sum()
    }
}

impl SiteTree {
    /// Partitions the node set into the visible and hidden forests.
    ///
    /// Hidden nodes hang off their nearest hidden ancestor, or off a single
    /// synthetic `Hidden` root when none exists. Visible nodes hang off
    /// their parent when it is present and visible; otherwise they become
    /// roots of the visible forest, so a missing ancestor can never reject
    /// the snapshot.
    pub fn build_snapshot(&self) -> TreeSnapshot {
        // parent path -> child paths, in deterministic path order.
        let mut visible_children: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut hidden_children: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut visible_roots: Vec<String> = Vec::new();
        let mut hidden_orphans: Vec<String> = Vec::new();

        for record in self.nodes() {
            if record.hidden {
                match self.nearest_hidden_ancestor(&record.path) {
                    Some(ancestor) => hidden_children
                        .entry(ancestor)
                        .or_default()
                        .push(record.path.clone()),
                    None => hidden_orphans.push(record.path.clone()),
                }
            } else {
                let attached = record
                    .parent
                    .as_ref()
                    .and_then(|p| self.get(p))
                    .is_some_and(|parent| !parent.hidden);
                if attached {
                    visible_children
                        .entry(record.parent.clone().expect("checked above"))
                        .or_default()
                        .push(record.path.clone());
                } else {
                    visible_roots.push(record.path.clone());
                }
            }
        }

        let visible = visible_roots
            .iter()
            .map(|path| self.assemble(path, &visible_children, &hidden_children))
            .collect();

        let hidden = if hidden_orphans.is_empty() {
            Vec::new()
        } else {
            let mut root = SnapshotNode::synthetic_hidden_root();
            root.children = hidden_orphans
                .iter()
                .map(|path| self.assemble(path, &visible_children, &hidden_children))
                .collect();
            vec![root]
        };

        TreeSnapshot { visible, hidden }
    }

    fn assemble(
        &self,
        path: &str,
        visible_children: &BTreeMap<String, Vec<String>>,
        hidden_children: &BTreeMap<String, Vec<String>>,
    ) -> SnapshotNode {
        let record = self.get(path).expect("node present");
        let mut node = SnapshotNode::from_record(record);

        let children = if record.hidden {
            hidden_children.get(path)
        } else {
            visible_children.get(path)
        };
        if let Some(child_paths) = children {
            node.children = child_paths
                .iter()
                .map(|child| self.assemble(child, visible_children, hidden_children))
                .collect();
        }
        node
    }

    /// Walks the parent chain looking for the closest hidden node.
    fn nearest_hidden_ancestor(&self, path: &str) -> Option<String> {
        let mut current = parent_path(path);
        while let Some(ancestor) = current {
            if let Some(node) = self.get(&ancestor) {
                if node.hidden {
                    return Some(ancestor);
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
    use crate::models::Observation;

    fn tree_with(observations: &[Observation]) -> SiteTree {
        let mut tree = SiteTree::new();
        for obs in observations {
            tree.process_observation(obs).unwrap();
        }
        tree
    }

    #[test]
    fn test_nested_visible_tree() {
        let tree = tree_with(&[
            Observation::for_path("/").with_severity(Severity::High),
            Observation::for_path("/home").with_severity(Severity::Low),
            Observation::for_path("/home/dash").with_severity(Severity::Medium),
        ]);
        let snapshot = tree.build_snapshot();

        assert!(snapshot.hidden.is_empty());
        assert_eq!(snapshot.visible.len(), 1);
        let root = &snapshot.visible[0];
        assert_eq!(root.path, "/");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].path, "/home");
        assert_eq!(root.children[0].children[0].path, "/home/dash");
    }

    #[test]
    fn test_partition_is_exhaustive_and_disjoint() {
        let tree = tree_with(&[
            Observation::for_path("/a"),
            Observation::for_path("/a/b").hidden(),
            Observation::for_path("/a/b/c").hidden(),
            Observation::for_path("/d"),
        ]);
        let snapshot = tree.build_snapshot();

        // /, /a, /a/b, /a/b/c, /d
        assert_eq!(tree.len(), 5);
        assert_eq!(snapshot.node_count(), 5);
    }

    #[test]
    fn test_hidden_orphan_attaches_to_synthetic_root() {
        let tree = tree_with(&[Observation::for_path("/services/ai/nlp").hidden()]);
        let snapshot = tree.build_snapshot();

        assert_eq!(snapshot.hidden.len(), 1);
        let hidden_root = &snapshot.hidden[0];
        assert_eq!(hidden_root.path, HIDDEN_ROOT_PATH);
        assert_eq!(hidden_root.children.len(), 1);
        assert_eq!(hidden_root.children[0].path, "/services/ai/nlp");
        assert!(hidden_root.children[0].children.is_empty());
    }

    #[test]
    fn test_nested_hidden_under_hidden_ancestor() {
        let tree = tree_with(&[
            Observation::for_path("/secret").hidden(),
            Observation::for_path("/secret/inner").hidden(),
        ]);
        let snapshot = tree.build_snapshot();

        let hidden_root = &snapshot.hidden[0];
        assert_eq!(hidden_root.children.len(), 1);
        let secret = &hidden_root.children[0];
        assert_eq!(secret.path, "/secret");
        assert_eq!(secret.children[0].path, "/secret/inner");
    }

    #[test]
    fn test_no_synthetic_root_without_hidden_nodes() {
        let tree = tree_with(&[Observation::for_path("/a")]);
        let snapshot = tree.build_snapshot();
        assert!(snapshot.hidden.is_empty());
    }

    #[test]
    fn test_visible_child_of_hidden_parent_falls_back_to_root() {
        let tree = tree_with(&[
            Observation::for_path("/secret").hidden(),
            Observation::for_path("/secret/public"),
        ]);
        let snapshot = tree.build_snapshot();

        let visible_paths: Vec<&str> = snapshot.visible.iter().map(|n| n.path.as_str()).collect();
        assert!(visible_paths.contains(&"/secret/public"));
        assert_eq!(snapshot.node_count(), tree.len());
    }

    #[test]
    fn test_empty_tree_snapshot() {
        let snapshot = SiteTree::new().build_snapshot();
        assert!(snapshot.visible.is_empty());
        assert!(snapshot.hidden.is_empty());
        assert_eq!(snapshot.node_count(), 0);
    }
}
