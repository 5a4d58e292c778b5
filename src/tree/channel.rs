use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::Observation;

use super::builder::{SiteTree, TreeOp};
use super::snapshot::TreeSnapshot;

/// Where the two snapshot documents land. Both files are regenerated
/// wholesale on every successful batch; no incremental diff is persisted.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    visible_path: PathBuf,
    hidden_path: PathBuf,
}

impl SnapshotStore {
    pub fn new(visible_path: impl Into<PathBuf>, hidden_path: impl Into<PathBuf>) -> Self {
        Self {
            visible_path: visible_path.into(),
            hidden_path: hidden_path.into(),
        }
    }

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join("visible_tree.json"), dir.join("hidden_tree.json"))
    }

    pub fn persist(&self, snapshot: &TreeSnapshot) -> Result<()> {
        let visible = serde_json::to_string_pretty(&snapshot.visible)?;
        std::fs::write(&self.visible_path, visible)?;
        let hidden = serde_json::to_string_pretty(&snapshot.hidden)?;
        std::fs::write(&self.hidden_path, hidden)?;
        Ok(())
    }
}

/// Per-batch accounting, including the observations that were skipped.
#[derive(Debug, Default)]
pub struct UpdateReport {
    pub added: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: Vec<String>,
}

impl UpdateReport {
    pub fn mutated(&self) -> bool {
        self.added > 0 || self.updated > 0
    }
}

/// Externally-facing entry point for tree updates. Serializes all access to
/// the tree behind one mutex: the read-then-conditionally-write merge is not
/// safe under interleaved writers.
pub struct TreeService {
    tree: Mutex<SiteTree>,
    store: Option<SnapshotStore>,
}

impl TreeService {
    pub fn new(store: Option<SnapshotStore>) -> Self {
        Self {
            tree: Mutex::new(SiteTree::new()),
            store,
        }
    }

    /// Applies a batch of observations and returns the regenerated snapshot.
    /// A malformed observation is reported in the returned accounting and
    /// skipped; it never aborts the rest of the batch. The snapshot files
    /// are rewritten only when the batch actually mutated the tree.
    pub async fn update(&self, batch: &[Observation]) -> Result<(TreeSnapshot, UpdateReport)> {
        let mut tree = self.tree.lock().await;
        let mut report = UpdateReport::default();

        for obs in batch {
            match tree.process_observation(obs) {
                Ok(TreeOp::Added) => report.added += 1,
                Ok(TreeOp::Updated) => report.updated += 1,
                Ok(TreeOp::Unchanged) => report.unchanged += 1,
                Err(e) => {
                    warn!(error = %e, "skipping malformed observation");
                    report.skipped.push(e.to_string());
                }
            }
        }

        if report.mutated() {
            tree.backfill_urls();
        }
        let snapshot = tree.build_snapshot();

        if report.mutated() {
            if let Some(store) = &self.store {
                store.persist(&snapshot)?;
            }
            info!(
                added = report.added,
                updated = report.updated,
                unchanged = report.unchanged,
                skipped = report.skipped.len(),
                "tree updated"
            );
        }

        Ok((snapshot, report))
    }

    pub async fn snapshot(&self) -> TreeSnapshot {
        self.tree.lock().await.build_snapshot()
    }

    pub async fn node_count(&self) -> usize {
        self.tree.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    #[tokio::test]
    async fn test_batch_with_bad_entry_continues() {
        let service = TreeService::new(None);
        let batch = vec![
            Observation::for_path("/a"),
            Observation::default(), // no path, no url
            Observation::for_path("/b"),
        ];
        let (snapshot, report) = service.update(&batch).await.unwrap();

        assert_eq!(report.added, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(snapshot.node_count(), 3); // root + /a + /b
    }

    #[tokio::test]
    async fn test_noop_batch_reports_unchanged() {
        let service = TreeService::new(None);
        let batch = vec![Observation::for_path("/home").with_severity(Severity::Low)];
        service.update(&batch).await.unwrap();
        let (_, report) = service.update(&batch).await.unwrap();

        assert_eq!(report.added, 0);
        assert_eq!(report.updated, 0);
        assert_eq!(report.unchanged, 1);
        assert!(!report.mutated());
    }

    #[tokio::test]
    async fn test_persisted_artifacts() {
        let dir = std::env::temp_dir().join(format!("webrecon-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let store = SnapshotStore::in_dir(&dir);
        let service = TreeService::new(Some(store));

        let batch = vec![
            Observation::for_path("/a"),
            Observation::for_path("/secret").hidden(),
        ];
        service.update(&batch).await.unwrap();

        let visible: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.join("visible_tree.json")).unwrap())
                .unwrap();
        let hidden: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.join("hidden_tree.json")).unwrap())
                .unwrap();

        assert!(visible.is_array());
        assert_eq!(hidden[0]["name"], "Hidden");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_snapshot_matches_update_result() {
        let service = TreeService::new(None);
        let (from_update, _) = service
            .update(&[Observation::for_path("/x/y")])
            .await
            .unwrap();
        let from_get = service.snapshot().await;
        assert_eq!(from_update.node_count(), from_get.node_count());
        assert_eq!(service.node_count().await, 3);
    }
}
