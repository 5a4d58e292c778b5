use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{Error, Result};

use super::control::ScanControl;

/// One registered scan task: its control handle plus the join handle of the
/// tokio task driving it.
#[derive(Debug)]
pub struct JobEntry {
    pub id: String,
    pub control: ScanControl,
    pub handle: JoinHandle<()>,
    pub created_at: DateTime<Utc>,
}

impl JobEntry {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Scoped registry of running scans, keyed by caller-chosen job id. Owned by
/// the orchestrating layer; concurrent scans register here but never share
/// scan state with each other.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: HashMap<String, JobEntry>,
}

impl JobStore {
    pub fn new() -> Self {
        Self {
            jobs: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        id: impl Into<String>,
        control: ScanControl,
        handle: JoinHandle<()>,
    ) -> Result<()> {
        let id = id.into();
        if self.jobs.contains_key(&id) {
            return Err(Error::validation(format!("job '{}' already exists", id)));
        }
        debug!(job = %id, "registered scan job");
        self.jobs.insert(
            id.clone(),
            JobEntry {
                id,
                control,
                handle,
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&JobEntry> {
        self.jobs.get(id)
    }

    pub fn control(&self, id: &str) -> Option<ScanControl> {
        self.jobs.get(id).map(|entry| entry.control.clone())
    }

    pub fn ids(&self) -> Vec<&str> {
        self.jobs.keys().map(String::as_str).collect()
    }

    /// Stops the job and removes it from the registry. The task itself winds
    /// down cooperatively at its next poll point.
    pub fn remove(&mut self, id: &str) -> bool {
        match self.jobs.remove(id) {
            Some(entry) => {
                entry.control.stop();
                true
            }
            None => false,
        }
    }

    /// Drops finished jobs older than `ttl`. Running jobs are never expired.
    pub fn expire_finished(&mut self, ttl: Duration) -> usize {
        let cutoff = Utc::now() - ttl;
        let before = self.jobs.len();
        self.jobs
            .retain(|_, entry| !entry.is_finished() || entry.created_at > cutoff);
        before - self.jobs.len()
    }

    /// Waits for every registered task to finish, draining the registry.
    pub async fn wait_all(&mut self) {
        let handles: Vec<JoinHandle<()>> =
            self.jobs.drain().map(|(_, entry)| entry.handle).collect();
        join_all(handles).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_duplicate_rejected() {
        let mut store = JobStore::new();
        let control = ScanControl::new();
        let handle = tokio::spawn(async {});
        store.register("job-1", control.clone(), handle).unwrap();

        let handle = tokio::spawn(async {});
        assert!(store.register("job-1", control, handle).is_err());
        assert_eq!(store.ids(), vec!["job-1"]);
    }

    #[tokio::test]
    async fn test_remove_stops_job() {
        let mut store = JobStore::new();
        let control = ScanControl::new();
        let handle = tokio::spawn(async {});
        store.register("job-1", control.clone(), handle).unwrap();

        assert!(store.remove("job-1"));
        assert!(store.get("job-1").is_none());
        assert!(control.subscribe().is_stopped());
        assert!(!store.remove("job-1"));
    }

    #[tokio::test]
    async fn test_expire_keeps_running_jobs() {
        let mut store = JobStore::new();
        let finished = tokio::spawn(async {});
        store
            .register("done", ScanControl::new(), finished)
            .unwrap();

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let running = tokio::spawn(async move {
            let _ = rx.await;
        });
        store
            .register("running", ScanControl::new(), running)
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let expired = store.expire_finished(Duration::zero());
        assert_eq!(expired, 1);
        assert!(store.get("running").is_some());
        let _ = tx.send(());
        store.wait_all().await;
    }
}
