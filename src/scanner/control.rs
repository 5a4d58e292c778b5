use std::collections::HashSet;
use std::time::Instant;

use tokio::sync::watch;

/// Cooperative scan lifecycle: Running <-> Paused, either -> Stopped.
/// Stopped is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Running,
    Paused,
    Stopped,
}

/// Shared handle used to signal a running scan. Cloneable; the scan loop
/// holds the receiving side and polls it once per unit of work.
#[derive(Debug, Clone)]
pub struct ScanControl {
    tx: watch::Sender<ControlState>,
}

impl ScanControl {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ControlState::Running);
        Self { tx }
    }

    pub fn state(&self) -> ControlState {
        *self.tx.borrow()
    }

    pub fn pause(&self) {
        self.tx.send_if_modified(|state| match state {
            ControlState::Running => {
                *state = ControlState::Paused;
                true
            }
            _ => false,
        });
    }

    pub fn resume(&self) {
        self.tx.send_if_modified(|state| match state {
            ControlState::Paused => {
                *state = ControlState::Running;
                true
            }
            _ => false,
        });
    }

    pub fn stop(&self) {
        self.tx.send_if_modified(|state| match state {
            ControlState::Stopped => false,
            _ => {
                *state = ControlState::Stopped;
                true
            }
        });
    }

    pub fn subscribe(&self) -> ControlGate {
        ControlGate {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for ScanControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side held by the scan loop.
#[derive(Debug)]
pub struct ControlGate {
    rx: watch::Receiver<ControlState>,
}

impl ControlGate {
    /// Poll point before each unit of work. Suspends while paused, wakes on
    /// the next signal, and reports whether the scan may proceed. `false`
    /// means stop was observed; no further work may start.
    pub async fn checkpoint(&mut self) -> bool {
        loop {
            // Copy the state out so the watch guard is released before
            // awaiting the next change.
            let state = *self.rx.borrow_and_update();
            match state {
                ControlState::Running => return true,
                ControlState::Stopped => return false,
                ControlState::Paused => {
                    // Sender dropped while paused counts as a stop.
                    if self.rx.changed().await.is_err() {
                        return false;
                    }
                }
            }
        }
    }

    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow() == ControlState::Stopped
    }
}

/// Mutable per-scan bookkeeping. Single writer: the orchestrator that owns
/// it. `visited` only ever grows.
#[derive(Debug)]
pub struct ScanState {
    pub visited: HashSet<String>,
    pub request_count: usize,
    pub current_index: usize,
    pub start_time: Option<Instant>,
    pub end_time: Option<Instant>,
}

impl ScanState {
    pub fn new() -> Self {
        Self {
            visited: HashSet::new(),
            request_count: 0,
            current_index: 0,
            start_time: None,
            end_time: None,
        }
    }

    pub fn mark_started(&mut self) {
        self.start_time = Some(Instant::now());
    }

    pub fn mark_finished(&mut self) {
        if self.end_time.is_none() {
            self.end_time = Some(Instant::now());
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        match self.start_time {
            Some(start) => {
                let end = self.end_time.unwrap_or_else(Instant::now);
                end.duration_since(start).as_secs_f64()
            }
            None => 0.0,
        }
    }
}

impl Default for ScanState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pause_resume_roundtrip() {
        let control = ScanControl::new();
        assert_eq!(control.state(), ControlState::Running);
        control.pause();
        assert_eq!(control.state(), ControlState::Paused);
        control.resume();
        assert_eq!(control.state(), ControlState::Running);
    }

    #[test]
    fn test_stopped_is_terminal() {
        let control = ScanControl::new();
        control.stop();
        control.resume();
        assert_eq!(control.state(), ControlState::Stopped);
        control.pause();
        assert_eq!(control.state(), ControlState::Stopped);
    }

    #[tokio::test]
    async fn test_checkpoint_passes_while_running() {
        let control = ScanControl::new();
        let mut gate = control.subscribe();
        assert!(gate.checkpoint().await);
    }

    #[tokio::test]
    async fn test_checkpoint_blocks_until_resumed() {
        let control = ScanControl::new();
        let mut gate = control.subscribe();
        control.pause();

        let handle = tokio::spawn(async move { gate.checkpoint().await });
        tokio::task::yield_now().await;
        assert!(!handle.is_finished());

        control.resume();
        assert!(handle.await.unwrap());
    }

    #[tokio::test]
    async fn test_stop_releases_paused_checkpoint() {
        let control = ScanControl::new();
        let mut gate = control.subscribe();
        control.pause();

        let handle = tokio::spawn(async move { gate.checkpoint().await });
        control.stop();
        assert!(!handle.await.unwrap());
    }
}
