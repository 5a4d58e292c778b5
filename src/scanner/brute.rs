use tracing::{debug, info, warn};

use crate::http::RequestGateway;
use crate::models::{BruteConfig, ProbeResult, ScanMetrics};

use super::classifier::ResultClassifier;
use super::control::{ScanControl, ScanState};

pub type ResultCallback = Box<dyn Fn(&ProbeResult) + Send + Sync>;

/// Enumerative orchestrator: walks a wordlist in order, probing
/// `topPrefix/word` against the target. One probe per candidate, fixed delay
/// between probes, cooperative pause/resume/stop between units of work.
pub struct BruteForcer<G: RequestGateway> {
    config: BruteConfig,
    gateway: G,
    classifier: ResultClassifier,
    control: ScanControl,
    state: ScanState,
    results: Vec<ProbeResult>,
    on_result: Option<ResultCallback>,
}

impl<G: RequestGateway> BruteForcer<G> {
    pub fn new(config: BruteConfig, gateway: G) -> Self {
        let classifier = ResultClassifier::new(config.filter.clone());
        Self {
            config,
            gateway,
            classifier,
            control: ScanControl::new(),
            state: ScanState::new(),
            results: Vec::new(),
            on_result: None,
        }
    }

    pub fn set_result_callback(&mut self, callback: ResultCallback) {
        self.on_result = Some(callback);
    }

    /// Handle for external pause/resume/stop signals.
    pub fn control(&self) -> ScanControl {
        self.control.clone()
    }

    pub async fn run(&mut self) {
        self.state.mark_started();
        let mut gate = self.control.subscribe();
        info!(
            target_url = %self.config.scan.target_url,
            words = self.config.wordlist.len(),
            "starting brute-force scan"
        );

        let wordlist = self.config.wordlist.clone();
        for (index, word) in wordlist.iter().enumerate() {
            self.state.current_index = index;

            if !gate.checkpoint().await {
                info!(index, "scan stopped");
                break;
            }

            let path = self.candidate_path(word);
            if self.state.visited.contains(&path) {
                debug!(%path, "skipping duplicate candidate");
                continue;
            }
            self.state.visited.insert(path.clone());
            self.probe(&path, word).await;

            tokio::time::sleep(self.config.scan.delay).await;
        }

        self.state.mark_finished();
        info!(
            processed = self.state.request_count,
            elapsed_secs = self.state.elapsed_secs(),
            "brute-force scan finished"
        );
    }

    async fn probe(&mut self, path: &str, word: &str) {
        let full_url = format!("{}{}", self.config.scan.target_url, path);
        let id = self.state.request_count + 1;

        let result = match self
            .gateway
            .send("GET", path, &self.config.scan.headers)
            .await
        {
            Ok(response) => {
                debug!(url = %full_url, status = response.status, "probed");
                ProbeResult::new(
                    id,
                    full_url,
                    response.status,
                    response.size,
                    word,
                    response.elapsed_ms,
                )
            }
            Err(err) => {
                warn!(url = %full_url, error = %err, "probe failed");
                ProbeResult::transport_error(id, full_url, word, 0)
            }
        };

        if let Some(callback) = &self.on_result {
            callback(&result);
        }
        self.results.push(result);
        self.state.request_count += 1;
    }

    /// `topPrefix/word`, each word segment percent-encoded, empty word
    /// meaning the prefix (or root) itself.
    fn candidate_path(&self, word: &str) -> String {
        let encoded = word
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        let top = &self.config.top_prefix;
        let joined = if top.is_empty() {
            encoded
        } else if encoded.is_empty() {
            top.clone()
        } else {
            format!("{}/{}", top, encoded)
        };
        format!("/{}", joined.trim_start_matches('/'))
    }

    pub fn results(&self) -> &[ProbeResult] {
        &self.results
    }

    pub fn filtered_results(&self) -> Vec<ProbeResult> {
        self.classifier.retain_interesting(&self.results)
    }

    pub fn metrics(&self) -> ScanMetrics {
        ScanMetrics::new(
            self.state.elapsed_secs(),
            self.state.request_count,
            self.filtered_results().len(),
        )
    }
}
