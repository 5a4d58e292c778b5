use std::future::Future;
use std::pin::Pin;

use tracing::{debug, info, warn};
use url::Url;

use crate::extract::LinkExtractor;
use crate::http::RequestGateway;
use crate::models::{CrawlConfig, ProbeResult, ScanMetrics};

use super::brute::ResultCallback;
use super::classifier::ResultClassifier;
use super::control::{ControlGate, ScanControl, ScanState};

/// Recursive orchestrator: fetches the seed page, extracts outbound links
/// and recurses depth-first with a shrinking depth budget. The visited set
/// is the sole de-duplication mechanism; a URL reached through two parents
/// is probed once.
pub struct Crawler<G: RequestGateway> {
    config: CrawlConfig,
    gateway: G,
    extractor: LinkExtractor,
    classifier: ResultClassifier,
    control: ScanControl,
    state: ScanState,
    results: Vec<ProbeResult>,
    on_result: Option<ResultCallback>,
}

impl<G: RequestGateway> Crawler<G> {
    pub fn new(config: CrawlConfig, gateway: G) -> Self {
        let classifier = ResultClassifier::new(config.filter.clone());
        Self {
            config,
            gateway,
            extractor: LinkExtractor::new(),
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

    pub fn control(&self) -> ScanControl {
        self.control.clone()
    }

    pub async fn run(&mut self) {
        self.state.mark_started();
        let mut gate = self.control.subscribe();
        let seed = self.config.scan.target_url.clone();
        info!(target_url = %seed, depth = self.config.max_depth, "starting crawl");

        self.crawl(seed, String::new(), self.config.max_depth, &mut gate)
            .await;

        self.state.mark_finished();
        info!(
            visited = self.state.visited.len(),
            elapsed_secs = self.state.elapsed_secs(),
            "crawl finished"
        );
    }

    /// Depth-first visit of one URL. Boxed because the recursion depth is
    /// runtime-bounded, not statically known.
    fn crawl<'a>(
        &'a mut self,
        url: String,
        parent: String,
        depth_remaining: usize,
        gate: &'a mut ControlGate,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            if !gate.checkpoint().await {
                return;
            }
            if self.state.visited.contains(&url)
                || self.state.visited.len() >= self.config.page_limit
            {
                return;
            }
            self.state.visited.insert(url.clone());

            let body = self.probe(&url, &parent).await;
            // The delay applies after every probe, failed or not; it is the
            // only back-pressure mechanism.
            tokio::time::sleep(self.config.scan.delay).await;

            let Some(body) = body else {
                return;
            };

            if depth_remaining == 0 {
                return;
            }

            for link in self.extractor.extract_links(&body, &url) {
                if !gate.checkpoint().await {
                    return;
                }
                if self.config.is_excluded(&link) || !self.same_host(&link) {
                    continue;
                }
                self.crawl(link, url.clone(), depth_remaining - 1, gate)
                    .await;
            }
        })
    }

    /// Issues the probe and records its result. Returns the body for link
    /// extraction, or `None` on transport failure (the crawl continues with
    /// the next candidate).
    async fn probe(&mut self, url: &str, parent: &str) -> Option<String> {
        let path = Url::parse(url)
            .ok()
            .map(|u| u.path().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "/".to_string());

        let id = self.state.request_count + 1;
        let outcome = self
            .gateway
            .send("GET", &path, &self.config.scan.headers)
            .await;
        self.state.request_count += 1;

        let (result, body) = match outcome {
            Ok(response) => {
                let title = self.extractor.page_title(&response.body);
                debug!(
                    url,
                    status = response.status,
                    title = title.as_deref().unwrap_or(""),
                    "crawled"
                );
                let result = ProbeResult::new(
                    id,
                    url,
                    response.status,
                    response.size,
                    parent,
                    response.elapsed_ms,
                );
                (result, Some(response.body))
            }
            Err(err) => {
                warn!(url, error = %err, "crawl request failed");
                (ProbeResult::transport_error(id, url, parent, 0), None)
            }
        };

        if let Some(callback) = &self.on_result {
            callback(&result);
        }
        self.results.push(result);
        body
    }

    fn same_host(&self, link: &str) -> bool {
        let target_host = Url::parse(&self.config.scan.target_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string));
        let link_host = Url::parse(link)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string));
        target_host.is_some() && target_host == link_host
    }

    pub fn results(&self) -> &[ProbeResult] {
        &self.results
    }

    pub fn filtered_results(&self) -> Vec<ProbeResult> {
        self.classifier.retain_interesting(&self.results)
    }

    pub fn visited_count(&self) -> usize {
        self.state.visited.len()
    }

    pub fn metrics(&self) -> ScanMetrics {
        ScanMetrics::new(
            self.state.elapsed_secs(),
            self.state.request_count,
            self.filtered_results().len(),
        )
    }
}
