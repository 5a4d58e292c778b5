use serde::{Deserialize, Serialize};

/// Outcome of one probe against a candidate path. Immutable once created;
/// appended to the scan's ordered result log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResult {
    pub id: usize,
    pub url: String,
    /// HTTP status, 0 on transport failure.
    pub status: u16,
    pub length: usize,
    /// Wordlist entry or seed that produced this probe.
    pub payload: String,
    pub duration_ms: u64,
    pub error: bool,
}

impl ProbeResult {
    pub fn new(
        id: usize,
        url: impl Into<String>,
        status: u16,
        length: usize,
        payload: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            id,
            url: url.into(),
            status,
            length,
            payload: payload.into(),
            duration_ms,
            error: false,
        }
    }

    pub fn transport_error(
        id: usize,
        url: impl Into<String>,
        payload: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            id,
            url: url.into(),
            status: 0,
            length: 0,
            payload: payload.into(),
            duration_ms,
            error: true,
        }
    }
}

/// Point-in-time view of a running or finished scan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScanMetrics {
    pub running_time_secs: f64,
    pub processed_requests: usize,
    pub filtered_requests: usize,
    pub requests_per_second: f64,
}

impl ScanMetrics {
    pub fn new(running_time_secs: f64, processed: usize, filtered: usize) -> Self {
        let rps = if running_time_secs > 0.0 {
            processed as f64 / running_time_secs
        } else {
            0.0
        };
        Self {
            running_time_secs,
            processed_requests: processed,
            filtered_requests: filtered,
            requests_per_second: rps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_shape() {
        let r = ProbeResult::transport_error(1, "http://t/x", "x", 12);
        assert_eq!(r.status, 0);
        assert_eq!(r.length, 0);
        assert!(r.error);
    }

    #[test]
    fn test_metrics_rate() {
        let m = ScanMetrics::new(2.0, 10, 3);
        assert_eq!(m.requests_per_second, 5.0);
        assert_eq!(m.filtered_requests, 3);
    }

    #[test]
    fn test_metrics_zero_elapsed() {
        let m = ScanMetrics::new(0.0, 10, 0);
        assert_eq!(m.requests_per_second, 0.0);
    }
}
