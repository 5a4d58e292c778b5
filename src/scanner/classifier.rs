use crate::models::{FilterConfig, ProbeResult};

/// Applies the configured status/length policy to individual probe results.
/// Rejected results stay in the global log and metrics; they are only kept
/// out of the filtered set used for tree updates and exports.
#[derive(Debug, Clone)]
pub struct ResultClassifier {
    filter: FilterConfig,
}

impl ResultClassifier {
    pub fn new(filter: FilterConfig) -> Self {
        Self { filter }
    }

    /// Deny-list entries lose even when allow-listed; an allow-list, when
    /// present, is exhaustive; the length filter rejects bodies at or below
    /// the threshold.
    pub fn is_interesting(&self, result: &ProbeResult) -> bool {
        if self.filter.deny_status.contains(&result.status) {
            return false;
        }
        if !self.filter.allow_status.is_empty() && !self.filter.allow_status.contains(&result.status)
        {
            return false;
        }
        if let Some(min) = self.filter.min_length {
            if result.length <= min {
                return false;
            }
        }
        true
    }

    pub fn retain_interesting(&self, results: &[ProbeResult]) -> Vec<ProbeResult> {
        results
            .iter()
            .filter(|r| self.is_interesting(r))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(status: u16, length: usize) -> ProbeResult {
        ProbeResult::new(1, "http://t/x", status, length, "x", 10)
    }

    fn classifier(allow: Vec<u16>, deny: Vec<u16>, min_length: Option<usize>) -> ResultClassifier {
        ResultClassifier::new(FilterConfig {
            allow_status: allow,
            deny_status: deny,
            min_length,
        })
    }

    #[test]
    fn test_allow_list_is_exhaustive() {
        let c = classifier(vec![200], vec![], None);
        assert!(c.is_interesting(&probe(200, 10)));
        assert!(!c.is_interesting(&probe(404, 10)));
        assert!(!c.is_interesting(&probe(0, 0)));
    }

    #[test]
    fn test_deny_beats_allow() {
        let c = classifier(vec![200, 403], vec![403], None);
        assert!(c.is_interesting(&probe(200, 10)));
        assert!(!c.is_interesting(&probe(403, 10)));
    }

    #[test]
    fn test_no_allow_list_passes_everything_not_denied() {
        let c = classifier(vec![], vec![404], None);
        assert!(c.is_interesting(&probe(500, 10)));
        assert!(!c.is_interesting(&probe(404, 10)));
    }

    #[test]
    fn test_length_threshold_inclusive() {
        let c = classifier(vec![], vec![], Some(100));
        assert!(!c.is_interesting(&probe(200, 100)));
        assert!(c.is_interesting(&probe(200, 101)));
    }
}
