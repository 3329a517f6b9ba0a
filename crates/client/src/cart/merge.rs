//! Merge report for the one-time guest-to-server reconciliation.

use giftsouq_core::VariationId;

/// Outcome of one local line's merge attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The line landed in the server cart.
    Added(VariationId),
    /// The backend rejected the line; it was dropped, not re-queued.
    Failed {
        /// The variation that was rejected.
        variation_id: VariationId,
        /// Display message extracted from the failure.
        message: String,
    },
}

/// Per-line results of a merge.
///
/// The merge is best-effort with no rollback: one rejected line of a
/// mixed cart must not sink the rest, so failures are collected here
/// instead of propagating.
#[derive(Debug, Default)]
pub struct MergeReport {
    /// One outcome per local line, in merge order.
    pub outcomes: Vec<MergeOutcome>,
    /// Failure message from the baseline fetch, if it failed.
    pub baseline_error: Option<String>,
    /// Failure message from the post-merge refresh, if it failed.
    pub refresh_error: Option<String>,
}

impl MergeReport {
    /// Number of lines that landed.
    #[must_use]
    pub fn added(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, MergeOutcome::Added(_)))
            .count()
    }

    /// Number of lines that were dropped.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.added()
    }

    /// Whether every line landed and both fetches succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed() == 0 && self.baseline_error.is_none() && self.refresh_error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let report = MergeReport {
            outcomes: vec![
                MergeOutcome::Added(VariationId::new(1)),
                MergeOutcome::Failed {
                    variation_id: VariationId::new(2),
                    message: "Out of stock".to_string(),
                },
                MergeOutcome::Added(VariationId::new(3)),
            ],
            baseline_error: None,
            refresh_error: None,
        };

        assert_eq!(report.added(), 2);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_empty_report_is_clean() {
        assert!(MergeReport::default().is_clean());
    }
}
