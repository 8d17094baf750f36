//! Per-stage outcomes and batch run summaries.

use std::time::Duration;

use serde::Serialize;

/// The three remote stages of a campaign, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    /// Text content generation (foundational; failure is a hard stop).
    Text,
    /// Image generation (best-effort enrichment).
    Image,
    /// Quality evaluation (best-effort enrichment).
    Evaluation,
}

impl StageKind {
    /// Stable name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Evaluation => "evaluation",
        }
    }
}

/// Result of one attempted stage. Never mutated after the stage completes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageOutcome {
    /// Whether the stage produced a usable result.
    pub succeeded: bool,
    /// Wall-clock time spent in the stage, including failed calls.
    pub elapsed: Duration,
    /// Monetary cost reported by the service for this stage.
    pub cost: f64,
}

impl StageOutcome {
    /// Outcome for a stage that was never attempted: contributes zero time
    /// and zero cost to campaign totals.
    pub fn skipped() -> Self {
        Self {
            succeeded: false,
            elapsed: Duration::ZERO,
            cost: 0.0,
        }
    }
}

/// Summary of one batch run, produced once per batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Campaigns attempted.
    pub total: u32,
    /// Campaigns that reached `completed`.
    pub succeeded: u32,
    /// Campaigns that ended `failed`.
    pub failed: u32,
}

impl RunSummary {
    /// Success rate in percent; zero for an empty run.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.succeeded) / f64::from(self.total) * 100.0
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_empty_run_is_zero() {
        let summary = RunSummary {
            total: 0,
            succeeded: 0,
            failed: 0,
        };
        assert_eq!(summary.success_rate(), 0.0);
    }

    #[test]
    fn success_rate_partial() {
        let summary = RunSummary {
            total: 4,
            succeeded: 3,
            failed: 1,
        };
        assert!((summary.success_rate() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn skipped_stage_contributes_nothing() {
        let outcome = StageOutcome::skipped();
        assert!(!outcome.succeeded);
        assert_eq!(outcome.elapsed, Duration::ZERO);
        assert_eq!(outcome.cost, 0.0);
    }
}
