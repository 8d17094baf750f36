//! Batch orchestration over the design space.
//!
//! Campaign descriptors are enumerated deterministically by striding two
//! fixed category lists, so assignment is reproducible and coverage even
//! regardless of how many campaigns a run requests. Campaigns run strictly
//! sequentially with a pacing delay between them to respect remote rate
//! limits; one campaign failing never aborts the batch.

use std::time::Duration;

use tracing::{info, instrument};
use uuid::Uuid;

use adlab_core::{CampaignDescriptor, RunSummary};
use adlab_dify::DifyClient;
use adlab_store::{CampaignStore, StoreError};

use crate::pipeline::{CampaignPipeline, PipelineConfig};

/// Product categories under test.
pub const PRODUCT_TYPES: [&str; 10] = [
    "Smartphone",
    "Laptop",
    "Smartwatch",
    "Headphones",
    "Tablet",
    "Gaming Console",
    "Camera",
    "Fitness Tracker",
    "E-reader",
    "Smart Home Device",
];

/// Event categories under test.
pub const EVENT_TYPES: [&str; 10] = [
    "Black Friday",
    "Christmas",
    "New Year",
    "Valentine's Day",
    "Mother's Day",
    "Back to School",
    "Summer Sale",
    "Cyber Monday",
    "Father's Day",
    "Halloween",
];

/// Enumerate `total` campaign descriptors by striding the category lists:
/// product cycles fastest, event advances once per full product cycle.
#[must_use]
pub fn descriptors(total: u32) -> Vec<CampaignDescriptor> {
    (0..total as usize)
        .map(|i| CampaignDescriptor {
            number: i as u32 + 1,
            product: PRODUCT_TYPES[i % PRODUCT_TYPES.len()].to_string(),
            event: EVENT_TYPES[(i / PRODUCT_TYPES.len()) % EVENT_TYPES.len()].to_string(),
        })
        .collect()
}

/// Runs a batch of campaigns sequentially through one pipeline.
pub struct BatchRunner<'a> {
    pipeline: CampaignPipeline<'a>,
    pacing: Duration,
}

impl<'a> BatchRunner<'a> {
    /// Create a runner over shared collaborators.
    #[must_use]
    pub fn new(
        client: &'a DifyClient,
        store: &'a CampaignStore,
        config: PipelineConfig,
        pacing: Duration,
    ) -> Self {
        Self {
            pipeline: CampaignPipeline::new(client, store, config),
            pacing,
        }
    }

    /// Run `total` campaigns to terminal states.
    ///
    /// `Err` only for store failures; remote failures are absorbed into
    /// per-campaign outcomes.
    #[instrument(skip(self))]
    pub async fn run(&self, total: u32) -> Result<RunSummary, StoreError> {
        let run_id = Uuid::now_v7();
        info!(%run_id, total, "starting batch run");

        let mut succeeded = 0;
        let mut failed = 0;
        let descriptors = descriptors(total);
        let last = descriptors.len().saturating_sub(1);

        for (index, descriptor) in descriptors.iter().enumerate() {
            let report = self.pipeline.run(descriptor).await?;
            if report.completed {
                succeeded += 1;
            } else {
                failed += 1;
            }
            if index < last && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
        }

        let summary = RunSummary {
            total,
            succeeded,
            failed,
        };
        info!(
            %run_id,
            succeeded,
            failed,
            success_rate = summary.success_rate(),
            "batch run finished"
        );
        Ok(summary)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors_stride_products_fastest() {
        let all = descriptors(25);
        assert_eq!(all.len(), 25);
        assert_eq!(all[0].number, 1);
        assert_eq!(all[0].product, "Smartphone");
        assert_eq!(all[0].event, "Black Friday");
        // Second descriptor advances the product only.
        assert_eq!(all[1].product, "Laptop");
        assert_eq!(all[1].event, "Black Friday");
        // After a full product cycle the event advances.
        assert_eq!(all[10].product, "Smartphone");
        assert_eq!(all[10].event, "Christmas");
        assert_eq!(all[24].product, "Tablet");
        assert_eq!(all[24].event, "New Year");
    }

    #[test]
    fn descriptors_wrap_after_full_grid() {
        let all = descriptors(101);
        // 10 products x 10 events: descriptor 101 re-enters the grid.
        assert_eq!(all[100].number, 101);
        assert_eq!(all[100].product, all[0].product);
        assert_eq!(all[100].event, all[0].event);
    }

    #[test]
    fn descriptors_empty_run() {
        assert!(descriptors(0).is_empty());
    }
}
