//! # adlab-runner
//!
//! Orchestration for the campaign research harness: the per-campaign
//! three-stage pipeline ([`pipeline::CampaignPipeline`]) and the sequential
//! batch runner ([`batch::BatchRunner`]) that drives it over the enumerated
//! design space.

pub mod batch;
pub mod pipeline;

pub use batch::{BatchRunner, EVENT_TYPES, PRODUCT_TYPES, descriptors};
pub use pipeline::{CampaignPipeline, CampaignReport, PipelineConfig, StageError};
