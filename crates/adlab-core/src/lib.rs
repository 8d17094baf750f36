//! # adlab-core
//!
//! Domain types shared across the campaign research harness: campaign
//! descriptors and lifecycle status, generation profiles, stage outcomes,
//! batch summaries, and the structured-output extraction chain used to pull
//! JSON records out of model answers.
//!
//! This crate performs no I/O.

pub mod campaign;
pub mod outcome;
pub mod structured;

pub use campaign::{CampaignDescriptor, CampaignStatus, GenerationProfile};
pub use outcome::{RunSummary, StageKind, StageOutcome};
pub use structured::{StructuredParseError, parse_structured};
