//! # adlab-store
//!
//! SQLite persistence for the campaign research harness.
//!
//! Layout follows a repository pattern: stateless per-table repositories
//! taking `&Connection`, composed by the high-level [`store::CampaignStore`]
//! whose write methods each run inside a single transaction. The store is
//! acquired once at batch start and passed by explicit reference through the
//! run; it holds no lazily created session state.

pub mod connection;
pub mod errors;
pub mod migrations;
pub mod report;
pub mod repositories;
pub mod row_types;
pub mod store;

pub use connection::{ConnectionPool, open_in_memory, open_pool};
pub use errors::{Result, StoreError};
pub use report::ExtractRow;
pub use store::{
    AverageScores, CampaignRecord, CampaignStore, EvaluationStageRecord, ImageStageRecord,
    StatusCounts, TextStageRecord,
};
