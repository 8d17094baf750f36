//! # adlab-dify
//!
//! Client for the Dify conversational generation service.
//!
//! The service delivers chat responses as an event stream: lines prefixed
//! with `data: ` each carrying one JSON event. The transport boundary
//! buffers the stream to completion, then [`stream::decode_stream`] turns the
//! payload into typed events and [`aggregate::aggregate`] folds them into a
//! single [`aggregate::AggregatedResult`]. [`client::DifyClient`] wraps both
//! behind one logical call with timeout and transport-failure handling.

pub mod aggregate;
pub mod client;
pub mod error;
pub mod stream;

pub use aggregate::{AggregatedResult, FileAttachment, aggregate};
pub use client::{ChatOutcome, DifyClient, DifyConfig};
pub use error::{DifyError, Result};
pub use stream::{StreamEvent, Usage, decode_stream};
