//! Per-table repositories — stateless, every method takes `&Connection`.

pub mod campaign;
pub mod cost;
pub mod evaluation;
pub mod image;
pub mod text_content;
pub mod timing;
