//! Flat analysis extract over completed campaigns.
//!
//! One row per completed campaign, satellites joined in. Campaigns that
//! finished without an image or evaluation keep `None` in those columns
//! rather than being dropped.

use rusqlite::{Connection, Row};
use serde::Serialize;

use crate::errors::Result;

/// One completed campaign, flattened for analysis and export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractRow {
    /// Campaign number.
    pub campaign_number: u32,
    /// Product type.
    pub product_type: String,
    /// Event type.
    pub event_type: String,
    /// Generation profile label.
    pub profile: String,
    /// Relevance score.
    pub relevance_score: Option<f64>,
    /// Clarity score.
    pub clarity_score: Option<f64>,
    /// Persuasiveness score.
    pub persuasiveness_score: Option<f64>,
    /// Brand-safety score.
    pub brand_safety_score: Option<f64>,
    /// Overall score.
    pub overall_score: Option<f64>,
    /// Text-stage duration in seconds.
    pub text_generation_secs: Option<f64>,
    /// Image-stage duration in seconds.
    pub image_generation_secs: Option<f64>,
    /// Evaluation-stage duration in seconds.
    pub evaluation_secs: Option<f64>,
    /// Total duration in seconds.
    pub total_secs: Option<f64>,
    /// Total cost across stages.
    pub total_cost: Option<f64>,
    /// Total tokens billed by the text stage.
    pub total_tokens: Option<u64>,
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<ExtractRow> {
    Ok(ExtractRow {
        campaign_number: row.get::<_, i64>(0)? as u32,
        product_type: row.get(1)?,
        event_type: row.get(2)?,
        profile: row.get(3)?,
        relevance_score: row.get(4)?,
        clarity_score: row.get(5)?,
        persuasiveness_score: row.get(6)?,
        brand_safety_score: row.get(7)?,
        overall_score: row.get(8)?,
        text_generation_secs: row.get(9)?,
        image_generation_secs: row.get(10)?,
        evaluation_secs: row.get(11)?,
        total_secs: row.get(12)?,
        total_cost: row.get(13)?,
        total_tokens: row.get::<_, Option<i64>>(14)?.map(|v| v as u64),
    })
}

/// Fetch the extract, ordered by campaign number.
pub fn fetch_extract(conn: &Connection) -> Result<Vec<ExtractRow>> {
    let mut stmt = conn.prepare(
        "SELECT c.campaign_number, c.product_type, c.event_type, c.profile,
                e.relevance_score, e.clarity_score, e.persuasiveness_score,
                e.brand_safety_score, e.overall_score,
                t.text_generation_secs, t.image_generation_secs, t.evaluation_secs,
                t.total_secs, k.total_cost, k.total_tokens
         FROM campaigns c
         LEFT JOIN evaluations e ON e.campaign_id = c.id
         LEFT JOIN timing_metrics t ON t.campaign_id = c.id
         LEFT JOIN cost_metrics k ON k.campaign_id = c.id
         WHERE c.status = 'completed'
         ORDER BY c.campaign_number",
    )?;
    let rows = stmt
        .query_map([], map_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
