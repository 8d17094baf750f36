//! Evaluation repository — the 1:1 `evaluations` satellite.

use rusqlite::{Connection, OptionalExtension, Row, params};
use serde_json::Value;

use crate::errors::Result;
use crate::row_types::EvaluationRow;

/// Options for inserting evaluation scores.
pub struct InsertEvaluationOptions<'a> {
    /// Owning campaign.
    pub campaign_id: i64,
    /// Relevance score, 0–10.
    pub relevance: f64,
    /// Clarity score, 0–10.
    pub clarity: f64,
    /// Persuasiveness score, 0–10.
    pub persuasiveness: f64,
    /// Brand-safety score, 0–10.
    pub brand_safety: f64,
    /// Overall score, 0–10.
    pub overall: f64,
    /// Free-text feedback.
    pub feedback: &'a str,
    /// Recommendation list.
    pub recommendations: &'a [String],
    /// Service message id.
    pub message_id: Option<&'a str>,
    /// Raw structured response.
    pub raw_response: &'a Value,
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<EvaluationRow> {
    let recommendations: String = row.get(8)?;
    let raw: Option<String> = row.get(10)?;
    Ok(EvaluationRow {
        id: row.get(0)?,
        campaign_id: row.get(1)?,
        relevance_score: row.get(2)?,
        clarity_score: row.get(3)?,
        persuasiveness_score: row.get(4)?,
        brand_safety_score: row.get(5)?,
        overall_score: row.get(6)?,
        feedback: row.get(7)?,
        recommendations: serde_json::from_str(&recommendations).unwrap_or_default(),
        message_id: row.get(9)?,
        raw_response: raw.and_then(|s| serde_json::from_str(&s).ok()),
    })
}

/// Evaluation repository.
pub struct EvaluationRepo;

impl EvaluationRepo {
    /// Insert the evaluation record for a campaign.
    pub fn insert(conn: &Connection, opts: &InsertEvaluationOptions<'_>) -> Result<i64> {
        let now = chrono::Utc::now().to_rfc3339();
        let _ = conn.execute(
            "INSERT INTO evaluations
             (campaign_id, relevance_score, clarity_score, persuasiveness_score,
              brand_safety_score, overall_score, feedback, recommendations,
              message_id, raw_response, evaluated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                opts.campaign_id,
                opts.relevance,
                opts.clarity,
                opts.persuasiveness,
                opts.brand_safety,
                opts.overall,
                opts.feedback,
                serde_json::to_string(opts.recommendations)?,
                opts.message_id,
                serde_json::to_string(opts.raw_response)?,
                now,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Fetch the evaluation row for a campaign.
    pub fn get_by_campaign(conn: &Connection, campaign_id: i64) -> Result<Option<EvaluationRow>> {
        let row = conn
            .query_row(
                "SELECT id, campaign_id, relevance_score, clarity_score, persuasiveness_score,
                        brand_safety_score, overall_score, feedback, recommendations,
                        message_id, raw_response
                 FROM evaluations WHERE campaign_id = ?1",
                params![campaign_id],
                map_row,
            )
            .optional()?;
        Ok(row)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
