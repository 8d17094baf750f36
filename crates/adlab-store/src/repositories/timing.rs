//! Timing repository — the 1:1 `timing_metrics` satellite.
//!
//! The row is created by the text stage and enriched in place by the later
//! stages. Totals sum whichever stage durations were recorded; absent
//! stages contribute zero.

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::errors::Result;
use crate::row_types::TimingRow;

fn map_row(row: &Row<'_>) -> rusqlite::Result<TimingRow> {
    Ok(TimingRow {
        id: row.get(0)?,
        campaign_id: row.get(1)?,
        text_generation_secs: row.get(2)?,
        image_generation_secs: row.get(3)?,
        evaluation_secs: row.get(4)?,
        total_secs: row.get(5)?,
    })
}

/// Timing repository.
pub struct TimingRepo;

impl TimingRepo {
    /// Create the timing row with the text-stage duration.
    pub fn insert_text(conn: &Connection, campaign_id: i64, secs: f64) -> Result<i64> {
        let now = chrono::Utc::now().to_rfc3339();
        let _ = conn.execute(
            "INSERT INTO timing_metrics (campaign_id, text_generation_secs, created_at)
             VALUES (?1, ?2, ?3)",
            params![campaign_id, secs, now],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Record the image-stage duration.
    pub fn set_image(conn: &Connection, campaign_id: i64, secs: f64) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE timing_metrics SET image_generation_secs = ?1 WHERE campaign_id = ?2",
            params![secs, campaign_id],
        )?;
        Ok(changed > 0)
    }

    /// Record the evaluation-stage duration.
    pub fn set_evaluation(conn: &Connection, campaign_id: i64, secs: f64) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE timing_metrics SET evaluation_secs = ?1 WHERE campaign_id = ?2",
            params![secs, campaign_id],
        )?;
        Ok(changed > 0)
    }

    /// Set `total_secs` to the sum of recorded stage durations and return
    /// it. Zero when no timing row exists.
    pub fn finalize_total(conn: &Connection, campaign_id: i64) -> Result<f64> {
        let _ = conn.execute(
            "UPDATE timing_metrics
             SET total_secs = COALESCE(text_generation_secs, 0)
                            + COALESCE(image_generation_secs, 0)
                            + COALESCE(evaluation_secs, 0)
             WHERE campaign_id = ?1",
            params![campaign_id],
        )?;
        let total = conn
            .query_row(
                "SELECT total_secs FROM timing_metrics WHERE campaign_id = ?1",
                params![campaign_id],
                |row| row.get::<_, Option<f64>>(0),
            )
            .optional()?;
        Ok(total.flatten().unwrap_or_default())
    }

    /// Fetch the timing row for a campaign.
    pub fn get_by_campaign(conn: &Connection, campaign_id: i64) -> Result<Option<TimingRow>> {
        let row = conn
            .query_row(
                "SELECT id, campaign_id, text_generation_secs, image_generation_secs,
                        evaluation_secs, total_secs
                 FROM timing_metrics WHERE campaign_id = ?1",
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
