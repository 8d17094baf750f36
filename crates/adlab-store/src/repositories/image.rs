//! Image repository — the 1:N `images` satellite.

use rusqlite::{Connection, Row, params};

use crate::errors::Result;
use crate::row_types::ImageRow;

/// Options for inserting a generated image.
pub struct InsertImageOptions<'a> {
    /// Owning campaign.
    pub campaign_id: i64,
    /// Download URL.
    pub image_url: Option<&'a str>,
    /// Prompt the image was generated from.
    pub image_prompt: &'a str,
    /// Generation profile used.
    pub profile: &'a str,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Diffusion step count.
    pub steps: u32,
    /// Service message id.
    pub message_id: Option<&'a str>,
    /// Service file id.
    pub file_id: Option<&'a str>,
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<ImageRow> {
    Ok(ImageRow {
        id: row.get(0)?,
        campaign_id: row.get(1)?,
        image_url: row.get(2)?,
        image_prompt: row.get(3)?,
        profile: row.get(4)?,
        width: row.get::<_, Option<i64>>(5)?.map(|v| v as u32),
        height: row.get::<_, Option<i64>>(6)?.map(|v| v as u32),
        steps: row.get::<_, Option<i64>>(7)?.map(|v| v as u32),
        seed: row.get(8)?,
        message_id: row.get(9)?,
        file_id: row.get(10)?,
    })
}

/// Image repository.
pub struct ImageRepo;

impl ImageRepo {
    /// Insert a generated image record.
    pub fn insert(conn: &Connection, opts: &InsertImageOptions<'_>) -> Result<i64> {
        let now = chrono::Utc::now().to_rfc3339();
        let _ = conn.execute(
            "INSERT INTO images
             (campaign_id, image_url, image_prompt, profile, width, height, steps,
              message_id, file_id, generated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                opts.campaign_id,
                opts.image_url,
                opts.image_prompt,
                opts.profile,
                opts.width,
                opts.height,
                opts.steps,
                opts.message_id,
                opts.file_id,
                now,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List images for a campaign in insertion order.
    pub fn list_by_campaign(conn: &Connection, campaign_id: i64) -> Result<Vec<ImageRow>> {
        let mut stmt = conn.prepare(
            "SELECT id, campaign_id, image_url, image_prompt, profile, width, height, steps,
                    seed, message_id, file_id
             FROM images WHERE campaign_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![campaign_id], map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
