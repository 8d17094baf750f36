//! Text content repository — the 1:1 `text_content` satellite.

use rusqlite::{Connection, OptionalExtension, Row, params};
use serde_json::Value;

use crate::errors::Result;
use crate::row_types::TextContentRow;

/// Options for inserting generated text content.
pub struct InsertTextContentOptions<'a> {
    /// Owning campaign.
    pub campaign_id: i64,
    /// Generated headline.
    pub headline: Option<&'a str>,
    /// Generated description.
    pub description: Option<&'a str>,
    /// Generated call-to-action.
    pub cta: Option<&'a str>,
    /// Keyword list.
    pub keywords: &'a [String],
    /// Service message id.
    pub message_id: Option<&'a str>,
    /// Raw structured response.
    pub raw_response: &'a Value,
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<TextContentRow> {
    let keywords: String = row.get(5)?;
    let raw: Option<String> = row.get(7)?;
    Ok(TextContentRow {
        id: row.get(0)?,
        campaign_id: row.get(1)?,
        headline: row.get(2)?,
        description: row.get(3)?,
        cta: row.get(4)?,
        keywords: serde_json::from_str(&keywords).unwrap_or_default(),
        message_id: row.get(6)?,
        raw_response: raw.and_then(|s| serde_json::from_str(&s).ok()),
    })
}

/// Text content repository.
pub struct TextContentRepo;

impl TextContentRepo {
    /// Insert the generated text content for a campaign.
    pub fn insert(conn: &Connection, opts: &InsertTextContentOptions<'_>) -> Result<i64> {
        let now = chrono::Utc::now().to_rfc3339();
        let _ = conn.execute(
            "INSERT INTO text_content
             (campaign_id, headline, description, cta, keywords, message_id, raw_response, generated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                opts.campaign_id,
                opts.headline,
                opts.description,
                opts.cta,
                serde_json::to_string(opts.keywords)?,
                opts.message_id,
                serde_json::to_string(opts.raw_response)?,
                now,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Fetch the content row for a campaign.
    pub fn get_by_campaign(conn: &Connection, campaign_id: i64) -> Result<Option<TextContentRow>> {
        let row = conn
            .query_row(
                "SELECT id, campaign_id, headline, description, cta, keywords, message_id, raw_response
                 FROM text_content WHERE campaign_id = ?1",
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
