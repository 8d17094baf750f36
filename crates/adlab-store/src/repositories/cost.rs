//! Cost repository — the 1:1 `cost_metrics` satellite.
//!
//! Created by the text stage with the token accounting; later stages add
//! their own costs in place.

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::errors::Result;
use crate::row_types::CostRow;

/// Options for creating the cost row from the text stage.
pub struct InsertCostOptions<'a> {
    /// Owning campaign.
    pub campaign_id: i64,
    /// Text-stage cost.
    pub text_cost: f64,
    /// Prompt tokens.
    pub prompt_tokens: u64,
    /// Completion tokens.
    pub completion_tokens: u64,
    /// Total tokens.
    pub total_tokens: u64,
    /// Currency the costs are denominated in.
    pub currency: &'a str,
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<CostRow> {
    Ok(CostRow {
        id: row.get(0)?,
        campaign_id: row.get(1)?,
        text_generation_cost: row.get(2)?,
        image_generation_cost: row.get(3)?,
        evaluation_cost: row.get(4)?,
        total_cost: row.get(5)?,
        prompt_tokens: row.get::<_, i64>(6)? as u64,
        completion_tokens: row.get::<_, i64>(7)? as u64,
        total_tokens: row.get::<_, i64>(8)? as u64,
        currency: row.get(9)?,
    })
}

/// Cost repository.
pub struct CostRepo;

impl CostRepo {
    /// Create the cost row with the text-stage figures.
    pub fn insert_text(conn: &Connection, opts: &InsertCostOptions<'_>) -> Result<i64> {
        let now = chrono::Utc::now().to_rfc3339();
        let _ = conn.execute(
            "INSERT INTO cost_metrics
             (campaign_id, text_generation_cost, prompt_tokens, completion_tokens,
              total_tokens, currency, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                opts.campaign_id,
                opts.text_cost,
                opts.prompt_tokens,
                opts.completion_tokens,
                opts.total_tokens,
                opts.currency,
                now,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Record the image-stage cost.
    pub fn set_image(conn: &Connection, campaign_id: i64, cost: f64) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE cost_metrics SET image_generation_cost = ?1 WHERE campaign_id = ?2",
            params![cost, campaign_id],
        )?;
        Ok(changed > 0)
    }

    /// Record the evaluation-stage cost.
    pub fn set_evaluation(conn: &Connection, campaign_id: i64, cost: f64) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE cost_metrics SET evaluation_cost = ?1 WHERE campaign_id = ?2",
            params![cost, campaign_id],
        )?;
        Ok(changed > 0)
    }

    /// Set `total_cost` to the sum of stage costs and return it. Zero when
    /// no cost row exists.
    pub fn finalize_total(conn: &Connection, campaign_id: i64) -> Result<f64> {
        let _ = conn.execute(
            "UPDATE cost_metrics
             SET total_cost = text_generation_cost + image_generation_cost + evaluation_cost
             WHERE campaign_id = ?1",
            params![campaign_id],
        )?;
        let total = conn
            .query_row(
                "SELECT total_cost FROM cost_metrics WHERE campaign_id = ?1",
                params![campaign_id],
                |row| row.get::<_, f64>(0),
            )
            .optional()?;
        Ok(total.unwrap_or_default())
    }

    /// Fetch the cost row for a campaign.
    pub fn get_by_campaign(conn: &Connection, campaign_id: i64) -> Result<Option<CostRow>> {
        let row = conn
            .query_row(
                "SELECT id, campaign_id, text_generation_cost, image_generation_cost,
                        evaluation_cost, total_cost, prompt_tokens, completion_tokens,
                        total_tokens, currency
                 FROM cost_metrics WHERE campaign_id = ?1",
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

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;
    use crate::repositories::campaign::{CampaignRepo, CreateCampaignOptions};
    use adlab_core::GenerationProfile;

    fn setup() -> (Connection, i64) {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        let campaign = CampaignRepo::create(
            &conn,
            &CreateCampaignOptions {
                number: 1,
                product: "Smartwatch",
                event: "New Year",
                profile: GenerationProfile::Quality,
            },
        )
        .unwrap();
        (conn, campaign.id)
    }

    #[test]
    fn totals_sum_stage_costs() {
        let (conn, campaign_id) = setup();
        CostRepo::insert_text(
            &conn,
            &InsertCostOptions {
                campaign_id,
                text_cost: 0.001,
                prompt_tokens: 120,
                completion_tokens: 380,
                total_tokens: 500,
                currency: "USD",
            },
        )
        .unwrap();
        CostRepo::set_image(&conn, campaign_id, 0.02).unwrap();
        CostRepo::set_evaluation(&conn, campaign_id, 0.0005).unwrap();

        let total = CostRepo::finalize_total(&conn, campaign_id).unwrap();
        assert!((total - 0.0215).abs() < 1e-9);

        let row = CostRepo::get_by_campaign(&conn, campaign_id).unwrap().unwrap();
        assert_eq!(row.total_tokens, 500);
        assert_eq!(row.currency, "USD");
    }

    #[test]
    fn missing_stage_costs_default_to_zero() {
        let (conn, campaign_id) = setup();
        CostRepo::insert_text(
            &conn,
            &InsertCostOptions {
                campaign_id,
                text_cost: 0.001,
                prompt_tokens: 0,
                completion_tokens: 0,
                total_tokens: 0,
                currency: "USD",
            },
        )
        .unwrap();

        let total = CostRepo::finalize_total(&conn, campaign_id).unwrap();
        assert!((total - 0.001).abs() < 1e-12);
    }

    #[test]
    fn finalize_without_row_is_zero() {
        let (conn, campaign_id) = setup();
        assert_eq!(CostRepo::finalize_total(&conn, campaign_id).unwrap(), 0.0);
    }
}
