//! Campaign repository — CRUD for the `campaigns` table.
//!
//! The conversation id is write-once: [`CampaignRepo::set_conversation_id`]
//! only touches rows where it is still NULL, making the identity immutable
//! after the first successful remote call.

use adlab_core::{CampaignStatus, GenerationProfile};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::errors::Result;
use crate::row_types::CampaignRow;

/// Options for creating a campaign shell.
pub struct CreateCampaignOptions<'a> {
    /// Sequential campaign number (unique).
    pub number: u32,
    /// Product category.
    pub product: &'a str,
    /// Event category.
    pub event: &'a str,
    /// Assigned generation profile.
    pub profile: GenerationProfile,
}

const SELECT_COLUMNS: &str = "id, campaign_number, product_type, event_type, profile,
     conversation_id, status, created_at, started_at, completed_at";

fn map_row(row: &Row<'_>) -> rusqlite::Result<CampaignRow> {
    Ok(CampaignRow {
        id: row.get(0)?,
        campaign_number: row.get::<_, i64>(1)? as u32,
        product_type: row.get(2)?,
        event_type: row.get(3)?,
        profile: row.get(4)?,
        conversation_id: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
        started_at: row.get(8)?,
        completed_at: row.get(9)?,
    })
}

/// Campaign repository.
pub struct CampaignRepo;

impl CampaignRepo {
    /// Persist a campaign shell in `generating` state with a start
    /// timestamp, so partial runs are observable externally before the
    /// first remote call returns.
    pub fn create(conn: &Connection, opts: &CreateCampaignOptions<'_>) -> Result<CampaignRow> {
        let now = chrono::Utc::now().to_rfc3339();
        let _ = conn.execute(
            "INSERT INTO campaigns
             (campaign_number, product_type, event_type, profile, status, created_at, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                opts.number,
                opts.product,
                opts.event,
                opts.profile.as_str(),
                CampaignStatus::Generating.as_str(),
                now,
            ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(CampaignRow {
            id,
            campaign_number: opts.number,
            product_type: opts.product.to_string(),
            event_type: opts.event.to_string(),
            profile: opts.profile.as_str().to_string(),
            conversation_id: None,
            status: CampaignStatus::Generating.as_str().to_string(),
            created_at: now.clone(),
            started_at: Some(now),
            completed_at: None,
        })
    }

    /// Get a campaign by surrogate id.
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<CampaignRow>> {
        let row = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM campaigns WHERE id = ?1"),
                params![id],
                map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Get a campaign by its sequential number.
    pub fn get_by_number(conn: &Connection, number: u32) -> Result<Option<CampaignRow>> {
        let row = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM campaigns WHERE campaign_number = ?1"),
                params![number],
                map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Record the conversation identity assigned by the service.
    ///
    /// Write-once: returns `false` (and changes nothing) if an identity is
    /// already set.
    pub fn set_conversation_id(
        conn: &Connection,
        id: i64,
        conversation_id: &str,
    ) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE campaigns SET conversation_id = ?1
             WHERE id = ?2 AND conversation_id IS NULL",
            params![conversation_id, id],
        )?;
        Ok(changed > 0)
    }

    /// Set lifecycle status.
    pub fn set_status(conn: &Connection, id: i64, status: CampaignStatus) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE campaigns SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        Ok(changed > 0)
    }

    /// Set status to `completed` with a completion timestamp.
    pub fn mark_completed(conn: &Connection, id: i64) -> Result<bool> {
        let now = chrono::Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE campaigns SET status = ?1, completed_at = ?2 WHERE id = ?3",
            params![CampaignStatus::Completed.as_str(), now, id],
        )?;
        Ok(changed > 0)
    }

    /// Count all campaigns.
    pub fn count(conn: &Connection) -> Result<i64> {
        let count = conn.query_row("SELECT COUNT(*) FROM campaigns", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Count campaigns in one status.
    pub fn count_with_status(conn: &Connection, status: CampaignStatus) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM campaigns WHERE status = ?1",
            params![status.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Completed-campaign counts per generation profile.
    pub fn completed_count_by_profile(conn: &Connection) -> Result<Vec<(String, i64)>> {
        let mut stmt = conn.prepare(
            "SELECT profile, COUNT(*) FROM campaigns
             WHERE status = 'completed' GROUP BY profile ORDER BY profile",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Most recent failed campaigns, by campaign number.
    pub fn recent_failed(conn: &Connection, limit: u32) -> Result<Vec<CampaignRow>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM campaigns
             WHERE status = 'failed' ORDER BY campaign_number DESC LIMIT ?1"
        ))?;
        let rows = stmt
            .query_map(params![limit], map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
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

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn create(conn: &Connection, number: u32) -> CampaignRow {
        CampaignRepo::create(
            conn,
            &CreateCampaignOptions {
                number,
                product: "Smartphone",
                event: "Black Friday",
                profile: GenerationProfile::for_campaign(number),
            },
        )
        .unwrap()
    }

    #[test]
    fn create_persists_generating_shell() {
        let conn = setup();
        let campaign = create(&conn, 1);

        assert_eq!(campaign.campaign_number, 1);
        assert_eq!(campaign.status, "generating");
        assert_eq!(campaign.profile, "speed");
        assert!(campaign.started_at.is_some());
        assert!(campaign.conversation_id.is_none());

        let found = CampaignRepo::get_by_id(&conn, campaign.id).unwrap().unwrap();
        assert_eq!(found, campaign);
    }

    #[test]
    fn create_duplicate_number_fails() {
        let conn = setup();
        create(&conn, 1);
        let result = CampaignRepo::create(
            &conn,
            &CreateCampaignOptions {
                number: 1,
                product: "Laptop",
                event: "Christmas",
                profile: GenerationProfile::Balanced,
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn get_by_number() {
        let conn = setup();
        let campaign = create(&conn, 7);
        let found = CampaignRepo::get_by_number(&conn, 7).unwrap().unwrap();
        assert_eq!(found.id, campaign.id);
        assert!(CampaignRepo::get_by_number(&conn, 8).unwrap().is_none());
    }

    #[test]
    fn conversation_id_is_write_once() {
        let conn = setup();
        let campaign = create(&conn, 1);

        assert!(CampaignRepo::set_conversation_id(&conn, campaign.id, "conv-1").unwrap());
        assert!(!CampaignRepo::set_conversation_id(&conn, campaign.id, "conv-2").unwrap());

        let found = CampaignRepo::get_by_id(&conn, campaign.id).unwrap().unwrap();
        assert_eq!(found.conversation_id.as_deref(), Some("conv-1"));
    }

    #[test]
    fn mark_completed_sets_timestamp() {
        let conn = setup();
        let campaign = create(&conn, 1);
        assert!(CampaignRepo::mark_completed(&conn, campaign.id).unwrap());

        let found = CampaignRepo::get_by_id(&conn, campaign.id).unwrap().unwrap();
        assert_eq!(found.status, "completed");
        assert!(found.completed_at.is_some());
    }

    #[test]
    fn status_counts() {
        let conn = setup();
        let a = create(&conn, 1);
        let b = create(&conn, 2);
        create(&conn, 3);
        CampaignRepo::mark_completed(&conn, a.id).unwrap();
        CampaignRepo::set_status(&conn, b.id, CampaignStatus::Failed).unwrap();

        assert_eq!(CampaignRepo::count(&conn).unwrap(), 3);
        assert_eq!(
            CampaignRepo::count_with_status(&conn, CampaignStatus::Completed).unwrap(),
            1
        );
        assert_eq!(
            CampaignRepo::count_with_status(&conn, CampaignStatus::Failed).unwrap(),
            1
        );
        assert_eq!(
            CampaignRepo::count_with_status(&conn, CampaignStatus::Generating).unwrap(),
            1
        );
    }

    #[test]
    fn recent_failed_is_limited_and_ordered() {
        let conn = setup();
        for number in 1..=4 {
            let campaign = create(&conn, number);
            CampaignRepo::set_status(&conn, campaign.id, CampaignStatus::Failed).unwrap();
        }
        let failed = CampaignRepo::recent_failed(&conn, 2).unwrap();
        assert_eq!(failed.len(), 2);
        assert_eq!(failed[0].campaign_number, 4);
        assert_eq!(failed[1].campaign_number, 3);
    }

    #[test]
    fn completed_count_by_profile() {
        let conn = setup();
        for number in 1..=6 {
            let campaign = create(&conn, number);
            CampaignRepo::mark_completed(&conn, campaign.id).unwrap();
        }
        let counts = CampaignRepo::completed_count_by_profile(&conn).unwrap();
        assert_eq!(counts.len(), 3);
        assert!(counts.iter().all(|(_, count)| *count == 2));
    }
}
