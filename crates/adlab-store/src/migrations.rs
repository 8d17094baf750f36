//! Schema definition.
//!
//! Idempotent `CREATE TABLE IF NOT EXISTS` batch, applied on every pool
//! open. Satellite tables reference `campaigns(id)`; the 1:1 satellites
//! (text content, evaluation, timing, cost) enforce uniqueness on the
//! campaign id, images are 1:N.

use rusqlite::Connection;

use crate::errors::Result;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS campaigns (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    campaign_number INTEGER NOT NULL UNIQUE,
    product_type    TEXT NOT NULL,
    event_type      TEXT NOT NULL,
    profile         TEXT NOT NULL,
    conversation_id TEXT UNIQUE,
    status          TEXT NOT NULL DEFAULT 'pending',
    created_at      TEXT NOT NULL,
    started_at      TEXT,
    completed_at    TEXT
);
CREATE INDEX IF NOT EXISTS idx_campaigns_status ON campaigns(status);

CREATE TABLE IF NOT EXISTS text_content (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    campaign_id  INTEGER NOT NULL UNIQUE REFERENCES campaigns(id),
    headline     TEXT,
    description  TEXT,
    cta          TEXT,
    keywords     TEXT NOT NULL DEFAULT '[]',
    message_id   TEXT,
    raw_response TEXT,
    generated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS images (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    campaign_id  INTEGER NOT NULL REFERENCES campaigns(id),
    image_url    TEXT,
    image_prompt TEXT,
    profile      TEXT,
    width        INTEGER,
    height       INTEGER,
    steps        INTEGER,
    seed         INTEGER,
    message_id   TEXT,
    file_id      TEXT,
    generated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_images_campaign ON images(campaign_id);

CREATE TABLE IF NOT EXISTS evaluations (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    campaign_id          INTEGER NOT NULL UNIQUE REFERENCES campaigns(id),
    relevance_score      REAL,
    clarity_score        REAL,
    persuasiveness_score REAL,
    brand_safety_score   REAL,
    overall_score        REAL,
    feedback             TEXT,
    recommendations      TEXT NOT NULL DEFAULT '[]',
    message_id           TEXT,
    raw_response         TEXT,
    evaluated_at         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS timing_metrics (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    campaign_id          INTEGER NOT NULL UNIQUE REFERENCES campaigns(id),
    text_generation_secs REAL,
    image_generation_secs REAL,
    evaluation_secs      REAL,
    total_secs           REAL,
    created_at           TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cost_metrics (
    id                    INTEGER PRIMARY KEY AUTOINCREMENT,
    campaign_id           INTEGER NOT NULL UNIQUE REFERENCES campaigns(id),
    text_generation_cost  REAL NOT NULL DEFAULT 0,
    image_generation_cost REAL NOT NULL DEFAULT 0,
    evaluation_cost       REAL NOT NULL DEFAULT 0,
    total_cost            REAL NOT NULL DEFAULT 0,
    prompt_tokens         INTEGER NOT NULL DEFAULT 0,
    completion_tokens     INTEGER NOT NULL DEFAULT 0,
    total_tokens          INTEGER NOT NULL DEFAULT 0,
    currency              TEXT NOT NULL DEFAULT 'USD',
    created_at            TEXT NOT NULL
);
";

/// Apply the schema. Safe to run on every open.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
    }

    #[test]
    fn conversation_id_is_unique() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let insert = "INSERT INTO campaigns
            (campaign_number, product_type, event_type, profile, conversation_id, status, created_at)
            VALUES (?1, 'Laptop', 'Christmas', 'speed', 'conv-1', 'pending', '2026-01-01T00:00:00Z')";
        let _ = conn.execute(insert, [1]).unwrap();
        assert!(conn.execute(insert, [2]).is_err());
    }
}
