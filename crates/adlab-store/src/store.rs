//! High-level transactional `CampaignStore` API.
//!
//! Composes the per-table repositories into per-stage methods. Every write
//! method runs inside a single transaction so a crash mid-stage never
//! leaves a campaign with, say, content but no timing row.

use adlab_core::{CampaignDescriptor, CampaignStatus, GenerationProfile};
use rusqlite::OptionalExtension;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use std::path::Path;

use crate::connection::{ConnectionPool, PooledConnection, open_in_memory, open_pool};
use crate::errors::{Result, StoreError};
use crate::report::{ExtractRow, fetch_extract};
use crate::repositories::campaign::{CampaignRepo, CreateCampaignOptions};
use crate::repositories::cost::{CostRepo, InsertCostOptions};
use crate::repositories::evaluation::{EvaluationRepo, InsertEvaluationOptions};
use crate::repositories::image::{ImageRepo, InsertImageOptions};
use crate::repositories::text_content::{InsertTextContentOptions, TextContentRepo};
use crate::repositories::timing::TimingRepo;
use crate::row_types::{
    CampaignRow, CostRow, EvaluationRow, ImageRow, TextContentRow, TimingRow,
};

/// Everything the text stage persists, in one transaction.
#[derive(Debug, Clone)]
pub struct TextStageRecord {
    /// Conversation identity from the first successful call.
    pub conversation_id: Option<String>,
    /// Parsed headline.
    pub headline: Option<String>,
    /// Parsed description.
    pub description: Option<String>,
    /// Parsed call-to-action.
    pub cta: Option<String>,
    /// Parsed keyword list.
    pub keywords: Vec<String>,
    /// Service message id.
    pub message_id: Option<String>,
    /// Raw structured response.
    pub raw_response: Value,
    /// Stage duration in seconds.
    pub elapsed_secs: f64,
    /// Stage cost.
    pub cost: f64,
    /// Prompt tokens.
    pub prompt_tokens: u64,
    /// Completion tokens.
    pub completion_tokens: u64,
    /// Total tokens.
    pub total_tokens: u64,
    /// Cost currency.
    pub currency: String,
}

/// Everything the image stage persists.
#[derive(Debug, Clone)]
pub struct ImageStageRecord {
    /// Download URL of the generated file.
    pub image_url: Option<String>,
    /// Prompt the image was generated from.
    pub image_prompt: String,
    /// Profile used.
    pub profile: GenerationProfile,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Service message id.
    pub message_id: Option<String>,
    /// Service file id.
    pub file_id: Option<String>,
    /// Stage duration in seconds.
    pub elapsed_secs: f64,
    /// Stage cost.
    pub cost: f64,
}

/// Everything the evaluation stage persists.
#[derive(Debug, Clone)]
pub struct EvaluationStageRecord {
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
    pub feedback: String,
    /// Recommendation list.
    pub recommendations: Vec<String>,
    /// Service message id.
    pub message_id: Option<String>,
    /// Raw structured response.
    pub raw_response: Value,
    /// Stage duration in seconds.
    pub elapsed_secs: f64,
    /// Stage cost.
    pub cost: f64,
}

/// One campaign with all its satellites, read back by value.
#[derive(Debug, Clone)]
pub struct CampaignRecord {
    /// The campaign row.
    pub campaign: CampaignRow,
    /// Text content, when the text stage succeeded.
    pub text: Option<TextContentRow>,
    /// Generated images, insertion order.
    pub images: Vec<ImageRow>,
    /// Evaluation, when the evaluation stage succeeded.
    pub evaluation: Option<EvaluationRow>,
    /// Stage timings.
    pub timing: Option<TimingRow>,
    /// Stage costs.
    pub cost: Option<CostRow>,
}

/// Campaign counts per lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    /// All campaigns.
    pub total: i64,
    /// Status `pending`.
    pub pending: i64,
    /// Status `generating`.
    pub generating: i64,
    /// Status `completed`.
    pub completed: i64,
    /// Status `failed`.
    pub failed: i64,
}

/// Mean evaluation scores over completed campaigns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AverageScores {
    /// Mean overall score.
    pub overall: f64,
    /// Mean relevance score.
    pub relevance: f64,
    /// Mean clarity score.
    pub clarity: f64,
    /// Mean persuasiveness score.
    pub persuasiveness: f64,
    /// Mean brand-safety score.
    pub brand_safety: f64,
}

/// High-level campaign store over a connection pool.
///
/// Acquired once at batch start; the pool is released when the store is
/// dropped on any exit path.
pub struct CampaignStore {
    pool: ConnectionPool,
}

impl CampaignStore {
    /// Wrap an existing pool.
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    /// Open a file-backed store, applying migrations.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(open_pool(path)?))
    }

    /// Open an in-memory store. Test use only.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(open_in_memory()?))
    }

    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    /// Persist the campaign shell before the first remote call.
    pub fn create_campaign(
        &self,
        descriptor: &CampaignDescriptor,
        profile: GenerationProfile,
    ) -> Result<CampaignRow> {
        let conn = self.conn()?;
        CampaignRepo::create(
            &conn,
            &CreateCampaignOptions {
                number: descriptor.number,
                product: &descriptor.product,
                event: &descriptor.event,
                profile,
            },
        )
    }

    /// Record a successful text stage: conversation identity, content,
    /// timing, and cost, atomically.
    pub fn record_text_stage(&self, campaign_id: i64, record: &TextStageRecord) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        if let Some(ref conversation_id) = record.conversation_id {
            let _ = CampaignRepo::set_conversation_id(&tx, campaign_id, conversation_id)?;
        }
        let _ = TextContentRepo::insert(
            &tx,
            &InsertTextContentOptions {
                campaign_id,
                headline: record.headline.as_deref(),
                description: record.description.as_deref(),
                cta: record.cta.as_deref(),
                keywords: &record.keywords,
                message_id: record.message_id.as_deref(),
                raw_response: &record.raw_response,
            },
        )?;
        let _ = TimingRepo::insert_text(&tx, campaign_id, record.elapsed_secs)?;
        let _ = CostRepo::insert_text(
            &tx,
            &InsertCostOptions {
                campaign_id,
                text_cost: record.cost,
                prompt_tokens: record.prompt_tokens,
                completion_tokens: record.completion_tokens,
                total_tokens: record.total_tokens,
                currency: &record.currency,
            },
        )?;
        tx.commit()?;
        debug!(campaign_id, elapsed_secs = record.elapsed_secs, "text stage recorded");
        Ok(())
    }

    /// Record a successful image stage atomically.
    pub fn record_image_stage(&self, campaign_id: i64, record: &ImageStageRecord) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let _ = ImageRepo::insert(
            &tx,
            &InsertImageOptions {
                campaign_id,
                image_url: record.image_url.as_deref(),
                image_prompt: &record.image_prompt,
                profile: record.profile.as_str(),
                width: record.width,
                height: record.height,
                steps: record.profile.steps(),
                message_id: record.message_id.as_deref(),
                file_id: record.file_id.as_deref(),
            },
        )?;
        let _ = TimingRepo::set_image(&tx, campaign_id, record.elapsed_secs)?;
        let _ = CostRepo::set_image(&tx, campaign_id, record.cost)?;
        tx.commit()?;
        debug!(campaign_id, elapsed_secs = record.elapsed_secs, "image stage recorded");
        Ok(())
    }

    /// Record a successful evaluation stage atomically.
    pub fn record_evaluation_stage(
        &self,
        campaign_id: i64,
        record: &EvaluationStageRecord,
    ) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let _ = EvaluationRepo::insert(
            &tx,
            &InsertEvaluationOptions {
                campaign_id,
                relevance: record.relevance,
                clarity: record.clarity,
                persuasiveness: record.persuasiveness,
                brand_safety: record.brand_safety,
                overall: record.overall,
                feedback: &record.feedback,
                recommendations: &record.recommendations,
                message_id: record.message_id.as_deref(),
                raw_response: &record.raw_response,
            },
        )?;
        let _ = TimingRepo::set_evaluation(&tx, campaign_id, record.elapsed_secs)?;
        let _ = CostRepo::set_evaluation(&tx, campaign_id, record.cost)?;
        tx.commit()?;
        debug!(campaign_id, elapsed_secs = record.elapsed_secs, "evaluation stage recorded");
        Ok(())
    }

    /// Terminal transition to `completed`: rolls up total time and cost
    /// over whichever stages were recorded, then flips the status.
    /// Returns `(total_secs, total_cost)`.
    pub fn mark_completed(&self, campaign_id: i64) -> Result<(f64, f64)> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let total_secs = TimingRepo::finalize_total(&tx, campaign_id)?;
        let total_cost = CostRepo::finalize_total(&tx, campaign_id)?;
        if !CampaignRepo::mark_completed(&tx, campaign_id)? {
            return Err(StoreError::CampaignNotFound(campaign_id));
        }
        tx.commit()?;
        Ok((total_secs, total_cost))
    }

    /// Terminal transition to `failed`.
    pub fn mark_failed(&self, campaign_id: i64) -> Result<()> {
        let conn = self.conn()?;
        if !CampaignRepo::set_status(&conn, campaign_id, CampaignStatus::Failed)? {
            return Err(StoreError::CampaignNotFound(campaign_id));
        }
        Ok(())
    }

    /// Read one campaign with all its satellites.
    pub fn get_campaign(&self, number: u32) -> Result<Option<CampaignRecord>> {
        let conn = self.conn()?;
        let Some(campaign) = CampaignRepo::get_by_number(&conn, number)? else {
            return Ok(None);
        };
        let id = campaign.id;
        Ok(Some(CampaignRecord {
            text: TextContentRepo::get_by_campaign(&conn, id)?,
            images: ImageRepo::list_by_campaign(&conn, id)?,
            evaluation: EvaluationRepo::get_by_campaign(&conn, id)?,
            timing: TimingRepo::get_by_campaign(&conn, id)?,
            cost: CostRepo::get_by_campaign(&conn, id)?,
            campaign,
        }))
    }

    /// Campaign counts per status.
    pub fn status_counts(&self) -> Result<StatusCounts> {
        let conn = self.conn()?;
        Ok(StatusCounts {
            total: CampaignRepo::count(&conn)?,
            pending: CampaignRepo::count_with_status(&conn, CampaignStatus::Pending)?,
            generating: CampaignRepo::count_with_status(&conn, CampaignStatus::Generating)?,
            completed: CampaignRepo::count_with_status(&conn, CampaignStatus::Completed)?,
            failed: CampaignRepo::count_with_status(&conn, CampaignStatus::Failed)?,
        })
    }

    /// Completed-campaign counts per generation profile.
    pub fn completed_by_profile(&self) -> Result<Vec<(String, i64)>> {
        let conn = self.conn()?;
        CampaignRepo::completed_count_by_profile(&conn)
    }

    /// Mean evaluation scores over completed campaigns; `None` when no
    /// completed campaign has an evaluation.
    pub fn average_scores(&self) -> Result<Option<AverageScores>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT AVG(e.overall_score), AVG(e.relevance_score), AVG(e.clarity_score),
                        AVG(e.persuasiveness_score), AVG(e.brand_safety_score)
                 FROM evaluations e
                 JOIN campaigns c ON c.id = e.campaign_id
                 WHERE c.status = 'completed'",
                [],
                |row| {
                    Ok((
                        row.get::<_, Option<f64>>(0)?,
                        row.get::<_, Option<f64>>(1)?,
                        row.get::<_, Option<f64>>(2)?,
                        row.get::<_, Option<f64>>(3)?,
                        row.get::<_, Option<f64>>(4)?,
                    ))
                },
            )
            .optional()?;
        Ok(row.and_then(|(overall, relevance, clarity, persuasiveness, brand_safety)| {
            Some(AverageScores {
                overall: overall?,
                relevance: relevance?,
                clarity: clarity?,
                persuasiveness: persuasiveness?,
                brand_safety: brand_safety?,
            })
        }))
    }

    /// Most recent failed campaigns.
    pub fn recent_failures(&self, limit: u32) -> Result<Vec<CampaignRow>> {
        let conn = self.conn()?;
        CampaignRepo::recent_failed(&conn, limit)
    }

    /// Flat analysis extract over completed campaigns.
    pub fn extract(&self) -> Result<Vec<ExtractRow>> {
        let conn = self.conn()?;
        fetch_extract(&conn)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
