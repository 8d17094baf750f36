//! Row structs mirroring table columns.
//!
//! Plain value structs keyed by campaign identity; no lazy loading, no
//! back-references. The pipeline threads these directly.

/// `campaigns` row.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignRow {
    /// Surrogate key.
    pub id: i64,
    /// Sequential campaign number, unique.
    pub campaign_number: u32,
    /// Product category.
    pub product_type: String,
    /// Event category.
    pub event_type: String,
    /// Generation profile storage repr (`speed` / `balanced` / `quality`).
    pub profile: String,
    /// Conversation identity; set at most once after the first successful
    /// remote call.
    pub conversation_id: Option<String>,
    /// Lifecycle status storage repr.
    pub status: String,
    /// Creation timestamp, RFC 3339.
    pub created_at: String,
    /// Start timestamp.
    pub started_at: Option<String>,
    /// Completion timestamp.
    pub completed_at: Option<String>,
}

/// `text_content` row.
#[derive(Debug, Clone, PartialEq)]
pub struct TextContentRow {
    /// Surrogate key.
    pub id: i64,
    /// Owning campaign.
    pub campaign_id: i64,
    /// Generated headline.
    pub headline: Option<String>,
    /// Generated description.
    pub description: Option<String>,
    /// Generated call-to-action.
    pub cta: Option<String>,
    /// Keyword list, stored as a JSON array.
    pub keywords: Vec<String>,
    /// Service message id.
    pub message_id: Option<String>,
    /// Raw structured response, stored as JSON.
    pub raw_response: Option<serde_json::Value>,
}

/// `images` row.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRow {
    /// Surrogate key.
    pub id: i64,
    /// Owning campaign.
    pub campaign_id: i64,
    /// Download URL of the generated file.
    pub image_url: Option<String>,
    /// Prompt the image was generated from.
    pub image_prompt: Option<String>,
    /// Generation profile used.
    pub profile: Option<String>,
    /// Width in pixels.
    pub width: Option<u32>,
    /// Height in pixels.
    pub height: Option<u32>,
    /// Diffusion step count.
    pub steps: Option<u32>,
    /// Seed, when reported.
    pub seed: Option<i64>,
    /// Service message id.
    pub message_id: Option<String>,
    /// Service file id.
    pub file_id: Option<String>,
}

/// `evaluations` row.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRow {
    /// Surrogate key.
    pub id: i64,
    /// Owning campaign.
    pub campaign_id: i64,
    /// Relevance score, 0–10.
    pub relevance_score: f64,
    /// Clarity score, 0–10.
    pub clarity_score: f64,
    /// Persuasiveness score, 0–10.
    pub persuasiveness_score: f64,
    /// Brand-safety score, 0–10.
    pub brand_safety_score: f64,
    /// Overall score, 0–10.
    pub overall_score: f64,
    /// Free-text feedback.
    pub feedback: Option<String>,
    /// Recommendation list, stored as a JSON array.
    pub recommendations: Vec<String>,
    /// Service message id.
    pub message_id: Option<String>,
    /// Raw structured response, stored as JSON.
    pub raw_response: Option<serde_json::Value>,
}

/// `timing_metrics` row; durations in seconds, absent stages are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingRow {
    /// Surrogate key.
    pub id: i64,
    /// Owning campaign.
    pub campaign_id: i64,
    /// Text stage duration.
    pub text_generation_secs: Option<f64>,
    /// Image stage duration.
    pub image_generation_secs: Option<f64>,
    /// Evaluation stage duration.
    pub evaluation_secs: Option<f64>,
    /// Sum of recorded stages.
    pub total_secs: Option<f64>,
}

/// `cost_metrics` row; absent stages contribute zero.
#[derive(Debug, Clone, PartialEq)]
pub struct CostRow {
    /// Surrogate key.
    pub id: i64,
    /// Owning campaign.
    pub campaign_id: i64,
    /// Text stage cost.
    pub text_generation_cost: f64,
    /// Image stage cost.
    pub image_generation_cost: f64,
    /// Evaluation stage cost.
    pub evaluation_cost: f64,
    /// Sum of stage costs.
    pub total_cost: f64,
    /// Prompt tokens of the text stage.
    pub prompt_tokens: u64,
    /// Completion tokens of the text stage.
    pub completion_tokens: u64,
    /// Total tokens of the text stage.
    pub total_tokens: u64,
    /// Cost currency.
    pub currency: String,
}
