//! The per-campaign state machine.
//!
//! `Pending → Generating → (TextDone | Failed) → (ImageAttempted) →
//! (EvalAttempted) → Completed | Failed`. The text stage is foundational:
//! without parseable text content and the conversation identity it yields,
//! no later stage can run, so its failure is a hard stop. Image and
//! evaluation are best-effort enrichment; their failures are logged and the
//! campaign still completes. Persistence failures in any stage force
//! `Failed`.

use std::time::Duration;

use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use adlab_core::structured::{f64_field, str_field, str_list_field};
use adlab_core::{
    CampaignDescriptor, GenerationProfile, StageKind, StageOutcome, StructuredParseError,
    parse_structured,
};
use adlab_dify::{DifyClient, DifyError};
use adlab_store::{
    CampaignStore, EvaluationStageRecord, ImageStageRecord, StoreError, TextStageRecord,
};

/// Per-stage call timeouts.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Timeout for the text-generation call.
    pub text_timeout: Duration,
    /// Timeout for the image-generation call.
    pub image_timeout: Duration,
    /// Timeout for the evaluation call.
    pub evaluation_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            text_timeout: Duration::from_secs(120),
            image_timeout: Duration::from_secs(120),
            evaluation_timeout: Duration::from_secs(60),
        }
    }
}

/// Why a stage produced no usable result.
///
/// Decode failures are reported distinctly from transport failures for
/// diagnostics; the pipeline handles both the same way.
#[derive(Debug, Error)]
pub enum StageError {
    /// The remote call itself failed.
    #[error("remote call failed: {0}")]
    Transport(#[from] DifyError),
    /// The call succeeded but the stream carried no answer text.
    #[error("response carried no answer text")]
    EmptyAnswer {
        /// Wall-clock time of the call.
        elapsed: Duration,
    },
    /// The answer text was not parseable structured content.
    #[error("answer was not parseable structured content: {source}")]
    Parse {
        /// The underlying extraction failure.
        source: StructuredParseError,
        /// Wall-clock time of the call.
        elapsed: Duration,
    },
    /// The image response attached no files.
    #[error("image response attached no files")]
    NoFiles {
        /// Wall-clock time of the call.
        elapsed: Duration,
    },
    /// Recording the stage failed; forces campaign failure even in
    /// best-effort stages.
    #[error("persisting stage result failed: {0}")]
    Storage(#[from] StoreError),
}

impl StageError {
    /// Wall-clock time attributable to the failed stage.
    pub fn elapsed(&self) -> Duration {
        match self {
            Self::Transport(error) => error.elapsed(),
            Self::EmptyAnswer { elapsed }
            | Self::Parse { elapsed, .. }
            | Self::NoFiles { elapsed } => *elapsed,
            Self::Storage(_) => Duration::ZERO,
        }
    }

    fn is_fatal(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    fn outcome(&self) -> StageOutcome {
        StageOutcome {
            succeeded: false,
            elapsed: self.elapsed(),
            cost: 0.0,
        }
    }
}

/// Per-campaign result handed back to the batch runner.
#[derive(Debug, Clone, Copy)]
pub struct CampaignReport {
    /// Campaign number.
    pub campaign_number: u32,
    /// Whether the campaign reached `completed`.
    pub completed: bool,
    /// Text-stage outcome.
    pub text: StageOutcome,
    /// Image-stage outcome.
    pub image: StageOutcome,
    /// Evaluation-stage outcome.
    pub evaluation: StageOutcome,
    /// Total recorded duration across stages, seconds.
    pub total_secs: f64,
    /// Total recorded cost across stages.
    pub total_cost: f64,
}

impl CampaignReport {
    fn new(campaign_number: u32) -> Self {
        Self {
            campaign_number,
            completed: false,
            text: StageOutcome::skipped(),
            image: StageOutcome::skipped(),
            evaluation: StageOutcome::skipped(),
            total_secs: 0.0,
            total_cost: 0.0,
        }
    }
}

/// Text-stage products needed by the later stages.
struct TextArtifacts {
    conversation_id: Option<String>,
    headline: Option<String>,
    description: Option<String>,
    cta: Option<String>,
}

fn opt_str(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(String::from)
}

/// Drives one campaign through its three stages against the service and
/// the store.
pub struct CampaignPipeline<'a> {
    client: &'a DifyClient,
    store: &'a CampaignStore,
    config: PipelineConfig,
}

impl<'a> CampaignPipeline<'a> {
    /// Create a pipeline over shared collaborators.
    #[must_use]
    pub fn new(client: &'a DifyClient, store: &'a CampaignStore, config: PipelineConfig) -> Self {
        Self {
            client,
            store,
            config,
        }
    }

    /// Run one campaign to a terminal state.
    ///
    /// Returns the per-stage report; `Err` only for store failures outside
    /// any stage (shell creation, terminal transitions).
    #[instrument(skip_all, fields(campaign = descriptor.number))]
    pub async fn run(
        &self,
        descriptor: &CampaignDescriptor,
    ) -> Result<CampaignReport, StoreError> {
        let profile = GenerationProfile::for_campaign(descriptor.number);
        info!(
            product = %descriptor.product,
            event = %descriptor.event,
            profile = profile.as_str(),
            "starting campaign"
        );

        // Persist the shell first so partial runs are observable.
        let campaign = self.store.create_campaign(descriptor, profile)?;
        let mut report = CampaignReport::new(descriptor.number);

        let artifacts = match self.text_stage(campaign.id, descriptor).await {
            Ok((artifacts, outcome)) => {
                report.text = outcome;
                artifacts
            }
            Err(stage_error) => {
                error!(
                    stage = StageKind::Text.as_str(),
                    error = %stage_error,
                    "text stage failed, aborting campaign"
                );
                report.text = stage_error.outcome();
                self.store.mark_failed(campaign.id)?;
                return Ok(report);
            }
        };

        if let Some(ref conversation_id) = artifacts.conversation_id {
            match self
                .image_stage(campaign.id, conversation_id, profile, &artifacts)
                .await
            {
                Ok(outcome) => report.image = outcome,
                Err(stage_error) => {
                    report.image = stage_error.outcome();
                    if stage_error.is_fatal() {
                        error!(stage = StageKind::Image.as_str(), error = %stage_error, "aborting campaign");
                        self.store.mark_failed(campaign.id)?;
                        return Ok(report);
                    }
                    warn!(
                        stage = StageKind::Image.as_str(),
                        error = %stage_error,
                        "image stage failed, continuing"
                    );
                }
            }

            match self
                .evaluation_stage(campaign.id, conversation_id, descriptor, &artifacts)
                .await
            {
                Ok(outcome) => report.evaluation = outcome,
                Err(stage_error) => {
                    report.evaluation = stage_error.outcome();
                    if stage_error.is_fatal() {
                        error!(stage = StageKind::Evaluation.as_str(), error = %stage_error, "aborting campaign");
                        self.store.mark_failed(campaign.id)?;
                        return Ok(report);
                    }
                    warn!(
                        stage = StageKind::Evaluation.as_str(),
                        error = %stage_error,
                        "evaluation stage failed, continuing"
                    );
                }
            }
        } else {
            warn!("no conversation id returned, skipping image and evaluation");
        }

        let (total_secs, total_cost) = self.store.mark_completed(campaign.id)?;
        report.completed = true;
        report.total_secs = total_secs;
        report.total_cost = total_cost;
        info!(total_secs, total_cost, "campaign completed");
        Ok(report)
    }

    /// Generate and persist text content. Starts the conversation.
    async fn text_stage(
        &self,
        campaign_id: i64,
        descriptor: &CampaignDescriptor,
    ) -> Result<(TextArtifacts, StageOutcome), StageError> {
        let outcome = self
            .client
            .generate_content(&descriptor.product, &descriptor.event, self.config.text_timeout)
            .await?;
        let answer = outcome.answer.as_deref().ok_or(StageError::EmptyAnswer {
            elapsed: outcome.elapsed,
        })?;
        let parsed = parse_structured(answer).map_err(|source| StageError::Parse {
            source,
            elapsed: outcome.elapsed,
        })?;

        let artifacts = TextArtifacts {
            conversation_id: outcome.result.conversation_id.clone(),
            headline: opt_str(&parsed, "headline"),
            description: opt_str(&parsed, "description"),
            cta: opt_str(&parsed, "cta"),
        };
        let usage = &outcome.result.usage;
        let record = TextStageRecord {
            conversation_id: artifacts.conversation_id.clone(),
            headline: artifacts.headline.clone(),
            description: artifacts.description.clone(),
            cta: artifacts.cta.clone(),
            keywords: str_list_field(&parsed, "keywords"),
            message_id: outcome.result.message_id.clone(),
            raw_response: parsed,
            elapsed_secs: outcome.elapsed.as_secs_f64(),
            cost: usage.total_price,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
            currency: usage.currency.clone(),
        };
        self.store.record_text_stage(campaign_id, &record)?;
        debug!(
            stage = StageKind::Text.as_str(),
            elapsed_secs = record.elapsed_secs,
            "text stage recorded"
        );
        Ok((
            artifacts,
            StageOutcome {
                succeeded: true,
                elapsed: outcome.elapsed,
                cost: record.cost,
            },
        ))
    }

    /// Generate and persist an image within the campaign's conversation.
    ///
    /// The prompt grounds the image in the generated text: headline plus
    /// the first 200 characters of the description.
    async fn image_stage(
        &self,
        campaign_id: i64,
        conversation_id: &str,
        profile: GenerationProfile,
        artifacts: &TextArtifacts,
    ) -> Result<StageOutcome, StageError> {
        let description: String = artifacts
            .description
            .as_deref()
            .unwrap_or_default()
            .chars()
            .take(200)
            .collect();
        let prompt = format!(
            "{}. {description}",
            artifacts.headline.as_deref().unwrap_or_default()
        );

        let outcome = self
            .client
            .generate_image(&prompt, conversation_id, self.config.image_timeout)
            .await?;
        // A successful call with no attached files is still a failed stage.
        let Some(file) = outcome.result.files.first() else {
            return Err(StageError::NoFiles {
                elapsed: outcome.elapsed,
            });
        };

        let record = ImageStageRecord {
            image_url: Some(file.url.clone()),
            image_prompt: prompt,
            profile,
            width: 1024,
            height: 1024,
            message_id: outcome.result.message_id.clone(),
            file_id: file.id.clone(),
            elapsed_secs: outcome.elapsed.as_secs_f64(),
            cost: outcome.result.usage.total_price,
        };
        self.store.record_image_stage(campaign_id, &record)?;
        debug!(
            stage = StageKind::Image.as_str(),
            elapsed_secs = record.elapsed_secs,
            "image stage recorded"
        );
        Ok(StageOutcome {
            succeeded: true,
            elapsed: outcome.elapsed,
            cost: record.cost,
        })
    }

    /// Ask the service to score the campaign and persist the evaluation.
    async fn evaluation_stage(
        &self,
        campaign_id: i64,
        conversation_id: &str,
        descriptor: &CampaignDescriptor,
        artifacts: &TextArtifacts,
    ) -> Result<StageOutcome, StageError> {
        let campaign_data = json!({
            "product": descriptor.product,
            "event": descriptor.event,
            "headline": artifacts.headline.clone().unwrap_or_default(),
            "description": artifacts.description.clone().unwrap_or_default(),
            "cta": artifacts.cta.clone().unwrap_or_default(),
        });

        let outcome = self
            .client
            .evaluate(&campaign_data, conversation_id, self.config.evaluation_timeout)
            .await?;
        let answer = outcome.answer.as_deref().ok_or(StageError::EmptyAnswer {
            elapsed: outcome.elapsed,
        })?;
        let parsed = parse_structured(answer).map_err(|source| StageError::Parse {
            source,
            elapsed: outcome.elapsed,
        })?;

        let record = EvaluationStageRecord {
            relevance: f64_field(&parsed, "relevance"),
            clarity: f64_field(&parsed, "clarity"),
            persuasiveness: f64_field(&parsed, "persuasiveness"),
            brand_safety: f64_field(&parsed, "brand_safety"),
            overall: f64_field(&parsed, "overall_score"),
            feedback: str_field(&parsed, "feedback"),
            recommendations: str_list_field(&parsed, "recommendations"),
            message_id: outcome.result.message_id.clone(),
            raw_response: parsed,
            elapsed_secs: outcome.elapsed.as_secs_f64(),
            cost: outcome.result.usage.total_price,
        };
        self.store.record_evaluation_stage(campaign_id, &record)?;
        debug!(
            stage = StageKind::Evaluation.as_str(),
            elapsed_secs = record.elapsed_secs,
            "evaluation stage recorded"
        );
        Ok(StageOutcome {
            succeeded: true,
            elapsed: outcome.elapsed,
            cost: record.cost,
        })
    }
}
