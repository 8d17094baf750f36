//! Environment configuration.
//!
//! Everything has a compiled default except the service credentials, which
//! are validated up front when a mode needs them rather than failing deep
//! inside the first remote call.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use adlab_runner::PipelineConfig;

/// Credentials for the conversational service.
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    /// Service base URL (`DIFY_API_BASE_URL`).
    pub base_url: String,
    /// Bearer token (`DIFY_API_KEY`).
    pub api_key: String,
}

/// Harness configuration assembled from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    base_url: Option<String>,
    api_key: Option<String>,
    /// User tag sent with every request (`ADLAB_USER`).
    pub user: String,
    /// Database path (`ADLAB_DATABASE`).
    pub database: PathBuf,
    /// Default campaign count for a batch (`TOTAL_CAMPAIGNS`).
    pub total_campaigns: u32,
    /// Delay between campaigns (`ADLAB_PACING_SECS`).
    pub pacing: Duration,
    /// Text-stage call timeout (`ADLAB_TEXT_TIMEOUT_SECS`).
    pub text_timeout: Duration,
    /// Image-stage call timeout (`ADLAB_IMAGE_TIMEOUT_SECS`).
    pub image_timeout: Duration,
    /// Evaluation-stage call timeout (`ADLAB_EVALUATION_TIMEOUT_SECS`).
    pub evaluation_timeout: Duration,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load settings through a variable lookup. Test seam.
    ///
    /// Credentials are not validated here; modes that never talk to the
    /// service (`status`, `analyze`) run without them.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = PipelineConfig::default();
        Ok(Self {
            base_url: lookup("DIFY_API_BASE_URL"),
            api_key: lookup("DIFY_API_KEY"),
            user: lookup("ADLAB_USER").unwrap_or_else(|| "research_bot".to_string()),
            database: lookup("ADLAB_DATABASE")
                .map_or_else(|| PathBuf::from("adlab.db"), PathBuf::from),
            total_campaigns: parsed(&lookup, "TOTAL_CAMPAIGNS", 100)?,
            pacing: Duration::from_secs(parsed(&lookup, "ADLAB_PACING_SECS", 1)?),
            text_timeout: secs_or(&lookup, "ADLAB_TEXT_TIMEOUT_SECS", defaults.text_timeout)?,
            image_timeout: secs_or(&lookup, "ADLAB_IMAGE_TIMEOUT_SECS", defaults.image_timeout)?,
            evaluation_timeout: secs_or(
                &lookup,
                "ADLAB_EVALUATION_TIMEOUT_SECS",
                defaults.evaluation_timeout,
            )?,
        })
    }

    /// Credentials, or a startup error naming what is missing.
    pub fn require_credentials(&self) -> Result<ApiCredentials> {
        match (&self.base_url, &self.api_key) {
            (Some(base_url), Some(api_key)) => Ok(ApiCredentials {
                base_url: base_url.clone(),
                api_key: api_key.clone(),
            }),
            (Some(_), None) => bail!("DIFY_API_BASE_URL is set but DIFY_API_KEY is missing"),
            (None, Some(_)) => bail!("DIFY_API_KEY is set but DIFY_API_BASE_URL is missing"),
            (None, None) => bail!(
                "missing service credentials: set DIFY_API_BASE_URL and DIFY_API_KEY in the environment"
            ),
        }
    }

    /// Per-stage timeouts for the pipeline.
    #[must_use]
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            text_timeout: self.text_timeout,
            image_timeout: self.image_timeout,
            evaluation_timeout: self.evaluation_timeout,
        }
    }
}

fn parsed<T: std::str::FromStr>(
    lookup: impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} is not a valid number: {raw:?}")),
        None => Ok(default),
    }
}

fn secs_or(
    lookup: impl Fn(&str) -> Option<String>,
    name: &str,
    default: Duration,
) -> Result<Duration> {
    Ok(Duration::from_secs(parsed(
        lookup,
        name,
        default.as_secs(),
    )?))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
