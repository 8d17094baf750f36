//! Summary statistics over the flat campaign extract.
//!
//! Produces a JSON report of mean/standard-deviation aggregates for stage
//! timings, evaluation scores, and costs, plus per-profile breakdowns.
//! Absent values (campaigns without an image or evaluation) are skipped,
//! not treated as zero.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use adlab_store::ExtractRow;

/// Mean and sample standard deviation of one measure.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Stat {
    /// Arithmetic mean over present values.
    pub mean: f64,
    /// Sample standard deviation; zero with fewer than two values.
    pub std: f64,
    /// How many campaigns had the measure.
    pub count: usize,
}

impl Stat {
    fn over(values: impl Iterator<Item = Option<f64>>) -> Self {
        let present: Vec<f64> = values.flatten().collect();
        let count = present.len();
        if count == 0 {
            return Self::default();
        }
        let mean = present.iter().sum::<f64>() / count as f64;
        let std = if count < 2 {
            0.0
        } else {
            let variance =
                present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count as f64 - 1.0);
            variance.sqrt()
        };
        Self { mean, std, count }
    }
}

/// Per-profile aggregate block.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileAggregate {
    /// Profile label.
    pub profile: String,
    /// Completed campaigns on this profile.
    pub campaigns: usize,
    /// Mean total duration, seconds.
    pub mean_total_secs: f64,
    /// Mean overall evaluation score.
    pub mean_overall_score: f64,
    /// Mean total cost.
    pub mean_total_cost: f64,
}

/// The full analysis report.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Report creation time, RFC 3339.
    pub generated_at: String,
    /// Completed campaigns analyzed.
    pub total_campaigns: usize,
    /// Text-stage duration.
    pub text_generation_secs: Stat,
    /// Image-stage duration.
    pub image_generation_secs: Stat,
    /// Evaluation-stage duration.
    pub evaluation_secs: Stat,
    /// Total duration.
    pub total_secs: Stat,
    /// Relevance score.
    pub relevance_score: Stat,
    /// Clarity score.
    pub clarity_score: Stat,
    /// Persuasiveness score.
    pub persuasiveness_score: Stat,
    /// Brand-safety score.
    pub brand_safety_score: Stat,
    /// Overall score.
    pub overall_score: Stat,
    /// Per-campaign cost.
    pub total_cost: Stat,
    /// Summed cost over all analyzed campaigns.
    pub total_cost_all_campaigns: f64,
    /// Breakdown by generation profile, sorted by label.
    pub by_profile: Vec<ProfileAggregate>,
}

/// Build the report; `None` when there is nothing to analyze.
#[must_use]
pub fn build_report(rows: &[ExtractRow]) -> Option<AnalysisReport> {
    if rows.is_empty() {
        return None;
    }

    let mut profiles: Vec<String> = rows.iter().map(|r| r.profile.clone()).collect();
    profiles.sort_unstable();
    profiles.dedup();

    let by_profile = profiles
        .into_iter()
        .map(|profile| {
            let members: Vec<&ExtractRow> =
                rows.iter().filter(|r| r.profile == profile).collect();
            ProfileAggregate {
                campaigns: members.len(),
                mean_total_secs: Stat::over(members.iter().map(|r| r.total_secs)).mean,
                mean_overall_score: Stat::over(members.iter().map(|r| r.overall_score)).mean,
                mean_total_cost: Stat::over(members.iter().map(|r| r.total_cost)).mean,
                profile,
            }
        })
        .collect();

    Some(AnalysisReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        total_campaigns: rows.len(),
        text_generation_secs: Stat::over(rows.iter().map(|r| r.text_generation_secs)),
        image_generation_secs: Stat::over(rows.iter().map(|r| r.image_generation_secs)),
        evaluation_secs: Stat::over(rows.iter().map(|r| r.evaluation_secs)),
        total_secs: Stat::over(rows.iter().map(|r| r.total_secs)),
        relevance_score: Stat::over(rows.iter().map(|r| r.relevance_score)),
        clarity_score: Stat::over(rows.iter().map(|r| r.clarity_score)),
        persuasiveness_score: Stat::over(rows.iter().map(|r| r.persuasiveness_score)),
        brand_safety_score: Stat::over(rows.iter().map(|r| r.brand_safety_score)),
        overall_score: Stat::over(rows.iter().map(|r| r.overall_score)),
        total_cost: Stat::over(rows.iter().map(|r| r.total_cost)),
        total_cost_all_campaigns: rows.iter().filter_map(|r| r.total_cost).sum(),
        by_profile,
    })
}

/// Write the report as pretty JSON, creating parent directories.
pub fn write_report(report: &AnalysisReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create report dir: {}", parent.display()))?;
    }
    let encoded = serde_json::to_string_pretty(report)?;
    std::fs::write(path, encoded)
        .with_context(|| format!("failed to write report: {}", path.display()))
}

/// Print the human-readable summary.
pub fn print_summary(report: &AnalysisReport) {
    println!();
    println!("{}", "=".repeat(60));
    println!(" RESEARCH SUMMARY STATISTICS");
    println!("{}", "=".repeat(60));
    println!("Total Campaigns: {}", report.total_campaigns);
    println!();
    println!("Generation Times:");
    println!("  - Mean Total Time: {:.2}s", report.total_secs.mean);
    println!("  - Text Generation: {:.2}s", report.text_generation_secs.mean);
    println!("  - Image Generation: {:.2}s", report.image_generation_secs.mean);
    println!("  - Evaluation: {:.2}s", report.evaluation_secs.mean);
    println!();
    println!("Quality Scores (Mean ± SD):");
    for (label, stat) in [
        ("Overall", report.overall_score),
        ("Relevance", report.relevance_score),
        ("Clarity", report.clarity_score),
        ("Persuasiveness", report.persuasiveness_score),
        ("Brand Safety", report.brand_safety_score),
    ] {
        println!("  - {label}: {:.2} ± {:.2}", stat.mean, stat.std);
    }
    println!();
    println!("Cost Analysis:");
    println!("  - Mean Cost per Campaign: ${:.4}", report.total_cost.mean);
    println!(
        "  - Total Cost (All Campaigns): ${:.4}",
        report.total_cost_all_campaigns
    );
    println!();
    println!("By Profile:");
    for profile in &report.by_profile {
        println!(
            "  - {}: {} campaigns, {:.2}s, score {:.2}, ${:.4}",
            profile.profile,
            profile.campaigns,
            profile.mean_total_secs,
            profile.mean_overall_score,
            profile.mean_total_cost
        );
    }
    println!("{}", "=".repeat(60));
    println!();
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
