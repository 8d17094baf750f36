//! Status report: where a (possibly interrupted) run currently stands.

use anyhow::Result;

use adlab_store::CampaignStore;

/// Print campaign counts, per-profile completion, average scores, and the
/// most recent failures.
pub fn print_status(store: &CampaignStore) -> Result<()> {
    let counts = store.status_counts()?;

    println!();
    println!("{}", "=".repeat(60));
    println!(" CAMPAIGN STATUS");
    println!("{}", "=".repeat(60));
    println!("Timestamp: {}", chrono::Utc::now().to_rfc3339());
    println!();
    println!("Total Campaigns: {}", counts.total);
    let completion = if counts.total > 0 {
        counts.completed as f64 / counts.total as f64 * 100.0
    } else {
        0.0
    };
    println!("  Completed: {} ({completion:.1}%)", counts.completed);
    println!("  Generating: {}", counts.generating);
    println!("  Failed: {}", counts.failed);
    println!("  Pending: {}", counts.pending);

    let by_profile = store.completed_by_profile()?;
    if !by_profile.is_empty() {
        println!();
        println!("Completed by Profile:");
        for (profile, count) in by_profile {
            println!("  - {profile}: {count}");
        }
    }

    if let Some(scores) = store.average_scores()? {
        println!();
        println!("Average Quality Scores:");
        println!("  Overall: {:.2}/10", scores.overall);
        println!("  Relevance: {:.2}/10", scores.relevance);
        println!("  Clarity: {:.2}/10", scores.clarity);
        println!("  Persuasiveness: {:.2}/10", scores.persuasiveness);
        println!("  Brand Safety: {:.2}/10", scores.brand_safety);
    }

    let failures = store.recent_failures(5)?;
    if !failures.is_empty() {
        println!();
        println!("Recent Failed Campaigns:");
        for campaign in failures {
            println!(
                "  - Campaign #{}: {} x {}",
                campaign.campaign_number, campaign.product_type, campaign.event_type
            );
        }
    }

    println!("{}", "=".repeat(60));
    println!();
    Ok(())
}
