//! Campaign identity, lifecycle status, and generation profiles.

use serde::{Deserialize, Serialize};

/// One experimental trial: a (product, event) combination identified by a
/// sequential campaign number.
///
/// Descriptors are produced by the batch runner's design-space enumeration
/// and are immutable once created. Campaign numbers start at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignDescriptor {
    /// Sequential campaign number, unique within a run (1-based).
    pub number: u32,
    /// Product category under test.
    pub product: String,
    /// Event category under test.
    pub event: String,
}

/// Persisted campaign lifecycle status.
///
/// Monotonic except for the terminal transition to [`CampaignStatus::Failed`]:
/// `Pending → Generating → Completed`, with `Failed` reachable from
/// `Generating` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    /// Created but not yet started.
    Pending,
    /// At least one stage is in flight.
    Generating,
    /// All reachable stages attempted; text content exists.
    Completed,
    /// Hard-stop failure: no usable text content.
    Failed,
}

impl CampaignStatus {
    /// Storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Generating => "generating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parse the storage representation back into a status.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "generating" => Some(Self::Generating),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image-generation quality/speed tradeoff.
///
/// Assignment is a pure function of the campaign number so the experiment is
/// balanced across profiles independent of run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationProfile {
    /// Fast generation, few diffusion steps.
    Speed,
    /// Balanced quality and speed.
    Balanced,
    /// High quality, many diffusion steps.
    Quality,
}

impl GenerationProfile {
    /// All profiles in assignment order.
    pub const ALL: [Self; 3] = [Self::Speed, Self::Balanced, Self::Quality];

    /// Profile for a campaign number (1-based), cycling through
    /// [`Self::ALL`] so numbers 1, 4, 7... share a profile.
    pub fn for_campaign(number: u32) -> Self {
        let index = number.saturating_sub(1) as usize % Self::ALL.len();
        Self::ALL[index]
    }

    /// Storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Speed => "speed",
            Self::Balanced => "balanced",
            Self::Quality => "quality",
        }
    }

    /// Parse the storage representation back into a profile.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "speed" => Some(Self::Speed),
            "balanced" => Some(Self::Balanced),
            "quality" => Some(Self::Quality),
            _ => None,
        }
    }

    /// Diffusion step count requested from the image backend.
    pub fn steps(self) -> u32 {
        match self {
            Self::Speed => 4,
            Self::Balanced => 20,
            Self::Quality => 50,
        }
    }
}

impl std::fmt::Display for GenerationProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_cycles_with_period_three() {
        let assigned: Vec<_> = (1..=9).map(GenerationProfile::for_campaign).collect();
        assert_eq!(assigned[0], assigned[3]);
        assert_eq!(assigned[0], assigned[6]);
        assert_eq!(assigned[1], assigned[4]);
        assert_eq!(assigned[2], assigned[8]);
        assert_ne!(assigned[0], assigned[1]);
    }

    #[test]
    fn profile_assignment_starts_at_speed() {
        assert_eq!(GenerationProfile::for_campaign(1), GenerationProfile::Speed);
        assert_eq!(
            GenerationProfile::for_campaign(2),
            GenerationProfile::Balanced
        );
        assert_eq!(
            GenerationProfile::for_campaign(3),
            GenerationProfile::Quality
        );
    }

    #[test]
    fn profile_zero_does_not_panic() {
        // Campaign numbers are 1-based; 0 clamps to the first profile.
        assert_eq!(GenerationProfile::for_campaign(0), GenerationProfile::Speed);
    }

    #[test]
    fn profile_roundtrips_through_storage_repr() {
        for profile in GenerationProfile::ALL {
            assert_eq!(GenerationProfile::parse(profile.as_str()), Some(profile));
        }
        assert_eq!(GenerationProfile::parse("turbo"), None);
    }

    #[test]
    fn status_roundtrips_through_storage_repr() {
        for status in [
            CampaignStatus::Pending,
            CampaignStatus::Generating,
            CampaignStatus::Completed,
            CampaignStatus::Failed,
        ] {
            assert_eq!(CampaignStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(CampaignStatus::parse("evaluating"), None);
    }

    #[test]
    fn profile_steps_increase_with_quality() {
        assert!(GenerationProfile::Speed.steps() < GenerationProfile::Balanced.steps());
        assert!(GenerationProfile::Balanced.steps() < GenerationProfile::Quality.steps());
    }
}
