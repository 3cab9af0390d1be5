//! Relic acquisition: converts one gameplay signal into a relic-reward
//! decision.
//!
//! The engine never mutates progression itself. It reports a [`RollOutcome`]
//! and the caller increments the matching relic count.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::constants::{
    DEFAULT_COMBAT_BASE_CHANCE, DEFAULT_COMBAT_LEVEL_THRESHOLDS, DEFAULT_EXPLORATION_BASE_CHANCE,
    DEFAULT_SKILLING_BASE_CHANCE, DEFAULT_SKILLING_XP_THRESHOLDS,
};
use crate::effect::Skill;
use crate::registry::UnlockRegistry;
use crate::relic::RelicType;
use crate::tier::Tier;

/// Player-tunable drop model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Divide the base chance by the number of unlocks still available.
    pub scaling_enabled: bool,
    /// "1 in N" base chances.
    pub skilling_base_chance: u32,
    pub combat_base_chance: u32,
    pub exploration_base_chance: u32,
    /// Experience in one drop needed to reach Journeyman, Expert, Master and
    /// Grandmaster eligibility.
    pub skilling_xp_thresholds: [u32; 4],
    /// Defeated actor combat level needed for the same four steps.
    pub combat_level_thresholds: [u32; 4],
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            scaling_enabled: true,
            skilling_base_chance: DEFAULT_SKILLING_BASE_CHANCE,
            combat_base_chance: DEFAULT_COMBAT_BASE_CHANCE,
            exploration_base_chance: DEFAULT_EXPLORATION_BASE_CHANCE,
            skilling_xp_thresholds: DEFAULT_SKILLING_XP_THRESHOLDS,
            combat_level_thresholds: DEFAULT_COMBAT_LEVEL_THRESHOLDS,
        }
    }
}

/// Errors raised when acquisition configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AcquisitionConfigError {
    #[error("{relic_type} base chance must be at least 1")]
    ZeroBaseChance { relic_type: RelicType },
    #[error("{field} must be strictly ascending (got {values:?})")]
    ThresholdsNotAscending { field: &'static str, values: [u32; 4] },
}

impl AcquisitionConfig {
    #[must_use]
    pub const fn base_chance(&self, relic_type: RelicType) -> u32 {
        match relic_type {
            RelicType::Skilling => self.skilling_base_chance,
            RelicType::Combat => self.combat_base_chance,
            RelicType::Exploration => self.exploration_base_chance,
        }
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `AcquisitionConfigError` for a zero base chance or thresholds
    /// that are not strictly ascending.
    pub fn validate(&self) -> Result<(), AcquisitionConfigError> {
        for relic_type in RelicType::ALL {
            if self.base_chance(relic_type) == 0 {
                return Err(AcquisitionConfigError::ZeroBaseChance { relic_type });
            }
        }
        validate_thresholds("skilling_xp_thresholds", self.skilling_xp_thresholds)?;
        validate_thresholds("combat_level_thresholds", self.combat_level_thresholds)
    }
}

fn validate_thresholds(
    field: &'static str,
    values: [u32; 4],
) -> Result<(), AcquisitionConfigError> {
    if values.windows(2).all(|pair| pair[0] < pair[1]) {
        Ok(())
    } else {
        Err(AcquisitionConfigError::ThresholdsNotAscending { field, values })
    }
}

/// Difficulty label of a completed treasure puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClueDifficulty {
    Beginner,
    Easy,
    Medium,
    Hard,
    Elite,
    Master,
}

impl ClueDifficulty {
    pub const ALL: [Self; 6] = [
        Self::Beginner,
        Self::Easy,
        Self::Medium,
        Self::Hard,
        Self::Elite,
        Self::Master,
    ];

    /// Relic tier awarded for this difficulty; beginner puzzles award nothing.
    #[must_use]
    pub const fn relic_tier(self) -> Option<Tier> {
        match self {
            Self::Beginner => None,
            Self::Easy => Some(Tier::Apprentice),
            Self::Medium => Some(Tier::Journeyman),
            Self::Hard => Some(Tier::Expert),
            Self::Elite => Some(Tier::Master),
            Self::Master => Some(Tier::Grandmaster),
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
            Self::Elite => "elite",
            Self::Master => "master",
        }
    }

    /// Case-insensitive lookup by label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|difficulty| difficulty.label().eq_ignore_ascii_case(label))
    }
}

/// Gameplay callbacks the surrounding system forwards to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameplaySignal {
    ExperienceGained {
        skill: Skill,
        amount: u32,
        previous_total: u64,
    },
    ActorDefeated {
        combat_level: u32,
    },
    PuzzleCompleted {
        difficulty: ClueDifficulty,
    },
}

impl GameplaySignal {
    #[must_use]
    pub const fn relic_type(&self) -> RelicType {
        match self {
            Self::ExperienceGained { .. } => RelicType::Skilling,
            Self::ActorDefeated { .. } => RelicType::Combat,
            Self::PuzzleCompleted { .. } => RelicType::Exploration,
        }
    }

    /// Highest relic tier this signal qualifies for, or `None` when the
    /// signal can never award a relic.
    #[must_use]
    pub fn max_eligible_tier(&self, config: &AcquisitionConfig) -> Option<Tier> {
        match *self {
            // A previous total of zero is the login snapshot, not a real gain.
            Self::ExperienceGained {
                amount,
                previous_total,
                ..
            } => (previous_total > 0 && amount > 0)
                .then(|| tier_from_thresholds(amount, &config.skilling_xp_thresholds)),
            Self::ActorDefeated { combat_level } => Some(tier_from_thresholds(
                combat_level,
                &config.combat_level_thresholds,
            )),
            Self::PuzzleCompleted { difficulty } => difficulty.relic_tier(),
        }
    }
}

/// Map a signal magnitude onto a tier: below the first threshold is
/// Apprentice, at or above the last is Grandmaster.
#[must_use]
pub fn tier_from_thresholds(value: u32, thresholds: &[u32; 4]) -> Tier {
    let reached = thresholds.iter().filter(|&&t| value >= t).count();
    Tier::RELIC_TIERS[reached.min(Tier::RELIC_TIERS.len() - 1)]
}

/// The `N` in the "1 in N" success roll.
#[must_use]
pub fn success_threshold(base_chance: u32, available: usize, scaling_enabled: bool) -> u32 {
    let base = base_chance.max(1);
    if !scaling_enabled || available == 0 {
        return base;
    }
    let available = u32::try_from(available).unwrap_or(u32::MAX);
    (base / available).max(1)
}

/// Pick a relic tier at or below `max_tier`, weighted toward lower tiers.
pub fn roll_relic_tier<R: Rng>(max_tier: Tier, rng: &mut R) -> Tier {
    let eligible = Tier::RELIC_TIERS.iter().copied().filter(|tier| *tier <= max_tier);
    let total: u32 = eligible.clone().map(Tier::roll_weight).sum();
    if total == 0 {
        log::error!("relic tier weights sum to zero for max tier {max_tier}; using {max_tier}");
        return max_tier;
    }

    let draw = rng.gen_range(0..total);
    let mut cumulative = 0;
    for tier in eligible {
        cumulative += tier.roll_weight();
        if draw < cumulative {
            return tier;
        }
    }
    log::error!("weighted tier scan ran past {total} for max tier {max_tier}; using {max_tier}");
    max_tier
}

/// Parameters for a single acquisition roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollRequest {
    pub relic_type: RelicType,
    pub max_tier: Tier,
    pub base_chance: u32,
    pub scaling_enabled: bool,
}

impl RollRequest {
    /// Build a request for `signal`, or `None` if the signal is a no-op.
    #[must_use]
    pub fn for_signal(signal: &GameplaySignal, config: &AcquisitionConfig) -> Option<Self> {
        let relic_type = signal.relic_type();
        signal.max_eligible_tier(config).map(|max_tier| Self {
            relic_type,
            max_tier,
            base_chance: config.base_chance(relic_type),
            scaling_enabled: config.scaling_enabled,
        })
    }
}

/// Result of one acquisition roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RollOutcome {
    /// The signal never awards relics (login snapshot, beginner puzzle).
    Ignored,
    /// Nothing new is left to unlock at the eligible tier.
    Skipped,
    /// The chance roll failed.
    Missed { threshold: u32 },
    Awarded { tier: Tier, threshold: u32 },
}

impl RollOutcome {
    #[must_use]
    pub const fn awarded_tier(&self) -> Option<Tier> {
        match self {
            Self::Awarded { tier, .. } => Some(*tier),
            Self::Ignored | Self::Skipped | Self::Missed { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_awarded(&self) -> bool {
        matches!(self, Self::Awarded { .. })
    }
}

/// Decides relic awards against the registry's current availability.
#[derive(Debug, Clone, Copy)]
pub struct AcquisitionEngine<'r> {
    registry: &'r UnlockRegistry,
}

impl<'r> AcquisitionEngine<'r> {
    #[must_use]
    pub const fn new(registry: &'r UnlockRegistry) -> Self {
        Self { registry }
    }

    pub fn roll<R: Rng>(
        &self,
        request: RollRequest,
        active: &BTreeSet<String>,
        rng: &mut R,
    ) -> RollOutcome {
        let available = self
            .registry
            .count_available(request.relic_type, request.max_tier, active);
        if available == 0 {
            log::debug!(
                "skipping {} roll: nothing available at {}",
                request.relic_type,
                request.max_tier
            );
            return RollOutcome::Skipped;
        }

        let threshold = success_threshold(request.base_chance, available, request.scaling_enabled);
        if rng.gen_range(0..threshold) != 0 {
            return RollOutcome::Missed { threshold };
        }

        let tier = roll_relic_tier(request.max_tier, rng);
        log::info!(
            "{} relic awarded at {tier} (max {}, 1 in {threshold}, {available} available)",
            request.relic_type,
            request.max_tier
        );
        RollOutcome::Awarded { tier, threshold }
    }

    /// Derive the request from a gameplay signal and roll it.
    pub fn roll_signal<R: Rng>(
        &self,
        signal: &GameplaySignal,
        config: &AcquisitionConfig,
        active: &BTreeSet<String>,
        rng: &mut R,
    ) -> RollOutcome {
        match RollRequest::for_signal(signal, config) {
            Some(request) => self.roll(request, active, rng),
            None => {
                log::debug!("ignoring signal {signal:?}");
                RollOutcome::Ignored
            }
        }
    }
}
