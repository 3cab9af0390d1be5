//! Mutable per-player progression: relic inventory, active unlocks, and the
//! skill and gear tiers those unlocks have raised.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::effect::{GearStyle, GearTier, Skill, UnlockEffect, resolve_effect};
use crate::registry::UnlockRegistry;
use crate::relic::{RelicSlot, RelicType};
use crate::tier::Tier;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionState {
    /// Unspent relics by type then tier. Missing entries read as zero.
    #[serde(default)]
    relic_counts: BTreeMap<RelicType, BTreeMap<Tier, u32>>,
    #[serde(default)]
    active_unlocks: BTreeSet<String>,
    #[serde(default = "default_skill_tiers")]
    skill_tiers: BTreeMap<Skill, Tier>,
    #[serde(default = "default_gear_tiers")]
    gear_tiers: BTreeMap<GearStyle, GearTier>,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self {
            relic_counts: BTreeMap::new(),
            active_unlocks: BTreeSet::new(),
            skill_tiers: default_skill_tiers(),
            gear_tiers: default_gear_tiers(),
        }
    }
}

fn default_skill_tiers() -> BTreeMap<Skill, Tier> {
    Skill::ALL
        .into_iter()
        .filter(|skill| skill.is_tier_capped())
        .map(|skill| (skill, skill.starting_tier()))
        .collect()
}

fn default_gear_tiers() -> BTreeMap<GearStyle, GearTier> {
    GearStyle::ALL
        .into_iter()
        .map(|style| (style, style.starting_tier()))
        .collect()
}

impl ProgressionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from persisted relic counts and active ids.
    #[must_use]
    pub fn from_parts(
        relic_counts: BTreeMap<RelicType, BTreeMap<Tier, u32>>,
        active_unlocks: BTreeSet<String>,
    ) -> Self {
        let mut state = Self {
            active_unlocks,
            ..Self::default()
        };
        state.set_relic_counts(relic_counts);
        state
    }

    // Relic inventory ------------------------------------------------------

    #[must_use]
    pub fn relic_count(&self, slot: RelicSlot) -> u32 {
        self.relic_counts
            .get(&slot.relic_type)
            .and_then(|tiers| tiers.get(&slot.tier))
            .copied()
            .unwrap_or(0)
    }

    #[must_use]
    pub const fn relic_counts(&self) -> &BTreeMap<RelicType, BTreeMap<Tier, u32>> {
        &self.relic_counts
    }

    /// Replace every count. `Locked` and zero entries are dropped.
    pub fn set_relic_counts(&mut self, counts: BTreeMap<RelicType, BTreeMap<Tier, u32>>) {
        self.relic_counts.clear();
        for (relic_type, tiers) in counts {
            for (tier, count) in tiers {
                self.set_relic_count(RelicSlot::new(relic_type, tier), count);
            }
        }
    }

    pub fn set_relic_count(&mut self, slot: RelicSlot, count: u32) {
        if !slot.tier.is_relic_tier() {
            log::warn!("ignoring relic count for non-relic tier {}", slot.tier);
            return;
        }
        let tiers = self.relic_counts.entry(slot.relic_type).or_default();
        if count == 0 {
            tiers.remove(&slot.tier);
        } else {
            tiers.insert(slot.tier, count);
        }
        if tiers.is_empty() {
            self.relic_counts.remove(&slot.relic_type);
        }
    }

    /// Add one relic to the slot, returning the new count.
    pub fn add_relic(&mut self, slot: RelicSlot) -> u32 {
        let count = self.relic_count(slot).saturating_add(1);
        self.set_relic_count(slot, count);
        self.relic_count(slot)
    }

    /// Remove one relic. Returns `false` and leaves state untouched when the
    /// slot is already empty.
    pub fn consume_relic(&mut self, slot: RelicSlot) -> bool {
        let count = self.relic_count(slot);
        if count == 0 {
            return false;
        }
        self.set_relic_count(slot, count - 1);
        true
    }

    /// Slots holding at least one relic, by type then ascending tier.
    #[must_use]
    pub fn held_slots(&self) -> Vec<RelicSlot> {
        RelicSlot::all()
            .filter(|slot| self.relic_count(*slot) > 0)
            .collect()
    }

    #[must_use]
    pub fn total_relics(&self) -> u64 {
        self.relic_counts
            .values()
            .flat_map(BTreeMap::values)
            .map(|&count| u64::from(count))
            .sum()
    }

    // Active unlocks -------------------------------------------------------

    #[must_use]
    pub const fn active_unlocks(&self) -> &BTreeSet<String> {
        &self.active_unlocks
    }

    pub fn set_active_unlocks(&mut self, active: BTreeSet<String>) {
        self.active_unlocks = active;
    }

    #[must_use]
    pub fn is_active(&self, id: &str) -> bool {
        self.active_unlocks.contains(id)
    }

    /// Mark an unlock active. Returns `false` if it already was.
    pub fn activate(&mut self, id: &str) -> bool {
        self.active_unlocks.insert(id.to_string())
    }

    // Derived tiers --------------------------------------------------------

    /// Current tier for a skill; uncapped skills always report Grandmaster.
    #[must_use]
    pub fn skill_tier(&self, skill: Skill) -> Tier {
        if !skill.is_tier_capped() {
            return Tier::Grandmaster;
        }
        self.skill_tiers
            .get(&skill)
            .copied()
            .unwrap_or_else(|| skill.starting_tier())
    }

    #[must_use]
    pub fn skill_level_cap(&self, skill: Skill) -> u8 {
        self.skill_tier(skill).level_cap()
    }

    #[must_use]
    pub fn gear_tier(&self, style: GearStyle) -> GearTier {
        self.gear_tiers
            .get(&style)
            .copied()
            .unwrap_or_else(|| style.starting_tier())
    }

    /// Apply a committed unlock's effect. Tiers only ever move up; returns
    /// whether anything changed.
    pub fn apply_effect(&mut self, effect: &UnlockEffect) -> bool {
        match *effect {
            UnlockEffect::SkillTier { skill, tier } => {
                if !skill.is_tier_capped() || self.skill_tier(skill) >= tier {
                    return false;
                }
                self.skill_tiers.insert(skill, tier);
                true
            }
            UnlockEffect::GearTier { style, gear } => {
                if self.gear_tier(style) >= gear {
                    return false;
                }
                self.gear_tiers.insert(style, gear);
                true
            }
            UnlockEffect::None => false,
        }
    }

    /// Recompute skill and gear tiers from the active set, e.g. after
    /// restoring only counts and ids from storage.
    pub fn rebuild_effects(&mut self, registry: &UnlockRegistry) {
        self.skill_tiers = default_skill_tiers();
        self.gear_tiers = default_gear_tiers();
        let effects: Vec<UnlockEffect> = self
            .active_unlocks
            .iter()
            .filter_map(|id| registry.get(id))
            .map(resolve_effect)
            .collect();
        for effect in &effects {
            self.apply_effect(effect);
        }
    }

    /// Clear all relics and unlocks and restore starting tiers.
    pub fn reset(&mut self) {
        log::info!("Resetting relic progression");
        *self = Self::default();
    }
}
