//! Permission gates evaluated against the active unlock set.
//!
//! Every check is a pure read of the registry and the caller's state, cheap
//! enough to run on each inventory render.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::data::{ItemId, UnlockCategory};
use crate::effect::Skill;
use crate::progression::ProgressionState;
use crate::registry::UnlockRegistry;
use crate::tier::Tier;

/// Whether training a skill at a given level is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SkillRestriction {
    Unrestricted,
    /// No tier unlocked for this skill yet.
    Locked,
    /// The skill has reached the level cap of its current tier.
    AboveCap { cap: u8 },
}

impl SkillRestriction {
    #[must_use]
    pub const fn is_restricted(self) -> bool {
        !matches!(self, Self::Unrestricted)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PermissionChecker<'r> {
    registry: &'r UnlockRegistry,
}

impl<'r> PermissionChecker<'r> {
    #[must_use]
    pub const fn new(registry: &'r UnlockRegistry) -> Self {
        Self { registry }
    }

    /// Decide whether `item_id` may be equipped or used.
    ///
    /// A SPECIFIC_ITEM owner is an absolute gate. Otherwise a GEAR_TIER
    /// member needs any active GEAR_TIER unlock at or above the lowest tier
    /// listing the item. Items in neither index are unrestricted.
    #[must_use]
    pub fn is_item_permitted(&self, item_id: ItemId, active: &BTreeSet<String>) -> bool {
        if let Some(owner) = self.registry.specific_item_owner(item_id) {
            let permitted = active.contains(owner);
            log::trace!("item {item_id} gated by {owner}: permitted={permitted}");
            return permitted;
        }

        let Some(members) = self.registry.gear_tier_members(item_id) else {
            log::trace!("item {item_id} has no restriction");
            return true;
        };
        let Some(minimum) = members
            .iter()
            .filter_map(|id| self.registry.get(id))
            .map(|definition| definition.required_tier)
            .min()
        else {
            log::error!("item {item_id} listed by unknown gear tiers {members:?}; restricting");
            return false;
        };

        let permitted = self.highest_active_gear_tier(active) >= Some(minimum);
        log::trace!("item {item_id} needs a gear tier at {minimum} or above: permitted={permitted}");
        permitted
    }

    fn highest_active_gear_tier(&self, active: &BTreeSet<String>) -> Option<Tier> {
        active
            .iter()
            .filter_map(|id| self.registry.get(id))
            .filter(|definition| definition.category == UnlockCategory::GearTier)
            .map(|definition| definition.required_tier)
            .max()
    }

    /// Whether gaining experience in `skill` at `level` stays within the
    /// skill's unlocked cap.
    #[must_use]
    pub fn skill_restriction(
        &self,
        skill: Skill,
        level: u8,
        state: &ProgressionState,
    ) -> SkillRestriction {
        if !skill.is_tier_capped() {
            return SkillRestriction::Unrestricted;
        }
        let tier = state.skill_tier(skill);
        if tier == Tier::Locked {
            return SkillRestriction::Locked;
        }
        let cap = tier.level_cap();
        if tier < Tier::Grandmaster && level >= cap {
            SkillRestriction::AboveCap { cap }
        } else {
            SkillRestriction::Unrestricted
        }
    }

    /// Areas, quests, mechanics and the like are gated by plain membership.
    /// Ids the registry does not define are unrestricted.
    #[must_use]
    pub fn is_content_unlocked(&self, id: &str, active: &BTreeSet<String>) -> bool {
        !self.registry.contains(id) || active.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::UnlockData;
    use crate::effect::{GearStyle, GearTier, UnlockEffect};
    use crate::relic::RelicType;

    fn gear(id: &str, tier: Tier, items: &[ItemId]) -> UnlockData {
        UnlockData {
            id: Some(id.to_string()),
            category: UnlockCategory::GearTier,
            relic_type: Some(RelicType::Combat),
            required_tier: Some(tier),
            item_ids: Some(items.iter().copied().collect()),
            ..UnlockData::default()
        }
    }

    fn specific(id: &str, items: &[ItemId]) -> UnlockData {
        UnlockData {
            category: UnlockCategory::SpecificItem,
            ..gear(id, Tier::Expert, items)
        }
    }

    fn active(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(ToString::to_string).collect()
    }

    fn fixture() -> UnlockRegistry {
        UnlockRegistry::load(vec![
            specific("ITEM_X", &[100]),
            gear("GEAR_MELEE_MITHRIL", Tier::Apprentice, &[200, 201]),
            gear("GEAR_MELEE_ADAMANT", Tier::Journeyman, &[200, 300]),
            gear("GEAR_MELEE_RUNE", Tier::Expert, &[400]),
            // A gear tier item that is also a specific item follows the specific gate.
            gear("GEAR_RANGED_MITHRIL", Tier::Apprentice, &[100]),
            UnlockData {
                id: Some("AREA_FOSSIL_ISLAND".to_string()),
                category: UnlockCategory::Area,
                relic_type: Some(RelicType::Exploration),
                required_tier: Some(Tier::Master),
                ..UnlockData::default()
            },
        ])
        .0
    }

    #[test]
    fn specific_item_is_an_absolute_gate() {
        let registry = fixture();
        let checker = PermissionChecker::new(&registry);
        assert!(!checker.is_item_permitted(100, &active(&[])));
        assert!(!checker.is_item_permitted(100, &active(&["GEAR_RANGED_MITHRIL"])));
        assert!(checker.is_item_permitted(100, &active(&["ITEM_X"])));
    }

    #[test]
    fn gear_tier_uses_minimum_required_tier() {
        let registry = fixture();
        let checker = PermissionChecker::new(&registry);
        assert!(!checker.is_item_permitted(200, &active(&[])));
        assert!(checker.is_item_permitted(200, &active(&["GEAR_MELEE_MITHRIL"])));
        assert!(checker.is_item_permitted(200, &active(&["GEAR_MELEE_RUNE"])));
        assert!(!checker.is_item_permitted(400, &active(&["GEAR_MELEE_ADAMANT"])));
        assert!(checker.is_item_permitted(400, &active(&["GEAR_MELEE_RUNE"])));
    }

    #[test]
    fn non_gear_unlocks_do_not_satisfy_gear_items() {
        let registry = fixture();
        let checker = PermissionChecker::new(&registry);
        assert!(!checker.is_item_permitted(300, &active(&["AREA_FOSSIL_ISLAND", "ITEM_X"])));
    }

    #[test]
    fn unknown_items_are_permitted() {
        let registry = fixture();
        let checker = PermissionChecker::new(&registry);
        for item in [0, 1, 999, ItemId::MAX] {
            assert!(checker.is_item_permitted(item, &active(&[])));
        }
    }

    #[test]
    fn content_gate_checks_membership_of_known_ids() {
        let registry = fixture();
        let checker = PermissionChecker::new(&registry);
        assert!(!checker.is_content_unlocked("AREA_FOSSIL_ISLAND", &active(&[])));
        assert!(checker.is_content_unlocked("AREA_FOSSIL_ISLAND", &active(&["AREA_FOSSIL_ISLAND"])));
        assert!(checker.is_content_unlocked("QUEST_UNDEFINED", &active(&[])));
    }

    #[test]
    fn skill_restriction_follows_tier_caps() {
        let registry = UnlockRegistry::default();
        let checker = PermissionChecker::new(&registry);
        let mut state = ProgressionState::new();

        assert_eq!(
            checker.skill_restriction(Skill::Attack, 98, &state),
            SkillRestriction::Unrestricted
        );
        assert_eq!(
            checker.skill_restriction(Skill::Fishing, 1, &state),
            SkillRestriction::Locked
        );
        assert_eq!(
            checker.skill_restriction(Skill::Mining, 19, &state),
            SkillRestriction::Unrestricted
        );
        assert_eq!(
            checker.skill_restriction(Skill::Mining, 20, &state),
            SkillRestriction::AboveCap { cap: 20 }
        );

        state.apply_effect(&UnlockEffect::SkillTier {
            skill: Skill::Mining,
            tier: Tier::Grandmaster,
        });
        assert_eq!(
            checker.skill_restriction(Skill::Mining, 99, &state),
            SkillRestriction::Unrestricted
        );
        assert!(!SkillRestriction::Unrestricted.is_restricted());
        assert_eq!(state.gear_tier(GearStyle::Melee), GearTier::Basic);
    }
}
