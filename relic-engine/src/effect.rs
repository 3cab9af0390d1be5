//! Translation from unlock ids to the concrete state change they imply.
//!
//! Unlock ids encode their effect by convention: `SKILL_<SKILL>_<TIER>` raises
//! a skill's level cap and `GEAR_<STYLE>_<GEAR>` raises the permitted gear tier
//! for a combat style. All encoding and decoding of that convention lives here.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{GEAR_ID_PREFIX, QUEST_ID_PREFIX, SKILL_ID_PREFIX};
use crate::data::{UnlockCategory, UnlockDefinition};
use crate::tier::Tier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Skill {
    Attack,
    Strength,
    Defence,
    Hitpoints,
    Ranged,
    Prayer,
    Magic,
    Cooking,
    Woodcutting,
    Fletching,
    Fishing,
    Firemaking,
    Crafting,
    Smithing,
    Mining,
    Herblore,
    Agility,
    Thieving,
    Slayer,
    Farming,
    Runecraft,
    Hunter,
    Construction,
}

impl Skill {
    pub const ALL: [Self; 23] = [
        Self::Attack,
        Self::Strength,
        Self::Defence,
        Self::Hitpoints,
        Self::Ranged,
        Self::Prayer,
        Self::Magic,
        Self::Cooking,
        Self::Woodcutting,
        Self::Fletching,
        Self::Fishing,
        Self::Firemaking,
        Self::Crafting,
        Self::Smithing,
        Self::Mining,
        Self::Herblore,
        Self::Agility,
        Self::Thieving,
        Self::Slayer,
        Self::Farming,
        Self::Runecraft,
        Self::Hunter,
        Self::Construction,
    ];

    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Attack => "ATTACK",
            Self::Strength => "STRENGTH",
            Self::Defence => "DEFENCE",
            Self::Hitpoints => "HITPOINTS",
            Self::Ranged => "RANGED",
            Self::Prayer => "PRAYER",
            Self::Magic => "MAGIC",
            Self::Cooking => "COOKING",
            Self::Woodcutting => "WOODCUTTING",
            Self::Fletching => "FLETCHING",
            Self::Fishing => "FISHING",
            Self::Firemaking => "FIREMAKING",
            Self::Crafting => "CRAFTING",
            Self::Smithing => "SMITHING",
            Self::Mining => "MINING",
            Self::Herblore => "HERBLORE",
            Self::Agility => "AGILITY",
            Self::Thieving => "THIEVING",
            Self::Slayer => "SLAYER",
            Self::Farming => "FARMING",
            Self::Runecraft => "RUNECRAFT",
            Self::Hunter => "HUNTER",
            Self::Construction => "CONSTRUCTION",
        }
    }

    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|skill| skill.token() == token)
    }

    /// Melee skills and hitpoints are never level capped by a tier.
    #[must_use]
    pub const fn is_tier_capped(self) -> bool {
        !matches!(
            self,
            Self::Attack | Self::Strength | Self::Defence | Self::Hitpoints
        )
    }

    /// Tier a fresh profile starts with.
    #[must_use]
    pub const fn starting_tier(self) -> Tier {
        match self {
            Self::Attack | Self::Strength | Self::Defence | Self::Hitpoints => Tier::Grandmaster,
            Self::Mining | Self::Smithing => Tier::Apprentice,
            _ => Tier::Locked,
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Combat style an equipment tier applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GearStyle {
    Melee,
    Ranged,
    Magic,
}

impl GearStyle {
    pub const ALL: [Self; 3] = [Self::Melee, Self::Ranged, Self::Magic];

    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Melee => "MELEE",
            Self::Ranged => "RANGED",
            Self::Magic => "MAGIC",
        }
    }

    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|style| style.token() == token)
    }

    #[must_use]
    pub const fn starting_tier(self) -> GearTier {
        match self {
            Self::Melee => GearTier::Basic,
            Self::Ranged | Self::Magic => GearTier::None,
        }
    }
}

/// Highest equipment tier a style may use. Declaration order is progression
/// order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GearTier {
    #[default]
    None,
    /// Bronze, iron and steel.
    Basic,
    Mithril,
    Adamant,
    Rune,
    Dragon,
    Barrows,
    Bandos,
}

impl GearTier {
    pub const ALL: [Self; 8] = [
        Self::None,
        Self::Basic,
        Self::Mithril,
        Self::Adamant,
        Self::Rune,
        Self::Dragon,
        Self::Barrows,
        Self::Bandos,
    ];

    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Basic => "BASIC",
            Self::Mithril => "MITHRIL",
            Self::Adamant => "ADAMANT",
            Self::Rune => "RUNE",
            Self::Dragon => "DRAGON",
            Self::Barrows => "BARROWS",
            Self::Bandos => "BANDOS",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Basic => "Basic",
            Self::Mithril => "Mithril",
            Self::Adamant => "Adamant",
            Self::Rune => "Rune",
            Self::Dragon => "Dragon",
            Self::Barrows => "Barrows",
            Self::Bandos => "Bandos",
        }
    }

    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.token() == token)
    }

    /// Next tier up, `None` at the top.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::ALL
            .iter()
            .position(|&tier| tier == self)
            .and_then(|index| Self::ALL.get(index + 1).copied())
    }
}

impl fmt::Display for GearTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Concrete state change applied when an unlock is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnlockEffect {
    SkillTier { skill: Skill, tier: Tier },
    GearTier { style: GearStyle, gear: GearTier },
    /// Membership in the active set is the whole effect.
    None,
}

/// Decide what committing `definition` changes beyond the active set.
#[must_use]
pub fn resolve_effect(definition: &UnlockDefinition) -> UnlockEffect {
    let decoded = match definition.category {
        UnlockCategory::SkillTier => decode_skill_tier_id(&definition.id),
        UnlockCategory::GearTier => decode_gear_tier_id(&definition.id),
        UnlockCategory::SpecificItem
        | UnlockCategory::Area
        | UnlockCategory::Quest
        | UnlockCategory::Mechanic
        | UnlockCategory::SkillingMethod
        | UnlockCategory::Boss
        | UnlockCategory::Other => return UnlockEffect::None,
    };
    decoded.unwrap_or_else(|| {
        log::warn!(
            "{:?} unlock {} does not follow the id convention; no effect applied",
            definition.category,
            definition.id
        );
        UnlockEffect::None
    })
}

/// Decode `SKILL_<SKILL>_<TIER>`.
#[must_use]
pub fn decode_skill_tier_id(id: &str) -> Option<UnlockEffect> {
    let rest = id.strip_prefix(SKILL_ID_PREFIX)?;
    let (skill, tier) = rest.rsplit_once('_')?;
    let skill = Skill::from_token(skill)?;
    let tier = Tier::from_token(tier).filter(|tier| tier.is_relic_tier())?;
    Some(UnlockEffect::SkillTier { skill, tier })
}

/// Decode `GEAR_<STYLE>_<GEAR>`.
#[must_use]
pub fn decode_gear_tier_id(id: &str) -> Option<UnlockEffect> {
    let rest = id.strip_prefix(GEAR_ID_PREFIX)?;
    let (style, gear) = rest.split_once('_')?;
    let style = GearStyle::from_token(style)?;
    let gear = GearTier::from_token(gear).filter(|gear| *gear != GearTier::None)?;
    Some(UnlockEffect::GearTier { style, gear })
}

#[must_use]
pub fn skill_tier_id(skill: Skill, tier: Tier) -> String {
    format!("{SKILL_ID_PREFIX}{}_{}", skill.token(), tier_token(tier))
}

#[must_use]
pub fn gear_tier_id(style: GearStyle, gear: GearTier) -> String {
    format!("{GEAR_ID_PREFIX}{}_{}", style.token(), gear.token())
}

/// `QUEST_<NAME>` with the name upper-cased, apostrophes dropped and other
/// separators collapsed to `_`.
#[must_use]
pub fn quest_unlock_id(quest_name: &str) -> String {
    let token = quest_name
        .replace(['\'', '\u{2019}'], "")
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_uppercase)
        .collect::<Vec<_>>()
        .join("_");
    format!("{QUEST_ID_PREFIX}{token}")
}

fn tier_token(tier: Tier) -> &'static str {
    match tier {
        Tier::Locked => "LOCKED",
        Tier::Apprentice => "APPRENTICE",
        Tier::Journeyman => "JOURNEYMAN",
        Tier::Expert => "EXPERT",
        Tier::Master => "MASTER",
        Tier::Grandmaster => "GRANDMASTER",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relic::RelicType;
    use std::collections::BTreeSet;

    fn definition(id: &str, category: UnlockCategory) -> UnlockDefinition {
        UnlockDefinition {
            id: id.to_string(),
            name: String::new(),
            description: String::new(),
            category,
            relic_type: RelicType::Skilling,
            required_tier: Tier::Journeyman,
            prerequisites: BTreeSet::new(),
            item_ids: None,
            area_definition: None,
            quest_id: None,
        }
    }

    #[test]
    fn skill_ids_decode_to_level_cap_effects() {
        let effect = resolve_effect(&definition(
            "SKILL_MINING_JOURNEYMAN",
            UnlockCategory::SkillTier,
        ));
        assert_eq!(
            effect,
            UnlockEffect::SkillTier {
                skill: Skill::Mining,
                tier: Tier::Journeyman
            }
        );
        assert_eq!(decode_skill_tier_id("SKILL_MINING_LOCKED"), None);
        assert_eq!(decode_skill_tier_id("SKILL_SAILING_EXPERT"), None);
        assert_eq!(decode_skill_tier_id("GEAR_MELEE_RUNE"), None);
    }

    #[test]
    fn gear_ids_decode_to_style_and_tier() {
        let effect = resolve_effect(&definition("GEAR_MELEE_ADAMANT", UnlockCategory::GearTier));
        assert_eq!(
            effect,
            UnlockEffect::GearTier {
                style: GearStyle::Melee,
                gear: GearTier::Adamant
            }
        );
        assert_eq!(decode_gear_tier_id("GEAR_MELEE_NONE"), None);
        assert_eq!(decode_gear_tier_id("GEAR_SIEGE_RUNE"), None);
    }

    #[test]
    fn categories_without_mapping_have_no_effect() {
        for category in [
            UnlockCategory::SpecificItem,
            UnlockCategory::Area,
            UnlockCategory::Quest,
            UnlockCategory::Mechanic,
            UnlockCategory::SkillingMethod,
            UnlockCategory::Boss,
            UnlockCategory::Other,
        ] {
            assert_eq!(
                resolve_effect(&definition("SKILL_MINING_EXPERT", category)),
                UnlockEffect::None
            );
        }
        // Malformed id under a mapped category degrades to no effect.
        assert_eq!(
            resolve_effect(&definition("SKILL_MINING", UnlockCategory::SkillTier)),
            UnlockEffect::None
        );
    }

    #[test]
    fn encoders_match_decoders() {
        for skill in Skill::ALL {
            let id = skill_tier_id(skill, Tier::Master);
            assert_eq!(
                decode_skill_tier_id(&id),
                Some(UnlockEffect::SkillTier {
                    skill,
                    tier: Tier::Master
                })
            );
        }
        assert_eq!(gear_tier_id(GearStyle::Ranged, GearTier::Rune), "GEAR_RANGED_RUNE");
        assert_eq!(quest_unlock_id("Dragon Slayer I"), "QUEST_DRAGON_SLAYER_I");
        assert_eq!(quest_unlock_id("Cook's Assistant"), "QUEST_COOKS_ASSISTANT");
        assert_eq!(quest_unlock_id("Recipe for Disaster - Freeing the Goblin generals"), "QUEST_RECIPE_FOR_DISASTER_FREEING_THE_GOBLIN_GENERALS");
    }

    #[test]
    fn gear_tiers_progress_in_order() {
        assert_eq!(GearTier::Basic.next(), Some(GearTier::Mithril));
        assert_eq!(GearTier::Bandos.next(), None);
        assert!(GearTier::Rune > GearTier::Adamant);
        assert_eq!(GearStyle::Melee.starting_tier(), GearTier::Basic);
        assert_eq!(Skill::Mining.starting_tier(), Tier::Apprentice);
        assert!(!Skill::Hitpoints.is_tier_capped());
    }
}
