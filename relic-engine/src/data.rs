use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::relic::RelicType;
use crate::tier::Tier;

const DEFAULT_UNLOCK_DATA: &str = include_str!("../data/unlocks.json");

/// Game item identifier.
pub type ItemId = u32;

/// Broad category of an unlock; decides how item lists and ids are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnlockCategory {
    SkillTier,
    /// Unlocking *up to* a tier of equipment.
    GearTier,
    /// A single item gated independently of any gear tier.
    SpecificItem,
    Area,
    Quest,
    Mechanic,
    SkillingMethod,
    Boss,
    #[default]
    Other,
}

impl UnlockCategory {
    /// Whether `item_ids` carries meaning for this category.
    #[must_use]
    pub const fn uses_item_ids(self) -> bool {
        matches!(self, Self::GearTier | Self::SpecificItem)
    }
}

/// A single entry as parsed from the unlock database, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UnlockData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: UnlockCategory,
    #[serde(default)]
    pub relic_type: Option<RelicType>,
    #[serde(default)]
    pub required_tier: Option<Tier>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub item_ids: Option<BTreeSet<ItemId>>,
    #[serde(default)]
    pub area_definition: Option<String>,
    #[serde(default)]
    pub quest_id: Option<u32>,
    /// Members-only content is dropped from the free-to-play database.
    #[serde(default = "default_members")]
    pub members: bool,
}

const fn default_members() -> bool {
    true
}

/// A validated unlock definition held by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: UnlockCategory,
    pub relic_type: RelicType,
    pub required_tier: Tier,
    pub prerequisites: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_ids: Option<BTreeSet<ItemId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_definition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quest_id: Option<u32>,
}

/// Which bundled database to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseVariant {
    #[default]
    Full,
    FreeToPlay,
}

/// Root of the unlock database file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UnlockDatabase {
    #[serde(default)]
    pub unlocks: Vec<UnlockData>,
}

impl UnlockDatabase {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            unlocks: Vec::new(),
        }
    }

    /// Load the database from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into unlock records.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn from_records(unlocks: Vec<UnlockData>) -> Self {
        Self { unlocks }
    }

    /// Load the bundled database. Falls back to an empty database if the
    /// bundled asset fails to parse, leaving the caller to warn on emptiness.
    #[must_use]
    pub fn load_from_static(variant: DatabaseVariant) -> Self {
        let full = Self::from_json(DEFAULT_UNLOCK_DATA).unwrap_or_else(|err| {
            log::error!("bundled unlock database failed to parse: {err}");
            Self::empty()
        });
        match variant {
            DatabaseVariant::Full => full,
            DatabaseVariant::FreeToPlay => full.free_to_play(),
        }
    }

    /// Keep only entries available without membership.
    #[must_use]
    pub fn free_to_play(self) -> Self {
        Self {
            unlocks: self
                .unlocks
                .into_iter()
                .filter(|unlock| !unlock.members)
                .collect(),
        }
    }

    #[must_use]
    pub fn into_records(self) -> Vec<UnlockData> {
        self.unlocks
    }
}
