//! Ordered progression tiers shared by relics, unlocks and skill caps.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    LEVEL_CAP_APPRENTICE, LEVEL_CAP_EXPERT, LEVEL_CAP_GRANDMASTER, LEVEL_CAP_JOURNEYMAN,
    LEVEL_CAP_LOCKED, LEVEL_CAP_MASTER, WEIGHT_APPRENTICE, WEIGHT_EXPERT, WEIGHT_GRANDMASTER,
    WEIGHT_JOURNEYMAN, WEIGHT_MASTER,
};

/// Progression tier. Declaration order is the total order used everywhere.
///
/// `Locked` sits below every real tier and is only ever used to describe a
/// skill that cannot be trained; it is never a relic or unlock tier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    #[default]
    Locked,
    Apprentice,
    Journeyman,
    Expert,
    Master,
    Grandmaster,
}

impl Tier {
    /// Every tier a relic or unlock may carry, ascending.
    pub const RELIC_TIERS: [Self; 5] = [
        Self::Apprentice,
        Self::Journeyman,
        Self::Expert,
        Self::Master,
        Self::Grandmaster,
    ];

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Locked => "Locked",
            Self::Apprentice => "Apprentice",
            Self::Journeyman => "Journeyman",
            Self::Expert => "Expert",
            Self::Master => "Master",
            Self::Grandmaster => "Grandmaster",
        }
    }

    /// Highest skill level permitted while a skill sits at this tier.
    #[must_use]
    pub const fn level_cap(self) -> u8 {
        match self {
            Self::Locked => LEVEL_CAP_LOCKED,
            Self::Apprentice => LEVEL_CAP_APPRENTICE,
            Self::Journeyman => LEVEL_CAP_JOURNEYMAN,
            Self::Expert => LEVEL_CAP_EXPERT,
            Self::Master => LEVEL_CAP_MASTER,
            Self::Grandmaster => LEVEL_CAP_GRANDMASTER,
        }
    }

    /// Fixed weight used by the weighted relic tier roll.
    #[must_use]
    pub const fn roll_weight(self) -> u32 {
        match self {
            Self::Locked => 0,
            Self::Apprentice => WEIGHT_APPRENTICE,
            Self::Journeyman => WEIGHT_JOURNEYMAN,
            Self::Expert => WEIGHT_EXPERT,
            Self::Master => WEIGHT_MASTER,
            Self::Grandmaster => WEIGHT_GRANDMASTER,
        }
    }

    #[must_use]
    pub const fn is_relic_tier(self) -> bool {
        !matches!(self, Self::Locked)
    }

    /// Parse the upper-case token used inside unlock ids (`JOURNEYMAN`).
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "LOCKED" => Some(Self::Locked),
            "APPRENTICE" => Some(Self::Apprentice),
            "JOURNEYMAN" => Some(Self::Journeyman),
            "EXPERT" => Some(Self::Expert),
            "MASTER" => Some(Self::Master),
            "GRANDMASTER" => Some(Self::Grandmaster),
            _ => None,
        }
    }

    /// Case-insensitive lookup by display name, defaulting to `Locked`.
    #[must_use]
    pub fn from_display_name(name: &str) -> Self {
        [Self::Locked]
            .into_iter()
            .chain(Self::RELIC_TIERS)
            .find(|tier| tier.display_name().eq_ignore_ascii_case(name.trim()))
            .unwrap_or(Self::Locked)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_strictly_ordered() {
        assert!(Tier::Locked < Tier::Apprentice);
        for pair in Tier::RELIC_TIERS.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].level_cap() < pair[1].level_cap());
            assert!(pair[0].roll_weight() > pair[1].roll_weight());
        }
    }

    #[test]
    fn tokens_and_display_names_resolve() {
        assert_eq!(Tier::from_token("EXPERT"), Some(Tier::Expert));
        assert_eq!(Tier::from_token("expert"), None);
        assert_eq!(Tier::from_display_name(" grandmaster "), Tier::Grandmaster);
        assert_eq!(Tier::from_display_name("mythic"), Tier::Locked);
    }

    #[test]
    fn serde_uses_screaming_case() {
        let json = serde_json::to_string(&Tier::Journeyman).unwrap();
        assert_eq!(json, "\"JOURNEYMAN\"");
        let parsed: Tier = serde_json::from_str("\"MASTER\"").unwrap();
        assert_eq!(parsed, Tier::Master);
    }
}
