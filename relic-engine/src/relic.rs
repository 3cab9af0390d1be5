//! Relic pools and the (type, tier) slot that keys inventory counts.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tier::Tier;

/// Which relic pool can reveal a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelicType {
    Skilling,
    Combat,
    Exploration,
}

impl RelicType {
    pub const ALL: [Self; 3] = [Self::Skilling, Self::Combat, Self::Exploration];

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Skilling => "Skilling",
            Self::Combat => "Combat",
            Self::Exploration => "Exploration",
        }
    }
}

impl fmt::Display for RelicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A relic inventory slot: one relic type at one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelicSlot {
    pub relic_type: RelicType,
    pub tier: Tier,
}

impl RelicSlot {
    #[must_use]
    pub const fn new(relic_type: RelicType, tier: Tier) -> Self {
        Self { relic_type, tier }
    }

    /// Every valid slot, grouped by relic type then ascending tier.
    pub fn all() -> impl Iterator<Item = Self> {
        RelicType::ALL.into_iter().flat_map(|relic_type| {
            Tier::RELIC_TIERS
                .into_iter()
                .map(move |tier| Self::new(relic_type, tier))
        })
    }
}

impl fmt::Display for RelicSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.relic_type, self.tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_cover_every_type_and_tier() {
        let slots: Vec<RelicSlot> = RelicSlot::all().collect();
        assert_eq!(slots.len(), 15);
        assert!(slots.iter().all(|slot| slot.tier.is_relic_tier()));
        assert_eq!(slots[0], RelicSlot::new(RelicType::Skilling, Tier::Apprentice));
    }

    #[test]
    fn slot_formats_like_a_menu_option() {
        let slot = RelicSlot::new(RelicType::Exploration, Tier::Expert);
        assert_eq!(slot.to_string(), "Exploration (Expert)");
    }
}
