//! Fixed drop weights, level caps and default drop tuning.
//!
//! Per-player knobs live in [`crate::AcquisitionConfig`]; everything here only
//! changes with the code.

// Weighted tier roll -------------------------------------------------------
pub(crate) const WEIGHT_APPRENTICE: u32 = 100;
pub(crate) const WEIGHT_JOURNEYMAN: u32 = 50;
pub(crate) const WEIGHT_EXPERT: u32 = 25;
pub(crate) const WEIGHT_MASTER: u32 = 10;
pub(crate) const WEIGHT_GRANDMASTER: u32 = 5;

// Skill level caps ---------------------------------------------------------
pub(crate) const LEVEL_CAP_LOCKED: u8 = 0;
pub(crate) const LEVEL_CAP_APPRENTICE: u8 = 20;
pub(crate) const LEVEL_CAP_JOURNEYMAN: u8 = 40;
pub(crate) const LEVEL_CAP_EXPERT: u8 = 60;
pub(crate) const LEVEL_CAP_MASTER: u8 = 80;
pub(crate) const LEVEL_CAP_GRANDMASTER: u8 = 99;

// Activation ---------------------------------------------------------------
/// Upper bound on the unlock options offered for a single relic.
pub const MAX_ACTIVATION_CHOICES: usize = 3;

// Acquisition defaults -----------------------------------------------------
pub(crate) const DEFAULT_SKILLING_BASE_CHANCE: u32 = 500;
pub(crate) const DEFAULT_COMBAT_BASE_CHANCE: u32 = 200;
pub(crate) const DEFAULT_EXPLORATION_BASE_CHANCE: u32 = 10;
pub(crate) const DEFAULT_SKILLING_XP_THRESHOLDS: [u32; 4] = [10, 30, 70, 150];
pub(crate) const DEFAULT_COMBAT_LEVEL_THRESHOLDS: [u32; 4] = [20, 50, 90, 150];

// Unlock id conventions ----------------------------------------------------
pub(crate) const SKILL_ID_PREFIX: &str = "SKILL_";
pub(crate) const GEAR_ID_PREFIX: &str = "GEAR_";
pub(crate) const QUEST_ID_PREFIX: &str = "QUEST_";
