//! Relic activation: consume one held relic and commit one new unlock.
//!
//! The resolver is a small state machine driven by a presentation layer:
//! `begin` (or `choose_relic`) produces choices, `confirm` commits one of
//! them, `cancel` abandons the attempt without touching progression. Every
//! failure returns the resolver to [`ActivationPhase::Idle`].
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::mem;
use thiserror::Error;

use crate::constants::MAX_ACTIVATION_CHOICES;
use crate::data::UnlockDefinition;
use crate::effect::{UnlockEffect, resolve_effect};
use crate::progression::ProgressionState;
use crate::registry::UnlockRegistry;
use crate::relic::RelicSlot;

pub type UnlockChoices = SmallVec<[UnlockDefinition; MAX_ACTIVATION_CHOICES]>;

/// Why an activation attempt ended without committing an unlock.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActivationFailure {
    #[error("no relics available to activate")]
    NoRelics,
    #[error("no unlocks are defined for {slot} relics")]
    NoUnlocksDefined { slot: RelicSlot },
    #[error("no new unlocks available for {slot} relics")]
    NothingNewAvailable { slot: RelicSlot },
    #[error("{slot} relic count changed before the unlock was committed")]
    CountMismatch { slot: RelicSlot },
    #[error("{selection} was not one of the offered choices")]
    InvalidSelection { selection: String },
    #[error("no activation choice is pending")]
    NotAwaitingChoice,
}

impl ActivationFailure {
    /// Stable snake_case label, used for tallies and reports.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::NoRelics => "no_relics",
            Self::NoUnlocksDefined { .. } => "no_unlocks_defined",
            Self::NothingNewAvailable { .. } => "nothing_new_available",
            Self::CountMismatch { .. } => "count_mismatch",
            Self::InvalidSelection { .. } => "invalid_selection",
            Self::NotAwaitingChoice => "not_awaiting_choice",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ActivationPhase {
    #[default]
    Idle,
    /// More than one relic slot is held; the caller must pick one.
    AwaitingTypeChoice { options: Vec<RelicSlot> },
    /// Up to three shuffled unlocks are on offer for `slot`.
    AwaitingUserChoice { slot: RelicSlot, choices: UnlockChoices },
}

/// What the presentation layer should render next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationStep {
    ChooseRelic(Vec<RelicSlot>),
    ChooseUnlock { slot: RelicSlot, options: UnlockChoices },
}

/// A committed activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationReceipt {
    pub unlock: UnlockDefinition,
    pub slot: RelicSlot,
    pub effect: UnlockEffect,
    /// False when the effect was already at or above this level.
    pub effect_applied: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ActivationResolver {
    phase: ActivationPhase,
}

impl ActivationResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn phase(&self) -> &ActivationPhase {
        &self.phase
    }

    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self.phase, ActivationPhase::Idle)
    }

    /// Start an attempt from whatever relics the player holds.
    ///
    /// # Errors
    ///
    /// Returns `ActivationFailure::NoRelics` when nothing is held, or any
    /// candidate failure when exactly one slot is held.
    pub fn begin<R: Rng>(
        &mut self,
        registry: &UnlockRegistry,
        state: &ProgressionState,
        rng: &mut R,
    ) -> Result<ActivationStep, ActivationFailure> {
        self.phase = ActivationPhase::Idle;
        let held = state.held_slots();
        match held.as_slice() {
            [] => {
                log::debug!("activation refused: no relics held");
                Err(ActivationFailure::NoRelics)
            }
            [slot] => self.offer(*slot, registry, state, rng),
            _ => {
                log::debug!("activation awaiting relic choice among {} slots", held.len());
                self.phase = ActivationPhase::AwaitingTypeChoice {
                    options: held.clone(),
                };
                Ok(ActivationStep::ChooseRelic(held))
            }
        }
    }

    /// Pick which held relic to spend. Valid when idle (the player chose a
    /// specific relic up front) or after `begin` asked for a relic choice.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSelection` if `slot` was not offered, `NoRelics` if it
    /// is not held, and candidate failures from the registry lookup.
    pub fn choose_relic<R: Rng>(
        &mut self,
        slot: RelicSlot,
        registry: &UnlockRegistry,
        state: &ProgressionState,
        rng: &mut R,
    ) -> Result<ActivationStep, ActivationFailure> {
        match mem::take(&mut self.phase) {
            ActivationPhase::Idle => {}
            ActivationPhase::AwaitingTypeChoice { options } => {
                if !options.contains(&slot) {
                    return Err(ActivationFailure::InvalidSelection {
                        selection: slot.to_string(),
                    });
                }
            }
            ActivationPhase::AwaitingUserChoice { .. } => {
                return Err(ActivationFailure::NotAwaitingChoice);
            }
        }
        if state.relic_count(slot) == 0 {
            return Err(ActivationFailure::NoRelics);
        }
        self.offer(slot, registry, state, rng)
    }

    fn offer<R: Rng>(
        &mut self,
        slot: RelicSlot,
        registry: &UnlockRegistry,
        state: &ProgressionState,
        rng: &mut R,
    ) -> Result<ActivationStep, ActivationFailure> {
        if registry
            .potential_unlocks(slot.relic_type, slot.tier)
            .is_empty()
        {
            log::debug!("activation failed: nothing defined for {slot}");
            return Err(ActivationFailure::NoUnlocksDefined { slot });
        }

        let mut candidates =
            registry.available_unlocks(slot.relic_type, slot.tier, state.active_unlocks());
        if candidates.is_empty() {
            log::debug!("activation failed: nothing new for {slot}");
            return Err(ActivationFailure::NothingNewAvailable { slot });
        }

        candidates.shuffle(rng);
        let choices: UnlockChoices = candidates
            .into_iter()
            .take(MAX_ACTIVATION_CHOICES)
            .cloned()
            .collect();
        log::debug!("offering {} unlock choices for {slot}", choices.len());
        self.phase = ActivationPhase::AwaitingUserChoice {
            slot,
            choices: choices.clone(),
        };
        Ok(ActivationStep::ChooseUnlock {
            slot,
            options: choices,
        })
    }

    /// Commit the offered unlock `unlock_id`: consume the relic, activate
    /// the id and apply its effect.
    ///
    /// # Errors
    ///
    /// Returns `NotAwaitingChoice` outside the choice phase,
    /// `InvalidSelection` for an id that was not offered, and
    /// `CountMismatch` when the relic disappeared since the offer.
    pub fn confirm(
        &mut self,
        unlock_id: &str,
        state: &mut ProgressionState,
    ) -> Result<ActivationReceipt, ActivationFailure> {
        let ActivationPhase::AwaitingUserChoice { slot, choices } = mem::take(&mut self.phase)
        else {
            return Err(ActivationFailure::NotAwaitingChoice);
        };
        let Some(unlock) = choices.into_iter().find(|choice| choice.id == unlock_id) else {
            return Err(ActivationFailure::InvalidSelection {
                selection: unlock_id.to_string(),
            });
        };

        if !state.consume_relic(slot) {
            log::debug!("activation of {unlock_id} failed: {slot} count is zero");
            return Err(ActivationFailure::CountMismatch { slot });
        }
        state.activate(&unlock.id);
        let effect = resolve_effect(&unlock);
        let effect_applied = state.apply_effect(&effect);
        log::info!("Unlocked {} ({}) with a {slot} relic", unlock.name, unlock.id);

        Ok(ActivationReceipt {
            unlock,
            slot,
            effect,
            effect_applied,
        })
    }

    /// Commit the choice at `index` in the offered list.
    ///
    /// # Errors
    ///
    /// Same as [`ActivationResolver::confirm`].
    pub fn confirm_index(
        &mut self,
        index: usize,
        state: &mut ProgressionState,
    ) -> Result<ActivationReceipt, ActivationFailure> {
        let id = match &self.phase {
            ActivationPhase::AwaitingUserChoice { choices, .. } => {
                choices.get(index).map(|choice| choice.id.clone())
            }
            ActivationPhase::Idle | ActivationPhase::AwaitingTypeChoice { .. } => {
                self.phase = ActivationPhase::Idle;
                return Err(ActivationFailure::NotAwaitingChoice);
            }
        };
        match id {
            Some(id) => self.confirm(&id, state),
            None => {
                self.phase = ActivationPhase::Idle;
                Err(ActivationFailure::InvalidSelection {
                    selection: format!("choice #{index}"),
                })
            }
        }
    }

    /// Abandon the attempt. Nothing is consumed.
    pub fn cancel(&mut self) {
        if !self.is_idle() {
            log::debug!("activation cancelled");
        }
        self.phase = ActivationPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{UnlockCategory, UnlockData};
    use crate::effect::Skill;
    use crate::relic::RelicType;
    use crate::tier::Tier;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::BTreeMap;

    const SKILLING_APPRENTICE: RelicSlot = RelicSlot::new(RelicType::Skilling, Tier::Apprentice);
    const COMBAT_EXPERT: RelicSlot = RelicSlot::new(RelicType::Combat, Tier::Expert);

    fn record(id: &str, slot: RelicSlot) -> UnlockData {
        UnlockData {
            id: Some(id.to_string()),
            name: id.to_lowercase(),
            relic_type: Some(slot.relic_type),
            required_tier: Some(slot.tier),
            ..UnlockData::default()
        }
    }

    fn registry(records: Vec<UnlockData>) -> UnlockRegistry {
        UnlockRegistry::load(records).0
    }

    fn holding(slots: &[(RelicSlot, u32)]) -> ProgressionState {
        let mut state = ProgressionState::new();
        for &(slot, count) in slots {
            state.set_relic_count(slot, count);
        }
        state
    }

    #[test]
    fn begin_without_relics_fails() {
        let registry = registry(vec![record("A", SKILLING_APPRENTICE)]);
        let mut resolver = ActivationResolver::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let result = resolver.begin(&registry, &ProgressionState::new(), &mut rng);
        assert_eq!(result, Err(ActivationFailure::NoRelics));
        assert!(resolver.is_idle());
    }

    #[test]
    fn single_slot_goes_straight_to_candidates() {
        let registry = registry(vec![
            record("A", SKILLING_APPRENTICE),
            record("B", SKILLING_APPRENTICE),
        ]);
        let state = holding(&[(SKILLING_APPRENTICE, 2)]);
        let mut resolver = ActivationResolver::new();
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let step = resolver.begin(&registry, &state, &mut rng).unwrap();
        let ActivationStep::ChooseUnlock { slot, options } = step else {
            panic!("expected unlock choices");
        };
        assert_eq!(slot, SKILLING_APPRENTICE);
        assert_eq!(options.len(), 2);
    }

    #[test]
    fn multiple_slots_ask_for_a_relic_first() {
        let registry = registry(vec![
            record("A", SKILLING_APPRENTICE),
            record("C", COMBAT_EXPERT),
        ]);
        let state = holding(&[(SKILLING_APPRENTICE, 1), (COMBAT_EXPERT, 1)]);
        let mut resolver = ActivationResolver::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let step = resolver.begin(&registry, &state, &mut rng).unwrap();
        assert_eq!(
            step,
            ActivationStep::ChooseRelic(vec![SKILLING_APPRENTICE, COMBAT_EXPERT])
        );

        let other = RelicSlot::new(RelicType::Exploration, Tier::Master);
        assert_eq!(
            resolver.choose_relic(other, &registry, &state, &mut rng),
            Err(ActivationFailure::InvalidSelection {
                selection: other.to_string()
            })
        );
        assert!(resolver.is_idle());

        resolver.begin(&registry, &state, &mut rng).unwrap();
        let step = resolver
            .choose_relic(COMBAT_EXPERT, &registry, &state, &mut rng)
            .unwrap();
        assert!(matches!(step, ActivationStep::ChooseUnlock { slot, .. } if slot == COMBAT_EXPERT));
    }

    #[test]
    fn distinguishes_undefined_from_exhausted() {
        let registry = registry(vec![record("A", SKILLING_APPRENTICE)]);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut resolver = ActivationResolver::new();

        let combat = holding(&[(COMBAT_EXPERT, 1)]);
        assert_eq!(
            resolver.begin(&registry, &combat, &mut rng),
            Err(ActivationFailure::NoUnlocksDefined {
                slot: COMBAT_EXPERT
            })
        );

        let mut exhausted = holding(&[(SKILLING_APPRENTICE, 1)]);
        exhausted.activate("A");
        assert_eq!(
            resolver.begin(&registry, &exhausted, &mut rng),
            Err(ActivationFailure::NothingNewAvailable {
                slot: SKILLING_APPRENTICE
            })
        );
        assert!(resolver.is_idle());
    }

    #[test]
    fn confirm_consumes_activates_and_applies_effect() {
        let mut skill = record("SKILL_FISHING_APPRENTICE", SKILLING_APPRENTICE);
        skill.category = UnlockCategory::SkillTier;
        let registry = registry(vec![skill]);
        let mut state = holding(&[(SKILLING_APPRENTICE, 2)]);
        let mut resolver = ActivationResolver::new();
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        resolver.begin(&registry, &state, &mut rng).unwrap();
        let receipt = resolver
            .confirm("SKILL_FISHING_APPRENTICE", &mut state)
            .unwrap();

        assert_eq!(receipt.slot, SKILLING_APPRENTICE);
        assert!(receipt.effect_applied);
        assert_eq!(
            receipt.effect,
            UnlockEffect::SkillTier {
                skill: Skill::Fishing,
                tier: Tier::Apprentice
            }
        );
        assert_eq!(state.relic_count(SKILLING_APPRENTICE), 1);
        assert!(state.is_active("SKILL_FISHING_APPRENTICE"));
        assert_eq!(state.skill_tier(Skill::Fishing), Tier::Apprentice);
        assert!(resolver.is_idle());
    }

    #[test]
    fn cancel_leaves_progression_untouched() {
        let registry = registry(vec![record("A", SKILLING_APPRENTICE)]);
        let state = holding(&[(SKILLING_APPRENTICE, 1)]);
        let before = state.clone();
        let mut resolver = ActivationResolver::new();
        let mut rng = ChaCha8Rng::seed_from_u64(6);

        resolver.begin(&registry, &state, &mut rng).unwrap();
        resolver.cancel();
        assert!(resolver.is_idle());
        assert_eq!(state, before);
    }

    #[test]
    fn commit_rechecks_relic_count() {
        let registry = registry(vec![record("A", SKILLING_APPRENTICE)]);
        let mut state = holding(&[(SKILLING_APPRENTICE, 1)]);
        let mut resolver = ActivationResolver::new();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        resolver.begin(&registry, &state, &mut rng).unwrap();
        state.set_relic_count(SKILLING_APPRENTICE, 0);
        assert_eq!(
            resolver.confirm("A", &mut state),
            Err(ActivationFailure::CountMismatch {
                slot: SKILLING_APPRENTICE
            })
        );
        assert!(state.active_unlocks().is_empty());
        assert!(resolver.is_idle());
    }

    #[test]
    fn out_of_order_calls_are_rejected() {
        let registry = registry(vec![record("A", SKILLING_APPRENTICE)]);
        let mut state = holding(&[(SKILLING_APPRENTICE, 1)]);
        let mut resolver = ActivationResolver::new();
        let mut rng = ChaCha8Rng::seed_from_u64(8);

        assert_eq!(
            resolver.confirm("A", &mut state),
            Err(ActivationFailure::NotAwaitingChoice)
        );
        resolver.begin(&registry, &state, &mut rng).unwrap();
        assert_eq!(
            resolver.confirm("Z", &mut state),
            Err(ActivationFailure::InvalidSelection {
                selection: "Z".to_string()
            })
        );
        assert_eq!(state.relic_count(SKILLING_APPRENTICE), 1);

        resolver.begin(&registry, &state, &mut rng).unwrap();
        assert!(resolver.confirm_index(3, &mut state).is_err());
        resolver.begin(&registry, &state, &mut rng).unwrap();
        assert_eq!(resolver.confirm_index(0, &mut state).unwrap().unlock.id, "A");
    }

    #[test]
    fn five_candidates_offer_three_uniformly() {
        let ids = ["A", "B", "C", "D", "E"];
        let registry = registry(
            ids.iter()
                .map(|id| record(id, SKILLING_APPRENTICE))
                .collect(),
        );
        let state = holding(&[(SKILLING_APPRENTICE, 1)]);
        let mut resolver = ActivationResolver::new();
        let mut rng = ChaCha8Rng::seed_from_u64(0x5EED);
        let mut seen: BTreeMap<String, u32> = BTreeMap::new();

        let trials = 10_000;
        for _ in 0..trials {
            let Ok(ActivationStep::ChooseUnlock { options, .. }) =
                resolver.begin(&registry, &state, &mut rng)
            else {
                panic!("expected unlock choices");
            };
            assert_eq!(options.len(), MAX_ACTIVATION_CHOICES);
            for option in options {
                *seen.entry(option.id).or_default() += 1;
            }
            resolver.cancel();
        }

        // Each id is offered with probability 3/5.
        assert_eq!(seen.len(), ids.len());
        for (id, count) in seen {
            assert!((5_700..6_300).contains(&count), "{id} offered {count} times");
        }
    }

    #[test]
    fn failure_reasons_are_stable_labels() {
        assert_eq!(ActivationFailure::NoRelics.reason(), "no_relics");
        assert_eq!(
            ActivationFailure::CountMismatch {
                slot: SKILLING_APPRENTICE
            }
            .reason(),
            "count_mismatch"
        );
    }
}
