use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::acquisition::{AcquisitionConfig, AcquisitionEngine, GameplaySignal, RollOutcome};
use crate::activation::{
    ActivationFailure, ActivationPhase, ActivationReceipt, ActivationResolver, ActivationStep,
};
use crate::data::ItemId;
use crate::effect::Skill;
use crate::permission::{PermissionChecker, SkillRestriction};
use crate::progression::ProgressionState;
use crate::registry::UnlockRegistry;
use crate::relic::RelicSlot;

/// A relic granted by a gameplay signal, for player notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelicAward {
    pub slot: RelicSlot,
    /// Relics of this slot held after the award.
    pub held: u32,
    /// The "1 in N" chance the roll succeeded against.
    pub threshold: u32,
}

/// One player's session: registry, drop configuration, progression and the
/// seeded RNG shared by acquisition rolls and activation shuffles.
///
/// All progression mutations go through `&mut self`; hosts that receive
/// signals and confirmations on different threads wrap the session in a
/// single mutex.
#[derive(Debug, Clone)]
pub struct RelicSession {
    registry: UnlockRegistry,
    config: AcquisitionConfig,
    state: ProgressionState,
    resolver: ActivationResolver,
    rng: ChaCha20Rng,
}

impl RelicSession {
    /// Construct a fresh session with empty progression.
    #[must_use]
    pub fn new(registry: UnlockRegistry, config: AcquisitionConfig, seed: u64) -> Self {
        Self::from_state(registry, config, ProgressionState::new(), seed)
    }

    /// Build a session around restored progression.
    #[must_use]
    pub fn from_state(
        registry: UnlockRegistry,
        config: AcquisitionConfig,
        state: ProgressionState,
        seed: u64,
    ) -> Self {
        Self {
            registry,
            config,
            state,
            resolver: ActivationResolver::new(),
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    #[must_use]
    pub const fn registry(&self) -> &UnlockRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    /// Borrow the underlying progression.
    #[must_use]
    pub const fn state(&self) -> &ProgressionState {
        &self.state
    }

    /// Apply a closure to the mutable progression.
    pub fn with_state_mut<R>(&mut self, f: impl FnOnce(&mut ProgressionState) -> R) -> R {
        f(&mut self.state)
    }

    /// Deterministically reseed the session.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha20Rng::seed_from_u64(seed);
    }

    // Acquisition ----------------------------------------------------------

    /// Roll a gameplay signal and bank any relic it awards.
    pub fn handle_signal(&mut self, signal: GameplaySignal) -> Option<RelicAward> {
        let outcome = AcquisitionEngine::new(&self.registry).roll_signal(
            &signal,
            &self.config,
            self.state.active_unlocks(),
            &mut self.rng,
        );
        let RollOutcome::Awarded { tier, threshold } = outcome else {
            return None;
        };
        let slot = RelicSlot::new(signal.relic_type(), tier);
        let held = self.state.add_relic(slot);
        Some(RelicAward {
            slot,
            held,
            threshold,
        })
    }

    /// Unlocks a relic of this slot could still reveal.
    #[must_use]
    pub fn available_count(&self, slot: RelicSlot) -> usize {
        self.registry
            .count_available(slot.relic_type, slot.tier, self.state.active_unlocks())
    }

    // Activation -----------------------------------------------------------

    #[must_use]
    pub const fn activation_phase(&self) -> &ActivationPhase {
        self.resolver.phase()
    }

    /// # Errors
    ///
    /// See [`ActivationResolver::begin`].
    pub fn begin_activation(&mut self) -> Result<ActivationStep, ActivationFailure> {
        self.resolver
            .begin(&self.registry, &self.state, &mut self.rng)
    }

    /// # Errors
    ///
    /// See [`ActivationResolver::choose_relic`].
    pub fn choose_relic(&mut self, slot: RelicSlot) -> Result<ActivationStep, ActivationFailure> {
        self.resolver
            .choose_relic(slot, &self.registry, &self.state, &mut self.rng)
    }

    /// # Errors
    ///
    /// See [`ActivationResolver::confirm`].
    pub fn confirm_unlock(&mut self, unlock_id: &str) -> Result<ActivationReceipt, ActivationFailure> {
        self.resolver.confirm(unlock_id, &mut self.state)
    }

    /// # Errors
    ///
    /// See [`ActivationResolver::confirm_index`].
    pub fn confirm_choice(&mut self, index: usize) -> Result<ActivationReceipt, ActivationFailure> {
        self.resolver.confirm_index(index, &mut self.state)
    }

    pub fn cancel_activation(&mut self) {
        self.resolver.cancel();
    }

    // Permissions ----------------------------------------------------------

    #[must_use]
    pub const fn permissions(&self) -> PermissionChecker<'_> {
        PermissionChecker::new(&self.registry)
    }

    #[must_use]
    pub fn is_item_permitted(&self, item_id: ItemId) -> bool {
        self.permissions()
            .is_item_permitted(item_id, self.state.active_unlocks())
    }

    #[must_use]
    pub fn skill_restriction(&self, skill: Skill, level: u8) -> SkillRestriction {
        self.permissions().skill_restriction(skill, level, &self.state)
    }

    #[must_use]
    pub fn is_content_unlocked(&self, id: &str) -> bool {
        self.permissions()
            .is_content_unlocked(id, self.state.active_unlocks())
    }

    /// Clear all progression and abandon any pending activation.
    pub fn reset_progression(&mut self) {
        self.resolver.cancel();
        self.state.reset();
    }

    /// Active unlock ids, for persistence.
    #[must_use]
    pub const fn active_unlocks(&self) -> &BTreeSet<String> {
        self.state.active_unlocks()
    }

    /// Consume the session, returning the progression for persistence.
    #[must_use]
    pub fn into_state(self) -> ProgressionState {
        self.state
    }
}
