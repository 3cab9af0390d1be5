//! Relic Engine
//!
//! Platform-agnostic progression gating: relics earned from gameplay signals
//! are spent to reveal unlocks, and the active unlock set gates which items,
//! skill levels and content the player may use. This crate performs no I/O;
//! hosts plug in a [`DefinitionSource`] and a [`ProgressionStore`].

pub mod acquisition;
pub mod activation;
pub mod constants;
pub mod data;
pub mod effect;
pub mod permission;
pub mod progression;
pub mod registry;
pub mod relic;
pub mod session;
pub mod tier;

// Re-export commonly used types
pub use acquisition::{
    AcquisitionConfig, AcquisitionConfigError, AcquisitionEngine, ClueDifficulty, GameplaySignal,
    RollOutcome, RollRequest, roll_relic_tier, success_threshold, tier_from_thresholds,
};
pub use activation::{
    ActivationFailure, ActivationPhase, ActivationReceipt, ActivationResolver, ActivationStep,
    UnlockChoices,
};
pub use constants::MAX_ACTIVATION_CHOICES;
pub use data::{
    DatabaseVariant, ItemId, UnlockCategory, UnlockData, UnlockDatabase, UnlockDefinition,
};
pub use effect::{
    GearStyle, GearTier, Skill, UnlockEffect, gear_tier_id, quest_unlock_id, resolve_effect,
    skill_tier_id,
};
pub use permission::{PermissionChecker, SkillRestriction};
pub use progression::ProgressionState;
pub use registry::{LoadWarning, UnlockRegistry};
pub use relic::{RelicSlot, RelicType};
pub use session::{RelicAward, RelicSession};
pub use tier::Tier;

/// Trait for abstracting where unlock definitions come from.
/// Records arrive already parsed; validation happens in the registry.
pub trait DefinitionSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the raw unlock records.
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be read or parsed.
    fn load_definitions(&self) -> Result<Vec<UnlockData>, Self::Error>;
}

/// Trait for abstracting progression persistence.
pub trait ProgressionStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save progression for a profile
    ///
    /// # Errors
    ///
    /// Returns an error if the progression cannot be saved.
    fn save_progression(&self, profile: &str, state: &ProgressionState)
    -> Result<(), Self::Error>;

    /// Load progression for a profile
    ///
    /// # Errors
    ///
    /// Returns an error if stored progression exists but cannot be read.
    fn load_progression(&self, profile: &str) -> Result<Option<ProgressionState>, Self::Error>;

    /// Delete a profile's progression
    ///
    /// # Errors
    ///
    /// Returns an error if the stored progression cannot be removed.
    fn delete_progression(&self, profile: &str) -> Result<(), Self::Error>;
}

/// The bundled database as a [`DefinitionSource`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledDefinitions(pub DatabaseVariant);

impl DefinitionSource for BundledDefinitions {
    type Error = std::convert::Infallible;

    fn load_definitions(&self) -> Result<Vec<UnlockData>, Self::Error> {
        Ok(UnlockDatabase::load_from_static(self.0).into_records())
    }
}

/// Main engine binding a definition source to a progression store
pub struct RelicEngine<L, S>
where
    L: DefinitionSource,
    S: ProgressionStore,
{
    source: L,
    store: S,
}

impl<L, S> RelicEngine<L, S>
where
    L: DefinitionSource,
    S: ProgressionStore,
{
    /// Create a new engine with the provided definition source and store
    pub const fn new(source: L, store: S) -> Self {
        Self { source, store }
    }

    /// Build the registry, returning any load warnings for the caller to
    /// surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the definitions cannot be loaded.
    pub fn load_registry(&self) -> Result<(UnlockRegistry, Vec<LoadWarning>), L::Error> {
        let records = self.source.load_definitions()?;
        Ok(UnlockRegistry::load(records))
    }

    /// Start a fresh session with empty progression.
    ///
    /// # Errors
    ///
    /// Returns an error if the definitions cannot be loaded.
    pub fn create_session(
        &self,
        config: AcquisitionConfig,
        seed: u64,
    ) -> Result<RelicSession, L::Error> {
        let (registry, _) = self.load_registry()?;
        Ok(RelicSession::new(registry, config, seed))
    }

    /// Save a profile's progression
    ///
    /// # Errors
    ///
    /// Returns an error if the progression cannot be saved.
    pub fn save_progression(&self, profile: &str, state: &ProgressionState) -> Result<(), S::Error> {
        self.store.save_progression(profile, state)
    }

    /// Load a profile's progression, replaying active unlock effects against
    /// the current definitions.
    ///
    /// # Errors
    ///
    /// Returns an error if the definitions or the stored progression cannot
    /// be loaded.
    pub fn load_progression(&self, profile: &str) -> Result<Option<ProgressionState>, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
        S::Error: Into<anyhow::Error>,
    {
        if let Some(mut state) = self.store.load_progression(profile).map_err(Into::into)? {
            let (registry, _) = self.load_registry().map_err(Into::into)?;
            state.rebuild_effects(&registry);
            Ok(Some(state))
        } else {
            Ok(None)
        }
    }

    /// Resume a profile, or start fresh when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the definitions or the stored progression cannot
    /// be loaded.
    pub fn resume_session(
        &self,
        profile: &str,
        config: AcquisitionConfig,
        seed: u64,
    ) -> Result<RelicSession, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
        S::Error: Into<anyhow::Error>,
    {
        let state = self.load_progression(profile)?.unwrap_or_default();
        let (registry, _) = self.load_registry().map_err(Into::into)?;
        Ok(RelicSession::from_state(registry, config, state, seed))
    }

    /// Delete a profile's progression
    ///
    /// # Errors
    ///
    /// Returns an error if the stored progression cannot be removed.
    pub fn delete_progression(&self, profile: &str) -> Result<(), S::Error> {
        self.store.delete_progression(profile)
    }
}
