//! Immutable index over every unlock definition.
//!
//! The registry is built once per session from already-parsed records and
//! answers what a relic could reveal, whether prerequisites hold, and which
//! unlocks gate a given item. Malformed records are skipped with a
//! [`LoadWarning`] instead of aborting the load.
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use thiserror::Error;

use crate::data::{ItemId, UnlockCategory, UnlockData, UnlockDefinition};
use crate::relic::{RelicSlot, RelicType};
use crate::tier::Tier;

/// Non-fatal problem found while building the registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadWarning {
    #[error("unlock database is empty")]
    EmptyDatabase,
    #[error("entry {index} ({name:?}) has a missing or blank id; skipped")]
    MissingId { index: usize, name: String },
    #[error("entry {index} duplicates id {id}; skipped")]
    DuplicateId { index: usize, id: String },
    #[error("entry {index} ({id}) has no required tier; skipped")]
    MissingTier { index: usize, id: String },
    #[error("entry {index} ({id}) uses LOCKED as its required tier; skipped")]
    LockedTier { index: usize, id: String },
    #[error("entry {index} ({id}) has no relic type; skipped")]
    MissingRelicType { index: usize, id: String },
    #[error("{id} lists unknown prerequisite {prerequisite}")]
    UnknownPrerequisite { id: String, prerequisite: String },
    #[error("{id} lists itself as a prerequisite")]
    SelfPrerequisite { id: String },
    #[error("prerequisite cycle blocks {}", ids.join(", "))]
    PrerequisiteCycle { ids: Vec<String> },
    #[error("item {item_id} is claimed by {previous} and {replacement}; using {replacement}")]
    SharedSpecificItem {
        item_id: ItemId,
        previous: String,
        replacement: String,
    },
    #[error("{id} is a {category:?} unlock without item ids")]
    MissingItemIds { id: String, category: UnlockCategory },
}

#[derive(Debug, Clone, Default)]
pub struct UnlockRegistry {
    definitions: Vec<UnlockDefinition>,
    by_id: HashMap<String, usize>,
    by_slot: HashMap<RelicSlot, Vec<usize>>,
    prerequisites_of: HashMap<String, BTreeSet<String>>,
    specific_item_owner: HashMap<ItemId, String>,
    gear_tier_members: HashMap<ItemId, BTreeSet<String>>,
}

impl UnlockRegistry {
    /// Build the registry, returning it together with every warning raised.
    #[must_use]
    pub fn load(records: Vec<UnlockData>) -> (Self, Vec<LoadWarning>) {
        let mut registry = Self::default();
        let mut warnings = Vec::new();

        if records.is_empty() {
            warnings.push(LoadWarning::EmptyDatabase);
        }

        for (index, record) in records.into_iter().enumerate() {
            match validate_record(index, record, &registry.by_id) {
                Ok(definition) => registry.insert(definition, &mut warnings),
                Err(warning) => warnings.push(warning),
            }
        }

        warnings.extend(registry.check_prerequisite_graph());

        for warning in &warnings {
            log::warn!("unlock registry: {warning}");
        }
        log::info!(
            "Processed {} unlocks into the registry ({} warnings)",
            registry.len(),
            warnings.len()
        );
        (registry, warnings)
    }

    fn insert(&mut self, definition: UnlockDefinition, warnings: &mut Vec<LoadWarning>) {
        let index = self.definitions.len();
        let id = definition.id.clone();

        if definition.category.uses_item_ids()
            && definition.item_ids.as_ref().is_none_or(BTreeSet::is_empty)
        {
            warnings.push(LoadWarning::MissingItemIds {
                id: id.clone(),
                category: definition.category,
            });
        }

        if let Some(items) = definition.item_ids.as_ref() {
            match definition.category {
                UnlockCategory::SpecificItem => {
                    for &item_id in items {
                        if let Some(previous) = self.specific_item_owner.insert(item_id, id.clone())
                        {
                            warnings.push(LoadWarning::SharedSpecificItem {
                                item_id,
                                previous,
                                replacement: id.clone(),
                            });
                        }
                    }
                }
                UnlockCategory::GearTier => {
                    for &item_id in items {
                        self.gear_tier_members
                            .entry(item_id)
                            .or_default()
                            .insert(id.clone());
                    }
                }
                UnlockCategory::SkillTier
                | UnlockCategory::Area
                | UnlockCategory::Quest
                | UnlockCategory::Mechanic
                | UnlockCategory::SkillingMethod
                | UnlockCategory::Boss
                | UnlockCategory::Other => {}
            }
        }

        let slot = RelicSlot::new(definition.relic_type, definition.required_tier);
        self.by_slot.entry(slot).or_default().push(index);
        self.prerequisites_of
            .insert(id.clone(), definition.prerequisites.clone());
        self.by_id.insert(id, index);
        self.definitions.push(definition);
    }

    /// Flag unknown ids, self references and cycles. Flagged entries stay
    /// loaded; a cyclic entry can simply never satisfy its prerequisites.
    fn check_prerequisite_graph(&self) -> Vec<LoadWarning> {
        let mut warnings = Vec::new();
        let mut in_degree: BTreeMap<&str, usize> = BTreeMap::new();
        let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

        for definition in &self.definitions {
            let id = definition.id.as_str();
            in_degree.entry(id).or_insert(0);
            for prerequisite in &definition.prerequisites {
                if prerequisite == id {
                    warnings.push(LoadWarning::SelfPrerequisite { id: id.to_string() });
                } else if !self.by_id.contains_key(prerequisite) {
                    warnings.push(LoadWarning::UnknownPrerequisite {
                        id: id.to_string(),
                        prerequisite: prerequisite.clone(),
                    });
                    continue;
                }
                dependents
                    .entry(prerequisite.as_str())
                    .or_default()
                    .push(id);
                *in_degree.entry(id).or_insert(0) += 1;
            }
        }

        // Kahn's algorithm: whatever never reaches in-degree zero sits on or
        // behind a cycle.
        let mut queue: VecDeque<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();
        while let Some(node) = queue.pop_front() {
            for &dependent in dependents.get(node).map_or(&[][..], Vec::as_slice) {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        queue.push_back(dependent);
                    }
                }
            }
        }

        let blocked: Vec<String> = in_degree
            .into_iter()
            .filter(|(_, degree)| *degree > 0)
            .map(|(id, _)| id.to_string())
            .collect();
        if !blocked.is_empty() {
            warnings.push(LoadWarning::PrerequisiteCycle { ids: blocked });
        }
        warnings
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// All definitions in load order.
    pub fn iter(&self) -> impl Iterator<Item = &UnlockDefinition> {
        self.definitions.iter()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&UnlockDefinition> {
        self.by_id.get(id).map(|&index| &self.definitions[index])
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Definitions whose relic type and required tier match exactly.
    #[must_use]
    pub fn potential_unlocks(&self, relic_type: RelicType, tier: Tier) -> Vec<&UnlockDefinition> {
        self.by_slot
            .get(&RelicSlot::new(relic_type, tier))
            .map(|indices| indices.iter().map(|&i| &self.definitions[i]).collect())
            .unwrap_or_default()
    }

    /// True when `id` has no known prerequisites or all of them are active.
    #[must_use]
    pub fn are_prerequisites_met(&self, id: &str, active: &BTreeSet<String>) -> bool {
        self.prerequisites_of
            .get(id)
            .is_none_or(|prerequisites| prerequisites.iter().all(|p| active.contains(p)))
    }

    /// Potential unlocks for the slot that are neither active nor blocked by
    /// prerequisites, in load order.
    #[must_use]
    pub fn available_unlocks(
        &self,
        relic_type: RelicType,
        tier: Tier,
        active: &BTreeSet<String>,
    ) -> Vec<&UnlockDefinition> {
        self.potential_unlocks(relic_type, tier)
            .into_iter()
            .filter(|definition| !active.contains(&definition.id))
            .filter(|definition| self.are_prerequisites_met(&definition.id, active))
            .collect()
    }

    /// Number of unlocks a relic of this slot could still reveal. Always
    /// recomputed; the active set changes over a session.
    #[must_use]
    pub fn count_available(
        &self,
        relic_type: RelicType,
        tier: Tier,
        active: &BTreeSet<String>,
    ) -> usize {
        self.available_unlocks(relic_type, tier, active).len()
    }

    /// SPECIFIC_ITEM unlock that solely owns `item_id`, if any.
    #[must_use]
    pub fn specific_item_owner(&self, item_id: ItemId) -> Option<&str> {
        self.specific_item_owner.get(&item_id).map(String::as_str)
    }

    /// GEAR_TIER unlocks listing `item_id`.
    #[must_use]
    pub fn gear_tier_members(&self, item_id: ItemId) -> Option<&BTreeSet<String>> {
        self.gear_tier_members.get(&item_id)
    }
}

fn validate_record(
    index: usize,
    record: UnlockData,
    known: &HashMap<String, usize>,
) -> Result<UnlockDefinition, LoadWarning> {
    let id = match record.id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            return Err(LoadWarning::MissingId {
                index,
                name: record.name,
            });
        }
    };
    if known.contains_key(&id) {
        return Err(LoadWarning::DuplicateId { index, id });
    }
    let Some(required_tier) = record.required_tier else {
        return Err(LoadWarning::MissingTier { index, id });
    };
    if !required_tier.is_relic_tier() {
        return Err(LoadWarning::LockedTier { index, id });
    }
    let Some(relic_type) = record.relic_type else {
        return Err(LoadWarning::MissingRelicType { index, id });
    };

    let item_ids = if record.category.uses_item_ids() {
        record.item_ids
    } else {
        None
    };

    Ok(UnlockDefinition {
        id,
        name: record.name,
        description: record.description,
        category: record.category,
        relic_type,
        required_tier,
        prerequisites: record
            .prerequisites
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect(),
        item_ids,
        area_definition: record.area_definition,
        quest_id: record.quest_id,
    })
}
