use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use relic_engine::{
    AcquisitionConfig, ClueDifficulty, GameplaySignal, GearStyle, GearTier, RelicSession,
    RelicType, Skill, Tier, UnlockRegistry,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Separates the signal stream from the session's own RNG.
const SIGNAL_STREAM_SALT: u64 = 0x5157_A1E5;

/// Configuration for one simulated player.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub events: usize,
}

impl SimulationConfig {
    #[must_use]
    pub const fn new(seed: u64, events: usize) -> Self {
        Self { seed, events }
    }
}

/// An unlock committed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnlockRecord {
    pub event: usize,
    pub id: String,
    pub relic_type: RelicType,
    pub tier: Tier,
}

/// Outcome of one seeded run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationRecord {
    pub seed: u64,
    pub events: usize,
    pub ignored_signals: usize,
    pub relics_earned: BTreeMap<RelicType, BTreeMap<Tier, u32>>,
    pub unlocks: Vec<UnlockRecord>,
    pub failures: BTreeMap<String, u32>,
    pub relics_unspent: u64,
    pub skill_tiers: BTreeMap<Skill, Tier>,
    pub gear_tiers: BTreeMap<GearStyle, GearTier>,
}

impl SimulationRecord {
    #[must_use]
    pub fn relics_total(&self) -> u32 {
        self.relics_earned.values().flat_map(BTreeMap::values).sum()
    }
}

/// Synthetic gameplay: mostly skilling, some combat, the occasional clue.
#[derive(Debug)]
pub struct SignalGenerator {
    rng: ChaCha8Rng,
    skill_totals: BTreeMap<Skill, u64>,
}

impl SignalGenerator {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed ^ SIGNAL_STREAM_SALT),
            skill_totals: BTreeMap::new(),
        }
    }

    pub fn next_signal(&mut self) -> GameplaySignal {
        let roll = self.rng.gen_range(0..100);
        if roll < 70 {
            self.experience_drop()
        } else if roll < 95 {
            // Skew toward low-level monsters.
            let spread: u32 = self.rng.gen_range(1..=300);
            let combat_level = spread * spread / 300;
            GameplaySignal::ActorDefeated {
                combat_level: combat_level.max(1),
            }
        } else {
            let index = self.rng.gen_range(0..ClueDifficulty::ALL.len());
            GameplaySignal::PuzzleCompleted {
                difficulty: ClueDifficulty::ALL[index],
            }
        }
    }

    fn experience_drop(&mut self) -> GameplaySignal {
        let index = self.rng.gen_range(0..Skill::ALL.len());
        let skill = Skill::ALL[index];
        let amount =
            self.rng.gen_range(1..=40) + self.rng.gen_range(0..=40) * self.rng.gen_range(0..=4);
        let total = self.skill_totals.entry(skill).or_insert(0);
        let previous_total = *total;
        *total += u64::from(amount);
        GameplaySignal::ExperienceGained {
            skill,
            amount,
            previous_total,
        }
    }
}

/// Drive one session with synthetic signals, spending each relic as soon as
/// it is earned on the first unlock offered.
#[must_use]
pub fn run_simulation(
    registry: &UnlockRegistry,
    acquisition: &AcquisitionConfig,
    config: SimulationConfig,
) -> SimulationRecord {
    let mut session = RelicSession::new(registry.clone(), acquisition.clone(), config.seed);
    let mut signals = SignalGenerator::new(config.seed);
    let mut relics_earned: BTreeMap<RelicType, BTreeMap<Tier, u32>> = BTreeMap::new();
    let mut unlocks = Vec::new();
    let mut failures: BTreeMap<String, u32> = BTreeMap::new();
    let mut ignored_signals = 0;

    for event in 0..config.events {
        let signal = signals.next_signal();
        if signal.max_eligible_tier(acquisition).is_none() {
            ignored_signals += 1;
            continue;
        }
        let Some(award) = session.handle_signal(signal) else {
            continue;
        };
        *relics_earned
            .entry(award.slot.relic_type)
            .or_default()
            .entry(award.slot.tier)
            .or_default() += 1;

        let attempt = session
            .choose_relic(award.slot)
            .and_then(|_| session.confirm_choice(0));
        match attempt {
            Ok(receipt) => unlocks.push(UnlockRecord {
                event,
                id: receipt.unlock.id,
                relic_type: receipt.slot.relic_type,
                tier: receipt.slot.tier,
            }),
            Err(failure) => {
                log::debug!("seed {} event {event}: {failure}", config.seed);
                *failures.entry(failure.reason().to_string()).or_default() += 1;
                session.cancel_activation();
            }
        }
    }

    let state = session.state();
    SimulationRecord {
        seed: config.seed,
        events: config.events,
        ignored_signals,
        relics_earned,
        unlocks,
        failures,
        relics_unspent: state.total_relics(),
        skill_tiers: Skill::ALL
            .into_iter()
            .filter(|skill| skill.is_tier_capped())
            .map(|skill| (skill, state.skill_tier(skill)))
            .collect(),
        gear_tiers: GearStyle::ALL
            .into_iter()
            .map(|style| (style, state.gear_tier(style)))
            .collect(),
    }
}

/// Cross-seed averages for the report header.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SimulationSummary {
    pub runs: usize,
    pub mean_relics: f64,
    pub mean_unlocks: f64,
    pub failures: BTreeMap<String, u32>,
}

#[must_use]
pub fn summarize(records: &[SimulationRecord]) -> SimulationSummary {
    let mut failures: BTreeMap<String, u32> = BTreeMap::new();
    for record in records {
        for (reason, count) in &record.failures {
            *failures.entry(reason.clone()).or_default() += count;
        }
    }
    let runs = records.len();
    let relics: u64 = records.iter().map(|r| u64::from(r.relics_total())).sum();
    let unlocks: usize = records.iter().map(|r| r.unlocks.len()).sum();
    SimulationSummary {
        runs,
        mean_relics: mean(relics, runs),
        mean_unlocks: mean(unlocks as u64, runs),
        failures,
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(total: u64, runs: usize) -> f64 {
    if runs == 0 {
        0.0
    } else {
        total as f64 / runs as f64
    }
}
