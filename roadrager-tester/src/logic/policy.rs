use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use roadrager_game::{Difficulty, Encounter, EncounterOption, MinigameDescriptor, WorldState};

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub option_index: usize,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub fn new(option_index: usize, rationale: Option<String>) -> Self {
        Self {
            option_index,
            rationale,
        }
    }
}

/// How a policy finishes a minigame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinigamePlay {
    Complete { success: bool, score: u32 },
    /// Lose the surface and settle through the fallback path.
    Abort,
}

/// Signals a policy sends for one minigame session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinigamePlan {
    pub play: MinigamePlay,
    /// Send a second, conflicting signal after the first.
    pub duplicate: bool,
}

/// Travel target offered to a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub id: String,
    pub is_current: bool,
    /// An encounter would be presented on arrival.
    pub has_content: bool,
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Select an option for the presented encounter.
    fn pick_option(&mut self, state: &WorldState, encounter: &Encounter) -> PolicyDecision;

    /// Decide how to finish an embedded minigame.
    fn play_minigame(&mut self, descriptor: &MinigameDescriptor) -> MinigamePlan;

    /// Pick where to travel when nothing is presented; `None` rests in place.
    fn pick_destination(&mut self, state: &WorldState, options: &[Destination]) -> Option<String>;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameplayStrategy {
    Cautious,
    Bold,
    Fallback,
    Random,
}

impl GameplayStrategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cautious => "Cautious",
            Self::Bold => "Bold",
            Self::Fallback => "Fallback",
            Self::Random => "Random",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy> {
        match self {
            Self::Cautious => Box::new(CautiousPolicy),
            Self::Bold => Box::new(BoldPolicy),
            Self::Fallback => Box::new(FallbackPolicy),
            Self::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct CautiousPolicy;
struct BoldPolicy;
struct FallbackPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

/// Net change an option makes to consumables and the car.
fn net_effect(option: &EncounterOption) -> i32 {
    let r = option.resource_effect;
    r.fuel + r.food + r.medicine + r.parts + option.car_health_effect.unwrap_or_default()
}

fn gains(option: &EncounterOption) -> i32 {
    let r = option.resource_effect;
    [r.fuel, r.food, r.medicine, r.parts]
        .into_iter()
        .filter(|v| *v > 0)
        .sum()
}

fn skilled_score(difficulty: Difficulty) -> u32 {
    match difficulty {
        Difficulty::Easy => 90,
        Difficulty::Medium => 70,
        Difficulty::Hard => 45,
    }
}

fn first_with_content(options: &[Destination]) -> Option<&Destination> {
    options.iter().find(|d| !d.is_current && d.has_content)
}

fn last_with_content(options: &[Destination]) -> Option<&Destination> {
    options.iter().rev().find(|d| !d.is_current && d.has_content)
}

fn first_elsewhere(options: &[Destination]) -> Option<&Destination> {
    options.iter().find(|d| !d.is_current)
}

impl PlayerPolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "Cautious"
    }

    fn pick_option(&mut self, _state: &WorldState, encounter: &Encounter) -> PolicyDecision {
        let (idx, net) = encounter
            .options
            .iter()
            .enumerate()
            .map(|(idx, option)| (idx, net_effect(option)))
            .rev()
            .max_by_key(|(_, net)| *net)
            .unwrap_or((0, 0));
        PolicyDecision::new(idx, Some(format!("net {net}")))
    }

    fn play_minigame(&mut self, descriptor: &MinigameDescriptor) -> MinigamePlan {
        MinigamePlan {
            play: MinigamePlay::Complete {
                success: true,
                score: skilled_score(descriptor.difficulty),
            },
            duplicate: false,
        }
    }

    fn pick_destination(&mut self, _state: &WorldState, options: &[Destination]) -> Option<String> {
        first_with_content(options)
            .or_else(|| first_elsewhere(options))
            .map(|d| d.id.clone())
    }
}

impl PlayerPolicy for BoldPolicy {
    fn name(&self) -> &'static str {
        "Bold"
    }

    fn pick_option(&mut self, _state: &WorldState, encounter: &Encounter) -> PolicyDecision {
        let (idx, reward) = encounter
            .options
            .iter()
            .enumerate()
            .map(|(idx, option)| {
                let ends = i32::from(option.outcome.game_over) * 100;
                (idx, gains(option) + ends)
            })
            .max_by_key(|(_, reward)| *reward)
            .unwrap_or((0, 0));
        PolicyDecision::new(idx, Some(format!("reward {reward}")))
    }

    fn play_minigame(&mut self, _descriptor: &MinigameDescriptor) -> MinigamePlan {
        MinigamePlan {
            play: MinigamePlay::Complete {
                success: false,
                score: 0,
            },
            duplicate: true,
        }
    }

    fn pick_destination(&mut self, _state: &WorldState, options: &[Destination]) -> Option<String> {
        last_with_content(options)
            .or_else(|| first_elsewhere(options))
            .map(|d| d.id.clone())
    }
}

impl PlayerPolicy for FallbackPolicy {
    fn name(&self) -> &'static str {
        "Fallback"
    }

    fn pick_option(&mut self, _state: &WorldState, _encounter: &Encounter) -> PolicyDecision {
        PolicyDecision::new(0, Some("first option".to_string()))
    }

    fn play_minigame(&mut self, _descriptor: &MinigameDescriptor) -> MinigamePlan {
        MinigamePlan {
            play: MinigamePlay::Abort,
            duplicate: true,
        }
    }

    fn pick_destination(&mut self, _state: &WorldState, options: &[Destination]) -> Option<String> {
        first_with_content(options)
            .or_else(|| first_elsewhere(options))
            .map(|d| d.id.clone())
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn pick_option(&mut self, _state: &WorldState, encounter: &Encounter) -> PolicyDecision {
        if encounter.options.is_empty() {
            return PolicyDecision::new(0, Some("no options".to_string()));
        }
        let idx = self.rng.gen_range(0..encounter.options.len());
        PolicyDecision::new(idx, Some("roll".to_string()))
    }

    fn play_minigame(&mut self, _descriptor: &MinigameDescriptor) -> MinigamePlan {
        let play = if self.rng.gen_bool(0.25) {
            MinigamePlay::Abort
        } else {
            MinigamePlay::Complete {
                success: self.rng.gen_bool(0.6),
                score: self.rng.gen_range(0..=150),
            }
        };
        MinigamePlan {
            play,
            duplicate: self.rng.gen_bool(0.3),
        }
    }

    fn pick_destination(&mut self, _state: &WorldState, options: &[Destination]) -> Option<String> {
        let with_content: Vec<&Destination> = options
            .iter()
            .filter(|d| !d.is_current && d.has_content)
            .collect();
        let pool: Vec<&Destination> = if with_content.is_empty() {
            options.iter().filter(|d| !d.is_current).collect()
        } else {
            with_content
        };
        if pool.is_empty() {
            return None;
        }
        let idx = self.rng.gen_range(0..pool.len());
        Some(pool[idx].id.clone())
    }
}
