//! Minigame outcome adapter and one-shot session guard.
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::FallbackScores;
use crate::constants::{
    DRIVING_FAILURE_DAMAGE, DRIVING_HEALTH_DIVISOR, REPAIR_FAILURE_PARTS, REPAIR_HEALTH_DIVISOR,
    REPAIR_PARTS_DIVISOR, SCAVENGE_FOOD_DIVISOR, SCAVENGE_FUEL_DIVISOR, SCAVENGE_MEDICINE_DIVISOR,
    SCAVENGE_PARTS_DIVISOR,
};
use crate::data::ResourceDelta;
use crate::effects::StateDelta;

/// Skill challenge embedded in an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinigameKind {
    Driving,
    Repair,
    Scavenge,
}

impl MinigameKind {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Driving => "driving",
            Self::Repair => "repair",
            Self::Scavenge => "scavenge",
        }
    }
}

impl std::fmt::Display for MinigameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Difficulty forwarded to the minigame collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Score reported when the minigame surface is lost mid-session.
    #[must_use]
    pub const fn fallback_score(self, scores: &FallbackScores) -> u32 {
        match self {
            Self::Easy => scores.easy,
            Self::Medium => scores.medium,
            Self::Hard => scores.hard,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinigameDescriptor {
    #[serde(rename = "type")]
    pub kind: MinigameKind,
    #[serde(default)]
    pub difficulty: Difficulty,
}

/// Result reported by the minigame collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinigameResult {
    pub success: bool,
    pub score: u32,
}

fn score_share(score: u32, divisor: u32) -> i32 {
    i32::try_from(score / divisor).unwrap_or(i32::MAX)
}

/// Map a minigame result to the resource and car-health delta it grants.
#[must_use]
pub fn minigame_delta(kind: MinigameKind, result: MinigameResult) -> StateDelta {
    let MinigameResult { success, score } = result;
    match (kind, success) {
        (MinigameKind::Driving, true) => StateDelta {
            car_health: score_share(score, DRIVING_HEALTH_DIVISOR),
            ..StateDelta::default()
        },
        (MinigameKind::Driving, false) => StateDelta {
            car_health: -DRIVING_FAILURE_DAMAGE,
            ..StateDelta::default()
        },
        (MinigameKind::Repair, true) => StateDelta {
            car_health: score_share(score, REPAIR_HEALTH_DIVISOR),
            resources: ResourceDelta {
                parts: -score_share(score, REPAIR_PARTS_DIVISOR),
                ..ResourceDelta::default()
            },
        },
        (MinigameKind::Repair, false) => StateDelta {
            resources: ResourceDelta {
                parts: -REPAIR_FAILURE_PARTS,
                ..ResourceDelta::default()
            },
            ..StateDelta::default()
        },
        (MinigameKind::Scavenge, true) => StateDelta {
            resources: ResourceDelta {
                food: score_share(score, SCAVENGE_FOOD_DIVISOR),
                medicine: score_share(score, SCAVENGE_MEDICINE_DIVISOR),
                parts: score_share(score, SCAVENGE_PARTS_DIVISOR),
                fuel: score_share(score, SCAVENGE_FUEL_DIVISOR),
            },
            ..StateDelta::default()
        },
        (MinigameKind::Scavenge, false) => StateDelta::default(),
    }
}

/// Completion signal delivered to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinigameSignal {
    Completed(MinigameResult),
    /// The rendering surface was lost; settle with the difficulty fallback.
    Fallback,
}

/// Outcome of the first signal a session accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettledMinigame {
    pub result: MinigameResult,
    pub delta: StateDelta,
    pub via_fallback: bool,
}

/// One running minigame. Accepts exactly one completion signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinigameSession {
    id: u64,
    encounter_id: String,
    descriptor: MinigameDescriptor,
    fallback_score: u32,
    settled: bool,
}

impl MinigameSession {
    #[must_use]
    pub fn new(
        id: u64,
        encounter_id: impl Into<String>,
        descriptor: MinigameDescriptor,
        fallback: &FallbackScores,
    ) -> Self {
        Self {
            id,
            encounter_id: encounter_id.into(),
            descriptor,
            fallback_score: descriptor.difficulty.fallback_score(fallback),
            settled: false,
        }
    }

    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn encounter_id(&self) -> &str {
        &self.encounter_id
    }

    #[must_use]
    pub const fn descriptor(&self) -> MinigameDescriptor {
        self.descriptor
    }

    #[must_use]
    pub const fn is_settled(&self) -> bool {
        self.settled
    }

    /// Settle the session with the first signal received.
    ///
    /// Returns `None` for every signal after the first.
    pub fn settle(&mut self, signal: MinigameSignal) -> Option<SettledMinigame> {
        if self.settled {
            warn!(
                "minigame session {} for '{}' already settled; ignoring {signal:?}",
                self.id, self.encounter_id
            );
            return None;
        }
        self.settled = true;
        let (result, via_fallback) = match signal {
            MinigameSignal::Completed(result) => (result, false),
            MinigameSignal::Fallback => (
                MinigameResult {
                    success: true,
                    score: self.fallback_score,
                },
                true,
            ),
        };
        let delta = minigame_delta(self.descriptor.kind, result);
        debug!(
            "minigame {} ({}) settled for '{}': success={} score={} fallback={via_fallback}",
            self.id, self.descriptor.kind, self.encounter_id, result.success, result.score
        );
        Some(SettledMinigame {
            result,
            delta,
            via_fallback,
        })
    }
}
