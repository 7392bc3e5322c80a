//! Endings, result summaries, and presentation hints derived from world state.
use serde::{Deserialize, Serialize};

use crate::constants::{
    TRUST_FRIENDLY_BELOW, TRUST_HOSTILE_BELOW, TRUST_NEUTRAL_BELOW, TRUST_WARY_BELOW,
    WARN_CAR_HEALTH_THRESHOLD, WARN_FOOD_THRESHOLD, WARN_FUEL_THRESHOLD,
};
use crate::state::WorldState;

/// Terminal state of a run. Serialised as the plain ending id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Ending {
    /// Food ran out on the road
    Starvation,
    /// Fuel ran out while travelling
    Stranded,
    /// The car gave out
    Breakdown,
    /// Authored ending named by an outcome
    Narrative(String),
}

impl Ending {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Starvation => "starvation",
            Self::Stranded => "stranded",
            Self::Breakdown => "breakdown",
            Self::Narrative(id) => id,
        }
    }

    #[must_use]
    pub const fn is_survival_failure(&self) -> bool {
        !matches!(self, Self::Narrative(_))
    }

    #[must_use]
    pub fn title(&self) -> String {
        let known = match self.id() {
            "lone-wolf" => "Lone Wolf",
            "new-beginning" => "New Beginning",
            "resistance" => "The Resistance",
            "truth" => "The Truth",
            "fall" => "The Fall",
            other => return title_case(other),
        };
        known.to_string()
    }

    #[must_use]
    pub fn epilogue(&self) -> &'static str {
        match self.id() {
            "lone-wolf" => {
                "You managed to escape the city alone, trusting no one along the way. The road ahead is uncertain, but at least you're still alive and free. Behind you, Meridian City burns, its secrets intact."
            }
            "new-beginning" => {
                "You escaped with a small group of people you chose to trust. Together, you've formed a tight-knit community of survivors, looking out for each other in this new world. Your shared experiences in Meridian have created an unbreakable bond."
            }
            "resistance" => {
                "Instead of escaping, you joined the resistance against NeoCorp. Your knowledge and allies have made you a key figure in the fight to reclaim the city and expose the truth. The battle will be long, but you're no longer running."
            }
            "truth" => {
                "You discovered the full extent of NeoCorp's experiments and managed to escape with proof. The world now knows what happened in Meridian City, and the conspiracy has been exposed. Your name will go down in history as the whistleblower who revealed the truth."
            }
            "fall" => {
                "The paranoia was too much. In the end, you couldn't tell friend from foe, and your suspicion led to your downfall. You're still alive, but trapped within the quarantine zone, forever changed by what happened in Meridian City."
            }
            "starvation" => {
                "Your supplies ran out. Weak from hunger, you couldn't continue your journey. The struggle to survive in Meridian City proved too difficult without adequate resources. Remember: in a crisis, managing your supplies is just as important as choosing your allies."
            }
            "stranded" => {
                "Your vehicle ran out of fuel in the middle of nowhere. With no way to continue and miles from any safe location, you're stranded in dangerous territory. The distant sounds of approaching vehicles signal that your journey has come to an end."
            }
            "breakdown" => {
                "Your car finally gave out. The damage it sustained was too much, and now you're forced to continue on foot. In this dangerous landscape, being without transportation is a death sentence. You should have taken better care of your only means of escape."
            }
            _ => "Your journey has come to an end.",
        }
    }
}

fn title_case(id: &str) -> String {
    id.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl From<String> for Ending {
    fn from(id: String) -> Self {
        match id.as_str() {
            "starvation" => Self::Starvation,
            "stranded" => Self::Stranded,
            "breakdown" => Self::Breakdown,
            _ => Self::Narrative(id),
        }
    }
}

impl From<&str> for Ending {
    fn from(id: &str) -> Self {
        Self::from(id.to_string())
    }
}

impl From<Ending> for String {
    fn from(ending: Ending) -> Self {
        match ending {
            Ending::Narrative(id) => id,
            other => other.id().to_string(),
        }
    }
}

impl std::fmt::Display for Ending {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Result-screen summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndingSummary {
    pub ending: Ending,
    pub title: String,
    pub epilogue: String,
    pub day: u32,
    pub encounters_completed: usize,
    pub allies: usize,
    pub trusted_allies: usize,
}

/// Build the summary for a finished run, or `None` while play continues.
#[must_use]
pub fn ending_summary(state: &WorldState) -> Option<EndingSummary> {
    let ending = state.ending.clone()?;
    let trusted_allies = state
        .characters
        .iter()
        .filter(|c| TrustTier::from_level(c.trust_level) >= TrustTier::Friendly)
        .count();
    Some(EndingSummary {
        title: ending.title(),
        epilogue: ending.epilogue().to_string(),
        ending,
        day: state.day,
        encounters_completed: state.encounters_completed.len(),
        allies: state.characters.len(),
        trusted_allies,
    })
}

/// Presentation band for a trust level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustTier {
    Hostile,
    Wary,
    Neutral,
    Friendly,
    Trusted,
}

impl TrustTier {
    #[must_use]
    pub const fn from_level(level: i32) -> Self {
        if level < TRUST_HOSTILE_BELOW {
            Self::Hostile
        } else if level < TRUST_WARY_BELOW {
            Self::Wary
        } else if level < TRUST_NEUTRAL_BELOW {
            Self::Neutral
        } else if level < TRUST_FRIENDLY_BELOW {
            Self::Friendly
        } else {
            Self::Trusted
        }
    }
}

/// Most urgent resource warning for the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceWarning {
    LowFood,
    LowFuel,
    CarDamaged,
}

impl ResourceWarning {
    #[must_use]
    pub const fn check(state: &WorldState) -> Option<Self> {
        if state.resources.food <= WARN_FOOD_THRESHOLD {
            Some(Self::LowFood)
        } else if state.resources.fuel <= WARN_FUEL_THRESHOLD {
            Some(Self::LowFuel)
        } else if state.car_health <= WARN_CAR_HEALTH_THRESHOLD {
            Some(Self::CarDamaged)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::LowFood => "Critically low food. Find supplies soon.",
            Self::LowFuel => "Critically low fuel. Find a gas station.",
            Self::CarDamaged => "Car severely damaged. Repairs needed.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Character, Faction};

    #[test]
    fn endings_round_trip_as_plain_ids() {
        let json = serde_json::to_string(&Ending::Starvation).unwrap();
        assert_eq!(json, "\"starvation\"");
        let parsed: Ending = serde_json::from_str("\"lone-wolf\"").unwrap();
        assert_eq!(parsed, Ending::Narrative("lone-wolf".into()));
        let parsed: Ending = serde_json::from_str("\"breakdown\"").unwrap();
        assert_eq!(parsed, Ending::Breakdown);
        assert!(parsed.is_survival_failure());
    }

    #[test]
    fn unknown_endings_get_title_cased_ids() {
        let ending = Ending::from("quiet-exit");
        assert_eq!(ending.title(), "Quiet Exit");
        assert_eq!(ending.epilogue(), "Your journey has come to an end.");
        assert_eq!(Ending::from("truth").title(), "The Truth");
        assert_eq!(Ending::Stranded.title(), "Stranded");
    }

    #[test]
    fn trust_tiers_use_band_edges() {
        assert_eq!(TrustTier::from_level(-51), TrustTier::Hostile);
        assert_eq!(TrustTier::from_level(-50), TrustTier::Wary);
        assert_eq!(TrustTier::from_level(0), TrustTier::Neutral);
        assert_eq!(TrustTier::from_level(25), TrustTier::Friendly);
        assert_eq!(TrustTier::from_level(75), TrustTier::Trusted);
    }

    #[test]
    fn warnings_prefer_food_then_fuel_then_car() {
        let mut state = WorldState::default();
        assert_eq!(ResourceWarning::check(&state), None);
        state.car_health = 20;
        assert_eq!(ResourceWarning::check(&state), Some(ResourceWarning::CarDamaged));
        state.resources.fuel = 10;
        assert_eq!(ResourceWarning::check(&state), Some(ResourceWarning::LowFuel));
        state.resources.food = 5;
        assert_eq!(ResourceWarning::check(&state), Some(ResourceWarning::LowFood));
    }

    #[test]
    fn summary_counts_trusted_allies() {
        let mut state = WorldState::default();
        assert!(ending_summary(&state).is_none());
        for (id, trust) in [("a", 80), ("b", 30), ("c", -10)] {
            state.add_character(Character {
                id: id.into(),
                name: id.into(),
                faction: Faction::Guardians,
                trust_level: trust,
                is_trustworthy: true,
                description: String::new(),
                met_at: None,
                background: None,
            });
        }
        state.complete_encounter("intro");
        state.trigger_ending(Ending::from("new-beginning"));
        let summary = ending_summary(&state).unwrap();
        assert_eq!(summary.title, "New Beginning");
        assert_eq!(summary.allies, 3);
        assert_eq!(summary.trusted_allies, 2);
        assert_eq!(summary.encounters_completed, 1);
        assert_eq!(summary.day, 1);
    }
}
