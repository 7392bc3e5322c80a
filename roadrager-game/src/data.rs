use serde::{Deserialize, Serialize};

use crate::constants::BUNDLED_CATALOG;
use crate::locations::Location;
use crate::minigame::MinigameDescriptor;

/// Allegiance a character is aligned with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    Guardians,
    Scavengers,
    Truthers,
    Neocorp,
    #[default]
    None,
}

/// A character the player can meet on the road.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub faction: Faction,
    #[serde(default)]
    pub trust_level: i32,
    /// Hidden from the player; content authoring metadata only.
    #[serde(default)]
    pub is_trustworthy: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub met_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

/// Character payload carried by an outcome.
///
/// Missing fields are completed from the catalog default with the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterIntro {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faction: Option<Faction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_level: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_trustworthy: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub met_at: Option<String>,
}

/// Deltas applied to the four consumable counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResourceDelta {
    #[serde(default)]
    pub fuel: i32,
    #[serde(default)]
    pub food: i32,
    #[serde(default)]
    pub medicine: i32,
    #[serde(default)]
    pub parts: i32,
}

impl ResourceDelta {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fuel == 0 && self.food == 0 && self.medicine == 0 && self.parts == 0
    }
}

/// Trust change applied to one character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustEffect {
    pub character_id: String,
    pub amount: i32,
}

/// Narrative resolution of an option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_encounter_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_character: Option<CharacterIntro>,
    #[serde(default)]
    pub game_over: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ending_type: Option<String>,
    /// Content authoring metadata; the engine does not act on it.
    #[serde(default)]
    pub reveal_deception: bool,
}

/// A player-selectable action within an encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub resource_effect: ResourceDelta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub car_health_effect: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trust_effect: Vec<TrustEffect>,
    #[serde(rename = "outcomes")]
    pub outcome: Outcome,
}

/// Gate on a previously recorded choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredChoice {
    pub choice_id: String,
    pub value: String,
}

/// A narrative beat in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    /// Exact day this encounter is restricted to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Character the encounter is tied to, for presentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_choice: Option<RequiredChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minigame: Option<MinigameDescriptor>,
    #[serde(default)]
    pub auto_progress_after_minigame: bool,
    pub options: Vec<EncounterOption>,
    #[serde(default)]
    pub is_deceptive: bool,
}

impl Encounter {
    #[must_use]
    pub fn option(&self, option_id: &str) -> Option<&EncounterOption> {
        self.options.iter().find(|option| option.id == option_id)
    }

    #[must_use]
    pub const fn has_minigame(&self) -> bool {
        self.minigame.is_some()
    }
}

/// Container for all authored content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EncounterData {
    #[serde(default)]
    pub characters: Vec<Character>,
    pub encounters: Vec<Encounter>,
    #[serde(default)]
    pub locations: Vec<Location>,
}

impl EncounterData {
    /// Load content from a JSON document
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid content.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Create content from pre-parsed encounters
    #[must_use]
    pub fn from_encounters(encounters: Vec<Encounter>) -> Self {
        Self {
            encounters,
            ..Self::default()
        }
    }

    /// Parse the catalog shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded JSON is malformed.
    pub fn bundled() -> Result<Self, serde_json::Error> {
        Self::from_json(BUNDLED_CATALOG)
    }
}
