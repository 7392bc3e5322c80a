//! World state: the single mutable record of progress.
use std::fmt;

use log::warn;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::EngineConfig;
use crate::constants::{CAR_HEALTH_MAX, CAR_HEALTH_MIN, START_DAY, TRUST_MAX, TRUST_MIN};
use crate::data::{Character, ResourceDelta};
use crate::result::Ending;

/// The four consumable counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Resources {
    #[serde(default)]
    pub fuel: i32,
    #[serde(default)]
    pub food: i32,
    #[serde(default)]
    pub medicine: i32,
    #[serde(default)]
    pub parts: i32,
}

impl Resources {
    /// Merge a delta; untouched counters keep their values.
    pub const fn apply(&mut self, delta: ResourceDelta) {
        self.fuel = self.fuel.saturating_add(delta.fuel);
        self.food = self.food.saturating_add(delta.food);
        self.medicine = self.medicine.saturating_add(delta.medicine);
        self.parts = self.parts.saturating_add(delta.parts);
    }
}

/// Recorded choices keyed by option id, kept in insertion order.
///
/// Serialises as a JSON object whose key order is the insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChoiceLog {
    entries: Vec<(String, String)>,
}

impl ChoiceLog {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record a choice. Re-recording a key overwrites the value in place.
    pub fn record(&mut self, choice_id: impl Into<String>, value: impl Into<String>) {
        let choice_id = choice_id.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(key, _)| *key == choice_id) {
            entry.1 = value;
        } else {
            self.entries.push((choice_id, value));
        }
    }

    #[must_use]
    pub fn get(&self, choice_id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == choice_id)
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn contains(&self, choice_id: &str) -> bool {
        self.get(choice_id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ChoiceLog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct ChoiceLogVisitor;

impl<'de> Visitor<'de> for ChoiceLogVisitor {
    type Value = ChoiceLog;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map of choice ids to option ids")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut log = ChoiceLog::new();
        while let Some((key, value)) = access.next_entry::<String, String>()? {
            log.record(key, value);
        }
        Ok(log)
    }
}

impl<'de> Deserialize<'de> for ChoiceLog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ChoiceLogVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldState {
    pub day: u32,
    pub location: String,
    pub resources: Resources,
    pub car_health: i32,
    #[serde(default)]
    pub characters: Vec<Character>,
    #[serde(default)]
    pub encounters_completed: Vec<String>,
    #[serde(default)]
    pub player_choices: ChoiceLog,
    #[serde(default)]
    pub game_over: bool,
    #[serde(default, rename = "endingType")]
    pub ending: Option<Ending>,
}

impl Default for WorldState {
    fn default() -> Self {
        Self::initial(&EngineConfig::default())
    }
}

impl WorldState {
    /// Fixed opening snapshot for the given configuration.
    #[must_use]
    pub fn initial(config: &EngineConfig) -> Self {
        Self {
            day: START_DAY,
            location: config.start_location.clone(),
            resources: config.starting_resources,
            car_health: config.starting_car_health,
            characters: Vec::new(),
            encounters_completed: Vec::new(),
            player_choices: ChoiceLog::new(),
            game_over: false,
            ending: None,
        }
    }

    #[must_use]
    pub fn is_completed(&self, encounter_id: &str) -> bool {
        self.encounters_completed.iter().any(|id| id == encounter_id)
    }

    #[must_use]
    pub fn character(&self, character_id: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == character_id)
    }

    #[must_use]
    pub fn has_met(&self, character_id: &str) -> bool {
        self.character(character_id).is_some()
    }

    pub fn record_choice(&mut self, option_id: &str) {
        self.player_choices.record(option_id, option_id);
    }

    pub const fn apply_resources(&mut self, delta: ResourceDelta) {
        self.resources.apply(delta);
    }

    pub fn adjust_car_health(&mut self, delta: i32) {
        self.car_health = self
            .car_health
            .saturating_add(delta)
            .clamp(CAR_HEALTH_MIN, CAR_HEALTH_MAX);
    }

    /// Shift a met character's trust, clamped. Unmet characters are left alone.
    ///
    /// Returns whether a character was updated.
    pub fn adjust_trust(&mut self, character_id: &str, delta: i32) -> bool {
        let Some(character) = self.characters.iter_mut().find(|c| c.id == character_id) else {
            warn!("trust change for unmet character '{character_id}' ignored");
            return false;
        };
        character.trust_level = character
            .trust_level
            .saturating_add(delta)
            .clamp(TRUST_MIN, TRUST_MAX);
        true
    }

    /// Add a character unless one with the same id is already present.
    pub fn add_character(&mut self, mut character: Character) -> bool {
        if self.has_met(&character.id) {
            return false;
        }
        character.trust_level = character.trust_level.clamp(TRUST_MIN, TRUST_MAX);
        self.characters.push(character);
        true
    }

    pub fn complete_encounter(&mut self, encounter_id: &str) -> bool {
        if self.is_completed(encounter_id) {
            return false;
        }
        self.encounters_completed.push(encounter_id.to_string());
        true
    }

    /// Pull car health and every character's trust back into bounds.
    ///
    /// Returns whether anything had to be clamped.
    pub fn normalize(&mut self) -> bool {
        let car_health = self.car_health.clamp(CAR_HEALTH_MIN, CAR_HEALTH_MAX);
        let mut changed = car_health != self.car_health;
        self.car_health = car_health;
        for character in &mut self.characters {
            let trust = character.trust_level.clamp(TRUST_MIN, TRUST_MAX);
            if trust != character.trust_level {
                warn!(
                    "trust for '{}' out of range ({}); clamped to {trust}",
                    character.id, character.trust_level
                );
                character.trust_level = trust;
                changed = true;
            }
        }
        changed
    }

    /// Mark the game over. An ending, once set, is never replaced.
    pub fn trigger_ending(&mut self, ending: Ending) {
        if self.game_over {
            return;
        }
        self.game_over = true;
        self.ending = Some(ending);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Faction;

    fn character(id: &str, trust: i32) -> Character {
        Character {
            id: id.into(),
            name: id.to_uppercase(),
            faction: Faction::None,
            trust_level: trust,
            is_trustworthy: true,
            description: String::new(),
            met_at: None,
            background: None,
        }
    }

    #[test]
    fn initial_snapshot_matches_config() {
        let state = WorldState::default();
        assert_eq!(state.day, 1);
        assert_eq!(state.location, "apartment");
        assert_eq!(state.resources.food, 70);
        assert_eq!(state.resources.fuel, 50);
        assert_eq!(state.resources.medicine, 30);
        assert_eq!(state.resources.parts, 20);
        assert_eq!(state.car_health, 80);
        assert!(state.characters.is_empty());
        assert!(state.player_choices.is_empty());
        assert!(!state.game_over);
        assert!(state.ending.is_none());
    }

    #[test]
    fn car_health_and_trust_are_clamped() {
        let mut state = WorldState::default();
        state.adjust_car_health(500);
        assert_eq!(state.car_health, 100);
        state.adjust_car_health(-500);
        assert_eq!(state.car_health, 0);

        state.add_character(character("mike", 90));
        assert!(state.adjust_trust("mike", 40));
        assert_eq!(state.character("mike").unwrap().trust_level, 100);
        state.adjust_trust("mike", -250);
        assert_eq!(state.character("mike").unwrap().trust_level, -100);
    }

    #[test]
    fn normalize_clamps_out_of_range_values() {
        let mut state = WorldState {
            car_health: 150,
            ..WorldState::default()
        };
        state.characters.push(character("mike", 300));
        state.characters.push(character("sarah", -400));
        assert!(state.normalize());
        assert_eq!(state.car_health, 100);
        assert_eq!(state.character("mike").unwrap().trust_level, 100);
        assert_eq!(state.character("sarah").unwrap().trust_level, -100);
        assert!(!state.normalize());
    }

    #[test]
    fn trust_for_unmet_character_is_a_no_op() {
        let mut state = WorldState::default();
        assert!(!state.adjust_trust("ghost", 10));
        assert!(state.characters.is_empty());
    }

    #[test]
    fn adds_and_completions_are_idempotent() {
        let mut state = WorldState::default();
        assert!(state.add_character(character("mike", 10)));
        assert!(!state.add_character(character("mike", 50)));
        assert_eq!(state.characters.len(), 1);
        assert_eq!(state.character("mike").unwrap().trust_level, 10);

        assert!(state.complete_encounter("intro"));
        assert!(!state.complete_encounter("intro"));
        assert_eq!(state.encounters_completed, vec!["intro".to_string()]);
    }

    #[test]
    fn ending_is_never_replaced() {
        let mut state = WorldState::default();
        state.trigger_ending(Ending::Starvation);
        state.trigger_ending(Ending::Breakdown);
        assert!(state.game_over);
        assert_eq!(state.ending, Some(Ending::Starvation));
    }

    #[test]
    fn choice_log_overwrites_in_place() {
        let mut log = ChoiceLog::new();
        log.record("b", "b");
        log.record("a", "a");
        log.record("b", "b2");
        let keys: Vec<_> = log.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(log.get("b"), Some("b2"));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn choice_log_serialises_in_insertion_order() {
        let mut log = ChoiceLog::new();
        log.record("zeta", "zeta");
        log.record("alpha", "alpha");
        let json = serde_json::to_string(&log).unwrap();
        assert_eq!(json, r#"{"zeta":"zeta","alpha":"alpha"}"#);

        let parsed: ChoiceLog = serde_json::from_str(r#"{"m":"m","c":"c","x":"x"}"#).unwrap();
        let keys: Vec<_> = parsed.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["m", "c", "x"]);
    }

    #[test]
    fn world_state_uses_saved_field_names() {
        let mut state = WorldState::default();
        state.record_choice("pack-and-leave");
        state.trigger_ending(Ending::Narrative("truth".into()));
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["carHealth"], 80);
        assert_eq!(value["gameOver"], true);
        assert_eq!(value["endingType"], "truth");
        assert_eq!(value["playerChoices"]["pack-and-leave"], "pack-and-leave");
        assert!(value["encountersCompleted"].is_array());

        let back: WorldState = serde_json::from_value(value).unwrap();
        assert_eq!(back, state);
    }
}
