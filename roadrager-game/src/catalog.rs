//! Indexed, validated view over authored content.
use std::collections::{HashMap, HashSet};

use log::warn;
use thiserror::Error;

use crate::data::{Character, CharacterIntro, Encounter, EncounterData, EncounterOption, Faction};
use crate::locations::Location;

/// Structural problems that make a catalog unusable.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("encounter id '{0}' is declared more than once")]
    DuplicateEncounter(String),
    #[error("option id '{id}' is declared by both '{first}' and '{second}'")]
    DuplicateOption {
        id: String,
        first: String,
        second: String,
    },
    #[error("character id '{0}' is declared more than once")]
    DuplicateCharacter(String),
    #[error("location id '{0}' is declared more than once")]
    DuplicateLocation(String),
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Authoring problems that play can survive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogDiagnostic {
    #[error("option '{option}' continues to missing encounter '{target}'")]
    DanglingNextEncounter { option: String, target: String },
    #[error("encounter '{encounter}' requires unknown option '{option}'")]
    UnknownRequiredChoice { encounter: String, option: String },
    #[error("option '{option}' changes trust of undefined character '{character}'")]
    UnknownTrustTarget { option: String, character: String },
    #[error("encounter '{encounter}' is placed at undeclared location '{location}'")]
    UnknownLocation { encounter: String, location: String },
    #[error("encounter '{encounter}' auto-progresses but has no minigame")]
    AutoProgressWithoutMinigame { encounter: String },
    #[error("location '{location}' availability refers to unknown id '{reference}'")]
    UnknownAvailabilityReference { location: String, reference: String },
}

/// Position of an option inside the encounter arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OptionRef {
    encounter: usize,
    option: usize,
}

/// Content arena with id indices built once at load.
#[derive(Debug, Clone)]
pub struct Catalog {
    data: EncounterData,
    encounter_index: HashMap<String, usize>,
    option_index: HashMap<String, OptionRef>,
    character_index: HashMap<String, usize>,
    location_index: HashMap<String, usize>,
}

impl Catalog {
    /// Index the given content.
    ///
    /// # Errors
    ///
    /// Returns an error if an encounter, option, character or location id is
    /// declared more than once.
    pub fn new(data: EncounterData) -> Result<Self, CatalogError> {
        let mut encounter_index = HashMap::with_capacity(data.encounters.len());
        let mut option_index = HashMap::new();
        for (e_idx, encounter) in data.encounters.iter().enumerate() {
            if encounter_index.insert(encounter.id.clone(), e_idx).is_some() {
                return Err(CatalogError::DuplicateEncounter(encounter.id.clone()));
            }
            for (o_idx, option) in encounter.options.iter().enumerate() {
                let slot = OptionRef {
                    encounter: e_idx,
                    option: o_idx,
                };
                if let Some(previous) = option_index.insert(option.id.clone(), slot) {
                    return Err(CatalogError::DuplicateOption {
                        id: option.id.clone(),
                        first: data.encounters[previous.encounter].id.clone(),
                        second: encounter.id.clone(),
                    });
                }
            }
        }

        let mut character_index = HashMap::with_capacity(data.characters.len());
        for (idx, character) in data.characters.iter().enumerate() {
            if character_index.insert(character.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateCharacter(character.id.clone()));
            }
        }

        let mut location_index = HashMap::with_capacity(data.locations.len());
        for (idx, location) in data.locations.iter().enumerate() {
            if location_index.insert(location.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateLocation(location.id.clone()));
            }
        }

        let catalog = Self {
            data,
            encounter_index,
            option_index,
            character_index,
            location_index,
        };
        for diagnostic in catalog.diagnostics() {
            warn!("catalog: {diagnostic}");
        }
        Ok(catalog)
    }

    /// Parse and index a catalog document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or ids collide.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Self::new(EncounterData::from_json(json)?)
    }

    /// The catalog shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded content is malformed.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::new(EncounterData::bundled()?)
    }

    #[must_use]
    pub const fn data(&self) -> &EncounterData {
        &self.data
    }

    /// Encounters in declaration order.
    #[must_use]
    pub fn encounters(&self) -> &[Encounter] {
        &self.data.encounters
    }

    #[must_use]
    pub fn encounter(&self, id: &str) -> Option<&Encounter> {
        self.encounter_index
            .get(id)
            .map(|&idx| &self.data.encounters[idx])
    }

    #[must_use]
    pub fn option(&self, id: &str) -> Option<&EncounterOption> {
        self.option_index.get(id).map(|slot| {
            &self.data.encounters[slot.encounter].options[slot.option]
        })
    }

    /// Encounter that declares the given option.
    #[must_use]
    pub fn option_owner(&self, id: &str) -> Option<&Encounter> {
        self.option_index
            .get(id)
            .map(|slot| &self.data.encounters[slot.encounter])
    }

    #[must_use]
    pub fn character(&self, id: &str) -> Option<&Character> {
        self.character_index
            .get(id)
            .map(|&idx| &self.data.characters[idx])
    }

    #[must_use]
    pub fn locations(&self) -> &[Location] {
        &self.data.locations
    }

    #[must_use]
    pub fn location(&self, id: &str) -> Option<&Location> {
        self.location_index
            .get(id)
            .map(|&idx| &self.data.locations[idx])
    }

    /// Build the character an outcome introduces.
    ///
    /// Payload fields win; missing ones come from the catalog default with the
    /// same id, then from neutral fallbacks.
    #[must_use]
    pub fn materialize_character(&self, intro: &CharacterIntro, location: &str) -> Character {
        let default = self.character(&intro.id);
        Character {
            id: intro.id.clone(),
            name: intro
                .name
                .clone()
                .or_else(|| default.map(|c| c.name.clone()))
                .unwrap_or_else(|| intro.id.clone()),
            faction: intro
                .faction
                .or_else(|| default.map(|c| c.faction))
                .unwrap_or(Faction::None),
            trust_level: intro
                .trust_level
                .or_else(|| default.map(|c| c.trust_level))
                .unwrap_or_default(),
            is_trustworthy: intro
                .is_trustworthy
                .or_else(|| default.map(|c| c.is_trustworthy))
                .unwrap_or_default(),
            description: intro
                .description
                .clone()
                .or_else(|| default.map(|c| c.description.clone()))
                .unwrap_or_default(),
            met_at: intro
                .met_at
                .clone()
                .or_else(|| Some(location.to_string())),
            background: default.and_then(|c| c.background.clone()),
        }
    }

    /// Non-fatal authoring findings, in declaration order.
    #[must_use]
    pub fn diagnostics(&self) -> Vec<CatalogDiagnostic> {
        let mut findings = Vec::new();
        let introduced: HashSet<&str> = self
            .data
            .encounters
            .iter()
            .flat_map(|e| e.options.iter())
            .filter_map(|o| o.outcome.add_character.as_ref().map(|c| c.id.as_str()))
            .chain(self.data.characters.iter().map(|c| c.id.as_str()))
            .collect();
        let has_location_table = !self.data.locations.is_empty();

        for encounter in &self.data.encounters {
            if has_location_table && self.location(&encounter.location).is_none() {
                findings.push(CatalogDiagnostic::UnknownLocation {
                    encounter: encounter.id.clone(),
                    location: encounter.location.clone(),
                });
            }
            if encounter.auto_progress_after_minigame && encounter.minigame.is_none() {
                findings.push(CatalogDiagnostic::AutoProgressWithoutMinigame {
                    encounter: encounter.id.clone(),
                });
            }
            if let Some(required) = &encounter.required_choice
                && self.option(&required.choice_id).is_none()
            {
                findings.push(CatalogDiagnostic::UnknownRequiredChoice {
                    encounter: encounter.id.clone(),
                    option: required.choice_id.clone(),
                });
            }
            for option in &encounter.options {
                if let Some(target) = &option.outcome.next_encounter_id
                    && self.encounter(target).is_none()
                {
                    findings.push(CatalogDiagnostic::DanglingNextEncounter {
                        option: option.id.clone(),
                        target: target.clone(),
                    });
                }
                for effect in &option.trust_effect {
                    if !introduced.contains(effect.character_id.as_str()) {
                        findings.push(CatalogDiagnostic::UnknownTrustTarget {
                            option: option.id.clone(),
                            character: effect.character_id.clone(),
                        });
                    }
                }
            }
        }

        for location in &self.data.locations {
            let mut encounters = Vec::new();
            let mut options = Vec::new();
            location.availability.references(&mut encounters, &mut options);
            let unknown = encounters
                .into_iter()
                .filter(|id| self.encounter(id).is_none())
                .chain(options.into_iter().filter(|id| self.option(id).is_none()));
            for reference in unknown {
                findings.push(CatalogDiagnostic::UnknownAvailabilityReference {
                    location: location.id.clone(),
                    reference,
                });
            }
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"{
        "characters": [
            { "id": "mike", "name": "Mike", "faction": "neocorp", "trustLevel": 10,
              "description": "Mechanic", "background": "Unknown past" }
        ],
        "locations": [ { "id": "downtown", "name": "Downtown" } ],
        "encounters": [
            {
                "id": "a", "title": "A", "description": "", "location": "downtown",
                "options": [
                    { "id": "a-1", "text": "go", "outcomes": { "text": "", "nextEncounterId": "missing" } },
                    { "id": "a-2", "text": "hug",
                      "trustEffect": [{ "characterId": "nobody", "amount": 5 }],
                      "outcomes": { "text": "" } }
                ]
            },
            {
                "id": "b", "title": "B", "description": "", "location": "nowhere",
                "autoProgressAfterMinigame": true,
                "requiredChoice": { "choiceId": "zzz", "value": "zzz" },
                "options": [ { "id": "b-1", "text": "ok", "outcomes": { "text": "" } } ]
            }
        ]
    }"#;

    #[test]
    fn bundled_catalog_is_clean() {
        let catalog = Catalog::bundled().unwrap();
        assert_eq!(catalog.diagnostics(), Vec::new());
        assert_eq!(catalog.encounters()[0].id, "intro");
    }

    #[test]
    fn lookups_resolve_through_indices() {
        let catalog = Catalog::bundled().unwrap();
        assert_eq!(catalog.option_owner("take-supplies").unwrap().id, "find-alternate-route");
        let offer = catalog.option("offer-mike-ride").unwrap();
        assert_eq!(
            offer.outcome.next_encounter_id.as_deref(),
            Some("mike-conversation")
        );
        assert_eq!(catalog.encounter("roadblock").unwrap().location, "city-edge");
        assert_eq!(catalog.character("dr-chen").unwrap().name, "Dr. Sarah Chen");
        assert_eq!(catalog.location("outskirts").unwrap().name, "Outskirts");
        assert!(catalog.option("offer-ride-twice").is_none());
    }

    #[test]
    fn duplicate_option_ids_are_rejected() {
        let json = r#"{ "encounters": [
            { "id": "a", "title": "", "description": "", "location": "x",
              "options": [ { "id": "same", "text": "", "outcomes": { "text": "" } } ] },
            { "id": "b", "title": "", "description": "", "location": "x",
              "options": [ { "id": "same", "text": "", "outcomes": { "text": "" } } ] }
        ] }"#;
        match Catalog::from_json(json) {
            Err(CatalogError::DuplicateOption { id, first, second }) => {
                assert_eq!(id, "same");
                assert_eq!(first, "a");
                assert_eq!(second, "b");
            }
            other => panic!("expected duplicate option error, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_encounters_and_bad_json_are_rejected() {
        let json = r#"{ "encounters": [
            { "id": "a", "title": "", "description": "", "location": "x", "options": [] },
            { "id": "a", "title": "", "description": "", "location": "x", "options": [] }
        ] }"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(CatalogError::DuplicateEncounter(id)) if id == "a"
        ));
        assert!(matches!(Catalog::from_json("{"), Err(CatalogError::Parse(_))));
    }

    #[test]
    fn diagnostics_report_authoring_errors() {
        let catalog = Catalog::from_json(SMALL).unwrap();
        let findings = catalog.diagnostics();
        assert!(findings.contains(&CatalogDiagnostic::DanglingNextEncounter {
            option: "a-1".into(),
            target: "missing".into(),
        }));
        assert!(findings.contains(&CatalogDiagnostic::UnknownTrustTarget {
            option: "a-2".into(),
            character: "nobody".into(),
        }));
        assert!(findings.contains(&CatalogDiagnostic::UnknownLocation {
            encounter: "b".into(),
            location: "nowhere".into(),
        }));
        assert!(findings.contains(&CatalogDiagnostic::AutoProgressWithoutMinigame {
            encounter: "b".into(),
        }));
        assert!(findings.contains(&CatalogDiagnostic::UnknownRequiredChoice {
            encounter: "b".into(),
            option: "zzz".into(),
        }));
        assert_eq!(findings.len(), 5);
    }

    #[test]
    fn materialize_prefers_payload_then_catalog_default() {
        let catalog = Catalog::from_json(SMALL).unwrap();
        let intro = CharacterIntro {
            id: "mike".into(),
            name: None,
            faction: Some(Faction::Scavengers),
            trust_level: None,
            is_trustworthy: None,
            description: Some("Friendly".into()),
            met_at: None,
        };
        let character = catalog.materialize_character(&intro, "outskirts");
        assert_eq!(character.name, "Mike");
        assert_eq!(character.faction, Faction::Scavengers);
        assert_eq!(character.trust_level, 10);
        assert_eq!(character.description, "Friendly");
        assert_eq!(character.met_at.as_deref(), Some("outskirts"));
        assert_eq!(character.background.as_deref(), Some("Unknown past"));

        let stranger = CharacterIntro {
            id: "stranger".into(),
            ..intro
        };
        let character = catalog.materialize_character(&stranger, "downtown");
        assert_eq!(character.name, "stranger");
        assert_eq!(character.trust_level, 0);
    }
}
