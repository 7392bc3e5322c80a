//! Location table and availability predicates for the travel map.
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::state::WorldState;

/// Boolean expression over day, completions and recorded choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Availability {
    #[default]
    Always,
    Never,
    /// Holds once the day is strictly greater than `day`.
    AfterDay { day: u32 },
    Completed { encounter: String },
    ChoiceMade { option: String },
    AnyOf { conditions: Vec<Availability> },
    AllOf { conditions: Vec<Availability> },
}

impl Availability {
    #[must_use]
    pub fn holds(&self, state: &WorldState) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::AfterDay { day } => state.day > *day,
            Self::Completed { encounter } => state.is_completed(encounter),
            Self::ChoiceMade { option } => {
                state.player_choices.get(option) == Some(option.as_str())
            }
            Self::AnyOf { conditions } => conditions.iter().any(|c| c.holds(state)),
            Self::AllOf { conditions } => conditions.iter().all(|c| c.holds(state)),
        }
    }

    /// Encounter and option ids the predicate refers to.
    pub(crate) fn references(&self, encounters: &mut Vec<String>, options: &mut Vec<String>) {
        match self {
            Self::Always | Self::Never | Self::AfterDay { .. } => {}
            Self::Completed { encounter } => encounters.push(encounter.clone()),
            Self::ChoiceMade { option } => options.push(option.clone()),
            Self::AnyOf { conditions } | Self::AllOf { conditions } => {
                for condition in conditions {
                    condition.references(encounters, options);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub availability: Availability,
}

/// Entry of the travel map offered to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationChoice {
    pub id: String,
    pub name: String,
    /// Presentation disables travel to the current location.
    pub is_current: bool,
}

/// Locations whose availability predicate holds, in table order.
#[must_use]
pub fn available_locations(catalog: &Catalog, state: &WorldState) -> Vec<LocationChoice> {
    catalog
        .locations()
        .iter()
        .filter(|location| location.availability.holds(state))
        .map(|location| LocationChoice {
            id: location.id.clone(),
            name: location.name.clone(),
            is_current: location.id == state.location,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::EncounterData;

    fn bundled() -> Catalog {
        Catalog::new(EncounterData::bundled().unwrap()).unwrap()
    }

    fn ids(choices: &[LocationChoice]) -> Vec<&str> {
        choices.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn availability_parses_tagged_predicates() {
        let json = r#"{
            "kind": "anyOf",
            "conditions": [
                { "kind": "afterDay", "day": 2 },
                { "kind": "choiceMade", "option": "help-family" }
            ]
        }"#;
        let availability: Availability = serde_json::from_str(json).unwrap();
        let mut state = WorldState::default();
        assert!(!availability.holds(&state));
        state.day = 3;
        assert!(availability.holds(&state));
        state.day = 1;
        state.record_choice("help-family");
        assert!(availability.holds(&state));
    }

    #[test]
    fn all_of_requires_every_condition() {
        let availability = Availability::AllOf {
            conditions: vec![
                Availability::Completed {
                    encounter: "intro".into(),
                },
                Availability::AfterDay { day: 1 },
            ],
        };
        let mut state = WorldState::default();
        state.complete_encounter("intro");
        assert!(!availability.holds(&state));
        state.day = 2;
        assert!(availability.holds(&state));
        assert!(!Availability::Never.holds(&state));
    }

    #[test]
    fn opening_map_offers_downtown_only() {
        let catalog = bundled();
        let state = WorldState::default();
        let choices = available_locations(&catalog, &state);
        assert_eq!(ids(&choices), vec!["downtown"]);
        assert!(!choices[0].is_current);
    }

    #[test]
    fn map_grows_with_progress() {
        let catalog = bundled();
        let mut state = WorldState {
            day: 2,
            location: "city-edge".into(),
            ..WorldState::default()
        };
        state.complete_encounter("roadblock");
        let choices = available_locations(&catalog, &state);
        assert_eq!(ids(&choices), vec!["downtown", "city-edge", "gas-station"]);
        assert!(choices[1].is_current);

        state.record_choice("help-family");
        state.complete_encounter("find-alternate-route");
        let choices = available_locations(&catalog, &state);
        assert!(ids(&choices).contains(&"outskirts"));
        assert!(ids(&choices).contains(&"service-road"));
        assert!(!ids(&choices).contains(&"industrial-district"));
        assert!(!ids(&choices).contains(&"apartment"));
    }
}
