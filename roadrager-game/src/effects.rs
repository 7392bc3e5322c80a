//! Effect resolution for chosen options.
use log::{debug, warn};

use crate::catalog::Catalog;
use crate::data::{Encounter, EncounterOption, ResourceDelta};
use crate::error::EngineError;
use crate::result::Ending;
use crate::state::WorldState;

/// Resource and car-health change folded into world state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateDelta {
    pub resources: ResourceDelta,
    pub car_health: i32,
}

impl StateDelta {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.car_health == 0
    }
}

/// Merge a delta: resources add, car health clamps.
pub fn apply_delta(state: &mut WorldState, delta: StateDelta) {
    state.apply_resources(delta.resources);
    state.adjust_car_health(delta.car_health);
    state.normalize();
}

/// What applying an option changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOutcome {
    pub encounter_id: String,
    pub option_id: String,
    pub text: String,
    pub next_encounter_id: Option<String>,
    pub character_added: Option<String>,
    pub ending: Option<Ending>,
}

pub(crate) fn ensure_running(state: &WorldState) -> Result<(), EngineError> {
    if state.game_over {
        return Err(EngineError::GameOver {
            ending: state
                .ending
                .clone()
                .unwrap_or_else(|| Ending::from("unknown")),
        });
    }
    Ok(())
}

/// Apply a chosen option to the world state.
///
/// Steps run in a fixed order: record the choice, resources, car health,
/// trust, new character, ending, then mark the encounter completed. Authoring
/// mistakes inside the option degrade to no-ops.
///
/// # Errors
///
/// Returns [`EngineError::GameOver`] without touching the state when the game
/// has already ended.
pub fn apply_option(
    state: &mut WorldState,
    catalog: &Catalog,
    encounter: &Encounter,
    option: &EncounterOption,
) -> Result<ChoiceOutcome, EngineError> {
    ensure_running(state)?;

    state.record_choice(&option.id);
    apply_delta(
        state,
        StateDelta {
            resources: option.resource_effect,
            car_health: option.car_health_effect.unwrap_or_default(),
        },
    );
    for effect in &option.trust_effect {
        state.adjust_trust(&effect.character_id, effect.amount);
    }

    let outcome = &option.outcome;
    let character_added = outcome.add_character.as_ref().and_then(|intro| {
        let character = catalog.materialize_character(intro, &encounter.location);
        state
            .add_character(character)
            .then(|| intro.id.clone())
    });

    let ending = match (outcome.game_over, outcome.ending_type.as_deref()) {
        (true, Some(id)) => {
            let ending = Ending::from(id);
            state.trigger_ending(ending.clone());
            Some(ending)
        }
        (true, None) => {
            warn!("option '{}' ends the game without an ending id; ignored", option.id);
            None
        }
        (false, _) => None,
    };

    state.complete_encounter(&encounter.id);
    state.normalize();
    debug!(
        "option '{}' applied for '{}' (day {}, game over: {})",
        option.id, encounter.id, state.day, state.game_over
    );

    Ok(ChoiceOutcome {
        encounter_id: encounter.id.clone(),
        option_id: option.id.clone(),
        text: outcome.text.clone(),
        next_encounter_id: outcome.next_encounter_id.clone(),
        character_added,
        ending,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundled() -> Catalog {
        Catalog::bundled().unwrap()
    }

    fn apply(state: &mut WorldState, catalog: &Catalog, option_id: &str) -> ChoiceOutcome {
        let encounter = catalog.option_owner(option_id).unwrap();
        let option = catalog.option(option_id).unwrap();
        apply_option(state, catalog, encounter, option).unwrap()
    }

    #[test]
    fn intro_option_merges_resources() {
        let catalog = bundled();
        let mut state = WorldState::default();
        let outcome = apply(&mut state, &catalog, "pack-and-leave");
        assert_eq!(state.resources.food, 90);
        assert_eq!(state.resources.medicine, 40);
        assert_eq!(state.resources.fuel, 50);
        assert_eq!(state.resources.parts, 20);
        assert!(state.is_completed("intro"));
        assert_eq!(state.player_choices.get("pack-and-leave"), Some("pack-and-leave"));
        assert_eq!(outcome.next_encounter_id.as_deref(), Some("roadblock"));
        assert!(outcome.ending.is_none());
    }

    #[test]
    fn add_character_uses_payload_and_is_idempotent() {
        let catalog = bundled();
        let mut state = WorldState::default();
        let outcome = apply(&mut state, &catalog, "offer-mike-ride");
        assert_eq!(outcome.character_added.as_deref(), Some("mike"));
        let mike = state.character("mike").unwrap();
        assert_eq!(mike.trust_level, 10);
        assert_eq!(mike.faction, crate::data::Faction::Scavengers);

        state.encounters_completed.clear();
        let again = apply(&mut state, &catalog, "offer-mike-ride");
        assert!(again.character_added.is_none());
        assert_eq!(state.characters.len(), 1);
    }

    #[test]
    fn trust_effects_clamp_and_skip_unmet_characters() {
        let catalog = bundled();
        let mut state = WorldState::default();
        apply(&mut state, &catalog, "accuse-marcus");
        assert!(state.characters.is_empty());

        let mut state = WorldState::default();
        apply(&mut state, &catalog, "offer-help");
        state.adjust_trust("marcus", -80);
        let encounter = catalog.encounter("marcus-lab").unwrap();
        let option = encounter.option("accuse-marcus").unwrap();
        apply_option(&mut state, &catalog, encounter, option).unwrap();
        assert_eq!(state.character("marcus").unwrap().trust_level, -100);
    }

    #[test]
    fn car_health_effect_is_clamped() {
        let catalog = bundled();
        let mut state = WorldState {
            car_health: 5,
            ..WorldState::default()
        };
        apply(&mut state, &catalog, "push-through");
        assert_eq!(state.car_health, 0);
    }

    #[test]
    fn deltas_without_car_change_still_clamp() {
        let mut state = WorldState {
            car_health: 140,
            ..WorldState::default()
        };
        apply_delta(
            &mut state,
            StateDelta {
                resources: ResourceDelta {
                    food: 5,
                    ..ResourceDelta::default()
                },
                car_health: 0,
            },
        );
        assert_eq!(state.car_health, 100);

        state.car_health = -20;
        apply(&mut state, &bundled(), "pack-and-leave");
        assert_eq!(state.car_health, 0);
    }

    #[test]
    fn narrative_ending_sets_game_over() {
        let catalog = bundled();
        let mut state = WorldState::default();
        let outcome = apply(&mut state, &catalog, "copy-files");
        assert_eq!(outcome.ending, Some(Ending::Narrative("truth".into())));
        assert!(state.game_over);
        assert!(state.is_completed("marcus-lab"));
    }

    #[test]
    fn game_over_blocks_further_application() {
        let catalog = bundled();
        let mut state = WorldState::default();
        state.trigger_ending(Ending::Starvation);
        let before = state.clone();
        let encounter = catalog.encounter("intro").unwrap();
        let option = encounter.option("pack-and-leave").unwrap();
        let err = apply_option(&mut state, &catalog, encounter, option).unwrap_err();
        assert_eq!(
            err,
            EngineError::GameOver {
                ending: Ending::Starvation
            }
        );
        assert_eq!(state, before);
    }
}
