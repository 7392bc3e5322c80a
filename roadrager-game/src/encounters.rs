//! Encounter selection logic
use log::{debug, warn};

use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::data::Encounter;
use crate::state::{ChoiceLog, WorldState};

pub struct EncounterRequest<'a> {
    pub day: u32,
    pub location: &'a str,
    pub completed: &'a [String],
    pub choices: &'a ChoiceLog,
    pub catalog: &'a Catalog,
    pub start_location: &'a str,
    pub intro_encounter_id: &'a str,
}

impl<'a> EncounterRequest<'a> {
    #[must_use]
    pub fn from_state(
        state: &'a WorldState,
        catalog: &'a Catalog,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            day: state.day,
            location: &state.location,
            completed: &state.encounters_completed,
            choices: &state.player_choices,
            catalog,
            start_location: &config.start_location,
            intro_encounter_id: &config.intro_encounter_id,
        }
    }

    fn is_completed(&self, encounter_id: &str) -> bool {
        self.completed.iter().any(|id| id == encounter_id)
    }
}

/// Which resolution rule produced a pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionRule {
    Bootstrap,
    Continuation,
    OpenContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncounterPick<'a> {
    pub encounter: &'a Encounter,
    pub rule: SelectionRule,
}

fn pick_bootstrap<'a>(request: &EncounterRequest<'a>) -> Option<&'a Encounter> {
    if request.day != 1
        || request.location != request.start_location
        || request.is_completed(request.intro_encounter_id)
    {
        return None;
    }
    let intro = request.catalog.encounter(request.intro_encounter_id);
    if intro.is_none() {
        warn!(
            "intro encounter '{}' missing from catalog",
            request.intro_encounter_id
        );
    }
    intro
}

fn continuation_candidates<'r, 'a: 'r>(
    request: &'r EncounterRequest<'a>,
) -> impl Iterator<Item = &'a Encounter> + 'r {
    let catalog = request.catalog;
    request.choices.iter().filter_map(move |(choice_id, chosen)| {
        let Some(option) = catalog.option(chosen) else {
            warn!("recorded choice '{choice_id}' names unknown option '{chosen}'");
            return None;
        };
        let target = option.outcome.next_encounter_id.as_deref()?;
        let Some(next) = catalog.encounter(target) else {
            warn!("option '{chosen}' continues to missing encounter '{target}'");
            return None;
        };
        (!request.is_completed(&next.id) && next.location == request.location).then_some(next)
    })
}

fn pick_continuation<'a>(request: &EncounterRequest<'a>) -> Option<&'a Encounter> {
    let mut candidates = continuation_candidates(request);
    let first = candidates.next()?;
    let extra: Vec<&str> = candidates
        .map(|e| e.id.as_str())
        .filter(|id| *id != first.id)
        .collect();
    if !extra.is_empty() {
        warn!(
            "several continuations reachable at '{}': '{}' wins over {extra:?}",
            request.location, first.id
        );
    }
    Some(first)
}

fn is_open(request: &EncounterRequest<'_>, encounter: &Encounter) -> bool {
    !request.is_completed(&encounter.id)
        && encounter.day.is_none_or(|day| day == request.day)
        && encounter.location == request.location
        && encounter.required_choice.as_ref().is_none_or(|required| {
            request.choices.get(&required.choice_id) == Some(required.value.as_str())
        })
}

/// Open-content encounters at the requested location, in catalog order.
pub fn open_encounters<'r, 'a: 'r>(
    request: &'r EncounterRequest<'a>,
) -> impl Iterator<Item = &'a Encounter> + 'r {
    let catalog = request.catalog;
    catalog
        .encounters()
        .iter()
        .filter(move |encounter| is_open(request, encounter))
}

/// Select the next encounter to present, or `None` when the player must travel.
#[must_use]
pub fn pick_encounter<'a>(request: &EncounterRequest<'a>) -> Option<EncounterPick<'a>> {
    let pick = pick_bootstrap(request)
        .map(|encounter| EncounterPick {
            encounter,
            rule: SelectionRule::Bootstrap,
        })
        .or_else(|| {
            pick_continuation(request).map(|encounter| EncounterPick {
                encounter,
                rule: SelectionRule::Continuation,
            })
        })
        .or_else(|| {
            open_encounters(request).next().map(|encounter| EncounterPick {
                encounter,
                rule: SelectionRule::OpenContent,
            })
        });
    debug!(
        "encounter selection | day {} at '{}' -> {:?}",
        request.day,
        request.location,
        pick.map(|p| (p.encounter.id.as_str(), p.rule))
    );
    pick
}
