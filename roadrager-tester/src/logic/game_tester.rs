use anyhow::{Context, Result};
use colored::Colorize;
use log::debug;
use roadrager_game::{
    BundledLoader, Catalog, EncounterRequest, EndingSummary, EngineConfig, EngineError,
    GameEngine, GameSession, MemoryStorage, MinigameKind, TravelOutcome, WorldState,
    pick_encounter,
};
use std::collections::HashSet;
use std::sync::Arc;

use super::policy::{Destination, GameplayStrategy, MinigamePlay, PlayerPolicy};

/// Step cap for plans that do not set their own.
pub const DEFAULT_MAX_STEPS: usize = 200;

const CAR_HEALTH_RANGE: std::ops::RangeInclusive<i32> = 0..=100;
const TRUST_RANGE: std::ops::RangeInclusive<i32> = -100..=100;

/// One mutation the simulation drove through the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    Choice {
        encounter: String,
        option: String,
        rationale: Option<String>,
    },
    Minigame {
        encounter: String,
        kind: MinigameKind,
        success: bool,
        score: u32,
        via_fallback: bool,
        /// Outcome of the second signal, when the policy sent one.
        duplicate_ignored: Option<bool>,
    },
    Travel {
        from: String,
        to: String,
        outcome: TravelOutcome,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub day: u32,
    pub kind: StepKind,
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub policy_name: &'static str,
    pub steps: Vec<StepRecord>,
    pub final_state: WorldState,
    pub ending: Option<EndingSummary>,
    /// The step cap was reached before an ending.
    pub halted: bool,
    pub violations: Vec<String>,
    /// Resource warnings as the player would have seen them, one per change.
    pub warnings: Vec<String>,
}

impl SimulationSummary {
    #[must_use]
    pub const fn game_ended(&self) -> bool {
        self.ending.is_some()
    }

    pub fn choices(&self) -> impl Iterator<Item = (&str, &str)> {
        self.steps.iter().filter_map(|step| match &step.kind {
            StepKind::Choice {
                encounter, option, ..
            } => Some((encounter.as_str(), option.as_str())),
            _ => None,
        })
    }

    pub fn minigames(&self) -> impl Iterator<Item = &StepKind> {
        self.steps
            .iter()
            .map(|step| &step.kind)
            .filter(|kind| matches!(kind, StepKind::Minigame { .. }))
    }

    #[must_use]
    pub fn ending_id(&self) -> &str {
        self.ending
            .as_ref()
            .map_or("none", |summary| summary.ending.id())
    }
}

#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: GameplayStrategy,
    pub max_steps: usize,
    pub setup: Option<fn(&mut WorldState)>,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(strategy: GameplayStrategy) -> Self {
        Self {
            strategy,
            max_steps: DEFAULT_MAX_STEPS,
            setup: None,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    #[must_use]
    pub fn with_setup(mut self, setup: fn(&mut WorldState)) -> Self {
        self.setup = Some(setup);
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    #[must_use]
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// # Errors
    ///
    /// Returns the expectation's failure.
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// Drives engine sessions with a policy and audits every step.
#[derive(Clone)]
pub struct GameTester {
    catalog: Arc<Catalog>,
    config: EngineConfig,
    verbose: bool,
}

impl GameTester {
    /// Prepare the bundled catalog and default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled content fails to load or validate.
    pub fn try_new(verbose: bool) -> Result<Self> {
        let (catalog, config) = GameEngine::new(BundledLoader, MemoryStorage::new())
            .prepare()
            .context("preparing bundled catalog")?;
        Ok(Self {
            catalog,
            config,
            verbose,
        })
    }

    #[must_use]
    pub const fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Session over fresh in-memory storage, starting from `state` when given.
    #[must_use]
    pub fn session(&self, state: Option<WorldState>) -> GameSession<MemoryStorage> {
        match state {
            Some(state) => GameSession::from_state(
                Arc::clone(&self.catalog),
                self.config.clone(),
                MemoryStorage::new(),
                state,
            ),
            None => GameSession::new(
                Arc::clone(&self.catalog),
                self.config.clone(),
                MemoryStorage::new(),
            ),
        }
    }

    /// Play one run of `plan` with the given seed.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects a mutation the policy chose.
    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        let mut session = match plan.setup {
            Some(setup) => {
                let mut state = WorldState::initial(&self.config);
                setup(&mut state);
                self.session(Some(state))
            }
            None => self.session(None),
        };
        let mut policy = plan.strategy.create_policy(seed);
        let mut steps = Vec::new();
        let mut violations = Vec::new();
        let mut warnings = Vec::new();
        self.check_invariants(session.state(), &mut violations);
        note_warning(&session, &mut warnings);

        while steps.len() < plan.max_steps && !session.is_over() {
            let step = self.take_step(&mut session, policy.as_mut())?;
            debug!("{} seed {seed} step {}: {:?}", policy.name(), steps.len() + 1, step.kind);
            if self.verbose {
                println!("    {} {:?}", format!("day {}", step.day).dimmed(), step.kind);
            }
            if let StepKind::Minigame {
                duplicate_ignored: Some(false),
                encounter,
                ..
            } = &step.kind
            {
                violations.push(format!("second minigame signal for '{encounter}' was applied"));
            }
            self.check_invariants(session.state(), &mut violations);
            if note_warning(&session, &mut warnings) && self.verbose {
                println!("    {}", warnings.last().map_or("", String::as_str).yellow());
            }
            steps.push(step);
        }

        let halted = !session.is_over();
        if !halted {
            check_frozen(&mut session, &mut violations);
        }

        Ok(SimulationSummary {
            seed,
            strategy: plan.strategy,
            policy_name: policy.name(),
            steps,
            ending: session.ending_summary(),
            final_state: session.into_state(),
            halted,
            violations,
            warnings,
        })
    }

    fn take_step(
        &self,
        session: &mut GameSession<MemoryStorage>,
        policy: &mut dyn PlayerPolicy,
    ) -> Result<StepRecord> {
        let day = session.state().day;
        if let Some(encounter) = session.current_encounter().cloned() {
            if session.minigame_pending() {
                return Self::play_minigame(session, policy, day);
            }
            let decision = policy.pick_option(session.state(), &encounter);
            let option = encounter
                .options
                .get(decision.option_index)
                .or_else(|| encounter.options.first())
                .with_context(|| format!("encounter '{}' offers no options", encounter.id))?;
            session
                .choose_option(&option.id)
                .with_context(|| format!("choosing '{}' at '{}'", option.id, encounter.id))?;
            return Ok(StepRecord {
                day,
                kind: StepKind::Choice {
                    encounter: encounter.id.clone(),
                    option: option.id.clone(),
                    rationale: decision.rationale,
                },
            });
        }

        let destinations = self.destinations(session.state());
        let from = session.state().location.clone();
        let to = policy
            .pick_destination(session.state(), &destinations)
            .unwrap_or_else(|| from.clone());
        let outcome = session
            .travel(Some(to.as_str()))
            .with_context(|| format!("travelling from '{from}' to '{to}'"))?;
        Ok(StepRecord {
            day,
            kind: StepKind::Travel { from, to, outcome },
        })
    }

    fn play_minigame(
        session: &mut GameSession<MemoryStorage>,
        policy: &mut dyn PlayerPolicy,
        day: u32,
    ) -> Result<StepRecord> {
        let ticket = session.start_minigame()?;
        let plan = policy.play_minigame(&ticket.descriptor);
        let id = ticket.session_id;
        let report = match plan.play {
            MinigamePlay::Complete { success, score } => {
                session.complete_minigame(id, success, score)?
            }
            MinigamePlay::Abort => session.abort_minigame(id)?,
        }
        .with_context(|| format!("first signal for minigame {id} was ignored"))?;

        let duplicate_ignored = if plan.duplicate {
            let second = match plan.play {
                MinigamePlay::Complete { .. } => session.abort_minigame(id)?,
                MinigamePlay::Abort => session.complete_minigame(id, true, 100)?,
            };
            Some(second.is_none())
        } else {
            None
        };

        Ok(StepRecord {
            day,
            kind: StepKind::Minigame {
                encounter: report.encounter_id,
                kind: ticket.descriptor.kind,
                success: report.result.success,
                score: report.result.score,
                via_fallback: report.via_fallback,
                duplicate_ignored,
            },
        })
    }

    /// Available locations annotated with whether arriving tomorrow presents anything.
    fn destinations(&self, state: &WorldState) -> Vec<Destination> {
        roadrager_game::available_locations(&self.catalog, state)
            .into_iter()
            .map(|choice| {
                let mut request = EncounterRequest::from_state(state, &self.catalog, &self.config);
                request.day = state.day + 1;
                request.location = &choice.id;
                let has_content = pick_encounter(&request).is_some();
                Destination {
                    id: choice.id.clone(),
                    is_current: choice.is_current,
                    has_content,
                }
            })
            .collect()
    }

    fn check_invariants(&self, state: &WorldState, violations: &mut Vec<String>) {
        if state.day == 0 {
            violations.push("day counter dropped to zero".to_string());
        }
        if !CAR_HEALTH_RANGE.contains(&state.car_health) {
            violations.push(format!("car health {} out of range", state.car_health));
        }
        for character in &state.characters {
            if !TRUST_RANGE.contains(&character.trust_level) {
                violations.push(format!(
                    "trust {} for '{}' out of range",
                    character.trust_level, character.id
                ));
            }
        }
        let mut seen = HashSet::new();
        for id in &state.encounters_completed {
            if !seen.insert(id.as_str()) {
                violations.push(format!("encounter '{id}' completed twice"));
            }
            if self.catalog.encounter(id).is_none() {
                violations.push(format!("completed encounter '{id}' is not in the catalog"));
            }
        }
        if state.game_over != state.ending.is_some() {
            violations.push("game over flag and ending disagree".to_string());
        }
    }
}

/// A finished run must reject every mutation and leave the state untouched.
/// Record the session's resource warning when it differs from the last one seen.
fn note_warning(session: &GameSession<MemoryStorage>, warnings: &mut Vec<String>) -> bool {
    let Some(warning) = session.resource_warning() else {
        return false;
    };
    let line = format!("day {}: {}", session.state().day, warning.message());
    let repeated = warnings
        .last()
        .is_some_and(|last| last.ends_with(warning.message()));
    if repeated {
        return false;
    }
    warnings.push(line);
    true
}

fn check_frozen(session: &mut GameSession<MemoryStorage>, violations: &mut Vec<String>) {
    let snapshot = session.state().clone();
    let here = snapshot.location.clone();
    let attempts = [
        ("travel", session.travel(Some(here.as_str())).err()),
        ("rest", session.travel(None).err()),
        ("choose", session.choose_option("pack-and-leave").err()),
        ("minigame", session.start_minigame().err()),
    ];
    for (label, err) in attempts {
        if !matches!(err, Some(EngineError::GameOver { .. })) {
            violations.push(format!("{label} after the ending was not rejected: {err:?}"));
        }
    }
    if session.state() != &snapshot {
        violations.push("state changed after the ending".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tester() -> GameTester {
        GameTester::try_new(false).unwrap()
    }

    #[test]
    fn cautious_run_reaches_an_ending_cleanly() {
        let plan = SimulationPlan::new(GameplayStrategy::Cautious);
        let summary = tester().run_plan(&plan, 1337).unwrap();
        assert!(summary.violations.is_empty(), "{:?}", summary.violations);
        assert!(summary.game_ended());
        assert!(!summary.halted);
        assert_eq!(summary.choices().next(), Some(("intro", "pack-and-leave")));
    }

    #[test]
    fn step_cap_halts_the_run() {
        let plan = SimulationPlan::new(GameplayStrategy::Cautious).with_max_steps(1);
        let summary = tester().run_plan(&plan, 1).unwrap();
        assert_eq!(summary.steps.len(), 1);
        assert!(summary.halted);
        assert_eq!(summary.ending_id(), "none");
    }

    #[test]
    fn setup_shapes_the_opening_state() {
        fn starving(state: &mut WorldState) {
            state.complete_encounter("intro");
            state.resources.food = 0;
        }
        let plan = SimulationPlan::new(GameplayStrategy::Cautious).with_setup(starving);
        let summary = tester().run_plan(&plan, 5).unwrap();
        assert_eq!(summary.ending_id(), "starvation");
        assert!(summary.violations.is_empty(), "{:?}", summary.violations);
        assert_eq!(
            summary.warnings,
            vec!["day 1: Critically low food. Find supplies soon.".to_string()]
        );
    }

    #[test]
    fn fallback_runs_record_duplicate_signals_as_ignored() {
        let plan = SimulationPlan::new(GameplayStrategy::Fallback);
        let summary = tester().run_plan(&plan, 9).unwrap();
        for kind in summary.minigames() {
            if let StepKind::Minigame {
                via_fallback,
                duplicate_ignored,
                ..
            } = kind
            {
                assert!(via_fallback);
                assert_eq!(*duplicate_ignored, Some(true));
            }
        }
    }

    #[test]
    fn destinations_flag_pending_content() {
        let tester = tester();
        let mut state = WorldState::default();
        state.complete_encounter("intro");
        state.record_choice("check-news");
        let destinations = tester.destinations(&state);
        let downtown = destinations.iter().find(|d| d.id == "downtown").unwrap();
        assert!(downtown.has_content);
        assert!(!downtown.is_current);
    }
}
