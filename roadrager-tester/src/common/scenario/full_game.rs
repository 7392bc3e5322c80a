use anyhow::{Result, bail, ensure};
use roadrager_game::{Difficulty, FallbackScores, TravelOutcome, WorldState};

use super::TestScenario;
use crate::logic::{GameplayStrategy, SimulationPlan, SimulationSummary, StepKind};

pub fn full_game_cautious_scenario() -> TestScenario {
    full_game("Full Game - Cautious Strategy", GameplayStrategy::Cautious)
}

pub fn full_game_bold_scenario() -> TestScenario {
    full_game("Full Game - Bold Strategy", GameplayStrategy::Bold)
}

pub fn full_game_random_scenario() -> TestScenario {
    full_game("Full Game - Random Strategy", GameplayStrategy::Random)
}

pub fn minigame_fallback_scenario() -> TestScenario {
    TestScenario::simulation(
        "Minigame Fallback At-Most-Once",
        SimulationPlan::new(GameplayStrategy::Fallback)
            .with_expectation(ending_expectation)
            .with_expectation(fallback_expectation),
    )
}

pub fn starvation_edge_scenario() -> TestScenario {
    TestScenario::simulation(
        "Starvation Edge Case",
        SimulationPlan::new(GameplayStrategy::Random)
            .with_setup(hungry_start)
            .with_expectation(starvation_expectation),
    )
}

fn full_game(name: &'static str, strategy: GameplayStrategy) -> TestScenario {
    TestScenario::simulation(
        name,
        SimulationPlan::new(strategy).with_expectation(ending_expectation),
    )
}

/// Food for exactly one more day on the road.
fn hungry_start(state: &mut WorldState) {
    state.complete_encounter("intro");
    state.location = "downtown".to_string();
    state.resources.food = 15;
}

fn ending_expectation(summary: &SimulationSummary) -> Result<()> {
    let Some(ending) = &summary.ending else {
        bail!(
            "Run halted after {} steps without an ending",
            summary.steps.len()
        );
    };
    ensure!(!ending.title.is_empty(), "Ending has no title");
    ensure!(!ending.epilogue.is_empty(), "Ending has no epilogue");
    ensure!(
        ending.day == summary.final_state.day,
        "Ending summary day {} disagrees with state day {}",
        ending.day,
        summary.final_state.day
    );
    ensure!(
        ending.allies >= ending.trusted_allies,
        "More trusted allies than allies"
    );
    if ending.ending.is_survival_failure() {
        let last = summary.steps.last().map(|step| &step.kind);
        ensure!(
            matches!(last, Some(StepKind::Travel { .. })),
            "Survival ending '{}' was not produced by travel",
            ending.ending
        );
    }
    Ok(())
}

fn fallback_expectation(summary: &SimulationSummary) -> Result<()> {
    let scores = FallbackScores::default();
    let expected = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
        .map(|difficulty| difficulty.fallback_score(&scores));
    for kind in summary.minigames() {
        let StepKind::Minigame {
            encounter,
            success,
            score,
            via_fallback,
            duplicate_ignored,
            ..
        } = kind
        else {
            continue;
        };
        ensure!(*via_fallback, "Minigame at '{encounter}' did not settle via fallback");
        ensure!(*success, "Fallback at '{encounter}' should count as success");
        ensure!(
            expected.contains(score),
            "Fallback score {score} at '{encounter}' matches no difficulty"
        );
        ensure!(
            *duplicate_ignored == Some(true),
            "Late completion at '{encounter}' was not ignored"
        );
    }
    Ok(())
}

fn starvation_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.game_ended(), "Hungry run never ended");
    for step in &summary.steps {
        if let StepKind::Travel {
            outcome: TravelOutcome::Advanced { food, .. },
            to,
            ..
        } = &step.kind
        {
            ensure!(*food > 0, "Arrived at '{to}' on day {} with no food", step.day + 1);
        }
    }
    if summary.ending_id() == "starvation" {
        ensure!(
            summary.final_state.resources.food == 0,
            "Starvation should leave food at zero"
        );
        ensure!(
            matches!(
                summary.steps.last().map(|step| &step.kind),
                Some(StepKind::Travel { .. })
            ),
            "Starvation must come from travel"
        );
        ensure!(
            summary
                .warnings
                .iter()
                .any(|line| line.contains("low food")),
            "Starved without a low-food warning"
        );
    }
    Ok(())
}
