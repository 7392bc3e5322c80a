use anyhow::{Result, ensure};
use roadrager_game::WorldState;

use super::TestScenario;
use crate::logic::{GameTester, GameplayStrategy, SimulationPlan, SimulationSummary};

pub fn smoke_scenario() -> TestScenario {
    TestScenario::simulation(
        "Smoke Test",
        SimulationPlan::new(GameplayStrategy::Cautious)
            .with_max_steps(12)
            .with_expectation(smoke_expectation),
    )
}

pub fn reset_scenario() -> TestScenario {
    TestScenario::simulation(
        "Reset Restores Opening Snapshot",
        SimulationPlan::new(GameplayStrategy::Random).with_expectation(reset_expectation),
    )
}

fn smoke_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(!summary.steps.is_empty(), "Smoke run took no steps");
    let (encounter, _) = summary
        .choices()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Smoke run never chose an option"))?;
    ensure!(
        encounter == "intro",
        "First presented encounter should be the intro, got '{encounter}'"
    );
    ensure!(
        summary.final_state.is_completed("intro"),
        "Intro should be completed after the first choice"
    );
    ensure!(
        summary.final_state.day > 1 || summary.game_ended(),
        "Smoke run should travel at least once"
    );
    Ok(())
}

fn reset_expectation(summary: &SimulationSummary) -> Result<()> {
    let tester = GameTester::try_new(false)?;
    let mut session = tester.session(Some(summary.final_state.clone()));
    let opening = WorldState::initial(tester.config());

    for round in 0..2 {
        let state = session.reset().clone();
        ensure!(
            state == opening,
            "Reset round {round} did not restore the opening snapshot"
        );
        let presented = session.current_encounter().map(|e| e.id.clone());
        ensure!(
            presented.as_deref() == Some(tester.config().intro_encounter_id.as_str()),
            "Intro should be presented after reset, got {presented:?}"
        );
        ensure!(!session.minigame_pending(), "Reset left a minigame pending");
        session.choose_option("check-news")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::LogicTester;

    #[test]
    fn smoke_and_reset_pass_for_a_few_seeds() {
        let tester = LogicTester::new(false);
        for scenario in [smoke_scenario(), reset_scenario()] {
            for result in tester.run_scenario(&scenario, &[1, 1337], 2) {
                assert!(result.passed, "{}: {:?}", result.scenario_name, result.failures);
            }
        }
    }
}
