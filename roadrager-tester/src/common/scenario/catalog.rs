use anyhow::{Context, Result, ensure};
use roadrager_game::{GameStorage, JsonFileStorage, MemoryStorage, WorldState};
use std::collections::HashSet;

use super::TestScenario;
use crate::logic::{GameTester, GameplayStrategy, SimulationPlan, SimulationSummary};

pub fn determinism_scenario() -> TestScenario {
    TestScenario::simulation(
        "Deterministic Playthrough Verification",
        SimulationPlan::new(GameplayStrategy::Random).with_expectation(determinism_expectation),
    )
}

pub fn catalog_integrity_scenario() -> TestScenario {
    TestScenario::simulation(
        "Bundled Catalog Integrity",
        base_plan().with_expectation(catalog_integrity_expectation),
    )
}

pub fn persistence_scenario() -> TestScenario {
    TestScenario::simulation(
        "Save Slot Round Trip",
        SimulationPlan::new(GameplayStrategy::Random)
            .with_max_steps(8)
            .with_expectation(persistence_expectation),
    )
}

fn base_plan() -> SimulationPlan {
    SimulationPlan::new(GameplayStrategy::Cautious).with_max_steps(0)
}

fn determinism_expectation(summary: &SimulationSummary) -> Result<()> {
    let replay = GameTester::try_new(false)?.run_plan(
        &SimulationPlan::new(summary.strategy),
        summary.seed,
    )?;
    ensure!(
        replay.steps.len() == summary.steps.len(),
        "Replay took {} steps, original took {}",
        replay.steps.len(),
        summary.steps.len()
    );
    if let Some((idx, _)) = replay
        .steps
        .iter()
        .zip(&summary.steps)
        .enumerate()
        .find(|(_, (a, b))| a != b)
    {
        anyhow::bail!("Replay diverged at step {}", idx + 1);
    }
    ensure!(
        replay.final_state == summary.final_state,
        "Replay final state differs"
    );
    Ok(())
}

fn catalog_integrity_expectation(_summary: &SimulationSummary) -> Result<()> {
    let tester = GameTester::try_new(false)?;
    let catalog = tester.catalog();

    let diagnostics: Vec<String> = catalog
        .diagnostics()
        .iter()
        .map(ToString::to_string)
        .collect();
    ensure!(
        diagnostics.is_empty(),
        "Catalog has authoring problems: {}",
        diagnostics.join("; ")
    );

    let intro = catalog
        .encounter(&tester.config().intro_encounter_id)
        .context("Intro encounter missing")?;
    ensure!(
        intro.location == tester.config().start_location,
        "Intro is not placed at the start location"
    );

    let mut endings = HashSet::new();
    for encounter in catalog.encounters() {
        ensure!(
            !encounter.options.is_empty(),
            "Encounter '{}' offers no options",
            encounter.id
        );
        for option in &encounter.options {
            if option.outcome.game_over {
                let ending = option
                    .outcome
                    .ending_type
                    .as_deref()
                    .with_context(|| format!("Option '{}' ends without an ending", option.id))?;
                endings.insert(ending);
            }
        }
    }
    ensure!(
        endings.len() >= 3,
        "Expected several authored endings, found {endings:?}"
    );
    Ok(())
}

fn persistence_expectation(summary: &SimulationSummary) -> Result<()> {
    let tester = GameTester::try_new(false)?;
    let slot = tester.config().storage_key.clone();

    let memory = MemoryStorage::new();
    memory.save_state(&slot, &summary.final_state)?;
    let reloaded = memory
        .load_state(&slot)?
        .context("Memory slot vanished after save")?;
    ensure!(
        reloaded == summary.final_state,
        "Memory slot did not round trip"
    );

    let dir = std::env::temp_dir().join(format!(
        "roadrager-persistence-{}-{}",
        std::process::id(),
        summary.seed
    ));
    let files = JsonFileStorage::new(&dir);
    files.save_state(&slot, &summary.final_state)?;
    let from_disk: Option<WorldState> = files.load_state(&slot)?;
    files.delete_state(&slot)?;
    let after_delete = files.load_state(&slot)?;
    let _ = std::fs::remove_dir_all(&dir);
    ensure!(
        from_disk.as_ref() == Some(&summary.final_state),
        "File slot did not round trip"
    );
    ensure!(after_delete.is_none(), "Deleted slot still loads");
    Ok(())
}
