pub mod catalog;
pub mod full_game;
pub mod smoke;

use crate::logic::SimulationPlan;

/// Named simulation plan the logic tester can run.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

#[must_use]
pub fn get_scenario(name: &str) -> Option<TestScenario> {
    match name.to_lowercase().as_str() {
        "smoke" => Some(smoke::smoke_scenario()),
        "reset" => Some(smoke::reset_scenario()),
        "cautious" | "full-game-cautious" => Some(full_game::full_game_cautious_scenario()),
        "bold" | "full-game-bold" => Some(full_game::full_game_bold_scenario()),
        "random" | "full-game-random" => Some(full_game::full_game_random_scenario()),
        "fallback" | "minigame-fallback" => Some(full_game::minigame_fallback_scenario()),
        "starvation" | "edge-case" => Some(full_game::starvation_edge_scenario()),
        "determinism" | "deterministic" => Some(catalog::determinism_scenario()),
        "catalog" | "catalog-integrity" => Some(catalog::catalog_integrity_scenario()),
        "persistence" | "save-load" => Some(catalog::persistence_scenario()),
        _ => None,
    }
}

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "Smoke Test"),
        ("reset", "Reset Restores Opening Snapshot"),
        ("cautious", "Full Game - Cautious Strategy"),
        ("bold", "Full Game - Bold Strategy"),
        ("random", "Full Game - Random Strategy"),
        ("fallback", "Minigame Fallback At-Most-Once"),
        ("starvation", "Starvation Edge Case"),
        ("determinism", "Deterministic Playthrough Verification"),
        ("catalog", "Bundled Catalog Integrity"),
        ("persistence", "Save Slot Round Trip"),
    ]
}
