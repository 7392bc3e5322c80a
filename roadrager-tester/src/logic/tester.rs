use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::common::scenario::TestScenario;
use crate::logic::game_tester::{GameTester, SimulationPlan, SimulationSummary, StepKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    /// Ending id reached by each iteration, in order.
    pub endings: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    verbose: bool,
}

impl LogicTester {
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} (strategy: {} seed: {})",
                    scenario.name.bright_white(),
                    scenario.plan.strategy,
                    seed
                );
            }

            let result = self.run_single_scenario(scenario, seed, iterations);
            results.push(result);
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let outcome = self.run_simulation_iterations(&scenario.plan, seed, iterations);

        let average_duration = if outcome.performance_data.is_empty() {
            Duration::ZERO
        } else {
            outcome.performance_data.iter().sum::<Duration>()
                / u32::try_from(outcome.performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            seed,
            passed: outcome.failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: outcome.successes,
            failures: outcome.failures,
            endings: outcome.endings,
            average_duration,
            performance_data: outcome.performance_data,
        }
    }

    fn run_simulation_iterations(
        &self,
        plan: &SimulationPlan,
        seed: u64,
        iterations: usize,
    ) -> IterationOutcome {
        let mut outcome = IterationOutcome::default();
        let tester = match GameTester::try_new(self.verbose) {
            Ok(tester) => tester,
            Err(err) => {
                outcome.failures.push(format!("tester setup failed: {err:#}"));
                return outcome;
            }
        };

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let summary = match tester.run_plan(plan, iteration_seed) {
                Ok(summary) => summary,
                Err(err) => {
                    outcome.failures.push(format!(
                        "Iteration {} (strategy {}, seed {iteration_seed}): engine rejected a move: {err:#}",
                        i + 1,
                        plan.strategy
                    ));
                    continue;
                }
            };
            outcome.endings.push(summary.ending_id().to_string());

            if let Some(err) = evaluate_expectations(plan, &summary) {
                let state = &summary.final_state;
                outcome.failures.push(format!(
                    "Iteration {} (strategy {}, seed {}, steps {}, ending '{}'): {} | {} | final day {} food {} fuel {} car {}",
                    i + 1,
                    summary.strategy,
                    summary.seed,
                    summary.steps.len(),
                    summary.ending_id(),
                    err,
                    summarize_decision_path(&summary),
                    state.day,
                    state.resources.food,
                    state.resources.fuel,
                    state.car_health
                ));

                if self.verbose {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        err.red()
                    );
                }
            } else {
                outcome.successes += 1;
                let duration = start_time.elapsed();
                outcome.performance_data.push(duration);

                if self.verbose {
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) day:{} ending:{} policy:{}",
                        i + 1,
                        iterations,
                        summary.final_state.day,
                        summary.ending_id(),
                        summary.policy_name
                    );
                }
            }
        }

        outcome
    }
}

#[derive(Default)]
struct IterationOutcome {
    successes: usize,
    failures: Vec<String>,
    endings: Vec<String>,
    performance_data: Vec<Duration>,
}

/// Invariant violations fail a run before any scenario expectation is consulted.
fn evaluate_expectations(plan: &SimulationPlan, summary: &SimulationSummary) -> Option<String> {
    if let Some(violation) = summary.violations.first() {
        return Some(format!(
            "invariant violated: {violation} ({} total)",
            summary.violations.len()
        ));
    }
    for expectation in &plan.expectations {
        if let Err(err) = expectation.evaluate(summary) {
            return Some(err.to_string());
        }
    }
    None
}

fn summarize_decision_path(summary: &SimulationSummary) -> String {
    let recent: Vec<String> = summary
        .steps
        .iter()
        .rev()
        .take(3)
        .map(|step| match &step.kind {
            StepKind::Choice {
                encounter,
                option,
                rationale,
            } => format!(
                "day {} ({encounter}): {option} reason {}",
                step.day,
                rationale.as_deref().filter(|s| !s.is_empty()).unwrap_or("-")
            ),
            StepKind::Minigame {
                encounter,
                kind,
                score,
                via_fallback,
                ..
            } => format!(
                "day {} ({encounter}): {kind} score {score}{}",
                step.day,
                if *via_fallback { " fallback" } else { "" }
            ),
            StepKind::Travel { from, to, .. } => format!("day {}: {from} -> {to}", step.day),
        })
        .collect();
    if recent.is_empty() {
        "no decisions recorded".to_string()
    } else {
        recent.join(" | ")
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis
            .into_iter()
            .map(|ms| Duration::from_millis(u64::try_from(ms).unwrap_or(0)))
            .collect())
    }
}
