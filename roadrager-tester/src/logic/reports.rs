use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;

use super::ScenarioResult;

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    total: usize,
    passed: usize,
    results: &'a [ScenarioResult],
}

#[allow(clippy::cast_precision_loss)]
fn success_rate(results: &[ScenarioResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let passed = results.iter().filter(|r| r.passed).count();
    (passed as f64 / results.len() as f64) * 100.0
}

/// Ending ids tallied across every iteration of every result.
fn ending_tally(results: &[ScenarioResult]) -> BTreeMap<&str, usize> {
    let mut tally = BTreeMap::new();
    for ending in results.iter().flat_map(|r| r.endings.iter()) {
        *tally.entry(ending.as_str()).or_insert(0) += 1;
    }
    tally
}

/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn generate_console_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Logic Test Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==============================".cyan())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "Total scenarios: {total_tests}")?;
    writeln!(out, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(out, "Failed: {}", failed_tests.to_string().red())?;
    writeln!(out, "Success rate: {:.1}%", success_rate(results))?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };

        writeln!(
            out,
            "{} {} (seed {})",
            status,
            result.scenario_name.bold(),
            result.seed
        )?;
        writeln!(
            out,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    let tally = ending_tally(results);
    if !tally.is_empty() {
        writeln!(out, "{}", "🏁 Endings Reached".bright_magenta().bold())?;
        writeln!(out, "{}", "==================".magenta())?;
        for (ending, count) in &tally {
            writeln!(out, "{ending:20} {count}")?;
        }
        writeln!(out)?;
    }

    let fastest = results.iter().min_by_key(|r| r.average_duration);
    let slowest = results.iter().max_by_key(|r| r.average_duration);
    if let (Some(fastest), Some(slowest)) = (fastest, slowest) {
        writeln!(out, "{}", "⚡ Performance Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "=====================".yellow())?;
        writeln!(
            out,
            "Fastest: {} ({:?})",
            fastest.scenario_name.green(),
            fastest.average_duration
        )?;
        writeln!(
            out,
            "Slowest: {} ({:?})",
            slowest.scenario_name.yellow(),
            slowest.average_duration
        )?;
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn generate_json_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    let report = JsonReport {
        generated_at: Utc::now().to_rfc3339(),
        total: results.len(),
        passed: results.iter().filter(|r| r.passed).count(),
        results,
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn generate_markdown_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    writeln!(out, "# Road Rager Logic Test Results\n")?;
    writeln!(out, "_Generated {}_\n", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"))?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total scenarios**: {total_tests}")?;
    writeln!(out, "- **Passed**: {passed_tests}")?;
    writeln!(out, "- **Failed**: {failed_tests}")?;
    writeln!(out, "- **Success rate**: {:.1}%\n", success_rate(results))?;

    let tally = ending_tally(results);
    if !tally.is_empty() {
        writeln!(out, "## Endings\n")?;
        writeln!(out, "| Ending | Runs |")?;
        writeln!(out, "| --- | --- |")?;
        for (ending, count) in &tally {
            writeln!(out, "| {ending} | {count} |")?;
        }
        writeln!(out)?;
    }

    writeln!(out, "## Detailed Results\n")?;

    for result in results {
        let status = if result.passed { "✅" } else { "❌" };

        writeln!(out, "### {} {} (seed {})\n", status, result.scenario_name, result.seed)?;
        writeln!(
            out,
            "- **Iterations**: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "- **Average time**: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, passed: bool, endings: &[&str]) -> ScenarioResult {
        ScenarioResult {
            scenario_name: name.to_string(),
            seed: 42,
            passed,
            iterations_run: endings.len(),
            successful_iterations: if passed { endings.len() } else { 0 },
            failures: if passed {
                Vec::new()
            } else {
                vec!["car health 120 out of range".to_string()]
            },
            endings: endings.iter().map(ToString::to_string).collect(),
            average_duration: Duration::from_millis(3),
            performance_data: vec![Duration::from_millis(3)],
        }
    }

    #[test]
    fn json_report_wraps_results_with_counts() {
        let mut buf = Vec::new();
        let results = [
            result("Smoke", true, &["truth"]),
            result("Fallback", false, &["starvation"]),
        ];
        generate_json_report(&mut buf, &results).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["total"], 2);
        assert_eq!(value["passed"], 1);
        assert_eq!(value["results"][1]["scenario_name"], "Fallback");
        assert!(value["generated_at"].as_str().is_some());
    }

    #[test]
    fn markdown_report_tallies_endings() {
        let mut buf = Vec::new();
        let results = [
            result("Smoke", true, &["truth", "starvation"]),
            result("Endings", true, &["truth"]),
        ];
        generate_markdown_report(&mut buf, &results).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("# Road Rager Logic Test Results"));
        assert!(text.contains("| truth | 2 |"));
        assert!(text.contains("| starvation | 1 |"));
        assert!(text.contains("- **Success rate**: 100.0%"));
    }

    #[test]
    fn console_report_lists_failures() {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        let results = [result("Smoke", false, &["breakdown"])];
        generate_console_report(&mut buf, &results, Duration::from_millis(5)).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("❌ FAIL Smoke (seed 42)"));
        assert!(text.contains("car health 120 out of range"));
        assert!(text.contains("breakdown"));
        assert!(text.contains("Success rate: 0.0%"));
    }
}
