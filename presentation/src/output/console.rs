//! Console output formatter for run results

use crate::cli::commands::OutputFormat;
use benchfleet_domain::{AgentRecord, AgentStatus, RunResult, ScenarioOutcome};
use colored::{ColoredString, Colorize};
use serde::Serialize;
use serde_json::Value;

const SUMMARY_WIDTH: usize = 48;

/// Formats run results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Render a whole scenario in the requested format
    pub fn render(outcome: &ScenarioOutcome, format: OutputFormat) -> String {
        match format {
            OutputFormat::Table => Self::format_outcome(outcome),
            OutputFormat::Json => Self::format_json(outcome),
        }
    }

    /// One table per iteration, followed by a failure summary
    pub fn format_outcome(outcome: &ScenarioOutcome) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("Benchmark Results"));
        output.push('\n');

        if outcome.iterations.is_empty() {
            output.push_str(&format!("\n{}\n", "No iterations were run.".dimmed()));
        }

        for iteration in &outcome.iterations {
            output.push_str(&Self::section_header(&format!(
                "{} (concurrency {})",
                iteration.test, iteration.concurrency
            )));
            output.push_str(&Self::format_run(&iteration.agents));
        }

        let failures = outcome.failure_count();
        let summary = if failures == 0 {
            "All agents succeeded".green().bold()
        } else {
            format!("{} agent record(s) failed", failures).red().bold()
        };
        output.push_str(&format!("\n{}\n", summary));
        output.push_str(&Self::footer());
        output
    }

    /// Table of one run result, one row per agent
    pub fn format_run(result: &RunResult) -> String {
        let id_width = result
            .keys()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max("AGENT".len());

        let mut output = format!(
            "{}\n",
            format!("{:<id_width$}  {:<11}  {}", "AGENT", "STATUS", "RESULT").bold()
        );
        for record in result.values() {
            output.push_str(&format!(
                "{:<id_width$}  {}  {}\n",
                record.agent_id,
                Self::status(record.status),
                Self::summary(record)
            ));
        }
        output
    }

    /// Format any result as JSON
    pub fn format_json<T: Serialize + ?Sized>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }

    fn status(status: AgentStatus) -> ColoredString {
        let padded = format!("{:<11}", status.as_str());
        match status {
            AgentStatus::Ok => padded.green(),
            AgentStatus::Error => padded.red(),
            AgentStatus::Lost => padded.yellow(),
            AgentStatus::Interrupted => padded.magenta(),
        }
    }

    /// Short human summary of a record's payload
    fn summary(record: &AgentRecord) -> String {
        if let Some(info) = &record.info {
            return truncate(info, SUMMARY_WIDTH);
        }
        if let Some(Value::Array(samples)) = record.get("samples") {
            return format!("{} sample(s)", samples.len());
        }
        match record.get("stdout").and_then(Value::as_str) {
            Some(stdout) => truncate(stdout.lines().next().unwrap_or_default(), SUMMARY_WIDTH),
            None => String::new(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("{}\n", "=".repeat(60).cyan())
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width.saturating_sub(3)).collect();
    short.push_str("...");
    short
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchfleet_domain::IterationRecord;
    use std::collections::BTreeMap;

    fn result() -> RunResult {
        BTreeMap::from([
            (
                "alpha".to_string(),
                AgentRecord::ok("alpha").with_field("stdout", "load average: 0.10\nmore"),
            ),
            (
                "beta".to_string(),
                AgentRecord::error("beta", "Command exited with code 2"),
            ),
            ("gamma".to_string(), AgentRecord::lost("gamma")),
        ])
    }

    #[test]
    fn test_format_run_rows() {
        colored::control::set_override(false);
        let table = ConsoleFormatter::format_run(&result());
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("AGENT"));
        assert!(lines[1].starts_with("alpha"));
        assert!(lines[1].contains("ok"));
        assert!(lines[1].ends_with("load average: 0.10"));
        assert!(lines[2].contains("Command exited with code 2"));
        assert!(lines[3].contains("lost"));
    }

    #[test]
    fn test_samples_summarized() {
        let record = AgentRecord::ok("a").with_field("samples", serde_json::json!([[1.0, 2.0]]));
        assert_eq!(ConsoleFormatter::summary(&record), "1 sample(s)");
    }

    #[test]
    fn test_format_outcome_counts_failures() {
        colored::control::set_override(false);
        let mut outcome = ScenarioOutcome::default();
        outcome.push(IterationRecord::new("uptime", 3, result()));

        let text = ConsoleFormatter::format_outcome(&outcome);
        assert!(text.contains("uptime (concurrency 3)"));
        assert!(text.contains("2 agent record(s) failed"));
    }

    #[test]
    fn test_render_json() {
        let mut outcome = ScenarioOutcome::default();
        outcome.push(IterationRecord::new("uptime", 1, result()));

        let json = ConsoleFormatter::render(&outcome, OutputFormat::Json);
        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["iterations"][0]["agents"]["beta"]["status"], "error");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }
}
