//! Progress reporting while a quorum run waits on its agents

use benchfleet_application::ports::progress::QuorumProgressNotifier;
use benchfleet_domain::{AgentStatus, OperationKind};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Reports progress with one indicatif bar per run
pub struct ProgressReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn run_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn run_display_name(kind: OperationKind) -> &'static str {
        match kind {
            OperationKind::Join => "Joining fleet",
            OperationKind::Execute => "Running test",
            OperationKind::Clean => "Releasing fleet",
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn status_mark(status: AgentStatus) -> colored::ColoredString {
    match status {
        AgentStatus::Ok => "v".green(),
        AgentStatus::Error => "x".red(),
        AgentStatus::Lost => "?".yellow(),
        AgentStatus::Interrupted => "-".magenta(),
    }
}

impl QuorumProgressNotifier for ProgressReporter {
    fn on_run_start(&self, kind: OperationKind, total_agents: usize) {
        let pb = ProgressBar::new(total_agents as u64);
        pb.set_style(Self::run_style());
        pb.set_prefix(Self::run_display_name(kind));
        pb.set_message("Waiting for agents...");

        if let Ok(mut bar) = self.bar.lock() {
            *bar = Some(pb);
        }
    }

    fn on_agent_resolved(&self, _kind: OperationKind, agent_id: &str, status: AgentStatus) {
        if let Ok(bar) = self.bar.lock()
            && let Some(pb) = bar.as_ref()
        {
            pb.set_message(format!("{} {}", status_mark(status), agent_id));
            pb.inc(1);
        }
    }

    fn on_run_complete(&self, kind: OperationKind) {
        if let Ok(mut bar) = self.bar.lock()
            && let Some(pb) = bar.take()
        {
            pb.finish_with_message(format!("{} done", kind.as_str().green()));
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl QuorumProgressNotifier for SimpleProgress {
    fn on_run_start(&self, kind: OperationKind, total_agents: usize) {
        println!(
            "{} {} ({} agents)",
            "->".cyan(),
            ProgressReporter::run_display_name(kind).bold(),
            total_agents
        );
    }

    fn on_agent_resolved(&self, _kind: OperationKind, agent_id: &str, status: AgentStatus) {
        if status.is_ok() {
            println!("  {} {}", status_mark(status), agent_id);
        } else {
            println!("  {} {} ({})", status_mark(status), agent_id, status);
        }
    }

    fn on_run_complete(&self, _kind: OperationKind) {
        println!();
    }
}
