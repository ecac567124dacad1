//! Local process execution.
//!
//! Provides [`LocalCommandRunner`], the [`CommandRunner`] used by agents and
//! by the in-process quorum.
//!
//! [`CommandRunner`]: benchfleet_application::ports::command_runner::CommandRunner

mod runner;

pub use runner::LocalCommandRunner;
