//! Command descriptors handed to agents inside `execute` directives.

use serde::{Deserialize, Serialize};

/// How the agent should interpret [`Command::data`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    /// A single command line
    Program,
    /// A multi-line shell script
    Script,
}

/// Command to run on an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    #[serde(rename = "type")]
    pub kind: CommandKind,
    pub data: String,
}

impl Command {
    pub fn program(data: impl Into<String>) -> Self {
        Self {
            kind: CommandKind::Program,
            data: data.into(),
        }
    }

    pub fn script(data: impl Into<String>) -> Self {
        Self {
            kind: CommandKind::Script,
            data: data.into(),
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            CommandKind::Program => write!(f, "{}", self.data),
            CommandKind::Script => write!(f, "<script, {} lines>", self.data.lines().count()),
        }
    }
}
