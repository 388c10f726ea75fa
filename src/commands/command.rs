use std::{fmt, str::FromStr};

use crate::error::CommandError;

/// One operator command, parsed from a single input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Stop in-flight work and wait for every stage to drain.
    Start,
    /// Seed the upgrade batch onto the entry stage.
    Transfer,
    /// Wait for the pipeline to drain and report whether anything completed.
    Query,
}

impl Command {
    /// Stable lowercase name, identical to the accepted input.
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Transfer => "transfer",
            Command::Query => "query",
        }
    }

    /// Parses one input line. Blank lines yield `Ok(None)`.
    pub fn parse_line(line: &str) -> Result<Option<Command>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        line.parse().map(Some)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "start" => Ok(Command::Start),
            "transfer" => Ok(Command::Transfer),
            "query" => Ok(Command::Query),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}
