//! External command execution.
//!
//! Every diagnostic utility is run through [`CommandRunner`] so the report
//! assembler can be driven by a scripted runner in tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::process::Command;

use tracing::debug;

/// A single external command: program, arguments and an optional output
/// filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Keep only the first `n` lines of output.
    pub head: Option<usize>,
}

impl CommandSpec {
    /// Create a command with the given program and arguments.
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            head: None,
        }
    }

    /// Limit the captured output to the first `lines` lines.
    pub fn head(mut self, lines: usize) -> Self {
        self.head = Some(lines);
        self
    }

    /// Apply the output filter to captured text.
    pub fn filter(&self, text: String) -> String {
        match self.head {
            Some(n) => {
                let mut kept: String = text
                    .lines()
                    .take(n)
                    .collect::<Vec<_>>()
                    .join("\n");
                if !kept.is_empty() {
                    kept.push('\n');
                }
                kept
            }
            None => text,
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a command that was spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Stdout followed by stderr.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&self.stderr);
        }
        text
    }
}

/// Runs external programs.
pub trait CommandRunner {
    /// Run `spec` to completion. An `Err` means the program could not be
    /// spawned at all; a non-zero exit is still `Ok`.
    fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput>;
}

/// Runs commands on the host with [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
        debug!(command = %spec, "Running command");

        let output = Command::new(&spec.program).args(&spec.args).output()?;

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Replays canned outputs keyed by command line and records every call.
///
/// Commands without a canned response fail as if the program were not
/// installed.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    responses: HashMap<String, CommandOutput>,
    calls: RefCell<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `command_line` (as rendered by [`CommandSpec`]'s `Display`)
    /// with `output`.
    pub fn respond(mut self, command_line: &str, output: CommandOutput) -> Self {
        self.responses.insert(command_line.to_string(), output);
        self
    }

    /// Every command run so far, in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }

    /// Every command line run so far, in order.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.to_string()).collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
        self.calls.borrow_mut().push(spec.clone());
        self.responses
            .get(&spec.to_string())
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such program"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_joins_args() {
        let spec = CommandSpec::new("iptables", ["-L", "-n", "-v"]);
        assert_eq!(spec.to_string(), "iptables -L -n -v");
    }

    #[test]
    fn test_head_filter() {
        let spec = CommandSpec::new("ps", Vec::<String>::new()).head(2);
        assert_eq!(spec.filter("a\nb\nc\n".to_string()), "a\nb\n");
        assert_eq!(spec.filter(String::new()), "");
    }

    #[test]
    fn test_combined_output() {
        let out = CommandOutput {
            status: Some(1),
            stdout: "partial".to_string(),
            stderr: "boom\n".to_string(),
        };
        assert_eq!(out.combined(), "partial\nboom\n");
        assert!(!out.success());
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let spec = CommandSpec::new("definitely-not-a-real-program-xyz", Vec::<String>::new());
        let err = SystemRunner.run(&spec).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
