//! Tool availability checks: probe, optionally install, probe again.

use tracing::{info, warn};

use crate::runner::{CommandRunner, CommandSpec};

/// A tool a bundle depends on and the package that provides it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    pub tool: &'static str,
    pub package: &'static str,
}

/// Socket statistics for the networking bundle.
pub const SOCKET_STATS: Capability = Capability {
    tool: "ss",
    package: "iproute2",
};

/// Outcome of [`Capabilities::ensure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// The tool was already installed.
    Present,
    /// The tool was missing and has been installed.
    Installed,
    /// The tool is missing and was not (or could not be) installed.
    Missing,
}

/// Probes for tools and optionally installs the missing ones.
pub struct Capabilities<'a> {
    runner: &'a dyn CommandRunner,
    install_command: Option<&'a [String]>,
}

impl<'a> Capabilities<'a> {
    /// `install_command` is the package-manager invocation used for missing
    /// tools; `None` disables installation.
    pub fn new(runner: &'a dyn CommandRunner, install_command: Option<&'a [String]>) -> Self {
        Self {
            runner,
            install_command,
        }
    }

    /// Check if a tool exists in PATH.
    pub fn probe(&self, tool: &str) -> bool {
        self.runner
            .run(&CommandSpec::new("which", [tool]))
            .map(|o| o.success())
            .unwrap_or(false)
    }

    /// Make sure `cap` is available, installing it when allowed.
    pub fn ensure(&self, cap: Capability) -> Availability {
        if self.probe(cap.tool) {
            return Availability::Present;
        }

        let Some((program, args)) = self.install_command.and_then(|c| c.split_first()) else {
            info!(tool = cap.tool, "Tool not installed, installation disabled");
            return Availability::Missing;
        };

        info!(tool = cap.tool, package = cap.package, "Installing missing tool");
        let mut install_args: Vec<String> = args.to_vec();
        install_args.push(cap.package.to_string());

        match self.runner.run(&CommandSpec::new(program, install_args)) {
            Ok(output) if !output.success() => {
                warn!(package = cap.package, stderr = %output.stderr.trim(), "Install failed");
            }
            Err(e) => warn!(package = cap.package, error = %e, "Could not run installer"),
            Ok(_) => {}
        }

        if self.probe(cap.tool) {
            Availability::Installed
        } else {
            Availability::Missing
        }
    }
}
