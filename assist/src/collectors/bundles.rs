//! Symptom categories and the fixed command bundle for each.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;

use crate::capability::{Availability, Capabilities, SOCKET_STATS};
use crate::collectors::network::detect_interface;
use crate::config::AssistConfig;
use crate::report::{Assembler, ReportFile};
use crate::runner::CommandSpec;

/// Text recorded when no interface is available for the wireless query.
pub const NO_INTERFACE: &str = "no network interface detected";

/// A symptom category offered by the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Category {
    Battery,
    Storage,
    Networking,
    Temperature,
}

impl Category {
    /// All categories in menu order.
    pub const ALL: [Category; 4] = [
        Category::Battery,
        Category::Storage,
        Category::Networking,
        Category::Temperature,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Battery => "battery",
            Category::Storage => "storage",
            Category::Networking => "networking",
            Category::Temperature => "temperature",
        }
    }

    /// Section labels appended by this category's bundle, in order.
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            Category::Battery => &[
                "Battery information",
                "Battery management package",
                "Battery management service",
            ],
            Category::Storage => &["Filesystem table", "Partitions", "Disk usage"],
            Category::Networking => &[
                "Network interfaces",
                "Socket statistics",
                "Firewall rules",
                "Wireless link quality",
            ],
            Category::Temperature => &["Top CPU processes", "Sensor readings"],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "battery" => Ok(Category::Battery),
            "storage" => Ok(Category::Storage),
            "networking" | "network" => Ok(Category::Networking),
            "temperature" | "temp" => Ok(Category::Temperature),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// Append `category`'s bundle to `report`.
pub fn gather(
    category: Category,
    assembler: &Assembler<'_>,
    report: &mut ReportFile,
    config: &AssistConfig,
) {
    let labels = category.labels();

    match category {
        Category::Battery => {
            let commands = [
                CommandSpec::new("upower", ["-d"]),
                CommandSpec::new("dpkg", ["-s", "tlp"]),
                CommandSpec::new("systemctl", ["status", "tlp", "--no-pager"]),
            ];
            for (label, spec) in labels.iter().zip(&commands) {
                assembler.append_section(report, label, spec);
            }
        }
        Category::Storage => {
            let commands = [
                CommandSpec::new("cat", ["/etc/fstab"]),
                CommandSpec::new("lsblk", ["-o", "NAME,SIZE,TYPE,FSTYPE,MOUNTPOINT"]),
                CommandSpec::new("df", ["-h"]),
            ];
            for (label, spec) in labels.iter().zip(&commands) {
                assembler.append_section(report, label, spec);
            }
        }
        Category::Networking => gather_networking(assembler, report, config),
        Category::Temperature => {
            // Header line plus the configured number of processes.
            let commands = [
                CommandSpec::new("ps", ["-eo", "pid,user,%cpu,%mem,comm", "--sort=-%cpu"])
                    .head(config.top_processes.saturating_add(1)),
                CommandSpec::new("sensors", Vec::<String>::new()),
            ];
            for (label, spec) in labels.iter().zip(&commands) {
                assembler.append_section(report, label, spec);
            }
        }
    }
}

fn gather_networking(assembler: &Assembler<'_>, report: &mut ReportFile, config: &AssistConfig) {
    let runner = assembler.runner();
    let labels = Category::Networking.labels();

    let ip_addr = assembler.append_section(report, labels[0], &CommandSpec::new("ip", ["addr"]));

    let installer = config
        .install_missing
        .then_some(config.install_command.as_slice());
    if Capabilities::new(runner, installer).ensure(SOCKET_STATS) == Availability::Installed {
        tracing::info!(tool = SOCKET_STATS.tool, "Installed socket statistics tool");
    }
    assembler.append_section(report, labels[1], &CommandSpec::new("ss", ["-tulpn"]));

    assembler.append_section(
        report,
        labels[2],
        &CommandSpec::new("iptables", ["-L", "-n", "-v"]),
    );

    match detect_interface(runner, &config.interface_strategy, &ip_addr) {
        Some(iface) => {
            assembler.append_section(
                report,
                labels[3],
                &CommandSpec::new("iw", ["dev", iface.as_str(), "link"]),
            );
        }
        None => assembler.append_text(report, labels[3], None, NO_INTERFACE),
    }
}
