//! Diagnostic collectors.
//!
//! The base collection runs once at session start and fills the report,
//! hardware and kernel-message files. Category bundles are appended later
//! as the operator picks symptoms.

pub mod bundles;
pub mod network;
pub mod system;

pub use bundles::{gather, Category};
pub use system::SystemSummary;

use crate::report::{Assembler, ReportFile};
use crate::runner::CommandSpec;

/// Label of the in-process summary section.
pub const SUMMARY_LABEL: &str = "System summary";

/// Sections appended to the report at session start, after the summary.
pub fn base_report_commands() -> Vec<(&'static str, CommandSpec)> {
    vec![
        ("Kernel and architecture", CommandSpec::new("uname", ["-a"])),
        ("Distribution", CommandSpec::new("lsb_release", ["-a"])),
        ("CPU", CommandSpec::new("lscpu", Vec::<String>::new())),
        ("Uptime and load", CommandSpec::new("uptime", Vec::<String>::new())),
        ("Memory", CommandSpec::new("free", ["-h"])),
        ("PCI devices", CommandSpec::new("lspci", Vec::<String>::new())),
        ("USB devices", CommandSpec::new("lsusb", Vec::<String>::new())),
    ]
}

/// Sections written to the hardware inventory file.
pub fn hardware_commands() -> Vec<(&'static str, CommandSpec)> {
    vec![
        ("Hardware listing", CommandSpec::new("lshw", Vec::<String>::new())),
        ("DMI tables", CommandSpec::new("dmidecode", Vec::<String>::new())),
    ]
}

/// The kernel ring buffer dump.
pub fn kernel_command() -> (&'static str, CommandSpec) {
    ("Kernel messages", CommandSpec::new("dmesg", Vec::<String>::new()))
}

/// Fill the three intermediate files with the base collection.
pub fn collect_base(
    assembler: &Assembler<'_>,
    summary: &SystemSummary,
    report: &mut ReportFile,
    hardware: &mut ReportFile,
    kernel: &mut ReportFile,
) {
    assembler.append_text(report, SUMMARY_LABEL, None, &summary.render());
    for (label, spec) in base_report_commands() {
        assembler.append_section(report, label, &spec);
    }

    for (label, spec) in hardware_commands() {
        assembler.append_section(hardware, label, &spec);
    }

    let (label, spec) = kernel_command();
    assembler.append_section(kernel, label, &spec);
}
