//! Host summary gathered in-process with `sysinfo`.
//!
//! This is the first section of every report, so support staff get the
//! basics even when none of the external utilities are installed.

use sysinfo::{Components, System};

/// Snapshot of the host rendered at the top of the report.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemSummary {
    pub os: String,
    pub kernel_version: String,
    pub arch: String,
    pub hostname: String,
    pub uptime: u64,
    pub cpu_brand: String,
    pub physical_cores: usize,
    pub logical_cores: usize,
    pub total_ram: u64,
    pub used_ram: u64,
    pub total_swap: u64,
    pub used_swap: u64,
    pub sensors: Vec<SensorReading>,
}

/// One temperature component.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub label: String,
    pub temperature: f32,
    pub critical: Option<f32>,
}

impl SystemSummary {
    /// Collect the summary from the running system.
    pub fn collect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        let cpus = sys.cpus();
        let cpu_brand = cpus
            .first()
            .map(|c| c.brand().trim().to_string())
            .unwrap_or_default();

        let sensors = Components::new_with_refreshed_list()
            .iter()
            .map(|comp| SensorReading {
                label: comp.label().to_string(),
                temperature: comp.temperature(),
                critical: comp.critical(),
            })
            .collect();

        Self {
            os: System::long_os_version().unwrap_or_else(|| "Unknown".to_string()),
            kernel_version: System::kernel_version().unwrap_or_else(|| "Unknown".to_string()),
            arch: std::env::consts::ARCH.to_string(),
            hostname: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
            uptime: System::uptime(),
            cpu_brand,
            physical_cores: sys.physical_core_count().unwrap_or(0),
            logical_cores: cpus.len(),
            total_ram: sys.total_memory(),
            used_ram: sys.used_memory(),
            total_swap: sys.total_swap(),
            used_swap: sys.used_swap(),
            sensors,
        }
    }

    /// Render as report section text.
    pub fn render(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("OS: {}\n", self.os));
        output.push_str(&format!("Kernel: {}\n", self.kernel_version));
        output.push_str(&format!("Architecture: {}\n", self.arch));
        output.push_str(&format!("Hostname: {}\n", self.hostname));
        output.push_str(&format!("Uptime: {}\n", format_uptime(self.uptime)));
        output.push_str(&format!(
            "CPU: {} ({} physical / {} logical cores)\n",
            self.cpu_brand, self.physical_cores, self.logical_cores
        ));
        output.push_str(&format!(
            "Memory: {} used of {}\n",
            format_bytes(self.used_ram),
            format_bytes(self.total_ram)
        ));
        if self.total_swap > 0 {
            output.push_str(&format!(
                "Swap: {} used of {}\n",
                format_bytes(self.used_swap),
                format_bytes(self.total_swap)
            ));
        }

        if !self.sensors.is_empty() {
            output.push_str("Temperatures:\n");
            for sensor in &self.sensors {
                output.push_str(&format!("  {}: {:.1}°C", sensor.label, sensor.temperature));
                if let Some(critical) = sensor.critical {
                    output.push_str(&format!(" (critical: {:.1}°C)", critical));
                }
                output.push('\n');
            }
        }

        output
    }
}

/// Format bytes into a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format duration from seconds into a human-readable string.
pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if days > 0 {
        format!("{}d {}h {}m {}s", days, hours, minutes, secs)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}
