//! Network interface detection for the wireless link query.

use regex::Regex;
use tracing::debug;

use crate::config::InterfaceStrategy;
use crate::runner::{CommandRunner, CommandSpec};

/// One interface header line of `ip addr` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    pub index: u32,
    pub name: String,
    /// The line reports a link `state`.
    pub has_state: bool,
}

/// Parse interface index lines such as
/// `3: wlp2s0: <BROADCAST,MULTICAST,UP> mtu 1500 qdisc noqueue state UP`.
/// Indented address lines are ignored.
pub fn parse_links(text: &str) -> Vec<LinkEntry> {
    let line_re = Regex::new(r"^(\d+):\s+([^:@\s]+)(?:@[^:\s]+)?:(.*)$").expect("valid regex");

    text.lines()
        .filter_map(|line| {
            let caps = line_re.captures(line)?;
            let index = caps[1].parse().ok()?;
            Some(LinkEntry {
                index,
                name: caps[2].to_string(),
                has_state: caps[3].contains(" state "),
            })
        })
        .collect()
}

/// The historical heuristic: index 2 is the first adapter after loopback,
/// index 3 (when it reports a state) is preferred as the second adapter.
pub fn select_sequential(links: &[LinkEntry]) -> Option<String> {
    let first = links.iter().find(|l| l.index == 2);
    let second = links.iter().find(|l| l.index == 3 && l.has_state);

    second.or(first).map(|l| l.name.clone())
}

/// Interface names from `iw dev` output, in order.
pub fn parse_wireless(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| line.trim().strip_prefix("Interface "))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Pick the interface to query for wireless link quality.
///
/// `ip_addr` is the `ip addr` text already captured for the report.
pub fn detect_interface(
    runner: &dyn CommandRunner,
    strategy: &InterfaceStrategy,
    ip_addr: &str,
) -> Option<String> {
    let sequential = || select_sequential(&parse_links(ip_addr));

    let chosen = match strategy {
        InterfaceStrategy::Named { name } => Some(name.clone()),
        InterfaceStrategy::SequentialIndex => sequential(),
        InterfaceStrategy::FirstWireless => stdout_of(runner, &CommandSpec::new("iw", ["dev"]))
            .and_then(|text| parse_wireless(&text).into_iter().next())
            .or_else(sequential),
    };

    debug!(?strategy, interface = ?chosen, "Detected network interface");
    chosen
}

fn stdout_of(runner: &dyn CommandRunner, spec: &CommandSpec) -> Option<String> {
    runner
        .run(spec)
        .ok()
        .filter(|o| o.success())
        .map(|o| o.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{CommandOutput, ScriptedRunner};

    const LINKS: &str = "\
1: lo: <LOOPBACK,UP,LOWER_UP> mtu 65536 qdisc noqueue state UNKNOWN group default qlen 1000
    link/loopback 00:00:00:00:00:00 brd 00:00:00:00:00:00
    inet 127.0.0.1/8 scope host lo
2: enp0s31f6: <NO-CARRIER,BROADCAST,MULTICAST,UP> mtu 1500 qdisc fq_codel state DOWN group default qlen 1000
    link/ether 8c:16:45:aa:bb:cc brd ff:ff:ff:ff:ff:ff
3: wlp2s0: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500 qdisc noqueue state UP group default qlen 1000
    link/ether 7c:2a:31:dd:ee:ff brd ff:ff:ff:ff:ff:ff
    inet 192.168.1.23/24 brd 192.168.1.255 scope global dynamic wlp2s0
";

    #[test]
    fn test_parse_links() {
        let links = parse_links(LINKS);
        assert_eq!(links.len(), 3);
        assert_eq!(links[1].name, "enp0s31f6");
        assert!(links[2].has_state);
    }

    #[test]
    fn test_parse_links_strips_peer_suffix() {
        let links = parse_links("7: veth12ab@if6: <BROADCAST> mtu 1500 state UP\n");
        assert_eq!(links[0].name, "veth12ab");
    }

    #[test]
    fn test_second_interface_preferred() {
        assert_eq!(select_sequential(&parse_links(LINKS)), Some("wlp2s0".to_string()));
    }

    #[test]
    fn test_falls_back_to_first_interface() {
        let text = "1: lo: <LOOPBACK> state UNKNOWN\n2: eth0: <BROADCAST> state UP\n";
        assert_eq!(select_sequential(&parse_links(text)), Some("eth0".to_string()));
    }

    #[test]
    fn test_no_interface_after_loopback() {
        let text = "1: lo: <LOOPBACK> state UNKNOWN\n";
        assert_eq!(select_sequential(&parse_links(text)), None);
    }

    #[test]
    fn test_first_wireless_strategy() {
        let runner = ScriptedRunner::new().respond(
            "iw dev",
            CommandOutput::ok("phy#0\n\tInterface wlan0\n\t\tifindex 3\n"),
        );
        let iface = detect_interface(&runner, &InterfaceStrategy::FirstWireless, LINKS);
        assert_eq!(iface, Some("wlan0".to_string()));
    }

    #[test]
    fn test_first_wireless_falls_back_to_sequential() {
        let runner = ScriptedRunner::new();
        let iface = detect_interface(&runner, &InterfaceStrategy::FirstWireless, LINKS);
        assert_eq!(iface, Some("wlp2s0".to_string()));
        assert_eq!(runner.command_lines(), vec!["iw dev"]);
    }

    #[test]
    fn test_sequential_uses_captured_text_only() {
        let runner = ScriptedRunner::new();
        let iface = detect_interface(&runner, &InterfaceStrategy::SequentialIndex, LINKS);
        assert_eq!(iface, Some("wlp2s0".to_string()));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_named_strategy_runs_nothing() {
        let runner = ScriptedRunner::new();
        let strategy = InterfaceStrategy::Named {
            name: "wlp3s0".to_string(),
        };
        assert_eq!(detect_interface(&runner, &strategy, ""), Some("wlp3s0".to_string()));
        assert!(runner.calls().is_empty());
    }
}
