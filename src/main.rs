//! Workstation troubleshooting CLI
//!
//! Collects diagnostics into `<user>-<weekday>-<date>_troubleshooting.tar.gz`
//! in the invoking user's home directory.

use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

use assist::{
    cleanup::{install_signal_handler, CleanupRegistry},
    cli::Cli,
    collectors::SystemSummary,
    config::AssistConfig,
    controller::{run_unattended, Controller, Outcome},
    menu::{DialoguerPrompter, LinePrompter, Prompter},
    runner::SystemRunner,
    session::{require_root, Session, SessionOptions},
};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(&cli) {
        eprintln!("{} {:#}", style("error:").red().bold(), err);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    require_root()?;

    let mut config = AssistConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    cli.apply(&mut config);

    let registry = CleanupRegistry::new();
    install_signal_handler(registry.clone()).context("Failed to install signal handler")?;

    let options = SessionOptions::detect(config).context("Failed to identify invoking user")?;
    let runner = SystemRunner;
    let mut session =
        Session::open(options, &runner, &registry).context("Failed to create report files")?;

    if !cli.quiet {
        eprintln!("{}", style("Collecting system diagnostics...").cyan());
    }
    session.collect_base(&SystemSummary::collect());

    let outcome = if cli.unattended() {
        run_unattended(session, &cli.categories)?
    } else {
        let mut prompter = prompter(cli.plain);
        Controller::new(session, prompter.as_mut()).run()?
    };

    if !cli.quiet {
        print_outcome(&outcome);
    }
    Ok(())
}

fn prompter(plain: bool) -> Box<dyn Prompter> {
    if !plain && io::stdin().is_terminal() && io::stderr().is_terminal() {
        Box::new(DialoguerPrompter::new())
    } else {
        Box::new(LinePrompter::new(io::stdin().lock(), io::stderr()))
    }
}

fn print_outcome(outcome: &Outcome) {
    if outcome.skipped {
        eprintln!("No category selected; archiving the base collection only.");
    } else {
        let names: Vec<String> = outcome.gathered.iter().map(|c| c.to_string()).collect();
        eprintln!("Categories collected: {}", names.join(", "));
    }

    eprintln!(
        "{}",
        style(format!("Archive created: {}", outcome.archive.path.display())).green()
    );
    eprintln!("Please send this file to your support contact.");

    if outcome.headless {
        eprintln!(
            "{}",
            style("No graphical session detected: copy the archive to a USB drive to share it.")
                .dim()
        );
    }
}
