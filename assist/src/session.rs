//! One troubleshooting run: who invoked it, where its files live, and which
//! optional log sources this machine has.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, info};
use users::os::unix::UserExt;
use uuid::Uuid;

use crate::archive::{ArchivePlan, FinalArchive};
use crate::cleanup::{CleanupRegistry, PurgeGuard};
use crate::collectors::{self, Category, SystemSummary};
use crate::config::AssistConfig;
use crate::error::{Error, Result};
use crate::report::{Assembler, ReportFile};
use crate::runner::CommandRunner;

/// Check if running as root.
pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Fail with [`Error::NotRoot`] unless running as root.
pub fn require_root() -> Result<()> {
    if is_root() {
        Ok(())
    } else {
        Err(Error::NotRoot)
    }
}

/// The (usually non-root) user the archive is handed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    pub home: PathBuf,
}

impl Operator {
    /// Resolve the invoking user: `SUDO_USER` when run through sudo,
    /// otherwise the current user.
    pub fn detect() -> Result<Self> {
        let name = std::env::var("SUDO_USER")
            .ok()
            .filter(|n| !n.is_empty())
            .or_else(|| users::get_current_username().map(|n| n.to_string_lossy().to_string()))
            .ok_or_else(|| Error::UnknownUser("cannot determine invoking user".to_string()))?;

        Self::by_name(&name)
    }

    /// Look up a user in the password database.
    pub fn by_name(name: &str) -> Result<Self> {
        let user = users::get_user_by_name(name)
            .ok_or_else(|| Error::UnknownUser(name.to_string()))?;

        Ok(Self {
            name: name.to_string(),
            uid: user.uid(),
            gid: user.primary_group_id(),
            home: user.home_dir().to_path_buf(),
        })
    }
}

/// Which optional log sources exist on this machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PresenceFlags {
    pub display_manager_logs: bool,
    pub xorg_log: bool,
}

impl PresenceFlags {
    /// Check the configured optional paths.
    pub fn detect(config: &AssistConfig) -> Self {
        Self {
            display_manager_logs: config.display_manager_log_dir.is_dir(),
            xorg_log: config.xorg_log.is_file(),
        }
    }
}

/// True when no graphical session is visible to the process.
pub fn detect_headless() -> bool {
    let set = |var: &str| std::env::var_os(var).map_or(false, |v| !v.is_empty());
    !set("DISPLAY") && !set("WAYLAND_DISPLAY")
}

/// `<user>-<weekday>-<date>`, e.g. `alice-Mon-2026-10-19`.
pub fn file_prefix(user: &str, when: &DateTime<Local>) -> String {
    format!("{}-{}", user, when.format("%a-%Y-%m-%d"))
}

/// Names of the files a session produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPaths {
    pub report: PathBuf,
    pub hardware: PathBuf,
    pub kernel: PathBuf,
    pub archive: PathBuf,
}

impl SessionPaths {
    pub fn new(dir: &Path, prefix: &str) -> Self {
        Self {
            report: dir.join(format!("{}_report.txt", prefix)),
            hardware: dir.join(format!("{}_hardware.txt", prefix)),
            kernel: dir.join(format!("{}_dmesg.txt", prefix)),
            archive: dir.join(format!("{}_troubleshooting.tar.gz", prefix)),
        }
    }

    /// The report, hardware and kernel files, in archive order.
    pub fn intermediates(&self) -> [&Path; 3] {
        [&self.report, &self.hardware, &self.kernel]
    }
}

/// Everything needed to open a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub operator: Operator,
    pub config: AssistConfig,
    pub headless: bool,
    pub started: DateTime<Local>,
}

impl SessionOptions {
    /// Options for the current invocation.
    pub fn detect(config: AssistConfig) -> Result<Self> {
        Ok(Self {
            operator: Operator::detect()?,
            config,
            headless: detect_headless(),
            started: Local::now(),
        })
    }

    /// Where files are written: the configured directory or the operator's
    /// home.
    pub fn output_dir(&self) -> PathBuf {
        self.config
            .output_dir
            .clone()
            .unwrap_or_else(|| self.operator.home.clone())
    }
}

/// An open troubleshooting session.
///
/// Dropping a session that was never finalized removes its intermediate
/// files.
pub struct Session<'r> {
    id: Uuid,
    operator: Operator,
    prefix: String,
    paths: SessionPaths,
    presence: PresenceFlags,
    headless: bool,
    skipped: bool,
    gathered: Vec<Category>,
    config: AssistConfig,
    runner: &'r dyn CommandRunner,
    report: ReportFile,
    hardware: ReportFile,
    kernel: ReportFile,
    guard: PurgeGuard,
}

impl<'r> Session<'r> {
    /// Create the intermediate files and detect optional log sources.
    ///
    /// Files are registered with `registry` as soon as they exist.
    pub fn open(
        options: SessionOptions,
        runner: &'r dyn CommandRunner,
        registry: &CleanupRegistry,
    ) -> Result<Self> {
        let dir = options.output_dir();
        let SessionOptions {
            operator,
            config,
            headless,
            started,
        } = options;

        std::fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

        let prefix = file_prefix(&operator.name, &started);
        let paths = SessionPaths::new(&dir, &prefix);
        let guard = registry.guard();

        registry.track(&paths.report);
        let report = ReportFile::create(&paths.report)?;
        registry.track(&paths.hardware);
        let hardware = ReportFile::create(&paths.hardware)?;
        registry.track(&paths.kernel);
        let kernel = ReportFile::create(&paths.kernel)?;

        let presence = PresenceFlags::detect(&config);
        debug!(?presence, headless, "Session environment detected");
        info!(prefix = %prefix, dir = %dir.display(), "Opened session");

        Ok(Self {
            id: Uuid::new_v4(),
            operator,
            prefix,
            paths,
            presence,
            headless,
            skipped: false,
            gathered: Vec::new(),
            config,
            runner,
            report,
            hardware,
            kernel,
            guard,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn paths(&self) -> &SessionPaths {
        &self.paths
    }

    pub fn presence(&self) -> PresenceFlags {
        self.presence
    }

    /// Override detected presence flags.
    pub fn set_presence(&mut self, presence: PresenceFlags) {
        self.presence = presence;
    }

    pub fn is_headless(&self) -> bool {
        self.headless
    }

    pub fn skipped(&self) -> bool {
        self.skipped
    }

    pub fn mark_skipped(&mut self) {
        self.skipped = true;
    }

    /// Categories gathered so far, in order.
    pub fn gathered(&self) -> &[Category] {
        &self.gathered
    }

    pub fn config(&self) -> &AssistConfig {
        &self.config
    }

    pub fn report(&self) -> &ReportFile {
        &self.report
    }

    /// Write the report header and the base collection.
    pub fn collect_base(&mut self, summary: &SystemSummary) {
        let header = self.header();
        if let Err(e) = self.report.append_raw(&header) {
            tracing::warn!(error = %e, "Failed to write report header");
        }

        let assembler = Assembler::new(self.runner);
        collectors::collect_base(
            &assembler,
            summary,
            &mut self.report,
            &mut self.hardware,
            &mut self.kernel,
        );
    }

    /// Append the bundle for `category`.
    pub fn gather(&mut self, category: Category) {
        info!(%category, "Gathering category");
        let assembler = Assembler::new(self.runner);
        collectors::gather(category, &assembler, &mut self.report, &self.config);
        self.gathered.push(category);
    }

    fn header(&self) -> String {
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| String::from("localhost"));

        let mut output = String::new();
        output.push_str("=== Workstation Troubleshooting Report ===\n\n");
        output.push_str(&format!("Session ID: {}\n", self.id));
        output.push_str(&format!("Generated: {}\n", Local::now().to_rfc3339()));
        output.push_str(&format!("Tool Version: {}\n", env!("CARGO_PKG_VERSION")));
        output.push_str(&format!("Hostname: {}\n", hostname));
        output.push_str(&format!("Operator: {}\n", self.operator.name));
        output.push_str(&format!(
            "Session type: {}\n",
            if self.headless { "headless" } else { "graphical" }
        ));
        output.push('\n');
        output
    }

    /// Build the archive, hand it to the operator and delete the
    /// intermediate files. Consumes the session.
    pub fn finalize(self) -> Result<FinalArchive> {
        let registry = self.guard.registry().clone();
        let plan = ArchivePlan::new(&self.paths, self.presence, &self.config);

        registry.track(&self.paths.archive);
        let archive = plan.build(&self.paths.archive)?;
        archive.hand_over(&self.operator)?;

        for path in self.paths.intermediates() {
            std::fs::remove_file(path).map_err(|e| Error::io(path, e))?;
            registry.release(path);
        }
        registry.release(&self.paths.archive);

        info!(
            archive = %archive.path.display(),
            members = archive.members.len(),
            "Session finalized"
        );
        Ok(archive)
    }
}
