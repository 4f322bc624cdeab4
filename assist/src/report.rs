//! Report files and the section assembler.
//!
//! A [`ReportFile`] is an append-only sequence of labelled sections backed
//! by a file on disk. The [`Assembler`] runs one diagnostic command per
//! section and appends whatever came back, including failures.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::runner::{CommandRunner, CommandSpec};

/// Text recorded when a program is not present on the machine.
pub const NOT_INSTALLED: &str = "not installed";

/// An append-only report file.
#[derive(Debug)]
pub struct ReportFile {
    path: PathBuf,
    file: File,
    sections: Vec<String>,
}

impl ReportFile {
    /// Create an empty report at `path`, replacing whatever entry was there.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = create_fresh(&path).map_err(|e| Error::io(&path, e))?;
        Ok(Self {
            path,
            file,
            sections: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Labels of the sections appended so far, in order.
    pub fn labels(&self) -> &[String] {
        &self.sections
    }

    /// Append free-form text without a section heading.
    pub fn append_raw(&mut self, text: &str) -> io::Result<()> {
        self.file.write_all(text.as_bytes())
    }

    /// Append a labelled section. `command` is shown under the heading when
    /// given.
    pub fn append_section(
        &mut self,
        label: &str,
        command: Option<&str>,
        body: &str,
    ) -> io::Result<()> {
        let mut text = format!("===== {} =====\n", label);
        if let Some(cmd) = command {
            text.push_str(&format!("$ {}\n", cmd));
        }
        text.push_str(body);
        if !body.ends_with('\n') {
            text.push('\n');
        }
        text.push('\n');

        self.append_raw(&text)?;
        self.sections.push(label.to_string());
        Ok(())
    }
}

/// Create `path` as a new regular file owned by this process.
///
/// An existing entry is unlinked first and the file is opened with
/// `O_EXCL`, so a planted symlink or hard link is never written through.
pub(crate) fn create_fresh(path: &Path) -> io::Result<File> {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    OpenOptions::new()
        .write(true)
        .create_new(true)
        .custom_flags(libc::O_NOFOLLOW)
        .open(path)
}

/// Render the outcome of running `spec` as section text. Never fails.
pub fn capture(runner: &dyn CommandRunner, spec: &CommandSpec) -> String {
    match runner.run(spec) {
        Ok(output) => {
            let mut text = spec.filter(output.combined());
            if !output.success() {
                if !text.is_empty() && !text.ends_with('\n') {
                    text.push('\n');
                }
                match output.status {
                    Some(code) => text.push_str(&format!("[exit status {}]\n", code)),
                    None => text.push_str("[terminated by signal]\n"),
                }
            }
            text
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            format!("{}: {}\n", spec.program, NOT_INSTALLED)
        }
        Err(e) => format!("{}: failed to run ({})\n", spec.program, e),
    }
}

/// Appends command output to report files.
pub struct Assembler<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> Assembler<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &'a dyn CommandRunner {
        self.runner
    }

    /// Run `spec` and append its output under `label`. Returns the text
    /// that was recorded.
    ///
    /// Command failures become report text. A failure to write the report
    /// itself is logged and the session carries on.
    pub fn append_section(
        &self,
        report: &mut ReportFile,
        label: &str,
        spec: &CommandSpec,
    ) -> String {
        info!(label, command = %spec, "Collecting section");
        let body = capture(self.runner, spec);
        let command_line = spec.to_string();
        self.append_text(report, label, Some(&command_line), &body);
        body
    }

    /// Append precomputed text under `label`.
    pub fn append_text(
        &self,
        report: &mut ReportFile,
        label: &str,
        command: Option<&str>,
        body: &str,
    ) {
        if let Err(e) = report.append_section(label, command, body) {
            warn!(
                label,
                path = %report.path().display(),
                error = %e,
                "Failed to write report section"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{CommandOutput, ScriptedRunner};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_section_layout() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new().respond("uname -a", CommandOutput::ok("Linux box 6.1\n"));
        let mut report = ReportFile::create(dir.path().join("report.txt")).unwrap();

        Assembler::new(&runner).append_section(
            &mut report,
            "Kernel",
            &CommandSpec::new("uname", ["-a"]),
        );

        let text = std::fs::read_to_string(report.path()).unwrap();
        assert_eq!(text, "===== Kernel =====\n$ uname -a\nLinux box 6.1\n\n");
        assert_eq!(report.labels().to_vec(), vec!["Kernel".to_string()]);
    }

    #[test]
    fn test_missing_program_records_placeholder() {
        let runner = ScriptedRunner::new();
        let body = capture(&runner, &CommandSpec::new("sensors", Vec::<String>::new()));
        assert_eq!(body, "sensors: not installed\n");
    }

    #[test]
    fn test_nonzero_exit_keeps_output() {
        let runner = ScriptedRunner::new().respond(
            "dpkg -s tlp",
            CommandOutput::failed(1, "package 'tlp' is not installed\n"),
        );
        let body = capture(&runner, &CommandSpec::new("dpkg", ["-s", "tlp"]));
        assert_eq!(body, "package 'tlp' is not installed\n[exit status 1]\n");
    }

    #[test]
    fn test_head_filter_applies() {
        let runner = ScriptedRunner::new().respond("ps", CommandOutput::ok("h\n1\n2\n3\n"));
        let body = capture(&runner, &CommandSpec::new("ps", Vec::<String>::new()).head(2));
        assert_eq!(body, "h\n1\n");
    }

    #[test]
    fn test_create_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        std::fs::write(&path, "stale").unwrap();

        let report = ReportFile::create(&path).unwrap();
        assert!(report.labels().is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_create_replaces_planted_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("important.conf");
        std::fs::write(&target, "IMPORTANT").unwrap();
        let path = dir.path().join("alice-Mon-2026-10-19_report.txt");
        std::os::unix::fs::symlink(&target, &path).unwrap();

        let mut report = ReportFile::create(&path).unwrap();
        report.append_raw("report body\n").unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "IMPORTANT");
        assert!(!std::fs::symlink_metadata(&path).unwrap().file_type().is_symlink());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "report body\n");
    }

    #[test]
    fn test_append_section_returns_recorded_text() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new().respond("ip addr", CommandOutput::ok("1: lo: <LOOPBACK>\n"));
        let mut report = ReportFile::create(dir.path().join("report.txt")).unwrap();

        let body = Assembler::new(&runner).append_section(
            &mut report,
            "Network interfaces",
            &CommandSpec::new("ip", ["addr"]),
        );
        assert_eq!(body, "1: lo: <LOOPBACK>\n");
    }
}
