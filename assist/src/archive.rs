//! Archive membership and packaging.
//!
//! The member set is a pure function of the session files, the presence
//! flags and the configured log paths. [`ArchivePlan::build`] writes the
//! members into a gzip-compressed tarball.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::{MetadataExt, OpenOptionsExt};
use std::path::{Component, Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::AssistConfig;
use crate::error::{Error, Result};
use crate::report::create_fresh;
use crate::session::{Operator, PresenceFlags, SessionPaths};

/// What kind of source a member is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// A file produced by this session; stored by file name.
    Intermediate,
    /// A system log that is normally present; skipped if absent.
    SystemLog,
    /// A directory of logs; rotated `*.gz` files are left out.
    LogDirectory,
    /// An optional log file.
    OptionalLog,
}

/// One source path and where it lands in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    pub source: PathBuf,
    pub name: PathBuf,
    pub kind: MemberKind,
}

impl ArchiveMember {
    fn intermediate(source: &Path) -> Self {
        let name = source
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| source.to_path_buf());
        Self {
            source: source.to_path_buf(),
            name,
            kind: MemberKind::Intermediate,
        }
    }

    fn system(source: &Path, kind: MemberKind) -> Self {
        Self {
            source: source.to_path_buf(),
            name: archive_name(source),
            kind,
        }
    }
}

/// Path inside the archive for an absolute system path: the path without
/// its root, as `tar` stores it.
pub fn archive_name(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .collect()
}

/// The members to archive for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePlan {
    pub members: Vec<ArchiveMember>,
}

impl ArchivePlan {
    /// Intermediate files and system logs always; the display-manager log
    /// directory and X server log only when present.
    pub fn new(paths: &SessionPaths, presence: PresenceFlags, config: &AssistConfig) -> Self {
        let mut members: Vec<ArchiveMember> = paths
            .intermediates()
            .iter()
            .map(|p| ArchiveMember::intermediate(p))
            .collect();

        members.extend(
            config
                .system_logs
                .iter()
                .map(|p| ArchiveMember::system(p, MemberKind::SystemLog)),
        );

        if presence.display_manager_logs {
            members.push(ArchiveMember::system(
                &config.display_manager_log_dir,
                MemberKind::LogDirectory,
            ));
        }
        if presence.xorg_log {
            members.push(ArchiveMember::system(&config.xorg_log, MemberKind::OptionalLog));
        }

        Self { members }
    }

    /// Write the archive to `dest`, replacing whatever entry was there.
    ///
    /// Each member is stored with the size it had when it was opened, so a
    /// log that grows or shrinks meanwhile cannot desynchronize the tar
    /// stream.
    pub fn build(&self, dest: &Path) -> Result<FinalArchive> {
        let archive_err = |reason: String| Error::ArchiveError {
            path: dest.display().to_string(),
            reason,
        };
        let member_err =
            |source: &Path, e: io::Error| archive_err(format!("{}: {}", source.display(), e));

        let file = create_fresh(dest).map_err(|e| Error::io(dest, e))?;
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let mut stored = Vec::new();

        for member in &self.members {
            match member.kind {
                MemberKind::Intermediate => {
                    open_no_follow(&member.source)
                        .and_then(|f| append_frozen(&mut builder, f, &member.name))
                        .map_err(|e| member_err(&member.source, e))?;
                    stored.push(member.name.clone());
                }
                MemberKind::SystemLog | MemberKind::OptionalLog => {
                    if !member.source.is_file() {
                        warn!(path = %member.source.display(), "Log not found, not archived");
                        continue;
                    }
                    File::open(&member.source)
                        .and_then(|f| append_frozen(&mut builder, f, &member.name))
                        .map_err(|e| member_err(&member.source, e))?;
                    stored.push(member.name.clone());
                }
                MemberKind::LogDirectory => {
                    for path in log_directory_files(&member.source) {
                        let name = archive_name(&path);
                        File::open(&path)
                            .and_then(|f| append_frozen(&mut builder, f, &name))
                            .map_err(|e| member_err(&path, e))?;
                        stored.push(name);
                    }
                }
            }
        }

        let encoder = builder
            .into_inner()
            .map_err(|e| archive_err(e.to_string()))?;
        encoder.finish().map_err(|e| archive_err(e.to_string()))?;

        debug!(path = %dest.display(), members = stored.len(), "Archive written");
        Ok(FinalArchive {
            path: dest.to_path_buf(),
            members: stored,
        })
    }
}

fn open_no_follow(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_NOFOLLOW)
        .open(path)
}

/// Append `file` as `name` with exactly the length it had at open time.
/// Bytes written after that are dropped; a file that shrank is padded with
/// zeros.
fn append_frozen<W: Write>(
    builder: &mut tar::Builder<W>,
    file: File,
    name: &Path,
) -> io::Result<()> {
    let metadata = file.metadata()?;
    let len = metadata.len();

    let mut header = tar::Header::new_gnu();
    header.set_metadata(&metadata);
    header.set_size(len);

    let contents = file.take(len).chain(io::repeat(0)).take(len);
    builder.append_data(&mut header, name, contents)
}

/// Regular files under `dir`, excluding compressed rotated logs.
pub fn log_directory_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().map_or(true, |ext| ext != "gz"))
        .collect();
    files.sort();
    files
}

/// A finished archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalArchive {
    pub path: PathBuf,
    /// Entry names written, in order.
    pub members: Vec<PathBuf>,
}

impl FinalArchive {
    /// Give ownership of the archive to the operator.
    ///
    /// The archive is reopened without following symlinks and must still be
    /// a singly-linked regular file; ownership is changed on that handle.
    pub fn hand_over(&self, operator: &Operator) -> Result<()> {
        let file = open_no_follow(&self.path).map_err(|e| Error::io(&self.path, e))?;
        let metadata = file.metadata().map_err(|e| Error::io(&self.path, e))?;
        if !metadata.is_file() || metadata.nlink() != 1 {
            return Err(Error::ArchiveError {
                path: self.path.display().to_string(),
                reason: "archive was replaced before ownership could be changed".to_string(),
            });
        }

        std::os::unix::fs::fchown(&file, Some(operator.uid), Some(operator.gid))
            .map_err(|e| Error::io(&self.path, e))
    }
}
