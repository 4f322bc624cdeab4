//! Removal of intermediate files on failure or interruption.
//!
//! Every file the session creates is tracked here until it has been safely
//! archived. Dropping the owning [`PurgeGuard`] or receiving SIGINT/SIGTERM
//! removes whatever is still tracked.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, info, warn};

/// Shared list of files to delete if the session does not complete.
#[derive(Debug, Clone, Default)]
pub struct CleanupRegistry {
    paths: Arc<Mutex<Vec<PathBuf>>>,
}

impl CleanupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PathBuf>> {
        self.paths.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start tracking `path`.
    pub fn track(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let mut paths = self.lock();
        if !paths.contains(&path) {
            paths.push(path);
        }
    }

    /// Stop tracking `path`; it will survive a purge.
    pub fn release(&self, path: &Path) {
        self.lock().retain(|p| p != path);
    }

    /// Paths currently tracked.
    pub fn tracked(&self) -> Vec<PathBuf> {
        self.lock().clone()
    }

    /// Delete every tracked path and forget them. Returns how many files
    /// were removed.
    pub fn purge(&self) -> usize {
        let paths: Vec<PathBuf> = self.lock().drain(..).collect();
        let mut removed = 0;

        for path in paths {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    debug!(path = %path.display(), "Removed intermediate file");
                    removed += 1;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove file"),
            }
        }

        removed
    }

    /// Guard that purges this registry when dropped.
    pub fn guard(&self) -> PurgeGuard {
        PurgeGuard {
            registry: self.clone(),
        }
    }
}

/// Purges its registry on drop.
#[derive(Debug)]
pub struct PurgeGuard {
    registry: CleanupRegistry,
}

impl PurgeGuard {
    pub fn registry(&self) -> &CleanupRegistry {
        &self.registry
    }
}

impl Drop for PurgeGuard {
    fn drop(&mut self) {
        let removed = self.registry.purge();
        if removed > 0 {
            info!(removed, "Cleaned up intermediate files");
        }
    }
}

/// What to tell the operator after a signal. `pending` is whether any
/// session files were still tracked, i.e. the archive was not finished.
pub fn interruption_notice(pending: bool) -> &'static str {
    if pending {
        "Interrupted; no archive was created."
    } else {
        "Interrupted; the archive had already been created."
    }
}

/// Purge `registry` and exit with status 1 on SIGINT or SIGTERM.
///
/// The signals are awaited on a dedicated thread running a current-thread
/// tokio runtime; the session itself stays synchronous.
pub fn install_signal_handler(registry: CleanupRegistry) -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()?;

    // Register before spawning so a signal arriving early is not missed.
    let (mut sigint, mut sigterm) = runtime.block_on(async {
        Ok::<_, std::io::Error>((
            signal(SignalKind::interrupt())?,
            signal(SignalKind::terminate())?,
        ))
    })?;

    std::thread::Builder::new()
        .name("signal-cleanup".to_string())
        .spawn(move || {
            let name = runtime.block_on(async {
                tokio::select! {
                    _ = sigint.recv() => "SIGINT",
                    _ = sigterm.recv() => "SIGTERM",
                }
            });

            let pending = !registry.tracked().is_empty();
            warn!(signal = name, pending, "Interrupted");
            let _ = console::Term::stderr().show_cursor();
            registry.purge();
            eprintln!("\n{}", interruption_notice(pending));
            std::process::exit(1);
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purge_removes_tracked_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a_report.txt");
        let b = dir.path().join("b_hardware.txt");
        std::fs::write(&a, "x").unwrap();
        std::fs::write(&b, "y").unwrap();

        let registry = CleanupRegistry::new();
        registry.track(&a);
        registry.track(&b);

        assert_eq!(registry.purge(), 2);
        assert!(!a.exists());
        assert!(!b.exists());
        assert!(registry.tracked().is_empty());
    }

    #[test]
    fn test_released_file_survives() {
        let dir = tempfile::tempdir().unwrap();
        let keep = dir.path().join("keep.tar.gz");
        std::fs::write(&keep, "x").unwrap();

        let registry = CleanupRegistry::new();
        registry.track(&keep);
        registry.release(&keep);
        registry.purge();

        assert!(keep.exists());
    }

    #[test]
    fn test_guard_purges_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dmesg.txt");
        std::fs::write(&path, "x").unwrap();

        let registry = CleanupRegistry::new();
        {
            let guard = registry.guard();
            guard.registry().track(&path);
        }

        assert!(!path.exists());
    }

    #[test]
    fn test_missing_file_is_ignored() {
        let registry = CleanupRegistry::new();
        registry.track("/nonexistent/troubleshoot/file");
        assert_eq!(registry.purge(), 0);
    }

    #[test]
    fn test_interruption_notice() {
        assert_eq!(interruption_notice(true), "Interrupted; no archive was created.");
        assert!(!interruption_notice(false).contains("no archive"));
    }
}
