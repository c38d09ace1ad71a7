//! Local application launching
//!
//! Launches are fire-and-forget: the child is never awaited by the caller and
//! its exit status is ignored.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::registry::ApplicationRegistry;
use crate::{Error, Result};

/// Starts OS processes
pub trait Spawner: Send + Sync {
    /// Request the OS start `target` without waiting for it
    ///
    /// # Errors
    ///
    /// Returns error if the process could not be started
    fn spawn(&self, target: &str) -> Result<()>;
}

/// Result of a launch request that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// Spawn requested for the named application
    Opened(String),
    /// The name is not in the registry
    Unknown(String),
}

/// Launch a registered application by name
///
/// # Errors
///
/// Returns [`Error::Launch`] if the spawn request fails
pub fn launch(
    app: &str,
    registry: &ApplicationRegistry,
    spawner: &dyn Spawner,
) -> Result<LaunchOutcome> {
    let app = app.to_lowercase();
    let Some(target) = registry.target(&app) else {
        tracing::warn!(app, "application not in registry");
        return Ok(LaunchOutcome::Unknown(app));
    };

    tracing::info!(app, target, "launching application");
    spawner.spawn(target)?;
    Ok(LaunchOutcome::Opened(app))
}

/// Spawns real processes on the host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSpawner;

impl Spawner for SystemSpawner {
    fn spawn(&self, target: &str) -> Result<()> {
        let (program, args) = resolve(target)?;

        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Launch(e.to_string()))?;

        let pid = child.id();
        tracing::debug!(pid, program = %program.display(), "process spawned");

        // Reap in the background so the child never lingers as a zombie
        std::thread::spawn(move || {
            let _ = child.wait();
        });

        Ok(())
    }
}

/// Split a registry target into a program and its arguments
///
/// A target naming an existing path is used as-is (paths may contain
/// spaces); otherwise the first word is looked up on `PATH`.
fn resolve(target: &str) -> Result<(PathBuf, Vec<String>)> {
    let target = target.trim();
    if target.is_empty() {
        return Err(Error::Launch("empty launch target".to_string()));
    }

    let path = Path::new(target);
    if path.exists() {
        return Ok(bundle_or_program(path));
    }

    let mut words = target.split_whitespace();
    let program = words.next().unwrap_or(target);
    let args = words.map(ToString::to_string).collect();

    let resolved = which::which(program)
        .map_err(|e| Error::Launch(format!("{program}: {e}")))?;

    Ok((resolved, args))
}

#[cfg(target_os = "macos")]
fn bundle_or_program(path: &Path) -> (PathBuf, Vec<String>) {
    if path.extension().is_some_and(|ext| ext == "app") {
        (
            PathBuf::from("open"),
            vec!["-a".to_string(), path.display().to_string()],
        )
    } else {
        (path.to_path_buf(), Vec::new())
    }
}

#[cfg(not(target_os = "macos"))]
fn bundle_or_program(path: &Path) -> (PathBuf, Vec<String>) {
    (path.to_path_buf(), Vec::new())
}
