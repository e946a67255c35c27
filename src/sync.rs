// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Mirror synchronization.
//!
//! Keeps every configured mirror in sync with its remote source through an
//! external transfer tool. Mirrors are processed one after another in
//! configuration order.
//!
//! # Best-Effort Synchronization
//!
//! A failure to synchronize one mirror never stops the mirrors after it, and
//! nothing is rolled back. A partially synchronized mirror set is an
//! acceptable outcome of any given run, because the next scheduled run will
//! simply try again. Every outcome is collected into a [`SyncReport`] so the
//! caller can summarize the run once all mirrors have been attempted.
//!
//! # Transfer Tool
//!
//! The transfer tool is abstracted behind the [`Synchronizer`] trait. The
//! default implementation, [`Rsync`], calls out to the rsync binary in
//! archive mode and deletes destination files that no longer exist upstream.

use crate::{
    config::{MirrorConfig, MirrorSpec},
    path::with_trailing_slash,
};

use mkdirp::mkdirp;
use std::{
    ffi::{OsStr, OsString},
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
};
use tracing::{debug, info, instrument, warn};

/// Layer of indirection for transfer tool access.
pub trait Synchronizer {
    /// Make local directory mirror remote source.
    ///
    /// Local directory is expected to exist already.
    fn sync(&self, remote: &str, local: &Path, options: &[String]) -> Result<()>;
}

/// Transfer through rsync binary.
#[derive(Debug, Clone)]
pub struct Rsync {
    program: OsString,
}

impl Rsync {
    /// Construct new rsync caller for target binary.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments passed to rsync binary.
    ///
    /// Extra options are placed before the source and destination pair. The
    /// destination always ends with a slash so rsync fills the directory
    /// instead of nesting the remote inside of it.
    pub fn command_args(&self, remote: &str, local: &Path, options: &[String]) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-av".into(), "--delete".into()];
        args.extend(options.iter().map(OsString::from));
        args.push(remote.into());
        args.push(with_trailing_slash(local));

        args
    }
}

impl Default for Rsync {
    fn default() -> Self {
        Self::new("rsync")
    }
}

impl Synchronizer for Rsync {
    #[instrument(skip(self, options), level = "debug")]
    fn sync(&self, remote: &str, local: &Path, options: &[String]) -> Result<()> {
        syscall_interactive(&self.program, self.command_args(remote, local, options))
    }
}

/// Synchronize every configured mirror.
///
/// Mirrors are attempted in configuration order, regardless of whether the
/// mirrors before them succeeded.
pub fn sync_mirrors(config: &MirrorConfig, synchronizer: &impl Synchronizer) -> SyncReport {
    let outcomes = config
        .repos
        .iter()
        .map(|spec| {
            let destination = spec.destination(&config.base_path);
            let result = sync_mirror(spec, &destination, synchronizer);
            match &result {
                Ok(()) => info!("{} synced successfully", spec.name),
                Err(error) => warn!("sync failed for {}: {error}", spec.name),
            }

            SyncOutcome {
                name: spec.name.clone(),
                destination,
                result,
            }
        })
        .collect();

    SyncReport { outcomes }
}

/// Synchronize one mirror into target destination.
///
/// Creates destination directory and any missing parents first.
///
/// # Errors
///
/// - Return [`SyncError::CreateDir`] if destination cannot be created.
/// - Return [`SyncError::Spawn`] or [`SyncError::Transfer`] if the transfer
///   fails.
#[instrument(skip(spec, destination, synchronizer), fields(name = %spec.name), level = "debug")]
pub fn sync_mirror(
    spec: &MirrorSpec,
    destination: &Path,
    synchronizer: &impl Synchronizer,
) -> Result<()> {
    info!("syncing {}", spec.name);
    info!("remote: {}", spec.remote);
    info!("local: {}", destination.display());

    mkdirp(destination).map_err(|source| SyncError::CreateDir {
        path: destination.to_path_buf(),
        source,
    })?;

    synchronizer.sync(&spec.remote, destination, &spec.transfer_args())
}

/// Outcome of every mirror attempted in one run.
#[derive(Debug, Default)]
pub struct SyncReport {
    outcomes: Vec<SyncOutcome>,
}

impl SyncReport {
    /// All outcomes in configuration order.
    pub fn outcomes(&self) -> &[SyncOutcome] {
        &self.outcomes
    }

    /// Outcomes of mirrors that failed to synchronize.
    pub fn failures(&self) -> impl Iterator<Item = &SyncOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.result.is_err())
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.len() - self.failed()
    }

    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    /// Check if every mirror synchronized successfully.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

impl Display for SyncReport {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(
            fmt,
            "{} of {} mirrors synced",
            self.succeeded(),
            self.outcomes.len()
        )?;

        for outcome in self.failures() {
            if let Err(error) = &outcome.result {
                write!(fmt, "\n  {}: {error}", outcome.name)?;
            }
        }

        Ok(())
    }
}

/// Outcome of one mirror.
#[derive(Debug)]
pub struct SyncOutcome {
    /// Display name of mirror.
    pub name: String,

    /// Local directory that was synchronized.
    pub destination: PathBuf,

    /// Result of synchronization.
    pub result: Result<()>,
}

fn syscall_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<()> {
    let mut command = Command::new(cmd.as_ref());
    command.args(args);
    debug!("run {command:?}");

    let status = command
        .spawn()
        .and_then(|mut child| child.wait())
        .map_err(|source| SyncError::Spawn {
            program: cmd.as_ref().to_os_string(),
            source,
        })?;

    if !status.success() {
        return Err(SyncError::Transfer {
            program: cmd.as_ref().to_os_string(),
            status,
        });
    }

    Ok(())
}

/// All possible error types for mirror synchronization.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Destination directory cannot be created.
    #[error("failed to create directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Transfer tool cannot be started.
    #[error("failed to run {program:?}: {source}")]
    Spawn {
        program: OsString,
        #[source]
        source: std::io::Error,
    },

    /// Transfer tool reports failure.
    #[error("command {program:?} failed with {status}")]
    Transfer { program: OsString, status: ExitStatus },

    /// Transfer fails for any other reason.
    ///
    /// Reserved for [`Synchronizer`] implementations that do not drive a
    /// child process, e.g., in-process transfers or test doubles.
    #[error("{0}")]
    Other(String),
}

/// Friendly result alias :3
pub type Result<T, E = SyncError> = std::result::Result<T, E>;
