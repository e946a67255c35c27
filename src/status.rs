// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Mirror freshness classification.
//!
//! The freshness of a mirror is judged purely by the modification time of the
//! newest regular file found anywhere under its local directory. No state is
//! kept between runs. The same directory tree, threshold, and clock reading
//! will always produce the same status.
//!
//! # Status Categories
//!
//! - __Success__: newest file is no older than the freshness threshold.
//! - __Pending__: newest file is older than the freshness threshold.
//! - __Failed__: directory is missing, holds no regular files, or could not be
//!   read in full.

use crate::config::MirrorConfig;

use chrono::{DateTime, Local};
use std::{
    cmp::Ordering,
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

/// Timestamp shown for mirrors without any modification time.
pub const NOT_FOUND: &str = "Not found";

/// Layout of displayed modification times.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Freshness category of a mirror.
///
/// Variants are declared in display order, so failed mirrors sort first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusKind {
    Failed,
    Pending,
    Success,
}

impl StatusKind {
    /// Icon shown next to mirror name.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Success => "✅",
            Self::Pending => "⚠️",
            Self::Failed => "❌",
        }
    }

    /// Style class of status chip.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Pending => "pending",
            Self::Failed => "failed",
        }
    }
}

/// Derived status of a mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorStatus {
    kind: StatusKind,
    last_modified: Option<SystemTime>,
}

impl MirrorStatus {
    /// Classify mirror by modification time of its newest file.
    ///
    /// A mirror without any modification time has failed. Otherwise it
    /// succeeded if its age is at most `threshold`, and is pending if older.
    /// A modification time ahead of `now` counts as zero age.
    pub fn classify(now: SystemTime, threshold: Duration, newest: Option<SystemTime>) -> Self {
        let kind = match newest {
            None => StatusKind::Failed,
            Some(mtime) => {
                let age = now.duration_since(mtime).unwrap_or(Duration::ZERO);
                if age <= threshold {
                    StatusKind::Success
                } else {
                    StatusKind::Pending
                }
            }
        };

        Self {
            kind,
            last_modified: newest,
        }
    }

    pub fn kind(&self) -> StatusKind {
        self.kind
    }

    pub fn last_modified(&self) -> Option<SystemTime> {
        self.last_modified
    }

    /// Human readable modification time in local time, or [`NOT_FOUND`].
    pub fn timestamp(&self) -> String {
        self.last_modified
            .map(format_timestamp)
            .unwrap_or_else(|| NOT_FOUND.into())
    }
}

/// Render modification time as local date-time.
pub fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// Status of one configured mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// Display name of mirror.
    pub name: String,

    /// Local path relative to base path.
    pub local: String,

    /// Derived status.
    pub status: MirrorStatus,
}

impl StatusEntry {
    /// Display ordering of status entries.
    ///
    /// Orders by status first, then name. Modification time, oldest first,
    /// and relative path break any remaining ties.
    pub fn display_order(&self, other: &Self) -> Ordering {
        self.status
            .kind()
            .cmp(&other.status.kind())
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.status.last_modified().cmp(&other.status.last_modified()))
            .then_with(|| self.local.cmp(&other.local))
    }
}

/// Classify every configured mirror.
///
/// Returned entries are sorted by [`StatusEntry::display_order`]. A mirror
/// that cannot be inspected is reported as failed rather than aborting the
/// survey.
#[instrument(skip(config), level = "debug")]
pub fn survey_mirrors(
    config: &MirrorConfig,
    threshold: Duration,
    now: SystemTime,
) -> Vec<StatusEntry> {
    survey_mirrors_with(config, threshold, now, newest_mtime)
}

fn survey_mirrors_with(
    config: &MirrorConfig,
    threshold: Duration,
    now: SystemTime,
    scan: impl Fn(&Path) -> Result<Option<SystemTime>>,
) -> Vec<StatusEntry> {
    let mut entries = config
        .repos
        .iter()
        .map(|spec| {
            let path = spec.destination(&config.base_path);
            let newest = inspect_mirror_dir(&path, &scan);
            let status = MirrorStatus::classify(now, threshold, newest);
            info!("{}: {:?} ({})", spec.name, status.kind(), status.timestamp());

            StatusEntry {
                name: spec.name.clone(),
                local: spec.local.clone(),
                status,
            }
        })
        .collect::<Vec<_>>();

    entries.sort_by(StatusEntry::display_order);
    entries
}

/// Determine newest modification time under mirror directory.
///
/// Missing directories and inspection failures both yield [`None`].
pub fn mirror_newest_mtime(path: &Path) -> Option<SystemTime> {
    inspect_mirror_dir(path, newest_mtime)
}

fn inspect_mirror_dir(
    path: &Path,
    scan: impl Fn(&Path) -> Result<Option<SystemTime>>,
) -> Option<SystemTime> {
    match path.try_exists() {
        Ok(true) => {}
        Ok(false) => {
            warn!("mirror directory {:?} does not exist", path.display());
            return None;
        }
        Err(error) => {
            warn!("cannot access mirror directory {:?}: {error}", path.display());
            return None;
        }
    }

    match scan(path) {
        Ok(Some(mtime)) => Some(mtime),
        Ok(None) => {
            warn!("mirror directory {:?} holds no files", path.display());
            None
        }
        Err(error) => {
            warn!("cannot inspect mirror directory {:?}: {error}", path.display());
            None
        }
    }
}

/// Determine newest modification time of regular files under directory.
///
/// Walks the entire tree below the directory. Symbolic links are followed
/// when checking file type and modification time, but dangling links are
/// skipped. The directory itself is never counted, so a path naming a
/// regular file yields [`None`].
///
/// # Errors
///
/// - Return [`StatusError::Walk`] if directory traversal fails.
/// - Return [`StatusError::Stat`] if file metadata cannot be read.
pub fn newest_mtime(path: &Path) -> Result<Option<SystemTime>> {
    let mut newest: Option<SystemTime> = None;

    for entry in WalkDir::new(path).min_depth(1) {
        let entry = entry.map_err(|source| StatusError::Walk {
            path: path.to_path_buf(),
            source,
        })?;

        let metadata = match fs::metadata(entry.path()) {
            Ok(metadata) => metadata,
            Err(_) if entry.path_is_symlink() => {
                debug!("skip dangling link {:?}", entry.path().display());
                continue;
            }
            Err(source) => {
                return Err(StatusError::Stat {
                    path: entry.path().to_path_buf(),
                    source,
                })
            }
        };

        if !metadata.is_file() {
            continue;
        }

        let mtime = metadata.modified().map_err(|source| StatusError::Stat {
            path: entry.path().to_path_buf(),
            source,
        })?;
        newest = newest.max(Some(mtime));
    }

    Ok(newest)
}

/// Failures while inspecting a mirror directory.
#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    /// Directory traversal fails.
    #[error("failed to walk {path:?}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// File metadata cannot be read.
    #[error("failed to stat {path:?}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Friendly result alias :3
type Result<T, E = StatusError> = std::result::Result<T, E>;
