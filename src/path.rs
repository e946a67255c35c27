// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine default locations of the files repomirror reads and writes, and
//! shape local paths and public URLs into the forms that rsync and the status
//! page expect.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

/// Default location of the mirror configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "/etc/repomirror/repos.yaml";

/// Default root directory that every mirror's local path resolves under.
pub const DEFAULT_BASE_PATH: &str = "/srv/mirror";

/// Default location of the generated status page.
pub const DEFAULT_OUTPUT_FILE: &str = "/home/reflection/index.html";

/// Default public URL that mirror directories are served from.
pub const DEFAULT_BASE_URL: &str = "https://reflection.grit.ucsb.edu";

/// Resolve absolute path to a mirror's local directory.
///
/// Does not check if the path returned actually exists.
pub fn mirror_dir(base_path: impl AsRef<Path>, local: impl AsRef<Path>) -> PathBuf {
    base_path.as_ref().join(local)
}

/// Render path as a directory argument that ends with exactly one slash.
///
/// Rsync copies the _contents_ of its source into a destination that ends
/// with a slash, rather than nesting the source as a new directory inside of
/// it.
pub fn with_trailing_slash(path: impl AsRef<Path>) -> OsString {
    // INVARIANT: Collecting components drops any trailing separators.
    let mut arg = path
        .as_ref()
        .components()
        .collect::<PathBuf>()
        .into_os_string();

    if !arg.to_string_lossy().ends_with('/') {
        arg.push("/");
    }

    arg
}

/// Build public URL of mirror directory.
///
/// Assumes that the layout of the base path matches the public URL layout
/// exactly, so the relative local path can be appended to the base URL as-is.
pub fn mirror_url(base_url: impl AsRef<str>, local: impl AsRef<str>) -> String {
    let base_url = base_url.as_ref().trim_end_matches('/');
    let local = local.as_ref().trim_matches('/');

    if local.is_empty() {
        format!("{base_url}/")
    } else {
        format!("{base_url}/{local}/")
    }
}
