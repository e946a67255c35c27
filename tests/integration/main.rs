// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

mod workflow;

use anyhow::Result;
use repomirror::{
    sync::{Result as SyncResult, SyncError},
    MirrorConfig, Synchronizer,
};
use std::{
    cell::RefCell,
    fs::{create_dir_all, File},
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};
use tempfile::TempDir;

/// Scratch mirror root with a configuration file.
pub(crate) struct MirrorFixture {
    root: TempDir,
}

impl MirrorFixture {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            root: TempDir::new()?,
        })
    }

    pub(crate) fn base_path(&self) -> PathBuf {
        self.root.path().join("srv")
    }

    pub(crate) fn output(&self) -> PathBuf {
        self.root.path().join("index.html")
    }

    /// Write configuration file, and load it back like the binary would.
    ///
    /// Every `{base_path}` in the text is replaced with the fixture's base
    /// path.
    pub(crate) fn config(&self, text: &str) -> Result<MirrorConfig> {
        let path = self.root.path().join("repos.yaml");
        let text = text.replace("{base_path}", &self.base_path().to_string_lossy());
        std::fs::write(&path, text)?;

        Ok(MirrorConfig::load(&path)?)
    }

    /// Create file under base path with target modification time.
    pub(crate) fn touch(&self, relative: impl AsRef<Path>, age: Duration) -> Result<SystemTime> {
        let path = self.base_path().join(relative);
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let mtime = SystemTime::now() - age;
        File::create(&path)?.set_modified(mtime)?;

        Ok(mtime)
    }
}

/// Stand-in for rsync that drops a marker file into each destination.
#[derive(Debug, Default)]
pub(crate) struct MarkerSynchronizer {
    pub(crate) unreachable: Vec<String>,
    pub(crate) attempted: RefCell<Vec<String>>,
}

impl Synchronizer for MarkerSynchronizer {
    fn sync(&self, remote: &str, local: &Path, _options: &[String]) -> SyncResult<()> {
        self.attempted.borrow_mut().push(remote.into());
        if self.unreachable.iter().any(|name| name == remote) {
            return Err(SyncError::Other(format!("@ERROR: unknown module {remote:?}")));
        }

        File::create(local.join(".synced")).map_err(|source| SyncError::Spawn {
            program: "marker".into(),
            source,
        })?;

        Ok(())
    }
}
