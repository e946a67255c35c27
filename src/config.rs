// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the mirror configuration file that both the sync
//! runner and the status page generator read. The file is plain YAML:
//!
//! ```yaml
//! base_path: /srv/mirror
//! repos:
//!   - name: alpine
//!     remote: rsync://rsync.alpinelinux.org/alpine/
//!     local: alpine
//!     rsync_opts: "--exclude=edge --bwlimit=8000"
//! status_page:
//!   base_url: https://mirror.example.org
//! ```
//!
//! Configuration is constructed fresh on every run, and is never written back
//! by repomirror itself.

use crate::path::{mirror_dir, DEFAULT_BASE_PATH, DEFAULT_BASE_URL, DEFAULT_OUTPUT_FILE};

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use tracing::{debug, instrument};

/// Default maximum age of a mirror's newest file for it to count as current.
pub const DEFAULT_FRESHNESS_THRESHOLD: Duration = Duration::from_secs(24 * 60 * 60);

/// Full mirror configuration.
///
/// Lists every mirror to keep in sync, in the order that they should be
/// processed, along with the root directory that their local paths resolve
/// under.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct MirrorConfig {
    /// Root directory of all local mirror paths.
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,

    /// Ordered listing of mirrors.
    #[serde(default)]
    pub repos: Vec<MirrorSpec>,

    /// Optional status page settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_page: Option<StatusPageSettings>,
}

impl MirrorConfig {
    /// Load configuration file at target path.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if configuration file cannot be read.
    /// - Return [`ConfigError::Deserialize`] if configuration is not valid.
    /// - Return [`ConfigError::ShellExpansion`] if path expansion fails.
    #[instrument(skip(path), level = "debug")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        debug!("load configuration: {:?}", path.as_ref().display());
        read_to_string(path.as_ref())
            .map_err(|source| ConfigError::Read {
                path: path.as_ref().to_path_buf(),
                source,
            })?
            .parse()
    }

    /// Resolve status page settings.
    ///
    /// Any setting missing from the `status_page` section falls back to its
    /// compiled-in default.
    pub fn index_settings(&self) -> IndexSettings {
        let mut settings = IndexSettings::default();
        let Some(page) = &self.status_page else {
            return settings;
        };

        if let Some(output) = &page.output {
            settings.output = output.clone();
        }

        if let Some(base_url) = &page.base_url {
            settings.base_url = base_url.clone();
        }

        if let Some(secs) = page.freshness_threshold {
            settings.threshold = Duration::from_secs(secs);
        }

        let branding = &mut settings.branding;
        if let Some(title) = &page.title {
            branding.title = title.clone();
        }

        if let Some(heading) = &page.heading {
            branding.heading = heading.clone();
        }

        if let Some(host_name) = &page.host_name {
            branding.host_name = host_name.clone();
        }

        if let Some(host_url) = &page.host_url {
            branding.host_url = host_url.clone();
        }

        settings
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            repos: Vec::new(),
            status_page: None,
        }
    }
}

impl FromStr for MirrorConfig {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: MirrorConfig =
            serde_yaml::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on every path field.
        config.base_path = expand_path(&config.base_path)?;
        if let Some(output) = config
            .status_page
            .as_mut()
            .and_then(|page| page.output.as_mut())
        {
            *output = expand_path(output)?;
        }

        Ok(config)
    }
}

impl Display for MirrorConfig {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            serde_yaml::to_string(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Description of one mirror.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct MirrorSpec {
    /// Display name of mirror.
    pub name: String,

    /// Remote source handed to rsync as-is.
    pub remote: String,

    /// Local path relative to base path, also used as relative public URL.
    pub local: String,

    /// Extra rsync flags.
    #[serde(
        rename = "rsync_opts",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub transfer_options: Option<TransferOptions>,
}

impl MirrorSpec {
    /// Absolute path to local mirror directory under target base path.
    pub fn destination(&self, base_path: impl AsRef<Path>) -> PathBuf {
        mirror_dir(base_path, &self.local)
    }

    /// Extra rsync flags as separate arguments.
    pub fn transfer_args(&self) -> Vec<String> {
        self.transfer_options
            .as_ref()
            .map(TransferOptions::to_args)
            .unwrap_or_default()
    }
}

/// Extra rsync flags of a mirror.
///
/// Flags can either be written as one whitespace-delimited string, or as a
/// listing of separate arguments. A listed argument is never split, so it may
/// contain whitespace of its own.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TransferOptions {
    /// Whitespace-delimited flags.
    Line(String),

    /// Listing of flags.
    List(Vec<String>),
}

impl TransferOptions {
    /// Split flags into separate arguments.
    pub fn to_args(&self) -> Vec<String> {
        match self {
            Self::Line(line) => line.split_whitespace().map(Into::into).collect(),
            Self::List(list) => list.clone(),
        }
    }
}

/// Status page section of configuration file.
///
/// Every field is optional. See [`IndexSettings`] for the defaults.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct StatusPageSettings {
    /// Path to write status page to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Public URL that base path is served from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Freshness threshold in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freshness_threshold: Option<u64>,

    /// Title of page document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Heading shown in page banner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,

    /// Name of hosting organization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,

    /// Link to hosting organization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_url: Option<String>,
}

/// Resolved settings of the status page generator.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct IndexSettings {
    /// Path to write status page to.
    pub output: PathBuf,

    /// Public URL that base path is served from.
    pub base_url: String,

    /// Maximum age of a mirror's newest file for it to count as current.
    pub threshold: Duration,

    /// Static text of page.
    pub branding: PageBranding,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            output: DEFAULT_OUTPUT_FILE.into(),
            base_url: DEFAULT_BASE_URL.into(),
            threshold: DEFAULT_FRESHNESS_THRESHOLD,
            branding: PageBranding::default(),
        }
    }
}

/// Static text shown on status page.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PageBranding {
    pub title: String,
    pub heading: String,
    pub host_name: String,
    pub host_url: String,
}

impl Default for PageBranding {
    fn default() -> Self {
        Self {
            title: "UCSB Linux Mirrors".into(),
            heading: "UCSB Repo Mirrors".into(),
            host_name: "General Research IT (GRIT)".into(),
            host_url: "https://grit.ucsb.edu".into(),
        }
    }
}

fn default_base_path() -> PathBuf {
    DEFAULT_BASE_PATH.into()
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    Ok(shellexpand::full(path.to_string_lossy().as_ref())?
        .into_owned()
        .into())
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read configuration file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(serde_yaml::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(serde_yaml::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
