// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Static status page rendering.
//!
//! Renders one self-contained HTML document from the surveyed status of every
//! mirror. The page consists of a legend explaining each status category, a
//! status chip per mirror, and a list of links to browse each mirror through
//! the public base URL. Styles are inlined, and no scripts are used, so the
//! page can be served as-is by any static file server.
//!
//! The page is regenerated wholesale on every run. No attempt is made to
//! update an existing page in place.

use crate::{
    config::{IndexSettings, MirrorConfig},
    path::mirror_url,
    status::{survey_mirrors, StatusEntry},
};

use std::{fmt::Write as _, fs::write, path::PathBuf, time::Duration, time::SystemTime};
use tracing::{info, instrument};

const HTML_TEMPLATE: &str = include_str!("./status_page.html");

/// Status page of all mirrors.
#[derive(Debug, Clone)]
pub struct StatusPage<'a> {
    entries: &'a [StatusEntry],
    settings: &'a IndexSettings,
}

impl<'a> StatusPage<'a> {
    /// Construct new status page.
    ///
    /// Entries are rendered in the order given.
    pub fn new(entries: &'a [StatusEntry], settings: &'a IndexSettings) -> Self {
        Self { entries, settings }
    }

    /// Render page as HTML document.
    pub fn render(&self) -> String {
        let branding = &self.settings.branding;
        fill_template(HTML_TEMPLATE, |placeholder| match placeholder {
            "TITLE" => Some(escape_html(&branding.title)),
            "HEADING" => Some(escape_html(&branding.heading)),
            "HOST_NAME" => Some(escape_html(&branding.host_name)),
            "HOST_URL" => Some(escape_html(&branding.host_url)),
            "THRESHOLD" => Some(format_threshold(self.settings.threshold)),
            "STATUS_CHIPS" => Some(self.status_chips()),
            "REPO_LINKS" => Some(self.repo_links()),
            _ => None,
        })
    }

    /// Write rendered page to target path, replacing whatever was there.
    ///
    /// # Errors
    ///
    /// - Return [`PageError::Write`] if the page cannot be written.
    pub fn save(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        write(&path, self.render()).map_err(|source| PageError::Write { path, source })
    }

    fn status_chips(&self) -> String {
        let mut chips = String::new();
        for entry in self.entries {
            let kind = entry.status.kind();
            let _ = writeln!(
                chips,
                r#"<div class="repoStatus {}">{} <strong>{}:</strong> Last modified: {}</div>"#,
                kind.class(),
                kind.icon(),
                escape_html(&entry.name),
                entry.status.timestamp(),
            );
        }

        chips
    }

    fn repo_links(&self) -> String {
        let mut links = String::new();
        for entry in self.entries {
            let _ = writeln!(
                links,
                r#"<a href="{}">{}</a>"#,
                escape_html(&mirror_url(&self.settings.base_url, &entry.local)),
                escape_html(&entry.name),
            );
        }

        links
    }
}

/// Survey every configured mirror, and write status page.
///
/// # Errors
///
/// - Return [`PageError::Write`] if the page cannot be written.
#[instrument(skip(config, settings), level = "debug")]
pub fn generate_index(
    config: &MirrorConfig,
    settings: &IndexSettings,
    now: SystemTime,
) -> Result<Vec<StatusEntry>> {
    let entries = survey_mirrors(config, settings.threshold, now);
    StatusPage::new(&entries, settings).save(&settings.output)?;
    info!("web index written to {}", settings.output.display());

    Ok(entries)
}

/// Escape text for use in HTML content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }

    escaped
}

/// Render threshold in the largest whole unit that fits, e.g., "24h".
fn format_threshold(threshold: Duration) -> String {
    let secs = threshold.as_secs();
    match secs {
        0 => "0s".into(),
        _ if secs % 3600 == 0 => format!("{}h", secs / 3600),
        _ if secs % 60 == 0 => format!("{}m", secs / 60),
        _ => format!("{secs}s"),
    }
}

/// Substitute `{{NAME}}` placeholders in one pass.
///
/// Substituted text is never scanned again, so values may safely contain
/// placeholder syntax of their own. Unknown placeholders are kept verbatim.
fn fill_template(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}").and_then(|end| Some((end, lookup(&after[..end])?))) {
            Some((end, value)) => {
                output.push_str(&value);
                rest = &after[end + 2..];
            }
            None => {
                output.push_str("{{");
                rest = after;
            }
        }
    }
    output.push_str(rest);

    output
}

/// All possible error types for status page generation.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// Page cannot be written.
    #[error("failed to write status page {path:?}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Friendly result alias :3
type Result<T, E = PageError> = std::result::Result<T, E>;
