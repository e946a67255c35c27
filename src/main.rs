// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use repomirror::{generate_index, path::DEFAULT_CONFIG_FILE, sync_mirrors, MirrorConfig, Rsync};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::{ffi::OsString, path::PathBuf, process::exit, time::Duration, time::SystemTime};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = concat!(
        "\n  repomirror [options] sync [options]",
        "\n  repomirror [options] index [options]",
    ),
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Path to mirror configuration file.
    #[arg(short, long, global = true, value_name = "path", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        let config = MirrorConfig::load(&self.config)?;
        match self.command {
            Command::Sync(opts) => run_sync(config, opts),
            Command::Index(opts) => run_index(config, opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Synchronize every configured mirror from its remote.
    #[command(override_usage = "repomirror sync [options]")]
    Sync(SyncOptions),

    /// Write status page of every configured mirror.
    #[command(override_usage = "repomirror index [options]")]
    Index(IndexOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct SyncOptions {
    /// Rsync binary to call.
    #[arg(long, value_name = "program", default_value = "rsync")]
    pub rsync: OsString,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct IndexOptions {
    /// Path to write status page to.
    #[arg(short, long, value_name = "path")]
    pub output: Option<PathBuf>,

    /// Public URL that the mirror base path is served from.
    #[arg(short, long, value_name = "url")]
    pub base_url: Option<String>,

    /// Maximum age in seconds of a mirror's newest file to count as current.
    #[arg(short, long, value_name = "seconds")]
    pub threshold: Option<u64>,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn run_sync(config: MirrorConfig, opts: SyncOptions) -> Result<()> {
    let report = sync_mirrors(&config, &Rsync::new(opts.rsync));
    if !report.is_success() {
        bail!("{report}");
    }

    info!("{report}");
    Ok(())
}

fn run_index(config: MirrorConfig, opts: IndexOptions) -> Result<()> {
    let mut settings = config.index_settings();
    if let Some(output) = opts.output {
        settings.output = output;
    }

    if let Some(base_url) = opts.base_url {
        settings.base_url = base_url;
    }

    if let Some(secs) = opts.threshold {
        settings.threshold = Duration::from_secs(secs);
    }

    generate_index(&config, &settings, SystemTime::now())?;
    Ok(())
}
