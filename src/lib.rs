// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Package mirror maintenance.
//!
//! Repomirror keeps a set of local package mirrors in sync with their upstream
//! remotes, and publishes a static status page describing how fresh each
//! mirror is. Both jobs are batch runs meant to be triggered on a schedule by
//! some external timer, one after the other:
//!
//! 1. [`sync_mirrors`] calls out to rsync for every configured mirror.
//! 2. [`generate_index`] inspects the modification times that rsync left
//!    behind, and renders them into an HTML page.
//!
//! The two jobs share nothing but the configuration file and the mirror
//! directories themselves.

pub mod config;
pub mod page;
pub mod path;
pub mod status;
pub mod sync;

#[doc(inline)]
pub use crate::{
    config::{IndexSettings, MirrorConfig, MirrorSpec},
    page::{generate_index, StatusPage},
    status::{survey_mirrors, MirrorStatus, StatusEntry, StatusKind},
    sync::{sync_mirrors, Rsync, SyncReport, Synchronizer},
};
