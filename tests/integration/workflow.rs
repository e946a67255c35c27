// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{MarkerSynchronizer, MirrorFixture};

use anyhow::Result;
use indoc::indoc;
use pretty_assertions::assert_eq;
use repomirror::{generate_index, status::format_timestamp, sync_mirrors, StatusKind};
use std::{fs::read_to_string, time::Duration, time::SystemTime};

const CONFIG: &str = indoc! {r#"
    base_path: "{base_path}"
    repos:
      - name: alpine
        remote: rsync://rsync.alpinelinux.org/alpine/
        local: alpine
      - name: debian
        remote: rsync://ftp.debian.org/debian/
        local: debian
        rsync_opts: --exclude=*.iso
      - name: rocky
        remote: rsync://msync.rockylinux.org/rocky/
        local: linux/rocky
        rsync_opts: ["--exclude", "Live"]
"#};

#[test]
fn sync_then_index() -> Result<()> {
    let fixture = MirrorFixture::new()?;
    let config = fixture.config(CONFIG)?;
    let synchronizer = MarkerSynchronizer {
        unreachable: vec!["rsync://ftp.debian.org/debian/".into()],
        ..MarkerSynchronizer::default()
    };

    let report = sync_mirrors(&config, &synchronizer);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(
        *synchronizer.attempted.borrow(),
        vec![
            "rsync://rsync.alpinelinux.org/alpine/",
            "rsync://ftp.debian.org/debian/",
            "rsync://msync.rockylinux.org/rocky/",
        ]
    );

    // INVARIANT: Failed mirror still gets its directory, just nothing in it.
    assert!(fixture.base_path().join("debian").is_dir());
    assert!(fixture.base_path().join("linux/rocky/.synced").is_file());

    let mut settings = config.index_settings();
    settings.output = fixture.output();
    settings.base_url = "https://mirror.example.edu".into();

    let entries = generate_index(&config, &settings, SystemTime::now())?;
    let result = entries
        .iter()
        .map(|entry| (entry.status.kind(), entry.name.as_str()))
        .collect::<Vec<_>>();
    let expect = vec![
        (StatusKind::Failed, "debian"),
        (StatusKind::Success, "alpine"),
        (StatusKind::Success, "rocky"),
    ];
    assert_eq!(result, expect);

    let page = read_to_string(fixture.output())?;
    assert!(page.contains("❌ <strong>debian:</strong> Last modified: Not found</div>"));
    assert!(page.contains(r#"<a href="https://mirror.example.edu/linux/rocky/">rocky</a>"#));
    assert!(page.contains(r#"<a href="https://mirror.example.edu/debian/">debian</a>"#));

    Ok(())
}

#[test]
fn index_scenario_single_mirror() -> Result<()> {
    let fixture = MirrorFixture::new()?;
    let config = fixture.config(indoc! {r#"
        base_path: "{base_path}"
        repos:
          - name: alpine
            remote: rsync://x/alpine
            local: alpine
        status_page:
          base_url: https://example.org
    "#})?;
    let mtime = fixture.touch("alpine/latest-stable/APKINDEX.tar.gz", Duration::from_secs(3600))?;

    let mut settings = config.index_settings();
    settings.output = fixture.output();
    generate_index(&config, &settings, SystemTime::now())?;

    let page = read_to_string(fixture.output())?;
    let chip = format!(
        r#"<div class="repoStatus success">✅ <strong>alpine:</strong> Last modified: {}</div>"#,
        format_timestamp(mtime)
    );
    assert!(page.contains(&chip), "missing chip in:\n{page}");
    assert!(page.contains(r#"<a href="https://example.org/alpine/">alpine</a>"#));

    Ok(())
}

#[test]
fn index_marks_stale_and_missing_mirrors() -> Result<()> {
    let fixture = MirrorFixture::new()?;
    let config = fixture.config(CONFIG)?;
    fixture.touch("alpine/old", Duration::from_secs(3 * 24 * 60 * 60))?;
    fixture.touch("debian/dists/Release", Duration::from_secs(60))?;
    fixture.touch("debian/pool/ancient.deb", Duration::from_secs(90 * 24 * 60 * 60))?;

    let mut settings = config.index_settings();
    settings.output = fixture.output();
    let entries = generate_index(&config, &settings, SystemTime::now())?;

    let result = entries
        .iter()
        .map(|entry| (entry.name.as_str(), entry.status.kind()))
        .collect::<Vec<_>>();
    let expect = vec![
        ("rocky", StatusKind::Failed),
        ("alpine", StatusKind::Pending),
        ("debian", StatusKind::Success),
    ];
    assert_eq!(result, expect);

    let page = read_to_string(fixture.output())?;
    assert!(page.contains(r#"<div class="repoStatus pending">⚠️ <strong>alpine:</strong>"#));

    Ok(())
}

#[test]
fn index_is_stable_across_runs() -> Result<()> {
    let fixture = MirrorFixture::new()?;
    let config = fixture.config(CONFIG)?;
    fixture.touch("alpine/file", Duration::from_secs(3600))?;

    let mut settings = config.index_settings();
    settings.output = fixture.output();
    let now = SystemTime::now();

    generate_index(&config, &settings, now)?;
    let first = read_to_string(fixture.output())?;
    generate_index(&config, &settings, now)?;
    let second = read_to_string(fixture.output())?;

    assert_eq!(first, second);

    Ok(())
}
