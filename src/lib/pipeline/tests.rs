use std::{
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use proptest::{
    prelude::*,
    test_runner::{Config as RunnerConfig, TestRunner},
};
use tempfile::TempDir;
use time::{OffsetDateTime, macros::datetime};
use walkdir::WalkDir;

use crate::{
    config::{ABOUT_FILE, CONFIG_FILE, Config, INPUT_DIR, OUTPUT_DIR, POSTS_DIR, get_config},
    pipeline::{BuildReport, build_at, build_with, check_with},
};

const NOW: OffsetDateTime = datetime!(2025-06-01 12:00 UTC);

fn config() -> Config {
    get_config().expect("built-in config")
}

fn write_post(root: &Path, rel_path: &str, body: &str) {
    let full = root.join(INPUT_DIR).join(POSTS_DIR).join(rel_path);
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(full, body).unwrap();
}

fn post_md(title: &str, date: &str, extra: &str) -> String {
    format!("---\ntitle: \"{title}\"\npubDatetime: {date}\n{extra}---\n# {title}\n\nBody of {title}.\n")
}

fn snapshot_public(root: &Path) -> std::io::Result<Vec<(PathBuf, Vec<u8>)>> {
    let mut out = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if entry.file_type().is_file() {
            let rel = entry.path().strip_prefix(root).unwrap().to_path_buf();
            out.push((rel, fs::read(entry.path())?));
        }
    }
    out.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(out)
}

fn public_path(tmp: &TempDir, rel: impl AsRef<Path>) -> PathBuf {
    tmp.path().join(OUTPUT_DIR).join(rel.as_ref())
}

fn read_public(tmp: &TempDir, rel: impl AsRef<Path>) -> String {
    fs::read_to_string(public_path(tmp, rel)).expect("public file")
}

fn read_public_bytes(tmp: &TempDir, rel: impl AsRef<Path>) -> Vec<u8> {
    fs::read(public_path(tmp, rel)).expect("public file bytes")
}

// The minifier drops quotes from attribute values where it can.
fn has_href(html: &str, target: &str) -> bool {
    html.contains(&format!(r#"href="{target}""#)) || html.contains(&format!("href={target}"))
}

#[test]
fn build_emits_expected_tree() {
    let tmp = TempDir::new().expect("tempdir");
    write_post(
        tmp.path(),
        "bitmask-dp.md",
        &post_md("Bitmask DP", "2025-01-10", "tags: [dp, bitmask]\n"),
    );
    write_post(
        tmp.path(),
        "digit-dp.md",
        &post_md("Digit DP", "2025-02-10", "tags: [dp]\n"),
    );
    fs::write(tmp.path().join("style.css"), "body { color: black; }").unwrap();

    let report = build_with(tmp.path(), &config(), NOW).unwrap();
    assert_eq!(report.visible, 2);

    for rel in [
        "index.html",
        "posts/index.html",
        "posts/bitmask-dp/index.html",
        "posts/digit-dp/index.html",
        "tags/index.html",
        "tags/dp/index.html",
        "tags/bitmask/index.html",
        "archives/index.html",
        "rss.xml",
        "atom.xml",
        "style.css",
    ] {
        assert!(public_path(&tmp, rel).exists(), "{rel} missing");
    }
    assert!(!public_path(&tmp, "about/index.html").exists());
}

#[test]
fn drafts_and_scheduled_posts_are_not_published() {
    let tmp = TempDir::new().expect("tempdir");
    write_post(tmp.path(), "live.md", &post_md("Live", "2025-05-01", ""));
    write_post(tmp.path(), "draft.md", &post_md("Drafty", "2025-05-02", "draft: true\n"));
    // Inside the fifteen-minute margin, so still hidden.
    write_post(
        tmp.path(),
        "soon.md",
        &post_md("Soon", "2025-06-01T11:50:00Z", ""),
    );
    write_post(
        tmp.path(),
        "future.md",
        &post_md("Future", "2026-01-01", ""),
    );

    let report = build_with(tmp.path(), &config(), NOW).unwrap();
    assert_eq!(
        (report.total, report.visible, report.drafts, report.scheduled),
        (4, 1, 1, 2)
    );

    assert!(public_path(&tmp, "posts/live/index.html").exists());
    for hidden in ["draft", "soon", "future"] {
        assert!(!public_path(&tmp, format!("posts/{hidden}/index.html")).exists());
    }
    let listing = read_public(&tmp, "posts/index.html");
    assert!(listing.contains("Live"));
    assert!(!listing.contains("Drafty"));
    assert!(!listing.contains("Soon"));
}

#[test]
fn scheduled_post_appears_once_margin_has_passed() {
    let tmp = TempDir::new().expect("tempdir");
    write_post(
        tmp.path(),
        "soon.md",
        &post_md("Soon", "2025-06-01T11:50:00Z", ""),
    );
    let later = NOW + time::Duration::minutes(5);
    let report = check_with(tmp.path(), &config(), later).unwrap();
    assert_eq!(report.visible, 1);
}

#[test]
fn posts_listing_is_paginated() {
    let tmp = TempDir::new().expect("tempdir");
    for day in 1..=5 {
        write_post(
            tmp.path(),
            &format!("p{day}.md"),
            &post_md(&format!("Entry{day}"), &format!("2025-03-0{day}"), ""),
        );
    }
    let mut config = config();
    config.site.post_per_page = NonZeroUsize::new(2).unwrap();

    build_with(tmp.path(), &config, NOW).unwrap();

    let first = read_public(&tmp, "posts/index.html");
    assert!(first.contains("Entry5") && first.contains("Entry4"));
    assert!(!first.contains("Entry3"));
    assert!(has_href(&first, "../posts/page/2/index.html"));

    let second = read_public(&tmp, "posts/page/2/index.html");
    assert!(second.contains("Entry3") && second.contains("Entry2"));
    assert!(has_href(&second, "../../../posts/index.html"));
    assert!(has_href(&second, "../../../posts/page/3/index.html"));

    let third = read_public(&tmp, "posts/page/3/index.html");
    assert!(third.contains("Entry1"));
    assert!(!public_path(&tmp, "posts/page/4/index.html").exists());
}

#[test]
fn empty_site_still_has_one_listing_page() {
    let tmp = TempDir::new().expect("tempdir");
    let report = build_with(tmp.path(), &config(), NOW).unwrap();
    assert_eq!(report.visible, 0);
    let listing = read_public(&tmp, "posts/index.html");
    assert!(listing.contains("No posts yet."));
    assert!(!public_path(&tmp, "posts/page/2/index.html").exists());
}

#[test]
fn home_page_shows_featured_then_recent() {
    let tmp = TempDir::new().expect("tempdir");
    write_post(tmp.path(), "a.md", &post_md("Alpha", "2025-01-01", "featured: true\n"));
    for day in 1..=6 {
        write_post(
            tmp.path(),
            &format!("r{day}.md"),
            &post_md(&format!("Recent{day}"), &format!("2025-04-0{day}"), ""),
        );
    }
    let mut config = config();
    config.site.post_per_index = NonZeroUsize::new(3).unwrap();

    build_with(tmp.path(), &config, NOW).unwrap();
    let home = read_public(&tmp, "index.html");

    assert!(home.contains("Featured"));
    let alpha = home.find("Alpha").unwrap();
    let newest = home.find("Recent6").unwrap();
    assert!(alpha < newest);
    assert!(home.contains("Recent4"));
    assert!(!home.contains("Recent3"));
}

#[test]
fn archives_follow_the_show_archives_flag() {
    let tmp = TempDir::new().expect("tempdir");
    write_post(tmp.path(), "one.md", &post_md("One", "2024-12-01", ""));

    let mut config = config();
    config.site.show_archives = false;
    build_with(tmp.path(), &config, NOW).unwrap();

    assert!(!public_path(&tmp, "archives/index.html").exists());
    let home = read_public(&tmp, "index.html");
    assert!(!home.contains("Archives"));
}

#[test]
fn post_page_has_edit_link_tags_and_neighbours() {
    let tmp = TempDir::new().expect("tempdir");
    write_post(tmp.path(), "older.md", &post_md("Older", "2025-01-01", ""));
    write_post(
        tmp.path(),
        "dp/middle.md",
        &post_md("Middle", "2025-02-01", "tags: [Dynamic Programming]\nmodDatetime: 2025-03-01\n"),
    );
    write_post(tmp.path(), "newer.md", &post_md("Newer", "2025-04-01", ""));

    let config = config();
    build_with(tmp.path(), &config, NOW).unwrap();

    let html = read_public(&tmp, "posts/dp/middle/index.html");
    let edit = config.site.edit_post.as_ref().unwrap();
    assert!(html.contains(&edit.href_for("contents/posts/dp/middle.md")));
    assert!(html.contains(&edit.text));
    assert!(has_href(&html, "../../../tags/dynamic-programming/index.html"));
    assert!(html.contains("Updated:"));
    assert!(html.contains("Newer: Newer"));
    assert!(html.contains("Older: Older"));
    // Body headings sit below the page title.
    assert!(html.contains("<h2 id=middle>") || html.contains(r#"<h2 id="middle">"#));
}

#[test]
fn post_pages_include_opengraph_meta_with_absolute_urls() {
    let tmp = TempDir::new().expect("tempdir");
    write_post(
        tmp.path(),
        "og.md",
        &post_md("OG Title", "2025-01-01", "description: Short desc\nogImage: images/pic.png\n"),
    );
    let config = config();
    build_with(tmp.path(), &config, NOW).unwrap();

    let html = read_public(&tmp, "posts/og/index.html");
    let base = config.site.base_url();
    assert!(html.contains("og:title"));
    assert!(html.contains("Short desc"));
    assert!(html.contains(&format!("{base}/posts/og/index.html")));
    assert!(html.contains(&format!("{base}/images/pic.png")));
    assert!(html.contains("article:published_time"));
}

#[test]
fn inactive_socials_are_not_rendered() {
    let tmp = TempDir::new().expect("tempdir");
    let config = config();
    build_with(tmp.path(), &config, NOW).unwrap();
    let home = read_public(&tmp, "index.html");
    for link in &config.socials {
        assert_eq!(home.contains(&link.href), link.active, "{}", link.name);
    }
}

#[test]
fn about_page_is_rendered_and_linked() {
    let tmp = TempDir::new().expect("tempdir");
    fs::create_dir_all(tmp.path().join(INPUT_DIR)).unwrap();
    fs::write(
        tmp.path().join(INPUT_DIR).join(ABOUT_FILE),
        "---\ntitle: About Me\n---\nI like algorithms.\n",
    )
    .unwrap();

    build_with(tmp.path(), &config(), NOW).unwrap();
    let about = read_public(&tmp, "about/index.html");
    assert!(about.contains("About Me"));
    assert!(about.contains("I like algorithms."));
    let home = read_public(&tmp, "index.html");
    assert!(has_href(&home, "about/index.html"));
}

#[test]
fn feeds_are_emitted_newest_first_with_absolute_links() {
    let tmp = TempDir::new().expect("tempdir");
    write_post(tmp.path(), "older.md", &post_md("Older", "2024-01-01", ""));
    write_post(
        tmp.path(),
        "newer.md",
        &post_md("Newer", "2025-01-01", "tags: [rust]\ndescription: Summary here\n"),
    );
    write_post(tmp.path(), "hidden.md", &post_md("Hidden", "2025-02-01", "draft: true\n"));

    let config = config();
    build_with(tmp.path(), &config, NOW).unwrap();
    let base = config.site.base_url();

    let rss_bytes = read_public_bytes(&tmp, "rss.xml");
    let channel = rss::Channel::read_from(&rss_bytes[..]).expect("parse rss");
    assert_eq!(channel.items().len(), 2);
    assert_eq!(channel.items()[0].title(), Some("Newer"));
    assert!(channel.items()[0].link().unwrap().starts_with(base));
    assert_eq!(channel.items()[0].description(), Some("Summary here"));
    let content = channel.items()[0].content().expect("rss content");
    assert!(content.contains("<p>Body of Newer.</p>"));
    let categories: Vec<_> = channel.items()[0]
        .categories()
        .iter()
        .map(|c| c.name())
        .collect();
    assert!(categories.contains(&"rust"));

    let atom_bytes = read_public_bytes(&tmp, "atom.xml");
    let feed = atom_syndication::Feed::read_from(&atom_bytes[..]).expect("parse atom");
    assert_eq!(feed.entries().len(), 2);
    assert_eq!(feed.entries()[0].title().as_str(), "Newer");
    assert!(
        feed.entries()[0]
            .links()
            .first()
            .unwrap()
            .href()
            .starts_with(base)
    );
}

#[test]
fn build_is_deterministic_across_runs() {
    let mut runner = TestRunner::new(RunnerConfig {
        cases: 8,
        failure_persistence: None,
        ..RunnerConfig::default()
    });
    runner
        .run(
            &proptest::collection::vec(("[a-z]{3,8}", 1u32..=28, any::<bool>()), 1..6),
            |specs| {
                let tmp = TempDir::new().expect("tempdir");
                for (i, (title, day, draft)) in specs.iter().enumerate() {
                    let extra = if *draft { "draft: true\n" } else { "" };
                    write_post(
                        tmp.path(),
                        &format!("{i}-{title}.md"),
                        &post_md(title, &format!("2025-01-{day:02}"), extra),
                    );
                }

                build_with(tmp.path(), &config(), NOW).unwrap();
                let first = snapshot_public(&tmp.path().join(OUTPUT_DIR)).unwrap();

                build_with(tmp.path(), &config(), NOW).unwrap();
                let second = snapshot_public(&tmp.path().join(OUTPUT_DIR)).unwrap();

                prop_assert_eq!(first, second);
                Ok(())
            },
        )
        .unwrap();
}

#[test]
fn post_without_date_fails_naming_the_file() {
    let tmp = TempDir::new().expect("tempdir");
    write_post(tmp.path(), "nodate.md", "---\ntitle: Undated\n---\nBody\n");
    let err = build_with(tmp.path(), &config(), NOW).unwrap_err();
    let msg = format!("{err:?}");
    assert!(msg.contains("nodate.md"), "{msg}");
}

#[test]
fn duplicate_slugs_are_rejected() {
    let tmp = TempDir::new().expect("tempdir");
    write_post(tmp.path(), "Digit DP.md", &post_md("One", "2025-01-01", ""));
    write_post(tmp.path(), "digit-dp.md", &post_md("Two", "2025-01-02", ""));
    let err = build_with(tmp.path(), &config(), NOW).unwrap_err();
    assert!(format!("{err:?}").contains("digit-dp"));
}

#[test]
fn build_at_reads_site_toml() {
    let tmp = TempDir::new().expect("tempdir");
    fs::write(
        tmp.path().join(CONFIG_FILE),
        "[site]\ntitle = \"Configured Title\"\nscheduledPostMargin = 0\n",
    )
    .unwrap();
    write_post(tmp.path(), "one.md", &post_md("One", "2020-01-01", ""));

    let report = build_at(tmp.path()).unwrap();
    assert_eq!(
        report,
        BuildReport {
            pages: report.pages,
            total: 1,
            visible: 1,
            drafts: 0,
            scheduled: 0,
        }
    );
    assert!(read_public(&tmp, "index.html").contains("Configured Title"));
}

#[test]
fn invalid_site_toml_aborts_the_build() {
    let tmp = TempDir::new().expect("tempdir");
    fs::write(tmp.path().join(CONFIG_FILE), "[site]\npostPerPage = 0\n").unwrap();
    let err = build_at(tmp.path()).unwrap_err();
    assert!(format!("{err:?}").contains("postPerPage"));
    assert!(!tmp.path().join(OUTPUT_DIR).exists());
}

#[test]
fn demo_site_builds() {
    let demo = Path::new(env!("CARGO_MANIFEST_DIR")).join("demo");
    let tmp = TempDir::new().expect("tempdir");
    for entry in WalkDir::new(&demo) {
        let entry = entry.unwrap();
        let dest = tmp.path().join(entry.path().strip_prefix(&demo).unwrap());
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).unwrap();
        } else {
            fs::copy(entry.path(), &dest).unwrap();
        }
    }

    let config = crate::config::load_config(tmp.path()).unwrap();
    let report = build_with(tmp.path(), &config, NOW).unwrap();
    assert_eq!(report.visible, 2);

    let digit = read_public(&tmp, "posts/digit-dp/index.html");
    assert!(digit.contains("<table>"));
    assert!(digit.contains("Updated:"));
    assert!(public_path(&tmp, "tags/dynamic-programming/index.html").exists());
    assert!(public_path(&tmp, "about/index.html").exists());
    assert!(public_path(&tmp, "style.css").exists());
}

#[test]
fn rebuild_drops_pages_of_posts_turned_into_drafts() {
    let tmp = TempDir::new().expect("tempdir");
    write_post(
        tmp.path(),
        "secret.md",
        &post_md("Secret", "2025-01-01", "tags: [hidden-topic]\n"),
    );
    build_with(tmp.path(), &config(), NOW).unwrap();
    assert!(public_path(&tmp, "posts/secret/index.html").exists());
    assert!(public_path(&tmp, "tags/hidden-topic/index.html").exists());

    write_post(
        tmp.path(),
        "secret.md",
        &post_md("Secret", "2025-01-01", "tags: [hidden-topic]\ndraft: true\n"),
    );
    let report = build_with(tmp.path(), &config(), NOW).unwrap();
    assert_eq!((report.visible, report.drafts), (0, 1));
    assert!(!public_path(&tmp, "posts/secret/index.html").exists());
    assert!(!public_path(&tmp, "tags/hidden-topic/index.html").exists());
    assert!(!read_public(&tmp, "rss.xml").contains("Secret"));
}

#[test]
fn rebuild_drops_pages_of_deleted_posts_and_stale_files() {
    let tmp = TempDir::new().expect("tempdir");
    write_post(tmp.path(), "gone.md", &post_md("Gone", "2025-01-01", ""));
    build_with(tmp.path(), &config(), NOW).unwrap();
    fs::write(public_path(&tmp, "leftover.html"), "old").unwrap();

    fs::remove_file(tmp.path().join(INPUT_DIR).join(POSTS_DIR).join("gone.md")).unwrap();
    build_with(tmp.path(), &config(), NOW).unwrap();

    assert!(!public_path(&tmp, "posts/gone/index.html").exists());
    assert!(!public_path(&tmp, "leftover.html").exists());
    assert!(public_path(&tmp, "index.html").exists());
}

#[test]
fn failed_build_keeps_the_previous_output() {
    let tmp = TempDir::new().expect("tempdir");
    write_post(tmp.path(), "ok.md", &post_md("Fine", "2025-01-01", ""));
    build_with(tmp.path(), &config(), NOW).unwrap();

    write_post(tmp.path(), "broken.md", "---\ntitle: Broken\n---\nNo date.\n");
    assert!(build_with(tmp.path(), &config(), NOW).is_err());
    assert!(public_path(&tmp, "posts/ok/index.html").exists());
}

#[test]
fn theme_toggle_script_follows_light_and_dark_flag() {
    let tmp = TempDir::new().expect("tempdir");
    let mut config = config();

    config.site.light_and_dark_mode = true;
    build_with(tmp.path(), &config, NOW).unwrap();
    let home = read_public(&tmp, "index.html");
    assert!(home.contains("theme-btn"));
    assert!(home.contains("<script>"));
    assert!(home.contains("localStorage"));
    assert!(home.contains("data-theme"));

    config.site.light_and_dark_mode = false;
    build_with(tmp.path(), &config, NOW).unwrap();
    let home = read_public(&tmp, "index.html");
    assert!(!home.contains("theme-btn"));
    assert!(!home.contains("<script"));
    assert!(!home.contains("color-scheme"));
}

#[test]
fn lang_tags_become_og_locales() {
    let tmp = TempDir::new().expect("tempdir");
    let mut config = config();
    config.locale.lang_tag = vec!["en-US".to_string(), "vi-VN".to_string()];
    build_with(tmp.path(), &config, NOW).unwrap();

    let home = read_public(&tmp, "index.html");
    assert!(home.contains("og:locale"));
    assert!(home.contains("en_US"));
    assert!(home.contains("og:locale:alternate"));
    assert!(home.contains("vi_VN"));

    config.locale.lang_tag.clear();
    build_with(tmp.path(), &config, NOW).unwrap();
    assert!(!read_public(&tmp, "index.html").contains("og:locale"));
}

#[test]
fn footer_author_is_plain_text_without_profile() {
    let tmp = TempDir::new().expect("tempdir");
    let mut config = config();
    let author_link = format!(">{}</a>", config.site.author);

    build_with(tmp.path(), &config, NOW).unwrap();
    assert!(read_public(&tmp, "index.html").contains(&author_link));

    config.site.profile = String::new();
    build_with(tmp.path(), &config, NOW).unwrap();
    let home = read_public(&tmp, "index.html");
    assert!(home.contains(&config.site.author));
    assert!(!home.contains(&author_link));
    assert!(!home.contains(r#"href="""#));
}
