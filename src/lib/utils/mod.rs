//! Small string helpers for building pages and URLs.

use std::path::Path;

use itertools::Itertools;

/// Slug for names that contain no letters or digits at all.
pub const UNTITLED_SLUG: &str = "untitled";

fn entity(ch: char) -> Option<&'static str> {
    match ch {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#x27;"),
        _ => None,
    }
}

/// Escape post titles, tag names and other front-matter text for HTML.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match entity(ch) {
            Some(e) => out.push_str(e),
            None => out.push(ch),
        }
    }
    out
}

/// Quotes are escaped too, so text and attribute values share one rule.
pub fn escape_attr(s: &str) -> String {
    escape_text(s)
}

/// Lowercase alphanumeric runs joined by single dashes:
/// `Bitmask DP: Part 1` becomes `bitmask-dp-part-1`.
///
/// Used for post slugs, tag slugs and heading ids.
pub fn slugify(input: &str) -> String {
    let slug = input
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .join("-");
    if slug.is_empty() {
        UNTITLED_SLUG.to_string()
    } else {
        slug
    }
}

/// `../` once per directory between an output file and the output root, so
/// `posts/dp/digit-dp/index.html` links back with `../../../`.
pub fn prefix_to_root(rel_out: &Path) -> String {
    let dirs = rel_out.components().count().saturating_sub(1);
    "../".repeat(dirs)
}

/// Join a site-relative path onto the site base URL. Absolute URLs pass through.
pub fn absolute_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
