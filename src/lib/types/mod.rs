//! Shared data types for the blog engine.
//! Implemented as newtypes to enforce invariants.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    path::{Path, PathBuf},
};

use time::{
    Date, Month, OffsetDateTime, format_description::BorrowedFormatItem,
    format_description::well_known::Rfc3339, macros::format_description,
};

use crate::utils::slugify;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const DISPLAY_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[month repr:short] [day padding:none], [year]");

/// Publish or modification instant of a post.
///
/// Accepts RFC 3339 (`2024-05-01T09:30:00+07:00`) or a bare ISO date, which
/// is read as midnight UTC. Ordering compares instants, not wall-clock text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PublishTime(OffsetDateTime);

impl PublishTime {
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
            return Some(Self(dt));
        }
        Date::parse(s, DATE_FORMAT)
            .ok()
            .map(|d| Self(d.midnight().assume_utc()))
    }

    pub fn from_datetime(dt: OffsetDateTime) -> Self {
        Self(dt)
    }

    pub fn as_datetime(&self) -> OffsetDateTime {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> Month {
        self.0.month()
    }

    /// Machine-readable form for `datetime=` attributes and feeds.
    pub fn to_rfc3339(&self) -> String {
        self.0.format(&Rfc3339).unwrap_or_default()
    }

    /// Human-readable form, e.g. `Jan 5, 2024`.
    pub fn display(&self) -> String {
        self.0.format(DISPLAY_FORMAT).unwrap_or_default()
    }
}

impl fmt::Display for PublishTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

/// Tags used to categorise posts. Two tags are the same tag when their slugs
/// match, so `Dynamic Programming` and `dynamic-programming` collapse.
#[derive(Clone, Debug)]
pub struct Tag {
    name: String,
    slug: String,
}

/// Tag given to posts whose front matter lists none.
pub const DEFAULT_TAG: &str = "others";

impl Tag {
    pub fn parse(raw: &str) -> Option<Self> {
        let name = raw.trim();
        if !name.chars().any(char::is_alphanumeric) {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            slug: slugify(name),
        })
    }

    pub fn fallback() -> Self {
        Self {
            name: DEFAULT_TAG.to_string(),
            slug: DEFAULT_TAG.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.slug == other.slug
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.slug.hash(state);
    }
}

impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.slug.cmp(&other.slug)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Relative paths to internal content or output files.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RelPath(PathBuf);

impl RelPath {
    /// `index.html` at the output root.
    pub(crate) fn root_index() -> Self {
        Self(PathBuf::from("index.html"))
    }

    /// `dir/index.html`.
    pub(crate) fn dir_index(dir: &str) -> Self {
        Self(Path::new(dir).join("index.html"))
    }

    /// `dir/seg/.../index.html`. Segments are slugs, so the result stays
    /// relative.
    pub(crate) fn index_under<'a>(dir: &str, segments: impl IntoIterator<Item = &'a str>) -> Self {
        let mut p = PathBuf::from(dir);
        for segment in segments {
            p.push(segment);
        }
        p.push("index.html");
        Self(p)
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Href(String);

impl Href {
    pub fn from_rel(rel: &RelPath) -> Self {
        let s = rel.as_path().to_string_lossy().replace('\\', "/");
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Href {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
