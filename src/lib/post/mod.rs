//! Blog posts and the rules deciding which of them are shown.

use std::path::Path;

use color_eyre::eyre::eyre;
use time::{Duration, OffsetDateTime};

use crate::{
    config::POSTS_DIR,
    header::Document,
    types::{Href, PublishTime, RelPath, Tag},
    utils::{escape_attr, escape_text, slugify},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlogPost {
    /// URL path segment(s) under `posts/`, e.g. `digit-dp` or `dp/digit-dp`.
    pub slug: String,
    /// Source file relative to the site root, forward slashes.
    pub source_path: String,
    pub title: String,
    pub author: String,
    pub description: String,
    pub pub_datetime: PublishTime,
    pub mod_datetime: Option<PublishTime>,
    pub featured: bool,
    pub draft: bool,
    pub tags: Vec<Tag>,
    pub og_image: Option<String>,
    pub canonical_url: Option<String>,
    pub body: String,
}

impl BlogPost {
    /// Build a post from a parsed content file.
    ///
    /// `rel_in_posts` is the file's path below the posts directory and
    /// determines the slug. A missing title or publish timestamp is an error.
    pub fn from_document(
        rel_in_posts: &Path,
        source_path: &Path,
        doc: Document,
        default_author: &str,
    ) -> color_eyre::Result<Self> {
        let header = doc.header;
        let shown = source_path.display();

        let title = header
            .title()
            .map(ToOwned::to_owned)
            .ok_or_else(|| eyre!("{shown}: front matter has no `title`"))?;

        let pub_datetime = match header.raw_pub_datetime() {
            None => return Err(eyre!("{shown}: front matter has no `pubDatetime`")),
            Some(raw) => header
                .pub_datetime()
                .ok_or_else(|| eyre!("{shown}: `pubDatetime` {raw:?} is not RFC 3339 or YYYY-MM-DD"))?,
        };

        Ok(Self {
            slug: slug_for(rel_in_posts),
            source_path: source_path.to_string_lossy().replace('\\', "/"),
            title,
            author: header.author().unwrap_or(default_author).to_string(),
            description: header.description().unwrap_or_default().to_string(),
            pub_datetime,
            mod_datetime: header.mod_datetime(),
            featured: header.featured(),
            draft: header.draft(),
            tags: header.tags(),
            og_image: header.og_image().map(ToOwned::to_owned),
            canonical_url: header.canonical_url().map(ToOwned::to_owned),
            body: doc.body,
        })
    }

    /// Output file for this post, relative to the output directory.
    pub fn rel_out(&self) -> RelPath {
        RelPath::index_under(POSTS_DIR, self.slug.split('/'))
    }

    pub fn href(&self) -> Href {
        Href::from_rel(&self.rel_out())
    }

    /// Whichever of the modification and publish timestamps is later.
    pub fn updated(&self) -> PublishTime {
        self.mod_datetime
            .filter(|m| *m > self.pub_datetime)
            .unwrap_or(self.pub_datetime)
    }
}

fn slug_for(rel_in_posts: &Path) -> String {
    let stem = rel_in_posts.with_extension("");
    stem.components()
        .map(|c| slugify(&c.as_os_str().to_string_lossy()))
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether a post may be shown, given the latest publish instant allowed.
pub fn is_visible(post: &BlogPost, cutoff: OffsetDateTime) -> bool {
    !post.draft && post.pub_datetime.as_datetime() <= cutoff
}

/// Drop drafts and posts scheduled after `now - margin`, newest first.
///
/// The sort is stable, so posts sharing a timestamp keep their collection
/// order and repeated builds produce the same listing.
pub fn visible_posts(posts: &[BlogPost], now: OffsetDateTime, margin: Duration) -> Vec<BlogPost> {
    let Some(cutoff) = now.checked_sub(margin) else {
        return Vec::new();
    };
    let mut shown: Vec<BlogPost> = posts
        .iter()
        .filter(|p| is_visible(p, cutoff))
        .cloned()
        .collect();
    sort_posts(&mut shown);
    shown
}

/// Newest first; stable.
pub fn sort_posts(posts: &mut [BlogPost]) {
    posts.sort_by(|a, b| b.pub_datetime.cmp(&a.pub_datetime));
}

pub fn featured(posts: &[BlogPost]) -> Vec<&BlogPost> {
    posts.iter().filter(|p| p.featured).collect()
}

/// The newest non-featured posts, at most `limit` of them.
pub fn recent(posts: &[BlogPost], limit: usize) -> Vec<&BlogPost> {
    posts.iter().filter(|p| !p.featured).take(limit).collect()
}

/// Newer and older neighbours of `posts[index]` in a newest-first listing.
pub fn neighbours(posts: &[BlogPost], index: usize) -> (Option<&BlogPost>, Option<&BlogPost>) {
    let newer = index.checked_sub(1).and_then(|i| posts.get(i));
    let older = posts.get(index + 1);
    (newer, older)
}

/// Render a list of post cards. `href_prefix` leads back to the output root.
pub fn render_cards<'a>(posts: impl IntoIterator<Item = &'a BlogPost>, href_prefix: &str) -> String {
    let mut body = String::from("<ul class=\"cards\">\n");

    for p in posts {
        let full_href = format!("{href_prefix}{}", p.href().as_str());
        body.push_str("<li>");
        body.push_str(r#"<a href=""#);
        body.push_str(&escape_attr(&full_href));
        body.push_str(r#""><h3>"#);
        body.push_str(&escape_text(&p.title));
        body.push_str("</h3></a>");
        body.push_str(&render_datetime(p));
        if !p.description.is_empty() {
            body.push_str("<p>");
            body.push_str(&escape_text(&p.description));
            body.push_str("</p>");
        }
        body.push_str("</li>\n");
    }

    body.push_str("</ul>\n");
    body
}

/// Publish date, with the modification date when the post was updated.
pub fn render_datetime(post: &BlogPost) -> String {
    let mut out = String::from(r#"<p class="meta">"#);
    push_time(&mut out, &post.pub_datetime);
    if let Some(modified) = post.mod_datetime.filter(|m| *m > post.pub_datetime) {
        out.push_str(r#"<span class="meta-sep">·</span>Updated: "#);
        push_time(&mut out, &modified);
    }
    out.push_str("</p>");
    out
}

fn push_time(out: &mut String, t: &PublishTime) {
    out.push_str(r#"<time datetime=""#);
    out.push_str(&escape_attr(&t.to_rfc3339()));
    out.push_str(r#"">"#);
    out.push_str(&escape_text(&t.display()));
    out.push_str("</time>");
}
